//! Client library for the BoxCast video-broadcast REST API.
//!
//! See [`boxcast_api`] for the resource model and an example.

pub mod boxcast_api;
pub mod config;
pub mod error;
pub mod helpers;
mod oauth;

pub use boxcast_api::{
    Account, BoxCastClient, BoxCaster, Broadcast, BroadcastView, Channel, Timeframe,
};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use helpers::merge_url_query_params;
