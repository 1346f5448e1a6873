//! BoxCast REST API client.
//!
//! The API models a broadcasting account as:
//!
//! - one [`Account`], whose account-wide channel lists every broadcast,
//! - [`BoxCaster`]s, the encoders that produce feeds, each with an auto-created [`Channel`],
//! - [`Broadcast`]s, single stream events that move from scheduled to live to archived,
//! - a [`BroadcastView`] per broadcast with the details a player needs.
//!
//! All of these are plain records decoded from the API's JSON; [`BoxCastClient`] is the only
//! stateful piece and holds nothing but the access token.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use boxcast::BoxCastClient;
//!
//! # async fn example() -> boxcast::Result<()> {
//! let client = BoxCastClient::connect("client-id", "client-secret").await?;
//! println!("{}", client.get_account().await?);
//!
//! for broadcast in client.get_current_or_upcoming_broadcasts().await? {
//!     let playlist = broadcast
//!         .view
//!         .as_ref()
//!         .and_then(|view| view.sanitized_playlist_url());
//!     println!("{broadcast}: {playlist:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod boxcasters;
pub mod broadcasts;
pub mod channels;
pub mod client;
pub mod endpoints;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use client::{BoxCastClient, TimeBoundAccessToken};
pub use types::{PagedStream, Pagination};

pub use account::Account;
pub use boxcasters::BoxCaster;
pub use broadcasts::{Broadcast, BroadcastView, Timeframe};
pub use channels::Channel;
pub use endpoints::Endpoint;
