//! BoxCaster encoder resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `status` a BoxCaster reports while it is streaming.
pub const STATUS_BROADCASTING: &str = "broadcasting";

/// A registered hardware or software encoder that produces broadcast feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxCaster {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form device state, e.g. `ready`, `broadcasting`, or `offline`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    /// The channel that was auto-created for this BoxCaster.
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub firmware_version: Option<String>,
}

impl BoxCaster {
    /// Whether the encoder is currently broadcasting.
    pub fn is_live(&self) -> bool {
        self.status.as_deref() == Some(STATUS_BROADCASTING)
    }
}

impl fmt::Display for BoxCaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::types::fmt_resource(f, "BoxCaster", &self.id, self.name.as_deref())
    }
}
