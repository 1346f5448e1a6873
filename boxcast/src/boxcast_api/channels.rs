//! BoxCast channel resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A destination that aggregates broadcasts.
///
/// Every BoxCaster gets a channel created for it automatically, linked through
/// [`Channel::boxcaster_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub boxcaster_id: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_ticketed: Option<bool>,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::types::fmt_resource(f, "Channel", &self.id, self.name.as_deref())
    }
}
