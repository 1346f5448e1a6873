//! BoxCast account resource.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The account that owns the client credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// The account-wide channel that every broadcast of the account is published to.
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::types::fmt_resource(f, "Account", &self.id, self.name.as_deref())
    }
}
