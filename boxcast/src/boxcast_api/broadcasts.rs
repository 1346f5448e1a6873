//! BoxCast broadcast and broadcast view types.
//!
//! A [`Broadcast`] is one stream event on a channel. It moves through a lifecycle of
//! scheduled, live, and archived, which the API reports as its [`Timeframe`]. The playback
//! side of a broadcast (where a player finds the stream) lives in a separate
//! [`BroadcastView`] resource that has to be fetched on its own.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a broadcast is in its lifecycle, relative to now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Archived; available for on-demand playback if recorded.
    Past,
    /// Live right now.
    Current,
    /// Scheduled.
    Future,
    /// About to go live; the pre-roll slate is showing.
    Preroll,
    /// A timeframe this client does not know about.
    #[serde(untagged)]
    Other(String),
}

/// Metadata of a scheduled, live, or past broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub boxcaster_id: Option<String>,
    #[serde(default)]
    pub starts_at: Option<Timestamp>,
    #[serde(default)]
    pub stops_at: Option<Timestamp>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_ticketed: Option<bool>,
    /// Preview image URL.
    #[serde(default)]
    pub preview: Option<String>,
    /// Poster image URL.
    #[serde(default)]
    pub poster: Option<String>,
    /// Playback details, attached by the client after a follow-up request.
    ///
    /// Never part of the broadcast payload itself.
    #[serde(skip)]
    pub view: Option<BroadcastView>,
}

impl Broadcast {
    /// Whether the broadcast is on air right now.
    pub fn is_live(&self) -> bool {
        self.timeframe == Some(Timeframe::Current)
    }
}

impl fmt::Display for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::types::fmt_resource(f, "Broadcast", &self.id, self.name.as_deref())
    }
}

/// Playback details for a broadcast, as returned by `broadcasts/{id}/view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastView {
    #[serde(default)]
    pub id: Option<String>,
    /// Playback state, e.g. `live`, `recorded`, or `preroll`.
    #[serde(default)]
    pub status: Option<String>,
    /// Percent-encoded playlist URL; see [`Self::sanitized_playlist_url`].
    #[serde(default)]
    pub playlist: Option<String>,
    /// Set instead of `playlist` when the broadcast cannot be played.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BroadcastView {
    /// Whether the playlist is an HLS (`.m3u8`) playlist.
    pub fn is_hls(&self) -> bool {
        self.playlist
            .as_deref()
            .is_some_and(|playlist| playlist.contains(".m3u8"))
    }

    /// The playlist URL with its percent-encoding decoded.
    pub fn sanitized_playlist_url(&self) -> Option<String> {
        let playlist = self.playlist.as_deref()?;
        let decoded = urlencoding::decode_binary(playlist.as_bytes());
        Some(String::from_utf8_lossy(&decoded).into_owned())
    }
}

impl fmt::Display for BroadcastView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => super::types::fmt_resource(f, "BroadcastView", id, None),
            None => f.write_str("<BroadcastView>"),
        }
    }
}
