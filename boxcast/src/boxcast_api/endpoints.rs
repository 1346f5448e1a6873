//! The BoxCast resource endpoints this client knows about.

use crate::error::{Error, Result};
use url::Url;

/// One resource endpoint, with its path parameter if it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Account,
    Channels,
    ChannelDetail(&'a str),
    ChannelBroadcasts(&'a str),
    BroadcastDetail(&'a str),
    BroadcastView(&'a str),
    Boxcasters,
    BoxcasterDetail(&'a str),
}

impl<'a> Endpoint<'a> {
    fn segments(&self) -> Vec<&'a str> {
        match *self {
            Endpoint::Account => vec!["account"],
            Endpoint::Channels => vec!["account", "channels"],
            Endpoint::ChannelDetail(id) => vec!["account", "channels", id],
            Endpoint::ChannelBroadcasts(id) => vec!["channels", id, "broadcasts"],
            Endpoint::BroadcastDetail(id) => vec!["broadcasts", id],
            Endpoint::BroadcastView(id) => vec!["broadcasts", id, "view"],
            Endpoint::Boxcasters => vec!["boxcasters"],
            Endpoint::BoxcasterDetail(id) => vec!["boxcasters", id],
        }
    }

    /// Resolves the endpoint against `base`.
    ///
    /// Path parameters are pushed as single escaped path segments, so an id can never reach
    /// outside its own segment.
    pub fn url(&self, base: &Url) -> Result<String> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| Error::InvalidEndpoint(base.to_string()))?
            .pop_if_empty()
            .extend(self.segments());
        Ok(url.into())
    }
}
