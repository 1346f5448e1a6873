//! Errors returned by the BoxCast client.

use thiserror::Error;

/// Everything that can go wrong while talking to the BoxCast API.
#[derive(Debug, Error)]
pub enum Error {
    /// The token endpoint rejected the client credentials, could not be reached, or answered
    /// with something that is not a token.
    #[error("BoxCast authorization failed: {message}")]
    Authorization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The request never produced a readable response.
    #[error("send request to BoxCast API: {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("BoxCast API request to {url} failed with status {status}: {body}")]
    Request {
        url: String,
        status: http::StatusCode,
        body: String,
    },

    #[error("BoxCast API returned an empty body for {url}")]
    EmptyBody { url: String },

    /// The body was not JSON, or its JSON did not have the shape of the expected resource.
    #[error("decode BoxCast API response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed X-Pagination header from {url}")]
    PaginationHeader {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server pointed `next` at a page that was already fetched.
    #[error("pagination cursor {cursor} was already requested")]
    PaginationCursorRepeated { cursor: String },

    #[error("pagination did not finish within {pages} pages")]
    PaginationLimitExceeded { pages: usize },

    /// A follow-up request needed an id the first response did not carry.
    #[error("{resource} has no {field}")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },

    #[error("invalid URL")]
    InvalidUrl(#[from] url::ParseError),

    #[error("cannot build endpoint from base URL {0}")]
    InvalidEndpoint(String),

    #[error("{0} is not supported by this client")]
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            source: None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
