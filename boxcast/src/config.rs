//! Client configuration.

use serde::{Deserialize, Serialize};
use url::Url;

/// Production API base.
pub const API_URL: &str = "https://api.boxcast.com/";
/// Production OAuth2 token endpoint.
pub const TOKEN_URL: &str = "https://auth.boxcast.com/oauth2/token";
/// Production OAuth2 authorize endpoint.
pub const AUTHORIZE_URL: &str = "https://auth.boxcast.com/oauth2/authorize";

/// Where the client talks to and how it walks list endpoints.
///
/// Every field has a default, so a partial configuration deserializes to the production
/// settings for whatever it leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL that resource paths are resolved against.
    pub api_url: Url,
    pub token_url: Url,
    /// Not used by the client-credentials grant; kept for callers building other flows.
    pub authorize_url: Url,
    /// Scope requested when exchanging client credentials.
    pub scope: String,
    /// Items requested per page of a list endpoint.
    pub page_size: u32,
    /// Upper bound on the number of pages a single listing may fetch.
    pub max_pages: usize,
    /// Honor `HTTP_PROXY`-style environment variables.
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(API_URL).expect("API_URL is valid"),
            token_url: Url::parse(TOKEN_URL).expect("TOKEN_URL is valid"),
            authorize_url: Url::parse(AUTHORIZE_URL).expect("AUTHORIZE_URL is valid"),
            scope: "owner".to_string(),
            page_size: 50,
            max_pages: 1000,
            use_system_proxy: true,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `BOXCAST_*` environment variables that are set.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `BOXCAST_*` key.
    ///
    /// Unparseable numbers are ignored with a warning; unparseable URLs are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("BOXCAST_API_URL") {
            config.api_url = Url::parse(&url)?;
        }
        if let Some(url) = lookup("BOXCAST_TOKEN_URL") {
            config.token_url = Url::parse(&url)?;
        }
        if let Some(url) = lookup("BOXCAST_AUTHORIZE_URL") {
            config.authorize_url = Url::parse(&url)?;
        }
        if let Some(scope) = lookup("BOXCAST_SCOPE") {
            config.scope = scope;
        }
        if let Some(size) = lookup("BOXCAST_PAGE_SIZE") {
            match size.parse() {
                Ok(size) => config.page_size = size,
                Err(e) => tracing::warn!(%size, "ignoring invalid BOXCAST_PAGE_SIZE: {}", e),
            }
        }
        if let Some(pages) = lookup("BOXCAST_MAX_PAGES") {
            match pages.parse() {
                Ok(pages) => config.max_pages = pages,
                Err(e) => tracing::warn!(%pages, "ignoring invalid BOXCAST_MAX_PAGES: {}", e),
            }
        }

        Ok(config)
    }

    /// Points every endpoint at `base`, e.g. a staging deployment or a local test server.
    pub fn with_base_url(base: &Url) -> crate::Result<Self> {
        Ok(Self {
            api_url: base.clone(),
            token_url: base.join("oauth2/token")?,
            authorize_url: base.join("oauth2/authorize")?,
            ..Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_point_at_production() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url.as_str(), "https://api.boxcast.com/");
        assert_eq!(
            config.token_url.as_str(),
            "https://auth.boxcast.com/oauth2/token"
        );
        assert_eq!(config.scope, "owner");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_pages, 1000);
        assert!(config.use_system_proxy);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"page_size": 10, "api_url": "http://localhost:8080/"}"#)
                .unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.token_url, ClientConfig::default().token_url);
    }

    #[test]
    fn test_lookup_overrides() {
        let env = HashMap::from([
            ("BOXCAST_API_URL", "http://127.0.0.1:9000/"),
            ("BOXCAST_MAX_PAGES", "5"),
            ("BOXCAST_PAGE_SIZE", "not a number"),
        ]);
        let config =
            ClientConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:9000/");
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_lookup_rejects_bad_url() {
        let err = ClientConfig::from_lookup(|key| {
            (key == "BOXCAST_TOKEN_URL").then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, crate::Error::InvalidUrl(_)), "{err:?}");
    }

    #[test]
    fn test_with_base_url() {
        let base = Url::parse("http://127.0.0.1:4000/").unwrap();
        let config = ClientConfig::with_base_url(&base).unwrap();
        assert_eq!(config.token_url.as_str(), "http://127.0.0.1:4000/oauth2/token");
        assert_eq!(config.page_size, 50);
    }
}
