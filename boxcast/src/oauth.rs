//! OAuth 2.0 client-credentials authentication against BoxCast.
//!
//! BoxCast issues server-to-server tokens through the client-credentials grant: the client id
//! and secret are presented with HTTP Basic authentication and exchanged for a bearer token
//! with the `owner` scope. There is no refresh token in this flow, so "refreshing" means
//! running the exchange again.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{ClientId, ClientSecret, RequestTokenError, Scope, TokenUrl, reqwest};

/// Holds the client credentials and performs token exchanges with them.
#[derive(Debug, Clone)]
pub(crate) struct OAuthManager {
    client_id: ClientId,
    client_secret: ClientSecret,
    token_url: TokenUrl,
    scope: Scope,
    http_client: reqwest::Client,
}

impl OAuthManager {
    pub(crate) fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let mut builder = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none());
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::Transport {
                url: config.token_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client_id: ClientId::new(client_id.into()),
            client_secret: ClientSecret::new(client_secret.into()),
            token_url: TokenUrl::from_url(config.token_url.clone()),
            scope: Scope::new(config.scope.clone()),
            http_client,
        })
    }

    /// Exchanges the client credentials for a fresh access token.
    ///
    /// Any rejection by the token endpoint is an [`Error::Authorization`] carrying the decoded
    /// error body, so callers can show the user why their credentials did not work.
    #[tracing::instrument(skip(self), fields(token_url = %self.token_url.url()))]
    pub(crate) async fn authorize(&self) -> Result<BasicTokenResponse> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone());

        match client
            .exchange_client_credentials()
            .add_scope(self.scope.clone())
            .request_async(&self.http_client)
            .await
        {
            Ok(token) => {
                tracing::info!("authorization successful, saving OAuth access token");
                Ok(token)
            }
            Err(RequestTokenError::ServerResponse(response)) => {
                tracing::error!(?response, "authorization request failed");
                let body = serde_json::to_string(&response)
                    .unwrap_or_else(|_| response.to_string());
                Err(Error::authorization(body))
            }
            Err(RequestTokenError::Parse(e, body)) => {
                let body = String::from_utf8_lossy(&body).into_owned();
                tracing::error!(%body, "authorization response is not a token: {}", e);
                Err(Error::Authorization {
                    message: body,
                    source: Some(Box::new(e)),
                })
            }
            Err(RequestTokenError::Request(e)) => {
                tracing::error!("authorization request could not be sent: {}", e);
                Err(Error::Authorization {
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                })
            }
            Err(RequestTokenError::Other(e)) => {
                tracing::error!("authorization request failed: {}", e);
                Err(Error::authorization(e))
            }
        }
    }
}
