//! Core BoxCast API client functionality and authentication management.

use crate::boxcast_api::{
    account::Account,
    boxcasters::BoxCaster,
    broadcasts::{Broadcast, BroadcastView},
    channels::Channel,
    endpoints::Endpoint,
    types::{PAGINATION_HEADER, PagedStream, Pagination},
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::helpers::{PaginationArgs, merge_url_query_params};
use crate::oauth::OAuthManager;
use http::{HeaderMap, Method, StatusCode};
use oauth2::TokenResponse;
use oauth2::basic::BasicTokenResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use tokio_stream::{Stream, StreamExt};
use tracing::{Instrument, instrument};

/// Query that restricts a channel's broadcasts to live and scheduled ones.
const CURRENT_OR_UPCOMING: &str = "timeframe:current timeframe:future";

#[derive(Debug, Clone)]
pub struct TimeBoundAccessToken {
    token: BasicTokenResponse,
    /// When the access token expires (with safety buffer)
    expires_at: SystemTime,
}

impl TimeBoundAccessToken {
    /// Wraps a token that should be replaced before its next use.
    pub fn expired(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: SystemTime::UNIX_EPOCH,
            token,
        }
    }

    /// Wraps a freshly issued token.
    ///
    /// The expiry is the token's `expires_in` minus a 5-minute safety buffer.
    pub fn new(token: BasicTokenResponse) -> Self {
        Self {
            expires_at: Self::calculate_token_expiry(&token),
            token,
        }
    }

    /// The token response as issued by the token endpoint.
    pub fn raw_token(&self) -> &BasicTokenResponse {
        &self.token
    }

    /// Whether the buffered expiry has passed.
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }

    /// Replaces this token with a newly exchanged one.
    ///
    /// Client-credentials tokens carry no refresh token, so this runs the full exchange again.
    pub(crate) async fn reauthorize(&mut self, oauth_manager: &OAuthManager) -> Result<()> {
        tracing::trace!("re-exchanging client credentials");
        let token = oauth_manager.authorize().await?;
        self.expires_at = Self::calculate_token_expiry(&token);
        self.token = token;
        Ok(())
    }

    /// If no expires_in is provided, assumes a conservative 55-minute lifetime.
    fn calculate_token_expiry(token: &BasicTokenResponse) -> SystemTime {
        let now = SystemTime::now();
        if let Some(expires_in) = token.expires_in() {
            now + expires_in.saturating_sub(Duration::from_secs(300)) // 5 minute buffer
        } else {
            now + Duration::from_secs(3300) // 55 minutes
        }
    }
}

/// Client for the BoxCast REST API.
///
/// The client authorizes with the client-credentials grant when it is constructed and then
/// attaches the bearer token to every request. Expired tokens are exchanged again before the
/// next request, and a request the API rejects with `401 Unauthorized` is repeated once with a
/// new token.
///
/// Clones share the token, the OAuth credentials, and the HTTP connection pool.
#[derive(Debug, Clone)]
pub struct BoxCastClient {
    token: Arc<Mutex<TimeBoundAccessToken>>,
    oauth_manager: Arc<OAuthManager>,
    /// HTTP client for API requests
    client: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl BoxCastClient {
    /// Authorizes against the production BoxCast API.
    pub async fn connect(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::with_config(client_id, client_secret, ClientConfig::default()).await
    }

    /// Authorizes against the endpoints in `config`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Authorization`] if the token endpoint does not issue a token. No
    /// client exists in that case.
    #[instrument(skip(client_id, client_secret), fields(api_url = %config.api_url))]
    pub async fn with_config(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let oauth_manager = OAuthManager::new(client_id, client_secret, &config)?;
        let token = oauth_manager.authorize().await?;

        let mut builder = reqwest::Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(|e| Error::Transport {
            url: config.api_url.to_string(),
            source: e,
        })?;

        Ok(Self {
            token: Arc::new(Mutex::new(TimeBoundAccessToken::new(token))),
            oauth_manager: Arc::new(oauth_manager),
            client,
            config: Arc::new(config),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The access token currently attached to requests.
    pub async fn access_token(&self) -> String {
        self.token
            .lock()
            .await
            .token
            .access_token()
            .secret()
            .to_string()
    }

    /// Gets an access token that has not expired, exchanging credentials again if needed.
    async fn fresh_access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.is_expired() {
            tracing::debug!("access token expired, re-authorizing");
            token.reauthorize(&self.oauth_manager).await?;
        }
        Ok(token.token.access_token().secret().to_string())
    }

    /// Replaces `rejected` with a new token, unless a clone already replaced it.
    async fn replace_rejected_token(&self, rejected: &str) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.token.access_token().secret() == rejected {
            token.reauthorize(&self.oauth_manager).await?;
        }
        Ok(token.token.access_token().secret().to_string())
    }

    /// Makes an authenticated request and checks its status.
    ///
    /// A `401 Unauthorized` answer causes exactly one re-authorization and one repeat of the
    /// request. Any other non-success status, or a second 401, is an [`Error::Request`].
    #[instrument(skip(self), level = tracing::Level::TRACE)]
    async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
    ) -> Result<reqwest::Response> {
        let mut access_token = self.fresh_access_token().await?;
        let mut reauthorized = false;

        loop {
            let response = self
                .client
                .request(method.clone(), url)
                .header("Authorization", format!("Bearer {}", access_token))
                .header("Content-Type", "application/json")
                .send()
                .await
                .map_err(|e| Error::Transport {
                    url: url.to_string(),
                    source: e,
                })?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !reauthorized {
                tracing::warn!(url, "access token rejected, re-authorizing");
                access_token = self.replace_rejected_token(&access_token).await?;
                reauthorized = true;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                tracing::error!(url, %status, %body, "request failed");
                return Err(Error::Request {
                    url: url.to_string(),
                    status,
                    body,
                });
            }

            return Ok(response);
        }
    }

    /// Issues an authenticated GET and returns the response headers and decoded JSON body.
    async fn get_with_headers(&self, url: &str) -> Result<(HeaderMap, Value)> {
        let response = self.make_authenticated_request(Method::GET, url).await?;
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            source: e,
        })?;

        if body.is_empty() {
            tracing::error!(url, "request returned an empty body");
            return Err(Error::EmptyBody {
                url: url.to_string(),
            });
        }

        let json = serde_json::from_slice(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })?;
        tracing::trace!(url, bytes = body.len(), "fetched");
        Ok((headers, json))
    }

    /// Issues an authenticated GET against `endpoint` and returns its JSON body.
    ///
    /// # Errors
    ///
    /// * [`Error::Request`] for a non-success status
    /// * [`Error::EmptyBody`] if the API answered with no content
    /// * [`Error::Decode`] if the body is not JSON
    #[instrument(skip(self))]
    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        let (_, body) = self.get_with_headers(endpoint).await?;
        Ok(body)
    }

    async fn get_as<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url).await?;
        decode(url, body)
    }

    /// Fetches one page of a list endpoint and extracts the cursor of the next one.
    async fn fetch_page(
        &self,
        endpoint: &str,
        cursor: Option<String>,
    ) -> Result<(VecDeque<Value>, Option<String>)> {
        let args = PaginationArgs::page(
            cursor.unwrap_or_else(|| "0".to_string()),
            self.config.page_size,
        );
        let url = args.apply(endpoint)?;
        let (headers, body) = self.get_with_headers(&url).await?;
        let items: VecDeque<Value> = decode(&url, body)?;

        let next = match headers.get(PAGINATION_HEADER) {
            Some(header) => {
                let pagination: Pagination =
                    serde_json::from_slice(header.as_bytes()).map_err(|source| {
                        Error::PaginationHeader {
                            url: url.clone(),
                            source,
                        }
                    })?;
                pagination.next_cursor()
            }
            None => {
                tracing::debug!(url = %url, "no pagination header, treating as the only page");
                None
            }
        };

        tracing::debug!(url = %url, returned_items = items.len(), next = ?next, "fetched page");
        Ok((items, next))
    }

    /// Returns a stream over every item of a paginated list endpoint.
    ///
    /// Pages are requested as `?p={page}&s=&l={page_size}`, starting at page 0 and following
    /// the `next` cursor of the `X-Pagination` response header until a page arrives without
    /// one. The stream fails rather than loop forever if the server repeats a cursor or the
    /// listing runs past [`ClientConfig::max_pages`].
    ///
    /// Every page request runs inside a `stream_paginated` span carrying the endpoint.
    pub fn stream_paginated(&self, endpoint: &str) -> impl Stream<Item = Result<Value>> + use<'_> {
        let span = tracing::debug_span!("stream_paginated", endpoint);
        let endpoint = endpoint.to_string();
        PagedStream::new(move |cursor| {
            let endpoint = endpoint.clone();
            async move { self.fetch_page(&endpoint, cursor).await }.instrument(span.clone())
        })
        .with_max_pages(self.config.max_pages)
    }

    /// Fetches every page of a list endpoint and returns all items in server order.
    ///
    /// See [`Self::stream_paginated`] for how pages are walked.
    #[instrument(skip(self))]
    pub async fn get_paginated(&self, endpoint: &str) -> Result<Vec<Value>> {
        let stream = self.stream_paginated(endpoint);
        let mut stream = std::pin::pin!(stream);
        let mut results = Vec::new();
        while let Some(item) = stream.next().await {
            results.push(item?);
        }
        tracing::debug!(total_items = results.len(), "fetched all pages");
        Ok(results)
    }

    async fn list_paginated<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        self.get_paginated(endpoint)
            .await?
            .into_iter()
            .map(|item| decode(endpoint, item))
            .collect()
    }

    fn url(&self, endpoint: Endpoint<'_>) -> Result<String> {
        endpoint.url(&self.config.api_url)
    }

    /// Returns all fields for the current account.
    #[instrument(skip(self))]
    pub async fn get_account(&self) -> Result<Account> {
        self.get_as(&self.url(Endpoint::Account)?).await
    }

    async fn account_channel_id(&self) -> Result<String> {
        self.get_account()
            .await?
            .channel_id
            .ok_or(Error::MissingField {
                resource: "account",
                field: "channel_id",
            })
    }

    /// Returns summary fields for all BoxCasters on the current account.
    #[instrument(skip(self))]
    pub async fn get_boxcasters(&self) -> Result<Vec<BoxCaster>> {
        let boxcasters: Vec<BoxCaster> = self.get_as(&self.url(Endpoint::Boxcasters)?).await?;
        tracing::debug!(returned_items = boxcasters.len(), "fetched boxcasters");
        Ok(boxcasters)
    }

    /// Returns all fields for the specified BoxCaster.
    #[instrument(skip(self))]
    pub async fn get_boxcaster_detail(&self, id: &str) -> Result<BoxCaster> {
        self.get_as(&self.url(Endpoint::BoxcasterDetail(id))?).await
    }

    /// Returns the channel that was auto-created for the specified BoxCaster.
    #[instrument(skip(self))]
    pub async fn get_boxcaster_channel(&self, id: &str) -> Result<Channel> {
        let channel_id = self
            .get_boxcaster_detail(id)
            .await?
            .channel_id
            .ok_or(Error::MissingField {
                resource: "boxcaster",
                field: "channel_id",
            })?;
        self.get_channel_detail(&channel_id).await
    }

    /// Returns summary fields for all channels on the current account.
    #[instrument(skip(self))]
    pub async fn get_channels(&self) -> Result<Vec<Channel>> {
        self.list_paginated(&self.url(Endpoint::Channels)?).await
    }

    /// Returns all fields for the specified channel.
    #[instrument(skip(self))]
    pub async fn get_channel_detail(&self, id: &str) -> Result<Channel> {
        self.get_as(&self.url(Endpoint::ChannelDetail(id))?).await
    }

    /// Returns all fields of the BoxCaster associated with the specified channel.
    #[instrument(skip(self))]
    pub async fn get_channel_boxcaster(&self, id: &str) -> Result<BoxCaster> {
        let boxcaster_id = self
            .get_channel_detail(id)
            .await?
            .boxcaster_id
            .ok_or(Error::MissingField {
                resource: "channel",
                field: "boxcaster_id",
            })?;
        self.get_boxcaster_detail(&boxcaster_id).await
    }

    /// Returns all broadcasts in the specified channel, across every page.
    #[instrument(skip(self))]
    pub async fn get_channel_broadcasts(&self, id: &str) -> Result<Vec<Broadcast>> {
        self.list_paginated(&self.url(Endpoint::ChannelBroadcasts(id))?)
            .await
    }

    /// Like [`Self::get_channel_broadcasts`], with each broadcast's view attached.
    ///
    /// Issues one view request per broadcast.
    #[instrument(skip(self))]
    pub async fn get_channel_broadcasts_with_view(&self, id: &str) -> Result<Vec<Broadcast>> {
        let broadcasts = self.get_channel_broadcasts(id).await?;
        self.attach_views(broadcasts).await
    }

    /// Returns all broadcasts on the account's channel, across every page.
    #[instrument(skip(self))]
    pub async fn get_account_broadcasts(&self) -> Result<Vec<Broadcast>> {
        let channel_id = self.account_channel_id().await?;
        self.get_channel_broadcasts(&channel_id).await
    }

    /// Like [`Self::get_account_broadcasts`], with each broadcast's view attached.
    #[instrument(skip(self))]
    pub async fn get_account_broadcasts_with_view(&self) -> Result<Vec<Broadcast>> {
        let channel_id = self.account_channel_id().await?;
        self.get_channel_broadcasts_with_view(&channel_id).await
    }

    /// Returns the live and scheduled broadcasts on the account's channel, each with its view
    /// attached.
    #[instrument(skip(self))]
    pub async fn get_current_or_upcoming_broadcasts(&self) -> Result<Vec<Broadcast>> {
        let channel_id = self.account_channel_id().await?;
        let url = merge_url_query_params(
            &self.url(Endpoint::ChannelBroadcasts(&channel_id))?,
            [("q", CURRENT_OR_UPCOMING)],
        )?;
        let broadcasts: Vec<Broadcast> = self.get_as(&url).await?;
        tracing::debug!(
            returned_items = broadcasts.len(),
            "fetched current and upcoming broadcasts"
        );
        self.attach_views(broadcasts).await
    }

    /// Returns all fields for the specified broadcast.
    #[instrument(skip(self))]
    pub async fn get_broadcast_detail(&self, id: &str) -> Result<Broadcast> {
        self.get_as(&self.url(Endpoint::BroadcastDetail(id))?).await
    }

    /// Returns the playback details of the specified broadcast.
    #[instrument(skip(self))]
    pub async fn get_broadcast_view(&self, id: &str) -> Result<BroadcastView> {
        self.get_as(&self.url(Endpoint::BroadcastView(id))?).await
    }

    /// Returns all fields for the specified broadcast, with its view attached.
    #[instrument(skip(self))]
    pub async fn get_broadcast_with_view(&self, id: &str) -> Result<Broadcast> {
        let mut broadcast = self.get_broadcast_detail(id).await?;
        broadcast.view = Some(self.get_broadcast_view(id).await?);
        Ok(broadcast)
    }

    async fn attach_views(&self, mut broadcasts: Vec<Broadcast>) -> Result<Vec<Broadcast>> {
        for broadcast in &mut broadcasts {
            broadcast.view = Some(self.get_broadcast_view(&broadcast.id).await?);
        }
        Ok(broadcasts)
    }

    /// Renames a BoxCaster.
    ///
    /// Not supported yet: always fails with [`Error::Unsupported`] without contacting the API.
    pub async fn update_boxcaster(&self, id: &str, name: &str) -> Result<BoxCaster> {
        tracing::debug!(id, name, "refusing unsupported boxcaster update");
        Err(Error::Unsupported("update_boxcaster"))
    }

    /// Updates the fields of a channel.
    ///
    /// Not supported yet: always fails with [`Error::Unsupported`] without contacting the API.
    pub async fn update_channel(&self, id: &str) -> Result<Channel> {
        tracing::debug!(id, "refusing unsupported channel update");
        Err(Error::Unsupported("update_channel"))
    }

    /// Creates a new scheduled broadcast from the supplied fields.
    ///
    /// Not supported yet: always fails with [`Error::Unsupported`] without contacting the API.
    pub async fn schedule_broadcast(&self, broadcast: &Broadcast) -> Result<Broadcast> {
        tracing::debug!(%broadcast, "refusing unsupported broadcast scheduling");
        Err(Error::Unsupported("schedule_broadcast"))
    }

    /// Updates the fields of a scheduled or past broadcast.
    ///
    /// Not supported yet: always fails with [`Error::Unsupported`] without contacting the API.
    pub async fn update_broadcast(&self, id: &str) -> Result<Broadcast> {
        tracing::debug!(id, "refusing unsupported broadcast update");
        Err(Error::Unsupported("update_broadcast"))
    }

    /// Deletes a broadcast.
    ///
    /// Not supported yet: always fails with [`Error::Unsupported`] without contacting the API.
    pub async fn delete_broadcast(&self, id: &str) -> Result<()> {
        tracing::debug!(id, "refusing unsupported broadcast deletion");
        Err(Error::Unsupported("delete_broadcast"))
    }
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| Error::Decode {
        url: url.to_string(),
        source,
    })
}
