use std::sync::Arc;

use reqwest::{Client, Method};
use serde::Serialize;
use storage::dto::{CreateMatchupRequest, MatchupPayload};
use storage::models::{MatchupId, MatchupRecord, UserId};
use tracing::{debug, warn};

use super::status::{Endpoint, classify};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::session::SessionContext;
use crate::traits::MatchupApi;

/// `MatchupApi` over the campus server's REST endpoints.
pub struct HttpMatchupApi {
    client: Client,
    config: ClientConfig,
    session: Arc<dyn SessionContext>,
}

impl HttpMatchupApi {
    pub fn new(config: ClientConfig, session: Arc<dyn SessionContext>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<&B>,
    ) -> Result<String> {
        let url = self.config.api_url(&endpoint.path());
        let mut request = self.client.request(method.clone(), &url);
        if let Some(token) = self.session.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(api = self.name(), %method, %url, "Sending request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let actor = self.session.identity().map(|identity| identity.id);
        let err = classify(endpoint, status, &text, actor);
        if matches!(err, ClientError::Unauthorized) {
            self.session.invalidate();
        }
        Err(err)
    }

    /// Bounded retries on transport failures and 5xx, for idempotent reads only.
    async fn read(&self, endpoint: Endpoint) -> Result<String> {
        let retries = if endpoint.is_read() {
            self.config.read_retries
        } else {
            warn!(path = %endpoint.path(), "Not retrying a non-idempotent request");
            0
        };

        let mut attempt = 0u32;
        loop {
            match self.send::<()>(Method::GET, endpoint, None).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < retries => {
                    attempt += 1;
                    warn!(
                        path = %endpoint.path(),
                        attempt,
                        error = %e,
                        "Read failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn decode_record(body: &str) -> Result<MatchupRecord> {
        let payload: MatchupPayload = serde_json::from_str(body)?;
        Ok(MatchupRecord::try_from(payload)?)
    }

    fn decode_records(body: &str) -> Result<Vec<MatchupRecord>> {
        let payloads: Vec<MatchupPayload> = serde_json::from_str(body)?;
        payloads
            .into_iter()
            .map(|payload| MatchupRecord::try_from(payload).map_err(ClientError::from))
            .collect()
    }
}

#[async_trait::async_trait]
impl MatchupApi for HttpMatchupApi {
    async fn list(&self) -> Result<Vec<MatchupRecord>> {
        let body = self.read(Endpoint::List).await?;
        Self::decode_records(&body)
    }

    async fn list_not_full(&self) -> Result<Vec<MatchupRecord>> {
        let body = self.read(Endpoint::ListNotFull).await?;
        Self::decode_records(&body)
    }

    async fn fetch(&self, id: MatchupId) -> Result<MatchupRecord> {
        let body = self.read(Endpoint::Fetch(id)).await?;
        Self::decode_record(&body)
    }

    async fn create(&self, request: &CreateMatchupRequest) -> Result<MatchupRecord> {
        let body = self
            .send(Method::POST, Endpoint::Create, Some(request))
            .await?;
        Self::decode_record(&body)
    }

    async fn join(&self, id: MatchupId, user: UserId) -> Result<MatchupRecord> {
        let body = self
            .send::<()>(Method::POST, Endpoint::Join(id, user), None)
            .await?;
        Self::decode_record(&body)
    }

    async fn close(&self, id: MatchupId) -> Result<MatchupRecord> {
        let body = self
            .send::<()>(Method::POST, Endpoint::Close(id), None)
            .await?;
        Self::decode_record(&body)
    }

    fn name(&self) -> &str {
        &self.config.base_url
    }
}
