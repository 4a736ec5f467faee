use reqwest::{header, Method};
use tracing::{debug, trace, warn};

use super::{AuthExchange, ForgeRockError, LoginConfig};

/// Talks to the AM `authenticate` endpoint.
///
/// Every request shares one cookie jar, so any load balancer or session
/// cookie the server sets is carried along on the next round trip.
#[derive(Debug, Clone)]
pub struct AuthenticateClient {
    client: reqwest::Client,
    config: LoginConfig,
}

impl AuthenticateClient {
    pub fn new(config: LoginConfig) -> Result<Self, ForgeRockError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    /// The initial probe: no body, the server picks the first step.
    pub async fn start(&self) -> Result<AuthExchange, ForgeRockError> {
        self.authenticate_request(None).await
    }

    /// Sends the given exchange back, callbacks filled in.
    pub async fn submit(&self, exchange: &AuthExchange) -> Result<AuthExchange, ForgeRockError> {
        let posted_contents = serde_json::to_string(exchange)?;
        self.authenticate_request(Some(posted_contents)).await
    }

    /// Creates and executes the actual authentication request.
    async fn authenticate_request(
        &self,
        body: Option<String>,
    ) -> Result<AuthExchange, ForgeRockError> {
        let endpoint = self.config.endpoint();

        // Both requests must specify an acceptable API version.
        let mut request = self
            .client
            .request(Method::POST, endpoint.clone())
            .header("Accept-API-Version", self.config.api_version.as_str());
        if let Some(posted_contents) = body {
            // The body carries whatever the user typed, passwords included.
            debug!(%endpoint, "submitting callbacks");
            trace!(body = %posted_contents);
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(posted_contents);
        } else {
            debug!(%endpoint, "starting authentication");
        }

        let result = request.send().await?;

        // AM reports a failed login as a 401 with a perfectly good JSON body,
        // so we don't bail out on the status here. The body decides.
        let status = result.status();
        if !status.is_success() {
            warn!(%status, "authenticate endpoint answered with a non-success status");
        }

        let response_text = result.text().await?;
        debug!(%status, body = %response_text, "authenticate response");

        Ok(serde_json::from_str(&response_text)?)
    }
}
