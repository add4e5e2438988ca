//! JSON web-hook backend

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{debug, warn};

use super::{parse_response, Backend, RemoteError, Request, Response};
use crate::http::http_client;

/// POSTs each request as JSON to a fixed URL
pub struct WebhookBackend {
    client: &'static Client,
    url: Url,
}

impl WebhookBackend {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        let url = Url::parse(url.trim()).map_err(|_| RemoteError::BadUrl(url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RemoteError::BadUrl(url.to_string()));
        }
        let client = http_client(timeout_secs)?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Backend for WebhookBackend {
    fn call(&self, request: &Request) -> Result<Response, RemoteError> {
        debug!(action = request.action(), "web-hook request");
        let response = self.client.post(self.url.clone()).json(request).send()?;

        let status = response.status();
        if !status.is_success() {
            warn!(action = request.action(), status = status.as_u16(), "web-hook error status");
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.text()?;
        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "web-hook"
    }
}
