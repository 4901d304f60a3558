//! Provisioning of a remote chat identity.
//!
//! One request/response call exchanges an access credential and an optional
//! behavioral prompt for a session handle. The streaming core only ever
//! consumes the resulting handle as an opaque string.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, header};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{PROVISION_ERRORS, PROVISION_REQUESTS};
use crate::types::{ProvisionRequest, ProvisionResponse, SessionHandle};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the provisioning endpoint.
#[derive(Debug, Clone)]
pub struct ProvisionClient {
    endpoint: Url,
    access_key: String,
    client: ReqwestClient,
}

impl ProvisionClient {
    /// Creates a provisioning client for the given endpoint and access key.
    pub fn new(endpoint: Url, access_key: impl Into<String>) -> Result<Self> {
        let access_key = access_key.into();
        if access_key.is_empty() {
            return Err(Error::authentication("access key must not be empty"));
        }
        let client = ReqwestClient::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::connection(
                    format!("failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self {
            endpoint,
            access_key,
            client,
        })
    }

    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let key = HeaderValue::from_str(&self.access_key)
            .map_err(|_| Error::authentication("access key contains invalid characters"))?;
        headers.insert("x-access-key", key);
        Ok(headers)
    }

    /// Provisions a new chat identity, optionally with a behavioral prompt.
    ///
    /// Returns the session handle for the new identity.
    pub async fn provision(&self, custom_prompt: Option<String>) -> Result<SessionHandle> {
        PROVISION_REQUESTS.click();
        let url = provision_url(&self.endpoint)?;
        let body = ProvisionRequest { custom_prompt };
        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                PROVISION_ERRORS.click();
                Error::connection(format!("provisioning request failed: {e}"), Some(Box::new(e)))
            })?;

        let status = response.status();
        if !status.is_success() {
            PROVISION_ERRORS.click();
            let message = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => Error::authentication("access key was rejected"),
                code => Error::api(code, message),
            });
        }

        let parsed: ProvisionResponse = response.json().await.map_err(|e| {
            PROVISION_ERRORS.click();
            Error::serialization(
                format!("failed to parse provisioning response: {e}"),
                Some(Box::new(e)),
            )
        })?;

        match (parsed.success, parsed.id) {
            (true, Some(id)) => Ok(SessionHandle::new(id)),
            _ => {
                PROVISION_ERRORS.click();
                Err(Error::api(
                    status.as_u16(),
                    "provisioning did not return a session handle",
                ))
            }
        }
    }
}

fn provision_url(endpoint: &Url) -> Result<Url> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| Error::url("endpoint cannot be a base URL", None))?
        .pop_if_empty()
        .push("add-chat-with-me");
    Ok(url)
}

/// Builds the shareable link that embeds a session handle.
///
/// Anyone opening the link chats with the provisioned identity.
pub fn shareable_link(share_base: &Url, handle: &SessionHandle) -> Url {
    let mut url = share_base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("chatting_with_id", handle.as_str());
    url
}
