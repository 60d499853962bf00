/*!
 * HTTP transport to the Raygun entries endpoint.
 *
 * Uses `ureq`: a pure-Rust blocking HTTP client with no async runtime.
 * Synchronous submissions block the caller until the endpoint answers;
 * asynchronous ones run the same blocking call on their own thread.
 *
 * - **Single attempt**: no retries, no batching.
 * - **No timeouts of our own**: the agent's defaults apply.
 * - **202 only**: every other status is a delivery failure.
 */

use ureq::Agent;

use crate::error::DeliveryError;
use crate::protocol::constants::{ACCEPTED_STATUS, API_KEY_HEADER};
use crate::protocol::types::Payload;

/**
 * Thin wrapper around `ureq::Agent` bound to one endpoint and API key.
 *
 * Cloning is cheap: the agent shares its connection pool between clones,
 * which is what lets asynchronous submissions move a copy into their
 * thread.
 */
#[derive(Clone)]
pub struct Transport {
    agent: Agent,
    endpoint: String,
    api_key: String,
}

impl Transport {
    /**
     * Creates a transport for `endpoint` (e.g. `https://api.raygun.io`).
     *
     * HTTP error statuses are returned as normal responses so that the
     * status can be reported as-is.
     */
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn set_endpoint(&mut self, endpoint: String) {
        self.endpoint = endpoint;
    }

    /// `{endpoint}/entries`, tolerating a trailing slash on the endpoint.
    pub fn entries_url(&self) -> String {
        format!("{}/entries", self.endpoint.trim_end_matches('/'))
    }

    /**
     * Serializes `payload` and POSTs it with the `X-ApiKey` header.
     *
     * Serialization happens before any network activity, so an
     * unencodable payload never reaches the endpoint.
     */
    pub fn send(&self, payload: &Payload) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(payload)?;
        let url = self.entries_url();

        let response = self
            .agent
            .post(url.as_str())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header("Content-Type", "application/json")
            .send(body.as_slice())?;

        let status = response.status().as_u16();
        if status == ACCEPTED_STATUS {
            Ok(())
        } else {
            Err(DeliveryError::UnexpectedStatus { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::test_support::{entries_stub, payload};

    #[test]
    fn test_entries_url() {
        assert_eq!(
            Transport::new("https://api.raygun.io", "key").entries_url(),
            "https://api.raygun.io/entries"
        );
        assert_eq!(
            Transport::new("http://localhost:8080/", "key").entries_url(),
            "http://localhost:8080/entries"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_accepted() {
        let server = entries_stub().await;
        let transport = Transport::new(server.uri(), "key");

        let result = tokio::task::spawn_blocking(move || transport.send(&payload("test")))
            .await
            .unwrap();

        assert!(result.is_ok());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers.get(API_KEY_HEADER).unwrap(), "key");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["details"]["error"]["message"], "test");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_empty_api_key_is_forbidden() {
        let server = entries_stub().await;
        let transport = Transport::new(server.uri(), "");

        let result = tokio::task::spawn_blocking(move || transport.send(&payload("test")))
            .await
            .unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_send_unreachable_endpoint_is_transport_error() {
        let transport = Transport::new("http://127.0.0.1:1", "key");

        let result = transport.send(&payload("test"));

        assert!(matches!(result, Err(DeliveryError::Transport(_))));
    }
}
