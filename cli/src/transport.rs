//! Blocking HTTP execution for `HttpRequest` values built by the core client.

use carmod_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tracing::debug;
use ureq::Agent;

/// Runs requests on a shared `ureq` agent.
///
/// The agent is built with `http_status_as_error(false)` so 4xx/5xx come back
/// as data and the core client decides what they mean.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
        } = request;

        let result = match method {
            HttpMethod::Get => with_headers(self.agent.get(&path), &headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&path), &headers).call(),
            HttpMethod::Post | HttpMethod::Put => {
                let builder = if method == HttpMethod::Post {
                    self.agent.post(&path)
                } else {
                    self.agent.put(&path)
                };
                let builder = with_headers(builder, &headers);
                match &body {
                    Some(bytes) => builder.send(&bytes[..]),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(format!("{method} {path}: {e}")))?;
        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("reading body of {path}: {e}")))?;
        debug!(%method, %path, status, "transport round-trip");

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body: text,
        })
    }
}
