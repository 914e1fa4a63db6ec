//! HTTP side of presence reporting. [PluginClient] talks to the server plugin endpoint,
//! [ConnectivityReporter] is the seam the activity gate depends on.

pub mod error;
pub mod headers;

use std::sync::Arc;

use async_trait::async_trait;
use error::ClientError;
use headers::AuthContext;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Url,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::utils::clock::Clock;

/// Plugin id of the messages queue server plugin.
pub const DEFAULT_PLUGIN_ID: &str = "com.github.jespino.messages-queue";

pub const TIMEZONE_OFFSET_HEADER: &str = "x-timezone-offset";

/// Something that can tell the server the user is connected right now.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectivityReporter: Send + Sync + 'static {
    async fn report_connected(&self) -> Result<Value, ClientError>;
}

pub struct PluginClient {
    http: reqwest::Client,
    server_url: Url,
    url: Url,
    headers: HeaderMap,
    clock: Arc<dyn Clock>,
}

impl PluginClient {
    pub fn new(
        server_url: &str,
        plugin_id: &str,
        auth: &AuthContext,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ClientError> {
        let (server_url, url) = plugin_url(server_url, plugin_id)?;
        Ok(Self {
            http: reqwest::Client::new(),
            server_url,
            url,
            headers: auth.to_headers()?,
            clock,
        })
    }

    /// Endpoint every ping is sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Posts `body` as JSON to `url`. Auth headers and the timezone offset are always attached,
    /// `headers` are merged on top of the auth headers. Without a body nothing is sent after the
    /// headers.
    #[instrument(skip_all, fields(%url))]
    pub async fn do_post<B>(
        &self,
        url: Url,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let mut request_headers = self.headers.clone();
        request_headers.extend(headers);
        request_headers.insert(
            HeaderName::from_static(TIMEZONE_OFFSET_HEADER),
            HeaderValue::from(self.clock.timezone_offset_minutes()),
        );

        let mut request = self.http.post(url.clone()).headers(request_headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Plugin responded with {status}");

        if status.is_success() {
            return Ok(response.json::<Value>().await?);
        }

        let message = response.text().await?;
        Err(ClientError::Status {
            server_url: self.server_url.to_string(),
            url: url.to_string(),
            status_code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ConnectivityReporter for PluginClient {
    async fn report_connected(&self) -> Result<Value, ClientError> {
        self.do_post::<()>(self.url.clone(), None, HeaderMap::new())
            .await
    }
}

/// Returns the parsed server url together with `<server>/plugins/<plugin_id>/`. Any path on the
/// server url is kept, so servers behind a subpath work.
fn plugin_url(server_url: &str, plugin_id: &str) -> Result<(Url, Url), ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: server_url.to_string(),
        reason,
    };

    if plugin_id.is_empty() || plugin_id.contains('/') {
        return Err(invalid(format!("'{plugin_id}' is not a valid plugin id")));
    }

    let base = Url::parse(&format!("{}/", server_url.trim_end_matches('/')))
        .map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("url can't be used as a base".into()));
    }
    let url = base
        .join(&format!("plugins/{plugin_id}/"))
        .map_err(|e| invalid(e.to_string()))?;
    Ok((base, url))
}
