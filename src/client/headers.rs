//! Ambient authentication headers the chat client attaches to every plugin request.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};

use super::error::ClientError;

pub const X_CSRF_TOKEN: &str = "X-CSRF-Token";

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub token: Option<String>,
    pub csrf_token: Option<String>,
    pub cookie: Option<String>,
    pub extra_headers: BTreeMap<String, String>,
}

impl AuthContext {
    /// Builds the header set. Extra headers are applied last and may override the defaults.
    pub fn to_headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        if let Some(token) = &self.token {
            headers.insert(
                AUTHORIZATION,
                header_value(AUTHORIZATION.as_str(), &format!("Bearer {token}"))?,
            );
        }
        if let Some(csrf) = &self.csrf_token {
            headers.insert(
                HeaderName::from_static("x-csrf-token"),
                header_value(X_CSRF_TOKEN, csrf)?,
            );
        }
        if let Some(cookie) = &self.cookie {
            headers.insert(COOKIE, header_value(COOKIE.as_str(), cookie)?);
        }

        for (name, value) in &self.extra_headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(header_name, header_value(name, value)?);
        }

        Ok(headers)
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}
