// Shared transport configuration for building reqwest::Client instances.
//
// Every request to the remote store carries the project key in `apikey`
// and a bearer token: the signed-in user's access token when there is
// one, the anonymous key otherwise.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

const USER_AGENT: &str = concat!("boutique/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub api_key: SecretString,
    pub access_token: Option<SecretString>,
}

impl TransportConfig {
    pub fn new(api_key: SecretString, timeout: Duration) -> Self {
        Self {
            timeout,
            api_key,
            access_token: None,
        }
    }

    /// Attach the signed-in user's access token.
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Headers injected on every request: `apikey` and `Authorization`.
    pub fn auth_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();

        let mut key_value = header_value(self.api_key.expose_secret(), "API key")?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);

        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose_secret();
        let mut auth_value = header_value(&format!("Bearer {bearer}"), "access token")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    /// Build a `reqwest::Client` with the auth headers installed.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(self.auth_headers()?)
    }

    /// Build a `reqwest::Client` with explicit default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(Error::Transport)
    }
}

fn header_value(raw: &str, what: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(raw).map_err(|e| Error::Authentication {
        message: format!("invalid {what} header value: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_requests_use_api_key_as_bearer() {
        let transport = TransportConfig::new("anon-key".into(), Duration::from_secs(5));
        let headers = transport.auth_headers().unwrap();
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer anon-key");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn access_token_replaces_bearer() {
        let transport = TransportConfig::new("anon-key".into(), Duration::from_secs(5))
            .with_access_token("user-jwt".into());
        let headers = transport.auth_headers().unwrap();
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer user-jwt");
    }

    #[test]
    fn newline_in_key_is_rejected() {
        let transport = TransportConfig::new("bad\nkey".into(), Duration::from_secs(5));
        assert!(matches!(
            transport.auth_headers(),
            Err(Error::Authentication { .. })
        ));
    }
}
