//! Request plumbing shared by the HTTP capability clients.

use crate::errors::{Error, Result};
use crate::secrets::SecretString;
use reqwest::{RequestBuilder, Response};
use url::Url;

/// Header the Bloomz endpoints read their bearer token from
pub(crate) const BLOOMZ_AUTH_HEADER: &str = "Authentication";

/// Resolve `path` against `base` the way a browser would: an absolute path
/// replaces the base path.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url> {
    parse_base(base)?
        .join(path)
        .map_err(|e| Error::config_with_source(format!("Invalid endpoint path '{}'", path), Box::new(e)))
}

/// Append `path` below the base path (`http://h/v1` + `embeddings` = `http://h/v1/embeddings`).
pub(crate) fn nested_endpoint(base: &str, path: &str) -> Result<Url> {
    let mut url = parse_base(base)?;
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }
    url.join(path.trim_start_matches('/'))
        .map_err(|e| Error::config_with_source(format!("Invalid endpoint path '{}'", path), Box::new(e)))
}

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base)
        .map_err(|e| Error::config_with_source(format!("Invalid base URL '{}'", base), Box::new(e)))
}

/// Shared client constructor; building one performs no I/O
pub(crate) fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| Error::http("Failed to build HTTP client", e))
}

pub(crate) fn with_bloomz_auth(builder: RequestBuilder, api_key: Option<&SecretString>) -> RequestBuilder {
    match api_key {
        Some(key) => {
            builder.header(BLOOMZ_AUTH_HEADER, format!("Bearer {}", key.expose_secret()))
        }
        None => builder,
    }
}

/// Send a request, turning transport failures and non-success statuses into errors
pub(crate) async fn send(service: &str, builder: RequestBuilder) -> Result<Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| Error::http(format!("{} request failed", service), e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(service = %service, status = status.as_u16(), "Upstream returned an error status");
        return Err(Error::upstream_status(service, status.as_u16(), body));
    }
    Ok(response)
}

/// Decode a JSON response body
pub(crate) async fn json<T: serde::de::DeserializeOwned>(service: &str, response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| Error::http(format!("{} returned an unexpected body", service), e))
}
