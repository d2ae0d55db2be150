use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// Send `request` and decode a JSON body, mapping every failure mode onto
/// [`ProviderError`] for `provider`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let res = request.send().await.map_err(|e| ProviderError::Transport {
        provider: provider.to_string(),
        reason: e.to_string(),
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| ProviderError::Transport {
        provider: provider.to_string(),
        reason: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::malformed(provider, e.to_string()))
}

/// Credential or a `MissingCredential` failure naming the env variable.
pub(crate) fn require_key<'a>(
    provider: &str,
    api_key: Option<&'a str>,
    env_var: &str,
) -> Result<&'a str, ProviderError> {
    api_key.ok_or_else(|| ProviderError::MissingCredential {
        provider: provider.to_string(),
        credential: env_var.to_string(),
    })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
