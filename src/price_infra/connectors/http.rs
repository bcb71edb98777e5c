use std::time::Duration;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::error::{Error, Result};
use crate::types::SourceId;

pub(crate) fn client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pricewatch/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    source_id: SourceId,
) -> Result<T> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            source_id,
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::DeserializationError(e.to_string()))
}

/// Exchanges mix JSON numbers and numeric strings; accept both.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
