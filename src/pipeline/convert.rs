//! PDF → HTML conversion through the ConvertAPI service.
//!
//! The upload is a JSON envelope carrying the file as base64 (`FileValue`)
//! plus `StoreFile: true`, which makes the service reply with a download URL
//! instead of inline content. Conversion failures are always fatal: without
//! converted HTML there is no template to work with.

use crate::config::GenerationConfig;
use crate::error::LettercraftError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable consulted when the config carries no secret.
pub const CONVERT_API_SECRET_ENV: &str = "CONVERT_API_SECRET";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    files: Vec<ConvertedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    url: String,
}

fn resolve_secret(config: &GenerationConfig) -> Result<String, LettercraftError> {
    if let Some(secret) = &config.convert_api_secret {
        return Ok(secret.clone());
    }
    std::env::var(CONVERT_API_SECRET_ENV).map_err(|_| LettercraftError::ProviderNotConfigured {
        provider: "convertapi".to_string(),
        hint: format!("set {CONVERT_API_SECRET_ENV} or configure convert_api_secret"),
    })
}

/// Convert a PDF to HTML, returning the raw converted bytes.
///
/// `filename` is only metadata for the service; it does not have to match any
/// on-disk path. The returned bytes are undecoded — the converter's output
/// encoding varies, so decoding is a separate step.
pub async fn pdf_to_html(
    pdf_bytes: &[u8],
    filename: &str,
    config: &GenerationConfig,
) -> Result<Vec<u8>, LettercraftError> {
    let secret = resolve_secret(config)?;

    let payload = json!({
        "Parameters": [
            {
                "Name": "File",
                "FileValue": {
                    "Name": filename,
                    "Data": STANDARD.encode(pdf_bytes),
                }
            },
            {
                "Name": "StoreFile",
                "Value": true
            }
        ]
    });

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.convert_timeout_secs))
        .build()
        .map_err(|e| LettercraftError::ConversionRequestFailed {
            reason: format!("building HTTP client: {e}"),
        })?;

    info!(filename, bytes = pdf_bytes.len(), "uploading PDF for conversion");
    let response = client
        .post(&config.convert_api_url)
        .bearer_auth(&secret)
        .json(&payload)
        .send()
        .await
        .map_err(|e| LettercraftError::ConversionRequestFailed {
            reason: format!("{e}"),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LettercraftError::ConversionFailed {
            status: status.as_u16(),
            body,
        });
    }

    let reply: ConvertResponse =
        response
            .json()
            .await
            .map_err(|e| LettercraftError::ConversionReplyInvalid {
                detail: format!("{e}"),
            })?;

    let file = reply
        .files
        .first()
        .ok_or_else(|| LettercraftError::ConversionReplyInvalid {
            detail: "reply listed no converted files".to_string(),
        })?;

    debug!(url = %file.url, "downloading converted HTML");
    let download = client
        .get(&file.url)
        .send()
        .await
        .map_err(|e| LettercraftError::ConversionDownloadFailed {
            url: file.url.clone(),
            reason: format!("{e}"),
        })?;

    let status = download.status();
    if !status.is_success() {
        return Err(LettercraftError::ConversionDownloadFailed {
            url: file.url.clone(),
            reason: format!("HTTP {status}"),
        });
    }

    let bytes = download
        .bytes()
        .await
        .map_err(|e| LettercraftError::ConversionDownloadFailed {
            url: file.url.clone(),
            reason: format!("{e}"),
        })?;

    info!(bytes = bytes.len(), "conversion complete");
    Ok(bytes.to_vec())
}
