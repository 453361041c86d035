//! Translation provider trait and the HTTP client implementing it

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, SyncError};

/// An opaque, fallible text-translation capability.
///
/// The merge engine only sees this trait, so tests inject a scripted fake
/// and the binary injects [`GoogleTranslator`].
pub trait TranslationProvider {
    /// Translate `text` from language `from` into language `to`
    fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Google Cloud Translation v2 client with retry logic
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    config: TranslatorConfig,
}

impl GoogleTranslator {
    /// Create a new translator from a validated configuration
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = TranslatorConfig::from_env()?;
        Self::new(config)
    }

    /// Send one translation request, retrying with exponential backoff
    async fn translate_with_retry(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for {:?}", attempt, text);
                sleep(Duration::from_millis(
                    self.config.retry_delay_ms * 2_u64.pow(attempt - 1),
                ))
                .await;
            }

            match self.send_request(text, from, to).await {
                Ok(translation) => {
                    if attempt > 0 {
                        info!("Succeeded after {} retries", attempt);
                    }
                    return Ok(translation);
                }
                Err(e) => {
                    // Client-side errors will not improve on retry
                    let retryable = !matches!(&e, SyncError::Api { status, .. } if *status < 500 && *status != 429);
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(SyncError::Network {
            message: "no attempt was made".to_string(),
        }))
    }

    /// Send actual HTTP request
    async fn send_request(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let body = serde_json::json!({
            "q": text,
            "source": from,
            "target": to,
            "format": "text",
        });

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_success() {
            let json: serde_json::Value =
                response
                    .json()
                    .await
                    .map_err(|e| SyncError::InvalidResponse {
                        message: e.to_string(),
                    })?;

            parse_translation_response(&json)
        } else {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();

            Err(SyncError::Api {
                status: status_code,
                message: error_text,
            })
        }
    }
}

impl TranslationProvider for GoogleTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        self.translate_with_retry(text, from, to).await
    }
}

/// Pull the translated text out of a v2 API response body
fn parse_translation_response(json: &serde_json::Value) -> Result<String> {
    json["data"]["translations"]
        .get(0)
        .and_then(|t| t["translatedText"].as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| SyncError::InvalidResponse {
            message: "no translation in response".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translation_response() {
        let json = serde_json::json!({
            "data": {
                "translations": [
                    { "translatedText": "bonjour" }
                ]
            }
        });

        assert_eq!(parse_translation_response(&json).unwrap(), "bonjour");
    }

    #[test]
    fn test_parse_translation_response_empty() {
        let json = serde_json::json!({ "data": { "translations": [] } });
        assert!(matches!(
            parse_translation_response(&json),
            Err(SyncError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_translator_rejects_empty_key() {
        let config = TranslatorConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(GoogleTranslator::new(config).is_err());
    }
}
