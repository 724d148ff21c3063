//! HTTP enrichment via a hosted text-generation endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use invex_core::error::EnrichmentError;
use invex_core::invoice::{enrichment_prompt, parse_model_output};
use invex_core::models::config::EnrichmentConfig;
use invex_core::{EnrichedFields, Enricher};

/// Posts the extraction prompt and parses the generated JSON.
pub struct HttpEnricher {
    client: Client,
    endpoint: String,
    max_new_tokens: u32,
    token: Option<String>,
}

impl HttpEnricher {
    pub fn from_config(config: &EnrichmentConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            max_new_tokens: config.max_new_tokens,
            token,
        })
    }
}

impl Enricher for HttpEnricher {
    fn name(&self) -> &str {
        "http"
    }

    fn enrich(&self, text: &str) -> Result<EnrichedFields, EnrichmentError> {
        let body = json!({
            "inputs": enrichment_prompt(text),
            "parameters": {
                "max_new_tokens": self.max_new_tokens,
                "return_full_text": false,
            },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;
        let payload: Value = response
            .json()
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))?;

        let generated = generated_text(&payload)?;
        debug!("Model returned {} characters", generated.len());
        parse_model_output(generated)
    }
}

/// `[{"generated_text": ...}]`, or the bare object some endpoints return.
fn generated_text(payload: &Value) -> Result<&str, EnrichmentError> {
    let item = match payload {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    item.and_then(|v| v.get("generated_text"))
        .and_then(Value::as_str)
        .ok_or_else(|| EnrichmentError::Malformed("response has no generated_text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_text_from_array() {
        let payload = json!([{"generated_text": "{\"total\": \"10.00\"}"}]);
        assert_eq!(generated_text(&payload).unwrap(), "{\"total\": \"10.00\"}");
    }

    #[test]
    fn test_generated_text_from_object() {
        let payload = json!({"generated_text": "ok"});
        assert_eq!(generated_text(&payload).unwrap(), "ok");
    }

    #[test]
    fn test_generated_text_missing() {
        let payload = json!({"error": "model loading"});
        assert!(matches!(
            generated_text(&payload),
            Err(EnrichmentError::Malformed(_))
        ));
    }
}
