//! Receipt OCR behind a trait so claim intake can be tested without the
//! upstream vision service. The production implementation calls the
//! OpenAI vision API; when no key is configured, extraction degrades to
//! "unreadable" and claims fall back to manual approval.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{instrument, warn};

use crate::entities::claim::confidence;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptExtraction {
    pub amount: Option<Decimal>,
    pub merchant: Option<String>,
    pub date: Option<NaiveDate>,
    /// `high`, `low` or `unreadable`
    pub confidence: String,
    pub items_detected: Option<i32>,
    pub currency: Option<String>,
}

impl ReceiptExtraction {
    pub fn unreadable() -> Self {
        Self {
            amount: None,
            merchant: None,
            date: None,
            confidence: confidence::UNREADABLE.to_string(),
            items_detected: None,
            currency: None,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.confidence != confidence::UNREADABLE && self.amount.is_some()
    }
}

#[async_trait]
pub trait ReceiptVision: Send + Sync {
    async fn extract(&self, image_bytes: &[u8]) -> Result<ReceiptExtraction, ServiceError>;
}

/// Vision client backed by the OpenAI chat completions API.
pub struct OpenAiVision {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const VISION_MODEL: &str = "gpt-4o-mini";

const EXTRACTION_PROMPT: &str = "Extract from this receipt image and answer as JSON with keys \
amount (number), merchant (string), date (YYYY-MM-DD), confidence (high|low|unreadable), \
items_detected (integer), currency (ISO code). Use null for anything you cannot read.";

impl OpenAiVision {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl ReceiptVision for OpenAiVision {
    #[instrument(skip(self, image_bytes), fields(bytes = image_bytes.len()))]
    async fn extract(&self, image_bytes: &[u8]) -> Result<ReceiptExtraction, ServiceError> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);

        let body = json!({
            "model": VISION_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": EXTRACTION_PROMPT},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:image/jpeg;base64,{}", encoded)
                    }}
                ]
            }],
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("vision request: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "vision service returned {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("vision response: {}", e)))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("{}");

        match serde_json::from_str::<ReceiptExtraction>(content) {
            Ok(extraction) => Ok(extraction),
            Err(e) => {
                warn!(error = %e, "vision extraction did not parse; treating as unreadable");
                Ok(ReceiptExtraction::unreadable())
            }
        }
    }
}

/// Stand-in used when `OPENAI_API_KEY` is absent; every receipt is
/// unreadable and claims go to manual approval.
pub struct DisabledVision;

#[async_trait]
impl ReceiptVision for DisabledVision {
    async fn extract(&self, _image_bytes: &[u8]) -> Result<ReceiptExtraction, ServiceError> {
        Ok(ReceiptExtraction::unreadable())
    }
}
