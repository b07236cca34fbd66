use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::FeatureRecord;

/// Transport-level failures at the classifier/log boundary. Both degrade
/// to a single generic user notification; neither is retried.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("endpoint unreachable or returned error status: {0}")]
    Network(String),
    #[error("response missing expected fields: {0}")]
    MalformedResponse(String),
}

/// Verdict returned by the remote classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub is_fraud: bool,
    pub fraud_probability: f64,
}

/// Independent verdict returned by the log-append endpoint, which may
/// re-evaluate using server-side click history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogVerdict {
    pub is_fraud: bool,
}

/// Boundary to the two remote endpoints. The orchestrator only sees this
/// trait; the HTTP implementation below is the production transport.
#[async_trait]
pub trait FraudBackend: Send + Sync {
    async fn classify(&self, record: &FeatureRecord) -> Result<ClassifierVerdict, SubmitError>;

    async fn append_log(
        &self,
        record: &FeatureRecord,
        classifier_is_fraud: bool,
    ) -> Result<LogVerdict, SubmitError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    classifier_url: String,
    log_url: String,
}

impl HttpBackend {
    pub fn new(classifier_url: String, log_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            classifier_url,
            log_url,
        }
    }

    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, SubmitError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SubmitError::Network(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl FraudBackend for HttpBackend {
    async fn classify(&self, record: &FeatureRecord) -> Result<ClassifierVerdict, SubmitError> {
        let payload = serde_json::to_value(record)
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;

        let body = self.post_json(&self.classifier_url, &payload).await?;
        debug!("classifier response: {}", body);

        serde_json::from_value(body)
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))
    }

    async fn append_log(
        &self,
        record: &FeatureRecord,
        classifier_is_fraud: bool,
    ) -> Result<LogVerdict, SubmitError> {
        // Log payload is the feature record plus the classifier's verdict
        let mut payload = serde_json::to_value(record)
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;
        payload["is_fraud"] = serde_json::Value::Bool(classifier_is_fraud);

        let body = self.post_json(&self.log_url, &payload).await?;
        debug!("log endpoint response: {}", body);

        serde_json::from_value(body)
            .map_err(|e| SubmitError::MalformedResponse(e.to_string()))
    }
}
