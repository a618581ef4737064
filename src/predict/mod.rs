use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

use crate::config::ModelConfig;
use crate::core::ModelOutput;
use crate::features::FeatureVector;

/// Client for the model-serving endpoint. One call per assessment; the
/// pipeline caches the result per session, so re-rendering a result view
/// never triggers a duplicate call.
pub struct PredictionClient {
    url: String,
    token: Option<String>,
    client: Client,
}

/// Abstraction over the prediction call so the pipeline can be exercised
/// without a live endpoint.
pub trait Predictor: Send + Sync {
    fn predict(
        &self,
        features: &FeatureVector,
    ) -> impl Future<Output = Result<ModelOutput, PredictError>> + Send;
}

impl PredictionClient {
    pub fn new(config: &ModelConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url: config.endpoint_url.clone(),
            token: config.token.clone(),
            client,
        })
    }
}

impl Predictor for PredictionClient {
    async fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, PredictError> {
        let payload = build_payload(features);
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(PredictError::Http)?;
        if !response.status().is_success() {
            return Err(PredictError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await.map_err(PredictError::Http)?;
        parse_prediction(&body).ok_or(PredictError::Malformed)
    }
}

/// MLflow `dataframe_split` payload: column names and one data row, both in
/// the feature contract's fixed order.
pub fn build_payload(features: &FeatureVector) -> Value {
    json!({
        "dataframe_split": {
            "columns": features.columns(),
            "data": [features.row()],
        }
    })
}

/// Parse the endpoint reply. Newer models return
/// `{"predictions": [{"prediction": 1, "probability": 0.8}]}`; older ones
/// return a bare class label with no probability.
pub fn parse_prediction(body: &Value) -> Option<ModelOutput> {
    let first = body.get("predictions")?.as_array()?.first()?;
    if let Some(object) = first.as_object() {
        Some(ModelOutput {
            prediction: object.get("prediction").and_then(Value::as_i64).unwrap_or(0),
            probability: object.get("probability").and_then(Value::as_f64),
        })
    } else {
        first.as_i64().map(|label| ModelOutput {
            prediction: label,
            probability: None,
        })
    }
}

#[derive(Debug)]
pub enum PredictError {
    Http(reqwest::Error),
    Status(u16),
    Malformed,
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::Http(e) => write!(f, "HTTP error: {e}"),
            PredictError::Status(code) => write!(f, "endpoint returned status {code}"),
            PredictError::Malformed => write!(f, "endpoint reply had no usable prediction"),
        }
    }
}

impl std::error::Error for PredictError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RawResponse, ScoreMap};
    use crate::features;
    use serde_json::json;

    fn sample_features() -> FeatureVector {
        let mut responses = RawResponse::new();
        responses.insert("Demo_Rol_Trabajo".into(), json!(1));
        responses.insert("Demo_Horas".into(), json!(5));
        responses.insert("Demo_Tamano_Org".into(), json!(2));
        let mut scores = ScoreMap::new();
        scores.insert("Big5_Apertura".into(), 3.5);
        scores.insert("Phish_Riesgo_Percibido".into(), 2.0);
        scores.insert("Fatiga_Global_Score".into(), 4.2);
        features::assemble(&scores, &responses).unwrap()
    }

    #[test]
    fn payload_uses_dataframe_split_in_contract_order() {
        let payload = build_payload(&sample_features());
        let split = &payload["dataframe_split"];
        assert_eq!(
            split["columns"],
            json!([
                "Demo_Rol_Trabajo",
                "Demo_Horas",
                "Demo_Tamano_Org",
                "Fatiga_Global_Score",
                "Big5_Apertura",
                "Phish_Riesgo_Percibido"
            ])
        );
        assert_eq!(split["data"], json!([[1, 5, 2, 4.2, 3.5, 2.0]]));
    }

    #[test]
    fn parse_object_reply() {
        let body = json!({"predictions": [{"prediction": 1, "probability": 0.73}]});
        let output = parse_prediction(&body).unwrap();
        assert_eq!(output.prediction, 1);
        assert_eq!(output.probability, Some(0.73));
    }

    #[test]
    fn parse_bare_label_reply_has_no_probability() {
        let body = json!({"predictions": [1]});
        let output = parse_prediction(&body).unwrap();
        assert_eq!(output.prediction, 1);
        assert_eq!(output.probability, None);
    }

    #[test]
    fn parse_object_reply_without_probability() {
        let body = json!({"predictions": [{"prediction": 0}]});
        let output = parse_prediction(&body).unwrap();
        assert_eq!(output.prediction, 0);
        assert_eq!(output.probability, None);
    }

    #[test]
    fn parse_rejects_empty_or_missing_predictions() {
        assert_eq!(parse_prediction(&json!({"predictions": []})), None);
        assert_eq!(parse_prediction(&json!({"error": "boom"})), None);
    }
}
