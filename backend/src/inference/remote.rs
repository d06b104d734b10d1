//! Classifier served over HTTP with the TensorFlow Serving REST predict API.

use async_trait::async_trait;
use ndarray::{Array4, Axis};
use serde::{Deserialize, Serialize};

use super::{Classifier, ClassifierError, check_input_shape};

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<Vec<f32>>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f32>>,
}

#[derive(Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: String) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

/// Nested `[batch][row][col][channel]` lists, the layout `instances` expects.
fn to_instances(input: &Array4<f32>) -> Vec<Vec<Vec<Vec<f32>>>> {
    input
        .axis_iter(Axis(0))
        .map(|image| {
            image
                .axis_iter(Axis(0))
                .map(|row| row.axis_iter(Axis(0)).map(|px| px.to_vec()).collect())
                .collect()
        })
        .collect()
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        check_input_shape(input)?;

        let request = PredictRequest {
            instances: to_instances(input),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Model server returned {}: {}", status, body);
            return Err(ClassifierError::Model(format!(
                "model server returned {}",
                status
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Model(format!("invalid model response: {}", e)))?;

        body.predictions
            .into_iter()
            .next()
            .ok_or(ClassifierError::NoScores)
    }
}
