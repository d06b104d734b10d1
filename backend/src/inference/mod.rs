pub mod labels;
pub mod preprocess;
pub mod remote;
#[cfg(feature = "torch")]
pub mod torch;
pub mod validate;

use async_trait::async_trait;
use ndarray::Array4;
use std::sync::Arc;

use crate::config::ClassifierSettings;
use labels::DiseaseClasses;

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Invalid input tensor shape {actual:?}, expected {expected:?}")]
    InputShape {
        actual: Vec<usize>,
        expected: [usize; 4],
    },
    #[error("Model returned {actual} scores for {expected} disease classes")]
    OutputLength { actual: usize, expected: usize },
    #[error("Model returned no usable scores")]
    NoScores,
    #[error("Model error: {0}")]
    Model(String),
    #[error("Model backend unavailable: {0}")]
    Unavailable(String),
    #[error("Model call timed out")]
    Timeout,
}

/// Pretrained image classifier: `[1, 128, 128, 3]` in, one probability per class out.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub disease: String,
    pub severity: f32,
}

pub fn check_input_shape(input: &Array4<f32>) -> Result<(), ClassifierError> {
    let expected = preprocess::input_shape();
    if input.shape() != expected {
        return Err(ClassifierError::InputShape {
            actual: input.shape().to_vec(),
            expected,
        });
    }
    Ok(())
}

/// Argmax over the scores; ties resolve to the lowest index.
pub fn select_prediction(
    scores: &[f32],
    classes: &DiseaseClasses,
) -> Result<Prediction, ClassifierError> {
    if scores.len() != classes.len() {
        return Err(ClassifierError::OutputLength {
            actual: scores.len(),
            expected: classes.len(),
        });
    }

    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if !score.is_finite() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }

    let (index, score) = best.ok_or(ClassifierError::NoScores)?;
    let disease = classes
        .get(index)
        .ok_or(ClassifierError::NoScores)?
        .to_string();

    Ok(Prediction {
        index,
        disease,
        severity: score.clamp(0.0, 1.0),
    })
}

/// Runs a synchronous forward pass on the blocking pool, off the async worker.
pub async fn run_blocking<F>(forward: F) -> Result<Vec<f32>, ClassifierError>
where
    F: FnOnce() -> Result<Vec<f32>, ClassifierError> + Send + 'static,
{
    actix_web::web::block(forward)
        .await
        .map_err(|e| ClassifierError::Model(e.to_string()))?
}

pub fn build_classifier(
    settings: &ClassifierSettings,
) -> Result<Arc<dyn Classifier>, ClassifierError> {
    match settings {
        ClassifierSettings::Remote { endpoint } => {
            log::info!("Using remote classifier at {}", endpoint);
            Ok(Arc::new(remote::RemoteClassifier::new(endpoint.clone())?))
        }
        #[cfg(feature = "torch")]
        ClassifierSettings::Torch {
            model_path,
            output_logits,
        } => {
            log::info!("Loading TorchScript model from {}", model_path.display());
            Ok(Arc::new(torch::TorchClassifier::load(
                model_path,
                *output_logits,
            )?))
        }
        #[cfg(not(feature = "torch"))]
        ClassifierSettings::Torch { .. } => Err(ClassifierError::Unavailable(
            "built without the `torch` feature".to_string(),
        )),
    }
}
