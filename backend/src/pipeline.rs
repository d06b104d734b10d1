use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shared::{PredictionResponse, PredictionView};
use uuid::Uuid;

use crate::db::models::PredictionRecord;
use crate::db::{PredictionRepository, RepositoryError};
use crate::error::{PipelineError, PipelineResult};
use crate::inference::labels::DiseaseClasses;
use crate::inference::preprocess::preprocess;
use crate::inference::validate::{
    content_type_for_extension, crop_name_from_filename, validate_extension,
};
use crate::inference::{Classifier, ClassifierError, select_prediction};
use crate::localizer::{Localizer, normalize_locale};
use crate::storage::{ImageStore, ImageStoreError};

/// Runs `fut`, failing with `on_timeout` if it outlives `limit`.
pub async fn bounded<F, T, E>(limit: Option<Duration>, fut: F, on_timeout: E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(on_timeout)),
        None => fut.await,
    }
}

#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub image: Vec<u8>,
    pub filename: String,
    pub locale: String,
}

#[derive(Clone)]
pub struct PipelineSettings {
    pub allowed_extensions: Vec<String>,
    pub external_call_timeout: Option<Duration>,
}

/// Upload-to-record pipeline plus the history listing.
#[derive(Clone)]
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    classes: Arc<DiseaseClasses>,
    images: Arc<dyn ImageStore>,
    predictions: Arc<dyn PredictionRepository>,
    localizer: Localizer,
    settings: PipelineSettings,
}

impl PredictionService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        classes: Arc<DiseaseClasses>,
        images: Arc<dyn ImageStore>,
        predictions: Arc<dyn PredictionRepository>,
        localizer: Localizer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier,
            classes,
            images,
            predictions,
            localizer,
            settings,
        }
    }

    pub async fn predict(&self, request: PredictionRequest) -> PipelineResult<PredictionResponse> {
        let PredictionRequest {
            image,
            filename,
            locale,
        } = request;

        let extension = validate_extension(&filename, &self.settings.allowed_extensions)?;
        if image.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Uploaded file is empty".to_string(),
            ));
        }
        let tensor = preprocess(&image)?;

        let timeout = self.settings.external_call_timeout;
        let scores = bounded(
            timeout,
            self.classifier.predict(&tensor),
            ClassifierError::Timeout,
        )
        .await?;
        let prediction = select_prediction(&scores, &self.classes)?;
        log::info!(
            "Classified {} as {} (severity {:.3})",
            filename,
            prediction.disease,
            prediction.severity
        );

        let treatment = self
            .localizer
            .resolve(&prediction.disease, &locale)
            .await;

        bounded(
            timeout,
            self.images
                .put(&filename, &image, content_type_for_extension(extension)),
            ImageStoreError::Timeout,
        )
        .await?;
        let image_url = self.images.public_url(&filename);

        let record = PredictionRecord::new(
            image_url.clone(),
            crop_name_from_filename(&filename),
            prediction.disease.clone(),
            prediction.severity,
        );
        if let Err(e) = bounded(
            timeout,
            self.predictions.insert_prediction(&record),
            RepositoryError::Timeout,
        )
        .await
        {
            log::warn!(
                "Image {} was stored but prediction {} was not saved; blob left in place",
                filename,
                record.id
            );
            return Err(PipelineError::Persistence(e.to_string()));
        }

        Ok(PredictionResponse {
            image_url,
            disease: prediction.disease,
            severity: prediction.severity,
            treatment,
        })
    }

    /// Every record, newest first, with treatment text in `locale`.
    pub async fn list_predictions(&self, locale: &str) -> PipelineResult<Vec<PredictionView>> {
        let locale = normalize_locale(locale);
        let records = bounded(
            self.settings.external_call_timeout,
            self.predictions.list_predictions(),
            RepositoryError::Timeout,
        )
        .await
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        let mut treatments: HashMap<String, String> = HashMap::new();
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let treatment = match treatments.get(&record.disease_name) {
                Some(text) => text.clone(),
                None => {
                    let text = self.localizer.resolve(&record.disease_name, &locale).await;
                    treatments.insert(record.disease_name.clone(), text.clone());
                    text
                }
            };
            views.push(record.into_view(treatment));
        }
        Ok(views)
    }

    pub async fn delete_prediction(&self, id: Uuid) -> PipelineResult<()> {
        bounded(
            self.settings.external_call_timeout,
            self.predictions.delete_prediction(id),
            RepositoryError::Timeout,
        )
        .await?;
        Ok(())
    }
}
