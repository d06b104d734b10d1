//! Request-level error taxonomy and its HTTP mapping.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorDetail;

use crate::db::RepositoryError;
use crate::inference::ClassifierError;
use crate::inference::preprocess::PreprocessError;
use crate::storage::ImageStoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Declared file type is not acceptable, or the upload is malformed.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Cannot read image file: {0}")]
    UnreadableImage(String),

    #[error("Upload exceeds the maximum size of {0} bytes")]
    UploadTooLarge(usize),

    #[error("Error processing image: {0}")]
    Preprocessing(String),

    #[error("Error predicting disease: {0}")]
    Classification(String),

    #[error("Error uploading image: {0}")]
    Storage(String),

    #[error("Error saving to database: {0}")]
    Persistence(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl PipelineError {
    pub fn is_client_fault(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl ResponseError for PipelineError {
    fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::InvalidInput(_) | PipelineError::UnreadableImage(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Preprocessing(_)
            | PipelineError::Classification(_)
            | PipelineError::Storage(_)
            | PipelineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_client_fault() {
            log::info!("Rejected request: {}", self);
        } else {
            log::error!("Request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorDetail {
            detail: self.to_string(),
        })
    }
}

impl From<PreprocessError> for PipelineError {
    fn from(err: PreprocessError) -> Self {
        match err {
            PreprocessError::Unreadable(msg) => PipelineError::UnreadableImage(msg),
            PreprocessError::Failed(msg) => PipelineError::Preprocessing(msg),
        }
    }
}

impl From<ClassifierError> for PipelineError {
    fn from(err: ClassifierError) -> Self {
        PipelineError::Classification(err.to_string())
    }
}

impl From<ImageStoreError> for PipelineError {
    fn from(err: ImageStoreError) -> Self {
        PipelineError::Storage(err.to_string())
    }
}

impl From<RepositoryError> for PipelineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => PipelineError::NotFound("Prediction".to_string()),
            other => PipelineError::Persistence(other.to_string()),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
