pub mod dynamodb_repository;
pub mod models;
pub mod seed;

use async_trait::async_trait;
use uuid::Uuid;

use models::{PredictionRecord, TreatmentEntry};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
    #[error("Item not found")]
    NotFound,
    #[error("Invalid data format: {0}")]
    InvalidData(String),
    #[error("Record store call timed out")]
    Timeout,
}

#[async_trait]
pub trait PredictionRepository: Send + Sync {
    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<(), RepositoryError>;

    /// All records, newest first.
    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, RepositoryError>;

    async fn delete_prediction(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TreatmentRepository: Send + Sync {
    async fn find_treatment(
        &self,
        disease_name: &str,
        locale: &str,
    ) -> Result<Option<TreatmentEntry>, RepositoryError>;

    /// Insert or replace the entry for (disease_name, locale).
    async fn upsert_treatment(&self, entry: &TreatmentEntry) -> Result<(), RepositoryError>;
}
