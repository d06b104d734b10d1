use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{PredictionRecord, TreatmentEntry, sort_newest_first};
use super::{PredictionRepository, RepositoryError, TreatmentRepository};

type Item = HashMap<String, AttributeValue>;

/// Prediction records keyed by `id`; treatment entries keyed by (`disease_name`, `locale`).
#[derive(Clone)]
pub struct DynamoDbRepository {
    client: Client,
    predictions_table: String,
    treatments_table: String,
}

impl DynamoDbRepository {
    pub fn new(client: Client, predictions_table: String, treatments_table: String) -> Self {
        Self {
            client,
            predictions_table,
            treatments_table,
        }
    }

    async fn scan_all(&self, table: &str) -> Result<Vec<Item>, RepositoryError> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| {
                    log::error!("DynamoDB scan failed on {}: {:?}", table, e);
                    RepositoryError::DynamoDb(e.to_string())
                })?;

            if let Some(batch) = page.items {
                items.extend(batch);
            }
            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl PredictionRepository for DynamoDbRepository {
    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<(), RepositoryError> {
        self.client
            .put_item()
            .table_name(&self.predictions_table)
            .set_item(Some(prediction_to_item(record)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                log::error!("DynamoDB put_item failed for prediction {}: {:?}", record.id, e);
                RepositoryError::DynamoDb(e.to_string())
            })?;

        log::info!("Saved prediction {} ({})", record.id, record.disease_name);
        Ok(())
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, RepositoryError> {
        let items = self.scan_all(&self.predictions_table).await?;
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match parse_prediction_from_item(&item) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping malformed prediction row: {}", e),
            }
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete_prediction(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.predictions_table)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => {
                log::info!("Deleted prediction {}", id);
                Ok(())
            }
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if missing {
                    Err(RepositoryError::NotFound)
                } else {
                    log::error!("DynamoDB delete_item failed for prediction {}: {:?}", id, e);
                    Err(RepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }
}

#[async_trait]
impl TreatmentRepository for DynamoDbRepository {
    async fn find_treatment(
        &self,
        disease_name: &str,
        locale: &str,
    ) -> Result<Option<TreatmentEntry>, RepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.treatments_table)
            .key("disease_name", AttributeValue::S(disease_name.to_string()))
            .key("locale", AttributeValue::S(locale.to_string()))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => Ok(Some(parse_treatment_from_item(&item)?)),
            None => Ok(None),
        }
    }

    async fn upsert_treatment(&self, entry: &TreatmentEntry) -> Result<(), RepositoryError> {
        let mut item = HashMap::new();
        item.insert(
            "disease_name".to_string(),
            AttributeValue::S(entry.disease_name.clone()),
        );
        item.insert("locale".to_string(), AttributeValue::S(entry.locale.clone()));
        item.insert(
            "treatment".to_string(),
            AttributeValue::S(entry.treatment.clone()),
        );

        self.client
            .put_item()
            .table_name(&self.treatments_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| RepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }
}

fn prediction_to_item(record: &PredictionRecord) -> Item {
    let mut item = HashMap::new();
    item.insert("id".to_string(), AttributeValue::S(record.id.to_string()));
    item.insert(
        "image_url".to_string(),
        AttributeValue::S(record.image_url.clone()),
    );
    item.insert(
        "crop_name".to_string(),
        AttributeValue::S(record.crop_name.clone()),
    );
    item.insert(
        "disease_name".to_string(),
        AttributeValue::S(record.disease_name.clone()),
    );
    item.insert(
        "severity".to_string(),
        AttributeValue::N(record.severity.to_string()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(record.created_at.to_rfc3339()),
    );
    item
}

fn get_string(item: &Item, field: &str) -> Result<String, RepositoryError> {
    item.get(field)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid {}", field)))
}

fn parse_prediction_from_item(item: &Item) -> Result<PredictionRecord, RepositoryError> {
    let id = item
        .get("id")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| RepositoryError::InvalidData("Invalid prediction id".to_string()))?;

    let severity = item
        .get("severity")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<f32>().ok())
        .filter(|s| (0.0..=1.0).contains(s))
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid severity for {}", id)))?;

    let created_at = item
        .get("created_at")
        .and_then(|v| v.as_s().ok())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid created_at for {}", id)))?;

    Ok(PredictionRecord {
        id,
        image_url: get_string(item, "image_url")?,
        crop_name: get_string(item, "crop_name").unwrap_or_default(),
        disease_name: get_string(item, "disease_name")?,
        severity,
        created_at,
    })
}

fn parse_treatment_from_item(item: &Item) -> Result<TreatmentEntry, RepositoryError> {
    Ok(TreatmentEntry {
        disease_name: get_string(item, "disease_name")?,
        locale: get_string(item, "locale")?,
        treatment: get_string(item, "treatment")?,
    })
}
