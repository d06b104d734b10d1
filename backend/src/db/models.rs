use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::PredictionView;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub image_url: String,
    pub crop_name: String,
    pub disease_name: String,
    pub severity: f32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentEntry {
    pub disease_name: String,
    pub locale: String,
    pub treatment: String,
}

impl PredictionRecord {
    pub fn new(image_url: String, crop_name: String, disease_name: String, severity: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_url,
            crop_name,
            disease_name,
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn into_view(self, treatment: String) -> PredictionView {
        PredictionView {
            id: self.id,
            image_url: self.image_url,
            crop_name: self.crop_name,
            disease_name: self.disease_name,
            severity: self.severity,
            created_at: self.created_at,
            treatment,
        }
    }
}

/// Newest first; equal timestamps keep a stable order by id.
pub fn sort_newest_first(records: &mut [PredictionRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

impl TreatmentEntry {
    pub fn new(
        disease_name: impl Into<String>,
        locale: impl Into<String>,
        treatment: impl Into<String>,
    ) -> Self {
        Self {
            disease_name: disease_name.into(),
            locale: locale.into(),
            treatment: treatment.into(),
        }
    }
}
