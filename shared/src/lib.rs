use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LOCALE: &str = "en";

/// Body returned by `POST /predict/`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub image_url: String,
    pub disease: String,
    pub severity: f32,
    pub treatment: String,
}

/// One row of `GET /predictions/`, rendered in the caller's locale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionView {
    pub id: Uuid,
    pub image_url: String,
    pub crop_name: String,
    pub disease_name: String,
    pub severity: f32,
    pub created_at: DateTime<Utc>,
    pub treatment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ErrorDetail {
    pub detail: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocaleQuery {
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl Default for LocaleQuery {
    fn default() -> Self {
        Self {
            locale: default_locale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_query_defaults_to_english() {
        let query: LocaleQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.locale, "en");
    }

    #[test]
    fn prediction_response_field_names() {
        let response = PredictionResponse {
            image_url: "https://cdn.example/leaf.jpg".into(),
            disease: "maize_blight".into(),
            severity: 0.87,
            treatment: "Use resistant seeds.".into(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["disease"], "maize_blight");
        assert_eq!(value["image_url"], "https://cdn.example/leaf.jpg");
        assert!(value.get("treatment").is_some());
    }
}
