//! Treatment table seeding.

use std::collections::BTreeMap;

use super::models::TreatmentEntry;
use super::{RepositoryError, TreatmentRepository};
use crate::inference::labels::DiseaseClasses;

/// English remedies for the built-in disease classes.
pub const DEFAULT_ENGLISH_TREATMENTS: [(&str, &str); 17] = [
    ("bean_rust", "Remove infected leaves, apply neem-based fungicide."),
    ("maize_blight", "Use resistant seeds, crop rotation, apply copper fungicide."),
    ("maize_healthy", "No treatment needed, continue normal care."),
    ("maize_gray_leaf_spot", "Remove infected leaves, apply appropriate fungicide."),
    ("maize_common_rust", "Remove rust spots, avoid overhead watering."),
    ("bean_healthy", "No treatment needed, continue normal care."),
    ("bean_angular_leaf_spot", "Remove infected leaves, use organic fungicides."),
    ("tomato_bacterial_spot", "Use copper-based sprays, remove infected leaves."),
    ("tomato_early_blight", "Apply neem or sulfur fungicides, remove affected leaves."),
    ("tomato_late_blight", "Use resistant varieties, remove infected leaves, apply fungicide."),
    ("tomato_leaf_mold", "Improve air circulation, apply copper fungicide."),
    ("tomato_septoria_leaf_spot", "Remove infected leaves, apply organic fungicide."),
    ("tomato_spider_mites_two-spotted_spider_mite", "Spray neem oil or insecticidal soap."),
    ("tomato_target_spot", "Remove affected leaves, apply copper fungicide."),
    ("tomato_tomato_yellow_leaf_curl_virus", "Use resistant varieties, control whiteflies."),
    ("tomato_tomato_mosaic_virus", "Remove infected plants, sanitize tools."),
    ("tomato_healthy", "No treatment needed, continue normal care."),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to write treatment {disease}/{locale}: {source}")]
    Write {
        disease: String,
        locale: String,
        source: RepositoryError,
    },
}

pub fn default_entries() -> Vec<TreatmentEntry> {
    DEFAULT_ENGLISH_TREATMENTS
        .iter()
        .map(|(disease, text)| TreatmentEntry::new(*disease, "en", *text))
        .collect()
}

/// Parses `{disease: {locale: text}}`.
pub fn parse_seed_file(source: &str) -> Result<Vec<TreatmentEntry>, SeedError> {
    let table: BTreeMap<String, BTreeMap<String, String>> = serde_yaml::from_str(source)?;
    Ok(table
        .into_iter()
        .flat_map(|(disease, locales)| {
            locales.into_iter().map(move |(locale, text)| {
                TreatmentEntry::new(disease.clone(), locale.trim().to_lowercase(), text)
            })
        })
        .collect())
}

pub async fn seed_treatments(
    repo: &dyn TreatmentRepository,
    entries: &[TreatmentEntry],
) -> Result<usize, SeedError> {
    for entry in entries {
        repo.upsert_treatment(entry)
            .await
            .map_err(|source| SeedError::Write {
                disease: entry.disease_name.clone(),
                locale: entry.locale.clone(),
                source,
            })?;
        log::debug!("Upserted treatment {}/{}", entry.disease_name, entry.locale);
    }
    Ok(entries.len())
}

/// Disease classes with no English entry, i.e. classes whose fallback would be the sentinel.
pub async fn missing_english_entries(
    repo: &dyn TreatmentRepository,
    classes: &DiseaseClasses,
) -> Result<Vec<String>, RepositoryError> {
    let mut missing = Vec::new();
    for disease in classes.iter() {
        if repo.find_treatment(disease, "en").await?.is_none() {
            missing.push(disease.to_string());
        }
    }
    Ok(missing)
}
