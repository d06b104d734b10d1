use serde::Deserialize;
use std::path::Path;

/// Classifier output order. Index `i` of the probability vector is `DEFAULT_LABELS[i]`.
pub const DEFAULT_LABELS: [&str; 17] = [
    "bean_rust",
    "maize_blight",
    "maize_healthy",
    "maize_gray_leaf_spot",
    "maize_common_rust",
    "bean_healthy",
    "bean_angular_leaf_spot",
    "tomato_bacterial_spot",
    "tomato_early_blight",
    "tomato_late_blight",
    "tomato_leaf_mold",
    "tomato_septoria_leaf_spot",
    "tomato_spider_mites_two-spotted_spider_mite",
    "tomato_target_spot",
    "tomato_tomato_yellow_leaf_curl_virus",
    "tomato_tomato_mosaic_virus",
    "tomato_healthy",
];

#[derive(Debug, thiserror::Error)]
pub enum LabelsError {
    #[error("Failed to read labels file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse labels file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Labels file must list at least one disease class")]
    Empty,
    #[error("Duplicate disease class: {0}")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct LabelsFile {
    labels: Vec<String>,
}

/// Ordered disease codes, one per classifier output index.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseClasses {
    labels: Vec<String>,
}

impl Default for DiseaseClasses {
    fn default() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiseaseClasses {
    pub fn new(labels: Vec<String>) -> Result<Self, LabelsError> {
        if labels.is_empty() {
            return Err(LabelsError::Empty);
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(LabelsError::Duplicate(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    /// Accepts either a bare YAML sequence or a `labels:` mapping.
    pub fn from_yaml(source: &str) -> Result<Self, LabelsError> {
        let labels = match serde_yaml::from_str::<Vec<String>>(source) {
            Ok(labels) => labels,
            Err(_) => serde_yaml::from_str::<LabelsFile>(source)?.labels,
        };
        Self::new(labels)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, LabelsError> {
        match path {
            Some(path) => {
                let source = std::fs::read_to_string(path)?;
                let classes = Self::from_yaml(&source)?;
                log::info!(
                    "Loaded {} disease classes from {}",
                    classes.len(),
                    path.display()
                );
                Ok(classes)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
