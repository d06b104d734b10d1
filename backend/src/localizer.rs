//! Treatment text resolution with locale fallback.
//!
//! Lookup order is requested locale, then English, then a fixed sentinel.
//! Resolution never fails: a record-store error degrades to the sentinel.

use std::sync::Arc;
use std::time::Duration;

use crate::db::{RepositoryError, TreatmentRepository};
use crate::pipeline::bounded;
use shared::DEFAULT_LOCALE;

pub const NO_TREATMENT: &str = "No treatment available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentSource {
    Requested,
    EnglishFallback,
    Missing,
    LookupFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub text: String,
    pub source: TreatmentSource,
}

impl Resolution {
    fn sentinel(source: TreatmentSource) -> Self {
        Self {
            text: NO_TREATMENT.to_string(),
            source,
        }
    }

    pub fn fallback_used(&self) -> bool {
        self.source != TreatmentSource::Requested
    }
}

pub fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().to_lowercase();
    if locale.is_empty() {
        DEFAULT_LOCALE.to_string()
    } else {
        locale
    }
}

#[derive(Clone)]
pub struct Localizer {
    treatments: Arc<dyn TreatmentRepository>,
    timeout: Option<Duration>,
}

impl Localizer {
    pub fn new(treatments: Arc<dyn TreatmentRepository>, timeout: Option<Duration>) -> Self {
        Self {
            treatments,
            timeout,
        }
    }

    pub async fn resolve(&self, disease: &str, locale: &str) -> String {
        self.resolve_detailed(disease, locale).await.text
    }

    pub async fn resolve_detailed(&self, disease: &str, locale: &str) -> Resolution {
        let locale = normalize_locale(locale);

        let mut candidates = vec![(locale.as_str(), TreatmentSource::Requested)];
        if locale != DEFAULT_LOCALE {
            candidates.push((DEFAULT_LOCALE, TreatmentSource::EnglishFallback));
        }

        for (candidate, source) in candidates {
            match self.lookup(disease, candidate).await {
                Ok(Some(text)) => {
                    if source == TreatmentSource::EnglishFallback {
                        log::debug!(
                            "No '{}' treatment for {}, using English",
                            locale,
                            disease
                        );
                    }
                    return Resolution { text, source };
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!(
                        "Treatment lookup failed for {}/{}: {}",
                        disease,
                        candidate,
                        e
                    );
                    return Resolution::sentinel(TreatmentSource::LookupFailed);
                }
            }
        }

        log::warn!("No treatment text for {} in '{}' or English", disease, locale);
        Resolution::sentinel(TreatmentSource::Missing)
    }

    async fn lookup(&self, disease: &str, locale: &str) -> Result<Option<String>, RepositoryError> {
        let entry = bounded(
            self.timeout,
            self.treatments.find_treatment(disease, locale),
            RepositoryError::Timeout,
        )
        .await?;
        Ok(entry.map(|e| e.treatment))
    }
}
