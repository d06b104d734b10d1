//! In-memory collaborators for unit and HTTP tests.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{PredictionRecord, TreatmentEntry, sort_newest_first};
use crate::db::{PredictionRepository, RepositoryError, TreatmentRepository};
use crate::inference::{Classifier, ClassifierError, check_input_shape};
use crate::storage::s3_service::public_url_for;
use crate::storage::{ImageStore, ImageStoreError};

pub const TEST_PUBLIC_BASE: &str = "https://storage.test/crop-images";

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// 17 scores with `value` at `index` and the remainder spread evenly.
pub fn scores_for(index: usize, value: f32) -> Vec<f32> {
    let rest = (1.0 - value) / 16.0;
    let mut scores = vec![rest; 17];
    scores[index] = value;
    scores
}

pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb))),
        ImageFormat::Png,
    )
}

pub fn leaf_jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 3) as u8, 120 + (y as u8), 40]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub struct FixedClassifier {
    scores: Result<Vec<f32>, String>,
    delay: Option<Duration>,
    calls: Counter,
}

impl FixedClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores: Ok(scores),
            delay: None,
            calls: Counter::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            scores: Err(message.to_string()),
            delay: None,
            calls: Counter::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        self.calls.bump();
        check_input_shape(input)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.scores.clone().map_err(ClassifierError::Model)
    }
}

#[derive(Default)]
pub struct InMemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: Counter,
    fail: bool,
    delay: Option<Duration>,
}

impl InMemoryImageStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.puts.get()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<(), ImageStoreError> {
        self.puts.bump();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ImageStoreError::S3("bucket unavailable".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_url_for(TEST_PUBLIC_BASE, key)
    }
}

#[derive(Default)]
pub struct InMemoryPredictions {
    records: Mutex<Vec<PredictionRecord>>,
    fail_insert: bool,
    fail_list: bool,
    insert_delay: Option<Duration>,
}

impl InMemoryPredictions {
    pub fn failing_insert() -> Self {
        Self {
            fail_insert: true,
            ..Self::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Self::default()
        }
    }

    /// Delays every insert; listing and deletes stay immediate.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    pub fn push(&self, record: PredictionRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<PredictionRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl PredictionRepository for InMemoryPredictions {
    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<(), RepositoryError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_insert {
            return Err(RepositoryError::DynamoDb("insert rejected".to_string()));
        }
        self.push(record.clone());
        Ok(())
    }

    async fn list_predictions(&self) -> Result<Vec<PredictionRecord>, RepositoryError> {
        if self.fail_list {
            return Err(RepositoryError::DynamoDb("scan rejected".to_string()));
        }
        let mut records = self.records();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn delete_prediction(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTreatments {
    entries: Mutex<HashMap<(String, String), String>>,
    lookups: Counter,
    fail: bool,
}

impl InMemoryTreatments {
    pub fn with_entries(entries: &[(&str, &str, &str)]) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.entries.lock().unwrap();
            for (disease, locale, text) in entries {
                map.insert((disease.to_string(), locale.to_string()), text.to_string());
            }
        }
        repo
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn lookup_counter(&self) -> Counter {
        self.lookups.clone()
    }
}

#[async_trait]
impl TreatmentRepository for InMemoryTreatments {
    async fn find_treatment(
        &self,
        disease_name: &str,
        locale: &str,
    ) -> Result<Option<TreatmentEntry>, RepositoryError> {
        self.lookups.bump();
        if self.fail {
            return Err(RepositoryError::DynamoDb("translations table unavailable".to_string()));
        }
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(&(disease_name.to_string(), locale.to_string()))
            .map(|text| TreatmentEntry::new(disease_name, locale, text.clone())))
    }

    async fn upsert_treatment(&self, entry: &TreatmentEntry) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::DynamoDb("translations table unavailable".to_string()));
        }
        self.entries.lock().unwrap().insert(
            (entry.disease_name.clone(), entry.locale.clone()),
            entry.treatment.clone(),
        );
        Ok(())
    }
}
