//! Loads treatment text into the treatments table.
//!
//! Usage: `seed-treatments [path/to/treatments.yaml]`. The file maps
//! `disease -> locale -> text`. Without a file the built-in English
//! remedies are written.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use plantpal::config::defaults;
use plantpal::db::dynamodb_repository::DynamoDbRepository;
use plantpal::db::seed::{
    default_entries, missing_english_entries, parse_seed_file, seed_treatments,
};
use plantpal::inference::labels::DiseaseClasses;

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Missing environment variable: {}", name))
}

async fn run() -> Result<(), String> {
    let seed_path = env::args()
        .nth(1)
        .or_else(|| env::var("TREATMENTS_SEED_PATH").ok())
        .map(PathBuf::from);

    let entries = match &seed_path {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            parse_seed_file(&source).map_err(|e| e.to_string())?
        }
        None => {
            log::info!("No seed file given, writing built-in English treatments");
            default_entries()
        }
    };

    let region = env::var("AWS_REGION").unwrap_or_else(|_| defaults::AWS_REGION.to_string());
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region))
        .load()
        .await;

    let repository = DynamoDbRepository::new(
        DynamoDbClient::new(&aws_config),
        required("DYNAMODB_PREDICTIONS_TABLE")?,
        required("DYNAMODB_TREATMENTS_TABLE")?,
    );

    let written = seed_treatments(&repository, &entries)
        .await
        .map_err(|e| e.to_string())?;
    log::info!("Wrote {} treatment entries", written);

    let labels_path = env::var("DISEASE_LABELS_PATH").ok().map(PathBuf::from);
    let classes = DiseaseClasses::load(labels_path.as_deref()).map_err(|e| e.to_string())?;
    let missing = missing_english_entries(&repository, &classes)
        .await
        .map_err(|e| e.to_string())?;
    if missing.is_empty() {
        log::info!("Every disease class has an English treatment");
    } else {
        log::warn!("Still missing English treatment for: {}", missing.join(", "));
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
