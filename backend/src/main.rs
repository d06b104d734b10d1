use actix_web::{App, HttpServer, middleware, web};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::sync::Arc;

use plantpal::config::Config;
use plantpal::db::dynamodb_repository::DynamoDbRepository;
use plantpal::db::seed::missing_english_entries;
use plantpal::inference::build_classifier;
use plantpal::inference::labels::DiseaseClasses;
use plantpal::localizer::Localizer;
use plantpal::pipeline::{PipelineSettings, PredictionService};
use plantpal::routes::{UploadLimit, configure_routes};
use plantpal::storage::s3_service::S3Service;

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    log::error!("{}: {}", context, e);
    std::io::Error::other(format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let classes = DiseaseClasses::load(config.labels_path.as_deref())
        .map_err(|e| startup_error("Failed to load disease labels", e))?;
    log::info!("Loaded {} disease classes", classes.len());

    let classifier = build_classifier(&config.classifier)
        .map_err(|e| startup_error("Failed to initialise classifier", e))?;

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.storage.region.clone()))
        .load()
        .await;

    let dynamodb_client = DynamoDbClient::new(&aws_config);
    let repository = Arc::new(DynamoDbRepository::new(
        dynamodb_client,
        config.predictions_table.clone(),
        config.treatments_table.clone(),
    ));
    let images = Arc::new(S3Service::from_settings(&aws_config, &config.storage));

    match missing_english_entries(repository.as_ref(), &classes).await {
        Ok(missing) if missing.is_empty() => {
            log::info!("English treatment text present for every disease class")
        }
        Ok(missing) => log::warn!(
            "No English treatment for {} classes, responses will use the sentinel: {}",
            missing.len(),
            missing.join(", ")
        ),
        Err(e) => log::warn!("Could not audit treatment table: {}", e),
    }

    let localizer = Localizer::new(repository.clone(), config.external_call_timeout);
    let service = PredictionService::new(
        classifier,
        Arc::new(classes),
        images,
        repository,
        localizer,
        PipelineSettings {
            allowed_extensions: config.allowed_extensions.clone(),
            external_call_timeout: config.external_call_timeout,
        },
    );

    let service = web::Data::new(service);
    let upload_limit = web::Data::new(UploadLimit(config.max_upload_size));
    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .app_data(upload_limit.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
