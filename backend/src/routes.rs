use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;
use serde_json::json;
use shared::LocaleQuery;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::pipeline::{PredictionRequest, PredictionService};

const FILE_FIELD: &str = "file";

/// Upper bound on a single uploaded image, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict/").route(web::post().to(handle_predict)))
        .service(web::resource("/predictions/").route(web::get().to(list_predictions)))
        .service(web::resource("/predictions/{id}").route(web::delete().to(delete_prediction)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn read_upload(
    payload: &mut Multipart,
    limit: usize,
) -> Result<(String, Vec<u8>), PipelineError> {
    let malformed = |e: actix_multipart::MultipartError| {
        PipelineError::InvalidInput(format!("Malformed multipart body: {}", e))
    };

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        if field.name() != Some(FILE_FIELD) {
            while field.try_next().await.map_err(malformed)?.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .unwrap_or_default();
        if filename.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "Uploaded file has no filename".to_string(),
            ));
        }

        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if image_data.len() + chunk.len() > limit {
                return Err(PipelineError::UploadTooLarge(limit));
            }
            image_data.extend_from_slice(&chunk);
        }
        if image_data.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Uploaded file is empty".to_string(),
            ));
        }
        return Ok((filename, image_data));
    }

    Err(PipelineError::InvalidInput(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

async fn handle_predict(
    service: web::Data<PredictionService>,
    limit: web::Data<UploadLimit>,
    query: web::Query<LocaleQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse, PipelineError> {
    let (filename, image) = read_upload(&mut payload, limit.0).await?;
    log::info!(
        "Prediction request for {} ({} bytes, locale={})",
        filename,
        image.len(),
        query.locale
    );

    let response = service
        .predict(PredictionRequest {
            image,
            filename,
            locale: query.into_inner().locale,
        })
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

async fn list_predictions(
    service: web::Data<PredictionService>,
    query: web::Query<LocaleQuery>,
) -> Result<HttpResponse, PipelineError> {
    let views = service.list_predictions(&query.locale).await?;
    Ok(HttpResponse::Ok().json(views))
}

async fn delete_prediction(
    service: web::Data<PredictionService>,
    path: web::Path<String>,
) -> Result<HttpResponse, PipelineError> {
    let id = Uuid::parse_str(&path.into_inner())
        .map_err(|e| PipelineError::InvalidInput(format!("Invalid prediction id: {}", e)))?;
    service.delete_prediction(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
