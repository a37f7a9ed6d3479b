use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};

use crate::services::places_service::{PhotoProxyError, PlacesService};

// photo_reference is stable for the same place, so cache aggressively
const PHOTO_CACHE_CONTROL: &str = "public, max-age=86400, stale-while-revalidate=604800";

#[derive(serde::Deserialize)]
pub struct PhotoQuery {
    #[serde(rename = "ref")]
    photo_ref: Option<String>,
}

/*
    /api/place-photo?ref=<photo_reference>

    Proxies Places photo requests so the API key never reaches the browser
    and stored photo URLs never expire.
*/
pub async fn get_place_photo(
    params: web::Query<PhotoQuery>,
    places: web::Data<PlacesService>,
) -> impl Responder {
    let reference = match params.photo_ref.as_deref() {
        Some(reference) if !reference.is_empty() => reference.to_string(),
        _ => return HttpResponse::BadRequest().body("Missing ref param"),
    };

    if !places.has_api_key() {
        return HttpResponse::InternalServerError().body("API key not configured");
    }

    match places.fetch_photo(&reference).await {
        Ok(photo) => HttpResponse::Ok()
            .content_type(photo.content_type.as_str())
            .insert_header(("Cache-Control", PHOTO_CACHE_CONTROL))
            .body(photo.bytes),
        Err(PhotoProxyError::KeyMissing) => {
            HttpResponse::InternalServerError().body("API key not configured")
        }
        Err(PhotoProxyError::Upstream(status)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            HttpResponse::build(status).body("Failed to fetch image from Google")
        }
        Err(PhotoProxyError::Request(err)) => {
            eprintln!("place-photo proxy error: {}", err);
            HttpResponse::InternalServerError().body("Internal error")
        }
    }
}
