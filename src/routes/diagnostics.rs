use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::services::gemini_service::GeminiService;
use crate::services::places_service::PlacesService;

/*
    /api/test-places

    Raw passthrough of a fixed Places text search, for checking key setup
    without going through the generation pipeline.
*/
pub async fn test_places(places: web::Data<PlacesService>) -> impl Responder {
    match places.raw_text_search("The Oberoi Delhi").await {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(err) => {
            HttpResponse::InternalServerError().json(json!({ "error": err.to_string() }))
        }
    }
}

/*
    /api/test-gemini
*/
pub async fn test_gemini(gemini: web::Data<GeminiService>) -> impl Responder {
    match gemini.generate("Say hello in one sentence.").await {
        Ok(text) => HttpResponse::Ok().json(json!({ "success": true, "text": text })),
        Err(err) => HttpResponse::InternalServerError()
            .json(json!({ "success": false, "error": err.to_string() })),
    }
}
