use actix_web::{web, HttpResponse, Responder};
use futures::future::join_all;
use mongodb::Client;
use serde_json::json;
use std::sync::Arc;

use crate::models::generate::{BudgetSummary, GenerateRequest, GenerateResponse};
use crate::models::stay::StayType;
use crate::services::budget_service::BudgetAllocator;
use crate::services::city_service::CityService;
use crate::services::gemini_service::GeminiService;
use crate::services::itinerary_service::{
    build_itinerary_prompt, parse_itinerary_response, ItineraryService,
};
use crate::services::places_service::{PlaceDetails, PlacesService};
use crate::services::stay_service::{
    build_stay_prompt, filter_candidates, parse_stay_response, rank_stays, resolve_image_url,
    StayCandidate, StayService, STAY_TARGET,
};

/*
    /api/generate
*/
pub async fn generate_trip(
    data: web::Data<Arc<Client>>,
    gemini: web::Data<GeminiService>,
    places: web::Data<PlacesService>,
    input: web::Json<GenerateRequest>,
) -> impl Responder {
    let client: Arc<Client> = data.get_ref().clone();
    let request = input.into_inner();

    let destination = match request.destination_city.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return HttpResponse::BadRequest().json(json!({ "error": "Destination city required" }))
        }
    };

    let budget_summary = BudgetAllocator::allocate(request.total_budget.unwrap_or(0.0));
    let preferred = request
        .stay_preference
        .as_deref()
        .and_then(StayType::from_preference);

    match run_pipeline(
        client,
        &gemini,
        &places,
        &destination,
        request.duration,
        preferred,
        budget_summary,
    )
    .await
    {
        Ok(response) => response,
        Err(err) => {
            eprintln!("[generate] Unhandled error: {}", err);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "Failed to generate itinerary" }))
        }
    }
}

async fn run_pipeline(
    client: Arc<Client>,
    gemini: &GeminiService,
    places: &PlacesService,
    destination: &str,
    duration: u32,
    preferred: Option<StayType>,
    budget_summary: BudgetSummary,
) -> Result<HttpResponse, Box<dyn std::error::Error>> {
    // Step 1: make sure the city exists, creating it from a Places lookup
    // on first sight.
    let city_service = CityService::new(client.clone());
    let city = city_service.find_or_create(destination, places).await?;
    let city_id = city.id.ok_or("City row is missing an id")?;

    // Step 2: ask the model for stay candidates. A failed call or an
    // unparseable payload degrades to an empty list; the store fallback
    // below still gets a chance to fill the response.
    let candidates: Vec<StayCandidate> = match gemini
        .generate_with_retry(&build_stay_prompt(destination, preferred))
        .await
    {
        Ok(raw) => filter_candidates(parse_stay_response(&raw), preferred),
        Err(err) => {
            println!("[stays] Stay generation failed: {}", err);
            Vec::new()
        }
    };
    println!("[stays] Gemini: {} valid stays", candidates.len());

    // Enrich all candidates in parallel; each lookup is bounded by the
    // Places client timeout and resolves to None on any failure.
    let queries: Vec<String> = candidates
        .iter()
        .map(|candidate| format!("{} {} India", candidate.name, destination))
        .collect();
    let details: Vec<Option<PlaceDetails>> =
        join_all(queries.iter().map(|query| places.text_search(query))).await;
    let enriched: Vec<(StayCandidate, Option<PlaceDetails>)> =
        candidates.into_iter().zip(details).collect();

    let stay_service = StayService::new(client.clone());
    let mut stays = stay_service.admit_and_persist(city_id, enriched, places).await;

    if stays.len() < STAY_TARGET {
        println!("[stays] {}/{} - store fallback", stays.len(), STAY_TARGET);
        stay_service
            .top_up_from_store(city_id, preferred, &mut stays)
            .await?;
    }

    let mut stays = rank_stays(stays);
    // Rebuild image URLs server-side so stale or null stored values still
    // come back with a working URL.
    for stay in &mut stays {
        stay.image_url = resolve_image_url(stay, places);
    }
    println!("[stays] Returning {} stays", stays.len());

    // Step 3: the itinerary itself. This is the primary deliverable, so an
    // unparseable payload fails the request instead of degrading.
    let raw = gemini
        .generate_with_retry(&build_itinerary_prompt(destination, duration))
        .await?;
    let plan = match parse_itinerary_response(&raw) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("[generate] Invalid itinerary JSON: {}", err);
            return Ok(
                HttpResponse::InternalServerError().json(json!({ "error": "Invalid itinerary JSON" }))
            );
        }
    };

    let itinerary_service = ItineraryService::new(client);
    itinerary_service.register_places(city_id, &plan).await;

    Ok(HttpResponse::Ok().json(GenerateResponse {
        budget_summary,
        stays,
        why_this_plan_works: plan.why_this_plan_works,
        itinerary: plan.itinerary,
    }))
}
