//! Stay sourcing: generated candidates are enriched, gated, upserted, and
//! topped up from previously stored rows when generation comes up short.

use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::stay::{Stay, StayType};
use crate::services::gemini_service::strip_code_fences;
use crate::services::places_service::{PlaceDetails, PlacesService};

pub const STAY_TARGET: usize = 3;

const FALLBACK_FETCH_LIMIT: i64 = 10;
const DEFAULT_CLEANLINESS_SCORE: f64 = 8.5;
const DEFAULT_PRICE_PER_NIGHT: i64 = 3000;

/// Raw candidate shape from the generative model, before validation.
#[derive(Debug, Deserialize)]
pub struct GeneratedStay {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub stay_type: String,
    #[serde(default)]
    pub area: String,
    pub price_per_night: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeneratedStays {
    stays: Vec<GeneratedStay>,
}

/// A candidate that survived validation and is ready for enrichment.
#[derive(Debug, Clone)]
pub struct StayCandidate {
    pub name: String,
    pub stay_type: StayType,
    pub area: String,
    pub price_per_night: i64,
}

pub fn build_stay_prompt(destination: &str, preferred: Option<StayType>) -> String {
    let preference_rule = match preferred {
        Some(stay_type) => format!("- ALL stays MUST be type \"{}\"\n", stay_type.as_str()),
        None => String::new(),
    };

    format!(
        r#"
Return ONLY valid JSON. No markdown, no explanation.

Generate exactly 3 REAL stay options in {destination}, India.
These must be actual hotels or accommodations that exist and are searchable on Google Maps.

Rules:
- "type" must be one of: Hotel, Airbnb, Luxury
{preference_rule}- "price_per_night" in realistic INR (integer)
- No duplicate names
- For tier-2 cities use real, well-known local hotels

Return ONLY:
{{
  "stays": [
    {{
      "name": "string",
      "type": "Hotel | Airbnb | Luxury",
      "area": "string",
      "price_per_night": number
    }}
  ]
}}"#
    )
}

/// Parse the model's stay payload. The text is untrusted: strip fences,
/// decode, and treat any failure or malformed shape as an empty list. A
/// parse error never reaches the caller.
pub fn parse_stay_response(raw: &str) -> Vec<GeneratedStay> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<GeneratedStays>(&cleaned) {
        Ok(parsed) => parsed.stays,
        Err(err) => {
            println!("[stays] Gemini parse failed: {}", err);
            Vec::new()
        }
    }
}

/// Drop candidates with a blank name, a type outside the enumeration, or a
/// type that contradicts an active preference. Missing prices default.
pub fn filter_candidates(
    raw: Vec<GeneratedStay>,
    preferred: Option<StayType>,
) -> Vec<StayCandidate> {
    raw.into_iter()
        .filter_map(|candidate| {
            if candidate.name.trim().is_empty() {
                return None;
            }
            let stay_type = StayType::parse(&candidate.stay_type)?;
            if let Some(preferred) = preferred {
                if stay_type != preferred {
                    return None;
                }
            }
            Some(StayCandidate {
                name: candidate.name,
                stay_type,
                area: candidate.area,
                price_per_night: candidate
                    .price_per_night
                    .map(|price| price as i64)
                    .unwrap_or(DEFAULT_PRICE_PER_NIGHT),
            })
        })
        .collect()
}

/// The completeness gate: a candidate without both a photo reference and
/// coordinates is never persisted.
pub fn has_required_enrichment(details: Option<&PlaceDetails>) -> bool {
    match details {
        Some(details) => {
            details
                .photo_reference
                .as_deref()
                .is_some_and(|r| !r.is_empty())
                && details.latitude.is_some()
        }
        None => false,
    }
}

/// Update document for an existing row: only non-null enrichment fields,
/// so a fresh null never clobbers a populated column.
pub fn build_update_doc(details: &PlaceDetails) -> Document {
    let mut update = doc! {};
    if let Some(rating) = details.rating {
        update.insert("rating", rating);
    }
    if let Some(review_count) = details.review_count {
        update.insert("review_count", review_count);
    }
    if let Some(photo_reference) = details.photo_reference.as_deref() {
        update.insert("photo_reference", photo_reference);
    }
    if let Some(description) = details.description.as_deref() {
        update.insert("description", description);
    }
    if let Some(google_maps_url) = details.google_maps_url.as_deref() {
        update.insert("google_maps_url", google_maps_url);
    }
    if let Some(latitude) = details.latitude {
        update.insert("latitude", latitude);
    }
    if let Some(longitude) = details.longitude {
        update.insert("longitude", longitude);
    }
    update
}

/// One pass of the store fallback: a filter, a sort order, and a label for
/// the logs. Passes are applied in order against an accumulating result set.
pub struct FallbackPass {
    pub label: &'static str,
    pub filter: Document,
    pub sort: Document,
}

/// Successively looser store queries used to top a short result set up to
/// the target. The last pass only exists when a preference was set, and
/// drops it entirely.
pub fn fallback_passes(city_id: ObjectId, preferred: Option<StayType>) -> Vec<FallbackPass> {
    let mut base = doc! { "city_id": city_id };
    if let Some(preferred) = preferred {
        base.insert("type", preferred.as_str());
    }

    // Filtering on image_url rather than photo_reference: both are written
    // together during enrichment, and image_url is the one the frontend needs.
    let mut with_image = base.clone();
    with_image.insert("image_url", doc! { "$ne": null });

    let mut passes = vec![
        FallbackPass {
            label: "with image, best rated",
            filter: with_image,
            sort: doc! { "rating": -1 },
        },
        FallbackPass {
            label: "any stay, most recent",
            filter: base,
            sort: doc! { "created_at": -1 },
        },
    ];

    if preferred.is_some() {
        passes.push(FallbackPass {
            label: "any type, most recent",
            filter: doc! { "city_id": city_id },
            sort: doc! { "created_at": -1 },
        });
    }

    passes
}

/// Popularity-weighted score: favors well-reviewed places over merely
/// highly-rated-but-obscure ones.
pub fn popularity_score(stay: &Stay) -> f64 {
    let rating = stay.rating.unwrap_or(0.0);
    let reviews = stay.review_count.unwrap_or(1) as f64;
    rating * (reviews + 1.0).ln()
}

/// Dedup by id, rank by popularity score, truncate to the target count.
pub fn rank_stays(mut stays: Vec<Stay>) -> Vec<Stay> {
    let mut seen = HashSet::new();
    stays.retain(|stay| match stay.id {
        Some(id) => seen.insert(id),
        None => true,
    });

    stays.sort_by(|a, b| {
        popularity_score(b)
            .partial_cmp(&popularity_score(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    stays.truncate(STAY_TARGET);
    stays
}

/// Resolve the image to send to the frontend: a fresh URL built from the
/// stored photo reference wins, then whatever image_url was stored, then
/// nothing (the frontend shows a placeholder).
pub fn resolve_image_url(stay: &Stay, places: &PlacesService) -> Option<String> {
    if let Some(url) = places.photo_url(stay.photo_reference.as_deref()) {
        return Some(url);
    }
    stay.image_url.clone()
}

pub struct StayService {
    client: Arc<Client>,
}

impl StayService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection(&self) -> Collection<Stay> {
        self.client.database("TripPlanner").collection("Stays")
    }

    /// Walk enriched candidates in provider-call order, skip any that fail
    /// the completeness gate, and upsert the rest until the target count is
    /// reached. Persistence failures skip the candidate, never the request.
    pub async fn admit_and_persist(
        &self,
        city_id: ObjectId,
        enriched: Vec<(StayCandidate, Option<PlaceDetails>)>,
        places: &PlacesService,
    ) -> Vec<Stay> {
        let mut saved = Vec::new();

        for (candidate, details) in enriched {
            if saved.len() >= STAY_TARGET {
                break;
            }

            let details = match details {
                Some(details) if has_required_enrichment(Some(&details)) => details,
                _ => {
                    println!(
                        "[stays] Skipping \"{}\" - incomplete Google enrichment",
                        candidate.name
                    );
                    continue;
                }
            };

            let image_url = places.photo_url(details.photo_reference.as_deref());
            if let Some(stay) = self.upsert_stay(city_id, &candidate, &details, image_url).await {
                println!("[stays] Saved: \"{}\"", stay.name);
                saved.push(stay);
            }
        }

        saved
    }

    /// Insert-or-update keyed on (city_id, name). The native upsert carries
    /// the enrichment fields in $set and the insert-only fields in
    /// $setOnInsert; if the driver call fails, fall back to a manual
    /// find-then-insert/update sequence. Total failure logs and skips.
    async fn upsert_stay(
        &self,
        city_id: ObjectId,
        candidate: &StayCandidate,
        details: &PlaceDetails,
        image_url: Option<String>,
    ) -> Option<Stay> {
        let collection = self.collection();
        let filter = doc! { "city_id": city_id, "name": candidate.name.as_str() };
        let now = DateTime::now();

        let mut set_doc = build_update_doc(details);
        set_doc.insert("updated_at", now);

        // city_id and name are seeded from the filter on upsert
        let mut insert_doc = doc! {
            "type": candidate.stay_type.as_str(),
            "area": candidate.area.as_str(),
            "cleanliness_score": DEFAULT_CLEANLINESS_SCORE,
            "price_per_night": candidate.price_per_night,
            "created_at": now,
        };
        if let Some(url) = &image_url {
            insert_doc.insert("image_url", url.as_str());
        }

        match collection
            .find_one_and_update(
                filter.clone(),
                doc! { "$set": set_doc.clone(), "$setOnInsert": insert_doc },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
        {
            Ok(Some(stay)) => return Some(stay),
            Ok(None) => {}
            Err(err) => {
                println!(
                    "[stays] Upsert failed for \"{}\", falling back: {}",
                    candidate.name, err
                );
            }
        }

        // Manual path for stores where the upsert is unavailable
        match collection.find_one(filter).await {
            Ok(Some(existing)) => {
                let id = existing.id?;
                if let Err(err) = collection
                    .update_one(doc! { "_id": id }, doc! { "$set": set_doc })
                    .await
                {
                    eprintln!("[stays] DB save failed for \"{}\": {}", candidate.name, err);
                    return None;
                }
                match collection.find_one(doc! { "_id": id }).await {
                    Ok(stay) => stay,
                    Err(err) => {
                        eprintln!("[stays] DB save failed for \"{}\": {}", candidate.name, err);
                        None
                    }
                }
            }
            Ok(None) => {
                let mut stay = Stay {
                    id: None,
                    city_id,
                    name: candidate.name.clone(),
                    stay_type: candidate.stay_type,
                    area: candidate.area.clone(),
                    rating: details.rating,
                    review_count: details.review_count,
                    cleanliness_score: Some(DEFAULT_CLEANLINESS_SCORE),
                    price_per_night: candidate.price_per_night,
                    latitude: details.latitude,
                    longitude: details.longitude,
                    google_maps_url: details.google_maps_url.clone(),
                    photo_reference: details.photo_reference.clone(),
                    image_url,
                    description: details.description.clone(),
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                match collection.insert_one(&stay).await {
                    Ok(result) => {
                        stay.id = result.inserted_id.as_object_id();
                        Some(stay)
                    }
                    Err(err) => {
                        eprintln!("[stays] DB save failed for \"{}\": {}", candidate.name, err);
                        None
                    }
                }
            }
            Err(err) => {
                eprintln!("[stays] DB save failed for \"{}\": {}", candidate.name, err);
                None
            }
        }
    }

    /// Top the collected set up toward the target from previously stored
    /// rows, one fallback pass at a time, skipping ids already collected.
    pub async fn top_up_from_store(
        &self,
        city_id: ObjectId,
        preferred: Option<StayType>,
        collected: &mut Vec<Stay>,
    ) -> Result<(), mongodb::error::Error> {
        let collection = self.collection();
        let mut seen: HashSet<ObjectId> = collected.iter().filter_map(|stay| stay.id).collect();

        for pass in fallback_passes(city_id, preferred) {
            if collected.len() >= STAY_TARGET {
                break;
            }

            let cursor = collection
                .find(pass.filter)
                .sort(pass.sort)
                .limit(FALLBACK_FETCH_LIMIT)
                .await?;
            let stays: Vec<Stay> = cursor.try_collect().await?;
            println!(
                "[stays] Fallback pass \"{}\": {} rows",
                pass.label,
                stays.len()
            );

            for stay in stays {
                if collected.len() >= STAY_TARGET {
                    break;
                }
                if let Some(id) = stay.id {
                    if seen.insert(id) {
                        collected.push(stay);
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay(id_byte: u8, rating: Option<f64>, review_count: Option<i64>) -> Stay {
        Stay {
            id: Some(ObjectId::from_bytes([id_byte; 12])),
            city_id: ObjectId::from_bytes([1; 12]),
            name: format!("Stay {}", id_byte),
            stay_type: StayType::Hotel,
            area: "Center".to_string(),
            rating,
            review_count,
            cleanliness_score: None,
            price_per_night: 3000,
            latitude: Some(26.9),
            longitude: Some(75.8),
            google_maps_url: None,
            photo_reference: Some("ref".to_string()),
            image_url: None,
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn details(photo: Option<&str>, latitude: Option<f64>) -> PlaceDetails {
        PlaceDetails {
            photo_reference: photo.map(str::to_string),
            latitude,
            ..PlaceDetails::default()
        }
    }

    #[test]
    fn test_parse_stay_response_handles_fences_and_garbage() {
        let fenced = "```json\n{\"stays\":[{\"name\":\"Taj Palace\",\"type\":\"Luxury\",\"area\":\"Center\",\"price_per_night\":9000}]}\n```";
        let parsed = parse_stay_response(fenced);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, "Taj Palace");

        assert!(parse_stay_response("not json at all").is_empty());
        assert!(parse_stay_response("{\"stays\": 42}").is_empty());
        assert!(parse_stay_response("{\"hotels\": []}").is_empty());
    }

    #[test]
    fn test_filter_candidates_drops_invalid_entries() {
        let raw = vec![
            GeneratedStay {
                name: "  ".to_string(),
                stay_type: "Hotel".to_string(),
                area: String::new(),
                price_per_night: None,
            },
            GeneratedStay {
                name: "Rambagh Palace".to_string(),
                stay_type: "Resort".to_string(),
                area: String::new(),
                price_per_night: None,
            },
            GeneratedStay {
                name: "Hotel Pearl".to_string(),
                stay_type: "Hotel".to_string(),
                area: "MI Road".to_string(),
                price_per_night: Some(2500.0),
            },
        ];

        let valid = filter_candidates(raw, None);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "Hotel Pearl");
        assert_eq!(valid[0].price_per_night, 2500);
    }

    #[test]
    fn test_filter_candidates_enforces_preference() {
        let raw = vec![
            GeneratedStay {
                name: "Hotel Pearl".to_string(),
                stay_type: "Hotel".to_string(),
                area: String::new(),
                price_per_night: None,
            },
            GeneratedStay {
                name: "Taj Palace".to_string(),
                stay_type: "Luxury".to_string(),
                area: String::new(),
                price_per_night: None,
            },
        ];

        let valid = filter_candidates(raw, Some(StayType::Luxury));
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "Taj Palace");
        // And the default price applies when the model omits one
        assert_eq!(valid[0].price_per_night, DEFAULT_PRICE_PER_NIGHT);
    }

    #[test]
    fn test_completeness_gate() {
        assert!(has_required_enrichment(Some(&details(Some("ref"), Some(26.9)))));

        assert!(!has_required_enrichment(None));
        assert!(!has_required_enrichment(Some(&details(None, Some(26.9)))));
        assert!(!has_required_enrichment(Some(&details(Some("ref"), None))));
        assert!(!has_required_enrichment(Some(&details(Some(""), Some(26.9)))));
    }

    #[test]
    fn test_update_doc_skips_null_fields() {
        let partial = PlaceDetails {
            rating: Some(4.5),
            review_count: None,
            latitude: Some(26.9),
            longitude: None,
            google_maps_url: None,
            photo_reference: Some("ref".to_string()),
            image_url: None,
            description: None,
        };

        let update = build_update_doc(&partial);
        assert_eq!(update.get_f64("rating").unwrap(), 4.5);
        assert_eq!(update.get_str("photo_reference").unwrap(), "ref");
        assert!(!update.contains_key("review_count"));
        assert!(!update.contains_key("description"));
        assert!(!update.contains_key("longitude"));
    }

    #[test]
    fn test_fallback_passes_without_preference() {
        let city_id = ObjectId::from_bytes([1; 12]);
        let passes = fallback_passes(city_id, None);

        assert_eq!(passes.len(), 2);
        assert!(passes[0].filter.contains_key("image_url"));
        assert_eq!(passes[0].sort.get_i32("rating").unwrap(), -1);
        assert!(!passes[1].filter.contains_key("image_url"));
        assert_eq!(passes[1].sort.get_i32("created_at").unwrap(), -1);
        // No preference, so no preference-dropping pass
        assert!(!passes.iter().any(|p| p.label == "any type, most recent"));
    }

    #[test]
    fn test_fallback_passes_with_preference() {
        let city_id = ObjectId::from_bytes([1; 12]);
        let passes = fallback_passes(city_id, Some(StayType::Airbnb));

        assert_eq!(passes.len(), 3);
        assert_eq!(passes[0].filter.get_str("type").unwrap(), "Airbnb");
        assert_eq!(passes[1].filter.get_str("type").unwrap(), "Airbnb");
        // Last resort drops the preference entirely
        assert!(!passes[2].filter.contains_key("type"));
    }

    #[test]
    fn test_popularity_favors_review_volume_at_equal_rating() {
        let obscure = stay(1, Some(4.8), Some(3));
        let popular = stay(2, Some(4.8), Some(2000));
        assert!(popularity_score(&popular) > popularity_score(&obscure));

        let ranked = rank_stays(vec![obscure, popular]);
        assert_eq!(ranked[0].name, "Stay 2");
    }

    #[test]
    fn test_rank_stays_dedups_and_truncates() {
        let duplicate = stay(1, Some(4.0), Some(100));
        let stays = vec![
            duplicate.clone(),
            duplicate,
            stay(2, Some(4.9), Some(500)),
            stay(3, Some(3.5), Some(50)),
            stay(4, Some(4.2), Some(800)),
        ];

        let ranked = rank_stays(stays);
        assert_eq!(ranked.len(), STAY_TARGET);
        let ids: Vec<_> = ranked.iter().filter_map(|s| s.id).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_missing_rating_scores_zero() {
        let unrated = stay(1, None, Some(10000));
        assert_eq!(popularity_score(&unrated), 0.0);
    }

    #[test]
    fn test_stay_prompt_includes_preference_rule() {
        let prompt = build_stay_prompt("Jaipur", Some(StayType::Luxury));
        assert!(prompt.contains("ALL stays MUST be type \"Luxury\""));
        assert!(prompt.contains("Generate exactly 3 REAL stay options in Jaipur, India."));

        let no_pref = build_stay_prompt("Jaipur", None);
        assert!(!no_pref.contains("ALL stays MUST"));
    }
}
