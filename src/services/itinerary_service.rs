use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::models::generate::ItineraryPlan;
use crate::models::place::Place;
use crate::services::gemini_service::strip_code_fences;

// Placeholder values for places first seen in a generated itinerary,
// pending a future enrichment pass.
const PLACEHOLDER_RATING: f64 = 4.0;
const PLACEHOLDER_COST: i64 = 0;

pub fn build_itinerary_prompt(destination: &str, duration: u32) -> String {
    format!(
        r#"
Generate a {duration} day travel itinerary for {destination}, India.
Return ONLY valid JSON. No markdown.

{{
  "whyThisPlanWorks": "string",
  "itinerary": [
    {{
      "day": number,
      "areaCovered": "string",
      "activities": [
        {{
          "title": "string",
          "type": "attraction | restaurant | hidden_gem",
          "timeOfDay": "Morning | Afternoon | Evening",
          "shortDescription": "string",
          "estimatedDuration": "string",
          "entryFee": number,
          "costIncludedInBudget": number
        }}
      ],
      "dailyEstimatedSpend": number
    }}
  ]
}}"#
    )
}

/// Decode the model's itinerary payload. Unlike stay parsing, a failure here
/// is fatal for the request: the itinerary is the primary deliverable, so
/// the caller turns the error into a 500 instead of degrading.
pub fn parse_itinerary_response(raw: &str) -> Result<ItineraryPlan, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(raw))
}

pub struct ItineraryService {
    client: Arc<Client>,
}

impl ItineraryService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection(&self) -> Collection<Place> {
        self.client.database("TripPlanner").collection("Places")
    }

    /// Record activity locations the itinerary mentions that we have not
    /// seen for this city yet. Best-effort: failures log and move on.
    pub async fn register_places(&self, city_id: ObjectId, plan: &ItineraryPlan) {
        let collection = self.collection();

        for day in &plan.itinerary {
            for activity in &day.activities {
                let name = activity.title.trim();
                if name.is_empty() {
                    continue;
                }

                match collection
                    .find_one(doc! { "city_id": city_id, "name": name })
                    .await
                {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        let now = DateTime::now();
                        let place = Place {
                            id: None,
                            city_id,
                            name: name.to_string(),
                            category: Some(activity.activity_type.clone()),
                            rating: Some(PLACEHOLDER_RATING),
                            cost: Some(PLACEHOLDER_COST),
                            latitude: None,
                            longitude: None,
                            description: Some(activity.short_description.clone()),
                            created_at: Some(now),
                            updated_at: Some(now),
                        };
                        if let Err(err) = collection.insert_one(&place).await {
                            eprintln!("[places] Failed to save place \"{}\": {}", name, err);
                        }
                    }
                    Err(err) => {
                        eprintln!("[places] Lookup failed for place \"{}\": {}", name, err);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PLAN: &str = r#"{
        "whyThisPlanWorks": "Covers the old city first, then the outskirts.",
        "itinerary": [
            {
                "day": 1,
                "areaCovered": "Old City",
                "activities": [
                    {
                        "title": "City Palace",
                        "type": "attraction",
                        "timeOfDay": "Morning",
                        "shortDescription": "Royal residence turned museum.",
                        "estimatedDuration": "2 hours",
                        "entryFee": 700,
                        "costIncludedInBudget": 700
                    }
                ],
                "dailyEstimatedSpend": 2500
            }
        ]
    }"#;

    #[test]
    fn test_parse_valid_itinerary() {
        let plan = parse_itinerary_response(VALID_PLAN).unwrap();
        assert_eq!(plan.itinerary.len(), 1);
        assert_eq!(plan.itinerary[0].activities[0].title, "City Palace");
        assert_eq!(plan.itinerary[0].daily_estimated_spend, 2500.0);
    }

    #[test]
    fn test_parse_fenced_itinerary() {
        let fenced = format!("```json\n{}\n```", VALID_PLAN);
        let plan = parse_itinerary_response(&fenced).unwrap();
        assert!(!plan.why_this_plan_works.is_empty());
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        assert!(parse_itinerary_response("Sure! Here is your itinerary:").is_err());
        // A payload without the itinerary array is malformed, not partial
        assert!(parse_itinerary_response("{\"whyThisPlanWorks\":\"x\"}").is_err());
    }

    #[test]
    fn test_missing_numeric_fields_default() {
        let sparse = r#"{
            "itinerary": [
                {
                    "activities": [ { "title": "Amber Fort" } ]
                }
            ]
        }"#;

        let plan = parse_itinerary_response(sparse).unwrap();
        let activity = &plan.itinerary[0].activities[0];
        assert_eq!(activity.entry_fee, 0.0);
        assert_eq!(activity.cost_included_in_budget, 0.0);
        assert_eq!(plan.itinerary[0].daily_estimated_spend, 0.0);
    }

    #[test]
    fn test_itinerary_prompt_mentions_duration_and_city() {
        let prompt = build_itinerary_prompt("Jaipur", 3);
        assert!(prompt.contains("Generate a 3 day travel itinerary for Jaipur, India."));
        assert!(prompt.contains("whyThisPlanWorks"));
    }
}
