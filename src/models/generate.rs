use serde::{Deserialize, Serialize};

use crate::models::stay::Stay;

fn default_duration() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "destinationCity")]
    pub destination_city: Option<String>,
    #[serde(rename = "totalBudget")]
    pub total_budget: Option<f64>,
    #[serde(default = "default_duration")]
    pub duration: u32,
    /// Accepted from the form but not consumed by the pipeline yet.
    #[serde(rename = "selectedThemes", default)]
    pub selected_themes: Vec<String>,
    #[serde(rename = "stayPreference")]
    pub stay_preference: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    pub travel: i64,
    pub accommodation: i64,
    pub activities: i64,
    pub food: i64,
    pub total: f64,
}

/// The itinerary shape the generative model is asked to return. Decoding is
/// the validation step: a response that does not fit this shape fails the
/// request. The `type`/`timeOfDay` tags stay plain strings since the model
/// output is untrusted; the prompt constrains their vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryPlan {
    #[serde(rename = "whyThisPlanWorks", default)]
    pub why_this_plan_works: String,
    pub itinerary: Vec<ItineraryDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryDay {
    #[serde(default)]
    pub day: u32,
    #[serde(rename = "areaCovered", default)]
    pub area_covered: String,
    #[serde(default)]
    pub activities: Vec<ItineraryActivity>,
    #[serde(rename = "dailyEstimatedSpend", default)]
    pub daily_estimated_spend: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryActivity {
    pub title: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(rename = "timeOfDay", default)]
    pub time_of_day: String,
    #[serde(rename = "shortDescription", default)]
    pub short_description: String,
    #[serde(rename = "estimatedDuration", default)]
    pub estimated_duration: String,
    #[serde(rename = "entryFee", default)]
    pub entry_fee: f64,
    #[serde(rename = "costIncludedInBudget", default)]
    pub cost_included_in_budget: f64,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(rename = "budgetSummary")]
    pub budget_summary: BudgetSummary,
    pub stays: Vec<Stay>,
    #[serde(rename = "whyThisPlanWorks")]
    pub why_this_plan_works: String,
    pub itinerary: Vec<ItineraryDay>,
}
