use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// An itinerary activity location tied to a city. Rows are created on demand
/// when a generated itinerary mentions a place we have not stored yet, with
/// placeholder rating/cost until a later enrichment fills them in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub city_id: ObjectId,
    pub name: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub cost: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
