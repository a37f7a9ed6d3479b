use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayType {
    Hotel,
    Airbnb,
    Luxury,
}

impl StayType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StayType::Hotel => "Hotel",
            StayType::Airbnb => "Airbnb",
            StayType::Luxury => "Luxury",
        }
    }

    /// Parse the internal type name. Anything outside the enumeration is None.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Hotel" => Some(StayType::Hotel),
            "Airbnb" => Some(StayType::Airbnb),
            "Luxury" => Some(StayType::Luxury),
            _ => None,
        }
    }

    /// Map the UI preference labels to the internal enumeration.
    /// Unrecognized labels mean "no preference".
    pub fn from_preference(label: &str) -> Option<Self> {
        match label {
            "Budget Hotel" => Some(StayType::Hotel),
            "Luxury Hotel" => Some(StayType::Luxury),
            "Airbnb" => Some(StayType::Airbnb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stay {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub city_id: ObjectId,
    pub name: String,
    #[serde(rename = "type")]
    pub stay_type: StayType,
    pub area: String,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub cleanliness_score: Option<f64>,
    pub price_per_night: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub google_maps_url: Option<String>,
    pub photo_reference: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}
