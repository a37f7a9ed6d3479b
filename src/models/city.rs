use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::models::place::Place;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// City row plus its known places, as returned by the city lookup endpoint.
#[derive(Debug, Serialize)]
pub struct CityWithPlaces {
    #[serde(flatten)]
    pub city: City,
    pub places: Vec<Place>,
}
