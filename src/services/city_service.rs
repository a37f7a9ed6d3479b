use mongodb::bson::{doc, DateTime};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::models::city::City;
use crate::services::places_service::PlacesService;

pub struct CityService {
    client: Arc<Client>,
}

impl CityService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn collection(&self) -> Collection<City> {
        self.client.database("TripPlanner").collection("Cities")
    }

    /// Look up a city by exact name, creating it on first sight. A new city
    /// gets whatever coordinates/photo the Places lookup returns; a failed
    /// lookup (or a missing key) still creates the row with null fields.
    ///
    /// Concurrent requests for the same new city can race to duplicate rows;
    /// there is no uniqueness constraint at this layer.
    pub async fn find_or_create(
        &self,
        name: &str,
        places: &PlacesService,
    ) -> Result<City, mongodb::error::Error> {
        let collection = self.collection();

        if let Some(city) = collection.find_one(doc! { "name": name }).await? {
            println!("[city] Found: {} (id={:?})", city.name, city.id);
            return Ok(city);
        }

        let details = places.text_search(name).await;
        let now = DateTime::now();

        let mut city = City {
            id: None,
            name: name.to_string(),
            country: "India".to_string(),
            description: Some(format!("{} travel destination", name)),
            latitude: details.as_ref().and_then(|d| d.latitude),
            longitude: details.as_ref().and_then(|d| d.longitude),
            image_url: details.and_then(|d| d.image_url),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let result = collection.insert_one(&city).await?;
        city.id = result.inserted_id.as_object_id();
        println!("[city] Created: {} (id={:?})", city.name, city.id);

        Ok(city)
    }
}
