use actix_web::{web, HttpResponse, Responder};
use bson::doc;
use futures::TryStreamExt;
use mongodb::{Client, Collection};
use serde_json::json;
use std::sync::Arc;

use crate::models::city::{City, CityWithPlaces};
use crate::models::place::Place;

/*
    /api/cities/{city}
*/
pub async fn get_city(path: web::Path<String>, data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let name = path.into_inner();

    let cities: Collection<City> = client.database("TripPlanner").collection("Cities");

    let city = match cities.find_one(doc! { "name": name.as_str() }).await {
        Ok(Some(city)) => city,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "error": "City not found" }));
        }
        Err(err) => {
            eprintln!("Failed to find city \"{}\": {:?}", name, err);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "Failed to fetch city data" }));
        }
    };

    let places: Collection<Place> = client.database("TripPlanner").collection("Places");
    let city_places = match city.id {
        Some(city_id) => {
            match places
                .find(doc! { "city_id": city_id })
                .sort(doc! { "rating": -1 })
                .await
            {
                Ok(cursor) => match cursor.try_collect::<Vec<Place>>().await {
                    Ok(city_places) => city_places,
                    Err(err) => {
                        eprintln!("Failed to collect places for \"{}\": {:?}", name, err);
                        return HttpResponse::InternalServerError()
                            .json(json!({ "error": "Failed to fetch city data" }));
                    }
                },
                Err(err) => {
                    eprintln!("Failed to find places for \"{}\": {:?}", name, err);
                    return HttpResponse::InternalServerError()
                        .json(json!({ "error": "Failed to fetch city data" }));
                }
            }
        }
        None => Vec::new(),
    };

    HttpResponse::Ok().json(CityWithPlaces {
        city,
        places: city_places,
    })
}
