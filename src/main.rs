use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

mod db;
mod models;
mod routes;
mod services;

use services::gemini_service::GeminiService;
use services::places_service::PlacesService;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    let gemini = GeminiService::from_env().expect("GEMINI_API_KEY must be set");
    let places = PlacesService::from_env();

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/health", web::get().to(|| async { "OK" }))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(gemini.clone()))
            .app_data(web::Data::new(places.clone()))
            .service(
                web::scope("/api")
                    .route("/generate", web::post().to(routes::generate::generate_trip))
                    .route("/cities/{city}", web::get().to(routes::city::get_city))
                    .route(
                        "/place-photo",
                        web::get().to(routes::place_photo::get_place_photo),
                    )
                    .route(
                        "/test-places",
                        web::get().to(routes::diagnostics::test_places),
                    )
                    .route(
                        "/test-gemini",
                        web::get().to(routes::diagnostics::test_gemini),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
