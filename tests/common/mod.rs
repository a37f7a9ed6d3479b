use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use mongodb::options::ClientOptions;
use std::sync::Arc;
use std::time::Duration;

use tripcraft_api::routes;
use tripcraft_api::services::gemini_service::GeminiService;
use tripcraft_api::services::places_service::PlacesService;

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
    pub gemini: GeminiService,
    pub places: PlacesService,
}

impl TestApp {
    pub async fn new() -> Self {
        // No Places key by default, so tests exercise the degraded paths
        // deterministically regardless of the environment.
        Self::with_places(PlacesService::new(None)).await
    }

    pub async fn with_places(places: PlacesService) -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        // Build the client without the startup ping so the suite runs
        // without a live MongoDB. Handlers that reach the store fail fast
        // instead of hanging on server selection.
        let mut options = ClientOptions::parse(&mongo_uri)
            .await
            .expect("Failed to parse MongoDB URI");
        options.server_selection_timeout = Some(Duration::from_secs(2));
        let client = Arc::new(
            mongodb::Client::with_options(options).expect("Failed to create MongoDB client"),
        );

        Self {
            client,
            gemini: GeminiService::new("test-key"),
            places,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
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
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.gemini.clone()))
            .app_data(web::Data::new(self.places.clone()))
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
    }
}
