use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client,
};
use std::sync::Arc;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const SERVER_SELECTION_TIMEOUT_SECS: u64 = 10;
const MAX_POOL_SIZE: u32 = 10;
const MIN_POOL_SIZE: u32 = 1;

/// Build the shared client every handler borrows. Connectivity is checked
/// with a ping up front; a failed ping only warns, since the store may come
/// up after the API does and requests fail fast on their own timeouts.
pub async fn create_mongo_client(uri: &str) -> Arc<Client> {
    println!("Connecting to MongoDB: {}", uri);

    let mut options = ClientOptions::parse(uri)
        .await
        .expect("MONGODB_URI is not a valid MongoDB connection string");

    options.connect_timeout = Some(Duration::from_secs(CONNECT_TIMEOUT_SECS));
    options.server_selection_timeout = Some(Duration::from_secs(SERVER_SELECTION_TIMEOUT_SECS));
    options.max_pool_size = Some(MAX_POOL_SIZE);
    options.min_pool_size = Some(MIN_POOL_SIZE);
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

    let client = Client::with_options(options).expect("Failed to create MongoDB client");

    match client
        .database("TripPlanner")
        .run_command(doc! { "ping": 1 })
        .await
    {
        Ok(_) => println!("MongoDB ping succeeded"),
        Err(e) => eprintln!("WARNING: MongoDB ping failed, continuing anyway: {}", e),
    }

    Arc::new(client)
}
