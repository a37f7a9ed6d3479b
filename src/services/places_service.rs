//! Google Places lookups used to enrich generated stays and cities.
//!
//! Every lookup here is best-effort: a missing API key, a timeout, a denial
//! or an empty result set all resolve to "no data" for the caller instead of
//! an error. The photo proxy path is the one place that reports upstream
//! failures, since the caller needs the status to pass through.

use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use url::Url;

const PLACES_API_BASE: &str = "https://maps.googleapis.com/maps/api/place";
const SEARCH_TIMEOUT_SECS: u64 = 8;
const PHOTO_MAX_WIDTH: &str = "800";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    rating: Option<f64>,
    user_ratings_total: Option<i64>,
    geometry: Option<Geometry>,
    place_id: Option<String>,
    photos: Option<Vec<PlacePhoto>>,
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct PlacePhoto {
    photo_reference: Option<String>,
}

/// Enrichment data extracted from the first text-search result.
#[derive(Debug, Clone, Default)]
pub struct PlaceDetails {
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub google_maps_url: Option<String>,
    pub photo_reference: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

pub struct PhotoPayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub enum PhotoProxyError {
    KeyMissing,
    Upstream(u16),
    Request(reqwest::Error),
}

impl fmt::Display for PhotoProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhotoProxyError::KeyMissing => write!(f, "GOOGLE_PLACES_API_KEY not set"),
            PhotoProxyError::Upstream(status) => write!(f, "Upstream returned status {}", status),
            PhotoProxyError::Request(err) => write!(f, "Request error: {}", err),
        }
    }
}

impl Error for PhotoProxyError {}

#[derive(Clone)]
pub struct PlacesService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PlacesService {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .expect("Failed to build Places HTTP client");

        Self {
            client,
            api_key,
            base_url: PLACES_API_BASE.to_string(),
        }
    }

    /// Read `GOOGLE_PLACES_API_KEY`. A missing key is not fatal: every lookup
    /// degrades to "no enrichment data" instead.
    pub fn from_env() -> Self {
        let api_key = env::var("GOOGLE_PLACES_API_KEY").ok();
        if api_key.is_none() {
            println!("[places] GOOGLE_PLACES_API_KEY not set, enrichment disabled");
        }
        Self::new(api_key)
    }

    /// Point the service at a different API host. Used by tests to aim at a fake.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Text search for a single query, never raising: any failure mode logs
    /// and resolves to None.
    pub async fn text_search(&self, query: &str) -> Option<PlaceDetails> {
        let api_key = match self.api_key.as_deref() {
            Some(key) => key,
            None => {
                println!("[places] GOOGLE_PLACES_API_KEY not set");
                return None;
            }
        };

        let url = match Url::parse_with_params(
            &format!("{}/textsearch/json", self.base_url),
            &[("query", query), ("key", api_key)],
        ) {
            Ok(url) => url,
            Err(err) => {
                eprintln!("[places] Bad search URL for \"{}\": {}", query, err);
                return None;
            }
        };

        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(err) => {
                eprintln!("[places] Fetch error for \"{}\": {}", query, err);
                return None;
            }
        };

        if !response.status().is_success() {
            println!("[places] HTTP {} for: \"{}\"", response.status(), query);
            return None;
        }

        let data: TextSearchResponse = match response.json().await {
            Ok(data) => data,
            Err(err) => {
                eprintln!("[places] Failed to decode response for \"{}\": {}", query, err);
                return None;
            }
        };

        if data.status == "REQUEST_DENIED" {
            // Usually an API key with HTTP-referrer restrictions; server-side
            // requests carry no Referer header, so Google rejects them.
            eprintln!(
                "[places] REQUEST_DENIED for \"{}\". Error: {}",
                query,
                data.error_message.as_deref().unwrap_or("n/a")
            );
            return None;
        }

        let result = match data.results.first() {
            Some(result) => result,
            None => {
                println!("[places] No results for: \"{}\"", query);
                return None;
            }
        };

        // Store the raw reference string, not a built URL; photo_url()
        // constructs a fresh URL on demand so stored rows never go stale.
        let photo_reference = result
            .photos
            .as_ref()
            .and_then(|photos| photos.first())
            .and_then(|photo| photo.photo_reference.clone());

        let location = result.geometry.as_ref().and_then(|g| g.location.as_ref());

        Some(PlaceDetails {
            rating: result.rating,
            review_count: result.user_ratings_total,
            latitude: location.map(|l| l.lat),
            longitude: location.map(|l| l.lng),
            google_maps_url: result
                .place_id
                .as_ref()
                .map(|id| format!("https://www.google.com/maps/place/?q=place_id:{}", id)),
            image_url: self.photo_url(photo_reference.as_deref()),
            photo_reference,
            description: result.formatted_address.clone(),
        })
    }

    /// Raw text-search passthrough backing the debug probe endpoint.
    pub async fn raw_text_search(&self, query: &str) -> Result<serde_json::Value, Box<dyn Error>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or("GOOGLE_PLACES_API_KEY not set")?;

        let url = Url::parse_with_params(
            &format!("{}/textsearch/json", self.base_url),
            &[("query", query), ("key", api_key)],
        )?;

        let response = self.client.get(url.as_str()).send().await?;
        Ok(response.json().await?)
    }

    /// Build a direct photo URL from a stored reference. Server-side only,
    /// so the key never reaches the browser. None if either piece is missing.
    pub fn photo_url(&self, reference: Option<&str>) -> Option<String> {
        let api_key = self.api_key.as_deref()?;
        let reference = reference.filter(|r| !r.is_empty())?;

        Url::parse_with_params(
            &format!("{}/photo", self.base_url),
            &[
                ("maxwidth", PHOTO_MAX_WIDTH),
                ("photo_reference", reference),
                ("key", api_key),
            ],
        )
        .ok()
        .map(String::from)
    }

    /// Fetch the actual image bytes for the proxy endpoint. Google redirects
    /// to the CDN image; reqwest follows it.
    pub async fn fetch_photo(&self, reference: &str) -> Result<PhotoPayload, PhotoProxyError> {
        let url = self
            .photo_url(Some(reference))
            .ok_or(PhotoProxyError::KeyMissing)?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(PhotoProxyError::Request)?;

        if !response.status().is_success() {
            return Err(PhotoProxyError::Upstream(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(PhotoProxyError::Request)?
            .to_vec();

        Ok(PhotoPayload {
            content_type,
            bytes,
        })
    }
}
