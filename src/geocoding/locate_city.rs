use crate::geocoding::error::GeocodeError;
use crate::types::city::{City, Coordinates};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BINCODE_CACHE_FILE_NAME: &str = "geocode_cache.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// One entry of the geocoding API's `direct` answer.
#[derive(Debug, Deserialize)]
struct GeocodeEntry {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

/// Resolves city names to coordinates, remembering every answer in a bincode
/// file so repeated runs do not query the geocoder again.
pub struct CityLocator {
    cache_file: PathBuf,
    cities: HashMap<String, City>,
    client: Client,
    geo_base_url: String,
    api_key: String,
}

impl CityLocator {
    pub async fn new(
        cache_dir: &Path,
        client: Client,
        geo_base_url: &str,
        api_key: &str,
    ) -> Result<Self, GeocodeError> {
        let cache_file = cache_dir.join(BINCODE_CACHE_FILE_NAME);

        let cities = if cache_file.exists() {
            let path_clone = cache_file.clone();
            tokio::task::spawn_blocking(move || Self::get_cached_cities(&path_clone)).await??
        } else {
            HashMap::new()
        };

        Ok(Self {
            cache_file,
            cities,
            client,
            geo_base_url: geo_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn cache_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    fn get_cached_cities(cache_path: &Path) -> Result<HashMap<String, City>, GeocodeError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| GeocodeError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded, _) =
            bincode::serde::decode_from_slice::<HashMap<String, City>, _>(&bytes, BINCODE_CONFIG)
                .map_err(|e| GeocodeError::CacheDecode(cache_path.to_path_buf(), Box::new(e)))?;
        Ok(decoded)
    }

    async fn cache_cities(&self) -> Result<(), GeocodeError> {
        let cities = self.cities.clone();
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(cities, BINCODE_CONFIG)
                .map_err(|e| GeocodeError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(&self.cache_file, &bincode_data)
            .await
            .map_err(|e| GeocodeError::CacheWrite(self.cache_file.clone(), e))?;
        Ok(())
    }

    /// Returns the cached city if known, without touching the network.
    pub fn cached(&self, name: &str) -> Option<&City> {
        self.cities.get(&Self::cache_key(name))
    }

    /// Resolves `name`, asking the geocoder only on a cache miss.
    pub async fn locate(&mut self, name: &str) -> Result<City, GeocodeError> {
        if let Some(city) = self.cached(name) {
            info!(
                "Geocode cache hit for {}: {}, {}",
                name, city.coordinates.lat, city.coordinates.lon
            );
            return Ok(city.clone());
        }

        let entries = self.fetch(name).await?;
        let city = first_city(name, entries)?;
        info!(
            "{} ({}): {}, {}",
            name, city.resolved_name, city.coordinates.lat, city.coordinates.lon
        );

        if let Err(e) = self.remember(city.clone()).await {
            // The lookup itself succeeded; a stale cache only costs a request next run.
            warn!("Failed to persist geocode cache: {}", e);
        }
        Ok(city)
    }

    /// Adds `city` to the cache under its requested name and persists the cache.
    pub async fn remember(&mut self, city: City) -> Result<(), GeocodeError> {
        self.cities.insert(Self::cache_key(&city.name), city);
        self.cache_cities().await
    }

    async fn fetch(&self, name: &str) -> Result<Vec<GeocodeEntry>, GeocodeError> {
        // The key travels as a query parameter and is kept out of error messages.
        let url = format!("{}/direct", self.geo_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", name), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(url.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => GeocodeError::HttpStatus {
                        url,
                        status,
                        source: e.without_url(),
                    },
                    None => GeocodeError::NetworkRequest(url, e.without_url()),
                });
            }
        };

        response
            .json::<Vec<GeocodeEntry>>()
            .await
            .map_err(|e| GeocodeError::JsonDecode(url, e.without_url()))
    }
}

fn first_city(name: &str, entries: Vec<GeocodeEntry>) -> Result<City, GeocodeError> {
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::CityNotFound(name.to_string()))?;
    Ok(City {
        name: name.trim().to_string(),
        resolved_name: entry.name,
        country: entry.country,
        state: entry.state,
        coordinates: Coordinates::new(entry.lat, entry.lon),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Nothing listens here, so any request made by a test fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn guangzhou() -> City {
        City {
            name: "Guangzhou".to_string(),
            resolved_name: "Guangzhou".to_string(),
            country: Some("CN".to_string()),
            state: Some("Guangdong".to_string()),
            coordinates: Coordinates::new(23.1301, 113.2592),
        }
    }

    #[test]
    fn test_first_city_uses_requested_name() {
        let entries: Vec<GeocodeEntry> = serde_json::from_str(
            r#"[{"name":"Beijing","local_names":{"zh":"北京市"},"lat":40.19,"lon":116.41,"country":"CN"}]"#,
        )
        .unwrap();
        let city = first_city(" Beijing ", entries).unwrap();
        assert_eq!(city.name, "Beijing");
        assert_eq!(city.country.as_deref(), Some("CN"));
        assert_eq!(city.state, None);
        assert_eq!(city.coordinates, Coordinates::new(40.19, 116.41));
    }

    #[test]
    fn test_first_city_empty_answer() {
        let err = first_city("Atlantis", Vec::new()).unwrap_err();
        assert!(matches!(err, GeocodeError::CityNotFound(name) if name == "Atlantis"));
    }

    #[tokio::test]
    async fn test_cache_round_trip_avoids_network() -> Result<(), GeocodeError> {
        let tmp = tempfile::tempdir().map_err(|e| GeocodeError::CacheWrite(PathBuf::new(), e))?;

        let mut locator = CityLocator::new(tmp.path(), Client::new(), UNREACHABLE, "k").await?;
        locator.remember(guangzhou()).await?;

        let mut reloaded = CityLocator::new(tmp.path(), Client::new(), UNREACHABLE, "k").await?;
        let city = reloaded.locate("  GUANGZHOU").await?;
        assert_eq!(city, guangzhou());
        Ok(())
    }

    #[tokio::test]
    async fn test_cache_miss_reports_network_error() -> Result<(), GeocodeError> {
        let tmp = tempfile::tempdir().map_err(|e| GeocodeError::CacheWrite(PathBuf::new(), e))?;
        let mut locator = CityLocator::new(tmp.path(), Client::new(), UNREACHABLE, "k").await?;
        let err = locator.locate("Shenzhen").await.unwrap_err();
        assert!(matches!(err, GeocodeError::NetworkRequest(..)));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_decode_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(BINCODE_CACHE_FILE_NAME), [0xFFu8; 3]).unwrap();
        let result = CityLocator::new(tmp.path(), Client::new(), UNREACHABLE, "k").await;
        assert!(matches!(result, Err(GeocodeError::CacheDecode(..))));
    }

    #[tokio::test]
    async fn test_locate_fetches_once_then_caches() -> Result<(), GeocodeError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Guangzhou"))
            .and(query_param("limit", "1"))
            .and(query_param("appid", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "name": "Guangzhou",
                "lat": 23.1301,
                "lon": 113.2592,
                "country": "CN",
                "state": "Guangdong"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().map_err(|e| GeocodeError::CacheWrite(PathBuf::new(), e))?;
        let mut locator = CityLocator::new(tmp.path(), Client::new(), &server.uri(), "k").await?;
        assert_eq!(locator.locate("Guangzhou").await?, guangzhou());
        assert!(tmp.path().join(BINCODE_CACHE_FILE_NAME).exists());

        let mut reloaded =
            CityLocator::new(tmp.path(), Client::new(), &server.uri(), "k").await?;
        assert_eq!(reloaded.locate("guangzhou").await?, guangzhou());
        Ok(())
    }

    #[tokio::test]
    async fn test_locate_empty_answer_is_city_not_found() -> Result<(), GeocodeError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().map_err(|e| GeocodeError::CacheWrite(PathBuf::new(), e))?;
        let mut locator = CityLocator::new(tmp.path(), Client::new(), &server.uri(), "k").await?;
        let err = locator.locate("Atlantis").await.unwrap_err();
        assert!(matches!(err, GeocodeError::CityNotFound(ref name) if name == "Atlantis"));
        assert!(locator.cached("Atlantis").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_locate_rejected_key_is_http_status() -> Result<(), GeocodeError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().map_err(|e| GeocodeError::CacheWrite(PathBuf::new(), e))?;
        let mut locator =
            CityLocator::new(tmp.path(), Client::new(), &server.uri(), "secret-key").await?;
        let err = locator.locate("Shenzhen").await.unwrap_err();
        assert!(matches!(
            &err,
            GeocodeError::HttpStatus { status, .. } if status.as_u16() == 401
        ));
        assert!(!format!("{err:?}").contains("secret-key"));
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires OPENWEATHER_API_KEY and network access"]
    async fn test_locate_live() -> Result<(), GeocodeError> {
        let key = std::env::var(crate::config::API_KEY_ENV).unwrap_or_default();
        let tmp = tempfile::tempdir().unwrap();
        let mut locator = CityLocator::new(
            tmp.path(),
            Client::new(),
            crate::config::DEFAULT_GEO_BASE_URL,
            &key,
        )
        .await?;
        let city = locator.locate("Shenzhen").await?;
        assert!((city.coordinates.lat - 22.5).abs() < 1.0);
        Ok(())
    }
}
