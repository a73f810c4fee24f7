//! Defines the geocoded city a weather summary is requested for.

use serde::{Deserialize, Serialize};

/// A geographical position using latitude and longitude in decimal degrees.
///
/// # Examples
///
/// ```
/// use weather_archive::Coordinates;
///
/// let shenzhen = Coordinates::new(22.5429, 114.0596);
/// assert_eq!(shenzhen.lat, 22.5429);
/// assert_eq!(shenzhen.lon, 114.0596);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A city resolved by the geocoding API.
///
/// `name` is the name the caller asked for. The geocoder may answer with a
/// differently spelled or localized name, which is kept in `resolved_name`
/// for logging only, so that per-day files and the merged table stay keyed
/// on the configured city names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// The city name as requested (e.g. "Shenzhen").
    pub name: String,
    /// The name reported by the geocoder.
    pub resolved_name: String,
    /// ISO 3166 country code, if the geocoder reported one.
    pub country: Option<String>,
    /// State or province, if the geocoder reported one.
    pub state: Option<String>,
    /// Position used for the weather request.
    pub coordinates: Coordinates,
}

impl City {
    /// File-name safe form of the city name: lowercase alphanumerics in any
    /// script, everything else mapped to `_`.
    ///
    /// ```
    /// use weather_archive::City;
    ///
    /// assert_eq!(City::slug_of("New York"), "new_york");
    /// assert_eq!(City::slug_of("São Paulo"), "são_paulo");
    /// assert_eq!(City::slug_of("深圳"), "深圳");
    /// ```
    pub fn slug_of(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        for c in name.trim().chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else {
                slug.push('_');
            }
        }
        slug
    }

    pub fn slug(&self) -> String {
        Self::slug_of(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_keeps_alphanumerics() {
        assert_eq!(City::slug_of("Beijing"), "beijing");
        assert_eq!(City::slug_of("  Guangzhou "), "guangzhou");
        assert_eq!(City::slug_of("Saint-Étienne 2"), "saint_étienne_2");
        assert_eq!(City::slug_of("上海 市"), "上海_市");
    }

    #[test]
    fn test_slug_distinguishes_cjk_names() {
        assert_ne!(City::slug_of("深圳"), City::slug_of("上海"));
        assert_ne!(City::slug_of("北京"), City::slug_of("广州"));
    }

    #[test]
    fn test_city_slug_uses_requested_name() {
        let city = City {
            name: "Shanghai".to_string(),
            resolved_name: "上海市".to_string(),
            country: Some("CN".to_string()),
            state: None,
            coordinates: Coordinates::new(31.2323, 121.4691),
        };
        assert_eq!(city.slug(), "shanghai");
    }
}
