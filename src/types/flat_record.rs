//! A single weather observation flattened into `column -> value` string pairs,
//! the shape in which it is written to a per-day CSV file.

use serde_json::Value;

/// Column holding the city name the observation was requested for.
pub const CITY_COLUMN: &str = "city_name";
/// Column holding the observation date (`YYYY-MM-DD`), as reported by the API.
pub const DATE_COLUMN: &str = "date";
/// Separator used when joining nested JSON keys into a column name.
pub const KEY_SEPARATOR: &str = "_";

/// An ordered list of unique `(column, value)` pairs.
///
/// Nested JSON objects are flattened by joining keys with `_`, so
/// `{"temperature": {"max": 31.2}}` becomes the column `temperature_max`.
/// Array elements are addressed by index (`alerts_0_event`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, String)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a JSON document. Returns `None` for anything but a non-empty
    /// object, which is what an empty API answer looks like.
    ///
    /// ```
    /// use serde_json::json;
    /// use weather_archive::FlatRecord;
    ///
    /// let record = FlatRecord::from_json(&json!({
    ///     "date": "2024-07-01",
    ///     "temperature": {"min": 26.1, "max": 31.2},
    /// }))
    /// .unwrap();
    /// assert_eq!(record.get("temperature_max"), Some("31.2"));
    /// assert_eq!(record.date(), Some("2024-07-01"));
    /// ```
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => {
                let mut record = Self::new();
                flatten_into(value, "", &mut record);
                Some(record)
            }
            _ => None,
        }
    }

    /// Sets `column` to `value`, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.insert(CITY_COLUMN, city);
        self
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn date(&self) -> Option<&str> {
        self.get(DATE_COLUMN)
    }

    pub fn city(&self) -> Option<&str> {
        self.get(CITY_COLUMN)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{KEY_SEPARATOR}{key}")
    }
}

fn flatten_into(value: &Value, prefix: &str, record: &mut FlatRecord) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, nested) in map {
                flatten_into(nested, &join_key(prefix, key), record);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(nested, &join_key(prefix, &index.to_string()), record);
            }
        }
        Value::Object(_) | Value::Array(_) | Value::Null => record.insert(prefix, ""),
        Value::String(s) => record.insert(prefix, s.as_str()),
        Value::Number(n) => record.insert(prefix, n.to_string()),
        Value::Bool(b) => record.insert(prefix, b.to_string()),
    }
}
