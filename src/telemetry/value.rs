//! Loosely-typed telemetry values and the snapshot that holds them.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// One field of a telemetry section.
///
/// The monitoring service reports the same logical measurement in several
/// shapes depending on the board and software release, so every reading is
/// kept as an untyped tree until a section mapper resolves it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Duration(Duration),
    Sequence(Vec<FieldValue>),
    Mapping(BTreeMap<String, FieldValue>),
    Null,
}

impl FieldValue {
    /// Build a mapping from `(key, value)` pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        match self {
            Self::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Whether this value is a mapping containing `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// True for values that carry no data: null, zero, empty text or
    /// containers, `false` and a zero duration.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Number(n) => *n == 0.0,
            Self::Bool(b) => !b,
            Self::Text(s) => s.is_empty(),
            Self::Duration(d) => d.is_zero(),
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(map) => map.is_empty(),
        }
    }

    /// Interpret this value as an elapsed duration.
    ///
    /// Accepts native durations and the `timedelta` text form
    /// (`"2 days, 3:04:05.250000"`, `"0:12:00"`) found in JSON dumps of the
    /// monitoring service.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            Self::Text(s) => parse_timedelta(s),
            _ => None,
        }
    }

    /// Render this value as a descriptive attribute string.
    pub fn to_attribute(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Duration(d) => d.as_secs_f64().to_string(),
            Self::Null => "unknown".to_string(),
            Self::Sequence(_) | Self::Mapping(_) => serde_json::Value::from(self).to_string(),
        }
    }
}

fn parse_timedelta(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (days, clock) = match text.split_once(", ") {
        Some((days, clock)) => {
            let count = days
                .strip_suffix(" days")
                .or_else(|| days.strip_suffix(" day"))?;
            (count.trim().parse::<u64>().ok()?, clock)
        }
        None => (0, text),
    };

    let mut parts = clock.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let whole = days
        .checked_mul(86_400)?
        .checked_add(hours.checked_mul(3_600)?)?
        .checked_add(minutes * 60)?;
    Duration::from_secs(whole).checked_add(Duration::from_secs_f64(seconds))
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&FieldValue> for serde_json::Value {
    fn from(value: &FieldValue) -> Self {
        use serde_json::Value;
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Duration(d) => serde_json::Number::from_f64(d.as_secs_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Sequence(items) => Value::Array(items.iter().map(Value::from).collect()),
            FieldValue::Mapping(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Duration> for FieldValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One point-in-time read of every telemetry section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    sections: BTreeMap<String, FieldValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from a JSON object keyed by section name.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a section.
    pub fn insert(&mut self, name: impl Into<String>, payload: impl Into<FieldValue>) {
        self.sections.insert(name.into(), payload.into());
    }

    /// Builder form of [`Snapshot::insert`].
    pub fn with_section(mut self, name: impl Into<String>, payload: impl Into<FieldValue>) -> Self {
        self.insert(name, payload);
        self
    }

    /// The payload of `name`, or `None` when the section is absent or carries no data.
    pub fn section(&self, name: &str) -> Option<&FieldValue> {
        self.sections.get(name).filter(|payload| !payload.is_empty())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_keeps_shapes() {
        let value = FieldValue::from(json!({"val": [1, 2], "name": "GPU", "on": true, "x": null}));
        let map = value.as_mapping().unwrap();
        assert_eq!(
            map["val"],
            FieldValue::Sequence(vec![FieldValue::Number(1.0), FieldValue::Number(2.0)])
        );
        assert_eq!(map["name"], FieldValue::Text("GPU".into()));
        assert_eq!(map["on"], FieldValue::Bool(true));
        assert_eq!(map["x"], FieldValue::Null);
    }

    #[test]
    fn test_emptiness_matches_presence_rules() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::Number(0.0).is_empty());
        assert!(FieldValue::mapping(Vec::<(String, f64)>::new()).is_empty());
        assert!(!FieldValue::Number(0.5).is_empty());
        assert!(!FieldValue::mapping([("a", 1.0)]).is_empty());
    }

    #[test]
    fn test_timedelta_parsing() {
        assert_eq!(
            FieldValue::from("0:01:30").as_duration(),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            FieldValue::from("2 days, 3:04:05").as_duration(),
            Some(Duration::from_secs(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5))
        );
        assert_eq!(
            FieldValue::from("1 day, 0:00:00.500000").as_duration(),
            Some(Duration::from_millis(86_400_500))
        );
        assert_eq!(FieldValue::from("soon").as_duration(), None);
        assert_eq!(FieldValue::from("1:75:00").as_duration(), None);
        assert_eq!(FieldValue::Number(12.0).as_duration(), None);
    }

    #[test]
    fn test_timedelta_overflow_is_rejected() {
        assert_eq!(FieldValue::from("5124095576030431:00:59").as_duration(), None);
        assert_eq!(
            FieldValue::from("999999999999999 days, 0:00:00").as_duration(),
            None
        );
        assert_eq!(FieldValue::from("0:00:nan").as_duration(), None);
    }

    #[test]
    fn test_attribute_rendering() {
        assert_eq!(FieldValue::from("R35").to_attribute(), "R35");
        assert_eq!(FieldValue::Number(5.0).to_attribute(), "5");
        assert_eq!(FieldValue::Number(5.1).to_attribute(), "5.1");
        assert_eq!(FieldValue::Null.to_attribute(), "unknown");
        assert_eq!(FieldValue::Bool(true).to_attribute(), "True");
    }

    #[test]
    fn test_snapshot_sections() {
        let snapshot = Snapshot::from_json_str(r#"{"cpu": {"CPU1": 10}, "gpu": {}, "fan": 0}"#)
            .expect("valid snapshot");
        assert!(snapshot.section("cpu").is_some());
        assert!(snapshot.section("gpu").is_none());
        assert!(snapshot.section("fan").is_none());
        assert!(snapshot.section("disk").is_none());
        assert_eq!(snapshot.section_names().count(), 3);
        assert!(!snapshot.is_empty());
        assert!(Snapshot::new().is_empty());
    }
}
