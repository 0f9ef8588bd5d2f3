use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_newtype!(Identity);
text_newtype!(SessionId);

impl Identity {
    /// Surrounding whitespace is dropped; an empty result is the "unknown" identity.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn unknown() -> Self {
        Self(String::new())
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    pub fn display_name(&self) -> &str {
        if self.is_unknown() {
            "Unknown"
        } else {
            &self.0
        }
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Identity::new)
    }
}

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

/// Spreadsheet backends hand out row ids as numbers or strings depending on the sheet.
impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSessionId {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawSessionId::deserialize(deserializer)? {
            RawSessionId::Text(text) => SessionId(text),
            RawSessionId::Integer(n) => SessionId(n.to_string()),
            RawSessionId::Float(n) => SessionId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TravelMode {
    Bus,
    Bike,
    Other(String),
}

impl TravelMode {
    pub fn as_str(&self) -> &str {
        match self {
            TravelMode::Bus => "Bus",
            TravelMode::Bike => "Bike",
            TravelMode::Other(name) => name,
        }
    }
}

impl From<String> for TravelMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Bus" => TravelMode::Bus,
            "Bike" => TravelMode::Bike,
            _ => TravelMode::Other(value),
        }
    }
}

impl From<&str> for TravelMode {
    fn from(value: &str) -> Self {
        TravelMode::from(value.to_string())
    }
}

impl From<TravelMode> for String {
    fn from(value: TravelMode) -> Self {
        match value {
            TravelMode::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The open check-in exactly as the backend reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "checkinId")]
    pub session_id: SessionId,
    #[serde(deserialize_with = "text_or_number")]
    pub route: String,
    pub mode: TravelMode,
    #[serde(rename = "checkinTime", default)]
    pub opened_at: String,
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bike_reading: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

/// Sheet cells such as route names like `101` can come back as JSON numbers.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(cell_text(serde_json::Value::deserialize(deserializer)?))
}

pub(crate) fn texts_or_numbers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(cell_text).collect())
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn optional_text_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) if text.trim().is_empty() => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
