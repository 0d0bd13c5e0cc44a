//! Source domain model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::source_data::SourceTypeModel;

/// Payment method discriminant of a source.
///
/// Unknown method names are kept verbatim in `Other` so new methods
/// round-trip without a library update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    Card,
    Bancontact,
    Bitcoin,
    Giropay,
    Ideal,
    SepaDebit,
    Sofort,
    ThreeDSecure,
    Other(String),
}

impl SourceType {
    /// Wire name, also the key of the method-specific payload.
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Card => "card",
            SourceType::Bancontact => "bancontact",
            SourceType::Bitcoin => "bitcoin",
            SourceType::Giropay => "giropay",
            SourceType::Ideal => "ideal",
            SourceType::SepaDebit => "sepa_debit",
            SourceType::Sofort => "sofort",
            SourceType::ThreeDSecure => "three_d_secure",
            SourceType::Other(name) => name,
        }
    }
}

impl From<String> for SourceType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "card" => SourceType::Card,
            "bancontact" => SourceType::Bancontact,
            "bitcoin" => SourceType::Bitcoin,
            "giropay" => SourceType::Giropay,
            "ideal" => SourceType::Ideal,
            "sepa_debit" => SourceType::SepaDebit,
            "sofort" => SourceType::Sofort,
            "three_d_secure" => SourceType::ThreeDSecure,
            _ => SourceType::Other(name),
        }
    }
}

impl From<&str> for SourceType {
    fn from(name: &str) -> Self {
        name.to_string().into()
    }
}

impl From<SourceType> for String {
    fn from(source_type: SourceType) -> Self {
        match source_type {
            SourceType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Pending,
    Chargeable,
    Consumed,
    Canceled,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFlow {
    Redirect,
    Receiver,
    CodeVerification,
    None,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceUsage {
    Reusable,
    SingleUse,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectStatus {
    Pending,
    Succeeded,
    Failed,
    NotRequired,
    #[serde(other)]
    Unknown,
}

/// Postal address as echoed on a source owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Owner of a source, as enriched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<SourceAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_address: Option<SourceAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRedirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RedirectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A server-confirmed payment source.
///
/// `source_type_data` always holds the raw object found under the source's
/// type key. `source_type_model` is a typed view of the same data, present
/// only for types with a registered projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SourceOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<SourceRedirect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<SourceFlow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<SourceUsage>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(skip)]
    pub source_type_data: Map<String, Value>,
    #[serde(skip)]
    pub source_type_model: Option<SourceTypeModel>,
}

impl Source {
    /// Serialized form: the common fields plus the raw data under the type key.
    ///
    /// Two sources the server has not changed between calls produce equal values.
    pub fn to_value(&self) -> Value {
        let mut value = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        value.insert("object".into(), Value::String("source".into()));
        value.insert(
            self.source_type.as_str().to_string(),
            Value::Object(self.source_type_data.clone()),
        );
        Value::Object(value)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trip_names() {
        for name in [
            "card",
            "bancontact",
            "bitcoin",
            "giropay",
            "ideal",
            "sepa_debit",
            "sofort",
            "three_d_secure",
        ] {
            let source_type = SourceType::from(name);
            assert!(!matches!(source_type, SourceType::Other(_)), "{name}");
            assert_eq!(source_type.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_source_type_is_kept() {
        let source_type = SourceType::from("alipay");
        assert_eq!(source_type, SourceType::Other("alipay".into()));
        assert_eq!(String::from(source_type), "alipay");
    }

    #[test]
    fn test_null_metadata_is_empty() {
        let source: Source =
            serde_json::from_str(r#"{"id":"src_1","type":"bitcoin","metadata":null}"#).unwrap();
        assert!(source.metadata.is_empty());
        assert_eq!(source.source_type, SourceType::Bitcoin);
    }

    #[test]
    fn test_to_value_includes_type_data() {
        let mut source: Source =
            serde_json::from_str(r#"{"id":"src_1","type":"ideal","amount":5500}"#).unwrap();
        source
            .source_type_data
            .insert("bank".into(), Value::String("rabobank".into()));

        let value = source.to_value();
        assert_eq!(value["ideal"]["bank"], "rabobank");
        assert_eq!(value["amount"], 5500);
        assert_eq!(value["type"], "ideal");
    }
}
