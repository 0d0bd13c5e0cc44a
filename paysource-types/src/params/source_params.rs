//! Source parameter builder.
//!
//! One factory per payment method. Each factory takes only the fields that
//! method understands and fixes the currency when the method mandates one.
//!
//! The method-specific payload is all-or-nothing: when any of the fields a
//! method needs for its payload is missing, the whole payload is left out
//! rather than sent half-filled.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::domain::{Card, SourceType};

/// Currency of the euro-only redirect methods.
pub const EURO: &str = "eur";

/// Postal address sent inside an owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Owner sub-structure of a source request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OwnerParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressParams>,
}

impl OwnerParams {
    fn name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// Redirect sub-structure of a source request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectParams {
    pub return_url: String,
}

/// A source of a type this builder has no dedicated factory for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSource {
    pub source_type: String,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub owner: Option<OwnerParams>,
    pub return_url: Option<String>,
    pub payload: Map<String, Value>,
}

impl CustomSource {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            amount: None,
            currency: None,
            owner: None,
            return_url: None,
            payload: Map::new(),
        }
    }
}

/// Method-specific fields, one case per supported payment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMethod {
    Card(Card),
    Bancontact {
        amount: i64,
        name: String,
        return_url: String,
        statement_descriptor: Option<String>,
    },
    Bitcoin {
        amount: i64,
        currency: String,
        email: String,
    },
    Giropay {
        amount: i64,
        name: String,
        return_url: String,
        statement_descriptor: Option<String>,
    },
    Ideal {
        amount: i64,
        name: String,
        return_url: String,
        statement_descriptor: Option<String>,
        bank: Option<String>,
    },
    SepaDebit {
        name: String,
        iban: String,
        address_line1: Option<String>,
        city: String,
        postal_code: String,
        country: String,
    },
    Sofort {
        amount: i64,
        return_url: String,
        country: String,
        statement_descriptor: Option<String>,
    },
    ThreeDSecure {
        amount: i64,
        currency: String,
        return_url: String,
        card_id: String,
    },
    Custom(CustomSource),
}

/// Parameters for creating a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParams {
    method: SourceMethod,
    metadata: HashMap<String, String>,
}

impl SourceParams {
    fn from_method(method: SourceMethod) -> Self {
        Self {
            method,
            metadata: HashMap::new(),
        }
    }

    /// Card source. The card's billing address becomes the owner address.
    pub fn card(card: &Card) -> Self {
        Self::from_method(SourceMethod::Card(card.clone()))
    }

    /// Bancontact source, always in euros.
    pub fn bancontact(
        amount: i64,
        name: &str,
        return_url: &str,
        statement_descriptor: Option<&str>,
    ) -> Self {
        Self::from_method(SourceMethod::Bancontact {
            amount,
            name: name.to_string(),
            return_url: return_url.to_string(),
            statement_descriptor: statement_descriptor.map(str::to_string),
        })
    }

    /// Bitcoin receiver source; the owner carries only the email.
    pub fn bitcoin(amount: i64, currency: &str, email: &str) -> Self {
        Self::from_method(SourceMethod::Bitcoin {
            amount,
            currency: currency.to_string(),
            email: email.to_string(),
        })
    }

    /// Giropay source, always in euros.
    pub fn giropay(
        amount: i64,
        name: &str,
        return_url: &str,
        statement_descriptor: Option<&str>,
    ) -> Self {
        Self::from_method(SourceMethod::Giropay {
            amount,
            name: name.to_string(),
            return_url: return_url.to_string(),
            statement_descriptor: statement_descriptor.map(str::to_string),
        })
    }

    /// iDEAL source, always in euros.
    ///
    /// The statement descriptor and bank are sent together or not at all.
    pub fn ideal(
        amount: i64,
        name: &str,
        return_url: &str,
        statement_descriptor: Option<&str>,
        bank: Option<&str>,
    ) -> Self {
        Self::from_method(SourceMethod::Ideal {
            amount,
            name: name.to_string(),
            return_url: return_url.to_string(),
            statement_descriptor: statement_descriptor.map(str::to_string),
            bank: bank.map(str::to_string),
        })
    }

    /// SEPA direct debit source.
    pub fn sepa_debit(
        name: &str,
        iban: &str,
        address_line1: Option<&str>,
        city: &str,
        postal_code: &str,
        country: &str,
    ) -> Self {
        Self::from_method(SourceMethod::SepaDebit {
            name: name.to_string(),
            iban: iban.to_string(),
            address_line1: address_line1.map(str::to_string),
            city: city.to_string(),
            postal_code: postal_code.to_string(),
            country: country.to_string(),
        })
    }

    /// SOFORT source, always in euros.
    pub fn sofort(
        amount: i64,
        return_url: &str,
        country: &str,
        statement_descriptor: Option<&str>,
    ) -> Self {
        Self::from_method(SourceMethod::Sofort {
            amount,
            return_url: return_url.to_string(),
            country: country.to_string(),
            statement_descriptor: statement_descriptor.map(str::to_string),
        })
    }

    /// 3-D Secure source wrapping an existing card source.
    pub fn three_d_secure(amount: i64, currency: &str, return_url: &str, card_id: &str) -> Self {
        Self::from_method(SourceMethod::ThreeDSecure {
            amount,
            currency: currency.to_string(),
            return_url: return_url.to_string(),
            card_id: card_id.to_string(),
        })
    }

    /// Source of any other type.
    pub fn custom(source: CustomSource) -> Self {
        Self::from_method(SourceMethod::Custom(source))
    }

    /// Attaches free-form metadata, replacing any previous metadata.
    pub fn with_metadata<K, V>(mut self, metadata: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata = metadata
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn method(&self) -> &SourceMethod {
        &self.method
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn source_type(&self) -> SourceType {
        match &self.method {
            SourceMethod::Card(_) => SourceType::Card,
            SourceMethod::Bancontact { .. } => SourceType::Bancontact,
            SourceMethod::Bitcoin { .. } => SourceType::Bitcoin,
            SourceMethod::Giropay { .. } => SourceType::Giropay,
            SourceMethod::Ideal { .. } => SourceType::Ideal,
            SourceMethod::SepaDebit { .. } => SourceType::SepaDebit,
            SourceMethod::Sofort { .. } => SourceType::Sofort,
            SourceMethod::ThreeDSecure { .. } => SourceType::ThreeDSecure,
            SourceMethod::Custom(custom) => SourceType::from(custom.source_type.as_str()),
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match &self.method {
            SourceMethod::Bancontact { .. }
            | SourceMethod::Giropay { .. }
            | SourceMethod::Ideal { .. }
            | SourceMethod::Sofort { .. } => Some(EURO),
            SourceMethod::Bitcoin { currency, .. } | SourceMethod::ThreeDSecure { currency, .. } => {
                Some(currency.as_str())
            }
            SourceMethod::Card(card) => card.currency.as_deref(),
            SourceMethod::SepaDebit { .. } => None,
            SourceMethod::Custom(custom) => custom.currency.as_deref(),
        }
    }

    pub fn amount(&self) -> Option<i64> {
        match &self.method {
            SourceMethod::Bancontact { amount, .. }
            | SourceMethod::Bitcoin { amount, .. }
            | SourceMethod::Giropay { amount, .. }
            | SourceMethod::Ideal { amount, .. }
            | SourceMethod::Sofort { amount, .. }
            | SourceMethod::ThreeDSecure { amount, .. } => Some(*amount),
            SourceMethod::Card(_) | SourceMethod::SepaDebit { .. } => None,
            SourceMethod::Custom(custom) => custom.amount,
        }
    }

    pub fn owner(&self) -> Option<OwnerParams> {
        match &self.method {
            SourceMethod::Card(card) => card.has_address().then(|| OwnerParams {
                address: Some(AddressParams {
                    line1: card.address_line1.clone(),
                    line2: card.address_line2.clone(),
                    city: card.address_city.clone(),
                    state: card.address_state.clone(),
                    postal_code: card.address_zip.clone(),
                    country: card.address_country.clone(),
                }),
                ..OwnerParams::default()
            }),
            SourceMethod::Bancontact { name, .. }
            | SourceMethod::Giropay { name, .. }
            | SourceMethod::Ideal { name, .. } => Some(OwnerParams::name(name)),
            SourceMethod::Bitcoin { email, .. } => Some(OwnerParams {
                email: Some(email.clone()),
                ..OwnerParams::default()
            }),
            SourceMethod::SepaDebit {
                name,
                address_line1,
                city,
                postal_code,
                country,
                ..
            } => Some(OwnerParams {
                name: Some(name.clone()),
                address: Some(AddressParams {
                    line1: address_line1.clone(),
                    city: Some(city.clone()),
                    postal_code: Some(postal_code.clone()),
                    country: Some(country.clone()),
                    ..AddressParams::default()
                }),
                ..OwnerParams::default()
            }),
            SourceMethod::Sofort { .. } | SourceMethod::ThreeDSecure { .. } => None,
            SourceMethod::Custom(custom) => custom.owner.clone(),
        }
    }

    pub fn redirect(&self) -> Option<RedirectParams> {
        let return_url = match &self.method {
            SourceMethod::Bancontact { return_url, .. }
            | SourceMethod::Giropay { return_url, .. }
            | SourceMethod::Ideal { return_url, .. }
            | SourceMethod::Sofort { return_url, .. }
            | SourceMethod::ThreeDSecure { return_url, .. } => return_url.clone(),
            SourceMethod::Custom(CustomSource {
                return_url: Some(return_url),
                ..
            }) => return_url.clone(),
            _ => return None,
        };
        Some(RedirectParams { return_url })
    }

    /// Method-specific payload keyed by the method name, or `None` when the
    /// method has no payload or one of its payload fields is missing.
    pub fn api_parameter_map(&self) -> Option<Map<String, Value>> {
        let payload = match &self.method {
            SourceMethod::Card(card) => {
                let (Some(number), Some(exp_month), Some(exp_year)) =
                    (&card.number, card.exp_month, card.exp_year)
                else {
                    return None;
                };
                let mut payload = json!({
                    "number": number,
                    "exp_month": exp_month,
                    "exp_year": exp_year,
                });
                if let Some(cvc) = &card.cvc {
                    payload["cvc"] = json!(cvc);
                }
                payload
            }
            SourceMethod::Bancontact {
                statement_descriptor,
                ..
            }
            | SourceMethod::Giropay {
                statement_descriptor,
                ..
            } => json!({ "statement_descriptor": statement_descriptor.as_ref()? }),
            SourceMethod::Ideal {
                statement_descriptor,
                bank,
                ..
            } => json!({
                "statement_descriptor": statement_descriptor.as_ref()?,
                "bank": bank.as_ref()?,
            }),
            SourceMethod::SepaDebit { iban, .. } => json!({ "iban": iban }),
            SourceMethod::Sofort {
                country,
                statement_descriptor,
                ..
            } => {
                let mut payload = json!({ "country": country });
                if let Some(descriptor) = statement_descriptor {
                    payload["statement_descriptor"] = json!(descriptor);
                }
                payload
            }
            SourceMethod::ThreeDSecure { card_id, .. } => json!({ "card": card_id }),
            SourceMethod::Bitcoin { .. } => return None,
            SourceMethod::Custom(custom) => {
                if custom.payload.is_empty() {
                    return None;
                }
                Value::Object(custom.payload.clone())
            }
        };

        let mut map = Map::new();
        map.insert(self.source_type().as_str().to_string(), payload);
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillingAddress;

    const VALID_VISA: &str = "4242424242424242";

    fn full_fields_visa() -> Card {
        Card::new(VALID_VISA, 12, 2050, "123")
            .with_name("Captain Cardholder")
            .with_address(BillingAddress {
                line1: Some("1 ABC Street".into()),
                line2: Some("Apt. 123".into()),
                city: Some("San Francisco".into()),
                state: Some("CA".into()),
                postal_code: Some("94107".into()),
                country: Some("US".into()),
            })
            .with_currency("usd")
    }

    /// Asserts the payload has exactly one entry, under `name`, and returns it.
    fn single_payload(params: &SourceParams, name: &str) -> Map<String, Value> {
        let map = params.api_parameter_map().expect("payload present");
        assert_eq!(map.len(), 1);
        map.get(name)
            .and_then(Value::as_object)
            .cloned()
            .expect("payload keyed by method name")
    }

    #[test]
    fn test_bancontact_params() {
        let params = SourceParams::bancontact(1000, "Stripe", "return/url/3000", Some("descriptor"));

        assert_eq!(params.source_type(), SourceType::Bancontact);
        assert_eq!(params.currency(), Some(EURO));
        assert_eq!(params.amount(), Some(1000));
        assert_eq!(params.owner().unwrap().name.as_deref(), Some("Stripe"));
        assert_eq!(params.redirect().unwrap().return_url, "return/url/3000");

        let payload = single_payload(&params, "bancontact");
        assert_eq!(payload["statement_descriptor"], "descriptor");
    }

    #[test]
    fn test_bitcoin_params() {
        let params = SourceParams::bitcoin(10, "usd", "abc@def.ghi");

        assert_eq!(params.source_type(), SourceType::Bitcoin);
        assert_eq!(params.currency(), Some("usd"));
        assert_eq!(params.amount(), Some(10));
        let owner = params.owner().unwrap();
        assert_eq!(owner.email.as_deref(), Some("abc@def.ghi"));
        assert!(owner.name.is_none() && owner.address.is_none());
        assert!(params.redirect().is_none());
        assert!(params.api_parameter_map().is_none());
    }

    #[test]
    fn test_card_params_have_payload_and_owner_address() {
        let params = SourceParams::card(&full_fields_visa());

        let payload = single_payload(&params, "card");
        assert_eq!(payload["number"], VALID_VISA);
        assert_eq!(payload["exp_month"], 12);
        assert_eq!(payload["exp_year"], 2050);
        assert_eq!(payload["cvc"], "123");

        let owner = params.owner().unwrap();
        assert!(owner.name.is_none() && owner.email.is_none());
        let address = owner.address.unwrap();
        assert_eq!(address.line1.as_deref(), Some("1 ABC Street"));
        assert_eq!(address.line2.as_deref(), Some("Apt. 123"));
        assert_eq!(address.city.as_deref(), Some("San Francisco"));
        assert_eq!(address.state.as_deref(), Some("CA"));
        assert_eq!(address.postal_code.as_deref(), Some("94107"));
        assert_eq!(address.country.as_deref(), Some("US"));
        assert_eq!(params.currency(), Some("usd"));
        assert_eq!(params.amount(), None);
    }

    #[test]
    fn test_card_without_address_has_no_owner() {
        let params = SourceParams::card(&Card::new(VALID_VISA, 12, 2050, "123"));
        assert!(params.owner().is_none());
    }

    #[test]
    fn test_card_without_expiry_has_no_payload() {
        let mut card = Card::new(VALID_VISA, 12, 2050, "123");
        card.exp_year = None;
        assert!(SourceParams::card(&card).api_parameter_map().is_none());
    }

    #[test]
    fn test_giropay_params() {
        let params =
            SourceParams::giropay(150, "Stripe", "stripe://return", Some("stripe descriptor"));

        assert_eq!(params.source_type(), SourceType::Giropay);
        assert_eq!(params.currency(), Some(EURO));
        assert_eq!(params.amount(), Some(150));
        assert_eq!(params.owner().unwrap().name.as_deref(), Some("Stripe"));
        assert_eq!(params.redirect().unwrap().return_url, "stripe://return");
        let payload = single_payload(&params, "giropay");
        assert_eq!(payload["statement_descriptor"], "stripe descriptor");
    }

    #[test]
    fn test_giropay_without_descriptor_has_no_payload() {
        let params = SourceParams::giropay(150, "Stripe", "stripe://return", None);

        assert_eq!(params.source_type(), SourceType::Giropay);
        assert_eq!(params.currency(), Some(EURO));
        assert_eq!(params.owner().unwrap().name.as_deref(), Some("Stripe"));
        assert!(params.redirect().is_some());
        assert!(params.api_parameter_map().is_none());
    }

    #[test]
    fn test_ideal_params() {
        let params = SourceParams::ideal(
            900,
            "Default Name",
            "stripe://anotherurl",
            Some("something you bought"),
            Some("SVB"),
        );
        assert_eq!(params.source_type(), SourceType::Ideal);
        assert_eq!(params.currency(), Some(EURO));
        assert_eq!(params.amount(), Some(900));
        assert_eq!(params.redirect().unwrap().return_url, "stripe://anotherurl");
        let payload = single_payload(&params, "ideal");
        assert_eq!(payload["statement_descriptor"], "something you bought");
        assert_eq!(payload["bank"], "SVB");
    }

    #[test]
    fn test_ideal_missing_one_field_has_no_payload() {
        let without_descriptor =
            SourceParams::ideal(900, "Default Name", "stripe://anotherurl", None, Some("SVB"));
        let without_bank = SourceParams::ideal(
            900,
            "Default Name",
            "stripe://anotherurl",
            Some("something you bought"),
            None,
        );

        for params in [without_descriptor, without_bank] {
            assert_eq!(params.source_type(), SourceType::Ideal);
            assert_eq!(params.currency(), Some(EURO));
            assert!(params.api_parameter_map().is_none());
        }
    }

    #[test]
    fn test_sepa_debit_params() {
        let params = SourceParams::sepa_debit(
            "Jai Testa",
            "ibaniban",
            Some("44 Fourth Street"),
            "Test City",
            "90210",
            "EI",
        );

        assert_eq!(params.source_type(), SourceType::SepaDebit);
        let owner = params.owner().unwrap();
        assert_eq!(owner.name.as_deref(), Some("Jai Testa"));
        let address = owner.address.unwrap();
        assert_eq!(address.line1.as_deref(), Some("44 Fourth Street"));
        assert_eq!(address.city.as_deref(), Some("Test City"));
        assert_eq!(address.postal_code.as_deref(), Some("90210"));
        assert_eq!(address.country.as_deref(), Some("EI"));

        let payload = single_payload(&params, "sepa_debit");
        assert_eq!(payload["iban"], "ibaniban");
    }

    #[test]
    fn test_sofort_params() {
        let params =
            SourceParams::sofort(50000, "example://return", "UK", Some("a thing you bought"));

        assert_eq!(params.source_type(), SourceType::Sofort);
        assert_eq!(params.currency(), Some(EURO));
        assert_eq!(params.amount(), Some(50000));
        assert_eq!(params.redirect().unwrap().return_url, "example://return");
        let payload = single_payload(&params, "sofort");
        assert_eq!(payload["country"], "UK");
        assert_eq!(payload["statement_descriptor"], "a thing you bought");
    }

    #[test]
    fn test_three_d_secure_params() {
        let params =
            SourceParams::three_d_secure(99000, "brl", "stripe://returnaddress", "card_id_123");

        assert_eq!(params.source_type(), SourceType::ThreeDSecure);
        assert_eq!(params.currency(), Some("brl"));
        assert_eq!(params.amount(), Some(99000));
        assert_eq!(params.redirect().unwrap().return_url, "stripe://returnaddress");

        let payload = single_payload(&params, "three_d_secure");
        assert_eq!(payload.len(), 1);
        assert_eq!(payload["card"], "card_id_123");
    }

    #[test]
    fn test_euro_methods_always_use_euro() {
        let all = [
            SourceParams::bancontact(1, "a", "b", None),
            SourceParams::giropay(2, "a", "b", None),
            SourceParams::ideal(3, "a", "b", None, None),
            SourceParams::sofort(4, "b", "DE", None),
        ];
        for params in all {
            assert_eq!(params.currency(), Some("eur"));
        }
    }

    #[test]
    fn test_custom_params() {
        let mut source = CustomSource::new("alipay");
        source.amount = Some(500);
        source.currency = Some("usd".into());
        source.return_url = Some("example://return".into());

        let params = SourceParams::custom(source.clone());
        assert_eq!(params.source_type(), SourceType::Other("alipay".into()));
        assert!(params.api_parameter_map().is_none());

        source
            .payload
            .insert("statement_descriptor".into(), json!("tea"));
        let params = SourceParams::custom(source);
        assert_eq!(single_payload(&params, "alipay")["statement_descriptor"], "tea");
    }

    #[test]
    fn test_metadata_is_replaced() {
        let params = SourceParams::bitcoin(10, "usd", "abc@def.ghi")
            .with_metadata([("site", "google")])
            .with_metadata([("mood", "sad")]);
        assert_eq!(params.metadata().len(), 1);
        assert_eq!(params.metadata()["mood"], "sad");
    }
}
