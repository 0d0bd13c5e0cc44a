//! Card domain model.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Card brand, detected from the number or echoed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardBrand {
    #[serde(rename = "Visa")]
    Visa,
    #[serde(rename = "MasterCard")]
    MasterCard,
    #[serde(rename = "American Express")]
    AmericanExpress,
    #[serde(rename = "Discover")]
    Discover,
    #[serde(rename = "JCB")]
    Jcb,
    #[serde(rename = "Diners Club")]
    DinersClub,
    #[serde(other, rename = "Unknown")]
    Unknown,
}

impl CardBrand {
    /// Detects the brand from the leading digits of a normalised number.
    pub fn from_number(number: &str) -> Self {
        let prefix = |len: usize| -> Option<u32> { number.get(..len)?.parse().ok() };

        if number.starts_with("34") || number.starts_with("37") {
            CardBrand::AmericanExpress
        } else if ["60", "64", "65"].iter().any(|p| number.starts_with(p)) {
            CardBrand::Discover
        } else if number.starts_with("35") {
            CardBrand::Jcb
        } else if matches!(prefix(3), Some(300..=305 | 309))
            || ["36", "38", "39"].iter().any(|p| number.starts_with(p))
        {
            CardBrand::DinersClub
        } else if number.starts_with('4') {
            CardBrand::Visa
        } else if matches!(prefix(2), Some(51..=55)) || matches!(prefix(4), Some(2221..=2720)) {
            CardBrand::MasterCard
        } else {
            CardBrand::Unknown
        }
    }

    /// Number length required for this brand.
    pub fn number_length(&self) -> usize {
        match self {
            CardBrand::AmericanExpress => 15,
            CardBrand::DinersClub => 14,
            _ => 16,
        }
    }

    /// CVC length required for this brand.
    pub fn cvc_length(&self) -> usize {
        match self {
            CardBrand::AmericanExpress => 4,
            _ => 3,
        }
    }
}

/// How the card is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Funding {
    Credit,
    Debit,
    Prepaid,
    #[serde(other)]
    Unknown,
}

/// A payment card.
///
/// Caller-built cards carry the raw number, expiry and CVC. Cards echoed by
/// the server carry `id`, `brand`, `funding` and `last4` instead of the number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<CardBrand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<Funding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last4: Option<String>,
}

impl Card {
    /// Creates a card from its number, expiry and CVC.
    ///
    /// Spaces and dashes in the number are dropped.
    pub fn new(number: &str, exp_month: u32, exp_year: i32, cvc: &str) -> Self {
        Self {
            number: Some(normalize_number(number)),
            exp_month: Some(exp_month),
            exp_year: Some(exp_year),
            cvc: Some(cvc.to_string()),
            ..Self::default()
        }
    }

    /// Sets the cardholder name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the billing address.
    pub fn with_address(mut self, address: BillingAddress) -> Self {
        self.address_line1 = address.line1;
        self.address_line2 = address.line2;
        self.address_city = address.city;
        self.address_state = address.state;
        self.address_zip = address.postal_code;
        self.address_country = address.country;
        self
    }

    /// Sets the currency used when this card is attached as a payout destination.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Last four digits: the server value when present, else derived from the number.
    pub fn last4(&self) -> Option<&str> {
        if let Some(last4) = self.last4.as_deref() {
            return Some(last4);
        }
        let number = self.number.as_deref()?;
        if number.len() >= 4 {
            number.get(number.len() - 4..)
        } else {
            None
        }
    }

    /// Brand echoed by the server, or detected from the number.
    pub fn brand(&self) -> CardBrand {
        match (self.brand, self.number.as_deref()) {
            (Some(brand), _) => brand,
            (None, Some(number)) => CardBrand::from_number(number),
            (None, None) => CardBrand::Unknown,
        }
    }

    /// Whether any billing address field is set.
    pub fn has_address(&self) -> bool {
        [
            &self.address_line1,
            &self.address_line2,
            &self.address_city,
            &self.address_state,
            &self.address_zip,
            &self.address_country,
        ]
        .iter()
        .any(|field| field.is_some())
    }

    /// Checks digits, brand length and the Luhn checksum.
    pub fn validate_number(&self) -> bool {
        let Some(number) = self.number.as_deref() else {
            return false;
        };
        if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        let brand = CardBrand::from_number(number);
        if brand != CardBrand::Unknown && number.len() != brand.number_length() {
            return false;
        }
        luhn_valid(number)
    }

    /// Checks that the expiry month is valid and not in the past.
    pub fn validate_expiry_date(&self) -> bool {
        let now = Utc::now();
        self.validate_expiry_date_at(now.year(), now.month())
    }

    /// Same as [`Card::validate_expiry_date`] against an explicit current month.
    pub fn validate_expiry_date_at(&self, current_year: i32, current_month: u32) -> bool {
        let (Some(month), Some(year)) = (self.exp_month, self.exp_year) else {
            return false;
        };
        if !(1..=12).contains(&month) {
            return false;
        }
        let year = normalize_year(year, current_year);
        (year, month) >= (current_year, current_month)
    }

    /// Checks CVC digits and the brand-specific length.
    pub fn validate_cvc(&self) -> bool {
        let Some(cvc) = self.cvc.as_deref().map(str::trim) else {
            return false;
        };
        if cvc.is_empty() || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        match self.brand() {
            CardBrand::Unknown => (3..=4).contains(&cvc.len()),
            brand => cvc.len() == brand.cvc_length(),
        }
    }

    /// Number and expiry must be valid; the CVC too when one was given.
    pub fn validate_card(&self) -> bool {
        let base = self.validate_number() && self.validate_expiry_date();
        if self.cvc.is_none() {
            base
        } else {
            base && self.validate_cvc()
        }
    }
}

/// Billing address fields for a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

fn normalize_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn normalize_year(year: i32, current_year: i32) -> i32 {
    if (0..100).contains(&year) {
        current_year / 100 * 100 + year
    } else {
        year
    }
}

fn luhn_valid(number: &str) -> bool {
    let mut sum = 0;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
