//! Bank account domain model.

use serde::{Deserialize, Serialize};

/// Who owns the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountHolderType {
    Individual,
    Company,
}

/// A bank account used for tokenization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(rename = "country", default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder_type: Option<AccountHolderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last4: Option<String>,
}

impl BankAccount {
    /// Creates a bank account from its number, country, currency and routing number.
    pub fn new(
        account_number: impl Into<String>,
        country_code: impl Into<String>,
        currency: impl Into<String>,
        routing_number: impl Into<String>,
    ) -> Self {
        Self {
            account_number: Some(account_number.into()),
            country_code: Some(country_code.into()),
            currency: Some(currency.into()),
            routing_number: Some(routing_number.into()),
            ..Self::default()
        }
    }

    /// Sets the account holder.
    pub fn with_holder(mut self, name: impl Into<String>, kind: AccountHolderType) -> Self {
        self.account_holder_name = Some(name.into());
        self.account_holder_type = Some(kind);
        self
    }

    /// Final four characters of the account number, or the server-echoed value.
    pub fn last4(&self) -> Option<&str> {
        if let Some(last4) = self.last4.as_deref() {
            return Some(last4);
        }
        let number = self.account_number.as_deref()?;
        let start = number.char_indices().rev().nth(3)?.0;
        Some(&number[start..])
    }
}
