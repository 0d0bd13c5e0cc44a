//! Typed projections of type-specific source data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::card::{CardBrand, Funding};
use super::source::SourceType;

/// Whether a card supports or requires 3-D Secure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreeDSecureSupport {
    Required,
    Optional,
    NotSupported,
    #[serde(other)]
    Unknown,
}

/// Card data carried by a `card` source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCardData {
    #[serde(default)]
    pub address_line1_check: Option<String>,
    #[serde(default)]
    pub address_zip_check: Option<String>,
    #[serde(default)]
    pub brand: Option<CardBrand>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub cvc_check: Option<String>,
    #[serde(default)]
    pub dynamic_last4: Option<String>,
    #[serde(default)]
    pub exp_month: Option<u32>,
    #[serde(default)]
    pub exp_year: Option<i32>,
    #[serde(default)]
    pub funding: Option<Funding>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub three_d_secure: Option<ThreeDSecureSupport>,
    #[serde(default)]
    pub tokenization_method: Option<String>,
}

/// Bank data carried by a `sepa_debit` source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSepaDebitData {
    #[serde(default)]
    pub bank_code: Option<String>,
    #[serde(default)]
    pub branch_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub mandate_reference: Option<String>,
    #[serde(default)]
    pub mandate_url: Option<String>,
}

/// Typed view of a source's type-specific data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTypeModel {
    Card(SourceCardData),
    SepaDebit(SourceSepaDebitData),
}

/// Builds a typed model from raw type data, or `None` when the data does not fit.
pub type Projector = fn(&Map<String, Value>) -> Option<SourceTypeModel>;

/// Which source types get a typed projection, and how.
///
/// A type without an entry keeps only its raw data; that is not an error.
#[derive(Clone)]
pub struct SourceTypeRegistry {
    projectors: HashMap<SourceType, Projector>,
}

impl SourceTypeRegistry {
    /// A registry that projects nothing.
    pub fn empty() -> Self {
        Self {
            projectors: HashMap::new(),
        }
    }

    /// Adds or replaces the projection for a source type.
    pub fn register(mut self, source_type: SourceType, projector: Projector) -> Self {
        self.projectors.insert(source_type, projector);
        self
    }

    /// Whether a source type has a projection.
    pub fn is_projectable(&self, source_type: &SourceType) -> bool {
        self.projectors.contains_key(source_type)
    }

    /// Projects raw data for a source type. Empty data never projects.
    pub fn project(
        &self,
        source_type: &SourceType,
        data: &Map<String, Value>,
    ) -> Option<SourceTypeModel> {
        if data.is_empty() {
            return None;
        }
        let projector = self.projectors.get(source_type)?;
        projector(data)
    }
}

impl Default for SourceTypeRegistry {
    fn default() -> Self {
        Self::empty()
            .register(SourceType::Card, project_card)
            .register(SourceType::SepaDebit, project_sepa_debit)
    }
}

impl std::fmt::Debug for SourceTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.projectors.keys()).finish()
    }
}

fn project_card(data: &Map<String, Value>) -> Option<SourceTypeModel> {
    serde_json::from_value(Value::Object(data.clone()))
        .ok()
        .map(SourceTypeModel::Card)
}

fn project_sepa_debit(data: &Map<String, Value>) -> Option<SourceTypeModel> {
    serde_json::from_value(Value::Object(data.clone()))
        .ok()
        .map(SourceTypeModel::SepaDebit)
}
