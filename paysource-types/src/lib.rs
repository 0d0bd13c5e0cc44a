//! # Paysource Types
//!
//! Payment instrument models, source parameter builders and port traits for
//! the paysource client. This crate performs no I/O: only data structures,
//! validation rules, request assembly and trait definitions.
//!
//! ## Layout
//!
//! - `domain/` - Card, BankAccount, PublishableKey, Token, Source
//! - `params/` - per-method source builders, token params, wire assembler
//! - `ports/` - Transport and ResponseListener traits
//! - `error/` - the API error taxonomy

pub mod domain;
pub mod error;
pub mod params;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AccountHolderType, BankAccount, BillingAddress, Card, CardBrand, Funding, PublishableKey,
    Source, SourceCardData, SourceOwner, SourceRedirect, SourceSepaDebitData, SourceType,
    SourceTypeModel, SourceTypeRegistry, Token, TokenPayload, TokenType,
};
pub use error::ApiError;
pub use params::{CustomSource, SourceMethod, SourceParams, TokenParams};
pub use ports::{ApiRequest, ApiResponse, HttpMethod, ResponseListener, Transport};
