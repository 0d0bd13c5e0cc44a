//! Payment instrument and API result models.

pub mod bank_account;
pub mod card;
pub mod credential;
pub mod source;
pub mod source_data;
pub mod token;

pub use bank_account::{AccountHolderType, BankAccount};
pub use card::{BillingAddress, Card, CardBrand, Funding};
pub use credential::PublishableKey;
pub use source::{
    RedirectStatus, Source, SourceAddress, SourceFlow, SourceOwner, SourceRedirect, SourceStatus,
    SourceType, SourceUsage,
};
pub use source_data::{
    Projector, SourceCardData, SourceSepaDebitData, SourceTypeModel, SourceTypeRegistry,
    ThreeDSecureSupport,
};
pub use token::{Token, TokenPayload, TokenType};
