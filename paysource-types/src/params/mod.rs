//! Request parameters: per-method builders and the wire assembler.

pub mod assembler;
pub mod source_params;
pub mod token_params;

pub use source_params::{
    AddressParams, CustomSource, EURO, OwnerParams, RedirectParams, SourceMethod, SourceParams,
};
pub use token_params::TokenParams;
