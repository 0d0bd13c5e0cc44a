//! # Paysource Client
//!
//! Creates tokens and payment sources against the payments API and turns
//! responses into typed results.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paysource_client::PaysourceClient;
//! use paysource_types::{Card, SourceParams};
//!
//! # async fn run() -> Result<(), paysource_types::ApiError> {
//! let client = PaysourceClient::new("pk_test_6pRNASCoBOKtIshFeQd4XMUh")?;
//!
//! let card = Card::new("4242424242424242", 12, 2050, "123");
//! let source = client.create_source(&SourceParams::card(&card), None).await?;
//! println!("created {}", source.id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod listener;
pub mod task;
pub mod translate;
pub mod transport;


pub use client::{ClientBuilder, PaysourceClient};
pub use config::{ClientConfig, ConfigError};
pub use listener::TracingListener;
pub use task::TaskHandle;
pub use transport::HttpTransport;
