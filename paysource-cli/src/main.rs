//! Paysource CLI
//!
//! Command-line interface for creating tokens and payment sources.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

use paysource_client::{ClientBuilder, PaysourceClient, TracingListener};
use paysource_types::{
    AccountHolderType, BankAccount, BillingAddress, Card, Source, SourceParams, Token,
    TokenParams,
};

#[derive(Parser)]
#[command(name = "paysource")]
#[command(author, version, about = "Create payment tokens and sources", long_about = None)]
struct Cli {
    /// Base URL of the payments API
    #[arg(long, env = "PAYSOURCE_API_BASE", default_value = paysource_client::config::DEFAULT_API_BASE)]
    api_base: String,

    /// Publishable key used when a command gives none
    #[arg(long, env = "PAYSOURCE_PUBLISHABLE_KEY")]
    key: Option<String>,

    /// Transport timeout in seconds
    #[arg(long, env = "PAYSOURCE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Use the blocking call surface instead of async
    #[arg(long)]
    blocking: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
    /// Source operations
    Source {
        #[command(subcommand)]
        action: SourceCommands,
    },
    /// Check card details locally, without calling the API
    Check(CardArgs),
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Tokenize a card
    Card(CardArgs),
    /// Tokenize a bank account
    BankAccount(BankAccountArgs),
}

#[derive(Subcommand)]
enum SourceCommands {
    /// Create a source
    Create {
        #[command(subcommand)]
        method: SourceMethodArgs,
        /// Metadata entry, as key=value (repeatable)
        #[arg(long = "metadata", value_parser = parse_key_value, global = true)]
        metadata: Vec<(String, String)>,
    },
    /// Retrieve a source
    Get {
        /// Source ID
        id: String,
        /// Client secret returned when the source was created
        #[arg(long)]
        client_secret: String,
    },
}

#[derive(Subcommand)]
enum SourceMethodArgs {
    Card(CardArgs),
    Bancontact(RedirectArgs),
    Bitcoin {
        #[arg(long)]
        amount: i64,
        #[arg(long, default_value = "usd")]
        currency: String,
        #[arg(long)]
        email: String,
    },
    Giropay(RedirectArgs),
    Ideal {
        #[command(flatten)]
        redirect: RedirectArgs,
        /// Customer's bank
        #[arg(long)]
        bank: Option<String>,
    },
    SepaDebit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        iban: String,
        #[arg(long)]
        address_line1: Option<String>,
        #[arg(long)]
        city: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: String,
    },
    Sofort {
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        return_url: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        statement_descriptor: Option<String>,
    },
    ThreeDSecure {
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        return_url: String,
        /// ID of the card source to authenticate
        #[arg(long)]
        card_source: String,
    },
}

#[derive(Args)]
struct CardArgs {
    #[arg(long)]
    number: String,
    #[arg(long)]
    exp_month: u32,
    #[arg(long)]
    exp_year: i32,
    #[arg(long)]
    cvc: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    currency: Option<String>,
    #[arg(long)]
    address_city: Option<String>,
    #[arg(long)]
    address_zip: Option<String>,
    #[arg(long)]
    address_country: Option<String>,
}

#[derive(Args)]
struct BankAccountArgs {
    #[arg(long)]
    account_number: String,
    #[arg(long, default_value = "US")]
    country: String,
    #[arg(long, default_value = "usd")]
    currency: String,
    #[arg(long)]
    routing_number: String,
    #[arg(long)]
    holder_name: Option<String>,
    #[arg(long, value_enum, default_value = "individual")]
    holder_type: HolderType,
}

/// Amount, owner name and return URL shared by the euro redirect methods.
#[derive(Args)]
struct RedirectArgs {
    #[arg(long)]
    amount: i64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    return_url: String,
    #[arg(long)]
    statement_descriptor: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum HolderType {
    Individual,
    Company,
}

impl CardArgs {
    fn to_card(&self) -> Card {
        let mut card = Card::new(&self.number, self.exp_month, self.exp_year, "");
        card.cvc = self.cvc.clone();
        if let Some(name) = &self.name {
            card = card.with_name(name);
        }
        if let Some(currency) = &self.currency {
            card = card.with_currency(currency);
        }
        if self.address_city.is_some() || self.address_zip.is_some() || self.address_country.is_some() {
            card = card.with_address(BillingAddress {
                city: self.address_city.clone(),
                postal_code: self.address_zip.clone(),
                country: self.address_country.clone(),
                ..Default::default()
            });
        }
        card
    }
}

impl BankAccountArgs {
    fn to_bank_account(&self) -> BankAccount {
        let account = BankAccount::new(
            &self.account_number,
            &self.country,
            &self.currency,
            &self.routing_number,
        );
        match &self.holder_name {
            Some(name) => account.with_holder(
                name,
                match self.holder_type {
                    HolderType::Individual => AccountHolderType::Individual,
                    HolderType::Company => AccountHolderType::Company,
                },
            ),
            None => account,
        }
    }
}

impl SourceMethodArgs {
    fn to_params(&self) -> SourceParams {
        match self {
            Self::Card(args) => SourceParams::card(&args.to_card()),
            Self::Bancontact(r) => SourceParams::bancontact(
                r.amount,
                &r.name,
                &r.return_url,
                r.statement_descriptor.as_deref(),
            ),
            Self::Bitcoin {
                amount,
                currency,
                email,
            } => SourceParams::bitcoin(*amount, currency, email),
            Self::Giropay(r) => SourceParams::giropay(
                r.amount,
                &r.name,
                &r.return_url,
                r.statement_descriptor.as_deref(),
            ),
            Self::Ideal { redirect: r, bank } => SourceParams::ideal(
                r.amount,
                &r.name,
                &r.return_url,
                r.statement_descriptor.as_deref(),
                bank.as_deref(),
            ),
            Self::SepaDebit {
                name,
                iban,
                address_line1,
                city,
                postal_code,
                country,
            } => SourceParams::sepa_debit(
                name,
                iban,
                address_line1.as_deref(),
                city,
                postal_code,
                country,
            ),
            Self::Sofort {
                amount,
                return_url,
                country,
                statement_descriptor,
            } => SourceParams::sofort(
                *amount,
                return_url,
                country,
                statement_descriptor.as_deref(),
            ),
            Self::ThreeDSecure {
                amount,
                currency,
                return_url,
                card_source,
            } => SourceParams::three_d_secure(*amount, currency, return_url, card_source),
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("Expected key=value, got '{}'", s);
    };
    if key.is_empty() {
        bail!("Metadata key must not be empty");
    }
    Ok((key.to_string(), value.to_string()))
}

fn token_json(token: &Token) -> Result<Value> {
    Ok(json!({
        "id": token.id,
        "object": "token",
        "type": token.token_type().as_str(),
        "livemode": token.livemode,
        "used": token.used,
        "created": token.created.map(|c| c.timestamp()),
        "card": serde_json::to_value(token.card())?,
        "bank_account": serde_json::to_value(token.bank_account())?,
    }))
}

fn print_source(source: &Source) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&source.to_value())?);
    Ok(())
}

fn build_client(cli: &Cli) -> Result<PaysourceClient> {
    let mut builder = ClientBuilder::new()
        .api_base(&cli.api_base)
        .timeout(Duration::from_secs(cli.timeout_secs))
        .listener(Arc::new(TracingListener));
    if let Some(key) = &cli.key {
        builder = builder
            .default_key(key)
            .context("Invalid publishable key")?;
    }
    builder.build().context("Failed to build client")
}

async fn create_token(client: &PaysourceClient, params: TokenParams, blocking: bool) -> Result<()> {
    let token = if blocking {
        let client = client.clone();
        tokio::task::spawn_blocking(move || client.create_token_blocking(&params, None)).await??
    } else {
        client.create_token(&params, None).await?
    };
    println!("{}", serde_json::to_string_pretty(&token_json(&token)?)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,paysource_client=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Check(args) = &cli.command {
        let card = args.to_card();
        let report = json!({
            "brand": card.brand(),
            "last4": card.last4(),
            "number_valid": card.validate_number(),
            "expiry_valid": card.validate_expiry_date(),
            "cvc_valid": card.validate_cvc(),
            "valid": card.validate_card(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let client = build_client(&cli)?;
    tracing::debug!(api_base = %cli.api_base, blocking = cli.blocking, "Client ready");

    match &cli.command {
        Commands::Token { action } => {
            let params = match action {
                TokenCommands::Card(args) => TokenParams::from(args.to_card()),
                TokenCommands::BankAccount(args) => TokenParams::from(args.to_bank_account()),
            };
            create_token(&client, params, cli.blocking).await?;
        }
        Commands::Source { action } => match action {
            SourceCommands::Create { method, metadata } => {
                let params = method.to_params().with_metadata(metadata.clone());
                let source = if cli.blocking {
                    let client = client.clone();
                    tokio::task::spawn_blocking(move || client.create_source_blocking(&params, None))
                        .await??
                } else {
                    client.create_source(&params, None).await?
                };
                print_source(&source)?;
            }
            SourceCommands::Get { id, client_secret } => {
                let source = if cli.blocking {
                    let client = client.clone();
                    let (id, client_secret) = (id.clone(), client_secret.clone());
                    tokio::task::spawn_blocking(move || {
                        client.retrieve_source_blocking(&id, &client_secret, None)
                    })
                    .await??
                } else {
                    client.retrieve_source(id, client_secret, None).await?
                };
                print_source(&source)?;
            }
        },
        Commands::Check(_) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn card_args(cli: &Cli) -> &CardArgs {
        match &cli.command {
            Commands::Check(args) => args,
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_card_without_cvc_flag_has_no_cvc() {
        let cli = parse(&[
            "paysource", "check", "--number", "4242424242424242", "--exp-month", "12",
            "--exp-year", "2050",
        ]);
        let card = card_args(&cli).to_card();
        assert!(card.cvc.is_none());
        assert!(card.validate_card());
    }

    #[test]
    fn test_card_with_cvc_flag_keeps_it() {
        let cli = parse(&[
            "paysource", "check", "--number", "4242424242424242", "--exp-month", "12",
            "--exp-year", "2050", "--cvc", "123",
        ]);
        let card = card_args(&cli).to_card();
        assert_eq!(card.cvc.as_deref(), Some("123"));
        assert!(card.validate_cvc());
    }

    #[test]
    fn test_blocking_flag_reaches_source_get() {
        let cli = parse(&[
            "paysource", "--blocking", "source", "get", "src_123", "--client-secret",
            "src_client_secret_abc",
        ]);
        assert!(cli.blocking);
        assert!(matches!(
            &cli.command,
            Commands::Source { action: SourceCommands::Get { id, .. } } if id == "src_123"
        ));
    }

    #[test]
    fn test_metadata_pairs_parse() {
        assert_eq!(
            parse_key_value("order=42").unwrap(),
            ("order".to_string(), "42".to_string())
        );
        assert!(parse_key_value("=42").is_err());
        assert!(parse_key_value("order").is_err());
    }
}
