//! Token domain model.

use chrono::{DateTime, Utc};

use super::bank_account::BankAccount;
use super::card::Card;

/// Discriminant of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Card,
    BankAccount,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Card => "card",
            TokenType::BankAccount => "bank_account",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a token stands for. Exactly one instrument per token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPayload {
    Card(Card),
    BankAccount(BankAccount),
}

/// A single-use server-side reference to a card or bank account.
///
/// Tokens are built only by the response translator and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: String,
    pub livemode: bool,
    pub used: bool,
    pub created: Option<DateTime<Utc>>,
    pub payload: TokenPayload,
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self.payload {
            TokenPayload::Card(_) => TokenType::Card,
            TokenPayload::BankAccount(_) => TokenType::BankAccount,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match &self.payload {
            TokenPayload::Card(card) => Some(card),
            TokenPayload::BankAccount(_) => None,
        }
    }

    pub fn bank_account(&self) -> Option<&BankAccount> {
        match &self.payload {
            TokenPayload::BankAccount(account) => Some(account),
            TokenPayload::Card(_) => None,
        }
    }
}
