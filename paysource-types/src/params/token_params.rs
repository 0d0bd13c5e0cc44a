//! Tokenization parameters for cards and bank accounts.

use serde_json::{Map, Value};

use crate::domain::{BankAccount, Card, TokenType};

/// What to tokenize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenParams {
    Card(Card),
    BankAccount(BankAccount),
}

impl TokenParams {
    pub fn token_type(&self) -> TokenType {
        match self {
            TokenParams::Card(_) => TokenType::Card,
            TokenParams::BankAccount(_) => TokenType::BankAccount,
        }
    }

    /// Instrument fields, nested under `card` or `bank_account`. Unset fields are omitted.
    pub fn to_param_map(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            TokenParams::Card(card) => {
                put(&mut fields, "number", card.number.as_deref());
                put(&mut fields, "cvc", card.cvc.as_deref());
                if let Some(month) = card.exp_month {
                    fields.insert("exp_month".into(), month.into());
                }
                if let Some(year) = card.exp_year {
                    fields.insert("exp_year".into(), year.into());
                }
                put(&mut fields, "name", card.name.as_deref());
                put(&mut fields, "currency", card.currency.as_deref());
                put(&mut fields, "address_line1", card.address_line1.as_deref());
                put(&mut fields, "address_line2", card.address_line2.as_deref());
                put(&mut fields, "address_city", card.address_city.as_deref());
                put(&mut fields, "address_zip", card.address_zip.as_deref());
                put(&mut fields, "address_state", card.address_state.as_deref());
                put(&mut fields, "address_country", card.address_country.as_deref());
            }
            TokenParams::BankAccount(account) => {
                put(&mut fields, "account_number", account.account_number.as_deref());
                put(&mut fields, "country", account.country_code.as_deref());
                put(&mut fields, "currency", account.currency.as_deref());
                put(&mut fields, "routing_number", account.routing_number.as_deref());
                put(
                    &mut fields,
                    "account_holder_name",
                    account.account_holder_name.as_deref(),
                );
                if let Some(kind) = account.account_holder_type {
                    if let Ok(value) = serde_json::to_value(kind) {
                        fields.insert("account_holder_type".into(), value);
                    }
                }
            }
        }

        let mut map = Map::new();
        map.insert(self.token_type().as_str().to_string(), Value::Object(fields));
        map
    }
}

impl From<Card> for TokenParams {
    fn from(card: Card) -> Self {
        TokenParams::Card(card)
    }
}

impl From<BankAccount> for TokenParams {
    fn from(account: BankAccount) -> Self {
        TokenParams::BankAccount(account)
    }
}

fn put(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountHolderType;

    #[test]
    fn test_card_fields_nested_under_card() {
        let card = Card::new("4242424242424242", 12, 2050, "123").with_name("Winnie Hoop");
        let map = TokenParams::from(card).to_param_map();

        assert_eq!(map.len(), 1);
        let fields = map["card"].as_object().unwrap();
        assert_eq!(fields["number"], "4242424242424242");
        assert_eq!(fields["exp_month"], 12);
        assert_eq!(fields["exp_year"], 2050);
        assert_eq!(fields["cvc"], "123");
        assert_eq!(fields["name"], "Winnie Hoop");
        assert!(!fields.contains_key("address_zip"));
    }

    #[test]
    fn test_empty_card_has_empty_fields() {
        let map = TokenParams::Card(Card::default()).to_param_map();
        assert!(map["card"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_bank_account_fields_nested_under_bank_account() {
        let account = BankAccount::new("000123456789", "US", "usd", "110000000")
            .with_holder("Jenny Rosen", AccountHolderType::Individual);
        let map = TokenParams::from(account).to_param_map();

        let fields = map["bank_account"].as_object().unwrap();
        assert_eq!(fields["account_number"], "000123456789");
        assert_eq!(fields["country"], "US");
        assert_eq!(fields["currency"], "usd");
        assert_eq!(fields["routing_number"], "110000000");
        assert_eq!(fields["account_holder_type"], "individual");
    }
}
