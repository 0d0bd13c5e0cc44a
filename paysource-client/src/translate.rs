//! Response and error translation.
//!
//! Success bodies must match the expected schema exactly; anything else is
//! an `ApiError::Api`, never a partially filled object.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use paysource_types::{
    ApiError, ApiResponse, BankAccount, Card, Source, SourceTypeRegistry, Token, TokenPayload,
};

#[derive(Deserialize)]
struct TokenBody {
    id: String,
    #[serde(default)]
    object: Option<String>,
    #[serde(rename = "type")]
    token_type: String,
    #[serde(default)]
    livemode: bool,
    #[serde(default)]
    used: bool,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    card: Option<Card>,
    #[serde(default)]
    bank_account: Option<BankAccount>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    param: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
}

/// Parses a token creation response.
pub fn parse_token(response: &ApiResponse) -> Result<Token, ApiError> {
    let body: TokenBody = serde_json::from_str(&response.body)
        .map_err(|e| schema_error(response, "token", &e.to_string()))?;
    if let Some(object) = body.object.as_deref().filter(|o| *o != "token") {
        return Err(schema_error(
            response,
            "token",
            &format!("unexpected object '{}'", object),
        ));
    }

    let payload = match (body.token_type.as_str(), body.card, body.bank_account) {
        ("card", Some(card), _) => TokenPayload::Card(card),
        ("bank_account", _, Some(account)) => TokenPayload::BankAccount(account),
        (other, _, _) => {
            return Err(schema_error(
                response,
                "token",
                &format!("no '{}' payload for token type", other),
            ));
        }
    };

    Ok(Token {
        id: body.id,
        livemode: body.livemode,
        used: body.used,
        created: body.created,
        payload,
    })
}

/// Parses a source creation or retrieval response.
///
/// The raw type data is always kept; a typed model is attached only when
/// the registry has a projection for the source type and the data fits it.
pub fn parse_source(
    response: &ApiResponse,
    registry: &SourceTypeRegistry,
) -> Result<Source, ApiError> {
    let value: Value = serde_json::from_str(&response.body)
        .map_err(|e| schema_error(response, "source", &e.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(schema_error(response, "source", "body is not an object"));
    };
    if let Some(kind) = object.get("object").and_then(Value::as_str) {
        if kind != "source" {
            return Err(schema_error(
                response,
                "source",
                &format!("unexpected object '{}'", kind),
            ));
        }
    }

    let mut source: Source = serde_json::from_value(value.clone())
        .map_err(|e| schema_error(response, "source", &e.to_string()))?;
    source.source_type_data = object
        .get(source.source_type.as_str())
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    source.source_type_model = registry.project(&source.source_type, &source.source_type_data);
    Ok(source)
}

/// Classifies a non-2xx response.
///
/// 400, 404 and 429 are invalid requests, 401 is authentication, 402 is a
/// card error; every other status is a generic API error. The server message
/// is kept verbatim.
pub fn classify_error(response: &ApiResponse) -> ApiError {
    let status = response.status;
    let request_id = response.request_id.clone();
    let error = serde_json::from_str::<ErrorEnvelope>(&response.body)
        .ok()
        .map(|envelope| envelope.error);

    let (message, code, param, decline_code) = match error {
        Some(error) => (
            error
                .message
                .unwrap_or_else(|| format!("Request failed with HTTP status {}", status)),
            error.code,
            error.param,
            error.decline_code,
        ),
        None => (
            format!(
                "Invalid response object from API: {} (HTTP response code was {})",
                response.body, status
            ),
            None,
            None,
            None,
        ),
    };

    match status {
        400 | 404 | 429 => ApiError::InvalidRequest {
            message,
            param,
            status,
            request_id,
        },
        401 => ApiError::Authentication {
            message,
            status: Some(status),
            request_id,
        },
        402 => ApiError::Card {
            message,
            code,
            param,
            decline_code,
            request_id,
        },
        _ => ApiError::malformed(response, message),
    }
}

fn schema_error(response: &ApiResponse, expected: &str, detail: &str) -> ApiError {
    ApiError::malformed(
        response,
        format!("Unable to parse {} response: {}", expected, detail),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use paysource_types::{CardBrand, Funding, SourceType, SourceTypeModel, TokenType};
    use serde_json::json;

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status,
            body: body.to_string(),
            request_id: Some("req_123".into()),
        }
    }

    #[test]
    fn test_parse_card_token() {
        let resp = response(
            200,
            json!({
                "id": "tok_1",
                "object": "token",
                "type": "card",
                "livemode": false,
                "used": false,
                "created": 1_500_000_000,
                "card": {
                    "id": "card_1",
                    "object": "card",
                    "brand": "Visa",
                    "exp_month": 12,
                    "exp_year": 2050,
                    "funding": "credit",
                    "last4": "4242"
                }
            }),
        );
        let token = parse_token(&resp).unwrap();
        assert_eq!(token.token_type(), TokenType::Card);
        assert!(token.bank_account().is_none());
        let card = token.card().unwrap();
        assert_eq!(card.last4(), Some("4242"));
        assert_eq!(card.brand(), CardBrand::Visa);
        assert_eq!(card.funding, Some(Funding::Credit));
        assert!(token.created.is_some());
    }

    #[test]
    fn test_parse_bank_account_token() {
        let resp = response(
            200,
            json!({
                "id": "btok_1",
                "type": "bank_account",
                "bank_account": { "country": "US", "currency": "usd", "last4": "6789" }
            }),
        );
        let token = parse_token(&resp).unwrap();
        assert_eq!(token.token_type(), TokenType::BankAccount);
        assert!(token.card().is_none());
        assert_eq!(token.bank_account().unwrap().last4(), Some("6789"));
    }

    #[test]
    fn test_token_without_payload_is_rejected() {
        let resp = response(200, json!({ "id": "tok_1", "type": "card" }));
        assert!(matches!(parse_token(&resp), Err(ApiError::Api { .. })));
    }

    #[test]
    fn test_token_of_unknown_type_is_rejected() {
        let resp = response(200, json!({ "id": "tok_1", "type": "pii", "card": {} }));
        assert!(matches!(parse_token(&resp), Err(ApiError::Api { .. })));
    }

    #[test]
    fn test_non_json_body_is_rejected() {
        let resp = ApiResponse {
            status: 200,
            body: "<html>".into(),
            request_id: None,
        };
        assert!(matches!(parse_token(&resp), Err(ApiError::Api { .. })));
        assert!(matches!(
            parse_source(&resp, &SourceTypeRegistry::default()),
            Err(ApiError::Api { .. })
        ));
    }

    #[test]
    fn test_parse_card_source_has_model() {
        let resp = response(
            200,
            json!({
                "id": "src_1",
                "object": "source",
                "type": "card",
                "client_secret": "src_client_secret_1",
                "status": "chargeable",
                "flow": "none",
                "usage": "reusable",
                "metadata": { "addons": "cream" },
                "owner": { "name": "Winnie Hoop", "address": { "city": "Sheboygan" } },
                "card": { "brand": "Visa", "last4": "4242", "exp_month": 12, "exp_year": 2050 }
            }),
        );
        let source = parse_source(&resp, &SourceTypeRegistry::default()).unwrap();
        assert_eq!(source.source_type, SourceType::Card);
        assert_eq!(source.metadata["addons"], "cream");
        assert_eq!(source.source_type_data["last4"], "4242");
        assert!(matches!(source.source_type_model, Some(SourceTypeModel::Card(_))));
        let owner = source.owner.unwrap();
        assert_eq!(owner.name.as_deref(), Some("Winnie Hoop"));
        assert_eq!(owner.address.unwrap().city.as_deref(), Some("Sheboygan"));
    }

    #[test]
    fn test_parse_bitcoin_source_has_raw_data_only() {
        let resp = response(
            200,
            json!({
                "id": "src_2",
                "object": "source",
                "type": "bitcoin",
                "amount": 1000,
                "currency": "usd",
                "owner": { "email": "abc@def.com" },
                "bitcoin": { "address": "test_1MBhWS3uv4ynCfQXF3xQjJkzFPukr5K2", "amount": 2371000 }
            }),
        );
        let source = parse_source(&resp, &SourceTypeRegistry::default()).unwrap();
        assert_eq!(source.amount, Some(1000));
        assert!(!source.source_type_data.is_empty());
        assert!(source.source_type_model.is_none());
    }

    #[test]
    fn test_source_with_wrong_object_is_rejected() {
        let resp = response(200, json!({ "id": "tok_1", "object": "token", "type": "card" }));
        assert!(matches!(
            parse_source(&resp, &SourceTypeRegistry::default()),
            Err(ApiError::Api { .. })
        ));
    }

    #[test]
    fn test_source_without_id_is_rejected() {
        let resp = response(200, json!({ "object": "source", "type": "card" }));
        assert!(parse_source(&resp, &SourceTypeRegistry::default()).is_err());
    }

    #[test]
    fn test_classify_card_error() {
        let resp = response(
            402,
            json!({ "error": {
                "type": "card_error",
                "code": "incorrect_number",
                "param": "number",
                "message": "Your card number is incorrect."
            }}),
        );
        let err = classify_error(&resp);
        assert!(err.message().starts_with("Your card number is incorrect."));
        let ApiError::Card { code, param, request_id, .. } = err else {
            panic!("expected card error");
        };
        assert_eq!(code.as_deref(), Some("incorrect_number"));
        assert_eq!(param.as_deref(), Some("number"));
        assert_eq!(request_id.as_deref(), Some("req_123"));
    }

    #[test]
    fn test_classify_by_status() {
        let body = |msg: &str| json!({ "error": { "message": msg } });

        assert!(matches!(
            classify_error(&response(401, body("Invalid API Key provided: pk_default"))),
            ApiError::Authentication { status: Some(401), .. }
        ));
        assert!(matches!(
            classify_error(&response(400, body("Missing required param: type."))),
            ApiError::InvalidRequest { status: 400, .. }
        ));
        assert!(matches!(
            classify_error(&response(404, body("No such source: src_x"))),
            ApiError::InvalidRequest { status: 404, .. }
        ));
        assert!(matches!(
            classify_error(&response(429, body("Too many requests"))),
            ApiError::InvalidRequest { status: 429, .. }
        ));
        assert!(matches!(
            classify_error(&response(500, body("Something went wrong"))),
            ApiError::Api { status: Some(500), .. }
        ));
    }

    #[test]
    fn test_classify_unparseable_error_body() {
        let resp = ApiResponse {
            status: 502,
            body: "Bad Gateway".into(),
            request_id: None,
        };
        let err = classify_error(&resp);
        assert!(matches!(err, ApiError::Api { status: Some(502), .. }));
        assert!(err.message().contains("Bad Gateway"));
    }

    #[test]
    fn test_classify_non_json_bodies_by_status() {
        let raw = |status: u16, body: &str| ApiResponse {
            status,
            body: body.into(),
            request_id: Some("req_raw".into()),
        };

        let unauthorized = classify_error(&raw(401, "<html>Unauthorized</html>"));
        assert!(matches!(
            unauthorized,
            ApiError::Authentication { status: Some(401), .. }
        ));
        assert!(unauthorized.message().contains("<html>Unauthorized</html>"));
        assert_eq!(unauthorized.request_id(), Some("req_raw"));

        let declined = classify_error(&raw(402, ""));
        let ApiError::Card { code, param, decline_code, .. } = &declined else {
            panic!("expected card error, got {:?}", declined);
        };
        assert!(code.is_none() && param.is_none() && decline_code.is_none());
        assert!(declined.message().contains("HTTP response code was 402"));

        assert!(matches!(
            classify_error(&raw(400, "not json")),
            ApiError::InvalidRequest { status: 400, param: None, .. }
        ));
    }
}
