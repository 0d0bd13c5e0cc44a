//! Request parameter assembler.
//!
//! Merges builder output with the API-wide fields into one nested structure
//! with the same key layout for every method, then flattens it into
//! bracket-nested form pairs (`owner[address][city]=...`).

use serde::Serialize;
use serde_json::{Map, Value};

use super::source_params::SourceParams;
use super::token_params::TokenParams;
use crate::error::ApiError;

/// Request body for creating a source.
///
/// Top level: `type`, `currency`, `amount`, `owner`, `redirect`, `metadata`,
/// and the method payload under the method name. Absent parts are omitted.
pub fn source_request(params: &SourceParams) -> Result<Map<String, Value>, ApiError> {
    let mut map = Map::new();
    map.insert(
        "type".into(),
        Value::String(params.source_type().as_str().to_string()),
    );
    if let Some(currency) = params.currency() {
        map.insert("currency".into(), Value::String(currency.to_string()));
    }
    if let Some(amount) = params.amount() {
        map.insert("amount".into(), amount.into());
    }
    if let Some(owner) = params.owner() {
        insert_serialized(&mut map, "owner", &owner)?;
    }
    if let Some(redirect) = params.redirect() {
        insert_serialized(&mut map, "redirect", &redirect)?;
    }
    if !params.metadata().is_empty() {
        insert_serialized(&mut map, "metadata", params.metadata())?;
    }
    if let Some(payload) = params.api_parameter_map() {
        map.extend(payload);
    }
    Ok(map)
}

/// Request body for creating a token.
pub fn token_request(params: &TokenParams) -> Map<String, Value> {
    params.to_param_map()
}

/// Query for retrieving a source; the client secret proves ownership.
pub fn retrieve_source_query(client_secret: &str) -> Vec<(String, String)> {
    vec![("client_secret".to_string(), client_secret.to_string())]
}

/// Flattens a nested parameter map into ordered form pairs.
///
/// Objects nest as `parent[child]`, arrays as `parent[0]`; nulls are dropped.
pub fn flatten(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in map {
        flatten_value(key.clone(), value, &mut pairs);
    }
    pairs
}

/// Encodes a nested parameter map as an `application/x-www-form-urlencoded` body.
pub fn encode_form(map: &Map<String, Value>) -> Result<String, ApiError> {
    serde_urlencoded::to_string(flatten(map)).map_err(encode_error)
}

fn encode_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Api {
        message: format!("Unable to encode request parameters: {}", e),
        status: None,
        request_id: None,
    }
}

fn flatten_value(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(format!("{}[{}]", key, i), item, pairs);
            }
        }
        Value::Object(children) => {
            for (child, item) in children {
                flatten_value(format!("{}[{}]", key, child), item, pairs);
            }
        }
    }
}

fn insert_serialized<T: Serialize + ?Sized>(
    map: &mut Map<String, Value>,
    key: &str,
    value: &T,
) -> Result<(), ApiError> {
    let value = serde_json::to_value(value).map_err(encode_error)?;
    map.insert(key.to_string(), value);
    Ok(())
}
