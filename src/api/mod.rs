use aide::axum::ApiRouter;
use argon2rs::verifier::Encoded;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::count_prefix;

mod auth;
mod companies;
mod entries;
mod health;
mod import;
mod photos;
mod reports;
mod seed;
mod settings;
mod stats;

const PASSWORD_SALT_LENGTH: usize = 16;

pub fn init(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .merge(auth::router(app_state.clone()))
        .merge(companies::router(app_state.clone()))
        .merge(entries::router(app_state.clone()))
        .merge(stats::router(app_state.clone()))
        .merge(settings::router(app_state.clone()))
        .merge(import::router(app_state.clone()))
        .merge(reports::router(app_state.clone()))
        .merge(photos::router(app_state.clone()))
        .merge(seed::router(app_state.clone()))
        .merge(health::router(app_state))
}

pub fn password_hash_create(password: &str) -> ServiceResult<String> {
    let salt = rand::random::<[u8; PASSWORD_SALT_LENGTH]>();
    let encoded = Encoded::default2i(password.as_bytes(), &salt, b"", b"");
    String::from_utf8(encoded.to_u8()).map_err(|_| {
        ServiceError::InternalServerError("Password hash is not valid utf-8".to_owned())
    })
}

pub fn password_hash_verify(hash: &str, password: &str) -> ServiceResult<bool> {
    let encoded = Encoded::from_u8(hash.as_bytes()).map_err(|_| {
        ServiceError::InternalServerError("Stored password hash is malformed".to_owned())
    })?;
    Ok(encoded.verify(password.as_bytes()))
}

/// Lenient count parsing, the leading number is kept and anything else counts as 0.
pub fn parse_count(value: Option<&str>) -> i64 {
    value.map(count_prefix).unwrap_or(0)
}

/// Checkbox style flag, only `true`, `on` and `1` are set.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_lowercase()).as_deref(),
        Some("true") | Some("on") | Some("1")
    )
}

/// A form or json value that is read leniently, numbers may arrive as strings and vice versa.
#[derive(Debug, PartialEq, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LenientValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl LenientValue {
    pub fn as_count(&self) -> i64 {
        match self {
            LenientValue::Int(value) => *value,
            LenientValue::Float(value) if value.is_finite() => value.trunc() as i64,
            LenientValue::Text(value) => parse_count(Some(value)),
            _ => 0,
        }
    }

    pub fn as_flag(&self) -> bool {
        match self {
            LenientValue::Bool(value) => *value,
            LenientValue::Int(value) => *value == 1,
            LenientValue::Text(value) => parse_flag(Some(value)),
            _ => false,
        }
    }

    pub fn as_id(&self) -> Option<i32> {
        match self {
            LenientValue::Int(value) => i32::try_from(*value).ok(),
            LenientValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

pub fn count_of(value: &Option<LenientValue>) -> i64 {
    value.as_ref().map(LenientValue::as_count).unwrap_or(0)
}

pub fn flag_of(value: &Option<LenientValue>) -> bool {
    value.as_ref().map(LenientValue::as_flag).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = password_hash_create("correct horse").unwrap();
        assert!(hash.starts_with("$argon2i$"));
        assert!(password_hash_verify(&hash, "correct horse").unwrap());
        assert!(!password_hash_verify(&hash, "wrong horse").unwrap());
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = password_hash_create("secret").unwrap();
        let b = password_hash_create("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(password_hash_verify("plaintext", "plaintext").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some("42")), 42);
        assert_eq!(parse_count(Some(" 7 ")), 7);
        assert_eq!(parse_count(Some("12.5")), 12);
        assert_eq!(parse_count(Some("114.00")), 114);
        assert_eq!(parse_count(Some("7 szt")), 7);
        assert_eq!(parse_count(Some("abc")), 0);
        assert_eq!(parse_count(Some("")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn test_lenient_values_from_json() {
        let values: Vec<LenientValue> =
            serde_json::from_str(r#"[12, "34", "x", 2.9, true, "on", "12.5"]"#).unwrap();
        let counts: Vec<i64> = values.iter().map(|v| v.as_count()).collect();
        assert_eq!(counts, vec![12, 34, 0, 2, 0, 0, 12]);
        assert!(values[4].as_flag());
        assert!(values[5].as_flag());
        assert!(!values[1].as_flag());
        assert_eq!(values[1].as_id(), Some(34));
        assert_eq!(values[2].as_id(), None);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("on")));
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("off")));
        assert!(!parse_flag(Some("yes")));
        assert!(!parse_flag(None));
    }
}
