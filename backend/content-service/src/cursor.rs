//! Opaque cursor encoding for keyset pagination.
//!
//! A cursor is a base64-url token over `{id, value, sortField, direction}`.
//! Decoding is total: any well-formed token round-trips to an equal struct,
//! and malformed input maps to [`AppError::BadRequest`] rather than a panic,
//! so the handler layer can distinguish "bad cursor" from "not found".

use crate::error::{AppError, Result};
use crate::models::{SortDirection, SortField};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: Uuid,
    pub value: serde_json::Value,
    pub sort_field: SortField,
    pub direction: SortDirection,
}

impl Cursor {
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("Cursor always serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self> {
        let token = token.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::BadRequest("invalid cursor encoding".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::BadRequest("invalid cursor payload".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn round_trips_through_encode_decode() {
        let cursor = Cursor {
            id: Uuid::new_v4(),
            value: serde_json::json!(Utc::now()),
            sort_field: SortField::CreatedDate,
            direction: SortDirection::Desc,
        };
        let encoded = cursor.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn decode_is_tolerant_of_trailing_padding() {
        let cursor = Cursor {
            id: Uuid::new_v4(),
            value: serde_json::json!(42),
            sort_field: SortField::Score,
            direction: SortDirection::Asc,
        };
        let mut encoded = cursor.encode();
        encoded.push_str("==");
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn garbage_input_is_a_bad_request_not_a_panic() {
        let err = Cursor::decode("not valid base64 !!!").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
