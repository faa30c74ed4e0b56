//! Opaque cursor encoding for comment keyset pagination.
//!
//! Comments are only ever listed newest-first by `(created_date, id)`, so
//! this is a narrower cousin of `content-service::cursor::Cursor` (which
//! also carries a `sortField`/`direction` for posts' multiple sort
//! options) rather than a shared type — there is nothing here for a
//! second sort axis to hang off of.

use crate::error::{AppError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: Uuid,
    pub created_date: DateTime<Utc>,
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

    #[test]
    fn round_trips_through_encode_decode() {
        let cursor = Cursor { id: Uuid::new_v4(), created_date: Utc::now() };
        let encoded = cursor.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn decode_is_tolerant_of_trailing_padding() {
        let cursor = Cursor { id: Uuid::new_v4(), created_date: Utc::now() };
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
