//! Common Types Module
//!
//! Response wrappers and query strings shared by the route modules.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Plain `{ "message": ... }` body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?id=<user id>`
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub id: Option<String>,
}

/// `?id=<product id>&userID=<user id>`
#[derive(Debug, Default, Deserialize)]
pub struct ProductUserQuery {
    pub id: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

/// A missing or blank query parameter is a 400.
pub fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{name} is empty"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_param() {
        assert_eq!(required(&Some(" abc ".to_string()), "id").unwrap(), "abc");
        assert!(matches!(required(&None, "id"), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            required(&Some("  ".to_string()), "userID"),
            Err(ApiError::BadRequest(msg)) if msg == "userID is empty"
        ));
    }

    #[test]
    fn test_product_user_query_field_names() {
        let q: ProductUserQuery = serde_json::from_str(r#"{"id":"p","userID":"u"}"#).unwrap();
        assert_eq!(q.id.as_deref(), Some("p"));
        assert_eq!(q.user_id.as_deref(), Some("u"));
    }
}
