//! User records as stored and as accepted on the wire.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    /// Store-assigned identifier.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Contact email. Not format-checked.
    pub email: String,
}

/// Body of a create request, before validation.
///
/// Both fields are optional here so that absent and empty values produce the
/// same client error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewUser {
    /// Display name, required.
    #[serde(default)]
    pub name: Option<String>,
    /// Contact email, required.
    #[serde(default)]
    pub email: Option<String>,
}

/// A create request whose fields are known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewUser {
    name: String,
    email: String,
}

impl ValidNewUser {
    /// Name to insert.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Email to insert.
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl NewUser {
    /// Check required fields and produce a record the store accepts.
    pub fn validate(self) -> Result<ValidNewUser, ApiError> {
        let name = self.name.filter(|s| !s.is_empty());
        let email = self.email.filter(|s| !s.is_empty());

        match (name, email) {
            (Some(name), Some(email)) => Ok(ValidNewUser { name, email }),
            (None, Some(_)) => Err(ApiError::Validation("name is required".to_string())),
            (Some(_), None) => Err(ApiError::Validation("email is required".to_string())),
            (None, None) => Err(ApiError::Validation(
                "name and email are required".to_string(),
            )),
        }
    }
}
