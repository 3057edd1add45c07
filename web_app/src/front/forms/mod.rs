//! Request schemas and their validators.
//!
//! Every endpoint accepting input has a form type implementing [`Validate`].
//! The raw input is deserialized leniently (fields as optional JSON values)
//! and then validated as a whole, so one response lists every invalid field.

pub mod conversation;

use super::errors::UserError;
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub trait Validate {
    /// Input after validation, ready for the api layer
    type Valid;

    fn validate(&self) -> Result<Self::Valid, Vec<FieldError>>;
}

/// Parses a JSON body into the form `F` and validates it
pub fn parse_json<F>(body: &[u8]) -> Result<F::Valid, UserError>
where
    F: DeserializeOwned + Validate,
{
    let form: F =
        serde_json::from_slice(body).map_err(|e| UserError::MalformedBody(e.to_string()))?;

    form.validate().map_err(UserError::ValidationError)
}

/// Reads a required string field, recording an error when absent or not a string
fn required_str<'a>(
    field: &str,
    value: Option<&'a serde_json::Value>,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    match value {
        None | Some(serde_json::Value::Null) => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(serde_json::Value::String(value)) => Some(value),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a string"));
            None
        }
    }
}
