use super::{FieldError, Validate, required_str};
use crate::{
    consts,
    models::conversation::ConversationStatus,
    pagination::{Cursor, PageRequest},
    repo::ConversationFilter,
};
use serde::Deserialize;

/// Body of `PATCH /conversations/{id}/status`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusForm {
    pub status: Option<serde_json::Value>,
}

impl Validate for UpdateStatusForm {
    type Valid = ConversationStatus;

    fn validate(&self) -> Result<Self::Valid, Vec<FieldError>> {
        let mut errors = vec![];
        let status = required_str("status", self.status.as_ref(), &mut errors);

        match status.map(str::parse::<ConversationStatus>) {
            Some(Ok(status)) => Ok(status),
            Some(Err(_)) => Err(vec![FieldError::new(
                "status",
                "must be one of OPEN, PENDING, CLOSED",
            )]),
            None => Err(errors),
        }
    }
}

/// Body of `POST /conversations/{id}/messages`
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageForm {
    pub text: Option<serde_json::Value>,
}

impl Validate for SendMessageForm {
    type Valid = String;

    fn validate(&self) -> Result<Self::Valid, Vec<FieldError>> {
        let mut errors = vec![];
        let Some(text) = required_str("text", self.text.as_ref(), &mut errors) else {
            return Err(errors);
        };

        if text.trim().is_empty() {
            return Err(vec![FieldError::new("text", "must not be blank")]);
        }
        if text.chars().count() > consts::MAX_TEXT_MESSAGE_CHARS {
            return Err(vec![FieldError::new(
                "text",
                format!(
                    "must be at most {} characters",
                    consts::MAX_TEXT_MESSAGE_CHARS
                ),
            )]);
        }

        Ok(text.to_string())
    }
}

fn validate_page(
    cursor: Option<&str>,
    limit: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> PageRequest {
    let mut page = PageRequest::default();

    if let Some(raw) = cursor.filter(|raw| !raw.is_empty()) {
        match Cursor::decode(raw) {
            Ok(cursor) => page.after = Some(cursor),
            Err(e) => errors.push(FieldError::new("cursor", e.to_string())),
        }
    }

    if let Some(raw) = limit {
        match raw.parse::<i64>() {
            Ok(limit) if (1..=consts::MAX_PAGE_LIMIT).contains(&limit) => page.limit = limit,
            _ => errors.push(FieldError::new(
                "limit",
                format!(
                    "must be an integer between 1 and {}",
                    consts::MAX_PAGE_LIMIT
                ),
            )),
        }
    }

    page
}

/// Query of `GET /conversations/{id}`
#[derive(Debug, Default, Deserialize)]
pub struct ConversationPageQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

impl Validate for ConversationPageQuery {
    type Valid = PageRequest;

    fn validate(&self) -> Result<Self::Valid, Vec<FieldError>> {
        let mut errors = vec![];
        let page = validate_page(self.cursor.as_deref(), self.limit.as_deref(), &mut errors);

        if errors.is_empty() { Ok(page) } else { Err(errors) }
    }
}

/// Query of `GET /conversations`
#[derive(Debug, Default, Deserialize)]
pub struct ListConversationsQuery {
    pub tenant_id: Option<String>,
    pub status: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

impl Validate for ListConversationsQuery {
    type Valid = (ConversationFilter, PageRequest);

    fn validate(&self) -> Result<Self::Valid, Vec<FieldError>> {
        let mut errors = vec![];
        let mut filter = ConversationFilter::default();

        if let Some(raw) = &self.tenant_id {
            match raw.parse::<i64>() {
                Ok(tenant_id) => filter.tenant_id = Some(tenant_id),
                Err(_) => errors.push(FieldError::new("tenant_id", "must be an integer")),
            }
        }

        if let Some(raw) = &self.status {
            match raw.parse::<ConversationStatus>() {
                Ok(status) => filter.status = Some(status),
                Err(_) => errors.push(FieldError::new(
                    "status",
                    "must be one of OPEN, PENDING, CLOSED",
                )),
            }
        }

        let page = validate_page(self.cursor.as_deref(), self.limit.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok((filter, page))
        } else {
            Err(errors)
        }
    }
}
