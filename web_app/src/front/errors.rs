use super::forms::FieldError;
use derive_more::{Display, Error};
use ntex::{http, web};
use serde_json::json;

/// Errors caused by the request, answered with a 4xx status
#[derive(Debug, Display, Error)]
pub enum UserError {
    #[display("resource not found")]
    UrlNotFound,
    #[display("unauthorized")]
    Unauthorized,
    #[display("request body is not valid JSON: {_0}")]
    MalformedBody(#[error(not(source))] String),
    #[display("validation failed")]
    ValidationError(#[error(not(source))] Vec<FieldError>),
}

impl web::error::WebResponseError for UserError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        logfire::info!("Request rejected: {error}", error = self.to_string());

        let body = match self {
            UserError::ValidationError(fields) => json!({
                "error": self.to_string(),
                "details": fields,
            }),
            UserError::MalformedBody(_) => json!({
                "error": self.to_string(),
                "details": [FieldError::new("body", "must be a valid JSON document")],
            }),
            _ => json!({ "error": self.to_string() }),
        };

        web::HttpResponse::build(self.status_code()).json(&body)
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            UserError::UrlNotFound => http::StatusCode::NOT_FOUND,
            UserError::Unauthorized => http::StatusCode::UNAUTHORIZED,
            UserError::MalformedBody(_) | UserError::ValidationError(_) => {
                http::StatusCode::BAD_REQUEST
            }
        }
    }
}

/// Errors on our side or on a service we depend on, answered with a 5xx status
#[derive(Debug, Display, Error)]
pub enum ServerError {
    #[display("[ExternalServiceError] {_0}")]
    ExternalServiceError(#[error(not(source))] String),
    #[display("[InternalServerError] {_0}")]
    InternalServerError(#[error(not(source))] String),
}

impl web::error::WebResponseError for ServerError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        logfire::error!("{error}", error = self.to_string());

        // internals stay in the logs
        let message = match self {
            ServerError::ExternalServiceError(_) => "upstream service error",
            ServerError::InternalServerError(_) => "internal server error",
        };

        web::HttpResponse::build(self.status_code()).json(&json!({ "error": message }))
    }

    fn status_code(&self) -> http::StatusCode {
        match *self {
            ServerError::ExternalServiceError(_) => http::StatusCode::BAD_GATEWAY,
            ServerError::InternalServerError(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
