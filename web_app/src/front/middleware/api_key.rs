use ntex::{
    http::Payload,
    web::{Error, FromRequest, HttpRequest},
};
use subtle::ConstantTimeEq;

use crate::{
    consts,
    front::{AppState, errors},
};

/// Extractor guarding an endpoint with the `X-API-Key` header
pub struct ApiKeyAuth;

/// Compares the presented key with the configured one in constant time
fn is_api_key_valid(req: &HttpRequest) -> bool {
    let presented = req
        .headers()
        .get(consts::API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match (presented, req.app_state::<AppState>()) {
        (Some(presented), Some(app_state)) => presented
            .as_bytes()
            .ct_eq(app_state.config.api_key.as_bytes())
            .into(),
        _ => false,
    }
}

impl<Err> FromRequest<Err> for ApiKeyAuth {
    type Error = Error;

    fn from_request(
        req: &HttpRequest,
        _: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        if !is_api_key_valid(req) {
            return futures::future::ready(Err(errors::UserError::Unauthorized.into()));
        }

        futures::future::ready(Ok(Self))
    }
}
