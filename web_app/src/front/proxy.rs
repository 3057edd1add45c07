//! Forwarding of frontend requests to the inbox API.
//!
//! The browser never holds the API key: requests under `/proxy/` are sent to
//! [`AppConfig::api_base_url`](crate::config::AppConfig::api_base_url) with the
//! `X-API-Key` header added here.

use ntex::{http, util::Bytes, web};

use crate::{
    consts,
    front::{AppState, errors},
};

/// Forwards the request to `{API_BASE_URL}/{tail}` and relays the answer
pub async fn forward(
    req: web::HttpRequest,
    params: web::types::Path<(String,)>,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let url = app_state.config.api_url(&params.0, req.query_string());
    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|_| errors::UserError::UrlNotFound)?;

    let mut upstream_req = app_state
        .http_client
        .request(method, &url)
        .header(consts::API_KEY_HEADER, &app_state.config.api_key)
        .body(body.to_vec());

    if let Some(content_type) = req
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        upstream_req = upstream_req.header(reqwest::header::CONTENT_TYPE, content_type);
    }

    let upstream_resp = upstream_req.send().await.map_err(|e| {
        errors::ServerError::ExternalServiceError(format!("proxy request to {url} failed: {e}"))
    })?;

    let status = http::StatusCode::from_u16(upstream_resp.status().as_u16()).map_err(|e| {
        errors::ServerError::ExternalServiceError(format!("upstream answered {e}"))
    })?;
    let content_type = upstream_resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let payload = upstream_resp.bytes().await.map_err(|e| {
        errors::ServerError::ExternalServiceError(format!("proxy response from {url} failed: {e}"))
    })?;

    let mut response = web::HttpResponse::build(status);
    if let Some(content_type) = content_type {
        response.content_type(content_type);
    }

    Ok(response.body(payload.to_vec()))
}
