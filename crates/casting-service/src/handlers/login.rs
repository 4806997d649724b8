//! Browser login entry point.
//!
//! `GET /login` sends the browser to the identity provider's implicit-flow
//! authorize endpoint. The provider redirects back to `AUTH0_CALLBACK_URL`
//! with an access token in the URL fragment.

use crate::config::Config;
use crate::errors::CastingError;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use std::sync::Arc;

#[tracing::instrument(skip_all, name = "casting.login")]
pub async fn login(State(state): State<Arc<AppState>>) -> Result<Response, CastingError> {
    let url = authorize_url(&state.config)?;
    Ok((StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response())
}

/// Build `https://{domain}/authorize?audience=..&response_type=token&client_id=..&redirect_uri=..`.
pub fn authorize_url(config: &Config) -> Result<Url, CastingError> {
    Url::parse_with_params(
        &format!("https://{}/authorize", config.auth0_domain),
        &[
            ("audience", config.api_audience.as_str()),
            ("response_type", "token"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.callback_url.as_str()),
        ],
    )
    .map_err(|e| {
        tracing::error!(target: "casting.login", error = %e, "Failed to build authorize URL");
        CastingError::Internal
    })
}
