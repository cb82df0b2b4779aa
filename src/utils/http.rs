// src/utils/http.rs

//! HTTP client utilities.

use crate::error::Result;
use crate::models::ApiConfig;

/// Create the asynchronous HTTP client used for every provider call.
///
/// No request timeout is set; the transport default applies.
pub fn create_client(config: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}
