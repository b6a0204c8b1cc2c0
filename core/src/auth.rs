//! Login request building and token parsing.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::ApiError;
use crate::http::{status_text, HttpMethod, HttpRequest, HttpResponse};

/// Opaque credential returned by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Build the login request. The body is `email=...&password=...`, base64
/// encoded and sent as plain text; the service does not accept a form.
pub fn build_login(base_url: &str, email: &str, password: &str) -> HttpRequest {
    let credentials = format!("email={email}&password={password}");
    HttpRequest {
        method: HttpMethod::Post,
        url: format!("{}/api/login", base_url.trim_end_matches('/')),
        headers: vec![("content-type".to_string(), "text/plain".to_string())],
        body: Some(BASE64.encode(credentials)),
    }
}

/// The whole response body is the token.
pub fn parse_login(response: HttpResponse) -> Result<Token, ApiError> {
    if response.status != 200 {
        return Err(ApiError::Auth {
            status: response.status,
            message: status_text(response.status)
                .map(str::to_string)
                .unwrap_or_else(|| response.status.to_string()),
        });
    }
    let token = response.body.trim();
    if token.is_empty() {
        return Err(ApiError::Decode("login response carried no token".to_string()));
    }
    Ok(Token::new(token))
}
