//! Stateless HTTP request builder and response parser for the note API.
//!
//! # Design
//! `NoteClient` holds the service base URL and the identity obtained at login
//! and carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method that
//! consumes an `HttpResponse`. Every request carries `email` and `auth` in its
//! query string; only POST requests have a body.

use chrono::{DateTime, Utc};

use crate::auth::Token;
use crate::error::ApiError;
use crate::http::{encode_query, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{IndexListing, IndexQuery, NewNote, Note, NotePayload, NoteUpdate};

/// Default location of the note service.
pub const DEFAULT_BASE_URL: &str = "https://simple-note.appspot.com";

/// Synchronous, stateless client for the note API.
#[derive(Debug, Clone)]
pub struct NoteClient {
    base_url: String,
    email: String,
    token: Token,
    debug: bool,
}

impl NoteClient {
    pub fn new(base_url: &str, email: &str, token: Token) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            token,
            debug: false,
        }
    }

    /// Log every outgoing request at debug level.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn build_index(&self, query: &IndexQuery) -> HttpRequest {
        let length = query.clamped_length().to_string();
        let mut params = vec![("length", length.as_str())];
        if !query.since.is_empty() {
            params.push(("since", query.since.as_str()));
        }
        if !query.mark.is_empty() {
            params.push(("mark", query.mark.as_str()));
        }
        self.request(HttpMethod::Get, "/api2/index", &params, None)
    }

    pub fn build_get(&self, key: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &note_path(key), &[], None)
    }

    pub fn build_add(&self, input: &NewNote, at: DateTime<Utc>) -> Result<HttpRequest, ApiError> {
        let body = to_json(&NotePayload::create(input, at))?;
        Ok(self.request(HttpMethod::Post, "/api2/data", &[], Some(body)))
    }

    pub fn build_update(
        &self,
        key: &str,
        input: &NoteUpdate,
        at: DateTime<Utc>,
    ) -> Result<HttpRequest, ApiError> {
        let body = to_json(&NotePayload::update(input, at))?;
        Ok(self.request(HttpMethod::Post, &note_path(key), &[], Some(body)))
    }

    pub fn build_delete(&self, key: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &note_path(key), &[], None)
    }

    /// Parse the response to a get, add or update request.
    pub fn parse_note(&self, response: HttpResponse) -> Result<Note, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn parse_index(&self, response: HttpResponse) -> Result<IndexListing, ApiError> {
        check_status(&response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// The delete endpoint's body is ignored.
    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, &str)],
        body: Option<String>,
    ) -> HttpRequest {
        let mut query = vec![("email", self.email.as_str()), ("auth", self.token.as_str())];
        query.extend_from_slice(params);

        let headers = if body.is_some() {
            vec![("content-type".to_string(), "application/json".to_string())]
        } else {
            Vec::new()
        };

        HttpRequest {
            method,
            url: format!("{}{path}?{}", self.base_url, encode_query(&query)),
            headers,
            body,
        }
    }
}

fn note_path(key: &str) -> String {
    format!("/api2/data/{}", urlencoding::encode(key))
}

fn to_json(payload: &NotePayload) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::Http {
            status,
            message: response.status_line(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE_JSON: &str = r#"{"key":"k1","deleted":0,"modifydate":"1700000000.000000","createdate":"1700000000.000000","syncnum":1,"version":1,"minversion":1,"systemtags":[],"tags":["a"],"content":"hello"}"#;

    fn client() -> NoteClient {
        NoteClient::new("http://localhost:3000", "me@example.com", Token::new("TOKEN"))
    }

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_get_attaches_identity() {
        let req = client().build_get("k1");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/api2/data/k1?email=me%40example.com&auth=TOKEN"
        );
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_index_clamps_and_skips_empty_params() {
        let req = client().build_index(&IndexQuery::new(0, "", ""));
        assert_eq!(
            req.url,
            "http://localhost:3000/api2/index?email=me%40example.com&auth=TOKEN&length=1"
        );

        let req = client().build_index(&IndexQuery::new(500, "1700000000.5", "next"));
        assert_eq!(
            req.url,
            "http://localhost:3000/api2/index?email=me%40example.com&auth=TOKEN&length=100&since=1700000000.5&mark=next"
        );
    }

    #[test]
    fn build_add_posts_json_body() {
        let input = NewNote {
            content: "hello".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let req = client().build_add(&input, at()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.url,
            "http://localhost:3000/api2/data?email=me%40example.com&auth=TOKEN"
        );
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["content"], "hello");
        assert_eq!(body["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(body["createdate"], "1700000000.000000");
        assert!(body.get("modifydate").is_none());
    }

    #[test]
    fn build_update_targets_note_path() {
        let input = NoteUpdate {
            content: "edited".to_string(),
            deleted: false,
        };
        let req = client().build_update("k1", &input, at()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.url.starts_with("http://localhost:3000/api2/data/k1?"));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["content"], "edited");
        assert_eq!(body["modifydate"], "1700000000.000000");
        assert!(body.get("deleted").is_none());
    }

    #[test]
    fn build_update_soft_delete_sets_flag() {
        let input = NoteUpdate {
            content: String::new(),
            deleted: true,
        };
        let req = client().build_update("k1", &input, at()).unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["deleted"], 1);
        assert_eq!(body["content"], "");
    }

    #[test]
    fn build_delete_has_no_body() {
        let req = client().build_delete("k1");
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.endpoint(), "http://localhost:3000/api2/data/k1");
        assert!(req.body.is_none());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = NoteClient::new("http://localhost:3000/", "a", Token::new("t"));
        assert_eq!(client.build_get("k").endpoint(), "http://localhost:3000/api2/data/k");
    }

    #[test]
    fn parse_note_success() {
        let note = client().parse_note(response(200, NOTE_JSON)).unwrap();
        assert_eq!(note.key, "k1");
        assert_eq!(note.content, "hello");
        assert_eq!(note.tags, vec!["a".to_string()]);
    }

    #[test]
    fn parse_note_not_found() {
        let err = client().parse_note(response(404, "")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn parse_note_server_error_keeps_status_line() {
        let err = client().parse_note(response(500, "boom")).unwrap_err();
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "500 Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_note_bad_json_is_reported() {
        let err = client().parse_note(response(200, "not json")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn parse_index_success() {
        let body = r#"{"count":2,"data":[{"key":"a"},{"key":"b"}],"time":"1700000000.0","mark":"c"}"#;
        let listing = client().parse_index(response(200, body)).unwrap();
        assert_eq!(listing.count, 2);
        assert_eq!(listing.data.len(), 2);
        assert_eq!(listing.mark.as_deref(), Some("c"));
    }

    #[test]
    fn parse_delete_ignores_body() {
        assert!(client().parse_delete(response(200, "")).is_ok());
        assert!(client().parse_delete(response(404, "")).unwrap_err().is_not_found());
    }
}
