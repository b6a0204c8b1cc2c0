//! Authenticated client that performs the HTTP round-trips.
//!
//! # Design
//! `Session` pairs a `NoteClient` with a `Transport`. Each operation builds one
//! request, executes it and parses the response; nothing is retried and no
//! state changes after login, so a session can be shared behind an `Arc`.

use chrono::Utc;

use crate::auth::{build_login, parse_login};
use crate::client::NoteClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{IndexListing, IndexQuery, NewNote, Note, NoteUpdate};

/// A logged-in client for the note service.
#[derive(Debug)]
pub struct Session<T = UreqTransport> {
    client: NoteClient,
    transport: T,
}

impl<T: Transport> Session<T> {
    /// Authenticate against `base_url` and keep the returned token for the
    /// lifetime of the session.
    pub fn login(transport: T, base_url: &str, email: &str, password: &str) -> Result<Self, ApiError> {
        let response = transport.execute(build_login(base_url, email, password))?;
        let token = parse_login(response)?;
        tracing::debug!(email, "login succeeded");
        Ok(Self {
            client: NoteClient::new(base_url, email, token),
            transport,
        })
    }

    /// Wrap an already authenticated client.
    pub fn from_parts(client: NoteClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.client = self.client.with_debug(debug);
        self
    }

    pub fn client(&self) -> &NoteClient {
        &self.client
    }

    /// Fetch one page of the note index. `limit` is clamped into `[1, 100]`;
    /// empty `since` and `mark` are not sent.
    pub fn index(&self, limit: i64, since: &str, mark: &str) -> Result<IndexListing, ApiError> {
        let request = self.client.build_index(&IndexQuery::new(limit, since, mark));
        self.client.parse_index(self.send(request)?)
    }

    pub fn get(&self, key: &str) -> Result<Note, ApiError> {
        let request = self.client.build_get(key);
        self.client.parse_note(self.send(request)?)
    }

    pub fn add(&self, content: &str, tags: &[String]) -> Result<Note, ApiError> {
        let input = NewNote {
            content: content.to_string(),
            tags: tags.to_vec(),
        };
        let request = self.client.build_add(&input, Utc::now())?;
        self.client.parse_note(self.send(request)?)
    }

    /// Replace the content of `key`. With `is_delete` the note is also moved
    /// to the trash.
    pub fn update(&self, key: &str, content: &str, is_delete: bool) -> Result<Note, ApiError> {
        let input = NoteUpdate {
            content: content.to_string(),
            deleted: is_delete,
        };
        let request = self.client.build_update(key, &input, Utc::now())?;
        self.client.parse_note(self.send(request)?)
    }

    pub fn delete(&self, key: &str) -> Result<(), ApiError> {
        let request = self.client.build_delete(key);
        self.client.parse_delete(self.send(request)?)
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if self.client.debug() {
            tracing::debug!(
                method = request.method.as_str(),
                endpoint = request.endpoint(),
                params = ?request.query_keys(),
                "sending request"
            );
        }
        let method = request.method;
        let response = self.transport.execute(request)?;
        if response.status != 200 {
            tracing::warn!(
                method = method.as_str(),
                status = response.status,
                "note service returned an error"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::auth::Token;
    use crate::http::HttpMethod;

    /// Replays canned responses and records the requests it was given.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<Result<HttpResponse, ApiError>>>,
        requests: RefCell<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
            self
        }

        fn fail(self, message: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(ApiError::Transport(message.to_string())));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
        let client = NoteClient::new("http://notes.test", "me@example.com", Token::new("T0K"));
        Session::from_parts(client, transport)
    }

    #[test]
    fn login_keeps_token() {
        let transport = ScriptedTransport::default().reply(200, "T0K");
        let session = Session::login(transport, "http://notes.test", "me@example.com", "pw").unwrap();
        assert_eq!(session.client().token().as_str(), "T0K");
        assert_eq!(session.client().email(), "me@example.com");
        let requests = session.transport.requests.borrow();
        assert_eq!(requests[0].url, "http://notes.test/api/login");
    }

    #[test]
    fn login_failure_is_auth_error() {
        let transport = ScriptedTransport::default().reply(401, "");
        let err = Session::login(transport, "http://notes.test", "me@example.com", "bad").unwrap_err();
        assert!(matches!(err, ApiError::Auth { status: 401, .. }));
    }

    #[test]
    fn login_transport_failure_has_no_status() {
        let transport = ScriptedTransport::default().fail("connection refused");
        let err = Session::login(transport, "http://notes.test", "me@example.com", "pw").unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn index_sends_clamped_length() {
        let s = session(ScriptedTransport::default().reply(200, r#"{"count":0,"data":[],"time":"1"}"#));
        let listing = s.index(500, "", "").unwrap();
        assert_eq!(listing.count, 0);
        let requests = s.transport.requests.borrow();
        assert!(requests[0].url.ends_with("&length=100"));
        assert_eq!(requests[0].method, HttpMethod::Get);
    }

    #[test]
    fn add_stamps_createdate() {
        let s = session(ScriptedTransport::default().reply(200, r#"{"key":"new","content":"hi"}"#));
        let note = s.add("hi", &["t".to_string()]).unwrap();
        assert_eq!(note.key, "new");
        let requests = s.transport.requests.borrow();
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert!(body["createdate"].is_string());
        assert!(body.get("modifydate").is_none());
        assert_eq!(body["tags"], serde_json::json!(["t"]));
    }

    #[test]
    fn update_stamps_modifydate() {
        let s = session(ScriptedTransport::default().reply(200, r#"{"key":"k","deleted":1,"version":2}"#));
        let note = s.update("k", "", true).unwrap();
        assert!(note.is_deleted());
        let requests = s.transport.requests.borrow();
        assert_eq!(requests[0].endpoint(), "http://notes.test/api2/data/k");
        let body: serde_json::Value =
            serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert!(body["modifydate"].is_string());
        assert!(body.get("createdate").is_none());
        assert_eq!(body["deleted"], 1);
    }

    #[test]
    fn get_not_found() {
        let s = session(ScriptedTransport::default().reply(404, ""));
        assert!(s.get("gone").unwrap_err().is_not_found());
    }

    #[test]
    fn get_undecodable_body_is_surfaced() {
        let s = session(ScriptedTransport::default().reply(200, "<html>"));
        assert!(matches!(s.get("k").unwrap_err(), ApiError::Decode(_)));
    }

    #[test]
    fn delete_issues_delete() {
        let s = session(ScriptedTransport::default().reply(200, ""));
        s.delete("k").unwrap();
        let requests = s.transport.requests.borrow();
        assert_eq!(requests[0].method, HttpMethod::Delete);
        assert!(requests[0].body.is_none());
    }

    #[test]
    fn transport_failure_is_propagated() {
        let s = session(ScriptedTransport::default().fail("timed out"));
        assert!(matches!(s.delete("k").unwrap_err(), ApiError::Transport(_)));
    }
}
