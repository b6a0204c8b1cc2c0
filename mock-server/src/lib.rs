use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_EMAIL: &str = "user@example.com";
pub const DEFAULT_PASSWORD: &str = "secret";

const DEFAULT_INDEX_LENGTH: i64 = 10;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Note {
    pub key: String,
    pub deleted: u8,
    pub modifydate: String,
    pub createdate: String,
    pub syncnum: u64,
    pub version: u64,
    pub minversion: u64,
    pub sharekey: String,
    pub publishkey: String,
    pub systemtags: Vec<String>,
    pub tags: Vec<String>,
    pub content: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexEntry {
    pub key: String,
    pub deleted: u8,
    pub modifydate: String,
    pub createdate: String,
    pub syncnum: u64,
    pub version: u64,
    pub minversion: u64,
    pub systemtags: Vec<String>,
    pub tags: Vec<String>,
}

impl From<&Note> for IndexEntry {
    fn from(note: &Note) -> Self {
        Self {
            key: note.key.clone(),
            deleted: note.deleted,
            modifydate: note.modifydate.clone(),
            createdate: note.createdate.clone(),
            syncnum: note.syncnum,
            version: note.version,
            minversion: note.minversion,
            systemtags: note.systemtags.clone(),
            tags: note.tags.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndexPage {
    pub count: usize,
    pub data: Vec<IndexEntry>,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
}

/// Body of a POST to `/api2/data`. Absent fields leave the note untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteWrite {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub createdate: Option<String>,
    pub modifydate: Option<String>,
    pub deleted: Option<u8>,
}

#[derive(Debug, Default)]
pub struct Store {
    /// email -> password
    accounts: HashMap<String, String>,
    /// token -> email
    sessions: HashMap<String, String>,
    /// In creation order; the index pages through this.
    notes: Vec<Note>,
}

pub type Db = Arc<RwLock<Store>>;

type Params = HashMap<String, String>;

pub fn app() -> Router {
    app_with_account(DEFAULT_EMAIL, DEFAULT_PASSWORD)
}

pub fn app_with_account(email: &str, password: &str) -> Router {
    let mut store = Store::default();
    store.accounts.insert(email.to_string(), password.to_string());
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/login", post(login))
        .route("/api2/data", post(create_note))
        .route(
            "/api2/data/{key}",
            get(get_note).post(update_note).delete(delete_note),
        )
        .route("/api2/index", get(index_notes))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_account(
    listener: TcpListener,
    email: &str,
    password: &str,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_account(email, password)).await
}

fn now_stamp() -> String {
    format!("{:.6}", Utc::now().timestamp_micros() as f64 / 1_000_000.0)
}

fn stamp_value(stamp: &str) -> f64 {
    stamp.parse().unwrap_or(0.0)
}

fn authorize(store: &Store, params: &Params) -> Result<(), StatusCode> {
    let email = params.get("email").ok_or(StatusCode::UNAUTHORIZED)?;
    let token = params.get("auth").ok_or(StatusCode::UNAUTHORIZED)?;
    match store.sessions.get(token) {
        Some(owner) if owner == email => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// The body is base64 of `email=...&password=...`; the reply is the token.
async fn login(State(db): State<Db>, body: String) -> Result<String, StatusCode> {
    let decoded = BASE64
        .decode(body.trim())
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let decoded = String::from_utf8(decoded).map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut email = None;
    let mut password = None;
    for pair in decoded.split('&') {
        match pair.split_once('=') {
            Some(("email", value)) => email = Some(value),
            Some(("password", value)) => password = Some(value),
            _ => {}
        }
    }
    let (Some(email), Some(password)) = (email, password) else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let mut store = db.write().await;
    if store.accounts.get(email).map(String::as_str) != Some(password) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = Uuid::new_v4().simple().to_string().to_uppercase();
    store.sessions.insert(token.clone(), email.to_string());
    Ok(token)
}

async fn create_note(
    State(db): State<Db>,
    Query(params): Query<Params>,
    Json(write): Json<NoteWrite>,
) -> Result<Json<Note>, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &params)?;

    let stamp = write
        .createdate
        .or(write.modifydate)
        .unwrap_or_else(now_stamp);
    let note = Note {
        key: Uuid::new_v4().simple().to_string(),
        deleted: write.deleted.unwrap_or(0),
        modifydate: stamp.clone(),
        createdate: stamp,
        syncnum: 1,
        version: 1,
        minversion: 1,
        sharekey: String::new(),
        publishkey: String::new(),
        systemtags: Vec::new(),
        tags: write.tags.unwrap_or_default(),
        content: write.content.unwrap_or_default(),
    };
    store.notes.push(note.clone());
    Ok(Json(note))
}

async fn get_note(
    State(db): State<Db>,
    Path(key): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Note>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &params)?;
    store
        .notes
        .iter()
        .find(|note| note.key == key)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_note(
    State(db): State<Db>,
    Path(key): Path<String>,
    Query(params): Query<Params>,
    Json(write): Json<NoteWrite>,
) -> Result<Json<Note>, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    let note = store
        .notes
        .iter_mut()
        .find(|note| note.key == key)
        .ok_or(StatusCode::NOT_FOUND)?;

    if let Some(content) = write.content {
        if content != note.content {
            note.content = content;
            note.syncnum += 1;
        }
    }
    if let Some(tags) = write.tags {
        note.tags = tags;
    }
    if let Some(deleted) = write.deleted {
        note.deleted = deleted;
    }
    note.modifydate = write.modifydate.unwrap_or_else(now_stamp);
    note.version += 1;
    Ok(Json(note.clone()))
}

async fn delete_note(
    State(db): State<Db>,
    Path(key): Path<String>,
    Query(params): Query<Params>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    authorize(&store, &params)?;
    let position = store
        .notes
        .iter()
        .position(|note| note.key == key)
        .ok_or(StatusCode::NOT_FOUND)?;
    store.notes.remove(position);
    Ok(StatusCode::OK)
}

/// `length` is clamped into 1..=100, `since` keeps notes modified after the
/// given epoch seconds, and `mark` is the key of the first note of the page.
async fn index_notes(
    State(db): State<Db>,
    Query(params): Query<Params>,
) -> Result<Json<IndexPage>, StatusCode> {
    let store = db.read().await;
    authorize(&store, &params)?;

    let length = params
        .get("length")
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(DEFAULT_INDEX_LENGTH)
        .clamp(1, 100) as usize;
    let since = match params.get("since") {
        Some(value) => Some(value.parse::<f64>().map_err(|_| StatusCode::BAD_REQUEST)?),
        None => None,
    };

    let matching: Vec<&Note> = store
        .notes
        .iter()
        .filter(|note| match since {
            Some(since) => stamp_value(&note.modifydate) > since,
            None => true,
        })
        .collect();

    let start = match params.get("mark") {
        Some(mark) => matching
            .iter()
            .position(|note| note.key == *mark)
            .ok_or(StatusCode::BAD_REQUEST)?,
        None => 0,
    };

    let data: Vec<IndexEntry> = matching[start..]
        .iter()
        .take(length)
        .map(|note| IndexEntry::from(*note))
        .collect();
    let mark = matching.get(start + length).map(|note| note.key.clone());

    Ok(Json(IndexPage {
        count: data.len(),
        data,
        time: now_stamp(),
        mark,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_session() -> Store {
        let mut store = Store::default();
        store.sessions.insert("TOKEN".to_string(), DEFAULT_EMAIL.to_string());
        store
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn authorize_accepts_matching_token() {
        let store = store_with_session();
        let p = params(&[("email", DEFAULT_EMAIL), ("auth", "TOKEN")]);
        assert!(authorize(&store, &p).is_ok());
    }

    #[test]
    fn authorize_rejects_wrong_email_or_missing_token() {
        let store = store_with_session();
        let wrong = params(&[("email", "other@example.com"), ("auth", "TOKEN")]);
        assert_eq!(authorize(&store, &wrong), Err(StatusCode::UNAUTHORIZED));
        let missing = params(&[("email", DEFAULT_EMAIL)]);
        assert_eq!(authorize(&store, &missing), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn index_entry_drops_content() {
        let note = Note {
            key: "k".to_string(),
            content: "secret body".to_string(),
            version: 3,
            ..Note::default()
        };
        let entry = IndexEntry::from(&note);
        assert_eq!(entry.version, 3);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("content").is_none());
    }

    #[test]
    fn note_write_all_fields_optional() {
        let write: NoteWrite = serde_json::from_str("{}").unwrap();
        assert!(write.content.is_none());
        assert!(write.deleted.is_none());
    }

    #[test]
    fn stamp_value_tolerates_garbage() {
        assert_eq!(stamp_value("1700000000.500000"), 1_700_000_000.5);
        assert_eq!(stamp_value(""), 0.0);
    }
}
