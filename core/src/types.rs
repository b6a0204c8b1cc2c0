//! Domain DTOs for the note service API.
//!
//! # Design
//! The remote service answers single-note and index requests with different
//! shapes, so each gets its own type: `Note` for `/api2/data`, `IndexListing`
//! holding `NoteSummary` entries for `/api2/index`. Fields the service leaves
//! out decode to their defaults; empty optional fields are skipped on output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest page size accepted by the index endpoint.
pub const MIN_INDEX_LENGTH: i64 = 1;
/// Largest page size accepted by the index endpoint.
pub const MAX_INDEX_LENGTH: i64 = 100;
/// Page size used when the caller does not ask for one.
pub const DEFAULT_INDEX_LENGTH: i64 = 10;

/// A single note as returned by `/api2/data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Note {
    pub key: String,
    /// Pseudo-boolean: 1 when the note is in the trash.
    pub deleted: u8,
    pub modifydate: String,
    pub createdate: String,
    pub syncnum: u64,
    pub version: u64,
    pub minversion: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sharekey: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publishkey: String,
    pub systemtags: Vec<String>,
    pub tags: Vec<String>,
    pub content: String,
}

impl Note {
    pub fn is_deleted(&self) -> bool {
        self.deleted != 0
    }
}

/// One entry of an index listing. Same metadata as `Note`, no content.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NoteSummary {
    pub key: String,
    pub deleted: u8,
    pub modifydate: String,
    pub createdate: String,
    pub syncnum: u64,
    pub version: u64,
    pub minversion: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sharekey: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publishkey: String,
    pub systemtags: Vec<String>,
    pub tags: Vec<String>,
}

/// A page of the note index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexListing {
    pub count: u32,
    pub data: Vec<NoteSummary>,
    pub time: String,
    /// Cursor for the next page; absent on the last one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<String>,
}

/// Parameters of an index request.
#[derive(Debug, Clone, Default)]
pub struct IndexQuery {
    pub length: i64,
    /// Only notes modified after this epoch-seconds timestamp.
    pub since: String,
    pub mark: String,
}

impl IndexQuery {
    pub fn new(length: i64, since: &str, mark: &str) -> Self {
        Self {
            length,
            since: since.to_string(),
            mark: mark.to_string(),
        }
    }

    /// `length` clamped into `[MIN_INDEX_LENGTH, MAX_INDEX_LENGTH]`.
    pub fn clamped_length(&self) -> i64 {
        self.length.clamp(MIN_INDEX_LENGTH, MAX_INDEX_LENGTH)
    }
}

/// Input for creating a note. The server assigns everything else.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub content: String,
    pub tags: Vec<String>,
}

/// Input for updating a note. `deleted` moves it to the trash; `false`
/// leaves the trash flag as the server has it, so editing a trashed note does
/// not restore it.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub content: String,
    pub deleted: bool,
}

/// JSON body POSTed to `/api2/data`. Absent fields are left untouched by the
/// server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub createdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifydate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<u8>,
}

impl NotePayload {
    pub fn create(input: &NewNote, at: DateTime<Utc>) -> Self {
        Self {
            content: Some(input.content.clone()),
            tags: Some(input.tags.clone()),
            createdate: Some(epoch_seconds(at)),
            ..Self::default()
        }
    }

    /// `deleted` is only sent when moving to the trash.
    pub fn update(input: &NoteUpdate, at: DateTime<Utc>) -> Self {
        Self {
            content: Some(input.content.clone()),
            modifydate: Some(epoch_seconds(at)),
            deleted: input.deleted.then_some(1),
            ..Self::default()
        }
    }
}

/// Render `at` the way the service stores dates: seconds since the epoch with
/// microsecond precision, e.g. `"1700000000.250000"`.
pub fn epoch_seconds(at: DateTime<Utc>) -> String {
    format!("{:.6}", at.timestamp_micros() as f64 / 1_000_000.0)
}
