//! Cursor-based pagination.
//!
//! A cursor is the opaque, URL-safe encoding of the sort key of the last
//! item a client has seen: its timestamp and its row id. Queries resume
//! strictly after that key, so rows inserted between requests never shift
//! the following pages.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::Serialize;

use crate::consts;

#[derive(Debug, Display, Error, PartialEq)]
#[display("invalid pagination cursor")]
pub struct InvalidCursor;

/// Position of the last returned item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub id: i64,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: i64) -> Self {
        Self { timestamp, id }
    }

    /// Nanosecond precision keeps the cursor equal to the stored timestamp
    pub fn encode(&self) -> String {
        let nanos = self
            .timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.timestamp.timestamp_micros().saturating_mul(1_000));

        URL_SAFE_NO_PAD.encode(format!("{nanos}:{id}", id = self.id))
    }

    pub fn decode(raw: &str) -> Result<Self, InvalidCursor> {
        let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| InvalidCursor)?;
        let decoded = String::from_utf8(decoded).map_err(|_| InvalidCursor)?;
        let (nanos, id) = decoded.split_once(':').ok_or(InvalidCursor)?;

        let nanos = nanos.parse::<i64>().map_err(|_| InvalidCursor)?;
        let id = id.parse::<i64>().map_err(|_| InvalidCursor)?;

        Ok(Self {
            timestamp: DateTime::from_timestamp_nanos(nanos),
            id,
        })
    }
}

/// Validated pagination parameters of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub after: Option<Cursor>,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            after: None,
            limit: consts::DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Rows to fetch: one extra row tells whether another page exists
    pub fn fetch_limit(&self) -> i64 {
        self.limit + 1
    }
}

/// A page of items and the cursor to request the next one
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Builds a page from `fetch_limit` rows, trimming the look-ahead row
    pub fn from_rows(
        mut rows: Vec<T>,
        page: &PageRequest,
        cursor_of: impl Fn(&T) -> Cursor,
    ) -> Self {
        let limit = usize::try_from(page.limit).unwrap_or_default();
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = if has_more {
            rows.last().map(|item| cursor_of(item).encode())
        } else {
            None
        };

        Self {
            items: rows,
            next_cursor,
        }
    }
}
