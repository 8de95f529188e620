//! Cursor pagination shared by every list query.
//!
//! Rows carry a monotonically increasing `seq`. A page is read by keyset
//! (`seq < cursor` for newest-first lists, `seq > cursor` for oldest-first
//! ones), so rows inserted between two page requests never shift the
//! window.

use super::error::{SocialError, SocialResult};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// One page of results plus the cursor to continue from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque cursor for the next page, `None` once the list is exhausted.
    pub continue_cursor: Option<String>,
    pub is_done: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            continue_cursor: None,
            is_done: true,
        }
    }

    /// Build a page from `(seq, item)` rows fetched with `limit + 1`.
    pub fn from_rows(mut rows: Vec<(i64, T)>, limit: u32) -> Self {
        let limit = limit as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let continue_cursor = if has_more {
            rows.last().map(|(seq, _)| encode_cursor(*seq))
        } else {
            None
        };

        Self {
            items: rows.into_iter().map(|(_, item)| item).collect(),
            continue_cursor,
            is_done: !has_more,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Page {
            items,
            continue_cursor: self.continue_cursor,
            is_done: self.is_done,
        })
    }
}

/// Caller-supplied paging parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            cursor: None,
            limit: Some(limit),
        }
    }

    pub fn next(cursor: impl Into<String>, limit: u32) -> Self {
        Self {
            cursor: Some(cursor.into()),
            limit: Some(limit),
        }
    }

    /// Decode the cursor and clamp the limit to `[1, max]`.
    pub fn bounds(&self, default_limit: u32, max_limit: u32) -> SocialResult<PageBounds> {
        let max_limit = max_limit.max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit);
        let after = self.cursor.as_deref().map(decode_cursor).transpose()?;
        Ok(PageBounds { after, limit })
    }
}

/// Decoded paging parameters ready for a keyset query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// `seq` of the last row of the previous page.
    pub after: Option<i64>,
    pub limit: u32,
}

impl PageBounds {
    /// Number of rows to ask the database for.
    pub fn fetch(&self) -> i64 {
        self.limit as i64 + 1
    }

    /// Keyset bound for newest-first queries.
    pub fn before_seq(&self) -> i64 {
        self.after.unwrap_or(i64::MAX)
    }

    /// Keyset bound for oldest-first queries.
    pub fn after_seq(&self) -> i64 {
        self.after.unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    seq: i64,
}

pub fn encode_cursor(seq: i64) -> String {
    let json = serde_json::to_vec(&CursorPayload { seq }).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode_cursor(cursor: &str) -> SocialResult<i64> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.trim())
        .map_err(|e| SocialError::InvalidCursor(e.to_string()))?;
    let payload: CursorPayload =
        serde_json::from_slice(&bytes).map_err(|e| SocialError::InvalidCursor(e.to_string()))?;
    if payload.seq <= 0 {
        return Err(SocialError::InvalidCursor(format!(
            "sequence out of range: {}",
            payload.seq
        )));
    }
    Ok(payload.seq)
}
