//! Scheduled video lesson registry. Records are created by teachers and are
//! immutable once stored; ids are allocated monotonically and never reused.

use std::collections::HashMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::identity::{Account, AccountId, Role};

pub type LessonId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonRecord {
    pub id: LessonId,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub teacher_id: AccountId,
}

/// Owns all lesson records. The id counter shares the lock with the map so
/// concurrent schedules never collide on an id.
#[derive(Clone, Default)]
pub struct LessonStore(Arc<Mutex<LessonsInner>>);

#[derive(Default)]
struct LessonsInner {
    by_id: HashMap<LessonId, LessonRecord>,
    next_id: LessonId,
}

impl LessonStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a lesson on behalf of `account`. Input validation happens
    /// before any state is touched; either the record is fully stored or
    /// nothing is.
    pub fn schedule(&self, account: &Account, title: &str, scheduled_at: &str) -> AppResult<LessonRecord> {
        if account.role != Role::Teacher {
            return Err(AppError::forbidden("only teachers can schedule lessons"));
        }
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }
        let scheduled_at = DateTime::parse_from_rfc3339(scheduled_at)
            .map_err(|_| AppError::invalid_input("scheduled_at must be an RFC 3339 timestamp"))?
            .with_timezone(&Utc);
        let mut inner = self.0.lock();
        inner.next_id += 1;
        let record = LessonRecord {
            id: inner.next_id,
            title: title.to_string(),
            scheduled_at,
            teacher_id: account.id,
        };
        inner.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    /// Fetch a lesson by id. Any authenticated caller may read; there is no
    /// ownership check.
    pub fn get(&self, id: LessonId) -> AppResult<LessonRecord> {
        self.0
            .lock()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("lesson not found"))
    }

    pub fn len(&self) -> usize {
        self.0.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
