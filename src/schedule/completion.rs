//! Completion lookups for chaining items

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use crate::schedule::window::OccurrenceWindow;
use crate::store::{ChainingStore, ItemKind};
use crate::types::Result;

/// Whether an item was completed inside an occurrence window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStatus {
    pub completed: bool,
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// Checks completion records against occurrence windows
#[derive(Clone)]
pub struct CompletionChecker {
    store: Arc<dyn ChainingStore>,
}

impl CompletionChecker {
    pub fn new(store: Arc<dyn ChainingStore>) -> Self {
        Self { store }
    }

    /// Query the store with the window bounds converted to UTC
    pub async fn is_completed<Z: TimeZone>(
        &self,
        kind: ItemKind,
        item_id: &str,
        chaining_id: &str,
        user_id: &str,
        window: &OccurrenceWindow<Z>,
    ) -> Result<CompletionStatus> {
        let last_completed_at = self
            .store
            .find_completion(
                kind,
                item_id,
                chaining_id,
                user_id,
                window.start_utc(),
                window.end_utc(),
            )
            .await?;

        Ok(CompletionStatus {
            completed: last_completed_at.is_some(),
            last_completed_at,
        })
    }
}
