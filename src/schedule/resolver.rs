//! Outstanding-work aggregation
//!
//! For every chaining reachable from a device, compute the occurrence window
//! active now, check each item against the user's completion records, and
//! report chainings that still have work left.

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::logging::{FallbackKind, FallbackMetrics};
use crate::schedule::completion::CompletionChecker;
use crate::schedule::window::current_window;
use crate::store::{ChainingDefinition, ChainingItem, ChainingStore, ItemKind};
use crate::types::{AssuranceError, Result};

/// One item still to be done in the current occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingItem {
    pub id_detail: String,
    pub item_type: ItemKind,
    pub item_id: String,
    pub item_name: String,
    pub sequence: u32,
}

/// A chaining with outstanding items in its current occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveChaining {
    pub id: String,
    pub name_chaining: String,
    /// Window start in the caller's timezone
    pub trigger_time_local: DateTime<FixedOffset>,
    pub trigger_time_utc: DateTime<Utc>,
    pub window_end_local: DateTime<FixedOffset>,
    pub frequency_unit: String,
    pub frequency_value: u32,
    pub event_trigger_id: Option<String>,
    pub event_name: String,
    pub event_trigger_active: bool,
    pub active_items: Vec<OutstandingItem>,
    pub timezone: String,
}

/// Result of an outstanding-work evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Outstanding(Vec<ActiveChaining>),
    NoneOutstanding,
}

/// Evaluates outstanding chaining work for a device and user
#[derive(Clone)]
pub struct ChainingResolver {
    store: Arc<dyn ChainingStore>,
    checker: CompletionChecker,
    metrics: Arc<FallbackMetrics>,
}

impl ChainingResolver {
    pub fn new(store: Arc<dyn ChainingStore>, metrics: Arc<FallbackMetrics>) -> Self {
        Self {
            checker: CompletionChecker::new(store.clone()),
            store,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<FallbackMetrics> {
        &self.metrics
    }

    /// Evaluate against the current instant
    pub async fn resolve_outstanding(
        &self,
        device_external_id: &str,
        user_id: &str,
        tz: Tz,
    ) -> Result<Outcome> {
        self.resolve_outstanding_at(device_external_id, user_id, tz, Utc::now())
            .await
    }

    /// Evaluate against a fixed instant.
    ///
    /// A store failure while listing chainings fails the whole evaluation.
    /// A failed completion lookup only drops the affected chaining.
    pub async fn resolve_outstanding_at(
        &self,
        device_external_id: &str,
        user_id: &str,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        if user_id.trim().is_empty() {
            return Err(AssuranceError::BadRequest(
                "User identity is required".to_string(),
            ));
        }

        let chainings = self
            .store
            .list_active_chainings_for_device(device_external_id)
            .await?;
        let now_local = now.with_timezone(&tz);

        let mut active = Vec::new();
        for def in &chainings {
            match self.evaluate(def, user_id, &tz, &now_local).await {
                Ok(Some(chaining)) => active.push(chaining),
                Ok(None) => {}
                Err(e) => warn!(
                    chaining_id = %def.id,
                    device = device_external_id,
                    error = %e,
                    "Completion lookup failed, chaining excluded"
                ),
            }
        }

        debug!(
            device = device_external_id,
            considered = chainings.len(),
            outstanding = active.len(),
            "Outstanding chainings resolved"
        );

        if active.is_empty() {
            Ok(Outcome::NoneOutstanding)
        } else {
            Ok(Outcome::Outstanding(active))
        }
    }

    async fn evaluate(
        &self,
        def: &ChainingDefinition,
        user_id: &str,
        tz: &Tz,
        now: &DateTime<Tz>,
    ) -> Result<Option<ActiveChaining>> {
        let Some(anchor) = def.trigger_datetime else {
            debug!(chaining_id = %def.id, "Chaining has no trigger time, skipped");
            return Ok(None);
        };
        let anchor = anchor.with_timezone(tz);
        if anchor > *now {
            return Ok(None);
        }

        let recurrence = def.recurrence();
        if let Some(raw) = recurrence.unit_fallback() {
            self.metrics.record(FallbackKind::FrequencyUnit, raw);
        }

        if def.details.is_empty() {
            return Ok(None);
        }

        let window = current_window(&anchor, &recurrence, now);

        let mut outstanding = Vec::new();
        for item in &def.details {
            let status = self
                .checker
                .is_completed(item.item_type, &item.item_id, &def.id, user_id, &window)
                .await?;
            if !status.completed {
                outstanding.push(self.outstanding_item(item).await);
            }
        }

        if outstanding.is_empty() {
            return Ok(None);
        }

        let event_name = def.event_name().to_string();
        let event_trigger_active = event_name.is_empty() || def.event_trigger_active();

        Ok(Some(ActiveChaining {
            id: def.id.clone(),
            name_chaining: def.name_chaining.clone(),
            trigger_time_local: window.start.fixed_offset(),
            trigger_time_utc: window.start_utc(),
            window_end_local: window.end.fixed_offset(),
            frequency_unit: def.frequency_unit.clone().unwrap_or_default(),
            frequency_value: def.frequency_value.unwrap_or(0),
            event_trigger_id: def.event_trigger_id.clone(),
            event_name,
            event_trigger_active,
            active_items: outstanding,
            timezone: tz.name().to_string(),
        }))
    }

    async fn outstanding_item(&self, item: &ChainingItem) -> OutstandingItem {
        let item_name = match self
            .store
            .item_display_name(item.item_type, &item.item_id)
            .await
        {
            Ok(name) => name,
            Err(e) => {
                warn!(item_id = %item.item_id, kind = %item.item_type, error = %e, "Display name lookup failed");
                String::new()
            }
        };

        OutstandingItem {
            id_detail: item.id.clone(),
            item_type: item.item_type,
            item_id: item.item_id.clone(),
            item_name,
            sequence: item.sequence,
        }
    }
}
