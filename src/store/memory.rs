//! In-memory store
//!
//! Backs dev mode when MongoDB is unreachable and every resolver test.
//! Soft deletes mirror the Mongo store so both behave the same through the
//! traits.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::model::{contains_ignore_case, non_empty};
use crate::store::{
    ChainingDefinition, ChainingFilter, ChainingInput, ChainingItem, ChainingStore, CompanyScope,
    EventFilter, EventInput, EventTrigger, GroupChainings, ItemKind, ManagementStore,
};
use crate::types::Result;

struct DeviceRow {
    id: String,
    device_id: String,
    deleted: bool,
}

struct GroupRow {
    id: String,
    company_id: String,
    device_ids: Vec<String>,
    chaining_ids: Vec<String>,
    deleted: bool,
}

struct ChainingRow {
    def: ChainingDefinition,
    deleted: bool,
    deleted_by: Option<String>,
}

struct EventRow {
    event: EventTrigger,
    deleted: bool,
    deleted_by: Option<String>,
}

struct CompletionRow {
    kind: ItemKind,
    item_id: String,
    chaining_id: String,
    user_id: String,
    completed_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    devices: Vec<DeviceRow>,
    groups: Vec<GroupRow>,
    chainings: Vec<ChainingRow>,
    events: Vec<EventRow>,
    completions: Vec<CompletionRow>,
    catalog: HashMap<(ItemKind, String), String>,
}

impl Inner {
    fn live_event(&self, id: &str) -> Option<&EventTrigger> {
        self.events
            .iter()
            .find(|row| !row.deleted && row.event.id == id)
            .map(|row| &row.event)
    }

    /// Chaining with its linked event attached and items sorted
    fn hydrate(&self, row: &ChainingRow) -> ChainingDefinition {
        let mut def = row.def.clone();
        def.events = def
            .event_trigger_id
            .as_deref()
            .and_then(|id| self.live_event(id))
            .cloned();
        def.sort_details();
        def
    }

    fn chaining_mut(&mut self, id: &str, scope: CompanyScope<'_>) -> Option<&mut ChainingRow> {
        self.chainings
            .iter_mut()
            .find(|row| !row.deleted && row.def.id == id && in_scope(&row.def.company_id, scope))
    }

    fn event_mut(&mut self, id: &str, scope: CompanyScope<'_>) -> Option<&mut EventRow> {
        self.events
            .iter_mut()
            .find(|row| !row.deleted && row.event.id == id && in_scope(&row.event.company_id, scope))
    }
}

fn in_scope(company_id: &str, scope: CompanyScope<'_>) -> bool {
    scope.map_or(true, |c| c == company_id)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Map input items onto a chaining, keeping ids of items that already exist
fn reconcile_items(
    chaining_id: &str,
    existing: &[ChainingItem],
    input: &[crate::store::ChainingItemInput],
) -> Vec<ChainingItem> {
    input
        .iter()
        .map(|item| {
            let id = item
                .id
                .as_deref()
                .filter(|id| existing.iter().any(|e| e.id == *id))
                .map(str::to_string)
                .unwrap_or_else(new_id);
            ChainingItem {
                id,
                id_chaining: chaining_id.to_string(),
                item_type: item.item_type,
                item_id: item.item_id.clone(),
                sequence: item.sequence,
                item_name: None,
            }
        })
        .collect()
}

/// In-memory implementation of both store traits
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device by its external identifier, returning its internal id
    pub async fn add_device(&self, device_external_id: &str) -> String {
        let id = new_id();
        self.inner.write().await.devices.push(DeviceRow {
            id: id.clone(),
            device_id: device_external_id.to_string(),
            deleted: false,
        });
        id
    }

    /// Create a group containing the given devices (internal ids)
    pub async fn add_group(&self, company_id: &str, device_ids: &[String]) -> String {
        let id = new_id();
        self.inner.write().await.groups.push(GroupRow {
            id: id.clone(),
            company_id: company_id.to_string(),
            device_ids: device_ids.to_vec(),
            chaining_ids: Vec::new(),
            deleted: false,
        });
        id
    }

    /// Soft delete a group
    pub async fn remove_group(&self, group_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(group) = inner.groups.iter_mut().find(|g| g.id == group_id) {
            group.deleted = true;
        }
    }

    /// Add an inspection or questionnaire to the catalog, returning its id
    pub async fn add_catalog_item(&self, kind: ItemKind, name: &str) -> String {
        let id = new_id();
        self.inner
            .write()
            .await
            .catalog
            .insert((kind, id.clone()), name.to_string());
        id
    }

    /// Record an inspection submission or questionnaire answer
    pub async fn record_completion(
        &self,
        kind: ItemKind,
        item_id: &str,
        chaining_id: &str,
        user_id: &str,
        completed_at: DateTime<Utc>,
    ) {
        self.inner.write().await.completions.push(CompletionRow {
            kind,
            item_id: item_id.to_string(),
            chaining_id: chaining_id.to_string(),
            user_id: user_id.to_string(),
            completed_at,
        });
    }
}

#[async_trait::async_trait]
impl ChainingStore for InMemoryStore {
    async fn list_active_chainings_for_device(
        &self,
        device_external_id: &str,
    ) -> Result<Vec<ChainingDefinition>> {
        let inner = self.inner.read().await;

        let device_ids: Vec<&str> = inner
            .devices
            .iter()
            .filter(|d| !d.deleted && d.device_id == device_external_id)
            .map(|d| d.id.as_str())
            .collect();

        let mut chaining_ids: Vec<&str> = Vec::new();
        for group in inner.groups.iter().filter(|g| !g.deleted) {
            if group.device_ids.iter().any(|d| device_ids.contains(&d.as_str())) {
                for id in &group.chaining_ids {
                    if !chaining_ids.contains(&id.as_str()) {
                        chaining_ids.push(id);
                    }
                }
            }
        }

        Ok(inner
            .chainings
            .iter()
            .filter(|row| {
                !row.deleted && row.def.is_active && chaining_ids.contains(&row.def.id.as_str())
            })
            .map(|row| inner.hydrate(row))
            .collect())
    }

    async fn find_completion(
        &self,
        kind: ItemKind,
        item_id: &str,
        chaining_id: &str,
        user_id: &str,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .completions
            .iter()
            .filter(|c| {
                c.kind == kind
                    && c.item_id == item_id
                    && c.chaining_id == chaining_id
                    && c.user_id == user_id
                    && c.completed_at >= utc_start
                    && c.completed_at < utc_end
            })
            .map(|c| c.completed_at)
            .max())
    }

    async fn item_display_name(&self, kind: ItemKind, item_id: &str) -> Result<String> {
        let inner = self.inner.read().await;
        Ok(inner
            .catalog
            .get(&(kind, item_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ManagementStore for InMemoryStore {
    async fn create_chaining(
        &self,
        input: ChainingInput,
        company_id: &str,
        actor: &str,
    ) -> Result<ChainingDefinition> {
        let id = new_id();
        let now = Utc::now();
        let def = ChainingDefinition {
            details: reconcile_items(&id, &[], &input.details),
            id,
            name_chaining: input.name_chaining,
            trigger_datetime: input.trigger_datetime,
            frequency_value: input.frequency_value,
            frequency_unit: input.frequency_unit,
            event_trigger_id: input.event_trigger_id,
            events: None,
            is_active: input.is_active,
            company_id: company_id.to_string(),
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let mut inner = self.inner.write().await;
        let row = ChainingRow {
            def,
            deleted: false,
            deleted_by: None,
        };
        let hydrated = inner.hydrate(&row);
        inner.chainings.push(row);
        Ok(hydrated)
    }

    async fn get_chaining(
        &self,
        id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<ChainingDefinition>> {
        let inner = self.inner.read().await;
        let Some(row) = inner
            .chainings
            .iter()
            .find(|row| !row.deleted && row.def.id == id && in_scope(&row.def.company_id, scope))
        else {
            return Ok(None);
        };

        let mut def = inner.hydrate(row);
        for item in &mut def.details {
            item.item_name = inner
                .catalog
                .get(&(item.item_type, item.item_id.clone()))
                .cloned();
        }
        Ok(Some(def))
    }

    async fn update_chaining(
        &self,
        id: &str,
        input: ChainingInput,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<Option<ChainingDefinition>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.chaining_mut(id, scope) else {
            return Ok(None);
        };

        let def = &mut row.def;
        def.details = reconcile_items(&def.id, &def.details, &input.details);
        def.name_chaining = input.name_chaining;
        def.trigger_datetime = input.trigger_datetime;
        def.frequency_value = input.frequency_value;
        def.frequency_unit = input.frequency_unit;
        def.event_trigger_id = input.event_trigger_id;
        def.is_active = input.is_active;
        def.updated_by = actor.to_string();
        def.updated_at = Some(Utc::now());

        let inner = &*inner;
        let row = inner
            .chainings
            .iter()
            .find(|row| !row.deleted && row.def.id == id);
        Ok(row.map(|row| inner.hydrate(row)))
    }

    async fn delete_chaining(
        &self,
        id: &str,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.chaining_mut(id, scope) {
            Some(row) => {
                row.deleted = true;
                row.deleted_by = Some(actor.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn filter_chainings(
        &self,
        filter: &ChainingFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<ChainingDefinition>> {
        let inner = self.inner.read().await;
        let created_by = non_empty(&filter.created_by);
        let updated_by = non_empty(&filter.updated_by);
        let name = non_empty(&filter.name_chaining);

        Ok(inner
            .chainings
            .iter()
            .rev()
            .filter(|row| !row.deleted && in_scope(&row.def.company_id, scope))
            .filter(|row| created_by.map_or(true, |v| row.def.created_by == v))
            .filter(|row| updated_by.map_or(true, |v| row.def.updated_by == v))
            .filter(|row| name.map_or(true, |v| contains_ignore_case(&row.def.name_chaining, v)))
            .map(|row| inner.hydrate(row))
            .collect())
    }

    async fn create_event(
        &self,
        input: EventInput,
        company_id: &str,
        actor: &str,
    ) -> Result<EventTrigger> {
        let now = Utc::now();
        let event = EventTrigger {
            id: new_id(),
            event_name: input.event_name,
            trigger: input.trigger,
            description: input.description,
            is_active: input.is_active,
            company_id: company_id.to_string(),
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.inner.write().await.events.push(EventRow {
            event: event.clone(),
            deleted: false,
            deleted_by: None,
        });
        Ok(event)
    }

    async fn update_event(
        &self,
        id: &str,
        input: EventInput,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<Option<EventTrigger>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.event_mut(id, scope) else {
            return Ok(None);
        };
        row.event.event_name = input.event_name;
        row.event.description = input.description;
        row.event.trigger = input.trigger;
        row.event.is_active = input.is_active;
        row.event.updated_by = actor.to_string();
        row.event.updated_at = Some(Utc::now());
        Ok(Some(row.event.clone()))
    }

    async fn delete_event(&self, id: &str, scope: CompanyScope<'_>, actor: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.event_mut(id, scope) {
            Some(row) => {
                row.deleted = true;
                row.deleted_by = Some(actor.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn filter_events(
        &self,
        filter: &EventFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<EventTrigger>> {
        let inner = self.inner.read().await;
        let created_by = non_empty(&filter.created_by);
        let updated_by = non_empty(&filter.updated_by);
        let name = non_empty(&filter.event_name);
        let id = non_empty(&filter.id);

        Ok(inner
            .events
            .iter()
            .rev()
            .filter(|row| !row.deleted && in_scope(&row.event.company_id, scope))
            .map(|row| &row.event)
            .filter(|e| created_by.map_or(true, |v| e.created_by == v))
            .filter(|e| updated_by.map_or(true, |v| e.updated_by == v))
            .filter(|e| name.map_or(true, |v| contains_ignore_case(&e.event_name, v)))
            .filter(|e| id.map_or(true, |v| e.id == v))
            .cloned()
            .collect())
    }

    async fn group_chainings(
        &self,
        group_id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>> {
        let inner = self.inner.read().await;
        let Some(group) = inner
            .groups
            .iter()
            .find(|g| !g.deleted && g.id == group_id && in_scope(&g.company_id, scope))
        else {
            return Ok(None);
        };

        let chaining_ids = group
            .chaining_ids
            .iter()
            .filter(|id| {
                inner.chainings.iter().any(|row| {
                    !row.deleted && row.def.id == **id && row.def.company_id == group.company_id
                })
            })
            .cloned()
            .collect();

        Ok(Some(GroupChainings {
            group_id: group.id.clone(),
            company_id: group.company_id.clone(),
            chaining_ids,
        }))
    }

    async fn assign_group_chainings(
        &self,
        group_id: &str,
        chaining_ids: &[String],
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>> {
        let mut inner = self.inner.write().await;

        let Some(company_id) = inner
            .groups
            .iter()
            .find(|g| !g.deleted && g.id == group_id && in_scope(&g.company_id, scope))
            .map(|g| g.company_id.clone())
        else {
            return Ok(None);
        };

        let mut existing: Vec<String> = Vec::new();
        for id in chaining_ids {
            let known = inner.chainings.iter().any(|row| {
                !row.deleted && row.def.id == *id && row.def.company_id == company_id
            });
            if known && !existing.contains(id) {
                existing.push(id.clone());
            }
        }

        let Some(group) = inner
            .groups
            .iter_mut()
            .find(|g| !g.deleted && g.id == group_id)
        else {
            return Ok(None);
        };
        group.chaining_ids = existing;

        Ok(Some(GroupChainings {
            group_id: group.id.clone(),
            company_id: group.company_id.clone(),
            chaining_ids: group.chaining_ids.clone(),
        }))
    }

    async fn list_company_chainings(&self, company_id: &str) -> Result<Vec<ChainingDefinition>> {
        let inner = self.inner.read().await;
        Ok(inner
            .chainings
            .iter()
            .filter(|row| !row.deleted && row.def.is_active && row.def.company_id == company_id)
            .map(|row| inner.hydrate(row))
            .collect())
    }
}
