//! Persistence seams
//!
//! `ChainingStore` is the read path used by the outstanding-work resolver.
//! `ManagementStore` carries the administrative operations behind the
//! chaining, event and group routes. Both are implemented by the in-memory
//! store (dev mode, tests) and by the MongoDB store.

pub mod memory;
pub mod model;

pub use memory::InMemoryStore;
pub use model::{
    ChainingDefinition, ChainingFilter, ChainingInput, ChainingItem, ChainingItemInput,
    CompanyScope, EventFilter, EventInput, EventTrigger, GroupChainings, ItemKind,
};

use chrono::{DateTime, Utc};

use crate::types::Result;

/// Read-only queries needed to evaluate outstanding chaining work
#[async_trait::async_trait]
pub trait ChainingStore: Send + Sync {
    /// Active, non-deleted chainings reachable from the device through its
    /// group memberships. Items are ordered by sequence; each chaining
    /// appears once.
    async fn list_active_chainings_for_device(
        &self,
        device_external_id: &str,
    ) -> Result<Vec<ChainingDefinition>>;

    /// Latest completion timestamp for the item by `user_id` within
    /// `[utc_start, utc_end)`.
    async fn find_completion(
        &self,
        kind: ItemKind,
        item_id: &str,
        chaining_id: &str,
        user_id: &str,
        utc_start: DateTime<Utc>,
        utc_end: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>>;

    /// Inspection name or questionnaire title; empty when not found
    async fn item_display_name(&self, kind: ItemKind, item_id: &str) -> Result<String>;
}

/// Administrative operations on chainings, events and group assignments.
///
/// `scope` restricts reads and writes to one company; None is unrestricted.
#[async_trait::async_trait]
pub trait ManagementStore: Send + Sync {
    async fn create_chaining(
        &self,
        input: ChainingInput,
        company_id: &str,
        actor: &str,
    ) -> Result<ChainingDefinition>;

    /// Chaining with items in sequence order, None when missing
    async fn get_chaining(
        &self,
        id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<ChainingDefinition>>;

    /// Replace master fields and reconcile items. None when missing.
    async fn update_chaining(
        &self,
        id: &str,
        input: ChainingInput,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<Option<ChainingDefinition>>;

    /// Soft delete; false when missing
    async fn delete_chaining(&self, id: &str, scope: CompanyScope<'_>, actor: &str)
        -> Result<bool>;

    /// Newest first
    async fn filter_chainings(
        &self,
        filter: &ChainingFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<ChainingDefinition>>;

    async fn create_event(
        &self,
        input: EventInput,
        company_id: &str,
        actor: &str,
    ) -> Result<EventTrigger>;

    async fn update_event(
        &self,
        id: &str,
        input: EventInput,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<Option<EventTrigger>>;

    async fn delete_event(&self, id: &str, scope: CompanyScope<'_>, actor: &str) -> Result<bool>;

    /// Newest first
    async fn filter_events(
        &self,
        filter: &EventFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<EventTrigger>>;

    async fn group_chainings(
        &self,
        group_id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>>;

    /// Replace the group's chaining set with the existing chainings among
    /// `chaining_ids`. None when the group is missing.
    async fn assign_group_chainings(
        &self,
        group_id: &str,
        chaining_ids: &[String],
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>>;

    /// Active chainings owned by a company
    async fn list_company_chainings(&self, company_id: &str) -> Result<Vec<ChainingDefinition>>;
}
