//! Domain records exchanged with the persistence layer
//!
//! Identifiers are opaque strings; the Mongo backend uses ObjectId hex and
//! the in-memory backend uses UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schedule::Recurrence;

/// Kind of work a chaining item refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Inspection,
    Questionnaire,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Inspection => write!(f, "inspection"),
            ItemKind::Questionnaire => write!(f, "questionnaire"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inspection" => Ok(ItemKind::Inspection),
            "questionnaire" => Ok(ItemKind::Questionnaire),
            other => Err(format!("Unknown item type: {}", other)),
        }
    }
}

/// One unit of work inside a chaining
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainingItem {
    pub id: String,
    pub id_chaining: String,
    pub item_type: ItemKind,
    pub item_id: String,
    pub sequence: u32,
    /// Catalog display name, filled on detail reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
}

/// Named event a chaining can be linked to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTrigger {
    pub id: String,
    pub event_name: String,
    pub trigger: bool,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub company_id: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A chaining definition with its items in sequence order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainingDefinition {
    pub id: String,
    pub name_chaining: String,
    /// First occurrence start; None when never set
    pub trigger_datetime: Option<DateTime<Utc>>,
    pub frequency_value: Option<u32>,
    pub frequency_unit: Option<String>,
    pub event_trigger_id: Option<String>,
    /// Linked event, absent when unlinked or deleted
    pub events: Option<EventTrigger>,
    pub is_active: bool,
    pub company_id: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub details: Vec<ChainingItem>,
}

impl ChainingDefinition {
    pub fn recurrence(&self) -> Recurrence {
        Recurrence::from_parts(self.frequency_value, self.frequency_unit.as_deref())
    }

    /// Name of the linked event, empty when none
    pub fn event_name(&self) -> &str {
        self.events.as_ref().map(|e| e.event_name.as_str()).unwrap_or("")
    }

    /// Stored trigger flag of the linked event
    pub fn event_trigger_active(&self) -> bool {
        self.events.as_ref().map(|e| e.trigger).unwrap_or(false)
    }

    pub fn sort_details(&mut self) {
        self.details.sort_by_key(|d| d.sequence);
    }
}

/// Item payload for create/update requests
#[derive(Debug, Clone, Deserialize)]
pub struct ChainingItemInput {
    /// Existing item id; absent for new items
    #[serde(default)]
    pub id: Option<String>,
    pub item_type: ItemKind,
    pub item_id: String,
    pub sequence: u32,
}

/// Chaining payload for create/update requests
#[derive(Debug, Clone, Deserialize)]
pub struct ChainingInput {
    pub name_chaining: String,
    #[serde(default)]
    pub trigger_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub frequency_value: Option<u32>,
    #[serde(default)]
    pub frequency_unit: Option<String>,
    #[serde(default)]
    pub event_trigger_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub details: Vec<ChainingItemInput>,
}

fn default_true() -> bool {
    true
}

impl ChainingInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name_chaining.trim().is_empty() {
            return Err("name_chaining is required".to_string());
        }
        if self.details.iter().any(|d| d.item_id.trim().is_empty()) {
            return Err("item_id is required for every detail".to_string());
        }
        Ok(())
    }
}

/// Event payload for create/update requests
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub event_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl EventInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.event_name.trim().is_empty() {
            return Err("event_name is required".to_string());
        }
        Ok(())
    }
}

/// Filters for chaining listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainingFilter {
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Case-insensitive substring
    #[serde(default)]
    pub name_chaining: Option<String>,
}

/// Filters for event listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Case-insensitive substring
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Chaining membership of a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupChainings {
    pub group_id: String,
    pub company_id: String,
    pub chaining_ids: Vec<String>,
}

/// Which companies a caller may see. None means every company.
pub type CompanyScope<'a> = Option<&'a str>;

/// Case-insensitive substring match used by the filters
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Treat empty filter values as absent
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
