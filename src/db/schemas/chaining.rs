//! Chaining document schema
//!
//! Items are embedded in their chaining, so deleting the chaining removes
//! them with it.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::store::{ChainingDefinition, ChainingItem, EventTrigger, ItemKind};

pub const CHAINING_COLLECTION: &str = "chainings";

/// Embedded chaining item
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChainingItemDoc {
    pub _id: ObjectId,
    pub item_type: ItemKind,
    pub item_id: ObjectId,
    pub sequence: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ChainingDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    pub name_chaining: String,

    /// First occurrence start
    #[serde(default)]
    pub trigger_datetime: Option<DateTime>,

    #[serde(default)]
    pub frequency_value: Option<u32>,

    #[serde(default)]
    pub frequency_unit: Option<String>,

    #[serde(default)]
    pub event_trigger_id: Option<ObjectId>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub created_by: String,

    #[serde(default)]
    pub updated_by: String,

    #[serde(default)]
    pub details: Vec<ChainingItemDoc>,
}

impl ChainingDoc {
    /// Convert to the domain record, attaching the linked event if loaded
    pub fn into_definition(self, events: Option<EventTrigger>) -> ChainingDefinition {
        let id = self._id.map(|id| id.to_hex()).unwrap_or_default();
        let details = self
            .details
            .into_iter()
            .map(|item| ChainingItem {
                id: item._id.to_hex(),
                id_chaining: id.clone(),
                item_type: item.item_type,
                item_id: item.item_id.to_hex(),
                sequence: item.sequence,
                item_name: None,
            })
            .collect();

        let mut def = ChainingDefinition {
            id,
            name_chaining: self.name_chaining,
            trigger_datetime: self.trigger_datetime.map(|t| t.to_chrono()),
            frequency_value: self.frequency_value,
            frequency_unit: self.frequency_unit,
            event_trigger_id: self.event_trigger_id.map(|id| id.to_hex()),
            events,
            is_active: self.is_active,
            company_id: self.company_id,
            created_by: self.created_by,
            updated_by: self.updated_by,
            created_at: self.metadata.created_at.map(|t| t.to_chrono()),
            updated_at: self.metadata.updated_at.map(|t| t.to_chrono()),
            details,
        };
        def.sort_details();
        def
    }
}

impl IntoIndexes for ChainingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "company_id": 1, "is_active": 1 },
                Some(
                    IndexOptions::builder()
                        .name("company_active_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "name_chaining": 1 },
                Some(
                    IndexOptions::builder()
                        .name("name_chaining_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ChainingDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_definition_sorts_items() {
        let chaining_id = ObjectId::new();
        let doc = ChainingDoc {
            _id: Some(chaining_id),
            company_id: "acme".into(),
            name_chaining: "Round".into(),
            frequency_value: Some(1),
            frequency_unit: Some("day".into()),
            is_active: true,
            details: vec![
                ChainingItemDoc {
                    _id: ObjectId::new(),
                    item_type: ItemKind::Questionnaire,
                    item_id: ObjectId::new(),
                    sequence: 9,
                },
                ChainingItemDoc {
                    _id: ObjectId::new(),
                    item_type: ItemKind::Inspection,
                    item_id: ObjectId::new(),
                    sequence: 2,
                },
            ],
            ..Default::default()
        };

        let def = doc.into_definition(None);
        assert_eq!(def.id, chaining_id.to_hex());
        assert_eq!(def.details[0].sequence, 2);
        assert_eq!(def.details[1].item_type, ItemKind::Questionnaire);
        assert!(def.details.iter().all(|d| d.id_chaining == def.id));
        assert!(def.trigger_datetime.is_none());
    }
}
