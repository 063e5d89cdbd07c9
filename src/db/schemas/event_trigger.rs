//! Event trigger document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::store::EventTrigger;

pub const EVENT_TRIGGER_COLLECTION: &str = "event_triggers";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EventTriggerDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    pub event_name: String,

    #[serde(default)]
    pub trigger: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub created_by: String,

    #[serde(default)]
    pub updated_by: String,
}

impl From<EventTriggerDoc> for EventTrigger {
    fn from(doc: EventTriggerDoc) -> Self {
        Self {
            id: doc._id.map(|id| id.to_hex()).unwrap_or_default(),
            event_name: doc.event_name,
            trigger: doc.trigger,
            description: doc.description,
            is_active: doc.is_active,
            company_id: doc.company_id,
            created_by: doc.created_by,
            updated_by: doc.updated_by,
            created_at: doc.metadata.created_at.map(|t| t.to_chrono()),
            updated_at: doc.metadata.updated_at.map(|t| t.to_chrono()),
        }
    }
}

impl IntoIndexes for EventTriggerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "company_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("company_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for EventTriggerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
