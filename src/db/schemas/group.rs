//! Device group document schema
//!
//! Only the parts the chaining service reads and writes: member devices and
//! assigned chainings.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const GROUP_COLLECTION: &str = "groups";
pub const DEVICE_COLLECTION: &str = "devices";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct GroupDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    #[serde(default)]
    pub name: String,

    /// Member device document ids
    #[serde(default)]
    pub device_ids: Vec<ObjectId>,

    #[serde(default)]
    pub chaining_ids: Vec<ObjectId>,
}

impl IntoIndexes for GroupDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "device_ids": 1 },
                Some(
                    IndexOptions::builder()
                        .name("device_ids_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "company_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("company_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for GroupDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Field device registered to a company
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DeviceDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    /// External identifier reported by the device
    pub device_id: String,

    #[serde(default)]
    pub name: String,
}

impl IntoIndexes for DeviceDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "device_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("device_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for DeviceDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
