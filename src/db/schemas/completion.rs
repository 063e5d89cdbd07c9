//! Completion records written by the inspection and questionnaire flows
//!
//! Read-only here. `created_by` holds the submitting username.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const INSPECTION_RECORD_COLLECTION: &str = "trx_inspections";
pub const QUESTIONNAIRE_ANSWER_COLLECTION: &str = "questionnaire_answers";

/// Submitted inspection
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InspectionRecordDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub id_inspection: ObjectId,

    pub chaining_id: ObjectId,

    pub created_by: String,

    pub completed_at: DateTime,
}

impl IntoIndexes for InspectionRecordDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "id_inspection": 1, "chaining_id": 1, "created_by": 1, "completed_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("completion_lookup_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for InspectionRecordDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// Submitted questionnaire answer set
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QuestionnaireAnswerDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub questionnaire_id: ObjectId,

    pub chaining_id: ObjectId,

    pub created_by: String,

    pub completed_at: DateTime,
}

impl IntoIndexes for QuestionnaireAnswerDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "questionnaire_id": 1, "chaining_id": 1, "created_by": 1, "completed_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("completion_lookup_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for QuestionnaireAnswerDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
