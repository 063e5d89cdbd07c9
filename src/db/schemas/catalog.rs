//! Inspection and questionnaire catalog entries
//!
//! The chaining service only reads their display names.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

pub const INSPECTION_COLLECTION: &str = "inspections";
pub const QUESTIONNAIRE_COLLECTION: &str = "questionnaires";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct InspectionDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    pub name: String,
}

impl IntoIndexes for InspectionDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}

impl MutMetadata for InspectionDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct QuestionnaireDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub company_id: String,

    pub title: String,
}

impl IntoIndexes for QuestionnaireDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![]
    }
}

impl MutMetadata for QuestionnaireDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
