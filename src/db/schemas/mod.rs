//! Database schemas for the assurance service
//!
//! Defines MongoDB document structures for chainings, event triggers,
//! groups, devices, the item catalog and completion records.

mod catalog;
mod chaining;
mod completion;
mod event_trigger;
mod group;
mod metadata;

pub use catalog::{InspectionDoc, QuestionnaireDoc, INSPECTION_COLLECTION, QUESTIONNAIRE_COLLECTION};
pub use chaining::{ChainingDoc, ChainingItemDoc, CHAINING_COLLECTION};
pub use completion::{
    InspectionRecordDoc, QuestionnaireAnswerDoc, INSPECTION_RECORD_COLLECTION,
    QUESTIONNAIRE_ANSWER_COLLECTION,
};
pub use event_trigger::{EventTriggerDoc, EVENT_TRIGGER_COLLECTION};
pub use group::{DeviceDoc, GroupDoc, DEVICE_COLLECTION, GROUP_COLLECTION};
pub use metadata::Metadata;
