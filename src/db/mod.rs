//! MongoDB persistence
//!
//! Collections:
//! - chainings (items embedded), event_triggers
//! - groups, devices
//! - inspections, questionnaires (display names)
//! - trx_inspections, questionnaire_answers (completion records)

pub mod mongo;
pub mod schemas;
pub mod store;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
pub use store::MongoStore;
