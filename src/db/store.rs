//! MongoDB-backed store
//!
//! Ids cross the trait boundary as ObjectId hex strings. A string that does
//! not parse as an ObjectId cannot name a stored document, so lookups by it
//! report "not found" instead of failing.

use bson::{doc, oid::ObjectId, DateTime, Document};
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    ChainingDoc, ChainingItemDoc, DeviceDoc, EventTriggerDoc, GroupDoc, InspectionDoc,
    InspectionRecordDoc, Metadata, QuestionnaireAnswerDoc, QuestionnaireDoc, CHAINING_COLLECTION,
    DEVICE_COLLECTION, EVENT_TRIGGER_COLLECTION, GROUP_COLLECTION, INSPECTION_COLLECTION,
    INSPECTION_RECORD_COLLECTION, QUESTIONNAIRE_ANSWER_COLLECTION, QUESTIONNAIRE_COLLECTION,
};
use crate::store::model::non_empty;
use crate::store::{
    ChainingDefinition, ChainingFilter, ChainingInput, ChainingItemInput, ChainingStore,
    CompanyScope, EventFilter, EventInput, EventTrigger, GroupChainings, ItemKind,
    ManagementStore,
};
use crate::types::{AssuranceError, Result};

fn parse_oid(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Restrict a filter to one company when scoped
fn scoped(mut filter: Document, scope: CompanyScope<'_>) -> Document {
    if let Some(company_id) = scope {
        filter.insert("company_id", company_id);
    }
    filter
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match
fn ilike(value: &str) -> Document {
    doc! { "$regex": escape_regex(value), "$options": "i" }
}

/// Build embedded items, keeping ids of items that already exist
fn item_docs(
    existing: &[ChainingItemDoc],
    input: &[ChainingItemInput],
) -> Result<Vec<ChainingItemDoc>> {
    input
        .iter()
        .map(|item| {
            let item_id = ObjectId::parse_str(&item.item_id)?;
            let _id = item
                .id
                .as_deref()
                .and_then(parse_oid)
                .filter(|id| existing.iter().any(|e| e._id == *id))
                .unwrap_or_else(ObjectId::new);
            Ok(ChainingItemDoc {
                _id,
                item_type: item.item_type,
                item_id,
                sequence: item.sequence,
            })
        })
        .collect()
}

fn event_oid(id: &Option<String>) -> Result<Option<ObjectId>> {
    match non_empty(id) {
        Some(id) => Ok(Some(ObjectId::parse_str(id)?)),
        None => Ok(None),
    }
}

/// Store over the assurance MongoDB database
#[derive(Clone)]
pub struct MongoStore {
    chainings: MongoCollection<ChainingDoc>,
    events: MongoCollection<EventTriggerDoc>,
    groups: MongoCollection<GroupDoc>,
    devices: MongoCollection<DeviceDoc>,
    inspections: MongoCollection<InspectionDoc>,
    questionnaires: MongoCollection<QuestionnaireDoc>,
    inspection_records: MongoCollection<InspectionRecordDoc>,
    questionnaire_answers: MongoCollection<QuestionnaireAnswerDoc>,
}

impl MongoStore {
    /// Open every collection, applying schema indexes
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            chainings: client.collection(CHAINING_COLLECTION).await?,
            events: client.collection(EVENT_TRIGGER_COLLECTION).await?,
            groups: client.collection(GROUP_COLLECTION).await?,
            devices: client.collection(DEVICE_COLLECTION).await?,
            inspections: client.collection(INSPECTION_COLLECTION).await?,
            questionnaires: client.collection(QUESTIONNAIRE_COLLECTION).await?,
            inspection_records: client.collection(INSPECTION_RECORD_COLLECTION).await?,
            questionnaire_answers: client.collection(QUESTIONNAIRE_ANSWER_COLLECTION).await?,
        })
    }

    /// Convert chaining documents, loading their linked events in one query
    async fn attach_events(&self, docs: Vec<ChainingDoc>) -> Result<Vec<ChainingDefinition>> {
        let mut event_ids: Vec<ObjectId> = docs.iter().filter_map(|d| d.event_trigger_id).collect();
        event_ids.sort();
        event_ids.dedup();

        let mut events: HashMap<ObjectId, EventTrigger> = HashMap::new();
        if !event_ids.is_empty() {
            for event in self
                .events
                .find_many(doc! { "_id": { "$in": event_ids } })
                .await?
            {
                if let Some(id) = event._id {
                    events.insert(id, event.into());
                }
            }
        }

        Ok(docs
            .into_iter()
            .map(|doc| {
                let event = doc.event_trigger_id.and_then(|id| events.get(&id).cloned());
                doc.into_definition(event)
            })
            .collect())
    }

    async fn find_event(&self, id: &str, scope: CompanyScope<'_>) -> Result<Option<EventTrigger>> {
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        Ok(self
            .events
            .find_one(scoped(doc! { "_id": oid }, scope))
            .await?
            .map(Into::into))
    }
}

#[async_trait::async_trait]
impl ChainingStore for MongoStore {
    async fn list_active_chainings_for_device(
        &self,
        device_external_id: &str,
    ) -> Result<Vec<ChainingDefinition>> {
        let device_ids: Vec<ObjectId> = self
            .devices
            .find_many(doc! { "device_id": device_external_id })
            .await?
            .into_iter()
            .filter_map(|d| d._id)
            .collect();
        if device_ids.is_empty() {
            debug!(device = device_external_id, "Device not registered");
            return Ok(Vec::new());
        }

        let groups = self
            .groups
            .find_many(doc! { "device_ids": { "$in": device_ids } })
            .await?;

        let mut chaining_ids: Vec<ObjectId> = Vec::new();
        for id in groups.into_iter().flat_map(|g| g.chaining_ids) {
            if !chaining_ids.contains(&id) {
                chaining_ids.push(id);
            }
        }
        if chaining_ids.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self
            .chainings
            .find_many(doc! { "_id": { "$in": chaining_ids }, "is_active": true })
            .await?;
        self.attach_events(docs).await
    }

    async fn find_completion(
        &self,
        kind: ItemKind,
        item_id: &str,
        chaining_id: &str,
        user_id: &str,
        utc_start: chrono::DateTime<Utc>,
        utc_end: chrono::DateTime<Utc>,
    ) -> Result<Option<chrono::DateTime<Utc>>> {
        let (Some(item), Some(chaining)) = (parse_oid(item_id), parse_oid(chaining_id)) else {
            return Ok(None);
        };
        let range = doc! {
            "$gte": DateTime::from_chrono(utc_start),
            "$lt": DateTime::from_chrono(utc_end),
        };
        let latest = doc! { "completed_at": -1 };

        let completed_at = match kind {
            ItemKind::Inspection => self
                .inspection_records
                .find_first(
                    doc! {
                        "id_inspection": item,
                        "chaining_id": chaining,
                        "created_by": user_id,
                        "completed_at": range,
                    },
                    latest,
                )
                .await?
                .map(|r| r.completed_at),
            ItemKind::Questionnaire => self
                .questionnaire_answers
                .find_first(
                    doc! {
                        "questionnaire_id": item,
                        "chaining_id": chaining,
                        "created_by": user_id,
                        "completed_at": range,
                    },
                    latest,
                )
                .await?
                .map(|r| r.completed_at),
        };

        Ok(completed_at.map(|t| t.to_chrono()))
    }

    async fn item_display_name(&self, kind: ItemKind, item_id: &str) -> Result<String> {
        let Some(oid) = parse_oid(item_id) else {
            return Ok(String::new());
        };
        let filter = doc! { "_id": oid };

        let name = match kind {
            ItemKind::Inspection => self.inspections.find_one(filter).await?.map(|d| d.name),
            ItemKind::Questionnaire => self.questionnaires.find_one(filter).await?.map(|d| d.title),
        };
        Ok(name.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ManagementStore for MongoStore {
    async fn create_chaining(
        &self,
        input: ChainingInput,
        company_id: &str,
        actor: &str,
    ) -> Result<ChainingDefinition> {
        let doc = ChainingDoc {
            _id: None,
            metadata: Metadata::new(),
            company_id: company_id.to_string(),
            event_trigger_id: event_oid(&input.event_trigger_id)?,
            details: item_docs(&[], &input.details)?,
            name_chaining: input.name_chaining,
            trigger_datetime: input.trigger_datetime.map(DateTime::from_chrono),
            frequency_value: input.frequency_value,
            frequency_unit: input.frequency_unit,
            is_active: input.is_active,
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
        };

        let id = self.chainings.insert_one(doc).await?;
        self.get_chaining(&id.to_hex(), None)
            .await?
            .ok_or_else(|| AssuranceError::Internal("Created chaining not found".into()))
    }

    async fn get_chaining(
        &self,
        id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<ChainingDefinition>> {
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        let Some(doc) = self
            .chainings
            .find_one(scoped(doc! { "_id": oid }, scope))
            .await?
        else {
            return Ok(None);
        };

        let Some(mut def) = self.attach_events(vec![doc]).await?.pop() else {
            return Ok(None);
        };
        for item in &mut def.details {
            let name = self.item_display_name(item.item_type, &item.item_id).await?;
            item.item_name = Some(name).filter(|n| !n.is_empty());
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
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        let filter = scoped(doc! { "_id": oid }, scope);
        let Some(existing) = self.chainings.find_one(filter.clone()).await? else {
            return Ok(None);
        };

        let details = item_docs(&existing.details, &input.details)?;
        let details = bson::to_bson(&details)
            .map_err(|e| AssuranceError::Internal(format!("Failed to encode items: {}", e)))?;

        self.chainings
            .update_one(
                filter,
                doc! {
                    "name_chaining": input.name_chaining,
                    "trigger_datetime": input.trigger_datetime.map(DateTime::from_chrono),
                    "frequency_value": input.frequency_value.map(i64::from),
                    "frequency_unit": input.frequency_unit,
                    "event_trigger_id": event_oid(&input.event_trigger_id)?,
                    "is_active": input.is_active,
                    "details": details,
                    "updated_by": actor,
                },
            )
            .await?;

        self.get_chaining(id, scope).await
    }

    async fn delete_chaining(
        &self,
        id: &str,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<bool> {
        let Some(oid) = parse_oid(id) else {
            return Ok(false);
        };
        self.chainings
            .soft_delete(scoped(doc! { "_id": oid }, scope), actor)
            .await
    }

    async fn filter_chainings(
        &self,
        filter: &ChainingFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<ChainingDefinition>> {
        let mut query = scoped(doc! {}, scope);
        if let Some(v) = non_empty(&filter.created_by) {
            query.insert("created_by", v);
        }
        if let Some(v) = non_empty(&filter.updated_by) {
            query.insert("updated_by", v);
        }
        if let Some(v) = non_empty(&filter.name_chaining) {
            query.insert("name_chaining", ilike(v));
        }

        let docs = self.chainings.find_sorted(query, doc! { "_id": -1 }).await?;
        self.attach_events(docs).await
    }

    async fn create_event(
        &self,
        input: EventInput,
        company_id: &str,
        actor: &str,
    ) -> Result<EventTrigger> {
        let doc = EventTriggerDoc {
            _id: None,
            metadata: Metadata::new(),
            company_id: company_id.to_string(),
            event_name: input.event_name,
            trigger: input.trigger,
            description: input.description,
            is_active: input.is_active,
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
        };

        let id = self.events.insert_one(doc).await?;
        self.find_event(&id.to_hex(), None)
            .await?
            .ok_or_else(|| AssuranceError::Internal("Created event not found".into()))
    }

    async fn update_event(
        &self,
        id: &str,
        input: EventInput,
        scope: CompanyScope<'_>,
        actor: &str,
    ) -> Result<Option<EventTrigger>> {
        let Some(oid) = parse_oid(id) else {
            return Ok(None);
        };
        let result = self
            .events
            .update_one(
                scoped(doc! { "_id": oid }, scope),
                doc! {
                    "event_name": input.event_name,
                    "description": input.description,
                    "trigger": input.trigger,
                    "is_active": input.is_active,
                    "updated_by": actor,
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Ok(None);
        }
        self.find_event(id, scope).await
    }

    async fn delete_event(&self, id: &str, scope: CompanyScope<'_>, actor: &str) -> Result<bool> {
        let Some(oid) = parse_oid(id) else {
            return Ok(false);
        };
        self.events
            .soft_delete(scoped(doc! { "_id": oid }, scope), actor)
            .await
    }

    async fn filter_events(
        &self,
        filter: &EventFilter,
        scope: CompanyScope<'_>,
    ) -> Result<Vec<EventTrigger>> {
        let mut query = scoped(doc! {}, scope);
        if let Some(v) = non_empty(&filter.created_by) {
            query.insert("created_by", v);
        }
        if let Some(v) = non_empty(&filter.updated_by) {
            query.insert("updated_by", v);
        }
        if let Some(v) = non_empty(&filter.event_name) {
            query.insert("event_name", ilike(v));
        }
        if let Some(v) = non_empty(&filter.id) {
            match parse_oid(v) {
                Some(oid) => {
                    query.insert("_id", oid);
                }
                None => return Ok(Vec::new()),
            }
        }

        Ok(self
            .events
            .find_sorted(query, doc! { "_id": -1 })
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn group_chainings(
        &self,
        group_id: &str,
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>> {
        let Some(oid) = parse_oid(group_id) else {
            return Ok(None);
        };
        let Some(group) = self.groups.find_one(scoped(doc! { "_id": oid }, scope)).await? else {
            return Ok(None);
        };

        let live: Vec<ObjectId> = self
            .chainings
            .find_many(doc! {
                "_id": { "$in": group.chaining_ids.clone() },
                "company_id": group.company_id.as_str(),
            })
            .await?
            .into_iter()
            .filter_map(|c| c._id)
            .collect();

        Ok(Some(GroupChainings {
            group_id: group_id.to_string(),
            chaining_ids: group
                .chaining_ids
                .iter()
                .filter(|id| live.contains(id))
                .map(|id| id.to_hex())
                .collect(),
            company_id: group.company_id,
        }))
    }

    async fn assign_group_chainings(
        &self,
        group_id: &str,
        chaining_ids: &[String],
        scope: CompanyScope<'_>,
    ) -> Result<Option<GroupChainings>> {
        let Some(oid) = parse_oid(group_id) else {
            return Ok(None);
        };
        let filter = scoped(doc! { "_id": oid }, scope);
        let Some(group) = self.groups.find_one(filter.clone()).await? else {
            return Ok(None);
        };

        let mut requested: Vec<ObjectId> = Vec::new();
        for id in chaining_ids.iter().filter_map(|id| parse_oid(id)) {
            if !requested.contains(&id) {
                requested.push(id);
            }
        }

        let live: Vec<ObjectId> = self
            .chainings
            .find_many(doc! {
                "_id": { "$in": requested.clone() },
                "company_id": group.company_id.as_str(),
            })
            .await?
            .into_iter()
            .filter_map(|c| c._id)
            .collect();
        let assigned: Vec<ObjectId> = requested.into_iter().filter(|id| live.contains(id)).collect();

        self.groups
            .update_one(filter, doc! { "chaining_ids": assigned.clone() })
            .await?;

        Ok(Some(GroupChainings {
            group_id: group_id.to_string(),
            company_id: group.company_id,
            chaining_ids: assigned.iter().map(|id| id.to_hex()).collect(),
        }))
    }

    async fn list_company_chainings(&self, company_id: &str) -> Result<Vec<ChainingDefinition>> {
        let docs = self
            .chainings
            .find_sorted(
                doc! { "company_id": company_id, "is_active": true },
                doc! { "_id": -1 },
            )
            .await?;
        self.attach_events(docs).await
    }
}
