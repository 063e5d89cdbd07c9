//! End-to-end outstanding-work evaluation against the in-memory store

use std::sync::Arc;

use assurance::logging::FallbackMetrics;
use assurance::schedule::{ActiveChaining, ChainingResolver, Outcome};
use assurance::store::{
    ChainingInput, ChainingItemInput, InMemoryStore, ItemKind, ManagementStore,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio_test::{assert_err, assert_ok};

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

struct Site {
    store: InMemoryStore,
    group: String,
    metrics: Arc<FallbackMetrics>,
}

impl Site {
    async fn new() -> Self {
        let store = InMemoryStore::new();
        let device = store.add_device("TAB-01").await;
        let group = store.add_group("acme", &[device]).await;
        Self {
            store,
            group,
            metrics: Arc::new(FallbackMetrics::new()),
        }
    }

    async fn schedule(&self, input: ChainingInput) -> String {
        let def = self.store.create_chaining(input, "acme", "admin").await.unwrap();
        let mut ids = self
            .store
            .group_chainings(&self.group, None)
            .await
            .unwrap()
            .unwrap()
            .chaining_ids;
        ids.push(def.id.clone());
        self.store
            .assign_group_chainings(&self.group, &ids, None)
            .await
            .unwrap();
        def.id
    }

    async fn resolve(&self, tz: Tz, now: &str) -> Vec<ActiveChaining> {
        let resolver = ChainingResolver::new(Arc::new(self.store.clone()), self.metrics.clone());
        match resolver
            .resolve_outstanding_at("TAB-01", "alice", tz, utc(now))
            .await
            .unwrap()
        {
            Outcome::Outstanding(list) => list,
            Outcome::NoneOutstanding => Vec::new(),
        }
    }
}

fn chaining(anchor: &str, value: Option<u32>, unit: Option<&str>, items: &[&str]) -> ChainingInput {
    ChainingInput {
        name_chaining: "Morning round".into(),
        trigger_datetime: Some(utc(anchor)),
        frequency_value: value,
        frequency_unit: unit.map(str::to_string),
        event_trigger_id: None,
        is_active: true,
        details: items
            .iter()
            .enumerate()
            .map(|(i, item_id)| ChainingItemInput {
                id: None,
                item_type: ItemKind::Inspection,
                item_id: item_id.to_string(),
                sequence: i as u32 + 1,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_daily_window_reported_in_utc() {
    let site = Site::new().await;
    site.schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;

    let list = site.resolve(Tz::UTC, "2024-01-03T05:00:00Z").await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].trigger_time_utc, utc("2024-01-03T00:00:00Z"));
    assert_eq!(list[0].window_end_local, utc("2024-01-04T00:00:00Z").fixed_offset());
    assert_eq!(list[0].frequency_unit, "day");
    assert_eq!(list[0].frequency_value, 1);
}

#[tokio::test]
async fn test_one_time_chaining_stays_open() {
    let site = Site::new().await;
    site.schedule(chaining("2024-06-01T10:00:00Z", Some(0), Some(""), &["i1"]))
        .await;

    for now in ["2024-06-01T10:00:00Z", "2025-03-15T08:00:00Z", "2031-01-01T00:00:00Z"] {
        let list = site.resolve(Tz::UTC, now).await;
        assert_eq!(list.len(), 1, "at {now}");
        assert_eq!(list[0].trigger_time_utc, utc("2024-06-01T10:00:00Z"));
        assert_eq!(list[0].window_end_local, utc("9999-12-31T23:59:59Z").fixed_offset());
    }
}

#[tokio::test]
async fn test_one_time_completion_satisfies_forever() {
    let site = Site::new().await;
    let id = site
        .schedule(chaining("2024-06-01T10:00:00Z", None, None, &["i1"]))
        .await;
    site.store
        .record_completion(ItemKind::Inspection, "i1", &id, "alice", utc("2024-06-02T00:00:00Z"))
        .await;

    assert!(site.resolve(Tz::UTC, "2027-01-01T00:00:00Z").await.is_empty());
}

#[tokio::test]
async fn test_unit_synonyms_match_canonical_unit() {
    let synonym = Site::new().await;
    synonym
        .schedule(chaining("2024-01-01T00:00:00Z", Some(2), Some("Hourly"), &["i1"]))
        .await;
    let canonical = Site::new().await;
    canonical
        .schedule(chaining("2024-01-01T00:00:00Z", Some(2), Some("hour"), &["i1"]))
        .await;

    for now in ["2024-01-01T00:30:00Z", "2024-01-01T03:59:59Z", "2024-01-05T17:10:00Z"] {
        let a = synonym.resolve(Tz::UTC, now).await;
        let b = canonical.resolve(Tz::UTC, now).await;
        assert_eq!(a[0].trigger_time_utc, b[0].trigger_time_utc);
        assert_eq!(a[0].window_end_local, b[0].window_end_local);
    }
    assert_eq!(synonym.metrics.snapshot().frequency_unit, 0);
}

#[tokio::test]
async fn test_unknown_unit_falls_back_to_hours() {
    let fortnight = Site::new().await;
    fortnight
        .schedule(chaining("2024-01-01T00:00:00Z", Some(3), Some("fortnight"), &["i1"]))
        .await;
    let hour = Site::new().await;
    hour.schedule(chaining("2024-01-01T00:00:00Z", Some(3), Some("hour"), &["i1"]))
        .await;

    let a = fortnight.resolve(Tz::UTC, "2024-01-01T07:00:00Z").await;
    let b = hour.resolve(Tz::UTC, "2024-01-01T07:00:00Z").await;
    assert_eq!(a[0].trigger_time_utc, utc("2024-01-01T06:00:00Z"));
    assert_eq!(a[0].trigger_time_utc, b[0].trigger_time_utc);
    assert_eq!(a[0].window_end_local, b[0].window_end_local);
    assert_eq!(fortnight.metrics.snapshot().frequency_unit, 1);
}

#[tokio::test]
async fn test_items_drop_out_as_completions_arrive() {
    let site = Site::new().await;
    let id = site
        .schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1", "i2", "i3"]))
        .await;

    for item in ["i1", "i2"] {
        site.store
            .record_completion(ItemKind::Inspection, item, &id, "alice", utc("2024-01-03T02:00:00Z"))
            .await;
    }
    let list = site.resolve(Tz::UTC, "2024-01-03T05:00:00Z").await;
    let remaining: Vec<_> = list[0].active_items.iter().map(|i| i.sequence).collect();
    assert_eq!(remaining, vec![3]);

    site.store
        .record_completion(ItemKind::Inspection, "i3", &id, "alice", utc("2024-01-03T04:00:00Z"))
        .await;
    assert!(site.resolve(Tz::UTC, "2024-01-03T05:00:00Z").await.is_empty());
}

#[tokio::test]
async fn test_completion_window_is_half_open() {
    let site = Site::new().await;
    let id = site
        .schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;

    // Exactly at the next window start: counts for the next cycle only
    site.store
        .record_completion(ItemKind::Inspection, "i1", &id, "alice", utc("2024-01-04T00:00:00Z"))
        .await;
    assert_eq!(site.resolve(Tz::UTC, "2024-01-03T23:00:00Z").await.len(), 1);
    assert!(site.resolve(Tz::UTC, "2024-01-04T01:00:00Z").await.is_empty());
}

#[tokio::test]
async fn test_other_users_completions_ignored() {
    let site = Site::new().await;
    let id = site
        .schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;
    site.store
        .record_completion(ItemKind::Inspection, "i1", &id, "bob", utc("2024-01-03T01:00:00Z"))
        .await;

    assert_eq!(site.resolve(Tz::UTC, "2024-01-03T05:00:00Z").await.len(), 1);
}

#[tokio::test]
async fn test_caller_timezone_shifts_local_fields_only() {
    let site = Site::new().await;
    site.schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;

    let list = site.resolve(Tz::Asia__Jakarta, "2024-01-03T05:00:00Z").await;
    assert_eq!(list[0].timezone, "Asia/Jakarta");
    assert_eq!(list[0].trigger_time_utc, utc("2024-01-03T00:00:00Z"));
    assert_eq!(list[0].trigger_time_local.to_rfc3339(), "2024-01-03T07:00:00+07:00");
}

#[tokio::test]
async fn test_unknown_device_has_nothing_outstanding() {
    let site = Site::new().await;
    site.schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;

    let resolver = ChainingResolver::new(Arc::new(site.store.clone()), site.metrics.clone());
    let outcome = assert_ok!(
        resolver
            .resolve_outstanding_at("TAB-99", "alice", Tz::UTC, utc("2024-01-03T05:00:00Z"))
            .await
    );
    assert_eq!(outcome, Outcome::NoneOutstanding);

    assert_err!(
        resolver
            .resolve_outstanding_at("TAB-01", "  ", Tz::UTC, utc("2024-01-03T05:00:00Z"))
            .await
    );
}

#[tokio::test]
async fn test_removed_group_hides_its_chainings() {
    let site = Site::new().await;
    site.schedule(chaining("2024-01-01T00:00:00Z", Some(1), Some("day"), &["i1"]))
        .await;
    site.store.remove_group(&site.group).await;

    assert!(site.resolve(Tz::UTC, "2024-01-03T05:00:00Z").await.is_empty());
}
