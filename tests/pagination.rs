mod common;

use common::{harness, harness_with};
use entity_access::domain::{AField, BField, A, B};
use entity_access::service::OversizePolicy;
use entity_access::entity::Key;
use entity_access::store::EntityStream;
use entity_access::{
    Criteria, EntityService, EntityStore, MemoryEntityStore, PageLimits, PageRequest, ScanQuery, Sort, StoreError,
    ValidationKind,
};
use futures::TryStreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

async fn seed_bs(h: &common::Harness, linked: usize, orphaned: usize) -> i64 {
    let parent = h.services.a.create(A::new("parent")).await.unwrap().id.unwrap();
    for _ in 0..linked {
        h.services.b.create(B::new(Some(parent))).await.unwrap();
    }
    for _ in 0..orphaned {
        h.services.b.create(B::new(None)).await.unwrap();
    }
    parent
}

#[tokio::test]
async fn count_matches_full_scan_length() {
    let h = harness();
    let parent = seed_bs(&h, 7, 5).await;
    for criteria in [
        Criteria::all(),
        Criteria::all().equals(BField::AId, parent),
        Criteria::all().is_null(BField::AId),
        Criteria::all().is_not_null(BField::AId),
        Criteria::all().equals(BField::AId, parent + 100),
    ] {
        let counted = h.b.count_matching(&criteria).await.unwrap();
        let scanned: Vec<B> = h
            .b
            .scan(ScanQuery::filtered(criteria.clone()))
            .try_collect()
            .await
            .unwrap();
        assert_eq!(counted, scanned.len() as u64, "criteria {:?}", criteria);
    }
}

#[tokio::test]
async fn consecutive_pages_reconstruct_the_set_once() {
    let h = harness();
    seed_bs(&h, 9, 8).await;
    let total = h.services.b.count_all().await.unwrap();

    for limit in [1_u64, 3, 4, 17, 50] {
        let mut seen = BTreeSet::new();
        let mut offset = 0;
        loop {
            let request = PageRequest::new(offset, limit).sorted_by(Sort::desc(BField::AId));
            let page = h.services.b.list(Criteria::all(), request).await.unwrap();
            assert_eq!(page.total, total);
            assert!(page.items.len() as u64 <= limit);
            for b in &page.items {
                assert!(seen.insert(b.id.unwrap()), "key {:?} returned twice", b.id);
            }
            match page.links().next {
                Some(next) => offset = next.offset,
                None => break,
            }
        }
        assert_eq!(seen.len() as u64, total, "limit {}", limit);
    }
}

#[tokio::test]
async fn filtered_pages_keep_the_filtered_total() {
    let h = harness();
    seed_bs(&h, 3, 6).await;
    let page = h
        .services
        .b
        .list(Criteria::all().is_null(BField::AId), PageRequest::new(0, 4))
        .await
        .unwrap();
    assert_eq!(page.total, 6);
    assert_eq!(page.items.len(), 4);
    assert!(page.items.iter().all(|b| b.a_id.is_none()));
}

#[tokio::test]
async fn offset_past_the_end_is_empty_with_total() {
    let h = harness();
    seed_bs(&h, 2, 2).await;
    let page = h
        .services
        .b
        .list(Criteria::all(), PageRequest::new(100, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 4);
}

#[tokio::test]
async fn zero_limit_still_counts() {
    let h = harness();
    seed_bs(&h, 2, 1).await;
    let page = h.services.b.list(Criteria::all(), PageRequest::new(0, 0)).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn oversize_limit_follows_policy() {
    let clamp = harness_with(PageLimits {
        default_limit: 2,
        max_limit: 3,
        oversize: OversizePolicy::Clamp,
    });
    seed_bs(&clamp, 5, 0).await;
    let page = clamp.services.b.list(Criteria::all(), PageRequest::new(0, 500)).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.limit, 3);
    let page = clamp.services.b.list(Criteria::all(), PageRequest::default()).await.unwrap();
    assert_eq!(page.items.len(), 2);

    let reject = harness_with(PageLimits {
        default_limit: 2,
        max_limit: 3,
        oversize: OversizePolicy::Reject,
    });
    let err = reject
        .services
        .b
        .list(Criteria::all(), PageRequest::new(0, 4))
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationKind::LimitTooLarge));
}

#[tokio::test]
async fn sort_by_text_then_key() {
    let h = harness();
    for name in ["b", "a", "c", "a"] {
        h.services.a.create(A::new(name)).await.unwrap();
    }
    let page = h
        .services
        .a
        .list(Criteria::all(), PageRequest::new(0, 10).sorted_by(Sort::asc(AField::Test)))
        .await
        .unwrap();
    let order: Vec<(String, i64)> = page.items.iter().map(|a| (a.test.clone(), a.id.unwrap())).collect();
    assert_eq!(
        order,
        vec![
            ("a".to_string(), 2),
            ("a".to_string(), 4),
            ("b".to_string(), 1),
            ("c".to_string(), 3)
        ]
    );
}

#[tokio::test]
async fn scan_can_be_abandoned_early() {
    let h = harness();
    seed_bs(&h, 10, 0).await;
    let first: Option<B> = h
        .b
        .scan(ScanQuery::filtered(Criteria::all()))
        .try_next()
        .await
        .unwrap();
    assert_eq!(first.and_then(|b| b.id), Some(1));
    assert!(matches!(
        h.services.b.list(Criteria::all(), PageRequest::new(0, 1)).await,
        Ok(page) if page.total == 10
    ));
}

/// Count only resolves once a scan has been opened.
struct ScanGatedStore {
    inner: MemoryEntityStore<B>,
    scan_opened: Arc<Notify>,
}

#[async_trait::async_trait]
impl EntityStore<B> for ScanGatedStore {
    async fn get(&self, key: Key) -> Result<Option<B>, StoreError> {
        self.inner.get(key).await
    }

    async fn exists_by_key(&self, key: Key) -> Result<bool, StoreError> {
        self.inner.exists_by_key(key).await
    }

    async fn save(&self, entity: B) -> Result<B, StoreError> {
        self.inner.save(entity).await
    }

    async fn delete_by_key(&self, key: Key) -> Result<(), StoreError> {
        self.inner.delete_by_key(key).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.inner.count().await
    }

    async fn count_matching(&self, criteria: &Criteria<BField>) -> Result<u64, StoreError> {
        self.scan_opened.notified().await;
        self.inner.count_matching(criteria).await
    }

    fn scan(&self, query: ScanQuery<BField>) -> EntityStream<B> {
        self.scan_opened.notify_one();
        self.inner.scan(query)
    }
}

#[tokio::test]
async fn count_and_scan_run_together() {
    let store = ScanGatedStore {
        inner: MemoryEntityStore::new(),
        scan_opened: Arc::new(Notify::new()),
    };
    store.inner.save(B::new(None)).await.unwrap();
    let svc = EntityService::<B>::new(Arc::new(store), PageLimits::default());

    let page = tokio::time::timeout(
        Duration::from_secs(5),
        svc.list(Criteria::all(), PageRequest::new(0, 10)),
    )
    .await
    .expect("count waited for a scan that was never opened")
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items.len(), 1);
}
