//! The ranked retrieval engine.
//!
//! A search asks the index for one page of matching ids, fetches those rows
//! from the store, and reorders them by the index's rank. The index for a
//! kind is built from the store on first use; concurrent first callers share
//! a single build.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use dialogs_core::{
  entity::{Entity, EntityKind},
  page::{Page, PageRequest, Pagination},
  search::SearchIndex,
  store::CorpusStore,
};
use tokio::sync::OnceCell;

use crate::{Error, Result};

/// Bounds on calls to the external index.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
  /// Any single index call: existence check, create, bulk batch, query.
  pub request_timeout: Duration,
  /// Server-side wait for a freshly built index to become queryable.
  pub ready_timeout:   Duration,
  /// Documents per bulk request.
  pub bulk_batch_size: usize,
}

impl Default for RetrievalConfig {
  fn default() -> Self {
    Self {
      request_timeout: Duration::from_secs(5),
      ready_timeout:   Duration::from_secs(30),
      bulk_batch_size: 500,
    }
  }
}

impl RetrievalConfig {
  /// Client-side bound on the whole readiness step: a refresh call, the
  /// server-side wait and its response, plus one request of slack. The
  /// server's own timeout answer always arrives first.
  pub fn readiness_bound(&self) -> Duration {
    self.ready_timeout + self.request_timeout * 3
  }
}

pub struct Retriever<S, I> {
  store:  Arc<S>,
  index:  Option<Arc<I>>,
  config: RetrievalConfig,
  ready:  HashMap<EntityKind, OnceCell<()>>,
}

impl<S, I> Retriever<S, I>
where
  S: CorpusStore,
  I: SearchIndex,
{
  /// `index: None` means search is disabled; every query then returns an
  /// empty page.
  pub fn new(store: Arc<S>, index: Option<Arc<I>>, config: RetrievalConfig) -> Self {
    let ready = EntityKind::ALL.iter().map(|&k| (k, OnceCell::new())).collect();
    Self { store, index, config, ready }
  }

  pub fn is_enabled(&self) -> bool { self.index.is_some() }

  // ── Index lifecycle ───────────────────────────────────────────────────

  /// Make sure the index for `kind` exists and is queryable, building it
  /// from the store if it is missing.
  ///
  /// Only one build runs at a time per kind. A failed build is returned to
  /// every waiting caller and retried on the next call.
  pub async fn ensure_index(&self, kind: EntityKind) -> Result<()> {
    let index = self.index.as_deref().ok_or(Error::Disabled)?;
    let Some(cell) = self.ready.get(&kind) else {
      return Err(Error::Disabled);
    };
    cell
      .get_or_try_init(|| self.build_if_absent(index, kind))
      .await?;
    Ok(())
  }

  async fn build_if_absent(&self, index: &I, kind: EntityKind) -> Result<()> {
    let exists = self
      .timed("index lookup", index.exists(kind))
      .await
      .map_err(|e| Error::Unavailable(Box::new(e)))?;
    if exists {
      tracing::debug!(%kind, "index already present");
      return Ok(());
    }
    self.build(index, kind).await
  }

  /// Drop the index for `kind` and build it again from the store.
  pub async fn rebuild(&self, kind: EntityKind) -> Result<()> {
    let index = self.index.as_deref().ok_or(Error::Disabled)?;
    self.timed("index delete", index.delete(kind)).await?;
    self.build(index, kind).await?;
    if let Some(cell) = self.ready.get(&kind) {
      // Already set when an earlier search built the index; nothing to do.
      let _ = cell.set(());
    }
    Ok(())
  }

  async fn build(&self, index: &I, kind: EntityKind) -> Result<()> {
    tracing::info!(%kind, "building search index");
    self.timed("index create", index.create(kind)).await?;

    let docs = self
      .store
      .documents(kind)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    let total = docs.len();

    let batch_size = self.config.bulk_batch_size.max(1);
    let mut docs = docs.into_iter().peekable();
    while docs.peek().is_some() {
      let batch: Vec<_> = docs.by_ref().take(batch_size).collect();
      self
        .timed("bulk load", index.add_documents(kind, batch))
        .await?;
    }

    match tokio::time::timeout(self.config.readiness_bound(), index.wait_ready(kind)).await {
      Ok(result) => result.map_err(|e| Error::Index(Box::new(e)))?,
      Err(_) => return Err(Error::Timeout { op: "index readiness" }),
    }
    tracing::info!(%kind, documents = total, "search index ready");
    Ok(())
  }

  async fn timed<T, E>(
    &self,
    op: &'static str,
    call: impl Future<Output = Result<T, E>>,
  ) -> Result<T>
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match tokio::time::timeout(self.config.request_timeout, call).await {
      Ok(result) => result.map_err(|e| Error::Index(Box::new(e))),
      Err(_) => Err(Error::Timeout { op }),
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────

  /// Run a free-text search over `kind` and return one ranked page.
  ///
  /// A disabled or unreachable index, a failed query, or a query timeout
  /// all yield an empty page. Failing to build a missing index is an error.
  pub async fn search(
    &self,
    kind: EntityKind,
    text: &str,
    request: PageRequest,
  ) -> Result<Page<Entity>> {
    let Some(index) = self.index.as_deref() else {
      tracing::debug!(%kind, "search disabled; returning an empty page");
      return Ok(Page::empty(request));
    };
    match self.ensure_index(kind).await {
      Ok(()) => {}
      Err(Error::Unavailable(e)) => {
        tracing::warn!(%kind, error = %e, "search index unreachable; returning an empty page");
        return Ok(Page::empty(request));
      }
      Err(e) => return Err(e),
    }

    let hits = match self
      .timed("query", index.query(kind, text, request.start, request.limit))
      .await
    {
      Ok(hits) => hits,
      Err(e) => {
        tracing::warn!(%kind, error = %e, "search degraded to an empty page");
        return Ok(Page::empty(request));
      }
    };
    if hits.is_empty() {
      return Ok(Page::empty(request));
    }

    let mut results = self
      .store
      .fetch_many(kind, hits.ids.clone())
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    rank(&mut results, &hits.ids);

    Ok(Page { results, meta: Pagination::compute(request, hits.total) })
  }
}

/// Reorder `results` to match the position of each key in `ranked_ids`.
/// Rows whose key the index did not return sort last.
fn rank(results: &mut [Entity], ranked_ids: &[String]) {
  let position: HashMap<&str, usize> = ranked_ids
    .iter()
    .enumerate()
    .map(|(i, id)| (id.as_str(), i))
    .collect();
  results.sort_by_cached_key(|e| {
    position
      .get(e.key().as_str())
      .copied()
      .unwrap_or(usize::MAX)
  });
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicBool, AtomicUsize, Ordering},
    },
  };

  use dialogs_core::search::{IndexDocument, SearchHits};
  use dialogs_corpus::Corpus;
  use dialogs_store_sqlite::{SqliteStore, ingest};

  use super::*;

  // ── Fake index ────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("fake index failure")]
  struct FakeError;

  #[derive(Default)]
  struct FakeIndex {
    docs:          Mutex<HashMap<EntityKind, Vec<IndexDocument>>>,
    /// Hits returned verbatim by every query, when set.
    scripted:      Option<SearchHits>,
    query_delay:   Option<Duration>,
    ready_delay:   Option<Duration>,
    fail_exists:   AtomicBool,
    fail_create:   AtomicBool,
    fail_ready:    AtomicBool,
    creates:       AtomicUsize,
    bulk_requests: AtomicUsize,
  }

  impl FakeIndex {
    fn scripted(ids: &[&str], total: usize) -> Self {
      Self {
        scripted: Some(SearchHits { ids: ids.iter().map(|s| s.to_string()).collect(), total }),
        ..Self::default()
      }
    }

    fn with_existing(kind: EntityKind) -> Self {
      let index = Self::default();
      index.docs.lock().unwrap().insert(kind, Vec::new());
      index
    }
  }

  impl SearchIndex for FakeIndex {
    type Error = FakeError;

    async fn exists(&self, kind: EntityKind) -> Result<bool, FakeError> {
      if self.fail_exists.load(Ordering::SeqCst) {
        return Err(FakeError);
      }
      Ok(self.docs.lock().unwrap().contains_key(&kind))
    }

    async fn create(&self, kind: EntityKind) -> Result<(), FakeError> {
      self.creates.fetch_add(1, Ordering::SeqCst);
      // Give concurrent callers a chance to pile up behind the build.
      tokio::task::yield_now().await;
      if self.fail_create.load(Ordering::SeqCst) {
        return Err(FakeError);
      }
      self.docs.lock().unwrap().entry(kind).or_default();
      Ok(())
    }

    async fn delete(&self, kind: EntityKind) -> Result<(), FakeError> {
      self.docs.lock().unwrap().remove(&kind);
      Ok(())
    }

    async fn add_documents(
      &self,
      kind: EntityKind,
      docs: Vec<IndexDocument>,
    ) -> Result<(), FakeError> {
      self.bulk_requests.fetch_add(1, Ordering::SeqCst);
      self.docs.lock().unwrap().entry(kind).or_default().extend(docs);
      Ok(())
    }

    async fn wait_ready(&self, _kind: EntityKind) -> Result<(), FakeError> {
      if let Some(delay) = self.ready_delay {
        tokio::time::sleep(delay).await;
      }
      if self.fail_ready.load(Ordering::SeqCst) {
        return Err(FakeError);
      }
      Ok(())
    }

    async fn query<'a>(
      &'a self,
      kind: EntityKind,
      text: &'a str,
      start: usize,
      limit: usize,
    ) -> Result<SearchHits, FakeError> {
      if let Some(delay) = self.query_delay {
        tokio::time::sleep(delay).await;
      }
      if let Some(hits) = &self.scripted {
        return Ok(hits.clone());
      }
      let docs = self.docs.lock().unwrap();
      let matching: Vec<String> = docs
        .get(&kind)
        .into_iter()
        .flatten()
        .filter(|d| d.body.to_string().contains(text))
        .map(|d| d.id.clone())
        .collect();
      Ok(SearchHits {
        total: matching.len(),
        ids:   matching.into_iter().skip(start).take(limit).collect(),
      })
    }
  }

  // ── Fixtures ──────────────────────────────────────────────────────────

  // Store order is m2, m5, m9, m1.
  const MOVIES: &str = "\
m2 +++$+++ the nightmare +++$+++ 1984 +++$+++ 7.5 +++$+++ 100 +++$+++ ['horror']
m5 +++$+++ nightmare on elm street +++$+++ 1984 +++$+++ 7.4 +++$+++ 200 +++$+++ ['horror']
m9 +++$+++ a nightmare before christmas +++$+++ 1993 +++$+++ 8.0 +++$+++ 300 +++$+++ ['animation']
m1 +++$+++ daydream +++$+++ 2001 +++$+++ ? +++$+++ ? +++$+++ ['drama']
";

  async fn store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ingest(&store, Corpus::from_bytes(MOVIES, "", "", "")).await.unwrap();
    Arc::new(store)
  }

  fn config() -> RetrievalConfig {
    RetrievalConfig {
      request_timeout: Duration::from_millis(200),
      ready_timeout:   Duration::from_millis(200),
      bulk_batch_size: 2,
    }
  }

  fn ids(page: &Page<Entity>) -> Vec<String> { page.results.iter().map(Entity::key).collect() }

  fn page(start: usize, limit: usize) -> PageRequest { PageRequest::new(start, limit).unwrap() }

  // ── Ranking ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn results_follow_index_rank_not_store_order() {
    let index = Arc::new(FakeIndex::scripted(&["m5", "m2", "m9"], 37));
    let retriever = Retriever::new(store().await, Some(index), config());

    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 3))
      .await
      .unwrap();

    assert_eq!(ids(&page), vec!["m5", "m2", "m9"]);
    assert_eq!(page.meta.total_items, 37);
    assert_eq!(page.meta.start, 0);
    assert_eq!(page.meta.limit, 3);
    assert_eq!(page.meta.next, Some(3));
    assert_eq!(page.meta.prev, None);
  }

  #[tokio::test]
  async fn ids_missing_from_the_store_are_dropped() {
    let index = Arc::new(FakeIndex::scripted(&["m9", "m404", "m2"], 3));
    let retriever = Retriever::new(store().await, Some(index), config());

    let page = retriever
      .search(EntityKind::Movie, "x", page(0, 5))
      .await
      .unwrap();
    assert_eq!(ids(&page), vec!["m9", "m2"]);
  }

  #[tokio::test]
  async fn zero_hits_is_an_empty_page() {
    let index = Arc::new(FakeIndex::scripted(&[], 0));
    let retriever = Retriever::new(store().await, Some(index), config());

    let page = retriever
      .search(EntityKind::Movie, "zzz", page(0, 5))
      .await
      .unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.meta.total_items, 0);
    assert_eq!(page.meta.next, None);
  }

  // ── Degraded modes ────────────────────────────────────────────────────

  #[tokio::test]
  async fn disabled_search_returns_an_empty_page() {
    let retriever: Retriever<SqliteStore, FakeIndex> =
      Retriever::new(store().await, None, config());
    assert!(!retriever.is_enabled());

    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(5, 5))
      .await
      .unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.meta.total_items, 0);
    assert_eq!(page.meta.start, 5);
    assert_eq!(page.meta.prev, Some(0));

    assert!(matches!(
      retriever.ensure_index(EntityKind::Movie).await,
      Err(Error::Disabled)
    ));
  }

  #[tokio::test]
  async fn slow_query_degrades_to_an_empty_page() {
    let index = Arc::new(FakeIndex {
      query_delay: Some(Duration::from_secs(5)),
      ..FakeIndex::scripted(&["m5"], 1)
    });
    let retriever = Retriever::new(store().await, Some(index), config());

    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 5))
      .await
      .unwrap();
    assert!(page.results.is_empty());
  }

  #[tokio::test]
  async fn unreachable_index_degrades_then_recovers() {
    let index = Arc::new(FakeIndex::default());
    index.fail_exists.store(true, Ordering::SeqCst);
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 5))
      .await
      .unwrap();
    assert!(page.results.is_empty());
    assert_eq!(page.meta.total_items, 0);
    assert_eq!(index.creates.load(Ordering::SeqCst), 0);

    // Maintenance callers still see the outage.
    assert!(matches!(
      retriever.ensure_index(EntityKind::Movie).await,
      Err(Error::Unavailable(_))
    ));

    index.fail_exists.store(false, Ordering::SeqCst);
    let page = retriever
      .search(EntityKind::Movie, "nightmare", self::page(0, 5))
      .await
      .unwrap();
    assert_eq!(page.results.len(), 3);
    assert_eq!(index.creates.load(Ordering::SeqCst), 1);
  }

  // ── Index lifecycle ───────────────────────────────────────────────────

  #[tokio::test]
  async fn first_search_builds_the_index_from_the_store() {
    let index = Arc::new(FakeIndex::default());
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 2))
      .await
      .unwrap();

    // Four movies in batches of two.
    assert_eq!(index.bulk_requests.load(Ordering::SeqCst), 2);
    assert_eq!(index.docs.lock().unwrap()[&EntityKind::Movie].len(), 4);
    assert_eq!(ids(&page), vec!["m2", "m5"]);
    assert_eq!(page.meta.total_items, 3);
    assert_eq!(page.meta.next, Some(2));
  }

  #[tokio::test]
  async fn concurrent_first_callers_share_one_build() {
    let index = Arc::new(FakeIndex::default());
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    let (a, b, c) = tokio::join!(
      retriever.ensure_index(EntityKind::Movie),
      retriever.ensure_index(EntityKind::Movie),
      retriever.ensure_index(EntityKind::Movie),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(index.creates.load(Ordering::SeqCst), 1);
    assert_eq!(index.docs.lock().unwrap()[&EntityKind::Movie].len(), 4);
  }

  #[tokio::test]
  async fn existing_index_is_not_rebuilt() {
    let index = Arc::new(FakeIndex::with_existing(EntityKind::Movie));
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    retriever.ensure_index(EntityKind::Movie).await.unwrap();
    assert_eq!(index.creates.load(Ordering::SeqCst), 0);
    assert_eq!(index.bulk_requests.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn build_failure_is_surfaced_then_retried() {
    let index = Arc::new(FakeIndex::default());
    index.fail_create.store(true, Ordering::SeqCst);
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    let err = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 5))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Index(_)));

    index.fail_create.store(false, Ordering::SeqCst);
    let page = retriever
      .search(EntityKind::Movie, "nightmare", page(0, 5))
      .await
      .unwrap();
    assert_eq!(page.results.len(), 3);
    assert_eq!(index.creates.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn server_readiness_answer_arrives_before_the_client_bound() {
    // The server reports its own timeout just after `ready_timeout`.
    let index = Arc::new(FakeIndex {
      ready_delay: Some(Duration::from_millis(250)),
      ..FakeIndex::default()
    });
    index.fail_ready.store(true, Ordering::SeqCst);
    let retriever = Retriever::new(store().await, Some(index), config());

    assert!(matches!(
      retriever.ensure_index(EntityKind::Movie).await,
      Err(Error::Index(_))
    ));
  }

  #[tokio::test]
  async fn hung_readiness_wait_times_out() {
    let index = Arc::new(FakeIndex {
      ready_delay: Some(Duration::from_secs(5)),
      ..FakeIndex::default()
    });
    let retriever = Retriever::new(store().await, Some(index), config());

    assert!(matches!(
      retriever.ensure_index(EntityKind::Movie).await,
      Err(Error::Timeout { op: "index readiness" })
    ));
  }

  #[tokio::test]
  async fn rebuild_replaces_the_index() {
    let index = Arc::new(FakeIndex::default());
    let retriever = Retriever::new(store().await, Some(index.clone()), config());

    retriever.ensure_index(EntityKind::Movie).await.unwrap();
    retriever.rebuild(EntityKind::Movie).await.unwrap();

    assert_eq!(index.creates.load(Ordering::SeqCst), 2);
    assert_eq!(index.docs.lock().unwrap()[&EntityKind::Movie].len(), 4);
  }
}
