//! Reconciles paged remote fetches with the local store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogSource, Record};
use crate::projection::sort_by_id;
use crate::store::{RecordStore, StoreError};

#[derive(Error, Debug)]
pub enum SyncError {
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Pagination state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageState {
  /// Nothing requested yet
  #[default]
  Idle,
  Loading {
    page: u32,
  },
  /// `page` was merged; more pages may follow
  Loaded {
    page: u32,
  },
  /// `page` came back empty. Terminal.
  Exhausted {
    page: u32,
  },
  /// `page` failed; requesting it again retries
  Failed {
    page: u32,
    message: String,
  },
}

impl PageState {
  /// The page a "load more" request should ask for, if any
  pub fn next_page(&self) -> Option<u32> {
    match self {
      PageState::Idle => Some(1),
      PageState::Loading { .. } | PageState::Exhausted { .. } => None,
      PageState::Loaded { page } => Some(page + 1),
      PageState::Failed { page, .. } => Some(*page),
    }
  }

  pub fn is_exhausted(&self) -> bool {
    matches!(self, PageState::Exhausted { .. })
  }
}

/// Result of a page request that did not fail
#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
  /// The page was merged; `records` is the full store contents sorted by id
  Loaded { page: u32, records: Vec<Record> },
  /// The page was empty. Already displayed records stay as they are.
  Exhausted { page: u32 },
  /// A later request was issued while this one was in flight; its data was dropped
  Superseded { page: u32 },
}

/// Fetches pages, merges them into the store, and reloads the full set.
///
/// Each request is tagged with a sequence number so a slow response that has
/// been overtaken by a newer request is discarded instead of applied.
pub struct SyncCoordinator<S> {
  store: Arc<dyn RecordStore>,
  source: S,
  latest_request: AtomicU64,
  state: Mutex<PageState>,
}

impl<S: CatalogSource> SyncCoordinator<S> {
  pub fn new(store: Arc<dyn RecordStore>, source: S) -> Self {
    Self {
      store,
      source,
      latest_request: AtomicU64::new(0),
      state: Mutex::new(PageState::Idle),
    }
  }

  pub fn state(&self) -> PageState {
    self.lock_state().clone()
  }

  /// The state lock also orders sequence bumps against merges and resets.
  /// Every write under it stores a whole state, so a poisoned lock is recovered.
  fn lock_state(&self) -> MutexGuard<'_, PageState> {
    self.state.lock().unwrap_or_else(|poisoned| {
      warn!("Page state lock poisoned, recovering last state");
      poisoned.into_inner()
    })
  }

  /// Treat `page` as already merged, e.g. when starting from a warm cache
  pub fn resume_after(&self, page: u32) {
    *self.lock_state() = PageState::Loaded { page };
  }

  pub fn store(&self) -> &Arc<dyn RecordStore> {
    &self.store
  }

  /// Fetch one page, merge it, and reload everything from the store.
  ///
  /// The merge completes before the reload starts, so the reload never sees
  /// a partial batch. No retry happens here.
  pub async fn load_page(&self, page: u32) -> Result<LoadOutcome, SyncError> {
    let seq = {
      let mut state = self.lock_state();
      *state = PageState::Loading { page };
      self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    };
    info!(page, seq, "Loading catalog page");

    let fetched = self.source.fetch_page(page).await;

    // Held until the outcome is applied so a reset cannot interleave
    let mut state = self.lock_state();
    if self.latest_request.load(Ordering::SeqCst) != seq {
      debug!(page, seq, "Discarding superseded page response");
      return Ok(LoadOutcome::Superseded { page });
    }

    let records = match fetched {
      Ok(records) => records,
      Err(e) => {
        warn!(page, error = %e, "Catalog page failed");
        *state = PageState::Failed {
          page,
          message: e.to_string(),
        };
        return Err(e.into());
      }
    };

    if records.is_empty() {
      info!(page, "Catalog exhausted");
      *state = PageState::Exhausted { page };
      return Ok(LoadOutcome::Exhausted { page });
    }

    let merged = self
      .store
      .upsert_all(&records)
      .and_then(|()| self.reload_all());

    match merged {
      Ok(all) => {
        info!(page, fetched = records.len(), total = all.len(), "Merged catalog page");
        *state = PageState::Loaded { page };
        Ok(LoadOutcome::Loaded { page, records: all })
      }
      Err(e) => {
        warn!(page, error = %e, "Failed to merge catalog page");
        *state = PageState::Failed {
          page,
          message: e.to_string(),
        };
        Err(e.into())
      }
    }
  }

  /// Everything in the store, sorted by id
  pub fn reload_all(&self) -> Result<Vec<Record>, StoreError> {
    let mut records = self.store.get_all()?;
    sort_by_id(&mut records);
    Ok(records)
  }

  /// Empty the store and start paging from scratch.
  ///
  /// Any request still in flight is superseded.
  pub fn reset(&self) -> Result<(), StoreError> {
    let mut state = self.lock_state();
    self.latest_request.fetch_add(1, Ordering::SeqCst);
    self.store.clear()?;
    *state = PageState::Idle;
    info!("Catalog reset");
    Ok(())
  }
}

impl<S: CatalogSource + 'static> SyncCoordinator<S> {
  /// Reload the full set whenever a record is created.
  ///
  /// Runs until every sender of `created` is dropped.
  pub fn spawn_reload_listener<F>(
    self: &Arc<Self>,
    mut created: mpsc::UnboundedReceiver<Record>,
    on_reload: F,
  ) -> JoinHandle<()>
  where
    F: Fn(Result<Vec<Record>, StoreError>) + Send + 'static,
  {
    let coordinator = Arc::clone(self);
    tokio::spawn(async move {
      while let Some(record) = created.recv().await {
        debug!(id = record.id, "Record created, reloading");
        on_reload(coordinator.reload_all());
      }
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::RecordDraft;
  use crate::store::{IdPolicy, MemoryStore, SqliteStore};
  use crate::sync::RecordFactory;
  use std::collections::{HashMap, VecDeque};
  use std::time::Duration;

  /// Scripted catalog: each page answers from a queue, then with an empty page
  #[derive(Default)]
  struct FakeSource {
    responses: Mutex<HashMap<u32, VecDeque<Result<Vec<Record>, u16>>>>,
    delays: HashMap<u32, Duration>,
  }

  impl FakeSource {
    fn with_page(self, page: u32, records: Vec<Record>) -> Self {
      self.respond(page, Ok(records))
    }

    fn with_failure(self, page: u32, status: u16) -> Self {
      self.respond(page, Err(status))
    }

    fn with_delay(mut self, page: u32, delay: Duration) -> Self {
      self.delays.insert(page, delay);
      self
    }

    fn respond(self, page: u32, response: Result<Vec<Record>, u16>) -> Self {
      self
        .responses
        .lock()
        .unwrap()
        .entry(page)
        .or_default()
        .push_back(response);
      self
    }
  }

  impl CatalogSource for FakeSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Record>, CatalogError> {
      if let Some(delay) = self.delays.get(&page) {
        tokio::time::sleep(*delay).await;
      }
      let next = self
        .responses
        .lock()
        .unwrap()
        .get_mut(&page)
        .and_then(|queue| queue.pop_front());
      match next {
        Some(Ok(records)) => Ok(records),
        Some(Err(status)) => Err(CatalogError::from_status(
          reqwest::StatusCode::from_u16(status).unwrap(),
          "scripted failure",
        )),
        None => Ok(Vec::new()),
      }
    }
  }

  fn remote(id: i64) -> Record {
    Record {
      id,
      name: format!("Beer {}", id),
      description: String::new(),
      strength: 5.0,
      image_ref: format!("{}.png", id),
      tagline: String::new(),
      created_date: String::new(),
      is_user_created: false,
    }
  }

  fn page(ids: std::ops::RangeInclusive<i64>) -> Vec<Record> {
    ids.map(remote).collect()
  }

  fn coordinator(source: FakeSource) -> Arc<SyncCoordinator<FakeSource>> {
    let store: Arc<dyn RecordStore> =
      Arc::new(SqliteStore::open_in_memory(IdPolicy::AfterMax).unwrap());
    Arc::new(SyncCoordinator::new(store, source))
  }

  #[test]
  fn test_next_page() {
    assert_eq!(PageState::Idle.next_page(), Some(1));
    assert_eq!(PageState::Loading { page: 2 }.next_page(), None);
    assert_eq!(PageState::Loaded { page: 2 }.next_page(), Some(3));
    assert_eq!(PageState::Exhausted { page: 4 }.next_page(), None);
    assert_eq!(
      PageState::Failed {
        page: 3,
        message: String::new()
      }
      .next_page(),
      Some(3)
    );
  }

  #[tokio::test]
  async fn test_load_page_merges_and_reloads() {
    let sync = coordinator(FakeSource::default().with_page(1, page(1..=5)));

    let outcome = sync.load_page(1).await.unwrap();

    match outcome {
      LoadOutcome::Loaded { page, records } => {
        assert_eq!(page, 1);
        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
      }
      other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(sync.state(), PageState::Loaded { page: 1 });
    assert_eq!(sync.store().get_all().unwrap().len(), 5);
  }

  #[tokio::test]
  async fn test_reload_keeps_local_records() {
    let sync = coordinator(
      FakeSource::default()
        .with_page(1, page(1..=2))
        .with_page(2, page(3..=4)),
    );

    sync.load_page(1).await.unwrap();
    sync
      .store()
      .insert_new(RecordDraft::new("Mine", "", 6.0))
      .unwrap();

    let outcome = sync.load_page(2).await.unwrap();
    let LoadOutcome::Loaded { records, .. } = outcome else {
      panic!("expected a loaded page");
    };

    // The local record (id 3) was moved above the remote ids it collided with
    assert_eq!(records.len(), 5);
    assert_eq!(records.last().unwrap().name, "Mine");
    assert_eq!(records.last().unwrap().id, 5);
  }

  #[tokio::test]
  async fn test_empty_page_exhausts_without_clearing() {
    let sync = coordinator(FakeSource::default().with_page(1, page(1..=3)));

    sync.load_page(1).await.unwrap();
    let outcome = sync.load_page(2).await.unwrap();

    assert_eq!(outcome, LoadOutcome::Exhausted { page: 2 });
    assert!(sync.state().is_exhausted());
    assert_eq!(sync.state().next_page(), None);
    assert_eq!(sync.reload_all().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn test_failure_is_recoverable() {
    let sync = coordinator(
      FakeSource::default()
        .with_failure(1, 500)
        .with_page(1, page(1..=2)),
    );

    let err = sync.load_page(1).await.unwrap_err();
    assert!(matches!(err, SyncError::Catalog(CatalogError::Status { .. })));
    assert!(matches!(sync.state(), PageState::Failed { page: 1, .. }));
    assert!(sync.reload_all().unwrap().is_empty());

    // Explicit retry of the same page
    let retry = sync.state().next_page().unwrap();
    assert_eq!(retry, 1);
    assert!(matches!(
      sync.load_page(retry).await.unwrap(),
      LoadOutcome::Loaded { .. }
    ));
  }

  #[tokio::test]
  async fn test_superseded_response_is_discarded() {
    let sync = coordinator(
      FakeSource::default()
        .with_page(1, page(1..=3))
        .with_delay(1, Duration::from_millis(100))
        .with_page(2, page(10..=11)),
    );

    let slow = {
      let sync = Arc::clone(&sync);
      tokio::spawn(async move { sync.load_page(1).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let fast = sync.load_page(2).await.unwrap();
    assert!(matches!(fast, LoadOutcome::Loaded { page: 2, .. }));

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale, LoadOutcome::Superseded { page: 1 });

    let ids: Vec<i64> = sync.reload_all().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(sync.state(), PageState::Loaded { page: 2 });
  }

  #[tokio::test]
  async fn test_created_record_triggers_reload() {
    let sync = coordinator(FakeSource::default().with_page(1, page(1..=5)));
    sync.load_page(1).await.unwrap();

    let (factory, created) = RecordFactory::new(Arc::clone(sync.store()));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = sync.spawn_reload_listener(created, move |result| {
      let _ = tx.send(result);
    });

    let record = factory
      .create(RecordDraft::new("House Saison", "Peppery", 6.2))
      .unwrap();
    assert_eq!(record.id, 6);

    let reloaded = rx.recv().await.unwrap().unwrap();
    assert_eq!(reloaded.len(), 6);
    assert_eq!(
      reloaded.iter().map(|r| r.id).collect::<Vec<_>>(),
      vec![1, 2, 3, 4, 5, 6]
    );
    assert_eq!(reloaded.last().unwrap().name, "House Saison");

    drop(factory);
    listener.await.unwrap();
  }

  #[tokio::test]
  async fn test_memory_store_fallback_behaves_the_same() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new(IdPolicy::AfterMax));
    let sync = SyncCoordinator::new(store, FakeSource::default().with_page(1, page(1..=2)));

    sync.load_page(1).await.unwrap();
    assert_eq!(sync.reload_all().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn test_reset_starts_over() {
    let sync = coordinator(
      FakeSource::default()
        .with_page(1, page(1..=3))
        .with_page(1, page(1..=2)),
    );

    sync.load_page(1).await.unwrap();
    sync.reset().unwrap();

    assert_eq!(sync.state(), PageState::Idle);
    assert!(sync.reload_all().unwrap().is_empty());

    sync.load_page(1).await.unwrap();
    assert_eq!(sync.reload_all().unwrap().len(), 2);
  }

  /// Signals and pauses inside `upsert_all`, so other calls can be attempted mid-merge
  struct SlowMergeStore {
    inner: MemoryStore,
    merging: mpsc::UnboundedSender<()>,
  }

  impl RecordStore for SlowMergeStore {
    fn init(&self) -> Result<(), StoreError> {
      self.inner.init()
    }

    fn upsert_all(&self, records: &[Record]) -> Result<(), StoreError> {
      let _ = self.merging.send(());
      std::thread::sleep(Duration::from_millis(50));
      self.inner.upsert_all(records)
    }

    fn get_all(&self) -> Result<Vec<Record>, StoreError> {
      self.inner.get_all()
    }

    fn get_max_id(&self) -> Result<i64, StoreError> {
      self.inner.get_max_id()
    }

    fn insert_new(&self, draft: RecordDraft) -> Result<Record, StoreError> {
      self.inner.insert_new(draft)
    }

    fn clear(&self) -> Result<(), StoreError> {
      self.inner.clear()
    }

    fn is_persistent(&self) -> bool {
      false
    }
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn test_reset_waits_for_merge_in_progress() {
    let (merging, mut merge_started) = mpsc::unbounded_channel();
    let store: Arc<dyn RecordStore> = Arc::new(SlowMergeStore {
      inner: MemoryStore::new(IdPolicy::AfterMax),
      merging,
    });
    let sync = Arc::new(SyncCoordinator::new(
      store,
      FakeSource::default().with_page(1, page(1..=3)),
    ));

    let load = {
      let sync = Arc::clone(&sync);
      tokio::spawn(async move { sync.load_page(1).await })
    };
    merge_started.recv().await.unwrap();

    let resetter = Arc::clone(&sync);
    tokio::task::spawn_blocking(move || resetter.reset())
      .await
      .unwrap()
      .unwrap();

    // The merge finished first; the reset then wiped it
    assert!(matches!(
      load.await.unwrap().unwrap(),
      LoadOutcome::Loaded { page: 1, .. }
    ));
    assert!(sync.reload_all().unwrap().is_empty());
    assert_eq!(sync.state(), PageState::Idle);
  }

  #[tokio::test]
  async fn test_reset_supersedes_in_flight_request() {
    let sync = coordinator(
      FakeSource::default()
        .with_page(1, page(1..=3))
        .with_delay(1, Duration::from_millis(100)),
    );

    let slow = {
      let sync = Arc::clone(&sync);
      tokio::spawn(async move { sync.load_page(1).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    sync.reset().unwrap();

    assert_eq!(
      slow.await.unwrap().unwrap(),
      LoadOutcome::Superseded { page: 1 }
    );
    assert!(sync.reload_all().unwrap().is_empty());
    assert_eq!(sync.state(), PageState::Idle);
  }

  #[test]
  fn test_poisoned_state_lock_keeps_last_state() {
    let sync = coordinator(FakeSource::default());
    sync.resume_after(2);

    let holder = Arc::clone(&sync);
    let _ = std::thread::spawn(move || {
      let _held = holder.state.lock().unwrap();
      panic!("panic while holding the state lock");
    })
    .join();
    assert!(sync.state.is_poisoned());

    assert_eq!(sync.state(), PageState::Loaded { page: 2 });
    assert_eq!(sync.state().next_page(), Some(3));
  }
}
