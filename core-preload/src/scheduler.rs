//! # Preload Scheduler
//!
//! Owns the registered items and drains them in small concurrent batches with
//! a pause between batches, so preloading never competes with the UI for the
//! network all at once.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bridge_desktop::{MemoryCacheStorage, MemoryObjectUrlStore, ReqwestHttpClient};
//! use core_preload::{ContentItem, MediaPreloader};
//! use core_runtime::config::PreloadConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let preloader = MediaPreloader::new(
//!     PreloadConfig::default(),
//!     Arc::new(ReqwestHttpClient::new()?),
//!     Some(Arc::new(MemoryCacheStorage::new())),
//!     Arc::new(MemoryObjectUrlStore::new()),
//! )?;
//!
//! preloader.register([ContentItem::new(1, "Walden", "https://cdn.example.com/videos/1.mp4")]);
//! preloader.start_preload().await;
//! assert!(preloader.is_loaded(1));
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! All state sits behind one mutex that is never held across an await. Only
//! one drain runs at a time; a call to [`MediaPreloader::start_preload`] while
//! a drain is active returns immediately and the active drain picks up any
//! items registered in the meantime.
//!
//! Drains and item runs may be dropped at any await (an aborted task, a
//! timeout, a lost `select!` branch). Dropping a drain releases the latch;
//! dropping an item run clears its in-flight flag and puts the item back at
//! the head of the queue.

use crate::cache_store::CacheStore;
use crate::error::{PreloadError, Result};
use crate::item::{
    AudioSlot, ContentItem, ItemReport, PrefetchOutcome, PreloadItem, PreloadProgress,
    PreloadedMedia, ResourceState,
};
use crate::prefetch::RangePrefetcher;
use bridge_traits::{CacheStorage, HttpClient, ObjectUrlStore};
use core_runtime::config::PreloadConfig;
use core_runtime::logging::redact_url;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

#[derive(Default)]
struct SchedulerState {
    items: HashMap<u64, PreloadItem>,
    /// Registration order, for `registered_ids`.
    order: Vec<u64>,
    queue: VecDeque<u64>,
    draining: bool,
    next_generation: u64,
}

struct Inner {
    config: PreloadConfig,
    cache: CacheStore,
    prefetcher: RangePrefetcher,
    object_urls: Arc<dyn ObjectUrlStore>,
    state: Mutex<SchedulerState>,
}

/// Bounded-concurrency media preloader.
///
/// Cloning is cheap and every clone drives the same queue.
#[derive(Clone)]
pub struct MediaPreloader {
    inner: Arc<Inner>,
}

/// Snapshot taken when an item run starts.
struct RunPlan {
    generation: u64,
    video_url: Option<String>,
    quote_audio_url: Option<String>,
    audio_url: Option<String>,
}

impl MediaPreloader {
    /// Create a preloader.
    ///
    /// `storage` is optional: without it audio is fetched on every run and
    /// nothing is persisted.
    pub fn new(
        config: PreloadConfig,
        http: Arc<dyn HttpClient>,
        storage: Option<Arc<dyn CacheStorage>>,
        object_urls: Arc<dyn ObjectUrlStore>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = CacheStore::new(Arc::clone(&http), storage, config.cache_name.clone());
        let prefetcher = RangePrefetcher::new(http, config.head_prefetch_bytes);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                cache,
                prefetcher,
                object_urls,
                state: Mutex::new(SchedulerState::default()),
            }),
        })
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.inner.config
    }

    /// Register catalog items. Returns how many were new.
    ///
    /// Known ids are ignored: no reset, no re-enqueue. Within one call the
    /// first occurrence of a duplicate id wins.
    pub fn register<I>(&self, items: I) -> usize
    where
        I: IntoIterator<Item = ContentItem>,
    {
        let mut state = self.inner.state.lock();
        let mut added = 0;

        for content in items {
            if state.items.contains_key(&content.id) {
                continue;
            }
            let id = content.id;
            state.next_generation += 1;
            let generation = state.next_generation;
            state.items.insert(id, PreloadItem::new(content, generation));
            state.order.push(id);
            state.queue.push_back(id);
            added += 1;
        }

        if added > 0 {
            debug!(added, queued = state.queue.len(), "Registered items");
        }
        added
    }

    /// Drain the queue in batches until it is empty.
    ///
    /// Returns immediately if another drain is active.
    #[instrument(skip(self))]
    pub async fn start_preload(&self) {
        let mut latch = {
            let mut state = self.inner.state.lock();
            if state.draining {
                debug!("Drain already active");
                return;
            }
            state.draining = true;
            DrainLatch {
                state: &self.inner.state,
                held: true,
            }
        };

        let batch_size = self.inner.config.max_concurrent;
        let mut batches = 0usize;

        loop {
            let batch: Vec<u64> = {
                let mut state = self.inner.state.lock();
                if state.queue.is_empty() {
                    state.draining = false;
                    latch.held = false;
                    break;
                }
                let take = batch_size.min(state.queue.len());
                state.queue.drain(..take).collect()
            };

            batches += 1;
            debug!(batch = batches, ids = ?batch, "Starting batch");
            join_all(batch.into_iter().map(|id| self.preload_item(id))).await;

            let more = !self.inner.state.lock().queue.is_empty();
            if more {
                tokio::time::sleep(self.inner.config.batch_delay).await;
            }
        }

        let progress = self.progress();
        info!(
            batches,
            loaded = progress.loaded,
            total = progress.total,
            "Preload drain finished"
        );
    }

    /// Run [`start_preload`](Self::start_preload) on a background task.
    pub fn spawn_preload(&self) -> JoinHandle<()> {
        let preloader = self.clone();
        tokio::spawn(async move { preloader.start_preload().await })
    }

    /// Preload one item: video head, then quote audio, then full audio.
    ///
    /// No-op for unknown ids, loaded items, and items already being preloaded.
    /// Sub-resources that are already ready are skipped.
    #[instrument(skip(self))]
    pub async fn preload_item(&self, id: u64) {
        let Some(plan) = self.begin_run(id) else {
            return;
        };
        let mut run = RunGuard {
            preloader: self,
            id,
            generation: plan.generation,
            finished: false,
        };

        if let Some(url) = plan.video_url {
            let outcome = match self.inner.prefetcher.prefetch_head(&url).await {
                Ok(head) => PrefetchOutcome::Completed(head),
                Err(e) => {
                    debug!(url = %redact_url(&url), error = %e, "Head prefetch failed");
                    PrefetchOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            self.with_item(id, plan.generation, |item| {
                item.video_prefetch = outcome;
                item.video = ResourceState::Ready;
            });
        }

        if let Some(url) = plan.quote_audio_url {
            self.load_audio(id, plan.generation, AudioSlot::Quote, &url)
                .await;
        }

        if let Some(url) = plan.audio_url {
            self.load_audio(id, plan.generation, AudioSlot::Full, &url)
                .await;
        }

        run.finished = true;
        let loaded = self
            .with_item(id, plan.generation, |item| {
                item.in_flight = false;
                item.is_loaded()
            })
            .unwrap_or(false);

        if loaded {
            info!(id, "Item preloaded");
        } else {
            debug!(id, "Item run finished without full readiness");
        }
    }

    /// Claim the item for a run and decide which steps it needs.
    ///
    /// Steps whose outcome is known without a fetch are settled here.
    fn begin_run(&self, id: u64) -> Option<RunPlan> {
        let mut state = self.inner.state.lock();
        let Some(item) = state.items.get_mut(&id) else {
            debug!(id, "Unknown item");
            return None;
        };
        if item.is_loaded() || item.in_flight {
            return None;
        }
        item.in_flight = true;

        let config = &self.inner.config;
        let video_url = if item.video.is_ready() {
            None
        } else if item.video_url.trim().is_empty() {
            item.video = ResourceState::Ready;
            None
        } else {
            item.video = ResourceState::Fetching;
            Some(config.resolve_url(item.video_url.trim()))
        };

        let quote_audio_url =
            plan_audio(item, AudioSlot::Quote).map(|url| config.resolve_url(&url));
        let audio_url = plan_audio(item, AudioSlot::Full).map(|url| config.resolve_url(&url));

        Some(RunPlan {
            generation: item.generation,
            video_url,
            quote_audio_url,
            audio_url,
        })
    }

    async fn load_audio(&self, id: u64, generation: u64, slot: AudioSlot, url: &str) {
        let claimed = self.with_item(id, generation, |item| {
            *item.audio_state_mut(slot) = ResourceState::Fetching;
        });
        if claimed.is_none() {
            return;
        }

        match self.fetch_object_url(url).await {
            Ok(object_url) => {
                let stored = self
                    .with_item(id, generation, |item| {
                        *item.object_url_mut(slot) = Some(object_url.clone());
                        *item.audio_state_mut(slot) = ResourceState::Ready;
                    })
                    .is_some();

                // Cleaned up while the fetch was in flight.
                if !stored {
                    debug!(id, resource = slot.label(), "Item removed mid-fetch, revoking");
                    self.inner.object_urls.revoke_object_url(&object_url);
                }
            }
            Err(e) => {
                warn!(
                    id,
                    resource = slot.label(),
                    url = %redact_url(url),
                    error = %e,
                    "Audio preload failed"
                );
                self.with_item(id, generation, |item| {
                    *item.audio_state_mut(slot) = ResourceState::Failed {
                        reason: e.to_string(),
                    };
                });
            }
        }
    }

    async fn fetch_object_url(&self, url: &str) -> Result<String> {
        let response = self.inner.cache.try_fetch_and_cache(url).await?;
        let content_type = response.content_type().map(str::to_owned);
        self.inner
            .object_urls
            .create_object_url(response.body, content_type.as_deref())
            .map_err(|e| PreloadError::ObjectUrl(e.to_string()))
    }

    /// Apply `f` to the item if it is still the one the run started on.
    fn with_item<R>(
        &self,
        id: u64,
        generation: u64,
        f: impl FnOnce(&mut PreloadItem) -> R,
    ) -> Option<R> {
        let mut state = self.inner.state.lock();
        state
            .items
            .get_mut(&id)
            .filter(|item| item.generation == generation)
            .map(f)
    }

    pub fn is_loaded(&self, id: u64) -> bool {
        self.inner
            .state
            .lock()
            .items
            .get(&id)
            .map(PreloadItem::is_loaded)
            .unwrap_or(false)
    }

    pub fn progress(&self) -> PreloadProgress {
        let state = self.inner.state.lock();
        let loaded = state.items.values().filter(|item| item.is_loaded()).count();
        PreloadProgress::from_counts(loaded, state.items.len())
    }

    /// Object URLs for a loaded item; `None` if unknown or not loaded yet.
    pub fn preloaded_media(&self, id: u64) -> Option<PreloadedMedia> {
        self.inner
            .state
            .lock()
            .items
            .get(&id)
            .and_then(PreloadedMedia::from_item)
    }

    pub fn item_report(&self, id: u64) -> Option<ItemReport> {
        self.inner.state.lock().items.get(&id).map(ItemReport::from)
    }

    /// Registered ids in registration order.
    pub fn registered_ids(&self) -> Vec<u64> {
        self.inner.state.lock().order.clone()
    }

    /// Release object URLs and forget items.
    ///
    /// With an id only that item is removed; without, all of them. Queued
    /// entries for removed items are dropped as well.
    #[instrument(skip(self))]
    pub fn cleanup(&self, id: Option<u64>) {
        let revoked: Vec<String> = {
            let mut state = self.inner.state.lock();
            match id {
                Some(id) => {
                    let Some(mut item) = state.items.remove(&id) else {
                        return;
                    };
                    state.order.retain(|other| *other != id);
                    state.queue.retain(|other| *other != id);
                    item.take_object_urls()
                }
                None => {
                    state.order.clear();
                    state.queue.clear();
                    state
                        .items
                        .drain()
                        .flat_map(|(_, mut item)| item.take_object_urls())
                        .collect()
                }
            }
        };

        for url in &revoked {
            self.inner.object_urls.revoke_object_url(url);
        }
        debug!(revoked = revoked.len(), "Cleanup finished");
    }
}

/// Releases the drain latch when a drain is dropped before it sees an empty
/// queue.
struct DrainLatch<'a> {
    state: &'a Mutex<SchedulerState>,
    held: bool,
}

impl Drop for DrainLatch<'_> {
    fn drop(&mut self) {
        if self.held {
            self.state.lock().draining = false;
            debug!("Drain interrupted, latch released");
        }
    }
}

/// Hands an interrupted item run back to the queue.
struct RunGuard<'a> {
    preloader: &'a MediaPreloader,
    id: u64,
    generation: u64,
    finished: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let mut state = self.preloader.inner.state.lock();
        let requeue = match state
            .items
            .get_mut(&self.id)
            .filter(|item| item.generation == self.generation)
        {
            Some(item) => {
                item.in_flight = false;
                item.reset_interrupted();
                true
            }
            None => false,
        };

        if requeue && !state.queue.contains(&self.id) {
            state.queue.push_front(self.id);
        }
        drop(state);

        if requeue {
            debug!(id = self.id, "Item run interrupted, requeued");
        }
    }
}

fn plan_audio(item: &mut PreloadItem, slot: AudioSlot) -> Option<String> {
    if item.audio_state_mut(slot).is_ready() {
        return None;
    }
    let url = item.audio_url_for(slot).trim().to_string();
    if url.is_empty() {
        *item.audio_state_mut(slot) = ResourceState::NotRequired;
        None
    } else {
        Some(url)
    }
}
