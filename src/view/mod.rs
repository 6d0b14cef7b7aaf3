pub mod render;

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use tokio::{sync::watch, task::JoinHandle};

use crate::{fetcher::FeedSource, model::NormalizedPost, service::posts::load_posts};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    Loading,
    Ready(Vec<NormalizedPost>),
    Empty,
}

impl SectionState {
    fn from_posts(posts: Vec<NormalizedPost>) -> Self {
        if posts.is_empty() {
            SectionState::Empty
        } else {
            SectionState::Ready(posts)
        }
    }
}

/// The blog section of the page: shows a loading state while one
/// fetch-and-normalize run is in flight, then swaps in the posts or the
/// empty state in a single update.
pub struct BlogSection {
    source: Arc<dyn FeedSource>,
    state: Arc<watch::Sender<SectionState>>,
    generation: Arc<AtomicU64>,
    mounted: Arc<AtomicBool>,
    active_handle: Mutex<Option<String>>,
}

impl BlogSection {
    pub fn mount(source: Arc<dyn FeedSource>) -> Self {
        let (state, _) = watch::channel(SectionState::Loading);
        Self {
            source,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            mounted: Arc::new(AtomicBool::new(true)),
            active_handle: Mutex::new(None),
        }
    }

    /// Start loading posts for `handle`. Returns `None` when that handle is
    /// already the active one or the section has been torn down.
    pub fn activate(&self, handle: &str) -> Option<JoinHandle<()>> {
        // Handle, generation and the Loading state change together.
        let generation = {
            let mut active = self
                .active_handle
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !self.mounted.load(Ordering::Acquire) || active.as_deref() == Some(handle) {
                return None;
            }
            *active = Some(handle.to_string());
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            self.state.send_replace(SectionState::Loading);
            generation
        };
        tracing::debug!(handle, generation, "blog section activated");

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.generation);
        let mounted = Arc::clone(&self.mounted);
        let handle = handle.to_string();

        Some(tokio::spawn(async move {
            let posts = load_posts(source.as_ref(), &handle).await;

            // Checked under the channel's write lock, so a newer activation
            // either sees these posts and replaces them, or wins the check.
            let written = state.send_if_modified(|shown| {
                if !mounted.load(Ordering::Acquire) || current.load(Ordering::Acquire) != generation {
                    return false;
                }
                *shown = SectionState::from_posts(posts);
                true
            });

            if !written {
                tracing::debug!(handle = %handle, generation, "stale or torn down, discarding posts");
            }
        }))
    }

    /// Stop accepting results. In-flight work runs to completion and is dropped.
    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    #[cfg(test)]
    pub fn state(&self) -> SectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SectionState> {
        self.state.subscribe()
    }

    /// Wait until the current activation has resolved.
    pub async fn settled(&self) -> SectionState {
        let mut rx = self.subscribe();
        let outcome = rx
            .wait_for(|state| !matches!(state, SectionState::Loading))
            .await
            .map(|state| (*state).clone());
        outcome.unwrap_or(SectionState::Empty)
    }
}
