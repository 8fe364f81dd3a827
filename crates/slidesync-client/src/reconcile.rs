//! Local cache of the presentation state, kept in step with server pushes.

use std::sync::Arc;

use slidesync_common::{PresentationState, Slide};
use tokio::sync::watch;

/// How an incoming snapshot was folded into the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The snapshot replaced the cache wholesale.
    Replaced,
    /// The snapshot carried no slides; only index and play state were taken.
    KeptLocalSlides,
}

/// Fold a server snapshot into the local state.
///
/// A snapshot with no slides never erases slides the client already has.
/// This covers a server that restarted empty while a display still holds
/// its deck.
pub fn merge(local: &PresentationState, incoming: PresentationState) -> (PresentationState, MergeOutcome) {
    if incoming.slides.is_empty() && !local.slides.is_empty() {
        let merged = PresentationState {
            current_slide_index: incoming.current_slide_index,
            is_playing: incoming.is_playing,
            slides: local.slides.clone(),
        };
        (merged, MergeOutcome::KeptLocalSlides)
    } else {
        (incoming, MergeOutcome::Replaced)
    }
}

/// Client-side state cache. Every change is published to subscribers.
#[derive(Clone)]
pub struct ReconciliationStore {
    tx: Arc<watch::Sender<PresentationState>>,
}

impl Default for ReconciliationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PresentationState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Apply a pushed snapshot using [`merge`].
    pub fn apply(&self, incoming: PresentationState) -> MergeOutcome {
        let mut outcome = MergeOutcome::Replaced;
        self.tx.send_modify(|state| {
            let (merged, how) = merge(state, incoming);
            *state = merged;
            outcome = how;
        });
        outcome
    }

    /// Put slides into the cache before (or without) any server snapshot.
    pub fn seed_slides(&self, slides: Vec<Slide>) {
        self.tx.send_modify(|state| state.slides = slides);
    }

    pub fn state(&self) -> PresentationState {
        self.tx.borrow().clone()
    }

    /// The slide at the cached index, if the cache holds one there.
    pub fn current_slide(&self) -> Option<Slide> {
        self.tx.borrow().current_slide().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<PresentationState> {
        self.tx.subscribe()
    }
}
