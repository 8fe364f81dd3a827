//! Canonical State Store: the only code that changes the presentation
//! state. Every operation is a pure `old -> new` transform; the hub applies
//! it and broadcasts the result.

use slidesync_common::{ClientMessage, PresentationState, Role, Slide};

use crate::autoplay::AutoPlayPolicy;

/// A state-changing request, already stripped of its wire envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ReplaceSlides(Vec<Slide>),
    SetIndex(i64),
    SetPlaying(bool),
    StepNext,
    StepPrev,
}

impl Mutation {
    /// `None` for messages that do not touch the state (`join-room`,
    /// `page-control`).
    pub fn from_message(message: ClientMessage) -> Option<Self> {
        match message {
            ClientMessage::SetSlides(slides) => Some(Mutation::ReplaceSlides(slides)),
            ClientMessage::ChangeSlide(index) => Some(Mutation::SetIndex(index)),
            ClientMessage::TogglePlay(playing) => Some(Mutation::SetPlaying(playing)),
            ClientMessage::NextSlide => Some(Mutation::StepNext),
            ClientMessage::PrevSlide => Some(Mutation::StepPrev),
            ClientMessage::JoinRoom(_) | ClientMessage::PageControl(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::ReplaceSlides(_) => "replace-slides",
            Mutation::SetIndex(_) => "set-index",
            Mutation::SetPlaying(_) => "set-playing",
            Mutation::StepNext => "step-next",
            Mutation::StepPrev => "step-prev",
        }
    }
}

/// Why a request left the state untouched. Logged server-side only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("connection has not joined a room")]
    NotJoined,

    #[error("{action} requires the {required} room, sender is in {actual}")]
    RoleMismatch {
        action: &'static str,
        required: Role,
        actual: Role,
    },

    #[error("index {index} is outside 0..{len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("already at the first slide")]
    AtFirstSlide,

    #[error("already at the last slide")]
    AtLastSlide,
}

/// Compute the state that results from applying `mutation` to `state`.
pub fn transform(
    state: &PresentationState,
    mutation: Mutation,
    autoplay: &AutoPlayPolicy,
) -> Result<PresentationState, Rejection> {
    match mutation {
        Mutation::ReplaceSlides(slides) => {
            let mut next = PresentationState {
                current_slide_index: state.current_slide_index,
                is_playing: state.is_playing,
                slides,
            };
            // A shorter deck must not leave the index dangling.
            let max = next.last_index().unwrap_or(0);
            next.current_slide_index = next.current_slide_index.min(max);
            Ok(next)
        }
        Mutation::SetIndex(index) => {
            let len = state.slides.len();
            let target = usize::try_from(index)
                .ok()
                .filter(|i| *i < len)
                .ok_or(Rejection::IndexOutOfRange { index, len })?;
            Ok(move_to(state, target, autoplay))
        }
        Mutation::SetPlaying(playing) => Ok(PresentationState {
            is_playing: playing,
            ..state.clone()
        }),
        Mutation::StepNext => match state.last_index() {
            Some(last) if state.current_slide_index < last => {
                Ok(move_to(state, state.current_slide_index + 1, autoplay))
            }
            _ => Err(Rejection::AtLastSlide),
        },
        Mutation::StepPrev => {
            if state.current_slide_index == 0 {
                return Err(Rejection::AtFirstSlide);
            }
            Ok(move_to(state, state.current_slide_index - 1, autoplay))
        }
    }
}

/// Navigate to a known-valid index, recomputing playback from the
/// target slide's auto-play rule.
fn move_to(state: &PresentationState, index: usize, autoplay: &AutoPlayPolicy) -> PresentationState {
    let is_playing = state
        .slides
        .get(index)
        .map(|slide| autoplay.should_autoplay(slide.id))
        .unwrap_or(state.is_playing);
    PresentationState {
        current_slide_index: index,
        is_playing,
        slides: state.slides.clone(),
    }
}

/// Owns the canonical state for the lifetime of one server.
#[derive(Debug, Default)]
pub struct PresentationStore {
    state: PresentationState,
    autoplay: AutoPlayPolicy,
}

impl PresentationStore {
    pub fn new(autoplay: AutoPlayPolicy) -> Self {
        Self {
            state: PresentationState::default(),
            autoplay,
        }
    }

    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// Apply a mutation. On rejection the state is left as it was.
    pub fn apply(&mut self, mutation: Mutation) -> Result<&PresentationState, Rejection> {
        self.state = transform(&self.state, mutation, &self.autoplay)?;
        debug_assert!(self.state.is_consistent());
        Ok(&self.state)
    }
}
