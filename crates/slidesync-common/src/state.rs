//! Presentation data model shared by server and clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable slide identifier, independent of the slide's position.
///
/// Page-control commands are routed by this id, never by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(pub u32);

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

impl From<u32> for SlideId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Image,
    Video,
    Component,
}

/// One slide of the deck. Positional order in the deck is the
/// presentation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    #[serde(alias = "type")]
    pub kind: SlideKind,
    #[serde(alias = "url")]
    pub source_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media length in seconds, carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Slide {
    pub fn new(id: u32, kind: SlideKind, source_ref: impl Into<String>) -> Self {
        Self {
            id: SlideId(id),
            kind,
            source_ref: source_ref.into(),
            title: None,
            duration: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// The canonical presentation state. A full copy of it is the snapshot
/// pushed to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationState {
    #[serde(alias = "currentSlide")]
    pub current_slide_index: usize,
    pub is_playing: bool,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl PresentationState {
    pub fn current_slide(&self) -> Option<&Slide> {
        self.slides.get(self.current_slide_index)
    }

    /// Highest valid index, or `None` for an empty deck.
    pub fn last_index(&self) -> Option<usize> {
        self.slides.len().checked_sub(1)
    }

    /// `0 <= current_slide_index < max(1, slides.len())`.
    pub fn is_consistent(&self) -> bool {
        self.current_slide_index < self.slides.len().max(1)
    }
}
