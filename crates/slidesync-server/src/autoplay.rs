//! Static per-slide auto-play rule: some slides start playing the instant
//! they become current, the rest wait for the controller.

use slidesync_common::{ConfigError, SlideId};
use slidesync_config::{PresentationConfig, SlideRange};

#[derive(Debug, Clone, Default)]
pub struct AutoPlayPolicy {
    ranges: Vec<SlideRange>,
}

impl AutoPlayPolicy {
    pub fn new(ranges: Vec<SlideRange>) -> Self {
        Self { ranges }
    }

    pub fn from_config(config: &PresentationConfig) -> Result<Self, ConfigError> {
        let ranges = config
            .autoplay_ranges()
            .map_err(|e| ConfigError::ValidationError(format!("presentation.autoplay: {e}")))?;
        Ok(Self::new(ranges))
    }

    /// Whether the slide with this id plays as soon as it becomes current.
    pub fn should_autoplay(&self, id: SlideId) -> bool {
        self.ranges.iter().any(|range| range.contains(id.0))
    }
}
