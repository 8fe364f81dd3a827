use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Presentation behavior shared by every session on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Slide ids that start playing the moment they become current.
    /// Each entry is a single id (`"31"`) or an inclusive range (`"3-6"`).
    pub autoplay: Vec<String>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            autoplay: vec!["1".into(), "3-6".into(), "28-29".into(), "31".into()],
        }
    }
}

impl PresentationConfig {
    /// Parse every `autoplay` entry. Fails on the first malformed entry.
    pub fn autoplay_ranges(&self) -> Result<Vec<SlideRange>, String> {
        self.autoplay.iter().map(|entry| entry.parse()).collect()
    }
}

/// Inclusive range of slide ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideRange {
    pub start: u32,
    pub end: u32,
}

impl SlideRange {
    pub fn contains(&self, id: u32) -> bool {
        (self.start..=self.end).contains(&id)
    }
}

impl FromStr for SlideRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_id = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid slide id '{}' in autoplay entry '{s}'", part.trim()))
        };
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (parse_id(a)?, parse_id(b)?),
            None => {
                let id = parse_id(s)?;
                (id, id)
            }
        };
        if start > end {
            return Err(format!("autoplay range '{s}' is reversed"));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for SlideRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}
