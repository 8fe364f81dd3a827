//! Typed view of page-control command bodies.
//!
//! The relay forwards [`PageCommand`] untouched; renderers decode it into
//! a [`PageCommandKind`] before acting on it.

use serde_json::{json, Value};

use crate::protocol::PageCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommandKind {
    /// Playback volume, 0-100.
    Volume(u8),
    /// Jump to an absolute position, in seconds.
    Seek(f64),
    StartRecording,
    StopRecording,
    PlayVideo,
    PlayAudio,
    /// Toggle the full song with accompaniment.
    PlayFullSong,
    /// Play the numbered excerpt (`play-segment-N`, 1-based).
    PlaySegment(u8),
    /// Award a point to the given team.
    RewardTeam(u32),
    ResetAll,
    /// Anything this build does not know about, kept verbatim.
    Other(PageCommand),
}

const SEGMENT_PREFIX: &str = "play-segment-";

impl PageCommandKind {
    pub fn from_command(command: &PageCommand) -> Self {
        let value = command.value.as_ref();
        let typed = match command.kind.as_str() {
            "volume" => value
                .and_then(Value::as_f64)
                .map(|v| PageCommandKind::Volume(v.clamp(0.0, 100.0).round() as u8)),
            "seek" => value.and_then(Value::as_f64).map(PageCommandKind::Seek),
            "start-recording" => Some(PageCommandKind::StartRecording),
            "stop-recording" => Some(PageCommandKind::StopRecording),
            "play-video" => Some(PageCommandKind::PlayVideo),
            "play-audio" => Some(PageCommandKind::PlayAudio),
            "play-full-song" => Some(PageCommandKind::PlayFullSong),
            "reward-team" => value
                .and_then(Value::as_u64)
                .and_then(|team| u32::try_from(team).ok())
                .map(PageCommandKind::RewardTeam),
            "reset-all" => Some(PageCommandKind::ResetAll),
            other => other
                .strip_prefix(SEGMENT_PREFIX)
                .and_then(|n| n.parse::<u8>().ok())
                .map(PageCommandKind::PlaySegment),
        };
        typed.unwrap_or_else(|| PageCommandKind::Other(command.clone()))
    }

    pub fn to_command(&self) -> PageCommand {
        let (kind, value) = match self {
            PageCommandKind::Volume(v) => ("volume".to_string(), Some(json!(v))),
            PageCommandKind::Seek(secs) => ("seek".to_string(), Some(json!(secs))),
            PageCommandKind::StartRecording => ("start-recording".to_string(), None),
            PageCommandKind::StopRecording => ("stop-recording".to_string(), None),
            PageCommandKind::PlayVideo => ("play-video".to_string(), None),
            PageCommandKind::PlayAudio => ("play-audio".to_string(), None),
            PageCommandKind::PlayFullSong => ("play-full-song".to_string(), None),
            PageCommandKind::PlaySegment(n) => (format!("{SEGMENT_PREFIX}{n}"), None),
            PageCommandKind::RewardTeam(team) => ("reward-team".to_string(), Some(json!(team))),
            PageCommandKind::ResetAll => ("reset-all".to_string(), None),
            PageCommandKind::Other(cmd) => return cmd.clone(),
        };
        PageCommand { kind, value }
    }
}

impl From<&PageCommand> for PageCommandKind {
    fn from(command: &PageCommand) -> Self {
        Self::from_command(command)
    }
}

impl From<PageCommandKind> for PageCommand {
    fn from(kind: PageCommandKind) -> Self {
        kind.to_command()
    }
}
