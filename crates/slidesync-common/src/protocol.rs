//! Wire protocol. Every frame is a JSON text frame shaped as
//! `{"event": <name>, "payload": <value>}`; `payload` is absent for
//! events that carry none.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::errors::ProtocolError;
use crate::state::{PresentationState, Slide, SlideId};

/// Room a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "control", alias = "controller")]
    Controller,
    #[serde(rename = "display")]
    Display,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => f.write_str("control"),
            Role::Display => f.write_str("display"),
        }
    }
}

/// Body of a page-control directive. `kind` is opaque to the relay; see
/// [`crate::PageCommandKind`] for the typed view renderers use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCommand {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Ephemeral directive addressed to the renderer of one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageControlCommand {
    #[serde(alias = "pageId")]
    pub target_page_id: SlideId,
    pub command: PageCommand,
}

/// A page-control payload as it crossed the wire: the typed view for
/// routing plus the exact JSON text it arrived as. Re-encoding writes the
/// original text back out, so unknown fields, explicit nulls and the
/// `pageId` spelling survive the relay.
#[derive(Debug, Clone)]
pub struct PageControlFrame {
    command: PageControlCommand,
    raw: Box<RawValue>,
}

impl PageControlFrame {
    pub fn new(command: PageControlCommand) -> Result<Self, ProtocolError> {
        let raw = serde_json::value::to_raw_value(&command)?;
        Ok(Self { command, raw })
    }

    /// Accepts any payload that carries a target page and a `command.type`.
    pub fn from_raw(raw: &RawValue) -> Result<Self, ProtocolError> {
        let command = serde_json::from_str(raw.get())?;
        Ok(Self {
            command,
            raw: raw.to_owned(),
        })
    }

    pub fn command(&self) -> &PageControlCommand {
        &self.command
    }

    pub fn target_page_id(&self) -> SlideId {
        self.command.target_page_id
    }

    pub fn raw_payload(&self) -> &str {
        self.raw.get()
    }
}

impl PartialEq for PageControlFrame {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl Serialize for PageControlFrame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PageControlFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}

const PAGE_CONTROL: &str = "page-control";

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    payload: Option<&'a RawValue>,
}

/// Page-control frames are lifted out before the tagged decode so the
/// payload is captured whatever order `event` and `payload` arrive in.
fn decode_page_control(text: &str) -> Result<Option<PageControlFrame>, ProtocolError> {
    let envelope: Envelope<'_> = serde_json::from_str(text)?;
    if envelope.event != PAGE_CONTROL {
        return Ok(None);
    }
    let payload = envelope
        .payload
        .ok_or(ProtocolError::MissingPayload(PAGE_CONTROL))?;
    PageControlFrame::from_raw(payload).map(Some)
}

/// Messages a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(Role),
    SetSlides(Vec<Slide>),
    /// Signed so that negative indices decode and get rejected by the
    /// store instead of failing the whole frame.
    ChangeSlide(i64),
    TogglePlay(bool),
    PrevSlide,
    NextSlide,
    PageControl(PageControlFrame),
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        match decode_page_control(text)? {
            Some(frame) => Ok(ClientMessage::PageControl(frame)),
            None => Ok(serde_json::from_str(text)?),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Room whose members may send this message. `None` for `join-room`,
    /// which any connection may send.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            ClientMessage::JoinRoom(_) => None,
            ClientMessage::SetSlides(_) => Some(Role::Display),
            ClientMessage::ChangeSlide(_)
            | ClientMessage::TogglePlay(_)
            | ClientMessage::PrevSlide
            | ClientMessage::NextSlide
            | ClientMessage::PageControl(_) => Some(Role::Controller),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom(_) => "join-room",
            ClientMessage::SetSlides(_) => "set-slides",
            ClientMessage::ChangeSlide(_) => "change-slide",
            ClientMessage::TogglePlay(_) => "toggle-play",
            ClientMessage::PrevSlide => "prev-slide",
            ClientMessage::NextSlide => "next-slide",
            ClientMessage::PageControl(_) => "page-control",
        }
    }
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    StateUpdate(PresentationState),
    PageControl(PageControlFrame),
}

impl ServerMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        match decode_page_control(text)? {
            Some(frame) => Ok(ServerMessage::PageControl(frame)),
            None => Ok(serde_json::from_str(text)?),
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
