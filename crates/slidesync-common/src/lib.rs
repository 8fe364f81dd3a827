//! Shared types for the slidesync workspace: the presentation data model,
//! the JSON wire protocol, typed page-control commands, and error types.

pub mod errors;
pub mod id;
pub mod page_command;
pub mod protocol;
pub mod state;

pub use errors::{ConfigError, ProtocolError};
pub use id::ConnectionId;
pub use page_command::PageCommandKind;
pub use protocol::{
    ClientMessage, PageCommand, PageControlCommand, PageControlFrame, Role, ServerMessage,
};
pub use state::{PresentationState, Slide, SlideId, SlideKind};
