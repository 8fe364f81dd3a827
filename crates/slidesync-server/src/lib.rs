//! slidesync-server: keeps one canonical presentation state and pushes it
//! to every controller and display connected over WebSocket.
//!
//! All state lives in a single [`Hub`] task. Connection tasks only parse
//! frames and forward them to the hub, so mutations are applied and
//! broadcast strictly in arrival order.

pub mod autoplay;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod hub;
pub mod registry;
pub mod relay;
pub mod server;
pub mod startup;
pub mod store;

pub use autoplay::AutoPlayPolicy;
pub use error::ServerError;
pub use hub::{Hub, HubHandle};
pub use registry::{ClientSession, JoinOutcome, MembershipRegistry};
pub use server::Server;
pub use startup::{resolve_config, StartupConfig};
pub use store::{Mutation, PresentationStore, Rejection};
