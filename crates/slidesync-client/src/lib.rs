//! slidesync-client: controller and display handles for a slidesync server.
//!
//! Each handle runs a background task that connects, announces its role,
//! keeps a local copy of the presentation state, and reconnects with
//! backoff when the transport drops.
//!
//! ```rust,no_run
//! use slidesync_client::{ControllerClient, PageCommandKind};
//! use slidesync_config::ClientConfig;
//!
//! # async fn demo() -> Result<(), slidesync_client::ClientError> {
//! let (controller, _events) = ControllerClient::connect(&ClientConfig::default());
//! controller.next_slide().await?;
//! controller.page_control(7u32, PageCommandKind::Volume(40)).await?;
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod client;
mod connection;
pub mod error;
pub mod page_router;
pub mod reconcile;
pub mod supervisor;
pub mod types;

pub use backoff::{BackoffPolicy, ExponentialBackoff, FixedBackoff};
pub use client::{ControllerClient, DisplayClient, SyncClient};
pub use error::ClientError;
pub use page_router::{PageControlRouter, PageControlRouterBuilder};
pub use reconcile::{merge, MergeOutcome, ReconciliationStore};
pub use slidesync_common::{
    PageCommandKind, PageControlFrame, PresentationState, Role, Slide, SlideId, SlideKind,
};
pub use supervisor::{Action, ConnectionState, Supervisor, SupervisorEvent};
pub use types::{ClientEvent, ClientSettings};
