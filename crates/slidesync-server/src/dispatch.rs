//! Broadcast Dispatcher: turns the canonical state into `state-update`
//! pushes.

use slidesync_common::{ConnectionId, PresentationState, Role, ServerMessage};

use crate::registry::MembershipRegistry;

/// Pull-on-join: send the current snapshot to one connection only.
pub fn push_snapshot(
    registry: &MembershipRegistry,
    connection: ConnectionId,
    state: &PresentationState,
) -> bool {
    registry.send_to(connection, ServerMessage::StateUpdate(state.clone()))
}

/// Send the snapshot to every display, then every controller. Returns the
/// number of queued deliveries.
pub fn broadcast_snapshot(registry: &MembershipRegistry, state: &PresentationState) -> usize {
    let message = ServerMessage::StateUpdate(state.clone());
    registry.send_to_room(Role::Display, &message) + registry.send_to_room(Role::Controller, &message)
}
