//! Page Control Relay: controller directives forwarded verbatim to every
//! display. Beyond the envelope shape checked at decode, nothing is
//! validated, and nothing is acknowledged or buffered.

use slidesync_common::{PageControlFrame, Role, ServerMessage};

use crate::registry::MembershipRegistry;

/// Forward to the displays connected right now, payload text unchanged.
/// Returns how many got it.
pub fn forward_page_control(registry: &MembershipRegistry, frame: PageControlFrame) -> usize {
    registry.send_to_room(Role::Display, &ServerMessage::PageControl(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidesync_common::{ConnectionId, PageCommand, PageControlCommand, SlideId};
    use tokio::sync::mpsc;

    fn joined(
        registry: &mut MembershipRegistry,
        role: Role,
    ) -> mpsc::Receiver<ServerMessage> {
        let conn = ConnectionId::new();
        let (tx, rx) = mpsc::channel(8);
        registry.attach(conn, tx);
        registry.join(conn, role);
        rx
    }

    fn volume(target: u32, value: i64) -> PageControlFrame {
        PageControlFrame::new(PageControlCommand {
            target_page_id: SlideId(target),
            command: PageCommand {
                kind: "volume".into(),
                value: Some(serde_json::json!(value)),
            },
        })
        .unwrap()
    }

    #[test]
    fn forwards_to_displays_only() {
        let mut registry = MembershipRegistry::new();
        let mut d1 = joined(&mut registry, Role::Display);
        let mut d2 = joined(&mut registry, Role::Display);
        let mut controller = joined(&mut registry, Role::Controller);

        assert_eq!(forward_page_control(&registry, volume(7, 40)), 2);
        let expected = ServerMessage::PageControl(volume(7, 40));
        assert_eq!(d1.try_recv().unwrap(), expected);
        assert_eq!(d2.try_recv().unwrap(), expected);
        assert!(controller.try_recv().is_err());
    }

    #[test]
    fn does_not_filter_on_target_page() {
        let mut registry = MembershipRegistry::new();
        let mut display = joined(&mut registry, Role::Display);
        assert_eq!(forward_page_control(&registry, volume(999, 10)), 1);
        assert!(display.try_recv().is_ok());
    }

    #[test]
    fn unknown_fields_survive_forwarding() {
        let mut registry = MembershipRegistry::new();
        let mut display = joined(&mut registry, Role::Display);
        let payload = r#"{"targetPageId":7,"command":{"type":"volume","value":null,"fade":true},"origin":"panel"}"#;
        let raw = serde_json::value::RawValue::from_string(payload.to_string()).unwrap();
        let frame = PageControlFrame::from_raw(&raw).unwrap();

        assert_eq!(forward_page_control(&registry, frame), 1);
        let ServerMessage::PageControl(received) = display.try_recv().unwrap() else {
            panic!("expected page-control");
        };
        assert_eq!(received.raw_payload(), payload);
    }

    #[test]
    fn no_displays_means_no_deliveries() {
        let registry = MembershipRegistry::new();
        assert_eq!(forward_page_control(&registry, volume(7, 40)), 0);
    }
}
