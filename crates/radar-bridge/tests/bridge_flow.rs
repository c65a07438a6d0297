//! Host bridge driven the way the overlay is: raw host JSON in, local UI
//! actions in, outbound calls observed through a recording or queued sink.

use pretty_assertions::assert_eq;
use radar_bridge::{HostBridge, OutboundCall, QueuedSink, RecordingSink, UiAction};
use radar_core::interaction::PanelPointerOutcome;
use radar_core::lock::ThresholdInput;
use radar_core::{HostRequest, PanelId, Point, Rect};
use serde_json::json;

fn recording() -> HostBridge<RecordingSink> {
    HostBridge::new(RecordingSink::new()).with_timestamp_source(|| "08:30:00 03/14/2026".into())
}

fn host(bridge: &mut HostBridge<impl radar_bridge::HostSink>, json: &str) {
    bridge.handle_json(json).expect("known host message");
}

#[test]
fn drag_commits_saved_position_payload() {
    let mut bridge = HostBridge::new(QueuedSink::new());
    bridge.handle_ui(UiAction::SetPositioning {
        panel: PanelId::Radar,
        on: true,
    });

    let down = bridge.pointer_down_body(PanelId::Radar, Point::new(800, 500));
    assert_eq!(down.outcome, PanelPointerOutcome::Started);
    assert_eq!(bridge.pointer_move(Point::new(850, 550)).outcome, PanelPointerOutcome::Queued);
    assert_eq!(bridge.pointer_move(Point::new(900, 600)).outcome, PanelPointerOutcome::Queued);
    let frame = bridge.frame();
    assert_eq!(frame.rect, Some(Rect::new(810, 530, 500, 220)));
    assert!(bridge.sink().is_empty());

    bridge.pointer_up();
    let calls: Vec<OutboundCall> = bridge.sink_mut().drain().collect();
    assert_eq!(
        calls,
        vec![OutboundCall {
            endpoint: "savePositions",
            body: json!({
                "radar": {"left": "810px", "top": "530px", "width": "500px", "height": "220px"}
            }),
        }]
    );
    assert_eq!(bridge.store().panels().rect(PanelId::Radar), Rect::new(810, 530, 500, 220));
}

#[test]
fn drag_is_ignored_outside_positioning_mode() {
    let mut bridge = recording();
    let down = bridge.pointer_down_body(PanelId::Log, Point::new(30, 550));
    assert!(down.is_ignored());
    bridge.pointer_move_immediate(Point::new(300, 300));
    bridge.pointer_leave();
    assert!(bridge.sink().requests().is_empty());
}

#[test]
fn load_positions_restores_known_panels_only() {
    let mut bridge = recording();
    host(
        &mut bridge,
        r#"{"type":"loadPositions","positions":{
            "log": {"left": "50px", "top": "60px"},
            "bogus": {"left": "1px"}
        }}"#,
    );
    assert_eq!(bridge.store().panels().rect(PanelId::Log), Rect::new(50, 60, 320, 400));
    assert!(bridge.sink().requests().is_empty());
}

#[test]
fn speed_lock_watch_round_trip_with_custom_notifications() {
    let mut bridge = recording();
    host(&mut bridge, r#"{"type":"setNotificationType","notificationType":"custom"}"#);
    host(&mut bridge, r#"{"type":"setSpeedUnit","speedUnit":"MPH"}"#);
    host(&mut bridge, r#"{"type":"openSpeedLockModal"}"#);
    bridge.set_speed_lock_threshold(&ThresholdInput::from("65"));

    assert_eq!(
        bridge.sink().endpoints(),
        ["inputActive", "setSpeedLockThreshold", "showNotification", "inputInactive"]
    );
    bridge.sink_mut().clear();

    host(&mut bridge, r#"{"type":"update","frontSpeed":82,"frontPlate":"FAST1"}"#);
    host(
        &mut bridge,
        r#"{"type":"speedLockTriggered","speed":82,"plate":"FAST1","direction":"Front"}"#,
    );
    assert!(bridge.store().lock().is_full());
    assert_eq!(
        bridge.sink().requests(),
        [HostRequest::ShowNotification {
            message: "Auto-locked: Front radar - 82 MPH (FAST1) exceeds 65 MPH threshold".into()
        }]
    );
}

#[test]
fn bolo_flow_reports_add_and_alert() {
    let mut bridge = recording();
    host(&mut bridge, r#"{"type":"plateUpdate","cam":"rear","plate":"wanted9"}"#);
    bridge.handle_ui(UiAction::OpenBoloModal);
    bridge.add_bolo_plate("  Wanted9 ");
    assert_eq!(
        bridge.sink().endpoints(),
        ["inputActive", "addBoloPlate", "inputInactive", "boloAlert"]
    );

    bridge.sink_mut().clear();
    host(&mut bridge, r#"{"type":"updateBoloPlates","plates":["WANTED9","OTHER"]}"#);
    assert!(bridge.sink().requests().is_empty(), "already matched, no new onset");

    bridge.remove_bolo_plate("wanted9");
    assert_eq!(bridge.sink().endpoints(), ["removeBoloPlate"]);
    assert!(!bridge.store().matcher().is_match(radar_core::Direction::Rear));
}

#[test]
fn empty_bolo_entry_shows_banner_and_keeps_modal() {
    let mut bridge = recording();
    bridge.handle_ui(UiAction::OpenBoloModal);
    bridge.add_bolo_plate("   ");
    assert_eq!(bridge.banner().map(|b| b.message.as_str()), Some("Enter a plate number"));
    assert!(bridge.store().modals().bolo);
    assert_eq!(bridge.sink().endpoints(), ["inputActive"]);
}

#[test]
fn saved_readings_are_stamped_and_removable() {
    let mut bridge = recording();
    host(&mut bridge, r#"{"type":"update","frontSpeed":44,"rearSpeed":12}"#);
    host(&mut bridge, r#"{"type":"saveReading"}"#);
    bridge.save_reading();

    let readings = bridge.store().reading_log().readings();
    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].id, 2);
    assert_eq!(readings[0].snapshot.timestamp, "08:30:00 03/14/2026");
    assert_eq!(readings[1].snapshot.front_speed, 44);

    bridge.remove_saved_reading(1);
    assert_eq!(bridge.store().reading_log().len(), 1);
    assert_eq!(bridge.banner().map(|b| b.message.as_str()), Some("Saved radar reading"));
}
