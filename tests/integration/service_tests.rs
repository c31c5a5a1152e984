//! Integration tests for the bridge-facing `DoorService`.
//!
//! Requests go in as `BridgeMsg`s and come back as `BridgeReply`s, the
//! same path the control loop takes in firmware.

use embedded_hal::digital::PinState;

use intercom_door::app::commands::{
    AccessoryId, BridgeMsg, BridgeReply, BridgeRequest, BridgeResponse, REQUEST_CHANNEL,
    RESPONSE_CHANNEL,
};
use intercom_door::app::ports::Line;
use intercom_door::app::service::{handle_request, DoorService};
use intercom_door::config::{DeviceConfig, IntercomConfig};
use intercom_door::error::{Error, IoError};
use intercom_door::events::Event;
use intercom_door::intercom::IntercomDoor;
use intercom_door::lock::reconciler::LockReconciler;
use intercom_door::lock::{ContactState, LockStateCode, TargetState};

use crate::mock_hw::{MockLines, MockStore, RecordingAccessory, RecordingNotifier};

type Lock<'a> = LockReconciler<MockLines, &'a MockStore, RecordingNotifier, RecordingAccessory>;
type Intercom = IntercomDoor<MockLines, RecordingNotifier, RecordingAccessory>;
type Service<'a> = DoorService<Lock<'a>, Intercom>;

fn lock(store: &MockStore) -> Lock<'_> {
    LockReconciler::new(
        DeviceConfig {
            door_pin: Some(4),
            ..DeviceConfig::named("Front Door")
        },
        MockLines::new(),
        store,
        RecordingNotifier::new(),
        RecordingAccessory::new(),
    )
}

fn intercom() -> Intercom {
    IntercomDoor::new(
        IntercomConfig {
            relay_pin: 5,
            ..IntercomConfig::default()
        },
        MockLines::new(),
        RecordingNotifier::new(),
        RecordingAccessory::new(),
    )
}

fn msg(id: u32, accessory: AccessoryId, request: BridgeRequest) -> BridgeMsg {
    BridgeMsg {
        id,
        accessory,
        request,
    }
}

fn both(store: &MockStore) -> Service<'_> {
    let mut service = DoorService::new(Some(lock(store)), Some(intercom()));
    service.start(0);
    service
}

#[test]
fn set_and_get_lock_state() {
    let store = MockStore::new();
    let mut service = both(&store);

    let reply = service.handle_msg(
        msg(
            7,
            AccessoryId::Lock,
            BridgeRequest::SetTargetState {
                target: TargetState::Unsecured,
            },
        ),
        0,
    );
    assert_eq!(
        reply,
        BridgeReply {
            id: 7,
            response: BridgeResponse::Done
        }
    );

    let reply = service.handle_msg(msg(8, AccessoryId::Lock, BridgeRequest::GetCurrentState), 0);
    assert_eq!(reply.response, BridgeResponse::Current(LockStateCode::Unsecured));
    let reply = service.handle_msg(msg(9, AccessoryId::Lock, BridgeRequest::GetTargetState), 0);
    assert_eq!(reply.response, BridgeResponse::Target(TargetState::Unsecured));
}

#[test]
fn lock_has_no_contact_sensor() {
    let store = MockStore::new();
    let mut service = both(&store);
    let reply = service.handle_msg(msg(1, AccessoryId::Lock, BridgeRequest::GetContactState), 0);
    assert_eq!(reply.response, BridgeResponse::Unsupported);
}

#[test]
fn intercom_requests_read_the_lines() {
    let store = MockStore::new();
    let mut service = both(&store);
    service.intercom_mut().unwrap().lines_mut().sensor = PinState::High;

    let reply = service.handle_msg(msg(1, AccessoryId::Intercom, BridgeRequest::GetContactState), 0);
    assert_eq!(reply.response, BridgeResponse::Contact(ContactState::NotDetected));

    service.handle_msg(
        msg(
            2,
            AccessoryId::Intercom,
            BridgeRequest::SetTargetState {
                target: TargetState::Unsecured,
            },
        ),
        0,
    );
    let reply = service.handle_msg(msg(3, AccessoryId::Intercom, BridgeRequest::GetTargetState), 0);
    assert_eq!(reply.response, BridgeResponse::Target(TargetState::Unsecured));
}

#[test]
fn missing_accessory_is_unsupported() {
    let store = MockStore::new();
    let mut service: Service<'_> = DoorService::new(Some(lock(&store)), None);
    let reply = service.handle_msg(msg(4, AccessoryId::Intercom, BridgeRequest::GetCurrentState), 0);
    assert_eq!(
        reply,
        BridgeReply {
            id: 4,
            response: BridgeResponse::Unsupported
        }
    );
}

#[test]
fn hardware_failure_becomes_failed_response() {
    let store = MockStore::new();
    let mut door = lock(&store);
    door.lines_mut().fail_relay_write = true;

    let response = handle_request(
        &mut door,
        BridgeRequest::SetTargetState {
            target: TargetState::Unsecured,
        },
        0,
    );
    assert_eq!(
        response,
        BridgeResponse::Failed(Error::HardwareIo(IoError::Write(Line::Relay)))
    );
}

#[test]
fn door_edge_settles_on_a_later_tick() {
    let store = MockStore::seeded("Front Door", LockStateCode::Secured);
    let mut service = both(&store);
    service.lock_mut().unwrap().lines_mut().sensor = PinState::High;

    service.handle_event(Event::DoorEdge, 0);
    assert_eq!(service.next_deadline(), Some(20));
    service.handle_event(Event::ControlTick, 19);
    assert_eq!(service.lock().unwrap().current_state(), LockStateCode::Secured);
    service.handle_event(Event::ControlTick, 20);
    assert_eq!(service.lock().unwrap().current_state(), LockStateCode::Unsecured);

    assert!(service.intercom().unwrap().accessory().events.is_empty());
}

#[test]
fn bell_edge_only_reaches_intercom() {
    let store = MockStore::new();
    let mut service = both(&store);
    service.intercom_mut().unwrap().lines_mut().sensor = PinState::High;

    service.handle_event(Event::BellEdge, 0);

    assert_eq!(
        service.intercom().unwrap().notifier().messages,
        ["Bell was pressed"]
    );
    assert_eq!(service.next_deadline(), None);
    assert!(service.lock().unwrap().notifier().messages.is_empty());
}

#[test]
fn start_publishes_and_watches_both() {
    let store = MockStore::new();
    let service = both(&store);
    let lock = service.lock().unwrap();
    assert_eq!(lock.accessory().events.len(), 1);
    assert_eq!(lock.lines().watched, [Line::Sensor]);
}

#[test]
fn requests_round_trip_through_channels() {
    let store = MockStore::new();
    let mut service = both(&store);

    REQUEST_CHANNEL
        .try_send(msg(
            42,
            AccessoryId::Lock,
            BridgeRequest::SetTargetState {
                target: TargetState::Unsecured,
            },
        ))
        .unwrap();
    REQUEST_CHANNEL
        .try_send(msg(43, AccessoryId::Lock, BridgeRequest::GetCurrentState))
        .unwrap();

    while let Ok(request) = REQUEST_CHANNEL.try_receive() {
        RESPONSE_CHANNEL.try_send(service.handle_msg(request, 0)).unwrap();
    }

    assert_eq!(
        RESPONSE_CHANNEL.try_receive().ok(),
        Some(BridgeReply {
            id: 42,
            response: BridgeResponse::Done
        })
    );
    assert_eq!(
        RESPONSE_CHANNEL.try_receive().ok(),
        Some(BridgeReply {
            id: 43,
            response: BridgeResponse::Current(LockStateCode::Unsecured)
        })
    );
    assert!(RESPONSE_CHANNEL.try_receive().is_err());
}
