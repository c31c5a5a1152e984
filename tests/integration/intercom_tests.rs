//! Integration tests for the intercom door opener.

use embedded_hal::digital::PinState;

use intercom_door::app::events::AccessoryEvent;
use intercom_door::app::ports::Line;
use intercom_door::config::IntercomConfig;
use intercom_door::error::{Error, IoError, NotifyError};
use intercom_door::intercom::IntercomDoor;
use intercom_door::lock::{ContactState, LockStateCode, TargetState};

use crate::mock_hw::{MockLines, RecordingAccessory, RecordingNotifier};

type Intercom = IntercomDoor<MockLines, RecordingNotifier, RecordingAccessory>;

fn intercom() -> Intercom {
    IntercomDoor::new(
        IntercomConfig::default(),
        MockLines::new(),
        RecordingNotifier::new(),
        RecordingAccessory::new(),
    )
}

#[test]
fn lock_state_follows_relay_level() {
    let mut door = intercom();
    door.lines_mut().relay = PinState::High;
    assert_eq!(door.get_lock_state(), Ok(LockStateCode::Unsecured));
    door.lines_mut().relay = PinState::Low;
    assert_eq!(door.get_lock_state(), Ok(LockStateCode::Secured));
}

#[test]
fn relay_read_failure_is_reported() {
    let mut door = intercom();
    door.lines_mut().fail_relay_read = true;
    assert_eq!(
        door.get_lock_state(),
        Err(Error::HardwareIo(IoError::Read(Line::Relay)))
    );
}

#[test]
fn open_and_close_drive_relay_and_notify() {
    let mut door = intercom();

    door.set_lock_state(TargetState::Unsecured).unwrap();
    assert_eq!(door.lines_mut().relay_writes, [PinState::High]);
    assert_eq!(
        door.accessory().last(),
        Some(&AccessoryEvent::LockState {
            current: LockStateCode::Unsecured,
            target: TargetState::Unsecured,
        })
    );

    door.set_lock_state(TargetState::Secured).unwrap();
    assert_eq!(door.lines_mut().relay_writes, [PinState::High, PinState::Low]);
    assert_eq!(door.get_lock_state(), Ok(LockStateCode::Secured));

    assert_eq!(door.notifier().messages, ["Door is open", "Door is closed"]);
}

#[test]
fn failed_write_does_not_notify() {
    let mut door = intercom();
    door.lines_mut().fail_relay_write = true;

    let err = door.set_lock_state(TargetState::Unsecured).unwrap_err();
    assert_eq!(err, Error::HardwareIo(IoError::Write(Line::Relay)));
    assert!(door.notifier().messages.is_empty());
    assert!(door.accessory().events.is_empty());
}

#[test]
fn notifier_failure_does_not_fail_the_write() {
    let mut door = IntercomDoor::new(
        IntercomConfig::default(),
        MockLines::new(),
        RecordingNotifier::failing(NotifyError::RateLimited),
        RecordingAccessory::new(),
    );
    assert!(door.set_lock_state(TargetState::Unsecured).is_ok());
    assert_eq!(door.get_lock_state(), Ok(LockStateCode::Unsecured));
}

#[test]
fn contact_state_is_raw_voltage_level() {
    let mut door = intercom();
    door.lines_mut().sensor = PinState::Low;
    assert_eq!(door.get_contact_state(), Ok(ContactState::Detected));
    door.lines_mut().sensor = PinState::High;
    assert_eq!(door.get_contact_state(), Ok(ContactState::NotDetected));
}

#[test]
fn bell_press_publishes_and_notifies() {
    let mut door = intercom();

    door.lines_mut().sensor = PinState::High;
    door.on_bell_edge();
    door.lines_mut().sensor = PinState::Low;
    door.on_bell_edge();

    assert_eq!(
        door.accessory().events,
        [
            AccessoryEvent::Contact {
                state: ContactState::NotDetected
            },
            AccessoryEvent::Contact {
                state: ContactState::Detected
            },
        ]
    );
    assert_eq!(door.notifier().messages, ["Bell was pressed"]);
}

#[test]
fn bell_read_failure_is_swallowed() {
    let mut door = intercom();
    door.lines_mut().fail_sensor_read = true;
    door.on_bell_edge();
    assert!(door.accessory().events.is_empty());
    assert!(door.notifier().messages.is_empty());
}

#[test]
fn start_watches_voltage_line() {
    let mut door = intercom();
    door.start();
    assert_eq!(door.lines_mut().watched, [Line::Sensor]);

    let mut lines = MockLines::new();
    lines.fail_watch = true;
    let mut door = IntercomDoor::new(
        IntercomConfig::default(),
        lines,
        RecordingNotifier::new(),
        RecordingAccessory::new(),
    );
    door.start();
    assert!(door.set_lock_state(TargetState::Unsecured).is_ok());
}
