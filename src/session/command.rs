// src/session/command.rs
//
// Foreground command loop: reads `<LABEL>` frames while the session is in the
// receiving state and turns them into display requests.

use std::sync::Arc;

use crate::display::{DisplayController, DisplayRequest};
use crate::io::{pause, Timings, COMMAND_END, COMMAND_START};
use crate::orientation::{Axis, ScreenOrientation};
use crate::settings::ConfigSnapshot;

use super::SessionCoordinator;

const DEFAULT_MONITOR: u32 = 1;

/// Extract the axis from a command frame.
///
/// The start delimiter must be the first character and the end delimiter
/// must follow the label. Anything else, including unknown labels, is noise.
pub fn parse_frame(line: &str) -> Option<Axis> {
    let rest = line.strip_prefix(COMMAND_START)?;
    let end = rest.find(COMMAND_END)?;
    Axis::from_wire_label(&rest[..end])
}

/// Resolve an axis against the configuration.
///
/// Returns `None` when the axis has no orientation and no position
/// coordinate configured. A position is only sent when both coordinates are.
pub fn resolve_event(axis: Axis, snapshot: &ConfigSnapshot) -> Option<DisplayRequest> {
    let slot = snapshot.slot(axis);
    let angle = slot.orientation.map(ScreenOrientation::angle);
    if angle.is_none() && slot.x.is_none() && slot.y.is_none() {
        return None;
    }
    Some(DisplayRequest {
        monitor: snapshot.monitor.unwrap_or(DEFAULT_MONITOR),
        angle,
        position: slot.x.zip(slot.y),
    })
}

/// Result of one `CommandChannel::step`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Not the active reader, or no transport. Waited one poll interval.
    Waiting,
    /// Nothing arrived before the read timeout, or an empty line.
    Idle,
    /// The read failed. Waited the back-off.
    ReadFailed,
    /// A line that is not a known frame.
    Noise,
    /// A known frame whose axis has nothing configured.
    Suppressed(Axis),
    Dispatched(DisplayRequest),
}

pub struct CommandChannel {
    coordinator: Arc<SessionCoordinator>,
    display: Arc<dyn DisplayController>,
    timings: Timings,
}

impl CommandChannel {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        display: Arc<dyn DisplayController>,
        timings: Timings,
    ) -> Self {
        Self {
            coordinator,
            display,
            timings,
        }
    }

    /// Process frames for the lifetime of the process.
    pub fn run(&self) {
        tlog!("[command] Listening for orientation changes");
        loop {
            self.step();
        }
    }

    /// Read and handle at most one line.
    ///
    /// Never touches the session flags. Whether the link is still alive is
    /// the health monitor's call.
    pub fn step(&self) -> StepOutcome {
        if !self.coordinator.receiving().is_set() {
            pause(self.timings.poll_interval);
            return StepOutcome::Waiting;
        }

        let line = match self.coordinator.with_transport(|t| t.read_line()) {
            None => {
                pause(self.timings.poll_interval);
                return StepOutcome::Waiting;
            }
            // Swallowed: an unplug shows up in the monitor's next port scan
            Some(Err(e)) => {
                tlog!("[command] {}", e);
                pause(self.timings.read_error_backoff);
                return StepOutcome::ReadFailed;
            }
            Some(Ok(None)) => return StepOutcome::Idle,
            Some(Ok(Some(line))) => line,
        };

        if line.is_empty() {
            return StepOutcome::Idle;
        }

        let Some(axis) = parse_frame(&line) else {
            return StepOutcome::Noise;
        };

        let snapshot = self.coordinator.snapshot();
        match resolve_event(axis, &snapshot) {
            Some(request) => {
                tlog!("[command] {} -> {:?}", axis, request);
                self.display.apply(&request);
                StepOutcome::Dispatched(request)
            }
            None => StepOutcome::Suppressed(axis),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::super::monitor::HealthMonitor;
    use super::super::sim::SimDevice;
    use super::super::{DeviceSession, HandshakeEngine};
    use super::*;
    use crate::io::serial::PortSpecifier;
    use crate::io::RetryLimit;
    use crate::settings::{AxisSlot, ConfigError, ConfigProvider};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDisplay {
        requests: Mutex<Vec<DisplayRequest>>,
    }

    impl RecordingDisplay {
        fn requests(&self) -> Vec<DisplayRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl DisplayController for RecordingDisplay {
        fn apply(&self, request: &DisplayRequest) {
            self.requests.lock().unwrap().push(request.clone());
        }
    }

    struct FixedConfig(ConfigSnapshot);

    impl ConfigProvider for FixedConfig {
        fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
            Ok(self.0.clone())
        }
    }

    fn portrait_snapshot() -> ConfigSnapshot {
        ConfigSnapshot::for_tests().with_slot(
            Axis::XPos,
            AxisSlot {
                orientation: Some(ScreenOrientation::Portrait),
                x: Some(100),
                y: Some(200),
            },
        )
    }

    fn channel_on(device: &SimDevice, snapshot: ConfigSnapshot) -> (CommandChannel, Arc<RecordingDisplay>) {
        let session = DeviceSession {
            port_id: "COM3".into(),
            transport: device.transport("COM3"),
        };
        let coordinator = Arc::new(SessionCoordinator::new(session, Arc::new(snapshot)));
        let display = Arc::new(RecordingDisplay::default());
        let channel = CommandChannel::new(coordinator, display.clone(), Timings::immediate());
        (channel, display)
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(parse_frame("<X_POS>"), Some(Axis::XPos));
        assert_eq!(parse_frame("<FLAT>"), Some(Axis::Flat));
        assert_eq!(parse_frame("<Y_NEG>trailing"), Some(Axis::YNeg));
        assert_eq!(parse_frame(" <X_POS>"), None);
        assert_eq!(parse_frame("<X_POS"), None);
        assert_eq!(parse_frame("<x_pos>"), None);
        assert_eq!(parse_frame("<Z_POS>"), None);
        assert_eq!(parse_frame("<>"), None);
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame("Ready"), None);
    }

    #[test]
    fn test_resolve_mapped_axis() {
        let request = resolve_event(Axis::XPos, &portrait_snapshot()).unwrap();
        assert_eq!(request.monitor_arg(), "1");
        assert_eq!(request.angle_arg().as_deref(), Some("90"));
        assert_eq!(request.position_arg().as_deref(), Some("100 200"));
    }

    #[test]
    fn test_resolve_angle_table() {
        let cases = [
            (ScreenOrientation::Portrait, 90),
            (ScreenOrientation::PortraitFlipped, 270),
            (ScreenOrientation::Landscape, 0),
            (ScreenOrientation::LandscapeFlipped, 180),
        ];
        for (orientation, angle) in cases {
            let snapshot = ConfigSnapshot::for_tests().with_slot(
                Axis::YNeg,
                AxisSlot {
                    orientation: Some(orientation),
                    ..Default::default()
                },
            );
            let request = resolve_event(Axis::YNeg, &snapshot).unwrap();
            assert_eq!(request.angle, Some(angle));
            assert_eq!(request.position, None);
        }
    }

    #[test]
    fn test_resolve_empty_slot_is_suppressed() {
        assert_eq!(resolve_event(Axis::Flat, &ConfigSnapshot::for_tests()), None);
    }

    #[test]
    fn test_resolve_half_position_still_dispatches() {
        let mut snapshot = ConfigSnapshot::for_tests().with_slot(
            Axis::XNeg,
            AxisSlot {
                orientation: None,
                x: Some(50),
                y: None,
            },
        );
        snapshot.monitor = Some(2);
        let request = resolve_event(Axis::XNeg, &snapshot).unwrap();
        assert_eq!(request.monitor, 2);
        assert_eq!(request.angle, None);
        assert_eq!(request.position, None);
    }

    #[test]
    fn test_ready_to_dispatch_scenario() {
        let device = SimDevice::new(&["COM3"]);
        device.say("COM3", "Ready");
        let engine = HandshakeEngine::new(
            Arc::new(device.clone()),
            Arc::new(device.clone()),
            RetryLimit::bounded(0),
            Timings::immediate(),
        );
        let session = engine.establish(&PortSpecifier::Auto).unwrap();
        let mut transport = session.transport;
        super::super::provision(transport.as_mut(), &portrait_snapshot());

        let coordinator = Arc::new(SessionCoordinator::new(
            DeviceSession {
                port_id: session.port_id,
                transport,
            },
            Arc::new(portrait_snapshot()),
        ));
        let display = Arc::new(RecordingDisplay::default());
        let channel = CommandChannel::new(coordinator, display.clone(), Timings::immediate());

        assert_eq!(
            device.written("COM3"),
            vec!["Confirmation", "20", "10", "0.9", "0.9", "0.75"]
        );

        device.say("COM3", "<X_POS>");
        assert!(matches!(channel.step(), StepOutcome::Dispatched(_)));

        let requests = display.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].monitor_arg(), "1");
        assert_eq!(requests[0].angle_arg().as_deref(), Some("90"));
        assert_eq!(requests[0].position_arg().as_deref(), Some("100 200"));
    }

    #[test]
    fn test_flat_without_mapping_is_not_dispatched() {
        let device = SimDevice::new(&["COM3"]);
        let (channel, display) = channel_on(&device, portrait_snapshot());
        device.say("COM3", "<FLAT>");
        assert_eq!(channel.step(), StepOutcome::Suppressed(Axis::Flat));
        assert!(display.requests().is_empty());
    }

    #[test]
    fn test_noise_and_empty_lines() {
        let device = SimDevice::new(&["COM3"]);
        let (channel, display) = channel_on(&device, portrait_snapshot());
        device.say("COM3", "");
        device.say("COM3", "Reset");
        device.say("COM3", "<UNKNOWN>");
        assert_eq!(channel.step(), StepOutcome::Idle);
        assert_eq!(channel.step(), StepOutcome::Noise);
        assert_eq!(channel.step(), StepOutcome::Noise);
        assert_eq!(channel.step(), StepOutcome::Idle);
        assert!(display.requests().is_empty());
    }

    #[test]
    fn test_read_error_is_swallowed() {
        let device = SimDevice::new(&["COM3"]);
        let (channel, _display) = channel_on(&device, portrait_snapshot());
        device.unplug("COM3");
        assert_eq!(channel.step(), StepOutcome::ReadFailed);
        assert!(channel.coordinator.receiving().is_set());
        assert!(channel.coordinator.receiving().writes().is_empty());
    }

    #[test]
    fn test_waits_while_not_receiving() {
        let device = SimDevice::new(&["COM3"]);
        let (channel, display) = channel_on(&device, portrait_snapshot());
        channel.coordinator.receiving().clear();
        device.say("COM3", "<X_POS>");
        assert_eq!(channel.step(), StepOutcome::Waiting);
        assert!(display.requests().is_empty());
    }

    /// Runs both loops at once across an unplug and replug. Every token
    /// write must come from the monitor thread.
    #[test]
    fn test_only_monitor_writes_tokens() {
        let device = SimDevice::new(&["COM3"]);
        let (channel, display) = channel_on(&device, portrait_snapshot());
        let coordinator = channel.coordinator.clone();
        let mut monitor = HealthMonitor::new(
            coordinator.clone(),
            Arc::new(device.clone()),
            Arc::new(device.clone()),
            Arc::new(FixedConfig(portrait_snapshot())),
            RetryLimit::UNBOUNDED,
            Timings::immediate(),
        );

        let stop = Arc::new(AtomicBool::new(false));
        let channel_stop = stop.clone();
        let channel_thread = std::thread::spawn(move || {
            while !channel_stop.load(Ordering::SeqCst) {
                channel.step();
                std::thread::yield_now();
            }
            std::thread::current().id()
        });

        let monitor_thread = std::thread::spawn(move || {
            let id = std::thread::current().id();
            for round in 0..20 {
                device.say("COM3", "<X_POS>");
                for _ in 0..5 {
                    monitor.tick().unwrap();
                    std::thread::yield_now();
                }
                if round % 4 == 1 {
                    device.unplug("COM3");
                    monitor.tick().unwrap();
                    device.plug("COM3");
                    device.say("COM3", "Ready");
                }
            }
            id
        });

        let monitor_id = monitor_thread.join().unwrap();
        // The last frames are still queued; give the channel a chance to read one
        for _ in 0..200 {
            if !display.requests().is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        stop.store(true, Ordering::SeqCst);
        let channel_id = channel_thread.join().unwrap();
        assert_ne!(monitor_id, channel_id);

        for token in [coordinator.config_sent(), coordinator.receiving()] {
            let writes = token.writes();
            assert!(!writes.is_empty(), "{} never changed", token.name());
            assert!(
                writes.iter().all(|(_, thread)| *thread == monitor_id),
                "{} written outside the monitor",
                token.name()
            );
        }
        assert!(!display.requests().is_empty());
    }

    proptest! {
        #[test]
        fn test_parse_frame_is_total(line in ".*") {
            let parsed = parse_frame(&line);
            if let Some(axis) = parsed {
                prop_assert!(line.starts_with('<'));
                prop_assert!(line[1..].starts_with(axis.wire_label()));
            }
        }

        #[test]
        fn test_lines_without_start_delimiter_are_noise(line in "[^<].*") {
            prop_assert_eq!(parse_frame(&line), None);
        }

        #[test]
        fn test_known_labels_always_parse(idx in 0usize..5, tail in "[^\n]*") {
            let axis = Axis::ALL[idx];
            let line = format!("<{}>{}", axis.wire_label(), tail);
            prop_assert_eq!(parse_frame(&line), Some(axis));
        }
    }
}
