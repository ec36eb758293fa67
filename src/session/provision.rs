// src/session/provision.rs
//
// Sends the operating parameters to a connected device.
//
// Wire order (one newline-terminated field each):
//   sampling rate, stable sample count, x threshold, y threshold, z threshold

use crate::io::Transport;
use crate::settings::ConfigSnapshot;

/// Render a threshold the way the firmware has always received it:
/// whole numbers keep one fractional digit (`1.0`, not `1`).
pub fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// The parameter lines in wire order, without terminators.
pub fn parameter_lines(snapshot: &ConfigSnapshot) -> [String; 5] {
    [
        snapshot.sampling_rate.to_string(),
        snapshot.stable_samples.to_string(),
        format_threshold(snapshot.x_threshold),
        format_threshold(snapshot.y_threshold),
        format_threshold(snapshot.z_threshold),
    ]
}

/// Clear both buffers and send every parameter line.
///
/// Failures are logged and otherwise ignored. The health monitor's next port
/// scan is what decides whether the link is gone.
pub fn provision(transport: &mut dyn Transport, snapshot: &ConfigSnapshot) {
    let port = transport.port_id().to_string();

    if let Err(e) = transport.reset_input() {
        tlog!("[provision] {}", e);
    }
    if let Err(e) = transport.reset_output() {
        tlog!("[provision] {}", e);
    }

    for line in parameter_lines(snapshot) {
        if let Err(e) = transport.write_line(&line) {
            tlog!("[provision] {} (remaining parameters skipped)", e);
            return;
        }
    }

    tlog!(
        "[provision] Sent configuration to {} (rate {}, samples {}, thresholds {}/{}/{})",
        port,
        snapshot.sampling_rate,
        snapshot.stable_samples,
        snapshot.x_threshold,
        snapshot.y_threshold,
        snapshot.z_threshold
    );
}
