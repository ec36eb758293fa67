// src/display.rs
//
// Hand-off to the external display utility that actually rotates and moves
// the screen. The session never looks at the outcome.

use std::process::Command;

/// One reorientation request for a single monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayRequest {
    /// Monitor number, 1-based.
    pub monitor: u32,
    /// Rotation in degrees, when the axis maps to an orientation.
    pub angle: Option<u16>,
    /// Top-left corner, when both coordinates are configured.
    pub position: Option<(i64, i64)>,
}

impl DisplayRequest {
    pub fn monitor_arg(&self) -> String {
        self.monitor.to_string()
    }

    pub fn angle_arg(&self) -> Option<String> {
        self.angle.map(|a| a.to_string())
    }

    pub fn position_arg(&self) -> Option<String> {
        self.position.map(|(x, y)| format!("{} {}", x, y))
    }

    /// Command-line arguments understood by the display utility:
    /// `/device <n> [/rotate <deg>] [/position <x> <y>]`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["/device".to_string(), self.monitor_arg()];
        if let Some(angle) = self.angle_arg() {
            args.push("/rotate".to_string());
            args.push(angle);
        }
        if let Some((x, y)) = self.position {
            args.push("/position".to_string());
            args.push(x.to_string());
            args.push(y.to_string());
        }
        args
    }
}

/// Performs screen reorientation.
pub trait DisplayController: Send + Sync {
    /// Number of attached monitors, when the controller can tell.
    fn monitor_count(&self) -> Option<usize> {
        None
    }

    /// Apply a request. Failures are the controller's own business.
    fn apply(&self, request: &DisplayRequest);
}

/// Runs an external program such as `display64.exe` for each request.
#[derive(Clone, Debug)]
pub struct ExternalDisplayProgram {
    program: String,
}

impl ExternalDisplayProgram {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DisplayController for ExternalDisplayProgram {
    fn apply(&self, request: &DisplayRequest) {
        let args = request.to_args();
        tlog!("[display] {} {}", self.program, args.join(" "));

        // Waits for the utility like a shell call would; the outcome is only logged
        match Command::new(&self.program).args(&args).status() {
            Ok(status) if status.success() => {}
            Ok(status) => tlog!("[display] {} exited with {}", self.program, status),
            Err(e) => tlog!("[display] Failed to run {}: {}", self.program, e),
        }
    }
}
