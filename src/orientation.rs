// src/orientation.rs
//
// Physical axes reported by the sensor and the screen orientations they map to.

use serde::{Deserialize, Serialize};

/// The axis that currently points down, as named in command frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    XPos,
    YPos,
    XNeg,
    YNeg,
    Flat,
}

impl Axis {
    pub const ALL: [Axis; 5] = [Axis::XPos, Axis::YPos, Axis::XNeg, Axis::YNeg, Axis::Flat];

    /// Label used inside a `<...>` command frame.
    pub fn wire_label(self) -> &'static str {
        match self {
            Axis::XPos => "X_POS",
            Axis::YPos => "Y_POS",
            Axis::XNeg => "X_NEG",
            Axis::YNeg => "Y_NEG",
            Axis::Flat => "FLAT",
        }
    }

    pub fn from_wire_label(label: &str) -> Option<Axis> {
        Axis::ALL.into_iter().find(|a| a.wire_label() == label)
    }

    /// Key used in configuration files.
    pub fn config_key(self) -> &'static str {
        match self {
            Axis::XPos => "x_pos",
            Axis::YPos => "y_pos",
            Axis::XNeg => "x_neg",
            Axis::YNeg => "y_neg",
            Axis::Flat => "flat",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Axis::XPos => 0,
            Axis::YPos => 1,
            Axis::XNeg => 2,
            Axis::YNeg => 3,
            Axis::Flat => 4,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_label())
    }
}

/// Screen orientation an axis can be mapped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreenOrientation {
    Portrait,
    PortraitFlipped,
    Landscape,
    LandscapeFlipped,
}

impl ScreenOrientation {
    pub const ALL: [ScreenOrientation; 4] = [
        ScreenOrientation::Portrait,
        ScreenOrientation::PortraitFlipped,
        ScreenOrientation::Landscape,
        ScreenOrientation::LandscapeFlipped,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScreenOrientation::Portrait => "PORTRAIT",
            ScreenOrientation::PortraitFlipped => "PORTRAIT_FLIPPED",
            ScreenOrientation::Landscape => "LANDSCAPE",
            ScreenOrientation::LandscapeFlipped => "LANDSCAPE_FLIPPED",
        }
    }

    /// Parse a configured label. The empty label means "leave rotation alone".
    pub fn parse_label(label: &str) -> Result<Option<ScreenOrientation>, String> {
        if label.is_empty() {
            return Ok(None);
        }
        ScreenOrientation::ALL
            .into_iter()
            .find(|o| o.name() == label)
            .map(Some)
            .ok_or_else(|| label.to_string())
    }

    /// Rotation in degrees passed to the display utility.
    pub fn angle(self) -> u16 {
        match self {
            ScreenOrientation::Portrait => 90,
            ScreenOrientation::PortraitFlipped => 270,
            ScreenOrientation::Landscape => 0,
            ScreenOrientation::LandscapeFlipped => 180,
        }
    }
}
