//! Sensor readings and the per-sample verdicts derived from them.

use serde::{Deserialize, Serialize};

/// One raw reading from the wearable.
///
/// Fields the device leaves out decode as `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorReading {
    pub tilt_x: f64,
    pub tilt_y: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl SensorReading {
    /// Features fed to the posture model.
    pub fn tilt(&self) -> [f64; 2] {
        [self.tilt_x, self.tilt_y]
    }

    /// Features fed to the fall model.
    pub fn gyro(&self) -> [f64; 3] {
        [self.gyro_x, self.gyro_y, self.gyro_z]
    }
}

/// Posture model output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostureVerdict {
    pub correct: bool,
    pub confidence: f64,
}

/// Fall model output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FallVerdict {
    pub fall: bool,
    pub confidence: f64,
}

/// Both verdicts for one sample. `None` means the model had no opinion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub posture: Option<PostureVerdict>,
    pub fall: Option<FallVerdict>,
}

impl Classification {
    pub fn new(posture: Option<PostureVerdict>, fall: Option<FallVerdict>) -> Self {
        Self { posture, fall }
    }

    pub fn posture_correct(&self) -> Option<bool> {
        self.posture.map(|p| p.correct)
    }

    pub fn posture_confidence(&self) -> Option<f64> {
        self.posture.map(|p| p.confidence)
    }

    /// True only when the fall model positively reported a fall.
    pub fn is_fall(&self) -> bool {
        self.fall.is_some_and(|f| f.fall)
    }

    pub fn fall_confidence(&self) -> Option<f64> {
        self.fall.map(|f| f.confidence)
    }
}
