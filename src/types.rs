use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CycleError, CycleResult};

/// Smoothed position and velocity series sharing one sample index space.
///
/// Both series come out of the same low-pass filter, so a sample index means
/// the same instant in either of them.
#[derive(Debug, Clone)]
pub struct PreparedSignal {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    /// Sampling frequency in Hz.
    pub fs: f64,
}

impl PreparedSignal {
    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }
}

/// Which boundary types the detector contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Boundaries at detected peaks.
    OnPeak,
    /// Boundaries at the midpoints between consecutive peaks.
    BetweenPeak,
    /// Both of the above.
    Both,
}

impl Pattern {
    pub fn parse(text: &str) -> CycleResult<Self> {
        match text.to_ascii_lowercase().as_str() {
            "on_peak" => Ok(Pattern::OnPeak),
            "between_peak" => Ok(Pattern::BetweenPeak),
            "both" => Ok(Pattern::Both),
            other => Err(CycleError::Configuration(format!(
                "invalid pattern '{other}', choose from on_peak, between_peak, both"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::OnPeak => "on_peak",
            Pattern::BetweenPeak => "between_peak",
            Pattern::Both => "both",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which derived scalar series detection operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Position,
    Velocity,
    AbsVelocity,
}

impl SignalKind {
    pub fn parse(text: &str) -> CycleResult<Self> {
        match text.to_ascii_lowercase().as_str() {
            "position" => Ok(SignalKind::Position),
            "velocity" => Ok(SignalKind::Velocity),
            "abs_velocity" => Ok(SignalKind::AbsVelocity),
            other => Err(CycleError::Configuration(format!(
                "invalid signal '{other}', choose from position, velocity, abs_velocity"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Position => "position",
            SignalKind::Velocity => "velocity",
            SignalKind::AbsVelocity => "abs_velocity",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full parameter set for one detection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionParameters {
    /// Minimum peak height.
    pub threshold: f64,
    /// Minimum separation between peaks, in seconds.
    pub distance: f64,
    pub pattern: Pattern,
    pub signal: SignalKind,
}

/// Per-record artifact persisted after a successful run. Created once,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleArtifact {
    pub record_name: String,
    pub detection_parameters: DetectionParameters,
    pub cycle_indices: Vec<usize>,
    /// ISO-8601 completion time.
    pub timestamp: String,
}

/// Seed parameters carried from one record to the next, and across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastParameters {
    pub threshold: f64,
    pub distance: f64,
    pub pattern: Pattern,
}

impl Default for LastParameters {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            distance: 2.0,
            pattern: Pattern::Both,
        }
    }
}

impl From<&DetectionParameters> for LastParameters {
    fn from(params: &DetectionParameters) -> Self {
        Self {
            threshold: params.threshold,
            distance: params.distance,
            pattern: params.pattern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_wire_strings() {
        assert_eq!(Pattern::parse("on_peak").unwrap(), Pattern::OnPeak);
        assert_eq!(Pattern::parse("BETWEEN_PEAK").unwrap(), Pattern::BetweenPeak);
        assert_eq!(Pattern::parse("both").unwrap(), Pattern::Both);
        assert!(Pattern::parse("invalid_pattern").is_err());

        let json = serde_json::to_string(&Pattern::OnPeak).unwrap();
        assert_eq!(json, "\"on_peak\"");
    }

    #[test]
    fn test_signal_wire_strings() {
        assert_eq!(SignalKind::parse("abs_velocity").unwrap(), SignalKind::AbsVelocity);
        assert!(SignalKind::parse("invalid_signal").is_err());

        let json = serde_json::to_string(&SignalKind::AbsVelocity).unwrap();
        assert_eq!(json, "\"abs_velocity\"");
    }

    #[test]
    fn test_last_parameters_defaults() {
        let defaults = LastParameters::default();
        assert_eq!(defaults.threshold, 1.0);
        assert_eq!(defaults.distance, 2.0);
        assert_eq!(defaults.pattern, Pattern::Both);
    }

    #[test]
    fn test_artifact_round_trip() {
        let artifact = CycleArtifact {
            record_name: "session1".to_string(),
            detection_parameters: DetectionParameters {
                threshold: 0.5,
                distance: 2.0,
                pattern: Pattern::Both,
                signal: SignalKind::AbsVelocity,
            },
            cycle_indices: vec![0, 10, 20, 30],
            timestamp: "2026-08-06T12:00:00+00:00".to_string(),
        };

        let json = serde_json::to_string_pretty(&artifact).unwrap();
        assert!(json.contains("\"record_name\": \"session1\""));
        assert!(json.contains("\"abs_velocity\""));

        let back: CycleArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cycle_indices, vec![0, 10, 20, 30]);
        assert_eq!(back.detection_parameters.pattern, Pattern::Both);
    }
}
