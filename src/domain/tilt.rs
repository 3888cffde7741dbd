// Tilt advisor - compares the panel's reported tilt with the latitude heuristic
use serde::Serialize;

/// Alignment within this many degrees is excellent
pub const EXCELLENT_TOLERANCE: f64 = 5.0;
/// Alignment within this many degrees is only slightly off
pub const SLIGHT_TOLERANCE: f64 = 15.0;

pub const LOCATING_MESSAGE: &str = "Getting location for optimal tilt...";
pub const WAITING_MESSAGE: &str = "Waiting for panel data...";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Optimal fixed tilt for a flat plate: the absolute latitude
pub fn optimal_tilt(fix: &LocationFix) -> f64 {
    fix.latitude.abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentStatus {
    Pending,
    Error,
    Excellent,
    SlightMisalignment,
    Misaligned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltDirection {
    Steeper,
    Shallower,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
    pub degrees: f64,
    pub direction: TiltDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub status: AlignmentStatus,
    pub message: String,
    pub current_tilt: Option<f64>,
    pub optimal_tilt: Option<f64>,
    pub deviation: Option<Deviation>,
}

pub fn evaluate(
    current_tilt: Option<f64>,
    optimal_tilt: Option<f64>,
    location_error: Option<&str>,
) -> Recommendation {
    let pending = |message: &str| Recommendation {
        status: AlignmentStatus::Pending,
        message: message.to_string(),
        current_tilt,
        optimal_tilt,
        deviation: None,
    };

    if let Some(error) = location_error {
        return Recommendation {
            status: AlignmentStatus::Error,
            message: error.to_string(),
            current_tilt,
            optimal_tilt,
            deviation: None,
        };
    }

    let (current, optimal) = match (current_tilt, optimal_tilt) {
        (_, None) => return pending(LOCATING_MESSAGE),
        (None, Some(_)) => return pending(WAITING_MESSAGE),
        (Some(current), Some(optimal)) => (current, optimal),
    };

    let degrees = (current - optimal).abs();
    let (status, message) = if degrees <= EXCELLENT_TOLERANCE {
        (AlignmentStatus::Excellent, "Excellent Alignment")
    } else if degrees <= SLIGHT_TOLERANCE {
        (AlignmentStatus::SlightMisalignment, "Slight Misalignment")
    } else {
        (AlignmentStatus::Misaligned, "Misalignment Detected")
    };
    let direction = if current > optimal {
        TiltDirection::Steeper
    } else {
        TiltDirection::Shallower
    };

    Recommendation {
        status,
        message: message.to_string(),
        current_tilt,
        optimal_tilt,
        deviation: Some(Deviation { degrees, direction }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LocationState {
    Acquiring,
    Fixed(f64),
    Failed(String),
}

/// Holds the optimal tilt derived from the most recent location fix.
///
/// The optimal angle is computed once per fix and reused for every
/// recommendation until [`TiltAdvisor::reacquire`] starts over.
#[derive(Debug, Clone)]
pub struct TiltAdvisor {
    location: LocationState,
}

impl TiltAdvisor {
    pub fn new() -> Self {
        Self {
            location: LocationState::Acquiring,
        }
    }

    pub fn on_fix(&mut self, fix: LocationFix) -> f64 {
        let tilt = optimal_tilt(&fix);
        self.location = LocationState::Fixed(tilt);
        tilt
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.location = LocationState::Failed(message.into());
    }

    pub fn reacquire(&mut self) {
        self.location = LocationState::Acquiring;
    }

    pub fn is_acquiring(&self) -> bool {
        self.location == LocationState::Acquiring
    }

    pub fn optimal_tilt(&self) -> Option<f64> {
        match self.location {
            LocationState::Fixed(tilt) => Some(tilt),
            _ => None,
        }
    }

    pub fn recommend(&self, current_tilt: Option<f64>) -> Recommendation {
        let error = match &self.location {
            LocationState::Failed(message) => Some(message.as_str()),
            _ => None,
        };
        evaluate(current_tilt, self.optimal_tilt(), error)
    }
}

impl Default for TiltAdvisor {
    fn default() -> Self {
        Self::new()
    }
}
