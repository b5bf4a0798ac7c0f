use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of a stimulus pair. `length` is in inches; `attribute` carries
/// the series-dependent second value (tilt in degrees or saturation in
/// percent), absent for length-only data sets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineStimulus {
    pub length: f64,
    pub attribute: Option<f64>,
}

impl LineStimulus {
    pub fn plain(length: f64) -> Self {
        Self {
            length,
            attribute: None,
        }
    }

    pub fn with_attribute(length: f64, attribute: f64) -> Self {
        Self {
            length,
            attribute: Some(attribute),
        }
    }
}

/// One stimulus-pair presentation unit. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub first: LineStimulus,
    pub second: LineStimulus,
}

impl Trial {
    pub fn new(first: LineStimulus, second: LineStimulus) -> Self {
        Self { first, second }
    }

    /// Whether the two lengths are numerically equal. Exact comparison, not
    /// epsilon-based: the loaded values are compared as-is.
    pub fn ground_truth(&self) -> Judgment {
        if self.first.length == self.second.length {
            Judgment::Same
        } else {
            Judgment::Different
        }
    }
}

/// Binary same/different judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Same,
    Different,
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Judgment::Same => f.write_str("same"),
            Judgment::Different => f.write_str("different"),
        }
    }
}
