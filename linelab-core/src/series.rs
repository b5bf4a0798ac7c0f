use crate::trial::Trial;
use serde::{Deserialize, Serialize};

/// Which second attribute a data set carries. Mutually exclusive per
/// series: a tilt series never mixes in saturation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StimulusKind {
    LengthOnly,
    Tilt,
    Saturation,
}

/// One named ordered collection of trials from one data source. Order is
/// fixed at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub kind: StimulusKind,
    pub trials: Vec<Trial>,
}

impl Series {
    pub fn new(name: impl Into<String>, kind: StimulusKind, trials: Vec<Trial>) -> Self {
        Self {
            name: name.into(),
            kind,
            trials,
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}
