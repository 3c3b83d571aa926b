//! Probed metadata value objects

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::Resolution;

/// Structural metadata extracted from a source file by the prober
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Embedded title tag, if the container carries one
    pub title: Option<String>,
    /// Runtime in seconds
    pub duration_secs: Option<f64>,
    /// Frame size of the primary video stream
    pub resolution: Resolution,
    /// Container format name reported by the prober
    pub container: Option<String>,
    /// Episodic hints from container tags, if present
    pub episodic: Option<EpisodicHint>,
}

/// Season/episode numbers mined from container tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodicHint {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}
