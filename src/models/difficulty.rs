use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBand {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

impl DifficultyBand {
    pub fn new(label: &str, min: f64, max: f64) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
        }
    }
}

/// Ordered `[min, max)` bands over the rating scale; the last band also
/// includes its upper bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyThresholdTable {
    bands: Vec<DifficultyBand>,
}

impl DifficultyThresholdTable {
    pub fn new(bands: Vec<DifficultyBand>) -> Result<Self> {
        let first = bands
            .first()
            .ok_or_else(|| Error::InvalidThresholds("table has no bands".to_string()))?;
        if first.min != RATING_MIN {
            return Err(Error::InvalidThresholds(format!(
                "first band '{}' starts at {} instead of {}",
                first.label, first.min, RATING_MIN
            )));
        }

        for (idx, band) in bands.iter().enumerate() {
            if band.label.trim().is_empty() {
                return Err(Error::InvalidThresholds(format!("band {} has no label", idx)));
            }
            if !(band.min < band.max) {
                return Err(Error::InvalidThresholds(format!(
                    "band '{}' is empty or inverted: [{}, {})",
                    band.label, band.min, band.max
                )));
            }
            if let Some(next) = bands.get(idx + 1) {
                if next.min != band.max {
                    return Err(Error::InvalidThresholds(format!(
                        "gap or overlap between '{}' (max {}) and '{}' (min {})",
                        band.label, band.max, next.label, next.min
                    )));
                }
            }
            if bands[..idx].iter().any(|b| b.label == band.label) {
                return Err(Error::InvalidThresholds(format!(
                    "label '{}' appears twice",
                    band.label
                )));
            }
        }

        let last = &bands[bands.len() - 1];
        if last.max != RATING_MAX {
            return Err(Error::InvalidThresholds(format!(
                "last band '{}' ends at {} instead of {}",
                last.label, last.max, RATING_MAX
            )));
        }

        Ok(Self { bands })
    }

    /// Parses `label:min-max` bands separated by commas, e.g.
    /// `basic:1.0-2.5,intermediate:2.5-4.0,advanced:4.0-5.0`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut bands = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (label, range) = part.split_once(':').ok_or_else(|| {
                Error::InvalidThresholds(format!("band '{}' is not label:min-max", part))
            })?;
            let (min, max) = range.split_once('-').ok_or_else(|| {
                Error::InvalidThresholds(format!("band '{}' has no min-max range", part))
            })?;
            let bound = |v: &str| {
                v.trim().parse::<f64>().map_err(|e| {
                    Error::InvalidThresholds(format!("band '{}' has a bad bound '{}': {}", part, v, e))
                })
            };
            bands.push(DifficultyBand::new(label.trim(), bound(min)?, bound(max)?));
        }
        Self::new(bands)
    }

    pub fn bands(&self) -> &[DifficultyBand] {
        &self.bands
    }

    /// Label whose band contains `rating`, if any.
    pub fn implied_label(&self, rating: f64) -> Option<&str> {
        let last = self.bands.len() - 1;
        self.bands
            .iter()
            .enumerate()
            .find(|(idx, b)| rating >= b.min && (rating < b.max || (*idx == last && rating <= b.max)))
            .map(|(_, b)| b.label.as_str())
    }
}

pub fn default_bands() -> Vec<DifficultyBand> {
    vec![
        DifficultyBand::new("basic", 1.0, 2.5),
        DifficultyBand::new("intermediate", 2.5, 4.0),
        DifficultyBand::new("advanced", 4.0, 5.0),
    ]
}

// Known-valid bands; configured tables go through `new` or `parse`.
impl Default for DifficultyThresholdTable {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAnalysis {
    pub current_difficulty: String,
    pub average_difficulty_rating: Option<f64>,
    pub implied_difficulty: Option<String>,
    pub plurality_difficulty: Option<String>,
    pub recommended_difficulty: String,
    pub needs_adjustment: bool,
    pub confidence_percent: f64,
    pub feedback_count: u32,
    pub difficulty_votes: BTreeMap<String, u32>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecalibrationResult {
    InsufficientData { feedback_count: u32, required: u32 },
    Analyzed(DifficultyAnalysis),
}

impl RecalibrationResult {
    pub fn status(&self) -> &'static str {
        match self {
            RecalibrationResult::InsufficientData { .. } => "insufficient_data",
            RecalibrationResult::Analyzed(_) => "analyzed",
        }
    }

    /// The analysis, when it recommends a change.
    pub fn adjustment(&self) -> Option<&DifficultyAnalysis> {
        match self {
            RecalibrationResult::Analyzed(a) if a.needs_adjustment => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub question_id: String,
    #[serde(rename = "from")]
    pub from_difficulty: String,
    #[serde(rename = "to")]
    pub to_difficulty: String,
    pub reason: String,
}
