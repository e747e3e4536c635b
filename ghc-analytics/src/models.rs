//! Analytics value objects
//!
//! Placeholder tasks, compliance models, score inputs and score snapshots.
//! Field names match the JSON served by the HTTP API and the JSON embedded in
//! `score_snapshots.inputs_json`.

use chrono::{DateTime, Utc};
use ghc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Threshold applied to the `main` branch
pub const MAIN_BRANCH_MIN_SCORE: f64 = 0.90;

/// Threshold applied to every other branch
pub const DEFAULT_MIN_SCORE: f64 = 0.80;

/// Tolerance when checking that weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Status given to newly logged placeholders
pub const STATUS_OPEN: &str = "open";

/// Placeholder marker kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaceholderKind {
    Todo,
    Fixme,
    Tbd,
}

impl PlaceholderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderKind::Todo => "TODO",
            PlaceholderKind::Fixme => "FIXME",
            PlaceholderKind::Tbd => "TBD",
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaceholderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TODO" => Ok(PlaceholderKind::Todo),
            "FIXME" => Ok(PlaceholderKind::Fixme),
            "TBD" => Ok(PlaceholderKind::Tbd),
            other => Err(Error::InvalidInput(format!("Unknown placeholder kind: {}", other))),
        }
    }
}

/// An unresolved marker found in source, as reported by a scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderTask {
    pub file: String,
    /// 1-based line number
    pub line: u32,
    pub kind: PlaceholderKind,
    /// Content hash of the file when scanned
    pub sha: Option<String>,
    #[serde(default = "ghc_common::time::now")]
    pub ts: DateTime<Utc>,
}

impl PlaceholderTask {
    /// New task stamped with the current time
    pub fn new(file: impl Into<String>, line: u32, kind: PlaceholderKind, sha: Option<String>) -> Self {
        Self {
            file: file.into(),
            line,
            kind,
            sha,
            ts: ghc_common::time::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.line == 0 {
            return Err(Error::InvalidInput(format!(
                "Placeholder line must be positive ({}:{})",
                self.file, self.line
            )));
        }
        Ok(())
    }
}

/// A stored placeholder task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderRecord {
    pub id: i64,
    pub file: String,
    pub line: u32,
    pub kind: PlaceholderKind,
    pub sha: Option<String>,
    pub status: String,
    pub ts: DateTime<Utc>,
}

/// Relative weight of each scoring component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub lint: f64,
    pub tests: f64,
    pub placeholders: f64,
    pub sessions: f64,
}

impl ScoreWeights {
    /// Weights used when no model has been seeded
    pub const DEFAULT: ScoreWeights = ScoreWeights {
        lint: 0.30,
        tests: 0.40,
        placeholders: 0.20,
        sessions: 0.10,
    };

    pub fn sum(&self) -> f64 {
        self.lint + self.tests + self.placeholders + self.sessions
    }

    /// Each weight finite and non-negative, total within tolerance of 1.0
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("lint", self.lint),
            ("tests", self.tests),
            ("placeholders", self.placeholders),
            ("sessions", self.sessions),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "Weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidInput(format!(
                "Weights must sum to 1.0, got {}",
                sum
            )));
        }
        Ok(())
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A versioned weighting configuration
///
/// `min_score` is not persisted; it is derived from the branch the model was
/// resolved for (see [`min_score_for_branch`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreModel {
    pub model_id: String,
    #[serde(flatten)]
    pub weights: ScoreWeights,
    pub min_score: f64,
    pub effective_from: DateTime<Utc>,
}

/// Passing threshold for a branch
pub fn min_score_for_branch(branch: &str) -> f64 {
    if branch == "main" {
        MAIN_BRANCH_MIN_SCORE
    } else {
        DEFAULT_MIN_SCORE
    }
}

/// The four externally measured component scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub lint: f64,
    pub tests: f64,
    pub placeholders: f64,
    pub sessions: f64,
}

impl ComponentScores {
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("lint", self.lint),
            ("tests", self.tests),
            ("placeholders", self.placeholders),
            ("sessions", self.sessions),
        ];
        for (name, value) in named {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "Component '{}' must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Raw inputs of one scoring run; immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub run_id: String,
    pub lint: f64,
    pub tests: f64,
    pub placeholders: f64,
    pub sessions: f64,
    pub model_id: String,
    pub ts: DateTime<Utc>,
}

impl ScoreInputs {
    pub fn components(&self) -> ComponentScores {
        ComponentScores {
            lint: self.lint,
            tests: self.tests,
            placeholders: self.placeholders,
            sessions: self.sessions,
        }
    }
}

/// Computed compliance score for a branch at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub branch: String,
    pub score: f64,
    pub model_id: String,
    pub inputs: ScoreInputs,
    pub ts: DateTime<Utc>,
}

/// Lifecycle of a background consistency audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditJobState {
    Scheduled,
    Running,
    Succeeded,
    Failed,
}

impl AuditJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditJobState::Scheduled => "scheduled",
            AuditJobState::Running => "running",
            AuditJobState::Succeeded => "succeeded",
            AuditJobState::Failed => "failed",
        }
    }
}

impl FromStr for AuditJobState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(AuditJobState::Scheduled),
            "running" => Ok(AuditJobState::Running),
            "succeeded" => Ok(AuditJobState::Succeeded),
            "failed" => Ok(AuditJobState::Failed),
            other => Err(Error::InvalidInput(format!("Unknown audit job state: {}", other))),
        }
    }
}

/// Persisted background audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditJob {
    pub job_id: String,
    pub state: AuditJobState,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_kind_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&PlaceholderKind::Fixme).unwrap(), "\"FIXME\"");
        assert_eq!("TBD".parse::<PlaceholderKind>().unwrap(), PlaceholderKind::Tbd);
        assert!("todo".parse::<PlaceholderKind>().is_err());
    }

    #[test]
    fn test_placeholder_line_must_be_positive() {
        let task = PlaceholderTask::new("src/lib.rs", 0, PlaceholderKind::Todo, None);
        assert!(task.validate().is_err());
    }

    #[test]
    fn test_default_weights_valid() {
        assert!(ScoreWeights::DEFAULT.validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoreWeights {
            lint: 0.5,
            tests: 0.5,
            placeholders: 0.5,
            sessions: 0.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = ScoreWeights {
            lint: 1.2,
            tests: -0.2,
            placeholders: 0.0,
            sessions: 0.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_component_range() {
        let ok = ComponentScores {
            lint: 0.0,
            tests: 1.0,
            placeholders: 0.5,
            sessions: 0.25,
        };
        assert!(ok.validate().is_ok());

        let bad = ComponentScores { sessions: 1.01, ..ok };
        assert!(bad.validate().is_err());

        let nan = ComponentScores { lint: f64::NAN, ..ok };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_min_score_by_branch() {
        assert_eq!(min_score_for_branch("main"), 0.90);
        assert_eq!(min_score_for_branch("dev"), 0.80);
        assert_eq!(min_score_for_branch("feature/main"), 0.80);
    }

    #[test]
    fn test_model_weights_flattened_in_json() {
        let model = ScoreModel {
            model_id: "main-default".to_string(),
            weights: ScoreWeights::DEFAULT,
            min_score: 0.9,
            effective_from: ghc_common::time::now(),
        };
        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["lint"], 0.30);
        assert_eq!(value["sessions"], 0.10);
    }
}
