//! Compliance scoring
//!
//! `score = w.lint*lint + w.tests*tests + w.placeholders*placeholders + w.sessions*sessions`
//!
//! Weights are not renormalized at compute time; validation happens when a
//! model is seeded and component ranges are checked at the CLI/API boundary.
//! The threshold (`min_score`) is reported alongside the score but never
//! enforced here.

use ghc_common::time::now;
use ghc_common::{uuid_utils, Result};
use serde::Serialize;
use tracing::info;

use crate::db::AnalyticsDao;
use crate::models::{ComponentScores, ScoreInputs, ScoreSnapshot, ScoreWeights};

/// Scores are reported to 6 decimal places
const SCORE_SCALE: f64 = 1_000_000.0;

/// Models created by `seed-models`
pub const DEFAULT_MODEL_IDS: [&str; 2] = ["main-default", "dev-default"];

/// Weighted sum of the components
pub fn compute_score(weights: &ScoreWeights, components: &ComponentScores) -> f64 {
    let raw = weights.lint * components.lint
        + weights.tests * components.tests
        + weights.placeholders * components.placeholders
        + weights.sessions * components.sessions;

    (raw * SCORE_SCALE).round() / SCORE_SCALE
}

/// Result of scoring one branch
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub branch: String,
    pub score: f64,
    pub model_id: String,
    pub min_score: f64,
    pub meets_threshold: bool,
    pub run_id: String,
    pub inputs: ScoreInputs,
    pub ts: chrono::DateTime<chrono::Utc>,
}

/// Seed the default models; existing rows are left untouched
///
/// Returns how many rows were inserted (0 on a re-run).
pub async fn seed_default_models(dao: &AnalyticsDao) -> Result<usize> {
    let effective_from = now();
    let mut inserted = 0;

    for model_id in DEFAULT_MODEL_IDS {
        if dao.seed_model(model_id, &ScoreWeights::DEFAULT, effective_from).await? {
            info!("Seeded compliance model {}", model_id);
            inserted += 1;
        } else {
            info!("Compliance model {} already present", model_id);
        }
    }

    Ok(inserted)
}

/// Score `branch`: resolve the model, store inputs, compute, store snapshot
pub async fn score_branch(dao: &AnalyticsDao, branch: &str, components: ComponentScores) -> Result<ScoreReport> {
    components.validate()?;

    let model = dao.fetch_active_model(branch).await?;

    let inputs = ScoreInputs {
        run_id: uuid_utils::generate_string(),
        lint: components.lint,
        tests: components.tests,
        placeholders: components.placeholders,
        sessions: components.sessions,
        model_id: model.model_id.clone(),
        ts: now(),
    };
    dao.store_score_inputs(&inputs).await?;

    let score = compute_score(&model.weights, &inputs.components());
    let snapshot = ScoreSnapshot {
        branch: branch.to_string(),
        score,
        model_id: model.model_id.clone(),
        inputs: inputs.clone(),
        ts: now(),
    };
    dao.store_score_snapshot(&snapshot).await?;

    info!(
        "Scored branch {} = {} (model {}, min {})",
        branch, score, model.model_id, model.min_score
    );

    Ok(ScoreReport {
        branch: snapshot.branch,
        score,
        model_id: model.model_id,
        min_score: model.min_score,
        meets_threshold: score >= model.min_score,
        run_id: inputs.run_id.clone(),
        inputs,
        ts: snapshot.ts,
    })
}
