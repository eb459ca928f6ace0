use rand::RngExt;
use serde::Serialize;

use crate::skills::registry;

/// Display metadata attached to a relayed reply.
///
/// None of these numbers are measured: the upstream usage block is not
/// consumed, so timing, token and cost figures are random placeholders.
/// `simulated` is always `true` so clients can label them accordingly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedMetadata {
    pub active_skill_packs: Vec<String>,
    /// Milliseconds, in `[300, 1300)`.
    pub processing_time: f64,
    /// In `[200, 1000)`.
    pub tokens_used: f64,
    pub cost_estimate: String,
    pub efficiency: String,
    pub simulated: bool,
}

impl SimulatedMetadata {
    pub fn generate(active_skill_packs: Vec<String>) -> Self {
        let mut rng = rand::rng();
        let count = active_skill_packs.len();

        Self {
            processing_time: rng.random_range(300.0..1300.0),
            tokens_used: rng.random_range(200.0..1000.0),
            cost_estimate: cost_estimate(count),
            efficiency: efficiency(count),
            simulated: true,
            active_skill_packs,
        }
    }
}

/// `0.001` per requested pack, four decimals.
pub fn cost_estimate(pack_count: usize) -> String {
    format!("{:.4}", pack_count as f64 * 0.001)
}

/// Percentage relative to running every pack at once.  Goes negative when
/// more ids are requested than the registry holds.
pub fn efficiency(pack_count: usize) -> String {
    let ratio = 1.0 - pack_count as f64 / registry::len() as f64;
    format!(
        "{}% more efficient than general AI",
        (ratio * 100.0).round() as i64
    )
}
