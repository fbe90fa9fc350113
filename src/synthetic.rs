use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{self, GOAL_WIDTH, PITCH_LENGTH, PITCH_WIDTH, WYSCOUT_HEIGHT, WYSCOUT_WIDTH};
use crate::model::probability_from_linear;
use crate::shot::RawShot;

// Ground-truth generator: eta = 1.0 - 1.5·Angle + 0.08·Distance.
const TRUE_INTERCEPT: f64 = 1.0;
const TRUE_ANGLE: f64 = -1.5;
const TRUE_DISTANCE: f64 = 0.08;

#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    pub shots: usize,
    pub seed: u64,
    pub players: u64,
    pub header_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            shots: 2_000,
            seed: 7,
            players: 25,
            header_rate: 0.15,
        }
    }
}

pub fn true_scoring_probability(x: f64, c: f64) -> f64 {
    let angle = geometry::shot_angle(x, c, GOAL_WIDTH);
    let distance = geometry::distance_to_goal(x, c);
    probability_from_linear(TRUE_INTERCEPT + TRUE_ANGLE * angle + TRUE_DISTANCE * distance)
}

/// Shots in Wyscout units, denser near goal and around the centreline.
pub fn generate_shots(cfg: &SyntheticConfig) -> Vec<RawShot> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let players = cfg.players.max(1);
    (0..cfg.shots)
        .map(|_| {
            let u: f64 = rng.r#gen();
            let x = 2.0 + 33.0 * u.powf(1.5);
            let spread: f64 = (0..3).map(|_| rng.r#gen::<f64>()).sum::<f64>() - 1.5;
            let y = (PITCH_WIDTH / 2.0 + spread * 16.0).clamp(0.0, PITCH_WIDTH);
            let c = geometry::center_offset(y, PITCH_WIDTH);
            let scored = rng.r#gen::<f64>() < true_scoring_probability(x, c);
            RawShot {
                x: WYSCOUT_WIDTH - x * WYSCOUT_WIDTH / PITCH_LENGTH,
                y: y * WYSCOUT_HEIGHT / PITCH_WIDTH,
                scored,
                header: rng.r#gen::<f64>() < cfg.header_rate,
                player_id: Some(rng.gen_range(1..=players)),
            }
        })
        .collect()
}
