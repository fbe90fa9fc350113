use std::collections::HashMap;

use serde::Serialize;

use crate::model::ModelCoefficients;
use crate::shot::{RawShot, ShotRecord};

pub const DEFAULT_PENALTY_XG: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerXg {
    pub player_id: u64,
    pub shots: usize,
    pub goals: usize,
    pub penalties: usize,
    pub xg: f64,
}

impl PlayerXg {
    pub fn goals_minus_xg(&self) -> f64 {
        self.goals as f64 - self.xg
    }
}

/// Sums model xG per shooter. Penalties are credited at a flat
/// `penalty_xg`; shots without a player id are skipped.
pub fn player_xg_totals(
    shots: &[ShotRecord],
    penalties: &[RawShot],
    model: &ModelCoefficients,
    penalty_xg: f64,
) -> Vec<PlayerXg> {
    let mut by_player: HashMap<u64, PlayerXg> = HashMap::new();

    for shot in shots {
        let Some(id) = shot.player_id else {
            continue;
        };
        let row = by_player.entry(id).or_insert_with(|| empty_row(id));
        row.shots += 1;
        row.xg += model.xg(shot);
        if shot.is_goal() {
            row.goals += 1;
        }
    }
    for pen in penalties {
        let Some(id) = pen.player_id else {
            continue;
        };
        let row = by_player.entry(id).or_insert_with(|| empty_row(id));
        row.penalties += 1;
        row.xg += penalty_xg;
        if pen.scored {
            row.goals += 1;
        }
    }

    let mut out: Vec<PlayerXg> = by_player.into_values().collect();
    out.sort_by(|a, b| b.xg.total_cmp(&a.xg).then(a.player_id.cmp(&b.player_id)));
    out
}

fn empty_row(player_id: u64) -> PlayerXg {
    PlayerXg {
        player_id,
        shots: 0,
        goals: 0,
        penalties: 0,
        xg: 0.0,
    }
}
