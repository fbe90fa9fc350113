use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::XgError;
use crate::shot::RawShot;

pub const GOAL_TAG: u32 = 101;
pub const HEADER_TAG: u32 = 403;

const SHOT_SUB_EVENT: &str = "Shot";
const PENALTY_SUB_EVENT: &str = "Penalty";

/// Which open-play shots enter the training set, by body part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShotFilter {
    #[default]
    All,
    ExcludeHeaders,
    HeadersOnly,
}

impl ShotFilter {
    pub fn keeps(self, header: bool) -> bool {
        match self {
            ShotFilter::All => true,
            ShotFilter::ExcludeHeaders => !header,
            ShotFilter::HeadersOnly => header,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShotFilter::All => "all",
            ShotFilter::ExcludeHeaders => "exclude",
            ShotFilter::HeadersOnly => "only",
        }
    }
}

impl fmt::Display for ShotFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShotFilter {
    type Err = XgError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ShotFilter::All),
            "exclude" | "no-headers" | "feet" => Ok(ShotFilter::ExcludeHeaders),
            "only" | "headers" => Ok(ShotFilter::HeadersOnly),
            other => Err(XgError::InvalidInput(format!(
                "header filter must be all, exclude or only, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventShots {
    pub shots: Vec<RawShot>,
    pub penalties: Vec<RawShot>,
    /// Shots dropped by the [`ShotFilter`].
    pub filtered_out: usize,
    pub skipped_malformed: usize,
}

impl EventShots {
    fn extend(&mut self, other: EventShots) {
        self.shots.extend(other.shots);
        self.penalties.extend(other.penalties);
        self.filtered_out += other.filtered_out;
        self.skipped_malformed += other.skipped_malformed;
    }
}

#[derive(Debug, Deserialize)]
struct WyscoutEvent {
    #[serde(rename = "subEventName", default)]
    sub_event_name: String,
    #[serde(default)]
    tags: Vec<WyscoutTag>,
    #[serde(default)]
    positions: Vec<WyscoutPosition>,
    #[serde(rename = "playerId", default)]
    player_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WyscoutTag {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct WyscoutPosition {
    x: f64,
    y: f64,
}

impl WyscoutEvent {
    fn has_tag(&self, id: u32) -> bool {
        self.tags.iter().any(|t| t.id == id)
    }

    fn to_raw_shot(&self) -> Option<RawShot> {
        let origin = self.positions.first()?;
        Some(RawShot {
            x: origin.x,
            y: origin.y,
            scored: self.has_tag(GOAL_TAG),
            header: self.has_tag(HEADER_TAG),
            player_id: self.player_id.filter(|id| *id != 0),
        })
    }
}

/// Extracts shots and penalties from a Wyscout event dump (a JSON array).
pub fn parse_events_json(raw: &str, filter: ShotFilter) -> Result<EventShots> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(EventShots::default());
    }
    let events: Vec<WyscoutEvent> =
        serde_json::from_str(trimmed).context("invalid wyscout events json")?;

    let mut out = EventShots::default();
    for event in &events {
        let is_penalty = event.sub_event_name == PENALTY_SUB_EVENT;
        if event.sub_event_name != SHOT_SUB_EVENT && !is_penalty {
            continue;
        }
        let Some(shot) = event.to_raw_shot() else {
            out.skipped_malformed += 1;
            continue;
        };
        if is_penalty {
            out.penalties.push(shot);
        } else if !filter.keeps(shot.header) {
            out.filtered_out += 1;
        } else {
            out.shots.push(shot);
        }
    }
    debug!(
        events = events.len(),
        shots = out.shots.len(),
        penalties = out.penalties.len(),
        "parsed wyscout events"
    );
    Ok(out)
}

pub fn load_events_file(path: &Path, filter: ShotFilter) -> Result<EventShots> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read events {}", path.display()))?;
    parse_events_json(&raw, filter).with_context(|| format!("parse events {}", path.display()))
}

/// Loads and concatenates several dumps (the league files ship split in parts).
pub fn load_events_files(paths: &[PathBuf], filter: ShotFilter) -> Result<EventShots> {
    let mut out = EventShots::default();
    for path in paths {
        out.extend(load_events_file(path, filter)?);
    }
    info!(
        files = paths.len(),
        shots = out.shots.len(),
        penalties = out.penalties.len(),
        filtered_out = out.filtered_out,
        %filter,
        "loaded shot events"
    );
    Ok(out)
}
