//! BracketAssignment: the caller-supplied seeding of teams into bracket positions.

use crate::models::error::BracketError;
use crate::models::game::TeamId;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

/// One team placed at one position. Position 0 meets position 1 in round 1, 2 meets 3, and so on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct BracketAssignment {
    pub position: u32,
    pub team_id: TeamId,
}

impl BracketAssignment {
    pub fn new(position: u32, team_id: TeamId) -> Self {
        Self { position, team_id }
    }
}

/// Assign positions in the given order (first team gets position 0).
pub fn ordered_assignments(team_ids: &[TeamId]) -> Vec<BracketAssignment> {
    team_ids
        .iter()
        .enumerate()
        .map(|(i, &team_id)| BracketAssignment::new(i as u32, team_id))
        .collect()
}

/// Random positions for callers that don't seed.
pub fn shuffled_assignments(team_ids: &[TeamId]) -> Vec<BracketAssignment> {
    let mut teams = team_ids.to_vec();
    teams.shuffle(&mut rand::thread_rng());
    ordered_assignments(&teams)
}

/// Reject duplicate positions or teams; return the assignments sorted by position.
pub fn validate_assignments(
    assignments: &[BracketAssignment],
) -> Result<Vec<BracketAssignment>, BracketError> {
    let mut positions = HashSet::new();
    let mut teams = HashSet::new();
    for a in assignments {
        if !positions.insert(a.position) {
            return Err(BracketError::InvalidAssignment(format!(
                "position {} assigned twice",
                a.position
            )));
        }
        if !teams.insert(a.team_id) {
            return Err(BracketError::InvalidAssignment(format!(
                "team {} assigned twice",
                a.team_id
            )));
        }
    }
    let mut sorted = assignments.to_vec();
    sorted.sort_by_key(|a| a.position);
    Ok(sorted)
}

/// Read `position,team_id` rows (with a header line) from CSV.
pub fn assignments_from_csv<R: Read>(reader: R) -> Result<Vec<BracketAssignment>, BracketError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();
    for (line, record) in rdr.deserialize::<BracketAssignment>().enumerate() {
        let a = record.map_err(|e| {
            BracketError::InvalidAssignment(format!("row {}: {}", line + 1, e))
        })?;
        out.push(a);
    }
    validate_assignments(&out)
}
