//! Tournament, Format and TournamentStatus.

use crate::models::error::BracketError;
use crate::models::game::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Elimination format. Adding a format means adding a variant here and an arm in every
/// dispatcher that matches on it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    #[default]
    SingleElimination,
    DoubleElimination,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::SingleElimination => "single-elimination",
            Format::DoubleElimination => "double-elimination",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single-elimination" => Ok(Format::SingleElimination),
            "double-elimination" => Ok(Format::DoubleElimination),
            other => Err(BracketError::InvalidFormat(other.to_string())),
        }
    }
}

/// Lifecycle of a tournament: teams are assigned, matches are battled, then it is over.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Roster is being assigned; no matches yet.
    #[default]
    Assign,
    /// Round-1 matches exist and the bracket is progressing.
    Battle,
    /// A champion is known. Terminal.
    Complete,
}

/// A tournament as seen by the bracket engine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: Format,
    pub status: TournamentStatus,
    /// Game title the matches are played in (free-form, e.g. "rocket-league").
    pub game_id: String,
    /// Games played per match (best-of count), copied onto each generated match.
    pub rounds_per_match: u32,
    pub scheduled_start: Option<DateTime<Utc>>,
    /// Set exactly when status becomes `Complete`.
    pub champion: Option<TeamId>,
}

impl Tournament {
    /// Create a tournament in `Assign` state.
    pub fn new(
        name: impl Into<String>,
        format: Format,
        game_id: impl Into<String>,
        rounds_per_match: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            status: TournamentStatus::Assign,
            game_id: game_id.into(),
            rounds_per_match,
            scheduled_start: None,
            champion: None,
        }
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.scheduled_start = Some(start);
        self
    }

    /// Settings check for tournaments arriving from outside (the HTTP layer).
    pub fn validate(&self) -> Result<(), BracketError> {
        if self.name.trim().is_empty() {
            return Err(BracketError::InvalidTournament("name is empty".to_string()));
        }
        if self.rounds_per_match == 0 {
            return Err(BracketError::InvalidTournament(
                "rounds_per_match must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.status == TournamentStatus::Complete
    }

    /// Guard used before any generation: a completed tournament accepts no new matches.
    pub fn ensure_open(&self) -> Result<(), BracketError> {
        if self.is_complete() {
            return Err(BracketError::TournamentAlreadyComplete);
        }
        Ok(())
    }

    /// Mark the tournament finished with its champion.
    pub fn complete(&mut self, champion: TeamId) {
        self.status = TournamentStatus::Complete;
        self.champion = Some(champion);
    }
}
