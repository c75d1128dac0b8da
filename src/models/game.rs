//! Match, TournamentMatch, BracketType and MatchStatus.

use crate::models::tournament::{Tournament, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Unique identifier for a team (owned by the calling application).
pub type TeamId = Uuid;

/// Which bracket line a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketType {
    Winners,
    Losers,
    Final,
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketType::Winners => write!(f, "winners"),
            BracketType::Losers => write!(f, "losers"),
            BracketType::Final => write!(f, "final"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Ongoing,
    Complete,
}

/// A single match between two teams. `team2_id` is `None` for a bye.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub game_id: String,
    pub bracket_type: BracketType,
    /// 1-based round within the bracket line.
    pub round: u32,
    /// 1-based, contiguous within (bracket_type, round).
    pub match_order: u32,
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
    /// Written by the scoring process; the engine only reads it.
    pub winner_team_id: Option<TeamId>,
    pub status: MatchStatus,
    pub rounds_per_match: u32,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub parent_match1_id: Option<MatchId>,
    pub parent_match2_id: Option<MatchId>,
}

impl Match {
    /// A playable match between two teams, pending a result.
    pub fn new(
        tournament: &Tournament,
        bracket_type: BracketType,
        round: u32,
        match_order: u32,
        team1: TeamId,
        team2: TeamId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id: tournament.id,
            game_id: tournament.game_id.clone(),
            bracket_type,
            round,
            match_order,
            team1_id: Some(team1),
            team2_id: Some(team2),
            winner_team_id: None,
            status: MatchStatus::Pending,
            rounds_per_match: tournament.rounds_per_match,
            scheduled_at: None,
            parent_match1_id: None,
            parent_match2_id: None,
        }
    }

    /// A bye: the lone team advances without play, so the match is born complete.
    pub fn bye(
        tournament: &Tournament,
        bracket_type: BracketType,
        round: u32,
        match_order: u32,
        team: TeamId,
    ) -> Self {
        Self {
            team2_id: None,
            winner_team_id: Some(team),
            status: MatchStatus::Complete,
            ..Self::new(tournament, bracket_type, round, match_order, team, team)
        }
    }

    pub fn with_parents(mut self, parent1: Option<MatchId>, parent2: Option<MatchId>) -> Self {
        self.parent_match1_id = parent1;
        self.parent_match2_id = parent2;
        self
    }

    pub fn scheduled(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.scheduled_at = at;
        self
    }

    pub fn is_bye(&self) -> bool {
        self.team1_id.is_some() != self.team2_id.is_some()
    }

    /// Both opponents are known, so the match can actually be played.
    pub fn is_resolvable(&self) -> bool {
        self.team1_id.is_some() && self.team2_id.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Complete && self.winner_team_id.is_some()
    }

    pub fn has_team(&self, team: TeamId) -> bool {
        self.team1_id == Some(team) || self.team2_id == Some(team)
    }

    /// The team that lost a completed, played match. Byes have no loser.
    pub fn loser(&self) -> Option<TeamId> {
        if !self.is_resolvable() || !self.is_complete() {
            return None;
        }
        if self.winner_team_id == self.team1_id {
            self.team2_id
        } else {
            self.team1_id
        }
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.team1_id.iter().chain(self.team2_id.iter()).copied()
    }

    /// The join row describing where this match sits in the bracket.
    pub fn link(&self) -> TournamentMatch {
        TournamentMatch {
            tournament_id: self.tournament_id,
            match_id: self.id,
            bracket_type: self.bracket_type,
            round: self.round,
            match_order: self.match_order,
            team1_id: self.team1_id,
            team2_id: self.team2_id,
        }
    }
}

/// Join row binding a match to its tournament slot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentMatch {
    pub tournament_id: TournamentId,
    pub match_id: MatchId,
    pub bracket_type: BracketType,
    pub round: u32,
    pub match_order: u32,
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
}

/// Links for a freshly generated batch, in the same order as the matches.
pub fn links_for(matches: &[Match]) -> Vec<TournamentMatch> {
    matches.iter().map(Match::link).collect()
}
