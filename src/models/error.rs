//! BracketError: everything the engine can refuse to do.

use crate::models::game::{MatchId, TeamId};
use crate::models::tournament::TournamentId;
use crate::store::StoreError;

/// Errors returned by bracket operations. All of them are recoverable by the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketError {
    /// Fewer than 2 teams assigned.
    InsufficientParticipants,
    /// Format string is not one of the supported eliminations.
    InvalidFormat(String),
    /// Matches already exist for this tournament (or this slot of it).
    AlreadyGenerated,
    /// Not every match of the round has a winner yet.
    RoundNotComplete,
    /// Grand finals requested before both bracket champions exist.
    BracketsNotComplete,
    /// The grand finals reset match was already created.
    ResetAlreadyGenerated,
    /// The winners-bracket champion won game 1, so there is nothing to reset.
    ResetNotRequired,
    /// Losers bracket can't move on until this winners round drops its losers in.
    AwaitingWinnersRound(u32),
    /// No matches have been generated yet.
    BracketNotStarted,
    /// The tournament already has a champion.
    TournamentAlreadyComplete,
    TournamentNotFound(TournamentId),
    TeamNotFound(TeamId),
    MatchNotFound(MatchId),
    /// Duplicate positions/teams or malformed import rows.
    InvalidAssignment(String),
    /// Tournament settings the engine can't schedule (e.g. zero games per match).
    InvalidTournament(String),
    Store(StoreError),
    /// The progression worker has shut down.
    WorkerUnavailable,
}

impl BracketError {
    /// HTTP status the calling layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            BracketError::TournamentNotFound(_)
            | BracketError::TeamNotFound(_)
            | BracketError::MatchNotFound(_) => 404,
            BracketError::Store(StoreError::MatchNotFound(_)) => 404,
            BracketError::Store(StoreError::InvalidResult(_))
            | BracketError::Store(StoreError::DuplicateSlot { .. }) => 400,
            BracketError::Store(_) | BracketError::WorkerUnavailable => 500,
            _ => 400,
        }
    }
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::InsufficientParticipants => {
                write!(f, "Need at least 2 teams to build a bracket")
            }
            BracketError::InvalidFormat(s) => write!(f, "Unsupported tournament format: {}", s),
            BracketError::AlreadyGenerated => write!(f, "Matches have already been generated"),
            BracketError::RoundNotComplete => {
                write!(f, "Not every match in the round has a winner")
            }
            BracketError::BracketsNotComplete => {
                write!(f, "Both bracket champions must be decided before grand finals")
            }
            BracketError::ResetAlreadyGenerated => {
                write!(f, "Grand finals reset was already generated")
            }
            BracketError::ResetNotRequired => {
                write!(f, "Winners bracket champion won the grand final; no reset needed")
            }
            BracketError::AwaitingWinnersRound(r) => {
                write!(f, "Losers bracket is waiting for winners round {} to finish", r)
            }
            BracketError::BracketNotStarted => write!(f, "No matches have been generated yet"),
            BracketError::TournamentAlreadyComplete => {
                write!(f, "Tournament is already complete")
            }
            BracketError::TournamentNotFound(id) => write!(f, "Tournament {} not found", id),
            BracketError::TeamNotFound(id) => write!(f, "Team {} not found in this bracket", id),
            BracketError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            BracketError::InvalidAssignment(msg) => write!(f, "Invalid assignment: {}", msg),
            BracketError::InvalidTournament(msg) => write!(f, "Invalid tournament: {}", msg),
            BracketError::Store(e) => write!(f, "Storage error: {}", e),
            BracketError::WorkerUnavailable => write!(f, "Progression worker is not running"),
        }
    }
}

impl std::error::Error for BracketError {}

impl From<StoreError> for BracketError {
    fn from(e: StoreError) -> Self {
        BracketError::Store(e)
    }
}
