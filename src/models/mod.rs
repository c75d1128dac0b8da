//! Data structures for the bracket engine: tournaments, assignments, matches, errors.

mod assignment;
mod error;
mod game;
mod tournament;

pub use assignment::{
    assignments_from_csv, ordered_assignments, shuffled_assignments, validate_assignments,
    BracketAssignment,
};
pub use error::BracketError;
pub use game::{links_for, BracketType, Match, MatchId, MatchStatus, TeamId, TournamentMatch};
pub use tournament::{Format, Tournament, TournamentId, TournamentStatus};
