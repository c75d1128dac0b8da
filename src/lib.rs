//! Tournament bracket engine: library with models, engine logic, persistence gateway and the
//! progression worker. The `web` binary serves it over REST.

pub mod logic;
pub mod models;
pub mod store;
pub mod worker;

pub use logic::{
    advance, build_double_elimination, build_single_elimination, check_grand_finals_reset,
    drop_in_round, generate_bracket, generate_double_elimination_matches,
    generate_grand_finals_match, generate_grand_finals_reset_match,
    generate_losers_bracket_matches, generate_next_round_matches,
    generate_single_elimination_matches, get_current_round_info, is_round_complete, needs_reset,
    Advance, BracketGraph, LineageError, Progression, SlotKey,
};
pub use models::{
    assignments_from_csv, ordered_assignments, shuffled_assignments, BracketAssignment,
    BracketError, BracketType, Format, Match, MatchId, MatchStatus, TeamId, Tournament,
    TournamentId, TournamentMatch, TournamentStatus,
};
pub use store::{MatchStore, MemoryStore, RoundInfo, StoreError};
pub use worker::{progression_channel, ProgressionHandle, ProgressionWorker};
