//! Bracket engine: builders, round progression, losers routing, grand finals.

mod advance;
mod bracket;
mod double_elimination;
mod grand_finals;
mod lineage;
mod losers_bracket;
mod progression;
mod single_elimination;

pub use advance::{advance, generate_bracket, Advance};
pub use double_elimination::{build_double_elimination, generate_double_elimination_matches};
pub use grand_finals::{
    check_grand_finals_reset, generate_grand_finals_match, generate_grand_finals_reset_match,
    needs_reset,
};
pub use lineage::{BracketGraph, Edge, LineageError, SlotKey};
pub use losers_bracket::{drop_in_round, feeding_winners_round, generate_losers_bracket_matches};
pub use progression::{
    generate_next_round_matches, get_current_round_info, is_round_complete, Progression,
};
pub use single_elimination::{build_single_elimination, generate_single_elimination_matches};
