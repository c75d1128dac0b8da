//! Double elimination: winners-bracket round 1 builder and the step planner used by `advance`.
//!
//! Only winners round 1 is built up front. Losers-bracket matches appear as winners rounds
//! finish, since where a team lands depends on the round it lost in.

use crate::logic::bracket::winners_line;
use crate::logic::grand_finals::generate_grand_finals_match;
use crate::logic::losers_bracket::{
    awaiting_drop_in, drop_in_round, losers_champion, route_winners_round,
};
use crate::logic::progression::{generate_next_round_matches, Progression};
use crate::logic::single_elimination::{build_single_elimination, start_bracket};
use crate::models::{
    BracketAssignment, BracketError, BracketType, Format, Match, Tournament, TournamentId,
};
use crate::store::{MatchStore, RoundInfo};
use chrono::{DateTime, Utc};

/// Build winners round 1. Pairing and byes are the same as single elimination.
pub fn build_double_elimination(
    tournament: &Tournament,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    build_single_elimination(tournament, assignments, start_time)
}

/// Build and persist winners round 1 for a double-elimination tournament.
pub fn generate_double_elimination_matches(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    start_bracket(store, tournament_id, Format::DoubleElimination, assignments, start_time)
}

/// Highest winners round whose losers are already in the losers bracket (0 if none).
fn last_routed_winners_round(max_losers_round: u32) -> u32 {
    match max_losers_round {
        0 => 0,
        1 => 1,
        l => l / 2 + 1,
    }
}

/// Next winners round ready to drop its losers in, if any.
fn routable_winners_round(info: &RoundInfo) -> Option<u32> {
    let r = last_routed_winners_round(info.max_losers_round) + 1;
    if r > info.max_winners_round {
        return None;
    }
    if r == info.max_winners_round && !info.winners_complete {
        return None;
    }
    if r > 1 && !(info.max_losers_round == drop_in_round(r) - 1 && info.losers_complete) {
        return None;
    }
    Some(r)
}

/// Next thing to do for a double-elimination bracket, or `None` while matches are unresolved.
///
/// Order: final line first, then routing finished winners rounds into the losers bracket,
/// the next winners round, the next losers round, and finally grand finals.
pub(crate) fn next_step(
    store: &dyn MatchStore,
    tournament: &Tournament,
) -> Result<Option<Progression>, BracketError> {
    let id = tournament.id;
    let info = store.get_current_round_info(id)?;

    if info.max_final_round > 0 {
        if !info.final_complete {
            return Ok(None);
        }
        return generate_next_round_matches(store, id, info.max_final_round, BracketType::Final)
            .map(Some);
    }

    if let Some(r) = routable_winners_round(&info) {
        let matches = route_winners_round(store, id, r)?;
        return Ok(Some(Progression::Generated { matches }));
    }

    let line = winners_line(store, id)?;
    if line.last_round_complete && !line.finished {
        return generate_next_round_matches(store, id, line.last_round, BracketType::Winners)
            .map(Some);
    }

    if info.max_losers_round == 0 || !info.losers_complete {
        return Ok(None);
    }
    if let Some((l_champ, _)) = losers_champion(store, id, &line)? {
        let Some(w_champ) = line.champion else {
            return Ok(None);
        };
        let matches = generate_grand_finals_match(store, id, w_champ, l_champ)?;
        return Ok(Some(Progression::Generated { matches }));
    }
    if awaiting_drop_in(&line, info.max_losers_round + 1).is_some() {
        return Ok(None);
    }
    generate_next_round_matches(store, id, info.max_losers_round, BracketType::Losers).map(Some)
}
