//! Single elimination: round-1 builder and the step planner used by `advance`.

use crate::logic::bracket::{
    load_open_tournament, pair_in_order, require_format, save_batch, Entrant,
};
use crate::logic::progression::{generate_next_round_matches, Progression};
use crate::models::{
    validate_assignments, BracketAssignment, BracketError, BracketType, Format, Match, Tournament,
    TournamentId, TournamentStatus,
};
use crate::store::MatchStore;
use chrono::{DateTime, Utc};

/// Build round-1 winners matches from an assignment list without touching storage.
///
/// Positions pair up as (0,1), (2,3), ... in ascending order; an odd last team gets a bye
/// that is already complete, so it advances to round 2 without a played match.
pub fn build_single_elimination(
    tournament: &Tournament,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    if assignments.len() < 2 {
        return Err(BracketError::InsufficientParticipants);
    }
    let sorted = validate_assignments(assignments)?;
    let entrants: Vec<Entrant> = sorted.iter().map(|a| Entrant::seeded(a.team_id)).collect();
    Ok(pair_in_order(tournament, BracketType::Winners, 1, &entrants)
        .into_iter()
        .map(|m| m.scheduled(start_time))
        .collect())
}

/// Build and persist round 1 for a single-elimination tournament, moving it to `battle`.
pub fn generate_single_elimination_matches(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    start_bracket(store, tournament_id, Format::SingleElimination, assignments, start_time)
}

/// Shared by both builders: every check happens before the one batch write.
pub(crate) fn start_bracket(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    format: Format,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    let mut tournament = load_open_tournament(store, tournament_id)?;
    require_format(&tournament, format)?;
    if tournament.status != TournamentStatus::Assign
        || !store.list_matches(tournament_id)?.is_empty()
    {
        return Err(BracketError::AlreadyGenerated);
    }
    let start_time = start_time.or(tournament.scheduled_start);
    let matches = match format {
        Format::SingleElimination => {
            build_single_elimination(&tournament, assignments, start_time)?
        }
        Format::DoubleElimination => {
            crate::logic::double_elimination::build_double_elimination(
                &tournament,
                assignments,
                start_time,
            )?
        }
    };
    save_batch(store, &matches)?;

    tournament.status = TournamentStatus::Battle;
    tournament.scheduled_start = start_time;
    store.update_tournament(&tournament)?;
    log::info!(
        "Generated {} bracket for tournament {}: {} teams, {} round-1 match(es)",
        format,
        tournament_id,
        assignments.len(),
        matches.len()
    );
    Ok(matches)
}

/// Next thing to do for a single-elimination bracket, or `None` while matches are unresolved.
pub(crate) fn next_step(
    store: &dyn MatchStore,
    tournament: &Tournament,
) -> Result<Option<Progression>, BracketError> {
    let info = store.get_current_round_info(tournament.id)?;
    if !info.winners_complete {
        return Ok(None);
    }
    generate_next_round_matches(store, tournament.id, info.max_winners_round, BracketType::Winners)
        .map(Some)
}
