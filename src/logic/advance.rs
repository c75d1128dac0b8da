//! Format dispatcher: run every progression step that is currently possible.

use crate::logic::bracket::load_tournament;
use crate::logic::progression::Progression;
use crate::logic::{double_elimination, single_elimination};
use crate::models::{BracketAssignment, BracketError, Format, Match, TeamId, TournamentId};
use crate::store::MatchStore;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What one `advance` call did.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Advance {
    /// Matches created during this call, in creation order.
    pub generated: Vec<Match>,
    /// Set once the tournament is complete (including when it already was).
    pub champion: Option<TeamId>,
}

impl Advance {
    /// Nothing could be generated; results are still outstanding.
    pub fn is_waiting(&self) -> bool {
        self.generated.is_empty() && self.champion.is_none()
    }
}

/// Build round 1 with whichever builder the tournament's format calls for.
pub fn generate_bracket(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    assignments: &[BracketAssignment],
    start_time: Option<DateTime<Utc>>,
) -> Result<Vec<Match>, BracketError> {
    let tournament = load_tournament(store, tournament_id)?;
    match tournament.format {
        Format::SingleElimination => single_elimination::generate_single_elimination_matches(
            store,
            tournament_id,
            assignments,
            start_time,
        ),
        Format::DoubleElimination => double_elimination::generate_double_elimination_matches(
            store,
            tournament_id,
            assignments,
            start_time,
        ),
    }
}

/// Progress a tournament as far as current results allow.
///
/// Steps are taken one at a time until none applies, so a chain such as
/// "winners round decided -> losers drop-in -> bye carried forward" resolves in one call.
pub fn advance(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<Advance, BracketError> {
    let mut out = Advance::default();
    loop {
        let tournament = load_tournament(store, tournament_id)?;
        if tournament.is_complete() {
            out.champion = tournament.champion;
            break;
        }
        if store.list_matches(tournament_id)?.is_empty() {
            return Err(BracketError::BracketNotStarted);
        }

        let step = match tournament.format {
            Format::SingleElimination => single_elimination::next_step(store, &tournament)?,
            Format::DoubleElimination => double_elimination::next_step(store, &tournament)?,
        };
        match step {
            Some(Progression::Generated { matches }) if !matches.is_empty() => {
                out.generated.extend(matches)
            }
            Some(Progression::TournamentComplete { champion }) => {
                out.champion = Some(champion);
                break;
            }
            Some(Progression::Generated { .. } | Progression::LineComplete { .. }) | None => break,
        }
    }
    log::debug!(
        "advance({}): {} new match(es), champion {:?}",
        tournament_id,
        out.generated.len(),
        out.champion
    );
    Ok(out)
}
