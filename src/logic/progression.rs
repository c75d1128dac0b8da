//! Round progression: round completion checks and next-round generation within one bracket line.

use crate::logic::bracket::{
    complete_tournament, load_open_tournament, load_tournament, pair_in_order, round_is_complete,
    round_winners, save_batch, winners_line,
};
use crate::logic::{grand_finals, losers_bracket};
use crate::models::{BracketError, BracketType, Format, Match, TeamId, TournamentId};
use crate::store::{MatchStore, RoundInfo};
use serde::Serialize;

/// Outcome of progressing a completed round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Progression {
    /// New matches were created (and persisted).
    Generated { matches: Vec<Match> },
    /// The bracket line is down to one team; nothing further to play on it.
    LineComplete {
        bracket_type: BracketType,
        champion: TeamId,
    },
    /// The whole tournament is decided.
    TournamentComplete { champion: TeamId },
}

impl Progression {
    pub fn generated(&self) -> &[Match] {
        match self {
            Progression::Generated { matches } => matches,
            _ => &[],
        }
    }
}

/// True iff the round has matches and every one of them is complete with a winner.
/// Byes are created complete, so they count immediately.
pub fn is_round_complete(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    round: u32,
    bracket_type: BracketType,
) -> Result<bool, BracketError> {
    load_tournament(store, tournament_id)?;
    Ok(round_is_complete(&store.list_round(tournament_id, bracket_type, round)?))
}

pub fn get_current_round_info(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<RoundInfo, BracketError> {
    load_tournament(store, tournament_id)?;
    Ok(store.get_current_round_info(tournament_id)?)
}

/// Create the next round of the same bracket line from a completed round.
///
/// Winners of matches k and k+1 (in match order) meet in the next round; an odd one out gets a
/// bye. When a single team remains the line is finished and no match is emitted. This does not
/// deduplicate: callers check for existing next-round rows first, and the store's slot
/// uniqueness rejects a concurrent duplicate.
pub fn generate_next_round_matches(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    round: u32,
    bracket_type: BracketType,
) -> Result<Progression, BracketError> {
    let mut tournament = load_open_tournament(store, tournament_id)?;
    let current = store.list_round(tournament_id, bracket_type, round)?;
    if current.is_empty() && store.list_matches(tournament_id)?.is_empty() {
        return Err(BracketError::BracketNotStarted);
    }
    if !round_is_complete(&current) {
        return Err(BracketError::RoundNotComplete);
    }

    if bracket_type == BracketType::Final {
        return grand_finals::progress_final_line(store, &mut tournament, &current);
    }

    let winners = round_winners(&current);
    let mut carry_lone_survivor = false;
    if bracket_type == BracketType::Losers {
        let line = winners_line(store, tournament_id)?;
        if let Some(r) = losers_bracket::awaiting_drop_in(&line, round + 1) {
            return Err(BracketError::AwaitingWinnersRound(r));
        }
        carry_lone_survivor = losers_bracket::drop_ins_pending(&line, round);
    }

    if winners.len() == 1 && !carry_lone_survivor {
        let champion = winners[0].team;
        return match (tournament.format, bracket_type) {
            (Format::SingleElimination, BracketType::Winners) => {
                complete_tournament(store, &mut tournament, champion)?;
                Ok(Progression::TournamentComplete { champion })
            }
            _ => {
                log::info!(
                    "{} bracket of tournament {} finished with {}",
                    bracket_type,
                    tournament_id,
                    champion
                );
                Ok(Progression::LineComplete {
                    bracket_type,
                    champion,
                })
            }
        };
    }

    let next = pair_in_order(&tournament, bracket_type, round + 1, &winners);
    save_batch(store, &next)?;
    log::info!(
        "Generated {} round {} for tournament {}: {} match(es)",
        bracket_type,
        round + 1,
        tournament_id,
        next.len()
    );
    Ok(Progression::Generated { matches: next })
}
