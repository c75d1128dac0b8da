//! Helpers shared by the builders and the progression engine.

use crate::models::{
    links_for, BracketError, BracketType, Format, Match, MatchId, TeamId, Tournament, TournamentId,
};
use crate::store::MatchStore;

/// A team about to be placed in a match, with the match it came out of (if any).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Entrant {
    pub team: TeamId,
    pub source: Option<MatchId>,
}

impl Entrant {
    pub fn seeded(team: TeamId) -> Self {
        Self { team, source: None }
    }

    pub fn from_match(team: TeamId, source: MatchId) -> Self {
        Self {
            team,
            source: Some(source),
        }
    }
}

/// Pair entrants two at a time in order; an odd last entrant gets a bye.
/// Match orders start at 1.
pub(crate) fn pair_in_order(
    tournament: &Tournament,
    bracket_type: BracketType,
    round: u32,
    entrants: &[Entrant],
) -> Vec<Match> {
    entrants
        .chunks(2)
        .enumerate()
        .map(|(i, chunk)| {
            let order = i as u32 + 1;
            match chunk {
                [a, b] => Match::new(tournament, bracket_type, round, order, a.team, b.team)
                    .with_parents(a.source, b.source),
                [a] => Match::bye(tournament, bracket_type, round, order, a.team)
                    .with_parents(a.source, None),
                _ => unreachable!("chunks(2) yields one or two entrants"),
            }
        })
        .collect()
}

/// Winners of a completed round as entrants for the next one, in match order.
pub(crate) fn round_winners(round_matches: &[Match]) -> Vec<Entrant> {
    round_matches
        .iter()
        .filter_map(|m| m.winner_team_id.map(|w| Entrant::from_match(w, m.id)))
        .collect()
}

/// Losers of a completed round, in match order. Byes contribute nobody.
pub(crate) fn round_losers(round_matches: &[Match]) -> Vec<Entrant> {
    round_matches
        .iter()
        .filter_map(|m| m.loser().map(|l| Entrant::from_match(l, m.id)))
        .collect()
}

pub(crate) fn round_is_complete(round_matches: &[Match]) -> bool {
    !round_matches.is_empty() && round_matches.iter().all(Match::is_complete)
}

pub(crate) fn load_tournament(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<Tournament, BracketError> {
    store
        .get_tournament(tournament_id)?
        .ok_or(BracketError::TournamentNotFound(tournament_id))
}

/// Load a tournament that may still receive matches.
pub(crate) fn load_open_tournament(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<Tournament, BracketError> {
    let t = load_tournament(store, tournament_id)?;
    t.ensure_open()?;
    Ok(t)
}

pub(crate) fn require_format(tournament: &Tournament, format: Format) -> Result<(), BracketError> {
    if tournament.format != format {
        return Err(BracketError::InvalidFormat(tournament.format.to_string()));
    }
    Ok(())
}

/// Persist a batch together with its link rows.
pub(crate) fn save_batch(store: &dyn MatchStore, matches: &[Match]) -> Result<(), BracketError> {
    if matches.is_empty() {
        return Ok(());
    }
    store.save_generated_matches(matches, &links_for(matches))?;
    Ok(())
}

/// Record the champion and close the tournament.
pub(crate) fn complete_tournament(
    store: &dyn MatchStore,
    tournament: &mut Tournament,
    champion: TeamId,
) -> Result<(), BracketError> {
    tournament.complete(champion);
    store.update_tournament(tournament)?;
    log::info!("Tournament {} complete, champion {}", tournament.id, champion);
    Ok(())
}

/// Where the winners bracket stands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct WinnersLine {
    /// Highest winners round generated.
    pub last_round: u32,
    /// Every match of `last_round` has a winner.
    pub last_round_complete: bool,
    /// The last round was a single played match that has been decided.
    pub finished: bool,
    pub champion: Option<TeamId>,
    /// The winners final, once `finished`.
    pub final_match: Option<MatchId>,
}

pub(crate) fn winners_line(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<WinnersLine, BracketError> {
    let info = store.get_current_round_info(tournament_id)?;
    if info.max_winners_round == 0 {
        return Ok(WinnersLine::default());
    }
    let last = store.list_round(tournament_id, BracketType::Winners, info.max_winners_round)?;
    let complete = round_is_complete(&last);
    let finished = complete && last.len() == 1 && last[0].is_resolvable();
    Ok(WinnersLine {
        last_round: info.max_winners_round,
        last_round_complete: complete,
        finished,
        champion: if finished { last[0].winner_team_id } else { None },
        final_match: if finished { Some(last[0].id) } else { None },
    })
}
