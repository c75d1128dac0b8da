//! Grand finals: winners-bracket champion vs losers-bracket champion, plus the bracket reset.
//!
//! Final line states: no final -> game 1 pending -> game 1 complete, then either the tournament
//! completes (winners champion won) or the reset is pending -> reset complete -> tournament
//! complete.

use crate::logic::bracket::{
    complete_tournament, load_open_tournament, load_tournament, require_format,
    round_is_complete, save_batch, winners_line,
};
use crate::logic::losers_bracket::losers_champion;
use crate::logic::progression::Progression;
use crate::models::{BracketError, BracketType, Format, Match, TeamId, Tournament, TournamentId};
use crate::store::MatchStore;

/// Rounds of the final line.
const GAME_ONE: u32 = 1;
const RESET: u32 = 2;

/// Double elimination: the winners champion is unbeaten, so a loss in game 1 is their first and
/// forces a deciding rematch. True iff the losers-bracket champion won game 1.
pub fn needs_reset(final_winner_id: TeamId, losers_bracket_champion_id: TeamId) -> bool {
    final_winner_id == losers_bracket_champion_id
}

/// Create grand finals game 1 (final line, round 1, match order 1).
pub fn generate_grand_finals_match(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    winners_bracket_champion: TeamId,
    losers_bracket_champion: TeamId,
) -> Result<Vec<Match>, BracketError> {
    let tournament = load_open_tournament(store, tournament_id)?;
    require_format(&tournament, Format::DoubleElimination)?;
    if !store
        .list_round(tournament_id, BracketType::Final, GAME_ONE)?
        .is_empty()
    {
        return Err(BracketError::AlreadyGenerated);
    }

    let all = store.list_matches(tournament_id)?;
    for team in [winners_bracket_champion, losers_bracket_champion] {
        if !all.iter().any(|m| m.has_team(team)) {
            return Err(BracketError::TeamNotFound(team));
        }
    }

    let line = winners_line(store, tournament_id)?;
    let (Some(w_champ), Some(w_final)) = (line.champion, line.final_match) else {
        return Err(BracketError::BracketsNotComplete);
    };
    let Some((l_champ, l_final)) = losers_champion(store, tournament_id, &line)? else {
        return Err(BracketError::BracketsNotComplete);
    };
    if w_champ != winners_bracket_champion || l_champ != losers_bracket_champion {
        return Err(BracketError::BracketsNotComplete);
    }

    let game = Match::new(&tournament, BracketType::Final, GAME_ONE, 1, w_champ, l_champ)
        .with_parents(Some(w_final), Some(l_final));
    let matches = vec![game];
    save_batch(store, &matches)?;
    log::info!(
        "Grand finals for tournament {}: {} vs {}",
        tournament_id,
        w_champ,
        l_champ
    );
    Ok(matches)
}

/// Whether game 1 calls for a reset. Both teams must be the ones playing game 1, it must be
/// decided, and the arguments must agree with the stored row: `final_winner_id` is the recorded
/// winner and `losers_bracket_champion_id` sits in the losers-champion seat (team 2).
pub fn check_grand_finals_reset(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    final_winner_id: TeamId,
    losers_bracket_champion_id: TeamId,
) -> Result<bool, BracketError> {
    load_tournament(store, tournament_id)?;
    let game_one = store.list_round(tournament_id, BracketType::Final, GAME_ONE)?;
    let Some(m) = game_one.first() else {
        return Err(BracketError::BracketsNotComplete);
    };
    for team in [final_winner_id, losers_bracket_champion_id] {
        if !m.has_team(team) {
            return Err(BracketError::TeamNotFound(team));
        }
    }
    if !m.is_complete() {
        return Err(BracketError::RoundNotComplete);
    }
    if m.winner_team_id != Some(final_winner_id) || m.team2_id != Some(losers_bracket_champion_id)
    {
        return Err(BracketError::BracketsNotComplete);
    }
    Ok(needs_reset(final_winner_id, losers_bracket_champion_id))
}

/// Create the winner-take-all reset (final line, round 2). Only ever once per tournament.
pub fn generate_grand_finals_reset_match(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
) -> Result<Vec<Match>, BracketError> {
    if !store
        .list_round(tournament_id, BracketType::Final, RESET)?
        .is_empty()
    {
        return Err(BracketError::ResetAlreadyGenerated);
    }
    let tournament = load_open_tournament(store, tournament_id)?;
    let game_one = store.list_round(tournament_id, BracketType::Final, GAME_ONE)?;
    let Some(m) = game_one.first() else {
        return Err(BracketError::BracketsNotComplete);
    };
    reset_from_game_one(store, &tournament, m)
}

fn reset_from_game_one(
    store: &dyn MatchStore,
    tournament: &Tournament,
    game_one: &Match,
) -> Result<Vec<Match>, BracketError> {
    let (Some(w_champ), Some(l_champ)) = (game_one.team1_id, game_one.team2_id) else {
        return Err(BracketError::BracketsNotComplete);
    };
    let Some(winner) = game_one.winner_team_id.filter(|_| game_one.is_complete()) else {
        return Err(BracketError::RoundNotComplete);
    };
    if !needs_reset(winner, l_champ) {
        return Err(BracketError::ResetNotRequired);
    }
    let reset = Match::new(tournament, BracketType::Final, RESET, 1, w_champ, l_champ)
        .with_parents(Some(game_one.id), None);
    let matches = vec![reset];
    save_batch(store, &matches)?;
    log::info!(
        "Bracket reset for tournament {}: {} beat the unbeaten {}",
        tournament.id,
        l_champ,
        w_champ
    );
    Ok(matches)
}

/// Progress a completed final-line round: game 1 either ends the tournament or produces the
/// reset; the reset always ends it.
pub(crate) fn progress_final_line(
    store: &dyn MatchStore,
    tournament: &mut Tournament,
    round_matches: &[Match],
) -> Result<Progression, BracketError> {
    if !round_is_complete(round_matches) {
        return Err(BracketError::RoundNotComplete);
    }
    let m = &round_matches[0];
    let winner = m.winner_team_id.ok_or(BracketError::RoundNotComplete)?;
    if m.round == GAME_ONE {
        let l_champ = m.team2_id.ok_or(BracketError::BracketsNotComplete)?;
        if needs_reset(winner, l_champ) {
            let matches = generate_grand_finals_reset_match(store, tournament.id)?;
            return Ok(Progression::Generated { matches });
        }
    }
    complete_tournament(store, tournament, winner)?;
    Ok(Progression::TournamentComplete { champion: winner })
}
