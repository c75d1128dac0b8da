//! Losers bracket routing for double elimination.
//!
//! Teams knocked out of winners round R drop into losers round `drop_in_round(R)`:
//! round 1 for R = 1, then 2R - 2. Those drop-in rounds mix the new arrivals with the
//! survivors of the previous losers round; the odd rounds from 3 on are consolidation
//! rounds that only pair survivors. Checked against 4, 8 and 16 teams this is the usual
//! bracket shape (L1 and L2 take W1/W2 losers, L3 consolidates, L4 takes W3 losers, ...).

use crate::logic::bracket::{
    load_open_tournament, pair_in_order, require_format, round_is_complete, round_losers,
    round_winners, save_batch, Entrant, WinnersLine,
};
use crate::models::{BracketError, BracketType, Format, Match, MatchId, TeamId, TournamentId};
use crate::store::MatchStore;

/// Losers round that receives the teams eliminated in winners round `winners_round`.
pub fn drop_in_round(winners_round: u32) -> u32 {
    if winners_round <= 1 {
        1
    } else {
        2 * winners_round - 2
    }
}

/// Winners round feeding a losers round, if that losers round is a drop-in round.
pub fn feeding_winners_round(losers_round: u32) -> Option<u32> {
    match losers_round {
        0 => None,
        1 => Some(1),
        l if l % 2 == 0 => Some(l / 2 + 1),
        _ => None,
    }
}

/// More teams will still drop in after losers round `losers_round`.
pub(crate) fn drop_ins_pending(line: &WinnersLine, losers_round: u32) -> bool {
    !(line.finished && drop_in_round(line.last_round) <= losers_round)
}

/// The winners round that losers round `next_round` must wait for, if any.
/// `None` when `next_round` is a consolidation round or no winners round will feed it.
pub(crate) fn awaiting_drop_in(line: &WinnersLine, next_round: u32) -> Option<u32> {
    let r = feeding_winners_round(next_round)?;
    if line.finished && line.last_round < r {
        None
    } else {
        Some(r)
    }
}

/// Fold teams eliminated in winners round `source_winners_round` into the losers bracket.
///
/// `eliminated_team_ids` must be exactly the teams that lost a played match in that round.
/// They meet the survivors of the previous losers round, arrivals in reverse order so the
/// first survivor faces the last arrival; leftovers pair in order and an odd one out gets a bye.
pub fn generate_losers_bracket_matches(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    source_winners_round: u32,
    eliminated_team_ids: &[TeamId],
) -> Result<Vec<Match>, BracketError> {
    let tournament = load_open_tournament(store, tournament_id)?;
    require_format(&tournament, Format::DoubleElimination)?;

    let source = store.list_round(tournament_id, BracketType::Winners, source_winners_round)?;
    if !round_is_complete(&source) {
        return Err(BracketError::RoundNotComplete);
    }
    let dropped = order_eliminated(&source, eliminated_team_ids)?;

    let target = drop_in_round(source_winners_round);
    if !store
        .list_round(tournament_id, BracketType::Losers, target)?
        .is_empty()
    {
        return Err(BracketError::AlreadyGenerated);
    }

    let survivors = if target > 1 {
        let previous = store.list_round(tournament_id, BracketType::Losers, target - 1)?;
        if !round_is_complete(&previous) {
            return Err(BracketError::RoundNotComplete);
        }
        round_winners(&previous)
    } else {
        Vec::new()
    };

    let entrants = interleave(&survivors, &dropped);
    let matches = pair_in_order(&tournament, BracketType::Losers, target, &entrants);
    save_batch(store, &matches)?;
    log::info!(
        "Routed {} team(s) from winners round {} into losers round {} of tournament {} \
         ({} match(es))",
        dropped.len(),
        source_winners_round,
        target,
        tournament_id,
        matches.len()
    );
    Ok(matches)
}

/// Route every loser of a winners round (what `advance` does once the round is decided).
pub(crate) fn route_winners_round(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    winners_round: u32,
) -> Result<Vec<Match>, BracketError> {
    let source = store.list_round(tournament_id, BracketType::Winners, winners_round)?;
    let losers: Vec<TeamId> = round_losers(&source).iter().map(|e| e.team).collect();
    generate_losers_bracket_matches(store, tournament_id, winners_round, &losers)
}

/// Check the caller's list against who actually lost, and attach each team's source match.
fn order_eliminated(source: &[Match], eliminated: &[TeamId]) -> Result<Vec<Entrant>, BracketError> {
    let actual = round_losers(source);
    for &team in eliminated {
        if !actual.iter().any(|e| e.team == team) {
            return Err(BracketError::TeamNotFound(team));
        }
    }
    if let Some(missing) = actual.iter().find(|e| !eliminated.contains(&e.team)) {
        return Err(BracketError::InvalidAssignment(format!(
            "team {} lost in this winners round but was not routed",
            missing.team
        )));
    }
    Ok(actual)
}

/// Survivor i meets arrival n-1-i; whoever is left over follows in order.
fn interleave(survivors: &[Entrant], dropped: &[Entrant]) -> Vec<Entrant> {
    if survivors.is_empty() {
        return dropped.to_vec();
    }
    let arrivals: Vec<Entrant> = dropped.iter().rev().copied().collect();
    let crossed = survivors.len().min(arrivals.len());
    let mut out = Vec::with_capacity(survivors.len() + arrivals.len());
    for i in 0..crossed {
        out.push(survivors[i]);
        out.push(arrivals[i]);
    }
    out.extend_from_slice(&survivors[crossed..]);
    out.extend_from_slice(&arrivals[crossed..]);
    log::debug!(
        "Losers drop-in: {} survivor(s), {} arrival(s), {} crossed pair(s)",
        survivors.len(),
        arrivals.len(),
        crossed
    );
    out
}

/// The losers-bracket champion, once the line is down to one team and nobody else can drop in.
pub(crate) fn losers_champion(
    store: &dyn MatchStore,
    tournament_id: TournamentId,
    line: &WinnersLine,
) -> Result<Option<(TeamId, MatchId)>, BracketError> {
    let info = store.get_current_round_info(tournament_id)?;
    if info.max_losers_round == 0 || !info.losers_complete {
        return Ok(None);
    }
    if drop_ins_pending(line, info.max_losers_round) {
        return Ok(None);
    }
    let last = store.list_round(tournament_id, BracketType::Losers, info.max_losers_round)?;
    match round_winners(&last).as_slice() {
        [only] => Ok(only.source.map(|m| (only.team, m))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_in_rounds_follow_the_standard_shape() {
        let rounds: Vec<u32> = (1..=5).map(drop_in_round).collect();
        assert_eq!(rounds, vec![1, 2, 4, 6, 8]);
        for r in 1..=8 {
            assert_eq!(feeding_winners_round(drop_in_round(r)), Some(r));
        }
        assert_eq!(feeding_winners_round(3), None);
        assert_eq!(feeding_winners_round(5), None);
    }

    #[test]
    fn pending_until_the_winners_final_has_dropped_in() {
        let line = WinnersLine {
            last_round: 3,
            last_round_complete: true,
            finished: true,
            ..Default::default()
        };
        assert!(drop_ins_pending(&line, 3));
        assert!(!drop_ins_pending(&line, 4));
        assert_eq!(awaiting_drop_in(&line, 4), Some(3));
        assert_eq!(awaiting_drop_in(&line, 6), None);
        assert_eq!(awaiting_drop_in(&line, 5), None);
    }
}
