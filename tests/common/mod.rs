//! Shared setup for the integration tests.
#![allow(dead_code)]

use bracket_engine_web::{
    advance, ordered_assignments, BracketType, Format, Match, MatchStore, MemoryStore, TeamId,
    Tournament, TournamentId,
};
use std::collections::HashMap;
use uuid::Uuid;

pub fn teams(n: usize) -> Vec<TeamId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

/// A fresh store holding one tournament of the given format.
pub fn store_with(format: Format) -> (MemoryStore, TournamentId) {
    let store = MemoryStore::new();
    let t = Tournament::new("Friday Cup", format, "rocket-league", 3);
    let id = store.create_tournament(t).unwrap();
    (store, id)
}

/// Store, tournament, teams, and round 1 already generated in team order.
pub fn started(format: Format, n: usize) -> (MemoryStore, TournamentId, Vec<TeamId>) {
    let (store, id) = store_with(format);
    let roster = teams(n);
    bracket_engine_web::generate_bracket(&store, id, &ordered_assignments(&roster), None).unwrap();
    (store, id, roster)
}

pub fn round(store: &MemoryStore, id: TournamentId, bt: BracketType, r: u32) -> Vec<Match> {
    store.list_round(id, bt, r).unwrap()
}

/// Matches waiting for a result.
pub fn playable(store: &MemoryStore, id: TournamentId) -> Vec<Match> {
    store
        .list_matches(id)
        .unwrap()
        .into_iter()
        .filter(|m| m.is_resolvable() && !m.is_complete())
        .collect()
}

pub fn team1_wins(m: &Match) -> TeamId {
    m.team1_id.unwrap()
}

pub fn team2_wins(m: &Match) -> TeamId {
    m.team2_id.unwrap()
}

/// Alternate by round so both sides of the bracket see upsets.
pub fn alternating(m: &Match) -> TeamId {
    if (m.round + m.match_order) % 2 == 0 {
        m.team1_id.unwrap()
    } else {
        m.team2_id.unwrap()
    }
}

/// Score every playable match with `pick` and advance until a champion emerges.
pub fn run_to_completion(
    store: &MemoryStore,
    id: TournamentId,
    pick: impl Fn(&Match) -> TeamId,
) -> TeamId {
    for _ in 0..1000 {
        let adv = advance(store, id).unwrap();
        if let Some(champion) = adv.champion {
            return champion;
        }
        let pending = playable(store, id);
        assert!(!pending.is_empty(), "bracket stalled with nothing to play");
        for m in pending {
            store.record_result(m.id, pick(&m)).unwrap();
        }
    }
    panic!("tournament did not finish");
}

/// Played-match losses per team.
pub fn losses(matches: &[Match]) -> HashMap<TeamId, u32> {
    let mut out = HashMap::new();
    for m in matches {
        if let Some(l) = m.loser() {
            *out.entry(l).or_insert(0) += 1;
        }
    }
    out
}
