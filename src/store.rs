//! Persistence gateway the engine reads and writes through.
//!
//! The engine owns no state: tournaments and matches live behind [`MatchStore`], which the
//! calling application implements over its database. [`MemoryStore`] is the in-process
//! implementation used by the web binary and the tests; it also plays the part of the
//! external scoring process via [`MemoryStore::record_result`].

use crate::models::{
    BracketType, Match, MatchId, MatchStatus, TeamId, Tournament, TournamentId, TournamentMatch,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Errors raised by a gateway implementation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    /// Uniqueness constraint on (tournament, round, bracket type, match order).
    DuplicateSlot {
        bracket_type: BracketType,
        round: u32,
        match_order: u32,
    },
    /// A batch's link rows don't line up with its matches.
    MissingLink(MatchId),
    MatchNotFound(MatchId),
    /// A scoring update that doesn't fit the match (unknown winner, already decided, bye).
    InvalidResult(String),
    /// A writer panicked while holding the lock.
    Poisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateSlot {
                bracket_type,
                round,
                match_order,
            } => write!(
                f,
                "A {} match already exists at round {} order {}",
                bracket_type, round, match_order
            ),
            StoreError::MissingLink(id) => write!(f, "No bracket link row for match {}", id),
            StoreError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            StoreError::InvalidResult(msg) => write!(f, "Invalid result: {}", msg),
            StoreError::Poisoned => write!(f, "lock error"),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only summary of how far each bracket line has progressed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundInfo {
    /// Highest winners round generated (0 if none).
    pub max_winners_round: u32,
    pub max_losers_round: u32,
    pub max_final_round: u32,
    /// Every match of the highest winners round has a winner.
    pub winners_complete: bool,
    pub losers_complete: bool,
    pub final_complete: bool,
}

impl RoundInfo {
    /// Summarize a tournament's matches.
    pub fn from_matches(matches: &[Match]) -> Self {
        let max_round = |bt: BracketType| {
            matches
                .iter()
                .filter(|m| m.bracket_type == bt)
                .map(|m| m.round)
                .max()
                .unwrap_or(0)
        };
        let complete = |bt: BracketType, round: u32| {
            round > 0
                && matches
                    .iter()
                    .filter(|m| m.bracket_type == bt && m.round == round)
                    .all(Match::is_complete)
        };
        let max_winners_round = max_round(BracketType::Winners);
        let max_losers_round = max_round(BracketType::Losers);
        let max_final_round = max_round(BracketType::Final);
        Self {
            max_winners_round,
            max_losers_round,
            max_final_round,
            winners_complete: complete(BracketType::Winners, max_winners_round),
            losers_complete: complete(BracketType::Losers, max_losers_round),
            final_complete: complete(BracketType::Final, max_final_round),
        }
    }
}

/// Gateway over the application's tournament and match tables.
pub trait MatchStore: Send + Sync {
    fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()>;

    fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// All matches of a tournament, any bracket line, any order.
    fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>>;

    /// Persist a batch of new matches and their link rows. All-or-nothing.
    fn save_generated_matches(
        &self,
        matches: &[Match],
        links: &[TournamentMatch],
    ) -> StoreResult<()>;

    /// Overwrite an existing match row (winner/status updates).
    fn update_match(&self, m: &Match) -> StoreResult<()>;

    /// One round of one bracket line, ordered by match order.
    fn list_round(
        &self,
        tournament_id: TournamentId,
        bracket_type: BracketType,
        round: u32,
    ) -> StoreResult<Vec<Match>> {
        let mut round_matches: Vec<Match> = self
            .list_matches(tournament_id)?
            .into_iter()
            .filter(|m| m.bracket_type == bracket_type && m.round == round)
            .collect();
        round_matches.sort_by_key(|m| m.match_order);
        Ok(round_matches)
    }

    fn get_current_round_info(&self, tournament_id: TournamentId) -> StoreResult<RoundInfo> {
        Ok(RoundInfo::from_matches(&self.list_matches(tournament_id)?))
    }
}

#[derive(Default)]
struct Inner {
    tournaments: HashMap<TournamentId, Tournament>,
    matches: Vec<Match>,
    links: Vec<TournamentMatch>,
}

/// In-memory gateway: everything behind one `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tournament (the application's "create tournament" step).
    pub fn create_tournament(&self, tournament: Tournament) -> StoreResult<TournamentId> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let id = tournament.id;
        g.tournaments.insert(id, tournament);
        Ok(id)
    }

    pub fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.tournaments.values().cloned().collect())
    }

    /// Link rows of a tournament, in insertion order.
    pub fn list_links(&self, tournament_id: TournamentId) -> StoreResult<Vec<TournamentMatch>> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.links
            .iter()
            .filter(|l| l.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    /// Move a pending match to ongoing (play has started).
    pub fn start_match(&self, match_id: MatchId) -> StoreResult<Match> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let m = g
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(StoreError::MatchNotFound(match_id))?;
        if m.status != MatchStatus::Pending || !m.is_resolvable() {
            return Err(StoreError::InvalidResult("match is not waiting to start".to_string()));
        }
        m.status = MatchStatus::Ongoing;
        Ok(m.clone())
    }

    /// Scoring: set the winner of a playable match and mark it complete.
    pub fn record_result(&self, match_id: MatchId, winner: TeamId) -> StoreResult<Match> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let m = g
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(StoreError::MatchNotFound(match_id))?;
        if !m.is_resolvable() {
            return Err(StoreError::InvalidResult("byes advance without a result".to_string()));
        }
        if m.status == MatchStatus::Complete {
            return Err(StoreError::InvalidResult("match already has a winner".to_string()));
        }
        if !m.has_team(winner) {
            return Err(StoreError::InvalidResult(format!(
                "team {} is not playing in this match",
                winner
            )));
        }
        m.winner_team_id = Some(winner);
        m.status = MatchStatus::Complete;
        Ok(m.clone())
    }
}

impl MatchStore for MemoryStore {
    fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.tournaments.get(&id).cloned())
    }

    fn update_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        g.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.matches.iter().find(|m| m.id == id).cloned())
    }

    fn list_matches(&self, tournament_id: TournamentId) -> StoreResult<Vec<Match>> {
        let g = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(g.matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    fn save_generated_matches(
        &self,
        matches: &[Match],
        links: &[TournamentMatch],
    ) -> StoreResult<()> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        // Validate the whole batch before touching anything.
        let linked: HashSet<MatchId> = links.iter().map(|l| l.match_id).collect();
        let mut taken: HashSet<(TournamentId, BracketType, u32, u32)> = g
            .matches
            .iter()
            .map(|m| (m.tournament_id, m.bracket_type, m.round, m.match_order))
            .collect();
        for m in matches {
            if !linked.contains(&m.id) {
                return Err(StoreError::MissingLink(m.id));
            }
            if !taken.insert((m.tournament_id, m.bracket_type, m.round, m.match_order)) {
                return Err(StoreError::DuplicateSlot {
                    bracket_type: m.bracket_type,
                    round: m.round,
                    match_order: m.match_order,
                });
            }
        }

        g.matches.extend(matches.iter().cloned());
        g.links.extend(links.iter().cloned());
        Ok(())
    }

    fn update_match(&self, m: &Match) -> StoreResult<()> {
        let mut g = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let slot = g
            .matches
            .iter_mut()
            .find(|x| x.id == m.id)
            .ok_or(StoreError::MatchNotFound(m.id))?;
        *slot = m.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Format;
    use uuid::Uuid;

    fn two_team_match(store: &MemoryStore) -> (Tournament, Match) {
        let t = Tournament::new("Cup", Format::SingleElimination, "chess", 1);
        store.create_tournament(t.clone()).unwrap();
        let m = Match::new(&t, BracketType::Winners, 1, 1, Uuid::new_v4(), Uuid::new_v4());
        store.save_generated_matches(&[m.clone()], &[m.link()]).unwrap();
        (t, m)
    }

    #[test]
    fn duplicate_slot_rejects_whole_batch() {
        let store = MemoryStore::new();
        let (t, _) = two_team_match(&store);
        let fresh = Match::new(&t, BracketType::Winners, 1, 2, Uuid::new_v4(), Uuid::new_v4());
        let clash = Match::new(&t, BracketType::Winners, 1, 1, Uuid::new_v4(), Uuid::new_v4());
        let batch = vec![fresh, clash];
        let err = store
            .save_generated_matches(&batch, &crate::models::links_for(&batch))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSlot { round: 1, match_order: 1, .. }));
        assert_eq!(store.list_matches(t.id).unwrap().len(), 1);
    }

    #[test]
    fn batch_without_links_is_rejected() {
        let store = MemoryStore::new();
        let (t, _) = two_team_match(&store);
        let m = Match::new(&t, BracketType::Winners, 2, 1, Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            store.save_generated_matches(&[m.clone()], &[]),
            Err(StoreError::MissingLink(m.id))
        );
    }

    #[test]
    fn record_result_requires_a_participant() {
        let store = MemoryStore::new();
        let (_, m) = two_team_match(&store);
        assert!(matches!(
            store.record_result(m.id, Uuid::new_v4()),
            Err(StoreError::InvalidResult(_))
        ));
        let winner = m.team1_id.unwrap();
        let updated = store.record_result(m.id, winner).unwrap();
        assert_eq!(updated.status, MatchStatus::Complete);
        assert_eq!(updated.winner_team_id, Some(winner));
        assert!(matches!(
            store.record_result(m.id, winner),
            Err(StoreError::InvalidResult(_))
        ));
    }

    #[test]
    fn round_info_tracks_latest_rounds() {
        let store = MemoryStore::new();
        let (t, m) = two_team_match(&store);
        let info = store.get_current_round_info(t.id).unwrap();
        assert_eq!(info.max_winners_round, 1);
        assert!(!info.winners_complete);
        assert_eq!(info.max_losers_round, 0);
        assert!(!info.losers_complete);

        store.record_result(m.id, m.team2_id.unwrap()).unwrap();
        assert!(store.get_current_round_info(t.id).unwrap().winners_complete);
    }
}
