//! Bracket lineage as an explicit DAG.
//!
//! Nodes are bracket slots `(bracket_type, round, match_order)`; each node has up to two typed
//! edges to the matches its teams came out of. Used to check whole-bracket invariants.

use crate::models::{BracketType, Match, MatchId, TeamId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SlotKey {
    pub bracket_type: BracketType,
    pub round: u32,
    pub match_order: u32,
}

impl SlotKey {
    pub fn of(m: &Match) -> Self {
        Self {
            bracket_type: m.bracket_type,
            round: m.round,
            match_order: m.match_order,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} r{} #{}", self.bracket_type, self.round, self.match_order)
    }
}

/// Which parent slot an edge comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Parent1,
    Parent2,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LineageError {
    DuplicateSlot(SlotKey),
    /// Match orders in a round are not exactly 1..=n.
    GapInRound {
        bracket_type: BracketType,
        round: u32,
    },
    DanglingParent {
        child: SlotKey,
        parent: MatchId,
    },
    Cycle(SlotKey),
    TeamScheduledTwice {
        bracket_type: BracketType,
        round: u32,
        team: TeamId,
    },
}

impl fmt::Display for LineageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageError::DuplicateSlot(k) => write!(f, "two matches share slot {}", k),
            LineageError::GapInRound { bracket_type, round } => {
                write!(f, "{} round {} match orders are not contiguous from 1", bracket_type, round)
            }
            LineageError::DanglingParent { child, parent } => {
                write!(f, "{} points at unknown parent match {}", child, parent)
            }
            LineageError::Cycle(k) => write!(f, "lineage cycle through {}", k),
            LineageError::TeamScheduledTwice {
                bracket_type,
                round,
                team,
            } => write!(f, "team {} plays twice in {} round {}", team, bracket_type, round),
        }
    }
}

/// The lineage graph of one tournament.
#[derive(Clone, Debug, Default)]
pub struct BracketGraph {
    nodes: BTreeMap<SlotKey, Match>,
    slot_of: HashMap<MatchId, SlotKey>,
    duplicates: Vec<SlotKey>,
}

impl BracketGraph {
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut g = Self::default();
        for m in matches {
            let key = SlotKey::of(m);
            if g.nodes.contains_key(&key) {
                g.duplicates.push(key);
                continue;
            }
            g.slot_of.insert(m.id, key);
            g.nodes.insert(key, m.clone());
        }
        g
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &SlotKey) -> Option<&Match> {
        self.nodes.get(key)
    }

    /// Parent slots of a node with the edge they arrive on. Unknown parents are skipped.
    pub fn parents(&self, key: &SlotKey) -> Vec<(Edge, SlotKey)> {
        let Some(m) = self.nodes.get(key) else {
            return Vec::new();
        };
        [(Edge::Parent1, m.parent_match1_id), (Edge::Parent2, m.parent_match2_id)]
            .into_iter()
            .filter_map(|(edge, id)| id.and_then(|id| self.slot_of.get(&id)).map(|k| (edge, *k)))
            .collect()
    }

    pub fn children(&self, key: &SlotKey) -> Vec<SlotKey> {
        self.nodes
            .keys()
            .filter(|k| self.parents(k).iter().any(|(_, p)| p == key))
            .copied()
            .collect()
    }

    /// Slots nothing feeds into. A finished bracket has exactly one: its deciding match.
    pub fn sinks(&self) -> Vec<SlotKey> {
        let fed: HashSet<SlotKey> = self
            .nodes
            .keys()
            .flat_map(|k| self.parents(k).into_iter().map(|(_, p)| p))
            .collect();
        self.nodes.keys().filter(|k| !fed.contains(k)).copied().collect()
    }

    /// Every structural problem found, or `Ok` if there are none.
    pub fn validate(&self) -> Result<(), Vec<LineageError>> {
        let mut errors: Vec<LineageError> =
            self.duplicates.iter().map(|k| LineageError::DuplicateSlot(*k)).collect();

        let mut rounds: BTreeMap<(BracketType, u32), Vec<&Match>> = BTreeMap::new();
        for (k, m) in &self.nodes {
            rounds.entry((k.bracket_type, k.round)).or_default().push(m);
        }
        for ((bracket_type, round), ms) in &rounds {
            let orders: Vec<u32> = ms.iter().map(|m| m.match_order).collect();
            if orders != (1..=ms.len() as u32).collect::<Vec<_>>() {
                errors.push(LineageError::GapInRound {
                    bracket_type: *bracket_type,
                    round: *round,
                });
            }
            let mut seen = HashSet::new();
            for team in ms.iter().flat_map(|m| m.teams()) {
                if !seen.insert(team) {
                    errors.push(LineageError::TeamScheduledTwice {
                        bracket_type: *bracket_type,
                        round: *round,
                        team,
                    });
                }
            }
        }

        for (k, m) in &self.nodes {
            for id in [m.parent_match1_id, m.parent_match2_id].into_iter().flatten() {
                if !self.slot_of.contains_key(&id) {
                    errors.push(LineageError::DanglingParent { child: *k, parent: id });
                }
            }
        }

        if let Some(k) = self.find_cycle() {
            errors.push(LineageError::Cycle(k));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn find_cycle(&self) -> Option<SlotKey> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        fn visit(
            g: &BracketGraph,
            k: SlotKey,
            marks: &mut HashMap<SlotKey, Mark>,
        ) -> Option<SlotKey> {
            match marks.get(&k) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => return Some(k),
                None => {}
            }
            marks.insert(k, Mark::Visiting);
            for (_, p) in g.parents(&k) {
                if let Some(found) = visit(g, p, marks) {
                    return Some(found);
                }
            }
            marks.insert(k, Mark::Done);
            None
        }

        let mut marks = HashMap::new();
        self.nodes.keys().find_map(|k| visit(self, *k, &mut marks))
    }
}
