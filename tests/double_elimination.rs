//! Integration tests for double elimination: losers-bracket routing and full bracket runs.

mod common;

use bracket_engine_web::{
    advance, build_double_elimination, generate_losers_bracket_matches, generate_next_round_matches,
    ordered_assignments, BracketError, BracketGraph, BracketType, Format, Match, MatchStore,
    TeamId, Tournament, TournamentStatus,
};
use common::*;

#[test]
fn builder_only_creates_winners_round_one() {
    let t = Tournament::new("Cup", Format::DoubleElimination, "chess", 1);
    let ms = build_double_elimination(&t, &ordered_assignments(&teams(8)), None).unwrap();
    assert_eq!(ms.len(), 4);
    assert!(ms
        .iter()
        .all(|m| m.bracket_type == BracketType::Winners && m.round == 1));
    assert_eq!(
        build_double_elimination(&t, &ordered_assignments(&teams(1)), None),
        Err(BracketError::InsufficientParticipants)
    );
}

#[test]
fn four_team_walk_with_a_bracket_reset() {
    let (store, id, r) = started(Format::DoubleElimination, 4);
    let (a, b, c, d) = (r[0], r[1], r[2], r[3]);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, a).unwrap();
    store.record_result(w1[1].id, c).unwrap();

    // W1 losers drop into L1 and the winners side moves on in the same call.
    let adv = advance(&store, id).unwrap();
    assert_eq!(adv.generated.len(), 2);
    let l1 = &adv.generated[0];
    assert_eq!((l1.bracket_type, l1.round), (BracketType::Losers, 1));
    assert_eq!((l1.team1_id, l1.team2_id), (Some(b), Some(d)));
    assert_eq!((l1.parent_match1_id, l1.parent_match2_id), (Some(w1[0].id), Some(w1[1].id)));
    let w2 = &adv.generated[1];
    assert_eq!((w2.bracket_type, w2.round), (BracketType::Winners, 2));
    assert_eq!((w2.team1_id, w2.team2_id), (Some(a), Some(c)));

    store.record_result(l1.id, b).unwrap();
    store.record_result(w2.id, a).unwrap();
    let adv = advance(&store, id).unwrap();
    assert_eq!(adv.generated.len(), 1);
    let l2 = &adv.generated[0];
    assert_eq!((l2.bracket_type, l2.round), (BracketType::Losers, 2));
    assert_eq!((l2.team1_id, l2.team2_id), (Some(b), Some(c)));
    assert_eq!((l2.parent_match1_id, l2.parent_match2_id), (Some(l1.id), Some(w2.id)));

    store.record_result(l2.id, b).unwrap();
    let adv = advance(&store, id).unwrap();
    assert_eq!(adv.generated.len(), 1);
    let game_one = &adv.generated[0];
    assert_eq!(
        (game_one.bracket_type, game_one.round, game_one.match_order),
        (BracketType::Final, 1, 1)
    );
    assert_eq!((game_one.team1_id, game_one.team2_id), (Some(a), Some(b)));
    assert_eq!(
        (game_one.parent_match1_id, game_one.parent_match2_id),
        (Some(w2.id), Some(l2.id))
    );

    // B hands A its first loss: one more game decides it.
    store.record_result(game_one.id, b).unwrap();
    let adv = advance(&store, id).unwrap();
    assert_eq!(adv.champion, None);
    let reset = &adv.generated[0];
    assert_eq!((reset.bracket_type, reset.round), (BracketType::Final, 2));
    assert_eq!((reset.team1_id, reset.team2_id), (Some(a), Some(b)));
    assert_eq!(reset.parent_match1_id, Some(game_one.id));

    store.record_result(reset.id, a).unwrap();
    let adv = advance(&store, id).unwrap();
    assert!(adv.generated.is_empty());
    assert_eq!(adv.champion, Some(a));
    let t = store.get_tournament(id).unwrap().unwrap();
    assert_eq!((t.status, t.champion), (TournamentStatus::Complete, Some(a)));

    let l = losses(&store.list_matches(id).unwrap());
    assert_eq!(l[&a], 1);
    assert_eq!((l[&b], l[&c], l[&d]), (2, 2, 2));
}

#[test]
fn eight_teams_use_the_standard_losers_shape() {
    let (store, id, _) = started(Format::DoubleElimination, 8);
    run_to_completion(&store, id, team1_wins);
    let info = store.get_current_round_info(id).unwrap();
    assert_eq!(info.max_winners_round, 3);
    assert_eq!(info.max_losers_round, 4);
    assert_eq!(info.max_final_round, 1);
    let per_round: Vec<usize> = (1..=4)
        .map(|l| round(&store, id, BracketType::Losers, l).len())
        .collect();
    assert_eq!(per_round, vec![2, 2, 1, 1]);
}

#[test]
fn losers_rounds_scale_with_winners_rounds() {
    for (n, k) in [(4usize, 2u32), (8, 3), (16, 4)] {
        let (store, id, _) = started(Format::DoubleElimination, n);
        run_to_completion(&store, id, alternating);
        let info = store.get_current_round_info(id).unwrap();
        assert_eq!(info.max_winners_round, k, "n = {}", n);
        assert_eq!(info.max_losers_round, 2 * k - 2, "n = {}", n);
    }
}

#[test]
fn three_teams_give_the_lone_loser_a_bye() {
    let (store, id, r) = started(Format::DoubleElimination, 3);
    let (a, b, c) = (r[0], r[1], r[2]);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, a).unwrap();

    let adv = advance(&store, id).unwrap();
    let l1 = &adv.generated[0];
    assert_eq!(l1.bracket_type, BracketType::Losers);
    assert!(l1.is_bye() && l1.is_complete());
    assert_eq!(l1.team1_id, Some(b));
    let w2 = &adv.generated[1];
    assert_eq!((w2.team1_id, w2.team2_id), (Some(a), Some(c)));

    store.record_result(w2.id, c).unwrap();
    let adv = advance(&store, id).unwrap();
    let l2 = &adv.generated[0];
    assert_eq!((l2.bracket_type, l2.round), (BracketType::Losers, 2));
    assert_eq!((l2.team1_id, l2.team2_id), (Some(b), Some(a)));
}

fn check_full_run(n: usize, pick: fn(&Match) -> TeamId) {
    let (store, id, roster) = started(Format::DoubleElimination, n);
    let champion = run_to_completion(&store, id, pick);
    let matches = store.list_matches(id).unwrap();

    let l = losses(&matches);
    assert!(l.get(&champion).copied().unwrap_or(0) <= 1, "n = {}", n);
    for team in roster.iter().filter(|&&t| t != champion) {
        assert_eq!(l.get(team).copied(), Some(2), "n = {}", n);
    }

    let graph = BracketGraph::from_matches(&matches);
    assert_eq!(graph.validate(), Ok(()), "n = {}", n);
    let sinks = graph.sinks();
    assert_eq!(sinks.len(), 1, "n = {}", n);
    assert_eq!(sinks[0].bracket_type, BracketType::Final);

    let t = store.get_tournament(id).unwrap().unwrap();
    assert_eq!(t.status, TournamentStatus::Complete);
    assert_eq!(t.champion, Some(champion));
}

#[test]
fn every_size_ends_with_one_champion_and_two_losses_elsewhere() {
    for n in 2..=16 {
        check_full_run(n, team1_wins);
        check_full_run(n, team2_wins);
        check_full_run(n, alternating);
    }
}

#[test]
fn losers_champion_winning_twice_takes_the_title() {
    let (store, id, _) = started(Format::DoubleElimination, 6);
    let champion = run_to_completion(&store, id, team2_wins);
    let info = store.get_current_round_info(id).unwrap();
    assert_eq!(info.max_final_round, 2);
    let reset = &round(&store, id, BracketType::Final, 2)[0];
    assert_eq!(reset.winner_team_id, Some(champion));
    assert_eq!(reset.team2_id, Some(champion));
}

#[test]
fn routing_needs_a_decided_winners_round() {
    let (store, id, r) = started(Format::DoubleElimination, 4);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, r[0]).unwrap();
    assert_eq!(
        generate_losers_bracket_matches(&store, id, 1, &[r[1]]),
        Err(BracketError::RoundNotComplete)
    );
    assert!(round(&store, id, BracketType::Losers, 1).is_empty());
}

#[test]
fn routing_checks_who_actually_lost() {
    let (store, id, r) = started(Format::DoubleElimination, 4);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, r[0]).unwrap();
    store.record_result(w1[1].id, r[2]).unwrap();

    assert_eq!(
        generate_losers_bracket_matches(&store, id, 1, &[r[1], r[0]]),
        Err(BracketError::TeamNotFound(r[0]))
    );
    assert!(matches!(
        generate_losers_bracket_matches(&store, id, 1, &[r[1]]),
        Err(BracketError::InvalidAssignment(_))
    ));

    let l1 = generate_losers_bracket_matches(&store, id, 1, &[r[3], r[1]]).unwrap();
    assert_eq!(l1.len(), 1);
    assert_eq!((l1[0].team1_id, l1[0].team2_id), (Some(r[1]), Some(r[3])));
    assert_eq!(
        generate_losers_bracket_matches(&store, id, 1, &[r[1], r[3]]),
        Err(BracketError::AlreadyGenerated)
    );

    // advance picks up from a manually routed round.
    let adv = advance(&store, id).unwrap();
    assert_eq!(adv.generated.len(), 1);
    assert_eq!(adv.generated[0].bracket_type, BracketType::Winners);
}

#[test]
fn drop_in_waits_for_the_previous_losers_round() {
    let (store, id, r) = started(Format::DoubleElimination, 4);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, r[0]).unwrap();
    store.record_result(w1[1].id, r[2]).unwrap();
    advance(&store, id).unwrap();

    let w2 = &round(&store, id, BracketType::Winners, 2)[0];
    store.record_result(w2.id, r[0]).unwrap();
    assert_eq!(
        generate_losers_bracket_matches(&store, id, 2, &[r[2]]),
        Err(BracketError::RoundNotComplete)
    );
}

#[test]
fn losers_round_waits_for_its_drop_ins() {
    let (store, id, r) = started(Format::DoubleElimination, 4);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, r[0]).unwrap();
    store.record_result(w1[1].id, r[2]).unwrap();
    advance(&store, id).unwrap();

    let l1 = &round(&store, id, BracketType::Losers, 1)[0];
    store.record_result(l1.id, r[1]).unwrap();
    assert_eq!(
        generate_next_round_matches(&store, id, 1, BracketType::Losers),
        Err(BracketError::AwaitingWinnersRound(2))
    );
    assert!(advance(&store, id).unwrap().is_waiting());
}

#[test]
fn single_elimination_has_no_losers_bracket() {
    let (store, id, r) = started(Format::SingleElimination, 4);
    let w1 = round(&store, id, BracketType::Winners, 1);
    store.record_result(w1[0].id, r[0]).unwrap();
    store.record_result(w1[1].id, r[2]).unwrap();
    assert_eq!(
        generate_losers_bracket_matches(&store, id, 1, &[r[1], r[3]]),
        Err(BracketError::InvalidFormat("single-elimination".to_string()))
    );
}
