use hcp_core::{Network, RngHandle};
use hcp_graph::{erdos_renyi, planted_partition, AdjacencyGraph};
use hcp_mcmc::moves::{self, Proposal};
use hcp_mcmc::{DeathRule, GroupState, LogFactorialTable, MoveKind, Sampler};
use proptest::prelude::*;

fn sample_graph(seed: u64) -> AdjacencyGraph {
    let mut rng = RngHandle::from_seed(seed);
    planted_partition(3, 5, 0.7, 0.1, &mut rng).unwrap()
}

fn assert_invariants(graph: &AdjacencyGraph, state: &GroupState) {
    state.verify(graph).unwrap();
    assert_eq!(state.hcg_pairs().iter().sum::<u64>(), graph.num_pairs());
    assert_eq!(
        state.hcg_edges().iter().sum::<u64>(),
        graph.num_edges() as u64
    );
    for (edges, pairs) in state.hcg_edges().iter().zip(state.hcg_pairs()) {
        assert!(edges <= pairs);
    }
    assert!(state.masks().iter().all(|&mask| mask & 1 == 1));
}

#[test]
fn every_move_kind_reverts_bit_for_bit() {
    let graph = sample_graph(7);
    let mut rng = RngHandle::from_seed(99);
    let mut state = GroupState::random(&graph, 4, 6, &mut rng).unwrap();
    state.insert_level(2);
    let populated = (1..state.num_groups())
        .find(|&level| state.group_size()[level] > 0)
        .unwrap();
    let member = state.membership().members(populated)[0];
    let outsider = state.membership().non_members(populated)[0];

    let proposals = [
        Proposal::Birth { level: 1 },
        Proposal::Birth { level: state.num_groups() },
        Proposal::Death { level: 2 },
        Proposal::AddNode {
            node: outsider,
            level: populated,
        },
        Proposal::RemoveNode {
            node: member,
            level: populated,
        },
    ];
    let mut seen = Vec::new();
    for proposal in proposals {
        let before = state.clone();
        let applied = moves::apply(&mut state, &graph, proposal).unwrap();
        assert_ne!(state, before, "{proposal:?} changed nothing");
        assert_invariants(&graph, &state);
        moves::revert(&mut state, &graph, applied);
        assert_eq!(state, before, "{proposal:?} did not revert exactly");
        seen.push(proposal.kind());
    }
    for kind in [
        MoveKind::Birth,
        MoveKind::Death,
        MoveKind::AddNode,
        MoveKind::RemoveNode,
    ] {
        assert!(seen.contains(&kind));
    }
}

#[test]
fn rejected_steps_leave_the_state_untouched() {
    let graph = sample_graph(3);
    let mut rng = RngHandle::from_seed(5);
    let state = GroupState::random(&graph, 3, 8, &mut rng).unwrap();
    let mut sampler = Sampler::new(&graph, state, DeathRule::RemoveBranch, 17).unwrap();
    let mut rejections = 0;
    for _ in 0..2_000 {
        let before = sampler.state().clone();
        let loglike = sampler.log_likelihood();
        let outcome = sampler.step();
        if !outcome.accepted {
            rejections += 1;
            assert_eq!(sampler.state(), &before);
            assert_eq!(sampler.log_likelihood(), loglike);
        }
    }
    assert!(rejections > 0);
}

#[test]
fn no_ops_are_accepted_without_change() {
    let graph = sample_graph(11);
    let state = GroupState::from_masks(&graph, vec![1; graph.num_nodes()], 1, 1).unwrap();
    let mut sampler = Sampler::new(&graph, state.clone(), DeathRule::RemoveBranch, 1).unwrap();
    for _ in 0..100 {
        let outcome = sampler.step();
        assert_eq!(outcome.move_kind, MoveKind::NoOp);
        assert!(outcome.accepted);
        assert_eq!(outcome.delta_log_likelihood, 0.0);
    }
    assert_eq!(sampler.state(), &state);
    assert_eq!(sampler.stats().count(MoveKind::NoOp).proposed, 100);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn incremental_counters_match_recount(
        seed in any::<u64>(),
        initial in 1usize..5,
        immediate in any::<bool>(),
        steps in 1usize..600,
    ) {
        let mut graph_rng = RngHandle::from_seed(seed);
        let graph = erdos_renyi(12, 0.3, &mut graph_rng).unwrap();
        let state = GroupState::random(&graph, initial, 6, &mut graph_rng).unwrap();
        let rule = if immediate { DeathRule::Immediate } else { DeathRule::RemoveBranch };
        let mut sampler = Sampler::new(&graph, state, rule, seed ^ 0x5eed).unwrap();
        let table = LogFactorialTable::for_pairs(graph.num_pairs());
        for _ in 0..steps {
            let outcome = sampler.step();
            prop_assert!(outcome.forward_prob >= 0.0 && outcome.forward_prob <= 1.0);
            prop_assert!(outcome.reverse_prob >= 0.0 && outcome.reverse_prob <= 1.0);
        }
        let state = sampler.state();
        assert_invariants(&graph, state);
        prop_assert!(state.num_groups() >= 1 && state.num_groups() <= 6);
        let recomputed = table.log_likelihood(state.hcg_edges(), state.hcg_pairs());
        prop_assert!((recomputed - sampler.log_likelihood()).abs() < 1e-9);
    }
}
