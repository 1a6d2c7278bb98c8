//! Proposal generation, application and exact rollback.
//!
//! A step first decides between a dimension move (birth of an empty level)
//! and a membership move on a uniformly chosen non-root level. Membership
//! moves add or remove a single node; a level found empty is proposed for
//! death. Infeasible choices collapse into [`Proposal::NoOp`].

use hcp_core::{Network, RngHandle};
use serde::{Deserialize, Serialize};

use crate::membership::{DetachedLevel, ToggleRecord};
use crate::state::GroupState;

/// When an empty level is proposed for death.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeathRule {
    /// The add/remove coin is drawn first; only the remove branch kills an
    /// empty level, the add branch gives it a first member.
    #[default]
    RemoveBranch,
    /// An empty level is always proposed for death.
    Immediate,
}

impl DeathRule {
    /// Probability that an empty, selected level is proposed for death.
    fn death_share(self) -> f64 {
        match self {
            DeathRule::RemoveBranch => 0.5,
            DeathRule::Immediate => 1.0,
        }
    }
}

/// Kind of move performed by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveKind {
    /// Insert an empty level.
    Birth,
    /// Delete an empty level.
    Death,
    /// Add a node to a level.
    AddNode,
    /// Remove a node from a level.
    RemoveNode,
    /// Forced no-op.
    NoOp,
}

impl MoveKind {
    /// Stable name used in summaries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveKind::Birth => "birth",
            MoveKind::Death => "death",
            MoveKind::AddNode => "add-node",
            MoveKind::RemoveNode => "remove-node",
            MoveKind::NoOp => "no-op",
        }
    }
}

/// Why a step degenerated into a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoOpReason {
    /// Birth drawn while already at `max_num_groups`.
    LevelCeiling,
    /// Only the root level exists.
    RootOnly,
    /// Add drawn on a level that already holds every node.
    LevelFull,
}

/// A concrete proposal, drawn but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// Open an empty level at `level`.
    Birth {
        /// Position of the new level, in `[1, num_groups]`.
        level: usize,
    },
    /// Close the empty level at `level`.
    Death {
        /// Level to remove.
        level: usize,
    },
    /// Put `node` into `level`.
    AddNode {
        /// Node joining the level.
        node: usize,
        /// Target level.
        level: usize,
    },
    /// Take `node` out of `level`.
    RemoveNode {
        /// Node leaving the level.
        node: usize,
        /// Source level.
        level: usize,
    },
    /// Nothing to do.
    NoOp(NoOpReason),
}

impl Proposal {
    /// Move kind for bookkeeping.
    pub fn kind(&self) -> MoveKind {
        match self {
            Proposal::Birth { .. } => MoveKind::Birth,
            Proposal::Death { .. } => MoveKind::Death,
            Proposal::AddNode { .. } => MoveKind::AddNode,
            Proposal::RemoveNode { .. } => MoveKind::RemoveNode,
            Proposal::NoOp(_) => MoveKind::NoOp,
        }
    }

    /// Short description for debug logging.
    pub fn describe(&self) -> String {
        match self {
            Proposal::Birth { level } => format!("birth:l{level}"),
            Proposal::Death { level } => format!("death:l{level}"),
            Proposal::AddNode { node, level } => format!("add:n{node}-l{level}"),
            Proposal::RemoveNode { node, level } => format!("remove:n{node}-l{level}"),
            Proposal::NoOp(reason) => format!("no-op:{reason:?}"),
        }
    }
}

/// Undo information for an applied proposal.
#[derive(Debug)]
#[must_use = "an applied move must be committed or reverted"]
pub enum AppliedMove {
    /// A node changed sides on one level.
    Toggle(ToggleRecord),
    /// A level was opened at this position.
    Birth(usize),
    /// A level was closed; its index column is parked.
    Death(usize, DetachedLevel),
}

/// Probability of proposing a birth from a state with `num_groups` levels
/// over `num_nodes` nodes.
pub fn birth_probability(num_groups: usize, num_nodes: usize) -> f64 {
    1.0 / (2.0 * num_groups as f64 * (num_nodes as f64 + 1.0))
}

/// Draws the next proposal for `state`.
pub fn propose(state: &GroupState, rule: DeathRule, rng: &mut RngHandle) -> Proposal {
    let levels = state.num_groups();
    if rng.uniform() < birth_probability(levels, state.num_nodes()) {
        if levels == state.max_num_groups() {
            return Proposal::NoOp(NoOpReason::LevelCeiling);
        }
        return Proposal::Birth {
            level: 1 + rng.index(levels),
        };
    }
    if levels == 1 {
        return Proposal::NoOp(NoOpReason::RootOnly);
    }
    let level = 1 + rng.index(levels - 1);
    if rule == DeathRule::Immediate && state.group_size()[level] == 0 {
        return Proposal::Death { level };
    }
    let index = state.membership();
    if rng.uniform() < 0.5 {
        match index.random_member(level, rng) {
            Some(node) => Proposal::RemoveNode { node, level },
            None => Proposal::Death { level },
        }
    } else {
        match index.random_nonmember(level, rng) {
            Some(node) => Proposal::AddNode { node, level },
            None => Proposal::NoOp(NoOpReason::LevelFull),
        }
    }
}

/// Applies a proposal. Returns `None` for no-ops.
pub fn apply<N: Network>(
    state: &mut GroupState,
    network: &N,
    proposal: Proposal,
) -> Option<AppliedMove> {
    match proposal {
        Proposal::Birth { level } => {
            state.insert_level(level);
            Some(AppliedMove::Birth(level))
        }
        Proposal::Death { level } => {
            let detached = state.remove_level(level);
            Some(AppliedMove::Death(level, detached))
        }
        Proposal::AddNode { node, level } | Proposal::RemoveNode { node, level } => {
            Some(AppliedMove::Toggle(state.toggle_node(network, node, level)))
        }
        Proposal::NoOp(_) => None,
    }
}

/// Undoes an applied move, restoring the state bit for bit.
pub fn revert<N: Network>(state: &mut GroupState, network: &N, applied: AppliedMove) {
    match applied {
        AppliedMove::Toggle(record) => state.revert_toggle(network, record),
        AppliedMove::Birth(level) => {
            let detached = state.remove_level(level);
            state.release_level(detached);
        }
        AppliedMove::Death(level, detached) => state.restore_level(level, detached),
    }
}

/// Finalises an accepted move.
pub fn commit(state: &mut GroupState, applied: AppliedMove) {
    if let AppliedMove::Death(_, detached) = applied {
        state.release_level(detached);
    }
}

/// Forward and reverse proposal probabilities of a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposalProbabilities {
    /// Probability of drawing the move from the current state.
    pub forward: f64,
    /// Probability of drawing the inverse move from the resulting state.
    pub reverse: f64,
}

/// Proposal probabilities of `proposal`, evaluated on the state it was drawn
/// from. Reported only; the acceptance rule does not use them.
pub fn proposal_probabilities(
    state: &GroupState,
    rule: DeathRule,
    proposal: &Proposal,
) -> ProposalProbabilities {
    let levels = state.num_groups();
    let nodes = state.num_nodes();
    let p_birth = |g: usize| birth_probability(g, nodes);
    // probability of reaching a given non-root level on the membership branch
    let pick = |g: usize| (1.0 - p_birth(g)) / (g - 1) as f64;
    let (forward, reverse) = match *proposal {
        Proposal::Birth { .. } => (
            p_birth(levels) / levels as f64,
            pick(levels + 1) * rule.death_share(),
        ),
        Proposal::Death { .. } => (
            pick(levels) * rule.death_share(),
            p_birth(levels - 1) / (levels - 1) as f64,
        ),
        Proposal::AddNode { level, .. } => {
            let size = state.group_size()[level] as usize;
            let forward = if size == 0 && rule == DeathRule::Immediate {
                0.0
            } else {
                pick(levels) * 0.5 / (nodes - size) as f64
            };
            (forward, pick(levels) * 0.5 / (size + 1) as f64)
        }
        Proposal::RemoveNode { level, .. } => {
            let size = state.group_size()[level] as usize;
            let reverse = if size == 1 && rule == DeathRule::Immediate {
                0.0
            } else {
                pick(levels) * 0.5 / (nodes - size + 1) as f64
            };
            (pick(levels) * 0.5 / size as f64, reverse)
        }
        Proposal::NoOp(_) => (1.0, 1.0),
    };
    ProposalProbabilities { forward, reverse }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcp_graph::ring;

    #[test]
    fn root_only_state_cannot_change_membership() {
        let graph = ring(4).unwrap();
        let state = GroupState::from_masks(&graph, vec![1; 4], 1, 1).unwrap();
        let mut rng = RngHandle::from_seed(3);
        for _ in 0..100 {
            let proposal = propose(&state, DeathRule::RemoveBranch, &mut rng);
            assert!(matches!(proposal, Proposal::NoOp(_)), "{proposal:?}");
        }
    }

    #[test]
    fn immediate_rule_kills_empty_levels() {
        let graph = ring(4).unwrap();
        let state = GroupState::from_masks(&graph, vec![1; 4], 2, 2).unwrap();
        let mut rng = RngHandle::from_seed(11);
        for _ in 0..200 {
            match propose(&state, DeathRule::Immediate, &mut rng) {
                Proposal::Death { level } => assert_eq!(level, 1),
                Proposal::NoOp(NoOpReason::LevelCeiling) => {}
                other => panic!("unexpected proposal {other:?}"),
            }
        }
    }

    #[test]
    fn remove_branch_rule_can_populate_empty_levels() {
        let graph = ring(4).unwrap();
        let state = GroupState::from_masks(&graph, vec![1; 4], 2, 2).unwrap();
        let mut rng = RngHandle::from_seed(11);
        let mut adds = 0;
        let mut deaths = 0;
        for _ in 0..400 {
            match propose(&state, DeathRule::RemoveBranch, &mut rng) {
                Proposal::AddNode { level, .. } => {
                    assert_eq!(level, 1);
                    adds += 1;
                }
                Proposal::Death { .. } => deaths += 1,
                Proposal::NoOp(NoOpReason::LevelCeiling) => {}
                other => panic!("unexpected proposal {other:?}"),
            }
        }
        assert!(adds > 100 && deaths > 100, "adds {adds} deaths {deaths}");
    }

    #[test]
    fn sampled_births_match_rate_and_spread_over_non_root_positions() {
        let graph = ring(3).unwrap();
        let draws = 240_000;
        for (masks, levels) in [(vec![1, 1, 1], 1), (vec![1, 3, 7], 3)] {
            let state = GroupState::from_masks(&graph, masks, levels, 8).unwrap();
            let mut rng = RngHandle::from_seed(29 + levels as u64);
            let mut positions = vec![0usize; levels + 1];
            for _ in 0..draws {
                let proposal = propose(&state, DeathRule::RemoveBranch, &mut rng);
                if let Proposal::Birth { level } = proposal {
                    positions[level] += 1;
                }
            }
            assert_eq!(positions[0], 0, "birth at the root");
            let births: usize = positions.iter().sum();
            let expected = draws as f64 * birth_probability(levels, 3);
            assert!(
                (births as f64 - expected).abs() < 0.05 * expected,
                "G={levels}: {births} births, expected {expected}"
            );
            let per_position = births as f64 / levels as f64;
            for &count in &positions[1..] {
                assert!(
                    (count as f64 - per_position).abs() < 0.1 * per_position,
                    "G={levels}: positions {positions:?}"
                );
            }
        }
    }

    #[test]
    fn birth_and_death_probabilities_mirror_each_other() {
        let graph = ring(5).unwrap();
        let before = GroupState::from_masks(&graph, vec![1, 3, 3, 1, 1], 2, 4).unwrap();
        let birth = proposal_probabilities(
            &before,
            DeathRule::RemoveBranch,
            &Proposal::Birth { level: 2 },
        );
        let mut after = before.clone();
        after.insert_level(2);
        let death = proposal_probabilities(
            &after,
            DeathRule::RemoveBranch,
            &Proposal::Death { level: 2 },
        );
        assert!((birth.forward - death.reverse).abs() < 1e-15);
        assert!((birth.reverse - death.forward).abs() < 1e-15);
        assert!((birth.forward - 1.0 / 48.0).abs() < 1e-15);
    }

    #[test]
    fn add_and_remove_probabilities_mirror_each_other() {
        let graph = ring(5).unwrap();
        let mut state = GroupState::from_masks(&graph, vec![1, 3, 3, 1, 1], 2, 4).unwrap();
        let rule = DeathRule::RemoveBranch;
        let add = proposal_probabilities(&state, rule, &Proposal::AddNode { node: 0, level: 1 });
        let record = state.toggle_node(&graph, 0, 1);
        let remove =
            proposal_probabilities(&state, rule, &Proposal::RemoveNode { node: 0, level: 1 });
        state.revert_toggle(&graph, record);
        assert!((add.forward - remove.reverse).abs() < 1e-15);
        assert!((add.reverse - remove.forward).abs() < 1e-15);
    }
}
