//! Group assignments and the per-level sufficient statistics.
//!
//! [`GroupState`] owns the node masks, the membership index and the three
//! per-level counters and keeps them in lock-step. Every mutation has an
//! exact inverse so a rejected proposal leaves the state bit-identical.

use hcp_core::errors::{ErrorInfo, HcpError};
use hcp_core::{Network, RngHandle};
use sha2::{Digest, Sha256};

use crate::levels::{
    contains, deepest_common_level, insert_zero_at, level_mask, remove_bit_at, GroupMask,
    MAX_LEVELS, ROOT,
};
use crate::membership::{DetachedLevel, MembershipIndex, ToggleRecord};

/// Per-level counters derived from a set of masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCounts {
    /// Nodes holding each level bit.
    pub group_size: Vec<u64>,
    /// Unordered pairs whose hierarchical consensus group is each level.
    pub hcg_pairs: Vec<u64>,
    /// Edges whose hierarchical consensus group is each level.
    pub hcg_edges: Vec<u64>,
}

impl LevelCounts {
    /// Recounts everything from scratch in O(N² + |E|).
    pub fn tally<N: Network>(network: &N, masks: &[GroupMask], num_groups: usize) -> Self {
        let mut counts = Self {
            group_size: vec![0; num_groups],
            hcg_pairs: vec![0; num_groups],
            hcg_edges: vec![0; num_groups],
        };
        for &mask in masks {
            for level in 0..num_groups {
                if contains(mask, level) {
                    counts.group_size[level] += 1;
                }
            }
        }
        for u in 0..masks.len() {
            for v in (u + 1)..masks.len() {
                counts.hcg_pairs[deepest_common_level(masks[u], masks[v], num_groups)] += 1;
            }
            for &v in network.neighbors(u) {
                if u < v {
                    counts.hcg_edges[deepest_common_level(masks[u], masks[v], num_groups)] += 1;
                }
            }
        }
        counts
    }
}

/// Node masks, membership index and level counters.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupState {
    num_groups: usize,
    max_num_groups: usize,
    masks: Vec<GroupMask>,
    group_size: Vec<u64>,
    hcg_pairs: Vec<u64>,
    hcg_edges: Vec<u64>,
    membership: MembershipIndex,
}

impl GroupState {
    /// Builds a state from explicit masks.
    ///
    /// Every mask must contain the root bit and no bit at or above
    /// `num_groups`.
    pub fn from_masks<N: Network>(
        network: &N,
        masks: Vec<GroupMask>,
        num_groups: usize,
        max_num_groups: usize,
    ) -> Result<Self, HcpError> {
        check_bounds(num_groups, max_num_groups)?;
        if masks.len() != network.num_nodes() {
            return Err(HcpError::Model(
                ErrorInfo::new("mask-count-mismatch", "one mask is required per node")
                    .with_context("masks", masks.len().to_string())
                    .with_context("nodes", network.num_nodes().to_string()),
            ));
        }
        for (node, &mask) in masks.iter().enumerate() {
            if mask & ROOT == 0 {
                return Err(HcpError::Model(
                    ErrorInfo::new("root-bit-missing", "every node must belong to level 0")
                        .with_context("node", node.to_string())
                        .with_context("mask", mask.to_string()),
                ));
            }
            if mask & !level_mask(num_groups) != 0 {
                return Err(HcpError::Model(
                    ErrorInfo::new("mask-out-of-range", "mask sets a bit beyond the active levels")
                        .with_context("node", node.to_string())
                        .with_context("mask", mask.to_string())
                        .with_context("num_groups", num_groups.to_string()),
                ));
            }
        }
        let counts = LevelCounts::tally(network, &masks, num_groups);
        let membership = MembershipIndex::from_masks(&masks, num_groups);
        Ok(Self {
            num_groups,
            max_num_groups,
            masks,
            group_size: counts.group_size,
            hcg_pairs: counts.hcg_pairs,
            hcg_edges: counts.hcg_edges,
            membership,
        })
    }

    /// Random initial assignment: each node joins each non-root level with
    /// probability one half, and always joins the root.
    pub fn random<N: Network>(
        network: &N,
        num_groups: usize,
        max_num_groups: usize,
        rng: &mut RngHandle,
    ) -> Result<Self, HcpError> {
        check_bounds(num_groups, max_num_groups)?;
        let span = 1u64 << (num_groups - 1);
        let masks = (0..network.num_nodes())
            .map(|_| (rng.below_u64(span) << 1) | ROOT)
            .collect();
        Self::from_masks(network, masks, num_groups, max_num_groups)
    }

    /// Active number of levels.
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    /// Ceiling on the number of levels.
    pub fn max_num_groups(&self) -> usize {
        self.max_num_groups
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.masks.len()
    }

    /// All node masks.
    pub fn masks(&self) -> &[GroupMask] {
        &self.masks
    }

    /// Mask of `node`.
    pub fn mask(&self, node: usize) -> GroupMask {
        self.masks[node]
    }

    /// Nodes per level.
    pub fn group_size(&self) -> &[u64] {
        &self.group_size
    }

    /// Pairs per hierarchical consensus group.
    pub fn hcg_pairs(&self) -> &[u64] {
        &self.hcg_pairs
    }

    /// Edges per hierarchical consensus group.
    pub fn hcg_edges(&self) -> &[u64] {
        &self.hcg_edges
    }

    /// Member / non-member lists per level.
    pub fn membership(&self) -> &MembershipIndex {
        &self.membership
    }

    /// Hierarchical consensus group of the pair `(u, v)`.
    pub fn hcg(&self, u: usize, v: usize) -> usize {
        deepest_common_level(self.masks[u], self.masks[v], self.num_groups)
    }

    /// Adds or removes `node` from non-root `level`, updating counters.
    pub fn toggle_node<N: Network>(
        &mut self,
        network: &N,
        node: usize,
        level: usize,
    ) -> ToggleRecord {
        assert!(
            level > 0 && level < self.num_groups,
            "level {level} is not a non-root level"
        );
        let old_mask = self.masks[node];
        let record = self.membership.toggle(node, level);
        self.masks[node] = old_mask ^ (1 << level);
        if record.joined {
            self.group_size[level] += 1;
        } else {
            self.group_size[level] -= 1;
        }
        self.rebucket(network, node, old_mask);
        record
    }

    /// Undoes a [`toggle_node`](Self::toggle_node).
    pub fn revert_toggle<N: Network>(&mut self, network: &N, record: ToggleRecord) {
        let old_mask = self.masks[record.node];
        self.membership.revert(record);
        self.masks[record.node] = old_mask ^ (1 << record.level);
        if record.joined {
            self.group_size[record.level] -= 1;
        } else {
            self.group_size[record.level] += 1;
        }
        self.rebucket(network, record.node, old_mask);
    }

    /// Re-files every pair touching `node` after its mask changed from
    /// `old_mask` to its current value.
    fn rebucket<N: Network>(&mut self, network: &N, node: usize, old_mask: GroupMask) {
        let new_mask = self.masks[node];
        let levels = self.num_groups;
        for (other, &mask) in self.masks.iter().enumerate() {
            if other == node {
                continue;
            }
            let before = deepest_common_level(old_mask, mask, levels);
            let after = deepest_common_level(new_mask, mask, levels);
            if before != after {
                self.hcg_pairs[before] -= 1;
                self.hcg_pairs[after] += 1;
            }
        }
        for &other in network.neighbors(node) {
            let mask = self.masks[other];
            let before = deepest_common_level(old_mask, mask, levels);
            let after = deepest_common_level(new_mask, mask, levels);
            if before != after {
                self.hcg_edges[before] -= 1;
                self.hcg_edges[after] += 1;
            }
        }
    }

    /// Opens an empty level at `pos` (`1 <= pos <= num_groups`).
    pub fn insert_level(&mut self, pos: usize) {
        assert!(
            self.num_groups < self.max_num_groups,
            "level ceiling reached"
        );
        assert!(pos >= 1 && pos <= self.num_groups, "invalid level position {pos}");
        for mask in &mut self.masks {
            *mask = insert_zero_at(*mask, pos, self.num_groups);
        }
        self.group_size.insert(pos, 0);
        self.hcg_pairs.insert(pos, 0);
        self.hcg_edges.insert(pos, 0);
        self.membership.insert_level(pos);
        self.num_groups += 1;
    }

    /// Closes the empty non-root level at `pos`.
    pub fn remove_level(&mut self, pos: usize) -> DetachedLevel {
        assert!(pos >= 1 && pos < self.num_groups, "invalid level position {pos}");
        assert_eq!(self.group_size[pos], 0, "level {pos} still has members");
        debug_assert_eq!(self.hcg_pairs[pos], 0);
        debug_assert_eq!(self.hcg_edges[pos], 0);
        for mask in &mut self.masks {
            *mask = remove_bit_at(*mask, pos, self.num_groups);
        }
        self.group_size.remove(pos);
        self.hcg_pairs.remove(pos);
        self.hcg_edges.remove(pos);
        self.num_groups -= 1;
        self.membership.remove_level(pos)
    }

    /// Undoes a [`remove_level`](Self::remove_level).
    pub fn restore_level(&mut self, pos: usize, detached: DetachedLevel) {
        for mask in &mut self.masks {
            *mask = insert_zero_at(*mask, pos, self.num_groups);
        }
        self.group_size.insert(pos, 0);
        self.hcg_pairs.insert(pos, 0);
        self.hcg_edges.insert(pos, 0);
        self.membership.restore_level(pos, detached);
        self.num_groups += 1;
    }

    /// Finalises an accepted [`remove_level`](Self::remove_level).
    pub fn release_level(&mut self, detached: DetachedLevel) {
        self.membership.release_level(detached);
    }

    /// Rebuilds the membership index in canonical (ascending node) order.
    ///
    /// Two states with equal masks draw identical random members after a
    /// reindex, whatever toggle history produced them.
    pub fn reindex(&mut self) {
        self.membership = MembershipIndex::from_masks(&self.masks, self.num_groups);
    }

    /// Recounts the statistics from scratch and compares them with the
    /// incrementally maintained ones.
    pub fn verify<N: Network>(&self, network: &N) -> Result<(), HcpError> {
        let counts = LevelCounts::tally(network, &self.masks, self.num_groups);
        let mismatch = |name: &str, expected: &[u64], found: &[u64]| {
            HcpError::Model(
                ErrorInfo::new("counter-drift", "incremental counters disagree with a recount")
                    .with_context("counter", name)
                    .with_context("expected", format!("{expected:?}"))
                    .with_context("found", format!("{found:?}")),
            )
        };
        if counts.group_size != self.group_size {
            return Err(mismatch("group_size", &counts.group_size, &self.group_size));
        }
        if counts.hcg_pairs != self.hcg_pairs {
            return Err(mismatch("hcg_pairs", &counts.hcg_pairs, &self.hcg_pairs));
        }
        if counts.hcg_edges != self.hcg_edges {
            return Err(mismatch("hcg_edges", &counts.hcg_edges, &self.hcg_edges));
        }
        if self.membership.num_levels() == self.num_groups
            && self.membership.agrees_with(&self.masks)
        {
            Ok(())
        } else {
            Err(HcpError::Model(ErrorInfo::new(
                "membership-drift",
                "membership index disagrees with the masks",
            )))
        }
    }

    /// Canonical SHA-256 hash of the level count and masks.
    pub fn canonical_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"hcp-state:v1");
        hasher.update((self.num_groups as u64).to_le_bytes());
        hasher.update((self.masks.len() as u64).to_le_bytes());
        for mask in &self.masks {
            hasher.update(mask.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

fn check_bounds(num_groups: usize, max_num_groups: usize) -> Result<(), HcpError> {
    if max_num_groups == 0 || max_num_groups > MAX_LEVELS {
        return Err(HcpError::Model(
            ErrorInfo::new("invalid-max-groups", "level ceiling must lie in [1, 64]")
                .with_context("max_num_groups", max_num_groups.to_string()),
        ));
    }
    if num_groups == 0 || num_groups > max_num_groups {
        return Err(HcpError::Model(
            ErrorInfo::new("invalid-num-groups", "level count must lie in [1, max_num_groups]")
                .with_context("num_groups", num_groups.to_string())
                .with_context("max_num_groups", max_num_groups.to_string()),
        ));
    }
    Ok(())
}
