//! Per-level member / non-member index with O(1) random selection.
//!
//! Each level owns a column holding two dense lists (`members`, `outsiders`)
//! and a per-node position table. Columns live in an arena and are addressed
//! through a level-to-slot vector, so opening or closing a level only shifts
//! slot numbers and never touches the data of other levels.
//!
//! Every mutation returns enough information to be undone exactly: after a
//! revert both lists hold the same nodes in the same order as before.

use hcp_core::RngHandle;

use crate::levels::{contains, GroupMask};

#[derive(Debug, Clone)]
struct Column {
    members: Vec<usize>,
    outsiders: Vec<usize>,
    /// Index of each node inside whichever list currently holds it.
    position: Vec<usize>,
}

impl Column {
    fn empty(num_nodes: usize) -> Self {
        Self {
            members: Vec::with_capacity(num_nodes),
            outsiders: (0..num_nodes).collect(),
            position: (0..num_nodes).collect(),
        }
    }

    fn reset(&mut self) {
        self.members.clear();
        self.outsiders.clear();
        self.outsiders.extend(0..self.position.len());
        for (node, slot) in self.position.iter_mut().enumerate() {
            *slot = node;
        }
    }

    fn from_bit(masks: &[GroupMask], level: usize) -> Self {
        let mut column = Self {
            members: Vec::new(),
            outsiders: Vec::new(),
            position: vec![0; masks.len()],
        };
        for (node, &mask) in masks.iter().enumerate() {
            let list = if contains(mask, level) {
                &mut column.members
            } else {
                &mut column.outsiders
            };
            column.position[node] = list.len();
            list.push(node);
        }
        column
    }

    fn is_member(&self, node: usize) -> bool {
        self.members.get(self.position[node]) == Some(&node)
    }
}

/// Swap-removes the entry at `index`, fixing the position of the node that
/// fills the hole.
fn take(list: &mut Vec<usize>, position: &mut [usize], index: usize) -> usize {
    let node = list.swap_remove(index);
    if let Some(&moved) = list.get(index) {
        position[moved] = index;
    }
    node
}

/// Exact inverse of [`take`].
fn put_back(list: &mut Vec<usize>, position: &mut [usize], node: usize, index: usize) {
    list.push(node);
    let last = list.len() - 1;
    list.swap(index, last);
    position[list[last]] = last;
    position[node] = index;
}

/// Undo record for a single membership toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleRecord {
    /// Node that changed sides.
    pub node: usize,
    /// Level whose membership changed.
    pub level: usize,
    /// Whether the node joined (`true`) or left (`false`) the level.
    pub joined: bool,
    vacated: usize,
}

/// Handle to a column detached by [`MembershipIndex::remove_level`].
///
/// The column stays parked in the arena until it is either restored or
/// released.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a detached level must be restored or released"]
pub struct DetachedLevel {
    slot: usize,
}

/// Member / non-member lists for every level.
#[derive(Debug, Clone)]
pub struct MembershipIndex {
    num_nodes: usize,
    columns: Vec<Column>,
    slots: Vec<usize>,
    free: Vec<usize>,
}

impl MembershipIndex {
    /// Builds the index from node masks covering `num_levels` levels.
    pub fn from_masks(masks: &[GroupMask], num_levels: usize) -> Self {
        let columns: Vec<Column> = (0..num_levels)
            .map(|level| Column::from_bit(masks, level))
            .collect();
        Self {
            num_nodes: masks.len(),
            slots: (0..columns.len()).collect(),
            columns,
            free: Vec::new(),
        }
    }

    /// Number of levels currently indexed.
    pub fn num_levels(&self) -> usize {
        self.slots.len()
    }

    fn column(&self, level: usize) -> &Column {
        &self.columns[self.slots[level]]
    }

    fn column_mut(&mut self, level: usize) -> &mut Column {
        let slot = self.slots[level];
        &mut self.columns[slot]
    }

    /// Members of `level`, in index order.
    pub fn members(&self, level: usize) -> &[usize] {
        &self.column(level).members
    }

    /// Non-members of `level`, in index order.
    pub fn non_members(&self, level: usize) -> &[usize] {
        &self.column(level).outsiders
    }

    /// Whether `node` currently belongs to `level`.
    pub fn is_member(&self, node: usize, level: usize) -> bool {
        self.column(level).is_member(node)
    }

    /// Uniformly chosen member of `level`, or `None` if it is empty.
    pub fn random_member(&self, level: usize, rng: &mut RngHandle) -> Option<usize> {
        let members = self.members(level);
        (!members.is_empty()).then(|| members[rng.index(members.len())])
    }

    /// Uniformly chosen non-member of `level`, or `None` if every node is in it.
    pub fn random_nonmember(&self, level: usize, rng: &mut RngHandle) -> Option<usize> {
        let outsiders = self.non_members(level);
        (!outsiders.is_empty()).then(|| outsiders[rng.index(outsiders.len())])
    }

    /// Moves `node` to the other side of `level`.
    pub fn toggle(&mut self, node: usize, level: usize) -> ToggleRecord {
        let column = self.column_mut(level);
        let joined = !column.is_member(node);
        let vacated = column.position[node];
        let (from, to) = if joined {
            (&mut column.outsiders, &mut column.members)
        } else {
            (&mut column.members, &mut column.outsiders)
        };
        take(from, &mut column.position, vacated);
        column.position[node] = to.len();
        to.push(node);
        ToggleRecord {
            node,
            level,
            joined,
            vacated,
        }
    }

    /// Reverts the most recent toggle of `record.level`.
    pub fn revert(&mut self, record: ToggleRecord) {
        let column = self.column_mut(record.level);
        let (from, to) = if record.joined {
            (&mut column.outsiders, &mut column.members)
        } else {
            (&mut column.members, &mut column.outsiders)
        };
        let popped = to.pop();
        debug_assert_eq!(popped, Some(record.node), "revert out of order");
        put_back(from, &mut column.position, record.node, record.vacated);
    }

    /// Opens an empty level at `pos`; every node starts as a non-member.
    pub fn insert_level(&mut self, pos: usize) {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.columns[slot].reset();
                slot
            }
            None => {
                self.columns.push(Column::empty(self.num_nodes));
                self.columns.len() - 1
            }
        };
        self.slots.insert(pos, slot);
    }

    /// Detaches the level at `pos`, which must have no members.
    pub fn remove_level(&mut self, pos: usize) -> DetachedLevel {
        debug_assert!(
            self.members(pos).is_empty(),
            "only empty levels can be removed"
        );
        DetachedLevel {
            slot: self.slots.remove(pos),
        }
    }

    /// Re-attaches a detached level at `pos`, exactly as it was.
    pub fn restore_level(&mut self, pos: usize, detached: DetachedLevel) {
        self.slots.insert(pos, detached.slot);
    }

    /// Returns a detached column to the arena for reuse.
    pub fn release_level(&mut self, detached: DetachedLevel) {
        self.free.push(detached.slot);
    }

    /// Whether every column partitions the nodes exactly as `masks` do and
    /// every position entry points back at its node.
    pub fn agrees_with(&self, masks: &[GroupMask]) -> bool {
        if masks.len() != self.num_nodes {
            return false;
        }
        (0..self.num_levels()).all(|level| {
            let column = self.column(level);
            column.members.len() + column.outsiders.len() == self.num_nodes
                && masks.iter().enumerate().all(|(node, &mask)| {
                    let list = if contains(mask, level) {
                        &column.members
                    } else {
                        &column.outsiders
                    };
                    list.get(column.position[node]) == Some(&node)
                })
        })
    }
}

impl PartialEq for MembershipIndex {
    fn eq(&self, other: &Self) -> bool {
        self.num_nodes == other.num_nodes
            && self.num_levels() == other.num_levels()
            && (0..self.num_levels()).all(|level| {
                self.members(level) == other.members(level)
                    && self.non_members(level) == other.non_members(level)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_masks() -> Vec<GroupMask> {
        vec![0b011, 0b101, 0b111, 0b001, 0b011]
    }

    #[test]
    fn index_matches_masks() {
        let index = MembershipIndex::from_masks(&sample_masks(), 3);
        assert_eq!(index.members(0), &[0, 1, 2, 3, 4]);
        assert_eq!(index.members(1), &[0, 2, 4]);
        assert_eq!(index.non_members(1), &[1, 3]);
        assert_eq!(index.members(2), &[1, 2]);
        assert!(index.is_member(4, 1));
        assert!(!index.is_member(3, 2));
    }

    #[test]
    fn toggle_then_revert_restores_order() {
        let mut index = MembershipIndex::from_masks(&sample_masks(), 3);
        let before = index.clone();

        let record = index.toggle(0, 1);
        assert!(!record.joined);
        assert_eq!(index.members(1), &[4, 2]);
        assert_eq!(index.non_members(1), &[1, 3, 0]);
        assert!(!index.is_member(0, 1));
        assert!(index.is_member(4, 1));

        index.revert(record);
        assert_eq!(index, before);
        assert_eq!(index.members(1), &[0, 2, 4]);
        assert!(index.is_member(0, 1));
    }

    #[test]
    fn join_then_revert_restores_order() {
        let mut index = MembershipIndex::from_masks(&sample_masks(), 3);
        let before = index.clone();
        let record = index.toggle(1, 1);
        assert!(record.joined);
        assert_eq!(index.members(1), &[0, 2, 4, 1]);
        index.revert(record);
        assert_eq!(index, before);
    }

    #[test]
    fn random_picks_respect_sides() {
        let index = MembershipIndex::from_masks(&sample_masks(), 3);
        let mut rng = RngHandle::from_seed(5);
        for _ in 0..200 {
            let member = index.random_member(2, &mut rng).unwrap();
            assert!(index.is_member(member, 2));
            let outsider = index.random_nonmember(2, &mut rng).unwrap();
            assert!(!index.is_member(outsider, 2));
        }
        assert_eq!(index.random_nonmember(0, &mut rng), None);
    }

    #[test]
    fn levels_can_be_opened_parked_and_restored() {
        let mut index = MembershipIndex::from_masks(&sample_masks(), 3);
        let before = index.clone();

        index.insert_level(1);
        assert_eq!(index.num_levels(), 4);
        assert!(index.members(1).is_empty());
        assert_eq!(index.non_members(1), &[0, 1, 2, 3, 4]);
        assert_eq!(index.members(2), &[0, 2, 4]);

        let record = index.toggle(3, 1);
        index.revert(record);
        let detached = index.remove_level(1);
        assert_eq!(index, before);

        index.release_level(detached);
        index.insert_level(3);
        assert_eq!(index.num_levels(), 4);
        assert_eq!(index.non_members(3), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn removed_empty_level_comes_back_verbatim() {
        let mut index = MembershipIndex::from_masks(&sample_masks(), 3);
        index.insert_level(3);
        // scramble the outsider order of the new level
        let a = index.toggle(2, 3);
        let b = index.toggle(0, 3);
        let _ = (a, b);
        index.toggle(2, 3);
        index.toggle(0, 3);
        let before = index.clone();
        let scrambled = index.non_members(3).to_vec();

        let detached = index.remove_level(3);
        index.restore_level(3, detached);
        assert_eq!(index, before);
        assert_eq!(index.non_members(3), scrambled.as_slice());
    }
}
