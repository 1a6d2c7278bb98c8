//! Bit-level helpers for the hierarchical group encoding.
//!
//! Every node carries a `u64` whose bit `q` says whether the node belongs to
//! level `q`. Bit 0 is the root level and is set for every node, so the
//! intersection of two valid masks is never empty.

/// Per-node group membership mask.
pub type GroupMask = u64;

/// Widest hierarchy representable in a [`GroupMask`].
pub const MAX_LEVELS: usize = GroupMask::BITS as usize;

/// Bit of the permanent root level.
pub const ROOT: GroupMask = 1;

/// Mask with the lowest `num_levels` bits set.
#[inline]
pub fn level_mask(num_levels: usize) -> GroupMask {
    low_bits(num_levels)
}

#[inline]
fn low_bits(count: usize) -> GroupMask {
    if count >= MAX_LEVELS {
        GroupMask::MAX
    } else {
        (1 << count) - 1
    }
}

/// Index of the deepest level shared by both masks (the hierarchical
/// consensus group of the pair).
///
/// Both masks must contain the root bit.
#[inline]
pub fn deepest_common_level(a: GroupMask, b: GroupMask, num_levels: usize) -> usize {
    let common = a & b & level_mask(num_levels);
    debug_assert!(common & ROOT != 0, "masks must share the root level");
    (MAX_LEVELS - 1) - common.leading_zeros() as usize
}

/// Opens a zero bit at `pos`, shifting bits `>= pos` up by one.
///
/// Requires `num_levels < MAX_LEVELS` and `pos <= num_levels`.
#[inline]
pub fn insert_zero_at(mask: GroupMask, pos: usize, num_levels: usize) -> GroupMask {
    debug_assert!(num_levels < MAX_LEVELS && pos <= num_levels);
    let valid = mask & level_mask(num_levels);
    let lower = valid & low_bits(pos);
    let upper = valid & !low_bits(pos);
    lower | (upper << 1)
}

/// Drops bit `pos`, shifting bits `> pos` down by one.
///
/// Requires `pos < num_levels`.
#[inline]
pub fn remove_bit_at(mask: GroupMask, pos: usize, num_levels: usize) -> GroupMask {
    debug_assert!(pos < num_levels && num_levels <= MAX_LEVELS);
    let valid = mask & level_mask(num_levels);
    let lower = valid & low_bits(pos);
    let upper = valid & !low_bits(pos + 1);
    lower | (upper >> 1)
}

/// Whether `mask` has bit `level` set.
#[inline]
pub fn contains(mask: GroupMask, level: usize) -> bool {
    mask >> level & 1 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deepest_common_level_picks_highest_shared_bit() {
        assert_eq!(deepest_common_level(0b1011, 0b0111, 4), 1);
        assert_eq!(deepest_common_level(0b1001, 0b1001, 4), 3);
        assert_eq!(deepest_common_level(0b0011, 0b0101, 4), 0);
        // bits beyond the active levels are ignored
        assert_eq!(deepest_common_level(0b1_0001, 0b1_0001, 4), 0);
    }

    #[test]
    fn deepest_common_level_handles_full_width() {
        let top = 1u64 << 63 | ROOT;
        assert_eq!(deepest_common_level(top, top, 64), 63);
        assert_eq!(deepest_common_level(top, ROOT, 64), 0);
    }

    #[test]
    fn insert_zero_shifts_upper_bits() {
        assert_eq!(insert_zero_at(0b1011, 2, 4), 0b1_0011);
        assert_eq!(insert_zero_at(0b1011, 4, 4), 0b1011);
        assert_eq!(insert_zero_at(0b1, 1, 1), 0b1);
        assert_eq!(insert_zero_at(0b11, 1, 2), 0b101);
    }

    #[test]
    fn remove_bit_drops_position() {
        assert_eq!(remove_bit_at(0b1_0011, 2, 5), 0b1011);
        assert_eq!(remove_bit_at(0b1111, 3, 4), 0b111);
        assert_eq!(remove_bit_at(0b1101, 1, 4), 0b111);
    }

    #[test]
    fn insert_then_remove_is_identity() {
        for mask in [0b1u64, 0b1011, 0b1111_0101, u64::MAX >> 1] {
            let levels = 63;
            for pos in 1..=levels {
                let widened = insert_zero_at(mask, pos, levels);
                assert!(!contains(widened, pos));
                assert_eq!(remove_bit_at(widened, pos, levels + 1), mask);
            }
        }
    }

    #[test]
    fn remove_at_full_width_keeps_low_bits() {
        let mask = u64::MAX;
        assert_eq!(remove_bit_at(mask, 63, 64), u64::MAX >> 1);
        assert_eq!(remove_bit_at(mask, 0, 64), u64::MAX >> 1);
    }
}
