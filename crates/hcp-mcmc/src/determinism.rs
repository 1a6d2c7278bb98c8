use hcp_core::derive_substream_seed;

const INITIAL_STATE_SALT: u64 = 0xA5A5_A5A5_A5A5_A5A5;

/// Seed of the RNG substream driving epoch `epoch`.
pub fn epoch_seed(master_seed: u64, epoch: u64) -> u64 {
    derive_substream_seed(master_seed, epoch)
}

/// Seed used to draw a random initial assignment.
pub fn initial_state_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ INITIAL_STATE_SALT, 0)
}

/// Epoch containing the zero-based iteration `iteration`.
pub fn epoch_of(iteration: u64, epoch_length: u64) -> u64 {
    iteration / epoch_length
}
