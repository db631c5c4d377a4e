pub mod nbt;

use crate::error::FormatError;

/// Bits per entry in a Litematica `BlockStates` array; never less than 2.
pub(crate) fn calculate_bits_per_block(palette_size: usize) -> usize {
    std::cmp::max((palette_size as f64).log2().ceil() as usize, 2)
}

/// Packs palette indices into longs, letting entries straddle long boundaries.
pub(crate) fn pack_block_states(indices: &[u32], bits_per_block: usize) -> Vec<i64> {
    let expected_len = (indices.len() * bits_per_block + 63) / 64;
    let mut packed_states = vec![0u64; expected_len];
    let mask = (1u64 << bits_per_block) - 1;

    for (index, &value) in indices.iter().enumerate() {
        let value = value as u64 & mask;
        let bit_index = index * bits_per_block;
        let long_index = bit_index / 64;
        let offset = bit_index % 64;

        packed_states[long_index] |= value << offset;
        if offset + bits_per_block > 64 {
            packed_states[long_index + 1] |= value >> (64 - offset);
        }
    }

    packed_states.into_iter().map(|x| x as i64).collect()
}

/// Number of longs holding `count` entries of `bits_per_block` bits, or `None` on overflow.
pub(crate) fn packed_len(count: usize, bits_per_block: usize) -> Option<usize> {
    count.checked_mul(bits_per_block)?.checked_add(63).map(|bits| bits / 64)
}

pub(crate) fn unpack_block_states(packed_states: &[i64], bits_per_block: usize, count: usize) -> Result<Vec<u32>, FormatError> {
    let needed = packed_len(count, bits_per_block)
        .ok_or_else(|| FormatError::malformed(format!("{} entries of {} bits overflow the address space", count, bits_per_block)))?;
    if packed_states.len() < needed {
        return Err(FormatError::malformed(format!(
            "BlockStates holds {} longs, {} needed for {} entries", packed_states.len(), needed, count
        )));
    }

    let mask = (1u64 << bits_per_block) - 1;
    let mut blocks = Vec::with_capacity(count);
    for index in 0..count {
        let bit_index = index * bits_per_block;
        let long_index = bit_index / 64;
        let offset = bit_index % 64;

        let value = if offset + bits_per_block <= 64 {
            ((packed_states[long_index] as u64) >> offset) & mask
        } else {
            let low_bits = (packed_states[long_index] as u64) >> offset;
            let high_bits = (packed_states[long_index + 1] as u64) << (64 - offset);
            (low_bits | high_bits) & mask
        };
        blocks.push(value as u32);
    }
    Ok(blocks)
}
