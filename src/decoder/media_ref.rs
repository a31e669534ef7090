//! Media reference decoding: 20 bar levels to a CRC-checked 37-bit integer.

use super::crc::check_spotify_crc;
use super::tables::{
    CODED_BITS, GRAY_CODE, INTERLEAVE_STRIDE, INVERSE_GENERATOR, LEVEL_BITS, MESSAGE_BITS,
    PAYLOAD_BITS,
};
use crate::error::ScanError;
use crate::models::{CodeSequence, DATA_BAR_COUNT, MediaRef};

/// Decode the 20 data levels (sentinels already removed).
///
/// Returns `None` when a level is outside 0..=7 or the CRC does not match.
pub fn spotify_bar_decode(levels: &[u8; DATA_BAR_COUNT]) -> Option<MediaRef> {
    let coded = levels_to_bits(levels)?;
    let received = depuncture(deinterleave(coded));
    let message = apply_inverse_generator(received);

    if !check_spotify_crc(message) {
        log::debug!("media ref: crc mismatch for {:?}", levels);
        return None;
    }
    Some(message & ((1u64 << PAYLOAD_BITS) - 1))
}

/// Decode a validated 23-bar sequence
pub fn decode_sequence(sequence: &CodeSequence) -> Option<MediaRef> {
    spotify_bar_decode(&sequence.data_levels())
}

/// Decode raw levels, checking length, range and sentinels first
pub fn decode_levels(levels: &[u8]) -> Result<Option<MediaRef>, ScanError> {
    Ok(CodeSequence::from_levels(levels)?.and_then(|seq| decode_sequence(&seq)))
}

/// Gray groups, first level first, most significant bit first.
/// Bit `i` of the result is stream position `i`.
fn levels_to_bits(levels: &[u8; DATA_BAR_COUNT]) -> Option<u64> {
    let mut bits = 0u64;
    for (n, &level) in levels.iter().enumerate() {
        let group = *GRAY_CODE.get(level as usize)?;
        for k in 0..LEVEL_BITS {
            if (group >> (LEVEL_BITS - 1 - k)) & 1 == 1 {
                bits |= 1 << (n * LEVEL_BITS + k);
            }
        }
    }
    Some(bits)
}

fn deinterleave(bits: u64) -> u64 {
    (0..CODED_BITS).fold(0, |out, i| {
        out | (((bits >> ((INTERLEAVE_STRIDE * i) % CODED_BITS)) & 1) << i)
    })
}

/// Keep the 45 positions that survived the encoder's puncturing
fn depuncture(bits: u64) -> u64 {
    (0..CODED_BITS)
        .filter(|i| i % 4 != 2)
        .enumerate()
        .fold(0, |out, (j, i)| out | (((bits >> i) & 1) << j))
}

fn apply_inverse_generator(received: u64) -> u64 {
    debug_assert!(received >> MESSAGE_BITS == 0);
    INVERSE_GENERATOR
        .iter()
        .enumerate()
        .fold(0, |message, (i, row)| {
            message | (((row & received).count_ones() as u64 & 1) << i)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_levels() {
        let levels = [5, 7, 4, 1, 4, 6, 6, 0, 2, 4, 3, 4, 6, 7, 5, 5, 6, 0, 5, 0];
        assert_eq!(spotify_bar_decode(&levels), Some(57_639_171_874));
    }

    #[test]
    fn test_fixture_sequences() {
        let seq = CodeSequence::parse("05120643716777731637070").unwrap().unwrap();
        assert_eq!(decode_sequence(&seq), Some(75_845_227_563));
        let seq = CodeSequence::parse("06607602231707646147410").unwrap().unwrap();
        assert_eq!(decode_sequence(&seq), Some(26_560_102_031));
    }

    #[test]
    fn test_single_level_change_fails_crc() {
        let mut levels = [5, 7, 4, 1, 4, 6, 6, 0, 2, 4, 3, 4, 6, 7, 5, 5, 6, 0, 5, 0];
        levels[1] = 6;
        assert_eq!(spotify_bar_decode(&levels), None);
    }

    #[test]
    fn test_punctured_bit_is_ignored() {
        // levels 4 and 5 differ only in a bit that lands on a punctured position
        let mut levels = [5, 7, 4, 1, 4, 6, 6, 0, 2, 4, 3, 4, 6, 7, 5, 5, 6, 0, 5, 0];
        levels[0] = 4;
        assert_eq!(spotify_bar_decode(&levels), Some(57_639_171_874));
    }

    #[test]
    fn test_level_out_of_range() {
        let mut levels = [0u8; DATA_BAR_COUNT];
        levels[0] = 8;
        assert_eq!(spotify_bar_decode(&levels), None);
    }

    #[test]
    fn test_decode_levels_checks_shape() {
        assert!(matches!(
            decode_levels(&[0; 22]),
            Err(ScanError::InvalidSequenceLength { expected: 23, actual: 22 })
        ));
        // wrong centre sentinel
        let mut levels: Vec<u8> = "05120643716777731637070".bytes().map(|b| b - b'0').collect();
        levels[11] = 6;
        assert_eq!(decode_levels(&levels), Ok(None));
        levels[11] = 7;
        assert_eq!(decode_levels(&levels), Ok(Some(75_845_227_563)));
    }

    #[test]
    fn test_deinterleave_is_permutation() {
        assert_eq!(deinterleave(1), 1);
        let all = (1u64 << CODED_BITS) - 1;
        assert_eq!(deinterleave(all), all);
        // position 43 feeds output 1
        assert_eq!(deinterleave(1 << 43), 1 << 1);
    }

    #[test]
    fn test_depuncture_drops_every_fourth() {
        assert_eq!(depuncture(0b0100), 0);
        assert_eq!(depuncture(0b1011), 0b111);
        assert_eq!(depuncture((1u64 << CODED_BITS) - 1).count_ones(), 45);
    }
}
