//! Forward code: media reference to bar levels.
//!
//! CRC, tail-biting rate 1/2 convolutional code, puncturing of every third
//! output, interleaving and Gray mapping. The inverse of
//! [`spotify_bar_decode`](super::media_ref::spotify_bar_decode).

use super::crc::attach_crc;
use super::tables::{
    CODED_BITS, CONSTRAINT_LENGTH, GENERATORS, INTERLEAVE_STRIDE, LEVEL_BITS, MESSAGE_BITS,
    PAYLOAD_BITS, level_for_group,
};
use crate::error::ScanError;
use crate::models::{CodeSequence, DATA_BAR_COUNT, MediaRef};

/// Encode a media reference into the 23-bar sequence
pub fn encode_media_ref(media_ref: MediaRef) -> Result<CodeSequence, ScanError> {
    if media_ref >> PAYLOAD_BITS != 0 {
        return Err(ScanError::MediaRefTooWide(media_ref));
    }
    let message = attach_crc(media_ref);
    let coded = interleave(&puncture(&convolve(message)));
    Ok(CodeSequence::from_data_levels(&bits_to_levels(coded)))
}

/// Tail-biting convolution; output `2t + g` is generator `g` at step `t`
fn convolve(message: u64) -> [u8; 2 * MESSAGE_BITS] {
    let mut out = [0u8; 2 * MESSAGE_BITS];
    for t in 0..MESSAGE_BITS {
        for (g, poly) in GENERATORS.iter().enumerate() {
            out[2 * t + g] = (0..CONSTRAINT_LENGTH)
                .filter(|k| (poly >> k) & 1 == 1)
                .fold(0u8, |acc, k| {
                    let src = (t + MESSAGE_BITS - k) % MESSAGE_BITS;
                    acc ^ ((message >> src) & 1) as u8
                });
        }
    }
    out
}

fn puncture(bits: &[u8; 2 * MESSAGE_BITS]) -> [u8; CODED_BITS] {
    let mut out = [0u8; CODED_BITS];
    for (slot, bit) in out
        .iter_mut()
        .zip(bits.iter().enumerate().filter(|(i, _)| i % 3 != 2).map(|(_, b)| b))
    {
        *slot = *bit;
    }
    out
}

fn interleave(bits: &[u8; CODED_BITS]) -> [u8; CODED_BITS] {
    let mut out = [0u8; CODED_BITS];
    for (i, &bit) in bits.iter().enumerate() {
        out[(INTERLEAVE_STRIDE * i) % CODED_BITS] = bit;
    }
    out
}

fn bits_to_levels(bits: [u8; CODED_BITS]) -> [u8; DATA_BAR_COUNT] {
    let mut levels = [0u8; DATA_BAR_COUNT];
    for (level, group) in levels.iter_mut().zip(bits.chunks_exact(LEVEL_BITS)) {
        let group = group.iter().fold(0u8, |acc, b| (acc << 1) | b);
        // every 3-bit group appears in the Gray table
        *level = level_for_group(group).unwrap_or_default();
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::media_ref::decode_sequence;

    #[test]
    fn test_reproduces_fixtures() {
        assert_eq!(
            encode_media_ref(75_845_227_563).unwrap().to_string(),
            "05120643716777731637070"
        );
        assert_eq!(
            encode_media_ref(26_560_102_031).unwrap().to_string(),
            "06607602231707646147410"
        );
        assert_eq!(
            encode_media_ref(57_639_171_874).unwrap().data_levels(),
            [5, 7, 4, 1, 4, 6, 6, 0, 2, 4, 3, 4, 6, 7, 5, 5, 6, 0, 5, 0]
        );
    }

    #[test]
    fn test_edge_values() {
        assert_eq!(encode_media_ref(0).unwrap().to_string(), "03007017020705000010010");
        assert_eq!(
            encode_media_ref((1 << 37) - 1).unwrap().to_string(),
            "05555562555756556541540"
        );
    }

    #[test]
    fn test_decode_inverts_encode() {
        let mut value: u64 = 0x1234_5678;
        for _ in 0..200 {
            value = value.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let media_ref = value >> 27;
            let seq = encode_media_ref(media_ref).unwrap();
            assert_eq!(decode_sequence(&seq), Some(media_ref));
        }
    }

    #[test]
    fn test_too_wide() {
        assert_eq!(
            encode_media_ref(1 << 37),
            Err(ScanError::MediaRefTooWide(1 << 37))
        );
    }

    #[test]
    fn test_interleave_stride() {
        let mut bits = [0u8; CODED_BITS];
        bits[1] = 1;
        assert_eq!(interleave(&bits)[43], 1);
    }
}
