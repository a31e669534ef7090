//! Fixed tables of the bar code.

/// Bar level to 3-bit group. Adjacent levels differ in one bit, so an
/// off-by-one height misread flips a single bit.
pub const GRAY_CODE: [u8; 8] = [0, 1, 3, 2, 6, 7, 5, 4];

/// Bits carried by one bar level
pub const LEVEL_BITS: usize = 3;
/// Bits carried by the 20 data bars
pub const CODED_BITS: usize = 60;
/// Payload plus CRC
pub const MESSAGE_BITS: usize = 45;
/// Width of the media reference
pub const PAYLOAD_BITS: usize = 37;
/// Width of the checksum
pub const CRC_BITS: usize = 8;

/// Interleaver stride; coprime with `CODED_BITS`
pub const INTERLEAVE_STRIDE: usize = 43;

/// Convolutional generator polynomials (octal, constraint length 7)
pub const GENERATORS: [u8; 2] = [0o155, 0o117];
/// Constraint length of the convolutional code
pub const CONSTRAINT_LENGTH: usize = 7;

/// Inverse of the punctured tail-biting generator matrix over GF(2).
///
/// Row `i` is a mask over the 45 received bits; the parity of
/// `row & received` is message bit `i`.
pub static INVERSE_GENERATOR: [u64; MESSAGE_BITS] = [
    0x00000001da80, 0x0000000ee8c0, 0x00000001dd00,
    0x0000000ed400, 0x000000774600, 0x0000000ee800,
    0x00000076a000, 0x000003ba3000, 0x000000774000,
    0x000003b50000, 0x00001dd18000, 0x000003ba0000,
    0x00001da80000, 0x0000ee8c0000, 0x00001dd00000,
    0x0000ed400000, 0x000774600000, 0x0000ee800000,
    0x00076a000000, 0x003ba3000000, 0x000774000000,
    0x003b50000000, 0x01dd18000000, 0x003ba0000000,
    0x01da80000000, 0x0ee8c0000000, 0x01dd00000000,
    0x0ed400000000, 0x174600000003, 0x0ee800000000,
    0x16a000000003, 0x1a300000001d, 0x174000000003,
    0x15000000001d, 0x1180000000ee, 0x1a000000001d,
    0x0800000000ed, 0x0c0000000774, 0x1000000000ee,
    0x00000000076a, 0x000000003ba3, 0x000000000774,
    0x000000003b50, 0x00000001dd18, 0x000000003ba0,
];

/// Level whose Gray group is `group`
pub fn level_for_group(group: u8) -> Option<u8> {
    GRAY_CODE.iter().position(|&g| g == group).map(|l| l as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_code_neighbours_differ_by_one_bit() {
        for pair in GRAY_CODE.windows(2) {
            assert_eq!((pair[0] ^ pair[1]).count_ones(), 1);
        }
    }

    #[test]
    fn test_level_for_group() {
        for level in 0..8u8 {
            assert_eq!(level_for_group(GRAY_CODE[level as usize]), Some(level));
        }
        assert_eq!(level_for_group(8), None);
    }

    #[test]
    fn test_inverse_generator_fits_message() {
        assert!(INVERSE_GENERATOR.iter().all(|row| *row >> MESSAGE_BITS == 0));
        assert!(INVERSE_GENERATOR.iter().all(|row| *row != 0));
    }
}
