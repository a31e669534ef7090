//! Rocksoft-parameterized CRC and the checksum carried by the bar code

use super::tables::{CRC_BITS, PAYLOAD_BITS};

/// A CRC variant described by the Rocksoft model parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcModel {
    /// Register width in bits, 1 to 32
    pub width: u32,
    /// Generator polynomial without the leading term
    pub poly: u32,
    /// Initial register value
    pub init: u32,
    /// Feed each input byte least significant bit first
    pub reflect_in: bool,
    /// Reverse the register before the final xor
    pub reflect_out: bool,
    /// Final xor value
    pub xor_out: u32,
}

impl CrcModel {
    /// CRC-8 protecting the media reference
    pub const SPOTIFY: CrcModel = CrcModel {
        width: 8,
        poly: 0x07,
        init: 0x00,
        reflect_in: true,
        reflect_out: true,
        xor_out: 0xFF,
    };

    /// Checksum of `data`
    pub fn checksum(&self, data: &[u8]) -> u32 {
        debug_assert!((1..=32).contains(&self.width));
        let mask = if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        let top = self.width - 1;

        let mut reg = self.init & mask;
        for &byte in data {
            for k in 0..8 {
                let input = if self.reflect_in {
                    (byte >> k) & 1
                } else {
                    (byte >> (7 - k)) & 1
                };
                let feedback = ((reg >> top) & 1) ^ input as u32;
                reg = (reg << 1) & mask;
                if feedback == 1 {
                    reg ^= self.poly & mask;
                }
            }
        }

        if self.reflect_out {
            reg = reg.reverse_bits() >> (32 - self.width);
        }
        (reg ^ self.xor_out) & mask
    }
}

/// Payload bits packed most significant first, bit 0 of the payload leading,
/// padded with zeros to whole bytes
pub fn payload_bytes(payload: u64) -> [u8; 5] {
    let mut bytes = [0u8; 5];
    for j in 0..PAYLOAD_BITS {
        if (payload >> j) & 1 == 1 {
            bytes[j / 8] |= 0x80 >> (j % 8);
        }
    }
    bytes
}

/// CRC-8 of a 37-bit payload
pub fn payload_crc(payload: u64) -> u8 {
    CrcModel::SPOTIFY.checksum(&payload_bytes(payload)) as u8
}

/// CRC field of a 45-bit message (bits 37..45, first bit most significant)
pub fn message_crc(message: u64) -> u8 {
    (0..CRC_BITS).fold(0u8, |crc, k| {
        crc | ((((message >> (PAYLOAD_BITS + k)) & 1) as u8) << (CRC_BITS - 1 - k))
    })
}

/// Append the CRC to a payload, producing the 45-bit message
pub fn attach_crc(payload: u64) -> u64 {
    let crc = payload_crc(payload);
    (0..CRC_BITS).fold(payload, |message, k| {
        message | ((((crc >> (CRC_BITS - 1 - k)) & 1) as u64) << (PAYLOAD_BITS + k))
    })
}

/// A 45-bit message is valid when its CRC field matches its payload
pub fn check_spotify_crc(message: u64) -> bool {
    let payload = message & ((1u64 << PAYLOAD_BITS) - 1);
    message_crc(message) == payload_crc(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn test_catalogue_check_values() {
        assert_eq!(CrcModel::SPOTIFY.checksum(CHECK), 0xDF);

        let smbus = CrcModel {
            reflect_in: false,
            reflect_out: false,
            xor_out: 0,
            ..CrcModel::SPOTIFY
        };
        assert_eq!(smbus.checksum(CHECK), 0xF4);

        let rohc = CrcModel {
            init: 0xFF,
            xor_out: 0,
            ..CrcModel::SPOTIFY
        };
        assert_eq!(rohc.checksum(CHECK), 0xD0);

        let crc32 = CrcModel {
            width: 32,
            poly: 0x04C1_1DB7,
            init: 0xFFFF_FFFF,
            reflect_in: true,
            reflect_out: true,
            xor_out: 0xFFFF_FFFF,
        };
        assert_eq!(crc32.checksum(CHECK), 0xCBF4_3926);
    }

    #[test]
    fn test_empty_and_zero_input() {
        assert_eq!(CrcModel::SPOTIFY.checksum(&[]), 0xFF);
        assert_eq!(CrcModel::SPOTIFY.checksum(&[0]), 0xFF);
    }

    #[test]
    fn test_payload_packing() {
        assert_eq!(payload_bytes(1), [0x80, 0, 0, 0, 0]);
        assert_eq!(payload_bytes(75_845_227_563), [0xd4, 0x2a, 0x5d, 0x15, 0x88]);
        assert_eq!(payload_bytes(26_560_102_031), [0xf1, 0x7f, 0x58, 0xf4, 0x60]);
        assert_eq!(payload_bytes((1 << 37) - 1), [0xff, 0xff, 0xff, 0xff, 0xf8]);
    }

    #[test]
    fn test_fixture_crcs() {
        assert_eq!(payload_crc(75_845_227_563), 0x54);
        assert_eq!(payload_crc(26_560_102_031), 0xA3);
        assert_eq!(payload_crc(57_639_171_874), 0xCC);
        assert_eq!(payload_crc(0), 0xFF);
        assert_eq!(payload_crc(1), 0xB9);
    }

    #[test]
    fn test_check_spotify_crc() {
        let message = attach_crc(75_845_227_563);
        assert_eq!(message_crc(message), 0x54);
        assert!(check_spotify_crc(message));

        // any single flipped bit breaks the check
        for bit in 0..45 {
            assert!(!check_spotify_crc(message ^ (1 << bit)), "bit {}", bit);
        }
    }
}
