use crate::error::ScanError;

/// Number of bars in a Spotify Code
pub const BAR_COUNT: usize = 23;
/// Number of data bars (bars minus the three sentinels)
pub const DATA_BAR_COUNT: usize = 20;
/// Highest bar level
pub const MAX_LEVEL: u8 = 7;
/// Sentinel positions and their required levels
pub const SENTINELS: [(usize, u8); 3] = [(0, 0), (11, 7), (22, 0)];
/// Width of a media reference in bits
pub const MEDIA_REF_BITS: u32 = 37;

/// Decoded 37-bit media reference
pub type MediaRef = u64;

/// Validated sequence of 23 bar levels with correct sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CodeSequence {
    levels: [u8; BAR_COUNT],
}

impl CodeSequence {
    /// Validate raw levels.
    ///
    /// Returns `Ok(None)` when the shape is right but a sentinel is wrong
    /// (a routine misread), and an error for a wrong length or a level above 7.
    pub fn from_levels(levels: &[u8]) -> Result<Option<Self>, ScanError> {
        let levels: [u8; BAR_COUNT] =
            levels
                .try_into()
                .map_err(|_| ScanError::InvalidSequenceLength {
                    expected: BAR_COUNT,
                    actual: levels.len(),
                })?;
        if let Some((index, &level)) = levels.iter().enumerate().find(|(_, l)| **l > MAX_LEVEL) {
            return Err(ScanError::LevelOutOfRange { index, level });
        }
        if !sentinels_valid(&levels) {
            log::debug!("sequence rejected: sentinel mismatch {:?}", levels);
            return Ok(None);
        }
        Ok(Some(Self { levels }))
    }

    /// Parse a 23-digit string such as `"05120643716777731637070"`
    pub fn parse(digits: &str) -> Result<Option<Self>, ScanError> {
        let levels = digits
            .trim()
            .chars()
            .enumerate()
            .map(|(index, c)| {
                c.to_digit(10)
                    .filter(|d| *d <= MAX_LEVEL as u32)
                    .map(|d| d as u8)
                    .ok_or(ScanError::InvalidSymbol { index, symbol: c })
            })
            .collect::<Result<Vec<u8>, ScanError>>()?;
        Self::from_levels(&levels)
    }

    /// All 23 levels
    pub fn levels(&self) -> &[u8; BAR_COUNT] {
        &self.levels
    }

    /// The 20 data levels: indices 1-10 followed by 12-21
    pub fn data_levels(&self) -> [u8; DATA_BAR_COUNT] {
        let mut out = [0u8; DATA_BAR_COUNT];
        out[..10].copy_from_slice(&self.levels[1..11]);
        out[10..].copy_from_slice(&self.levels[12..22]);
        out
    }

    /// Rebuild a full sequence from 20 data levels
    pub fn from_data_levels(data: &[u8; DATA_BAR_COUNT]) -> Self {
        let mut levels = [0u8; BAR_COUNT];
        levels[1..11].copy_from_slice(&data[..10]);
        levels[11] = MAX_LEVEL;
        levels[12..22].copy_from_slice(&data[10..]);
        Self { levels }
    }
}

impl std::fmt::Display for CodeSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for level in self.levels {
            write!(f, "{}", level)?;
        }
        Ok(())
    }
}

/// Sentinel bars carry their fixed levels
pub fn sentinels_valid(levels: &[u8]) -> bool {
    levels.len() == BAR_COUNT
        && SENTINELS
            .iter()
            .all(|&(index, level)| levels[index] == level)
}
