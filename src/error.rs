/// Input-shape errors. Detection failures are not errors; stages report them
/// as `None`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The capture and its inverse differ in size
    #[error(
        "capture is {source_width}x{source_height} but its inverse is {inverted_width}x{inverted_height}"
    )]
    DimensionMismatch {
        /// Capture width
        source_width: u32,
        /// Capture height
        source_height: u32,
        /// Inverse width
        inverted_width: u32,
        /// Inverse height
        inverted_height: u32,
    },
    /// The frame has no pixels
    #[error("frame is empty")]
    EmptyFrame,
    /// A raw pixel buffer does not match its declared dimensions
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferLength {
        /// `width * height * 3`
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },
    /// The viewfinder rectangle is not inside the frame
    #[error("viewfinder {x},{y} {width}x{height} exceeds the {frame_width}x{frame_height} frame")]
    ViewfinderOutOfBounds {
        /// Viewfinder left edge
        x: u32,
        /// Viewfinder top edge
        y: u32,
        /// Viewfinder width
        width: u32,
        /// Viewfinder height
        height: u32,
        /// Frame width
        frame_width: u32,
        /// Frame height
        frame_height: u32,
    },
    /// A bar sequence does not have 23 entries
    #[error("bar sequence has {actual} levels, expected {expected}")]
    InvalidSequenceLength {
        /// Always 23
        expected: usize,
        /// Levels supplied
        actual: usize,
    },
    /// A bar level is above 7
    #[error("bar {index} has level {level}, levels range 0-7")]
    LevelOutOfRange {
        /// Bar position
        index: usize,
        /// Offending level
        level: u8,
    },
    /// A bar string contains something other than a digit 0-7
    #[error("bar {index} is {symbol:?}, expected a digit 0-7")]
    InvalidSymbol {
        /// Character position
        index: usize,
        /// Offending character
        symbol: char,
    },
    /// A media reference does not fit in 37 bits
    #[error("media reference {0} does not fit in 37 bits")]
    MediaRefTooWide(u64),
}
