/// Edge classification of a pixel, derived from a capture and its inverse.
///
/// The discriminant is the sum of two one-bit flags: 1 when the source pixel
/// sits inside the brightness band, 2 when the inverted pixel does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EdgeScore {
    /// Neither image falls inside the band
    #[default]
    NotEdge = 0,
    /// Only the source pixel falls inside the band
    PrimaryEdge = 1,
    /// Only the inverted pixel falls inside the band
    SecondaryEdge = 2,
    /// Both do
    CompoundEdge = 3,
}

impl EdgeScore {
    /// Combine the two band flags into a score
    pub fn from_flags(primary: bool, secondary: bool) -> Self {
        match (primary, secondary) {
            (false, false) => EdgeScore::NotEdge,
            (true, false) => EdgeScore::PrimaryEdge,
            (false, true) => EdgeScore::SecondaryEdge,
            (true, true) => EdgeScore::CompoundEdge,
        }
    }

    /// Any score other than `NotEdge`
    pub fn is_edge(self) -> bool {
        self != EdgeScore::NotEdge
    }

    /// Score is `CompoundEdge`
    pub fn is_compound(self) -> bool {
        self == EdgeScore::CompoundEdge
    }
}

/// A single grid pixel with its channels, coordinates and edge score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
    /// Column in the grid
    pub x: u32,
    /// Row in the grid
    pub y: u32,
    /// Edge classification
    pub score: EdgeScore,
}

impl Pixel {
    /// Sentinel returned for lookups outside the grid
    pub const OUTSIDE: Pixel = Pixel {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
        x: u32::MAX,
        y: u32::MAX,
        score: EdgeScore::NotEdge,
    };

    /// Build a pixel from its source channels and the matching inverted channels.
    ///
    /// A channel set passes the band test when every color channel satisfies
    /// `black <= c < white`.
    pub fn classify(
        source: [u8; 4],
        inverted: [u8; 4],
        x: u32,
        y: u32,
        black: u8,
        white: u8,
    ) -> Self {
        let primary = in_band(source, black, white);
        let secondary = in_band(inverted, black, white);
        Self {
            r: source[0],
            g: source[1],
            b: source[2],
            a: source[3],
            x,
            y,
            score: EdgeScore::from_flags(primary, secondary),
        }
    }

    /// Channels as an RGBA array
    pub fn channels(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[inline]
fn in_band(channels: [u8; 4], black: u8, white: u8) -> bool {
    channels[..3].iter().all(|&c| c >= black && c < white)
}
