/// Orientation of a located edge point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EdgeDirection {
    /// Vertical edge
    NS,
    /// Horizontal edge
    EW,
    /// Diagonal running down-right
    SE,
    /// Diagonal running down-left
    SW,
}

/// A located edge point
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EdgeRecord {
    /// Grid column
    pub x: u32,
    /// Grid row
    pub y: u32,
    /// Matched pattern
    pub direction: EdgeDirection,
}

impl EdgeRecord {
    /// Create a new record
    pub fn new(x: u32, y: u32, direction: EdgeDirection) -> Self {
        Self { x, y, direction }
    }
}

/// Ordered edge points found in one frame
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeMap {
    records: Vec<EdgeRecord>,
}

impl EdgeMap {
    /// Wrap records in scan order
    pub fn new(records: Vec<EdgeRecord>) -> Self {
        Self { records }
    }

    /// All records
    pub fn records(&self) -> &[EdgeRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with the given direction
    pub fn with_direction(
        &self,
        direction: EdgeDirection,
    ) -> impl Iterator<Item = &EdgeRecord> + '_ {
        self.records.iter().filter(move |r| r.direction == direction)
    }

    /// Count of records with the given direction
    pub fn count(&self, direction: EdgeDirection) -> usize {
        self.with_direction(direction).count()
    }
}
