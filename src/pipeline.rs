//! Stage chaining.
//!
//! Every stage returns `Option`; the first `None` ends the scan. Stages are
//! reached through [`ScanStages`], whose provided methods are the real
//! implementations, so a test can replace a single stage. Intermediate
//! results are reported to a [`ScanObserver`], which never feeds back into
//! decoding.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::config::ScanConfig;
use crate::decoder::bars::BarQuantizer;
use crate::decoder::media_ref::decode_sequence;
use crate::decoder::rectify::Rectifier;
use crate::detector::boundary::BoundaryScanner;
use crate::detector::edges::EdgeMapper;
use crate::detector::ellipsoid::EllipsoidLocator;
use crate::detector::orientation::OrientationScanner;
use crate::error::ScanError;
use crate::models::{
    AngleDetail, BoundaryDetail, CodeSequence, EdgeMap, GridEllipsoid, MediaRef, PixelGrid,
};

/// Pipeline stages after grid construction, in order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Stage {
    /// Diagonal corner scan
    Edges,
    /// Logo fit
    Ellipsoid,
    /// Zero bar search
    Orientation,
    /// Last bar search
    Boundary,
    /// Code redraw
    Rectify,
    /// Bar quantization
    Bars,
    /// Media reference decoding
    Decode,
}

/// The stage implementations. Override a method to replace one stage.
pub trait ScanStages {
    /// Diagonal corner scan
    fn edges(&self, grid: &PixelGrid, config: &ScanConfig) -> Option<EdgeMap> {
        EdgeMapper::detect(grid, &config.edge)
    }

    /// Logo fit
    fn ellipsoid(
        &self,
        edges: &EdgeMap,
        grid: &PixelGrid,
        config: &ScanConfig,
    ) -> Option<GridEllipsoid> {
        EllipsoidLocator::locate(edges, grid.height(), &config.ellipsoid)
    }

    /// Zero bar search
    fn orientation(
        &self,
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        config: &ScanConfig,
    ) -> Option<AngleDetail> {
        OrientationScanner::scan(grid, ellipsoid, &config.orientation)
    }

    /// Last bar search
    fn boundary(
        &self,
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &ScanConfig,
    ) -> Option<BoundaryDetail> {
        BoundaryScanner::scan(grid, ellipsoid, angle, &config.boundary, &config.orientation)
    }

    /// Code redraw
    fn rectify(
        &self,
        capture: &RgbaImage,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &ScanConfig,
    ) -> Option<RgbaImage> {
        Rectifier::redraw(capture, ellipsoid, angle, &config.rectify)
    }

    /// Bar quantization
    fn bars(&self, strip: &RgbaImage, config: &ScanConfig) -> Option<CodeSequence> {
        BarQuantizer::parse_strip(strip, &config.bars)
    }

    /// Media reference decoding
    fn decode(&self, sequence: &CodeSequence) -> Option<MediaRef> {
        decode_sequence(sequence)
    }
}

/// The real stages
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStages;

impl ScanStages for DefaultStages {}

/// Receives intermediate results of a scan
#[allow(unused_variables)]
pub trait ScanObserver {
    /// Pixel grid built
    fn grid(&mut self, grid: &PixelGrid) {}
    /// Edge map found
    fn edges(&mut self, edges: &EdgeMap) {}
    /// Logo located
    fn ellipsoid(&mut self, ellipsoid: &GridEllipsoid) {}
    /// Zero bar found
    fn angle(&mut self, angle: &AngleDetail) {}
    /// Last bar found
    fn boundary(&mut self, boundary: &BoundaryDetail) {}
    /// Strip drawn
    fn strip(&mut self, strip: &RgbaImage) {}
    /// Bars read
    fn sequence(&mut self, sequence: &CodeSequence) {}
    /// CRC passed
    fn decoded(&mut self, media_ref: MediaRef) {}
    /// The scan ended without a result at `stage`
    fn rejected(&mut self, stage: Stage) {}
}

impl ScanObserver for () {}

/// Per-stage counters over any number of scans
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ScanTelemetry {
    /// Grids built
    pub frames: usize,
    /// Frames with an edge map
    pub edge_maps: usize,
    /// Frames with a plausible logo
    pub ellipsoids: usize,
    /// Frames with a zero bar
    pub angles: usize,
    /// Frames with a last bar
    pub boundaries: usize,
    /// Strips drawn
    pub strips: usize,
    /// Sequences with valid sentinels
    pub sequences: usize,
    /// Media references decoded
    pub decoded: usize,
    /// Where scans ended without a result
    pub rejections: BTreeMap<Stage, usize>,
}

impl ScanObserver for ScanTelemetry {
    fn grid(&mut self, _: &PixelGrid) {
        self.frames += 1;
    }
    fn edges(&mut self, _: &EdgeMap) {
        self.edge_maps += 1;
    }
    fn ellipsoid(&mut self, _: &GridEllipsoid) {
        self.ellipsoids += 1;
    }
    fn angle(&mut self, _: &AngleDetail) {
        self.angles += 1;
    }
    fn boundary(&mut self, _: &BoundaryDetail) {
        self.boundaries += 1;
    }
    fn strip(&mut self, _: &RgbaImage) {
        self.strips += 1;
    }
    fn sequence(&mut self, _: &CodeSequence) {
        self.sequences += 1;
    }
    fn decoded(&mut self, _: MediaRef) {
        self.decoded += 1;
    }
    fn rejected(&mut self, stage: Stage) {
        *self.rejections.entry(stage).or_default() += 1;
    }
}

/// Everything one scan produced, for diagnostics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ScanTrace {
    /// Grid dimensions
    pub grid_size: Option<(usize, usize)>,
    /// Edge map
    pub edges: Option<EdgeMap>,
    /// Logo fit
    pub ellipsoid: Option<GridEllipsoid>,
    /// Zero bar and rotation proxy
    pub angle: Option<AngleDetail>,
    /// Last bar
    pub boundary: Option<BoundaryDetail>,
    /// Strip as drawn
    #[serde(skip)]
    pub strip: Option<RgbaImage>,
    /// Bar levels
    pub sequence: Option<CodeSequence>,
    /// Result
    pub media_ref: Option<MediaRef>,
    /// Stage that ended the scan
    pub rejected_at: Option<Stage>,
}

impl ScanObserver for ScanTrace {
    fn grid(&mut self, grid: &PixelGrid) {
        self.grid_size = Some((grid.width(), grid.height()));
    }
    fn edges(&mut self, edges: &EdgeMap) {
        self.edges = Some(edges.clone());
    }
    fn ellipsoid(&mut self, ellipsoid: &GridEllipsoid) {
        self.ellipsoid = Some(*ellipsoid);
    }
    fn angle(&mut self, angle: &AngleDetail) {
        self.angle = Some(*angle);
    }
    fn boundary(&mut self, boundary: &BoundaryDetail) {
        self.boundary = Some(*boundary);
    }
    fn strip(&mut self, strip: &RgbaImage) {
        self.strip = Some(strip.clone());
    }
    fn sequence(&mut self, sequence: &CodeSequence) {
        self.sequence = Some(*sequence);
    }
    fn decoded(&mut self, media_ref: MediaRef) {
        self.media_ref = Some(media_ref);
    }
    fn rejected(&mut self, stage: Stage) {
        self.rejected_at = Some(stage);
    }
}

/// Scan a prepared capture and its inverse.
///
/// Errors only on input shape; a frame without a readable code is `Ok(None)`.
pub fn scan_capture<S, O>(
    capture: &RgbaImage,
    inverted: &RgbaImage,
    config: &ScanConfig,
    stages: &S,
    observer: &mut O,
) -> Result<Option<MediaRef>, ScanError>
where
    S: ScanStages + ?Sized,
    O: ScanObserver + ?Sized,
{
    let grid = PixelGrid::build(capture, inverted, &config.edge)?;
    observer.grid(&grid);
    Ok(run_stages(&grid, capture, config, stages, observer))
}

fn run_stages<S, O>(
    grid: &PixelGrid,
    capture: &RgbaImage,
    config: &ScanConfig,
    stages: &S,
    observer: &mut O,
) -> Option<MediaRef>
where
    S: ScanStages + ?Sized,
    O: ScanObserver + ?Sized,
{
    let edges = checkpoint(observer, Stage::Edges, stages.edges(grid, config))?;
    observer.edges(&edges);

    let ellipsoid = checkpoint(
        observer,
        Stage::Ellipsoid,
        stages.ellipsoid(&edges, grid, config),
    )?;
    observer.ellipsoid(&ellipsoid);

    let angle = checkpoint(
        observer,
        Stage::Orientation,
        stages.orientation(grid, &ellipsoid, config),
    )?;
    observer.angle(&angle);

    let boundary = checkpoint(
        observer,
        Stage::Boundary,
        stages.boundary(grid, &ellipsoid, &angle, config),
    )?;
    observer.boundary(&boundary);

    // the baseline from zero bar to last bar is a finer rotation than the
    // orientation proxy
    let redraw = boundary.redraw_angle();
    let strip = checkpoint(
        observer,
        Stage::Rectify,
        stages.rectify(capture, &ellipsoid, &redraw, config),
    )?;
    observer.strip(&strip);

    let sequence = checkpoint(observer, Stage::Bars, stages.bars(&strip, config))?;
    observer.sequence(&sequence);

    let media_ref = checkpoint(observer, Stage::Decode, stages.decode(&sequence))?;
    observer.decoded(media_ref);
    log::debug!("scan decoded {}", media_ref);
    Some(media_ref)
}

fn checkpoint<T, O: ScanObserver + ?Sized>(
    observer: &mut O,
    stage: Stage,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        log::debug!("scan stopped at {:?}", stage);
        observer.rejected(stage);
    }
    value
}
