//! Scan pipeline behavior on synthetic frames: end to end reads, stage
//! short-circuiting and telemetry.

use image::RgbaImage;
use spotify_code::config::{ScanConfig, ZeroBarAnchor};
use spotify_code::models::{
    AngleDetail, BoundaryDetail, CodeSequence, EdgeMap, GridEllipsoid, MediaRef, PixelGrid, Point,
};
use spotify_code::pipeline::ScanTrace;
use spotify_code::{
    DefaultStages, PreparedFrame, ScanStages, ScanTelemetry, Scanner, Stage, SyntheticCode,
    Viewfinder, encode_media_ref, prepare_frame,
};

const REFS: [MediaRef; 5] = [75845227563, 26560102031, 57639171874, 0, (1 << 37) - 1];

fn prepare(frame: &RgbaImage) -> PreparedFrame {
    prepare_frame(frame, &Viewfinder::full(frame.width(), frame.height())).unwrap()
}

fn prepared_for(media_ref: MediaRef) -> PreparedFrame {
    prepared_with(&SyntheticCode::default(), media_ref)
}

fn prepared_with(code: &SyntheticCode, media_ref: MediaRef) -> PreparedFrame {
    let sequence = encode_media_ref(media_ref).unwrap();
    prepare(&code.render(&sequence))
}

/// Default frame with the logo centre moved by `(dx, dy)`
fn prepared_shifted(media_ref: MediaRef, dx: f64, dy: f64) -> PreparedFrame {
    let code = SyntheticCode::default();
    let sequence = encode_media_ref(media_ref).unwrap();
    let (width, height) = code.frame_size();
    let center = Point::new(108.0 + dx, 108.0 + dy);
    prepare(&code.render_at(&sequence, width, height, center))
}

/// Real stages, except `fail` which reports nothing
struct FailAt(Stage);

impl ScanStages for FailAt {
    fn edges(&self, grid: &PixelGrid, config: &ScanConfig) -> Option<EdgeMap> {
        (self.0 != Stage::Edges)
            .then(|| DefaultStages.edges(grid, config))
            .flatten()
    }

    fn ellipsoid(
        &self,
        edges: &EdgeMap,
        grid: &PixelGrid,
        config: &ScanConfig,
    ) -> Option<GridEllipsoid> {
        (self.0 != Stage::Ellipsoid)
            .then(|| DefaultStages.ellipsoid(edges, grid, config))
            .flatten()
    }

    fn orientation(
        &self,
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        config: &ScanConfig,
    ) -> Option<AngleDetail> {
        (self.0 != Stage::Orientation)
            .then(|| DefaultStages.orientation(grid, ellipsoid, config))
            .flatten()
    }

    fn boundary(
        &self,
        grid: &PixelGrid,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &ScanConfig,
    ) -> Option<BoundaryDetail> {
        (self.0 != Stage::Boundary)
            .then(|| DefaultStages.boundary(grid, ellipsoid, angle, config))
            .flatten()
    }

    fn rectify(
        &self,
        capture: &RgbaImage,
        ellipsoid: &GridEllipsoid,
        angle: &AngleDetail,
        config: &ScanConfig,
    ) -> Option<RgbaImage> {
        (self.0 != Stage::Rectify)
            .then(|| DefaultStages.rectify(capture, ellipsoid, angle, config))
            .flatten()
    }

    fn bars(&self, strip: &RgbaImage, config: &ScanConfig) -> Option<CodeSequence> {
        (self.0 != Stage::Bars)
            .then(|| DefaultStages.bars(strip, config))
            .flatten()
    }

    fn decode(&self, sequence: &CodeSequence) -> Option<MediaRef> {
        (self.0 != Stage::Decode)
            .then(|| DefaultStages.decode(sequence))
            .flatten()
    }
}

/// Bars read back as a sequence whose CRC fails
struct CorruptBars;

impl ScanStages for CorruptBars {
    fn bars(&self, strip: &RgbaImage, config: &ScanConfig) -> Option<CodeSequence> {
        let read = DefaultStages.bars(strip, config)?;
        let mut levels = *read.levels();
        levels[1] = (levels[1] + 7) % 8;
        CodeSequence::from_levels(&levels).ok().flatten()
    }
}

#[test]
fn test_synthetic_codes_scan() {
    let scanner = Scanner::new();
    for media_ref in REFS {
        let prepared = prepared_for(media_ref);
        assert_eq!(
            scanner.scan_prepared(&prepared, &mut ()),
            Ok(Some(media_ref)),
            "{media_ref}"
        );
    }
}

#[test]
fn test_shifted_codes_scan() {
    let scanner = Scanner::new();
    for media_ref in REFS {
        for (dx, dy) in [(1.0, 0.0), (0.0, 1.0), (1.0, 2.0), (2.0, 1.0), (2.0, 2.0)] {
            let prepared = prepared_shifted(media_ref, dx, dy);
            assert_eq!(
                scanner.scan_prepared(&prepared, &mut ()),
                Ok(Some(media_ref)),
                "{media_ref} shifted by ({dx}, {dy})"
            );
        }
    }
}

#[test]
fn test_scaled_codes_scan() {
    let scanner = Scanner::new();
    for media_ref in REFS {
        for radius in [30, 44, 56] {
            let prepared = prepared_with(&SyntheticCode::with_radius(radius), media_ref);
            assert_eq!(
                scanner.scan_prepared(&prepared, &mut ()),
                Ok(Some(media_ref)),
                "{media_ref} at radius {radius}"
            );
        }
    }
}

#[test]
fn test_rotated_codes_scan() {
    let scanner = Scanner::new();
    for media_ref in [75845227563, 26560102031] {
        for degrees in [-3.0, -2.0, -1.0, 1.0, 2.0, 3.0] {
            let code = SyntheticCode::default().rotated(degrees);
            let prepared = prepared_with(&code, media_ref);
            assert_eq!(
                scanner.scan_prepared(&prepared, &mut ()),
                Ok(Some(media_ref)),
                "{media_ref} rotated {degrees}"
            );
        }
    }
}

#[test]
fn test_rotated_scaled_and_shifted_codes_scan() {
    let scanner = Scanner::new();
    for media_ref in REFS {
        let sequence = encode_media_ref(media_ref).unwrap();
        for (radius, dx, dy, degrees) in [(44, 1.0, 2.0, -2.0), (30, 2.0, 1.0, 2.0)] {
            let code = SyntheticCode::with_radius(radius).rotated(degrees);
            let (width, height) = code.frame_size();
            let c = 3.0 * radius as f64;
            let frame = code.render_at(&sequence, width, height, Point::new(c + dx, c + dy));
            assert_eq!(
                scanner.scan_prepared(&prepare(&frame), &mut ()),
                Ok(Some(media_ref)),
                "{media_ref} radius {radius} at ({dx}, {dy}) rotated {degrees}"
            );
        }
    }
}

#[test]
fn test_baseline_rotation_follows_code() {
    let scanner = Scanner::new();
    for degrees in [-3.0f64, -1.0, 0.0, 1.0, 3.0] {
        let code = SyntheticCode::default().rotated(degrees);
        let prepared = prepared_with(&code, 75845227563);
        let mut trace = ScanTrace::default();
        assert_eq!(
            scanner.scan_prepared(&prepared, &mut trace),
            Ok(Some(75845227563))
        );
        let alpha = trace.boundary.unwrap().alpha_degree;
        assert!(
            (alpha - degrees.to_radians()).abs() < 0.005,
            "{degrees}: alpha {alpha}"
        );
        if degrees != 0.0 {
            assert_eq!(alpha.signum(), degrees.signum(), "{degrees}");
        }
    }
}

#[test]
fn test_first_hit_anchor_still_reads_upright_codes() {
    let mut config = ScanConfig::default();
    config.orientation.zero_bar_anchor = ZeroBarAnchor::FirstHit;
    let scanner = Scanner::with_config(config);
    let prepared = prepared_for(75845227563);
    assert_eq!(
        scanner.scan_prepared(&prepared, &mut ()),
        Ok(Some(75845227563))
    );
}

#[test]
fn test_every_single_stage_failure_short_circuits() {
    let stages = [
        Stage::Edges,
        Stage::Ellipsoid,
        Stage::Orientation,
        Stage::Boundary,
        Stage::Rectify,
        Stage::Bars,
        Stage::Decode,
    ];
    let prepared = prepared_for(75845227563);
    let scanner = Scanner::new();

    for (position, &stage) in stages.iter().enumerate() {
        let mut telemetry = ScanTelemetry::default();
        let result = scanner.scan_with_stages(&prepared, &FailAt(stage), &mut telemetry);
        assert_eq!(result, Ok(None), "{stage:?}");
        assert_eq!(telemetry.rejections.len(), 1);
        assert_eq!(telemetry.rejections.get(&stage), Some(&1));

        let reached = [
            telemetry.edge_maps,
            telemetry.ellipsoids,
            telemetry.angles,
            telemetry.boundaries,
            telemetry.strips,
            telemetry.sequences,
            telemetry.decoded,
        ];
        for (i, &count) in reached.iter().enumerate() {
            let expected = usize::from(i < position);
            assert_eq!(count, expected, "{stage:?} stage {i}");
        }
    }
}

#[test]
fn test_corrupt_bars_stop_at_decode() {
    let prepared = prepared_for(26560102031);
    let mut telemetry = ScanTelemetry::default();
    let result = Scanner::new().scan_with_stages(&prepared, &CorruptBars, &mut telemetry);
    assert_eq!(result, Ok(None));
    assert_eq!(telemetry.sequences, 1);
    assert_eq!(telemetry.rejections.get(&Stage::Decode), Some(&1));
}

#[test]
fn test_telemetry_accumulates() {
    let scanner = Scanner::new();
    let mut telemetry = ScanTelemetry::default();
    for media_ref in [75845227563, 26560102031] {
        let prepared = prepared_for(media_ref);
        scanner.scan_prepared(&prepared, &mut telemetry).unwrap();
    }
    let prepared = prepare(&RgbaImage::new(504, 216));
    scanner.scan_prepared(&prepared, &mut telemetry).unwrap();

    assert_eq!(telemetry.frames, 3);
    assert_eq!(telemetry.decoded, 2);
    assert_eq!(telemetry.rejections.get(&Stage::Edges), Some(&1));

    let json = serde_json::to_value(&telemetry).unwrap();
    assert_eq!(json["decoded"], 2);
    assert_eq!(json["rejections"]["Edges"], 1);
}

#[test]
fn test_config_from_json_changes_outcome() {
    let prepared = prepared_for(75845227563);
    let config: ScanConfig =
        serde_json::from_str(r#"{"bars": {"strip_threshold": 255}}"#).unwrap();
    let mut telemetry = ScanTelemetry::default();
    let result = Scanner::with_config(config).scan_prepared(&prepared, &mut telemetry);
    assert_eq!(result, Ok(None));
    assert_eq!(telemetry.strips, 1);
    assert_eq!(telemetry.rejections.get(&Stage::Bars), Some(&1));
}

#[test]
fn test_frame_too_short_for_logo() {
    let sequence = encode_media_ref(75845227563).unwrap();
    let frame = SyntheticCode::default().render(&sequence);
    // A band around the code leaves the logo taller than a quarter of the frame
    let band = Viewfinder::centered_band(frame.width(), frame.height(), 80);
    let prepared = prepare_frame(&frame, &band).unwrap();
    let mut telemetry = ScanTelemetry::default();
    let result = Scanner::new().scan_prepared(&prepared, &mut telemetry);
    assert_eq!(result, Ok(None));
    assert_eq!(telemetry.decoded, 0);
}
