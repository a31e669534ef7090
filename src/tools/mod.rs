//! Dataset helpers shared by the `spotcode` binary and the benches.
//!
//! A dataset is a directory tree of images, each optionally paired with a
//! label file holding the expected media reference.

use crate::frame::{Viewfinder, prepare_frame};
use crate::models::{BAR_COUNT, MediaRef};
use crate::pipeline::ScanTelemetry;
use crate::{Scanner, decode_levels};
use image::RgbaImage;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Positive count from the environment; unset, unparsable or `0` is `None`.
fn env_count(name: &str) -> Option<usize> {
    env::var(name)
        .ok()?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Load an image as RGBA.
///
/// With `SPOTCODE_MAX_DIM` set, frames whose longer side exceeds it are
/// downscaled first.
pub fn load_rgba<P: AsRef<Path>>(path: P) -> Result<RgbaImage, image::ImageError> {
    let img = image::open(path)?;
    let limit = env_count("SPOTCODE_MAX_DIM").and_then(|n| u32::try_from(n).ok());
    Ok(match limit {
        Some(side) if img.width().max(img.height()) > side => img
            .resize(side, side, image::imageops::FilterType::Triangle)
            .to_rgba8(),
        _ => img.to_rgba8(),
    })
}

/// Which images of a labelled directory tree to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Directory searched recursively
    pub root: PathBuf,
    /// Keep only the first `limit` images (sorted by path)
    pub limit: Option<usize>,
    /// Restrict to the paths listed in `<root>/_smoke.txt` when present
    pub smoke: bool,
}

impl Dataset {
    /// Read `SPOTCODE_DATASET_ROOT`, `SPOTCODE_BENCH_LIMIT` and `SPOTCODE_SMOKE`.
    pub fn from_env() -> Self {
        Self {
            root: env::var_os("SPOTCODE_DATASET_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("benches/images/spotify")),
            limit: env_count("SPOTCODE_BENCH_LIMIT"),
            smoke: env_flag("SPOTCODE_SMOKE"),
        }
    }

    /// Command-line values win over the environment.
    pub fn with_overrides(mut self, root: Option<PathBuf>, limit: Option<usize>, smoke: bool) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        self.limit = limit.or(self.limit);
        self.smoke |= smoke;
        self
    }

    /// Image paths in sorted order.
    pub fn images(&self) -> Vec<PathBuf> {
        let listed = if self.smoke { self.smoke_list() } else { None };
        let mut images = listed.unwrap_or_else(|| {
            let mut found = Vec::new();
            walk_images(&self.root, &mut found);
            found
        });
        images.sort();
        if let Some(limit) = self.limit {
            images.truncate(limit);
        }
        images
    }

    fn smoke_list(&self) -> Option<Vec<PathBuf>> {
        let listing = fs::read_to_string(self.root.join("_smoke.txt")).ok()?;
        let paths: Vec<PathBuf> = listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| self.root.join(line))
            .filter(|path| path.exists())
            .collect();
        (!paths.is_empty()).then_some(paths)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn walk_images(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            walk_images(&path, out);
        } else if is_image(&path) {
            out.push(path);
        }
    }
}

/// Label file next to an image: same stem, `.txt` extension.
pub fn label_path(image: &Path) -> PathBuf {
    image.with_extension("txt")
}

/// Read the expected media reference from a label file.
///
/// The first token that is not on a `#` line is either a decimal media
/// reference or a 23-digit bar string.
pub fn parse_expected_media_ref<P: AsRef<Path>>(txt_path: P) -> Option<MediaRef> {
    let content = fs::read_to_string(txt_path).ok()?;
    let token = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.split_whitespace().next())?;

    if token.len() != BAR_COUNT {
        return token.parse::<MediaRef>().ok();
    }
    let levels: Vec<u8> = token
        .chars()
        .map(|c| c.to_digit(8).map(|d| d as u8))
        .collect::<Option<_>>()?;
    decode_levels(&levels).ok().flatten()
}

/// Outcome of scanning one labelled image
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImageOutcome {
    /// Image path
    pub path: PathBuf,
    /// Reference from the label file, if any
    pub expected: Option<MediaRef>,
    /// Reference the scanner produced
    pub decoded: Option<MediaRef>,
    /// Load or input-shape error
    pub error: Option<String>,
}

impl ImageOutcome {
    /// Decoded and equal to the label
    pub fn is_hit(&self) -> bool {
        self.expected.is_some() && self.decoded == self.expected
    }
}

/// Reading rate over a dataset
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ReadingRate {
    /// Images attempted
    pub images: usize,
    /// Images with a label file
    pub labelled: usize,
    /// Labelled images decoded to their label
    pub hits: usize,
    /// Images decoded to something other than their label
    pub misreads: usize,
    /// Images that failed to load or were rejected on shape
    pub errors: usize,
    /// Per-stage counters
    pub telemetry: ScanTelemetry,
    /// Individual results
    pub outcomes: Vec<ImageOutcome>,
}

impl ReadingRate {
    /// Hits over labelled images, as a percentage
    pub fn percent(&self) -> f64 {
        if self.labelled == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / self.labelled as f64
        }
    }

    /// Record one outcome
    pub fn record(&mut self, outcome: ImageOutcome) {
        self.images += 1;
        self.errors += usize::from(outcome.error.is_some());
        if outcome.expected.is_some() {
            self.labelled += 1;
            if outcome.is_hit() {
                self.hits += 1;
            } else if outcome.decoded.is_some() {
                self.misreads += 1;
            }
        }
        self.outcomes.push(outcome);
    }
}

/// Scan every image and compare against its label file.
pub fn measure_reading_rate<I>(scanner: &Scanner, images: I) -> ReadingRate
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut report = ReadingRate::default();
    for path in images {
        let expected = parse_expected_media_ref(label_path(&path));
        let result = load_rgba(&path).map_err(|e| e.to_string()).and_then(|frame| {
            let viewfinder = Viewfinder::full(frame.width(), frame.height());
            prepare_frame(&frame, &viewfinder)
                .and_then(|prepared| scanner.scan_prepared(&prepared, &mut report.telemetry))
                .map_err(|e| e.to_string())
        });
        if let Err(e) = &result {
            log::debug!("{}: {}", path.display(), e);
        }
        let (decoded, error) = match result {
            Ok(decoded) => (decoded, None),
            Err(e) => (None, Some(e)),
        };
        report.record(ImageOutcome {
            path,
            expected,
            decoded,
            error,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fresh directory per test under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("spotcode_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_label_decimal_after_comment() {
        let dir = scratch_dir("label_decimal");
        let path = dir.join("cover.txt");
        fs::write(&path, "# cover art\n\n75845227563\n").unwrap();
        assert_eq!(parse_expected_media_ref(&path), Some(75845227563));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_label_bar_string() {
        let dir = scratch_dir("label_bars");
        let path = dir.join("bars.txt");
        fs::write(&path, "06607602231707646147410 scanned by hand\n").unwrap();
        assert_eq!(parse_expected_media_ref(&path), Some(26560102031));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_label_rejects_garbage() {
        let dir = scratch_dir("label_garbage");
        let words = dir.join("words.txt");
        fs::write(&words, "foo bar baz\n").unwrap();
        let not_octal = dir.join("digits.txt");
        fs::write(&not_octal, "08607602231707646147410\n").unwrap();
        let comments = dir.join("comments.txt");
        fs::write(&comments, "# nothing here\n").unwrap();

        assert_eq!(parse_expected_media_ref(&words), None);
        assert_eq!(parse_expected_media_ref(&not_octal), None);
        assert_eq!(parse_expected_media_ref(&comments), None);
        assert_eq!(parse_expected_media_ref(dir.join("missing.txt")), None);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_dataset_walks_sorted_and_limits() {
        let dir = scratch_dir("dataset_walk");
        fs::create_dir_all(dir.join("nested")).unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "nested/c.bmp"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let dataset = Dataset {
            root: dir.clone(),
            limit: None,
            smoke: false,
        };
        let names: Vec<_> = dataset
            .images()
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("b.png"),
                PathBuf::from("nested/c.bmp"),
            ]
        );

        let limited = Dataset {
            limit: Some(2),
            ..dataset
        };
        assert_eq!(limited.images().len(), 2);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_smoke_list_filters_and_falls_back() {
        let dir = scratch_dir("dataset_smoke");
        for name in ["a.png", "b.png"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let dataset = Dataset {
            root: dir.clone(),
            limit: None,
            smoke: true,
        };
        // no list yet: every image
        assert_eq!(dataset.images().len(), 2);

        fs::write(dir.join("_smoke.txt"), "# quick set\nb.png\nmissing.png\n").unwrap();
        assert_eq!(dataset.images(), vec![dir.join("b.png")]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_overrides_win() {
        let base = Dataset {
            root: PathBuf::from("env-root"),
            limit: Some(5),
            smoke: false,
        };
        let kept = base.clone().with_overrides(None, None, false);
        assert_eq!(kept, base);

        let replaced = base.with_overrides(Some(PathBuf::from("cli-root")), Some(1), true);
        assert_eq!(replaced.root, PathBuf::from("cli-root"));
        assert_eq!(replaced.limit, Some(1));
        assert!(replaced.smoke);
    }

    #[test]
    fn test_reading_rate_counts() {
        let mut rate = ReadingRate::default();
        let outcome = |expected, decoded, error: Option<&str>| ImageOutcome {
            path: PathBuf::from("x.png"),
            expected,
            decoded,
            error: error.map(str::to_string),
        };
        rate.record(outcome(Some(1), Some(1), None));
        rate.record(outcome(Some(1), Some(2), None));
        rate.record(outcome(Some(1), None, None));
        rate.record(outcome(None, Some(3), None));
        rate.record(outcome(None, None, Some("bad png")));

        assert_eq!(rate.images, 5);
        assert_eq!(rate.labelled, 3);
        assert_eq!(rate.hits, 1);
        assert_eq!(rate.misreads, 1);
        assert_eq!(rate.errors, 1);
        assert!((rate.percent() - 100.0 / 3.0).abs() < 1e-9);
    }
}
