use spotify_code::tools::Dataset;
use spotify_code::{CodeSequence, SyntheticCode};
use image::RgbaImage;
use std::path::PathBuf;

pub fn collect_dataset_images() -> (PathBuf, Vec<PathBuf>) {
    let dataset = Dataset::from_env();
    let images = dataset.images();
    (dataset.root, images)
}

pub fn synthetic_frame(digits: &str) -> RgbaImage {
    let sequence = CodeSequence::parse(digits)
        .ok()
        .flatten()
        .expect("benchmark fixture is a valid sequence");
    SyntheticCode::default().render(&sequence)
}
