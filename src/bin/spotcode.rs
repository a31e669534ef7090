use clap::{Parser, Subcommand};
use spotify_code::decoder::media_ref::spotify_bar_decode;
use spotify_code::models::DATA_BAR_COUNT;
use spotify_code::tools::{Dataset, load_rgba, measure_reading_rate};
use spotify_code::{
    CodeSequence, ScanConfig, ScanTrace, Scanner, SyntheticCode, Viewfinder, decode_levels,
    encode_media_ref, prepare_frame,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "spotcode", version, about = "Spotify Code scanner tools")]
struct Cli {
    /// JSON scan configuration; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log every stage decision
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single image
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Viewfinder as x,y,width,height (default: whole image)
        #[arg(long)]
        viewfinder: Option<String>,
    },
    /// Decode a bar string (23 levels, or the 20 data levels)
    Decode {
        levels: String,
    },
    /// Encode a media reference into bar levels
    Encode {
        media_ref: u64,
        /// Also render a synthetic code image
        #[arg(long)]
        png: Option<PathBuf>,
        /// Logo radius of the rendered code
        #[arg(long, default_value_t = 36)]
        radius: u32,
        /// Rotation of the rendered code in degrees, clockwise
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        rotate: f64,
    },
    /// Print every intermediate stage result of one scan as JSON
    DebugScan {
        #[arg(long)]
        image: PathBuf,
        /// Save the redrawn strip
        #[arg(long)]
        strip: Option<PathBuf>,
    },
    /// Compute reading rate on a labelled dataset
    ReadingRate {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        smoke: bool,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let scanner = match load_scanner(cli.config.as_deref()) {
        Ok(scanner) => scanner,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Command::Scan { image, viewfinder } => scan_cmd(&scanner, &image, viewfinder.as_deref()),
        Command::Decode { levels } => decode_cmd(&levels),
        Command::Encode {
            media_ref,
            png,
            radius,
            rotate,
        } => encode_cmd(media_ref, png.as_deref(), radius, rotate),
        Command::DebugScan { image, strip } => debug_scan_cmd(&scanner, &image, strip.as_deref()),
        Command::ReadingRate {
            root,
            limit,
            smoke,
            json,
        } => reading_rate_cmd(&scanner, root, limit, smoke, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn load_scanner(config: Option<&Path>) -> Result<Scanner, String> {
    let Some(path) = config else {
        return Ok(Scanner::from_env());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
    let config: ScanConfig = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
    Ok(Scanner::with_config(config))
}

fn parse_viewfinder(value: &str) -> Result<Viewfinder, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()
        .map_err(|e| format!("Invalid viewfinder {:?}: {}", value, e))?;
    match parts.as_slice() {
        &[x, y, width, height] => Ok(Viewfinder::new(x, y, width, height)),
        _ => Err(format!(
            "Invalid viewfinder {:?}: expected x,y,width,height",
            value
        )),
    }
}

fn scan_cmd(scanner: &Scanner, image: &Path, viewfinder: Option<&str>) -> Result<(), String> {
    let frame = load_rgba(image)
        .map_err(|e| format!("Failed to load image {}: {}", image.display(), e))?;
    let viewfinder = match viewfinder {
        Some(value) => parse_viewfinder(value)?,
        None => Viewfinder::full(frame.width(), frame.height()),
    };

    let start = Instant::now();
    let result = scanner
        .scan_rgba(&frame, &viewfinder)
        .map_err(|e| e.to_string())?;
    let elapsed = start.elapsed();

    println!(
        "Image: {} ({}x{})",
        image.display(),
        frame.width(),
        frame.height()
    );
    match result {
        Some(media_ref) => {
            println!("Media reference: {} ({:.2?})", media_ref, elapsed);
            Ok(())
        }
        None => Err(format!("No code found ({:.2?})", elapsed)),
    }
}

fn decode_cmd(levels: &str) -> Result<(), String> {
    let digits = levels
        .trim()
        .chars()
        .enumerate()
        .map(|(i, c)| {
            c.to_digit(8)
                .map(|d| d as u8)
                .ok_or_else(|| format!("Bar {} is {:?}, expected a digit 0-7", i, c))
        })
        .collect::<Result<Vec<u8>, String>>()?;

    let decoded = if digits.len() == DATA_BAR_COUNT {
        let mut data = [0u8; DATA_BAR_COUNT];
        data.copy_from_slice(&digits);
        spotify_bar_decode(&data)
    } else {
        decode_levels(&digits).map_err(|e| e.to_string())?
    };

    match decoded {
        Some(media_ref) => {
            println!("{}", media_ref);
            Ok(())
        }
        None => Err("Sequence does not pass the CRC".to_string()),
    }
}

fn encode_cmd(
    media_ref: u64,
    png: Option<&Path>,
    radius: u32,
    rotate: f64,
) -> Result<(), String> {
    let sequence = encode_media_ref(media_ref).map_err(|e| e.to_string())?;
    println!("{}", sequence);
    if let Some(path) = png {
        let image = SyntheticCode::with_radius(radius)
            .rotated(rotate)
            .render(&sequence);
        image
            .save(path)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        println!("Wrote {} ({}x{})", path.display(), image.width(), image.height());
    }
    Ok(())
}

fn debug_scan_cmd(scanner: &Scanner, image: &Path, strip: Option<&Path>) -> Result<(), String> {
    let frame = load_rgba(image)
        .map_err(|e| format!("Failed to load image {}: {}", image.display(), e))?;
    let prepared = prepare_frame(&frame, &Viewfinder::full(frame.width(), frame.height()))
        .map_err(|e| e.to_string())?;

    let mut trace = ScanTrace::default();
    scanner
        .scan_prepared(&prepared, &mut trace)
        .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&trace).map_err(|e| e.to_string())?;
    println!("{}", json);

    if let (Some(path), Some(drawn)) = (strip, trace.strip.as_ref()) {
        drawn
            .save(path)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        eprintln!("Strip written to {}", path.display());
    }
    if let Some(sequence) = trace.sequence.as_ref() {
        eprintln!("Levels: {}", describe_levels(sequence));
    }
    Ok(())
}

fn describe_levels(sequence: &CodeSequence) -> String {
    let data: String = sequence.data_levels().iter().map(|l| l.to_string()).collect();
    format!("{} (data {})", sequence, data)
}

fn reading_rate_cmd(
    scanner: &Scanner,
    root: Option<PathBuf>,
    limit: Option<usize>,
    smoke: bool,
    json: bool,
) -> Result<(), String> {
    let dataset = Dataset::from_env().with_overrides(root, limit, smoke);
    if !dataset.root.exists() {
        return Err(format!("Dataset root not found: {}", dataset.root.display()));
    }
    let images = dataset.images();
    if images.is_empty() {
        return Err(format!("No images found under {}", dataset.root.display()));
    }

    let start = Instant::now();
    let report = measure_reading_rate(scanner, images);
    let elapsed = start.elapsed();

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    println!("Spotify Code Reading Rate");
    println!("=========================\n");
    for outcome in &report.outcomes {
        let status = match (outcome.expected, outcome.decoded) {
            (_, _) if outcome.error.is_some() => "ERROR",
            (Some(_), Some(_)) if outcome.is_hit() => "OK",
            (Some(_), Some(_)) => "MISREAD",
            (Some(_), None) => "MISS",
            (None, Some(_)) => "READ",
            (None, None) => "-",
        };
        println!(
            "  [{}] {} -> {}",
            status,
            outcome.path.display(),
            outcome
                .decoded
                .map(|m| m.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }
    println!("\n=========================");
    println!(
        "Reading rate: {}/{} = {:.2}% ({} misreads, {} errors, {:.2?})",
        report.hits,
        report.labelled,
        report.percent(),
        report.misreads,
        report.errors,
        elapsed
    );
    for (stage, count) in &report.telemetry.rejections {
        println!("  stopped at {:?}: {}", stage, count);
    }
    Ok(())
}
