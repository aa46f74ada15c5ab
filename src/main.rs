//! `bbox-review <image> [--dataset <root>]`
//!
//! Prints the stored object list of one image with pixel and percent
//! rectangles and labels.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bbox_review::config::{EditorConfig, PersistenceMode};
use bbox_review::constants::KNOWN_LABELS;
use bbox_review::geometry::pixels_to_percent;
use bbox_review::model::natural_size_of;
use bbox_review::{AnnotatedObject, EditorError, PersistenceError};

const USAGE: &str = "usage: bbox-review <image> [--dataset <root>]";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{}", USAGE)]
    Usage(String),

    #[error("Failed to read image {path:?}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

struct Args {
    image: PathBuf,
    dataset: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, CliError> {
    let mut image = None;
    let mut dataset = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                let root = args
                    .next()
                    .ok_or_else(|| CliError::Usage("--dataset needs a directory".to_string()))?;
                dataset = Some(PathBuf::from(root));
            }
            "-h" | "--help" => return Err(CliError::Usage("Show stored boxes for an image".to_string())),
            other if other.starts_with("--") => {
                return Err(CliError::Usage(format!("Unknown option '{other}'")));
            }
            other if image.is_none() => image = Some(PathBuf::from(other)),
            other => return Err(CliError::Usage(format!("Unexpected argument '{other}'"))),
        }
    }

    let image = image.ok_or_else(|| CliError::Usage("Missing image path".to_string()))?;
    Ok(Args { image, dataset })
}

fn print_object(index: usize, object: &AnnotatedObject, natural: (f64, f64)) -> Result<(), CliError> {
    let pct = pixels_to_percent(&object.rect, natural.0, natural.1)?;
    let [x, y, w, h] = object.rect.rounded().to_array();
    println!(
        "#{index:<3} px [{x}, {y}, {w}, {h}]  pct [{:.2}, {:.2}, {:.2}, {:.2}]  {}",
        pct.x,
        pct.y,
        pct.width,
        pct.height,
        object.direction.name()
    );

    let mut labels: Vec<String> = KNOWN_LABELS
        .iter()
        .map(|name| format!("{name}={}", object.label_display(name)))
        .collect();
    labels.extend(
        object
            .labels
            .keys()
            .filter(|name| !KNOWN_LABELS.contains(&name.as_str()))
            .map(|name| format!("{name}={}", object.label_display(name))),
    );
    println!("     {}", labels.join(" "));
    Ok(())
}

fn run(config: &EditorConfig, image: &Path) -> Result<(), CliError> {
    let (width, height) = natural_size_of(image).map_err(|source| CliError::Image {
        path: image.to_path_buf(),
        source,
    })?;

    let store = config.build_store();
    let key = config.image_key(image);
    let objects = store.load(&key)?;

    println!(
        "{key} ({width}x{height}), {} objects [{}]",
        objects.len(),
        store.display_name()
    );
    let natural = (f64::from(width), f64::from(height));
    for (index, object) in objects.iter().enumerate() {
        print_object(index, object, natural)?;
    }
    if objects.is_empty() {
        println!("     (no objects)");
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut config = EditorConfig::load_from_default_path();
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let mut image = args.image;
    if let Some(root) = args.dataset {
        if image.is_relative() && !image.exists() {
            image = root.join(&image);
        }
        config.persistence = PersistenceMode::Dataset { dataset_root: root };
    }

    match run(&config, &image) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
