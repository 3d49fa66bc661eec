use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::{
    collections::HashSet,
    fs::{create_dir, read, read_dir, read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vizion::{models::parse_segmentation, render::apply_mask, ScanOrder};

/// Masks an image with one instance of a saved segmentation response.
#[derive(Parser, Debug)]
struct Args {
    /// PNG image, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG, or a directory
    #[arg(short, long)]
    output: PathBuf,

    /// Segmentation response JSON, or a directory of them
    #[arg(short, long)]
    mask: PathBuf,

    /// Detection index within the response
    #[arg(long)]
    index: Option<usize>,

    /// Detection prompt within the response
    #[arg(long)]
    prompt: Option<String>,

    /// Instance index within the selected detection
    #[arg(long, default_value_t = 0)]
    instance: usize,

    /// Run lengths walk the mask column by column
    #[arg(long)]
    column_major: bool,
}

impl Args {
    fn scan_order(&self) -> ScanOrder {
        if self.column_major {
            ScanOrder::ColumnMajor
        } else {
            ScanOrder::RowMajor
        }
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("Invalid file name \"{}\"", path.display()))
}

fn perform_segmentation(
    image_filepath: &Path,
    segment_filepath: &Path,
    mask_filepath: &Path,
    args: &Args,
) -> Result<()> {
    let image = read(image_filepath)
        .with_context(|| format!("reading image \"{}\"", image_filepath.display()))?;

    let content = read_to_string(mask_filepath)
        .with_context(|| format!("reading response \"{}\"", mask_filepath.display()))?;
    let result = parse_segmentation(&content)?;

    let detection = match (args.index, &args.prompt) {
        (Some(index), _) => result
            .results
            .get(index)
            .ok_or_else(|| anyhow!("Detection index {} out of range", index))?,
        (None, Some(prompt)) => result
            .detection(prompt)
            .ok_or_else(|| anyhow!("Prompt \"{}\" was not found.", prompt))?,
        (None, None) => bail!("Either index or prompt must be provided."),
    };

    let instance = detection.instances.get(args.instance).ok_or_else(|| {
        anyhow!(
            "Prompt \"{}\" has {} instance(s), requested {}",
            detection.prompt,
            detection.instances.len(),
            args.instance
        )
    })?;

    let mask = instance.decode_mask_with_order(args.scan_order())?;
    let segmented_image = apply_mask(&image, &mask)?;
    write(segment_filepath, segmented_image)?;

    info!(
        image = %image_filepath.display(),
        prompt = %detection.prompt,
        confidence = instance.confidence,
        area = mask.area(),
        "wrote {}",
        segment_filepath.display()
    );

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();

    match (
        args.input.is_dir(),
        args.mask.is_dir(),
        args.output.is_dir(),
        args.output.exists(),
    ) {
        (false, false, false, _) => {
            perform_segmentation(&args.input, &args.output, &args.mask, &args)?;
        }
        (true, true, true, _) | (true, true, false, false) => {
            let mut mask_file_stems = HashSet::new();
            for entry in read_dir(&args.mask)? {
                let path = entry?.path();
                if path.extension().map_or(true, |extension| extension != "json") {
                    warn!(path = %path.display(), "skipping non-JSON response file");
                    continue;
                }
                mask_file_stems.insert(file_stem(&path)?);
            }

            let mut image_filepaths = Vec::new();
            for entry in read_dir(&args.input)? {
                let path = entry?.path();
                if !mask_file_stems.contains(&file_stem(&path)?) {
                    bail!("Response not found for image \"{}\"", path.display());
                }
                image_filepaths.push(path);
            }

            if !args.output.exists() {
                create_dir(&args.output)?;
            }

            for image_filepath in image_filepaths.drain(..) {
                let image_stem = file_stem(&image_filepath)?;
                let segment_filepath = args.output.join(format!("{}.png", image_stem));
                let mask_filepath = args.mask.join(format!("{}.json", image_stem));

                perform_segmentation(&image_filepath, &segment_filepath, &mask_filepath, &args)?;
            }
        }
        _ => bail!("Invalid combination of input, output, and mask paths."),
    }

    Ok(())
}
