use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use tokio::{fs::create_dir_all, fs::read_to_string, task::spawn_blocking};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vizion::{models::parse_segmentation, render::write_mask_png, Instance, ScanOrder};

/// Writes every instance mask of a saved segmentation response as a PNG.
#[derive(Parser, Debug)]
struct Args {
    /// Segmentation response JSON
    #[arg(short, long)]
    mask: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Run lengths walk the mask column by column
    #[arg(long)]
    column_major: bool,
}

fn sanitize(prompt: &str) -> String {
    prompt
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `{detection}_{prompt}_{instance}.png`. The detection index keeps names
/// unique when prompts repeat or sanitize to the same text.
fn mask_file_name(detection: usize, prompt: &str, instance: usize) -> String {
    format!("{}_{}_{}.png", detection, sanitize(prompt), instance)
}

fn write_instance(instance: Instance, order: ScanOrder, mask_filepath: PathBuf) -> Result<usize> {
    let mask = instance
        .decode_mask_with_order(order)
        .with_context(|| format!("decoding mask for \"{}\"", mask_filepath.display()))?;
    let file = File::create(&mask_filepath)?;
    write_mask_png(&mask, BufWriter::new(file))?;
    debug!(path = %mask_filepath.display(), area = mask.area(), "wrote mask");
    Ok(mask.area())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let args = Args::parse();

    if args.output.exists() && !args.output.is_dir() {
        bail!("Output \"{}\" is not a directory.", args.output.display());
    }
    create_dir_all(&args.output).await?;

    let content = read_to_string(&args.mask)
        .await
        .with_context(|| format!("reading response \"{}\"", args.mask.display()))?;
    let result = parse_segmentation(&content)?;

    let order = if args.column_major {
        ScanOrder::ColumnMajor
    } else {
        ScanOrder::RowMajor
    };

    let handles = result
        .results
        .into_iter()
        .enumerate()
        .flat_map(|(i, detection)| {
            let prompt = detection.prompt;
            detection
                .instances
                .into_iter()
                .enumerate()
                .map(move |(k, instance)| (mask_file_name(i, &prompt, k), instance))
        })
        .map(|(name, instance)| {
            let mask_filepath = args.output.join(name);
            spawn_blocking(move || write_instance(instance, order, mask_filepath))
        })
        .collect::<Vec<_>>();

    let areas = try_join_all(handles)
        .await?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    info!(
        masks = areas.len(),
        foreground = areas.iter().sum::<usize>(),
        "wrote masks to {}",
        args.output.display()
    );

    Ok(())
}
