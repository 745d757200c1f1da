//! Volume grid to PNG atlas
//!
//! Reads a 3D `.npy` array, log-scales it with `log10(grid + 1)` and writes
//! the resulting density/gradient atlas as a PNG. The normalization range is
//! the finite minimum and maximum of the scaled grid.

use anyhow::{bail, Context};
use clap::Parser;
use ndarray::Ix3;
use std::path::PathBuf;
use volcrate_core::{finite_range, AtlasOptions, DEFAULT_ATLAS_WIDTH};
use volcrate_io::{read_npy_file, write_atlas_png};

#[derive(Parser, Debug)]
#[command(name = "grid2png", about = "Pack a 3D .npy grid into a PNG atlas")]
struct Args {
    /// Input .npy file holding a 3D array
    input: PathBuf,

    /// Output PNG path
    output: PathBuf,

    /// Atlas width in pixels
    #[arg(long, default_value_t = DEFAULT_ATLAS_WIDTH)]
    width: u32,

    /// Skip the log10(grid + 1) scaling
    #[arg(long)]
    linear: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let array = read_npy_file(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    if array.ndim() != 3 {
        bail!("expected a 3D array, got shape {:?}", array.shape());
    }
    let mut grid = array.to_f64()?.into_dimensionality::<Ix3>()?;
    if !args.linear {
        grid.mapv_inplace(|v| (v + 1.0).log10());
    }

    let Some((vmin, vmax)) = finite_range(grid.iter().copied()) else {
        bail!("grid has no finite values");
    };
    log::info!("normalizing {:?} grid to [{}, {}]", grid.dim(), vmin, vmax);

    let options = AtlasOptions::default().with_image_width(args.width);
    let layout = write_atlas_png(grid.view(), vmin, vmax, &options, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "wrote {}x{} atlas with {} slices ({} rows x {} columns) to {}",
        layout.image_width,
        layout.image_height,
        layout.slices,
        layout.rows,
        layout.columns,
        args.output.display()
    );
    Ok(())
}
