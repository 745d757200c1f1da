//! Transfer function preview
//!
//! Samples the three-bump transfer function, prints the client envelope and
//! optionally writes the preview strip as a PNG.

use clap::Parser;
use std::path::PathBuf;
use volcrate_algorithms::{BumpParameters, TransferFunctionTable, TransferFunctionWidget};
use volcrate_io::{encode_rgba_image, rgba_to_json};

#[derive(Parser, Debug)]
#[command(name = "transfer_function_preview", about = "Sample a three-bump transfer function")]
struct Args {
    /// Bump centers
    #[arg(long, num_args = 3, default_values_t = [0.1, 0.5, 0.8])]
    levels: Vec<f64>,

    /// Bump peak weights
    #[arg(long, num_args = 3, default_values_t = [0.4, 0.1, 0.1])]
    opacities: Vec<f64>,

    /// Bump spreads
    #[arg(long, num_args = 3, default_values_t = [0.1, 0.1, 0.1])]
    widths: Vec<f64>,

    /// Write the preview strip to this PNG
    #[arg(long)]
    output: Option<PathBuf>,
}

fn to_triple(values: &[f64], name: &str) -> anyhow::Result<[f64; 3]> {
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("--{} takes exactly three values", name))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut widget = TransferFunctionWidget::with_observer(
        BumpParameters::widget_default(),
        |table: &TransferFunctionTable| {
            let alpha = table.alpha();
            let peak = alpha.iter().copied().fold(0.0, f64::max);
            log::info!("table recomputed, peak opacity {:.4}", peak);
        },
    );
    widget.set_parameters(BumpParameters::new(
        to_triple(&args.levels, "levels")?,
        to_triple(&args.opacities, "opacities")?,
        to_triple(&args.widths, "widths")?,
    ));

    let rgba = widget.table().to_rgba_array().into_dyn();
    let mut envelope = serde_json::to_value(rgba_to_json(rgba.view())?)?;
    if let Some(src) = envelope.get_mut("src") {
        let len = src.as_str().map(str::len).unwrap_or(0);
        *src = serde_json::Value::String(format!("<{} byte data URI>", len));
    }
    println!("{}", serde_json::to_string_pretty(&envelope)?);

    if let Some(path) = args.output {
        std::fs::write(&path, encode_rgba_image(rgba.view())?)?;
        println!("wrote preview to {}", path.display());
    }
    Ok(())
}
