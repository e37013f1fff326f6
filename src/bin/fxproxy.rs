use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fxproxy", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an effect stack to a PNG.
    Apply(ApplyArgs),
    /// Rasterize an SVG, optionally through an effect stack.
    Svg(SvgArgs),
    /// Print the margin an effect stack needs, as JSON.
    Margin(MarginArgs),
}

#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Input PNG (or any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Effect stack JSON.
    #[arg(long)]
    stack: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Device pixels per document unit the stack parameters are scaled by.
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

#[derive(Parser, Debug)]
struct SvgArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output width in document units. Defaults to the SVG's own width.
    #[arg(long)]
    width: Option<f64>,

    /// Output height in document units. Defaults to the SVG's own height.
    #[arg(long)]
    height: Option<f64>,

    /// Optional effect stack JSON.
    #[arg(long)]
    stack: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

#[derive(Parser, Debug)]
struct MarginArgs {
    /// Effect stack JSON.
    #[arg(long)]
    stack: PathBuf,

    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Svg(args) => cmd_svg(args),
        Command::Margin(args) => cmd_margin(args),
    }
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let stack = read_stack(&args.stack)?;
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let src = fxproxy::decode_image(&bytes)
        .with_context(|| format!("decode image '{}'", args.in_path.display()))?;

    let out = run_stack(&src, &stack, args.pixel_ratio)?;
    write_png(&args.out, &out)
}

fn cmd_svg(args: SvgArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read svg '{}'", args.in_path.display()))?;
    let (clean, report) = fxproxy::sanitize_svg(&text)
        .with_context(|| format!("sanitize svg '{}'", args.in_path.display()))?;
    if report != fxproxy::SanitizeReport::default() {
        tracing::info!(
            elements = report.removed_elements,
            attributes = report.removed_attributes,
            "sanitized svg"
        );
    }

    let decoder = fxproxy::SvgDecoder::with_system_fonts();
    let tree = decoder
        .parse(&clean)
        .with_context(|| format!("parse svg '{}'", args.in_path.display()))?;
    let size = tree.size();
    let w = args.width.unwrap_or(f64::from(size.width()));
    let h = args.height.unwrap_or(f64::from(size.height()));
    let (dw, dh) = fxproxy::device_size(fxproxy::Rect::new(0.0, 0.0, w, h), args.pixel_ratio);
    let raster = decoder.decode(&clean, dw, dh)?;

    let out = match &args.stack {
        Some(path) => run_stack(&raster, &read_stack(path)?, args.pixel_ratio)?,
        None => raster,
    };
    write_png(&args.out, &out)
}

fn cmd_margin(args: MarginArgs) -> anyhow::Result<()> {
    let stack = read_stack(&args.stack)?;
    let margin = fxproxy::margin_for(&stack, args.pixel_ratio);
    println!("{}", serde_json::to_string_pretty(&margin)?);
    Ok(())
}

fn read_stack(path: &Path) -> anyhow::Result<fxproxy::EffectStackConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read effect stack '{}'", path.display()))?;
    let stack = fxproxy::EffectStackConfig::from_json_str(&text)
        .with_context(|| format!("parse effect stack '{}'", path.display()))?;
    Ok(stack)
}

// Pad `src` by the stack's margin, then run the stack at device scale.
fn run_stack(
    src: &fxproxy::PixelBuffer,
    stack: &fxproxy::EffectStackConfig,
    pixel_ratio: f64,
) -> anyhow::Result<fxproxy::PixelBuffer> {
    let margin = fxproxy::margin_for(stack, pixel_ratio);
    let width = src.width() + margin.left + margin.right;
    let height = src.height() + margin.top + margin.bottom;
    let mut canvas = fxproxy::PixelBuffer::new(width, height)?;
    canvas.draw_over(src, margin.left as i32, margin.top as i32);
    tracing::debug!(width, height, ?margin, "padded input");

    let out = fxproxy::apply_stack(&canvas, &stack.scaled(pixel_ratio))?;
    Ok(out)
}

fn write_png(path: &Path, buffer: &fxproxy::PixelBuffer) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let png = fxproxy::encode_png(buffer)?;
    std::fs::write(path, png).with_context(|| format!("write png '{}'", path.display()))?;

    eprintln!("wrote {}", path.display());
    Ok(())
}
