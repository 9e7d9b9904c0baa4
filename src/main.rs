// Command-line runner for the `pixel_relation` library: decodes an image into a
// pixel grid, selects cells, recolors the selection around a base pixel and
// exports the result as a PNG.

use anyhow::{Context, bail};
use clap::Parser;
use log::info;
use pixel_relation::{GridSize, PixelGrid, Point, Session, SessionConfig, save_png, suggested_filename};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Recolor a pixel-art selection around a base pixel")]
struct Args {
    /// Image to rasterize into a pixel grid.
    input: PathBuf,

    /// JSON session configuration; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid edge length (16 or 32).
    #[arg(long)]
    size: Option<u32>,

    /// Select an inclusive rectangle of cells, `x0,y0,x1,y1`. Repeatable.
    #[arg(long = "select", value_parser = parse_rect)]
    selections: Vec<(Point, Point)>,

    /// Select every cell.
    #[arg(long)]
    select_all: bool,

    /// Base cell index; defaults to the first selected cell.
    #[arg(long)]
    base: Option<usize>,

    /// New base color as hex; omit to export the grid unchanged.
    #[arg(long)]
    color: Option<String>,

    /// Keep the base pixel's saturation and lightness, only change hue.
    #[arg(long)]
    keep_lightness: bool,

    /// Background hex used with --flatten.
    #[arg(long)]
    background: Option<String>,

    /// Flatten onto the background instead of keeping transparency.
    #[arg(long)]
    flatten: bool,

    /// Only export selected cells.
    #[arg(long)]
    only_selected: bool,

    /// Export upscale factor.
    #[arg(long)]
    scale: Option<f32>,

    /// Output PNG path; defaults to the suggested filename.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_rect(value: &str) -> Result<(Point, Point), String> {
    let numbers = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid rectangle {value:?}: {err}"))?;
    match numbers[..] {
        [x0, y0, x1, y1] => Ok((Point::new(x0, y0), Point::new(x1, y1))),
        _ => Err(format!("expected x0,y0,x1,y1, got {value:?}")),
    }
}

fn merge_config(args: &Args) -> anyhow::Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(size) = args.size {
        config.grid_size = GridSize::try_from(size)?;
    }
    if let Some(background) = &args.background {
        config.background = background.clone();
    }
    if let Some(scale) = args.scale {
        config.export.scale = scale;
    }
    config.keep_lightness |= args.keep_lightness;
    config.export.flatten |= args.flatten;
    config.export.only_selected |= args.only_selected;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = merge_config(&args)?;

    // --- 1. Ingestion ---
    let image = image::open(&args.input)
        .with_context(|| format!("failed to decode {}", args.input.display()))?;
    let grid = PixelGrid::from_image(&image, config.grid_size)?;
    info!(
        "rasterized {} into a {}x{} grid",
        args.input.display(),
        grid.edge(),
        grid.edge()
    );
    let mut session = Session::with_config(grid, &config);

    // --- 2. Selection ---
    session.edit_selection(|grid| {
        if args.select_all {
            grid.select_all();
        }
        for (start, end) in &args.selections {
            grid.select_rect(*start, *end, true);
        }
    })?;
    info!("{} cells selected", session.grid().selected_count());

    // --- 3. Recolor ---
    if let Some(color) = &args.color {
        if session.grid().selected_count() == 0 {
            bail!("--color needs a selection (use --select or --select-all)");
        }
        session.confirm(args.base)?;
        let applied = session.set_base_color(color)?;
        info!(
            "recolored {} cells around base {:?} with {applied}",
            session.relation().map_or(0, |relation| relation.related_count()),
            session.base_index()
        );
        session.apply()?;
    }

    // --- 4. Export ---
    let options = config.export_options()?;
    let bitmap = session.export(&options)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(suggested_filename(config.grid_size, options.only_selected)));
    save_png(&output, &bitmap).with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        "exported {}x{} bitmap to {}",
        bitmap.width(),
        bitmap.height(),
        output.display()
    );

    Ok(())
}
