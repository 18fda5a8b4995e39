use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use pixelstage::{PictureSpec, Point, Rect, Stage, StageConfig};

#[derive(Parser, Debug)]
#[command(name = "pixelstage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame headlessly and write it as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input raster image (any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Presentation width in physical pixels.
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Presentation height in physical pixels.
    #[arg(long, default_value_t = 576)]
    height: u32,

    /// log2 of the integer upscale factor (1 = draw 2x2 blocks).
    #[arg(long, default_value_t = 0)]
    resolution_bit: u8,

    /// Treat the image as a COLSxROWS sprite-sheet grid (e.g. "4x2").
    #[arg(long)]
    grid: Option<String>,

    /// Grid cell to draw, row-major and 0-based. Ignored without --grid.
    #[arg(long, default_value_t = 0)]
    cell: u32,

    /// Logical draw location "X,Y".
    #[arg(long, default_value = "0,0")]
    at: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = StageConfig {
        width: args.width,
        height: args.height,
        resolution_bit: args.resolution_bit,
        ..Default::default()
    };
    let mut stage = Stage::headless(config)?;

    let image = stage.load_image(&args.in_path)?;

    let frame = match &args.grid {
        Some(grid) => Some(grid_cell_rect(
            grid,
            args.cell,
            stage.image_size(image)?,
        )?),
        None => None,
    };

    let picture = stage.create_picture(
        image,
        PictureSpec {
            frame,
            location: parse_point(&args.at)?,
            ..Default::default()
        },
    )?;

    let mut pass = stage.begin_drawing();
    pass.draw_picture(picture)?;
    pass.finish();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let front = stage.target().front();
    image::save_buffer_with_format(
        &args.out,
        front.data(),
        front.width(),
        front.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn grid_cell_rect(grid: &str, cell: u32, image: pixelstage::Size) -> anyhow::Result<Rect> {
    let (cols, rows) = grid
        .split_once('x')
        .and_then(|(c, r)| Some((c.parse::<u32>().ok()?, r.parse::<u32>().ok()?)))
        .with_context(|| format!("grid must look like COLSxROWS, got '{grid}'"))?;
    if cols == 0 || rows == 0 {
        anyhow::bail!("grid dimensions must be > 0");
    }
    if cell >= cols * rows {
        anyhow::bail!("cell {cell} out of range for a {cols}x{rows} grid");
    }

    let cell_w = image.width / cols;
    let cell_h = image.height / rows;
    if cell_w == 0 || cell_h == 0 {
        anyhow::bail!(
            "a {cols}x{rows} grid leaves no pixels per cell in a {}x{} image",
            image.width,
            image.height
        );
    }

    Ok(Rect::new(
        (cell % cols) * cell_w,
        (cell / cols) * cell_h,
        cell_w,
        cell_h,
    ))
}

fn parse_point(s: &str) -> anyhow::Result<Point> {
    s.split_once(',')
        .and_then(|(x, y)| {
            Some(Point::new(
                x.trim().parse::<i32>().ok()?,
                y.trim().parse::<i32>().ok()?,
            ))
        })
        .with_context(|| format!("location must look like X,Y, got '{s}'"))
}
