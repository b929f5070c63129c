use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cardframe", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mount a photo on a card, apply a template and write a PNG.
    Compose(ComposeArgs),
    /// Print the normalized palette of an SVG asset.
    Palette(PaletteArgs),
    /// List the template keys of a catalog.
    Templates(TemplatesArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Photo to frame.
    #[arg(long)]
    photo: PathBuf,

    /// Single template JSON file.
    #[arg(long, conflicts_with_all = ["catalog", "key"])]
    template: Option<PathBuf>,

    /// Template catalog JSON file.
    #[arg(long, requires = "key")]
    catalog: Option<PathBuf>,

    /// Template key inside `--catalog`.
    #[arg(long, requires = "catalog")]
    key: Option<String>,

    /// Card geometry JSON (`{"width":..,"height":..,"corner_radius":..}`).
    #[arg(long)]
    card: Option<String>,

    /// Root for template asset paths. Defaults to the template/catalog directory.
    #[arg(long, env = "CARDFRAME_ASSET_ROOT")]
    asset_root: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print the template palette as JSON on stdout.
    #[arg(long, default_value_t = false)]
    palette: bool,
}

#[derive(Parser, Debug)]
struct PaletteArgs {
    /// SVG file.
    #[arg(long)]
    svg: PathBuf,

    /// Print every swatch (target, hex, opacity) instead of distinct colours.
    #[arg(long, default_value_t = false)]
    swatches: bool,
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Template catalog JSON file.
    #[arg(long)]
    catalog: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Palette(args) => cmd_palette(args),
        Command::Templates(args) => cmd_templates(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let (template, template_dir) = match (&args.template, &args.catalog, &args.key) {
        (Some(path), _, _) => (cardframe::Template::from_path(path)?, parent_or_cwd(path)),
        (None, Some(catalog), Some(key)) => {
            let cat = cardframe::TemplateCatalog::from_path(catalog)?;
            (cat.get(key)?.clone(), parent_or_cwd(catalog))
        }
        _ => (cardframe::Template::default(), PathBuf::from(".")),
    };

    let card = match &args.card {
        Some(json) => serde_json::from_str::<cardframe::CardSpec>(json).context("parse --card")?,
        None => cardframe::CardSpec::default(),
    };

    let assets = cardframe::FsSource::new(args.asset_root.clone().unwrap_or(template_dir));
    let cache = cardframe::AssetCache::new();

    let mut canvas = cardframe::mount_photo_file(&args.photo, &card)?;
    let colors = cardframe::apply_template(
        std::slice::from_mut(&mut canvas),
        &template,
        &cache,
        &assets,
    )?;

    let frame = cardframe::render_canvas(&canvas, &cardframe::RenderSettings::default())?;
    frame.write_png(&args.out)?;

    if args.palette {
        println!("{}", serde_json::to_string(&colors)?);
    }
    tracing::info!(out = %args.out.display(), colors = colors.len(), "wrote card");
    Ok(())
}

fn cmd_palette(args: PaletteArgs) -> anyhow::Result<()> {
    let bytes =
        std::fs::read(&args.svg).with_context(|| format!("read svg '{}'", args.svg.display()))?;
    let svg = cardframe::parse_svg(&bytes)?;
    if args.swatches {
        println!("{}", serde_json::to_string_pretty(svg.swatches.as_slice())?);
    } else {
        let colors = cardframe::unique_colors(svg.swatches.iter());
        println!("{}", serde_json::to_string(&colors)?);
    }
    Ok(())
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let catalog = cardframe::TemplateCatalog::from_path(&args.catalog)?;
    for key in catalog.keys() {
        let t = catalog.get(key)?;
        println!("{key}\t{}\t{:?}", t.name, t.layout);
    }
    Ok(())
}
