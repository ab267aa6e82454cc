use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use card_canvas::config::{CanvasConfig, ConfigError};
use card_canvas::doc::{CardRecord, FontWeight, Template};
use card_canvas::fit::{FitCache, fit};
use card_canvas::geom::Size;
use card_canvas::measure::{FontSpec, GlyphMeasurer, HeuristicMeasurer, MeasureError, TextMeasurer};
use card_canvas::render::{Overlay, RenderMode, Scene, render};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("font load failed: {0}")]
    Font(#[from] MeasureError),
    #[error("box must have a positive width and height, got {width}x{height}")]
    EmptyBox { width: f64, height: f64 },
}

#[derive(Parser, Debug)]
#[command(name = "card-cli", about = "Card template layout and text-fit CLI")]
struct Cli {
    /// TrueType/OpenType font for measurement. Without one, a fixed-advance
    /// estimate is used.
    #[arg(long, env = "CARD_FONT_FILE", global = true)]
    font: Option<PathBuf>,

    /// Bold face to pair with `--font`.
    #[arg(long, env = "CARD_BOLD_FONT_FILE", global = true, requires = "font")]
    bold_font: Option<PathBuf>,

    /// Card width in millimetres [default: 85.6].
    #[arg(long, env = "CARD_WIDTH_MM", global = true)]
    width_mm: Option<String>,

    /// Card height in millimetres [default: 53.98].
    #[arg(long, env = "CARD_HEIGHT_MM", global = true)]
    height_mm: Option<String>,

    /// Screen pixels per millimetre [default: 96 / 25.4].
    #[arg(long, env = "CARD_PX_PER_MM", global = true)]
    px_per_mm: Option<String>,

    /// Shortcut platform: `mac` or `other`.
    #[arg(long, env = "CARD_PLATFORM", global = true)]
    platform: Option<String>,

    /// Font family for text without one of its own [default: sans-serif].
    #[arg(long, env = "CARD_DEFAULT_FONT_FAMILY", global = true)]
    font_family: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the largest font size that fits text in a box.
    Fit(FitArgs),
    /// Render a template to display-list JSON, once per record.
    Scene(SceneArgs),
    /// List binding keys a template can offer.
    Bindings {
        #[arg(long, default_value = "-", help = "Template JSON path, or - for stdin")]
        template: String,
    },
}

#[derive(Args, Debug)]
struct FitArgs {
    text: String,

    /// Box width in pixels.
    #[arg(long)]
    width: f64,

    /// Box height in pixels.
    #[arg(long)]
    height: f64,

    #[arg(long, default_value_t = false)]
    bold: bool,

    #[arg(long)]
    family: Option<String>,
}

#[derive(Args, Debug)]
struct SceneArgs {
    #[arg(long, default_value = "-", help = "Template JSON path, or - for stdin")]
    template: String,

    #[arg(long, help = "JSON array of card records; one scene per record")]
    records: Option<String>,

    #[arg(long, value_enum, default_value_t = ModeArg::Output)]
    mode: ModeArg,

    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Output,
    Design,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Output => Self::Output,
            ModeArg::Design => Self::Design,
        }
    }
}

impl Cli {
    /// Canvas config from the surface flags, each falling back to its
    /// `CARD_*` variable and then to the default.
    fn config(&self) -> Result<CanvasConfig, ConfigError> {
        CanvasConfig::from_lookup(|key| {
            let value = match key {
                "CARD_WIDTH_MM" => &self.width_mm,
                "CARD_HEIGHT_MM" => &self.height_mm,
                "CARD_PX_PER_MM" => &self.px_per_mm,
                "CARD_PLATFORM" => &self.platform,
                "CARD_DEFAULT_FONT_FAMILY" => &self.font_family,
                _ => return None,
            };
            value.clone()
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config()?;
    tracing::debug!(?config, "canvas config");
    match cli.font {
        Some(path) => {
            let regular = read_bytes(&path)?;
            let bold = cli.bold_font.as_deref().map(read_bytes).transpose()?;
            let measurer = GlyphMeasurer::from_bytes(regular, bold)?;
            tracing::debug!(font = %path.display(), "using glyph measurer");
            dispatch(&cli.command, &config, &measurer)
        }
        None => dispatch(&cli.command, &config, &HeuristicMeasurer::default()),
    }
}

fn dispatch<M: TextMeasurer>(command: &Command, config: &CanvasConfig, measurer: &M) -> Result<(), CliError> {
    match command {
        Command::Fit(args) => run_fit(args, config, measurer),
        Command::Scene(args) => run_scene(args, config, measurer),
        Command::Bindings { template } => {
            let template: Template = serde_json::from_str(&read_input(template)?)?;
            for key in template.available_bindings() {
                println!("{key}");
            }
            Ok(())
        }
    }
}

fn run_fit<M: TextMeasurer>(args: &FitArgs, config: &CanvasConfig, measurer: &M) -> Result<(), CliError> {
    let container = Size::new(args.width, args.height);
    if !container.is_positive() {
        return Err(CliError::EmptyBox { width: args.width, height: args.height });
    }
    let weight = if args.bold { FontWeight::Bold } else { FontWeight::Normal };
    let family = args.family.clone().unwrap_or_else(|| config.font_family.clone());
    let size = fit(measurer, &args.text, container, &FontSpec::new(family, weight));
    println!("{size}");
    Ok(())
}

fn run_scene<M: TextMeasurer>(args: &SceneArgs, config: &CanvasConfig, measurer: &M) -> Result<(), CliError> {
    let template: Template = serde_json::from_str(&read_input(&args.template)?)?;
    let opts = config.render_options(args.mode.into());
    let overlay = Overlay::default();
    let mut fits = FitCache::new();

    let scenes: Vec<Scene> = match &args.records {
        Some(path) => {
            let records: Vec<CardRecord> = serde_json::from_str(&read_input(path)?)?;
            tracing::info!(records = records.len(), template = %template.id, "rendering scenes");
            records
                .iter()
                .map(|r| render(&template, Some(r), &opts, &overlay, measurer, &mut fits))
                .collect()
        }
        None => vec![render(&template, None, &opts, &overlay, measurer, &mut fits)],
    };

    let out = if args.pretty { serde_json::to_string_pretty(&scenes)? } else { serde_json::to_string(&scenes)? };
    println!("{out}");
    Ok(())
}

fn read_input(path: &str) -> Result<String, CliError> {
    let mut reader: Box<dyn Read> = if path == "-" {
        Box::new(io::stdin())
    } else {
        let file = File::open(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
        Box::new(BufReader::new(file))
    };
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .map_err(|source| CliError::Read { path: path.to_owned(), source })?;
    Ok(buf)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read { path: path.display().to_string(), source })
}
