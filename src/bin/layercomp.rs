use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "layercomp", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a layer stack into a single image.
    Compose(ComposeArgs),
    /// Check that the ImageMagick programs are on PATH.
    Check(RendererArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Layer stack JSON (a single layer object or an array of layers).
    #[arg(long)]
    layers: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Explicit canvas width (requires --height).
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Explicit canvas height (requires --width).
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Base image placed beneath every other layer (path or URL).
    #[arg(long)]
    source: Option<String>,

    /// Maximum simultaneous downloads.
    #[arg(long, default_value_t = 8)]
    fetch_concurrency: usize,

    /// Per-download timeout in seconds (0 disables the timeout).
    #[arg(long, default_value_t = 60)]
    fetch_timeout_secs: u64,

    /// Directory under which the temporary workspace is created.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Fail on layers of unrecognized type instead of skipping them.
    #[arg(long, default_value_t = false)]
    strict: bool,

    #[command(flatten)]
    renderer: RendererArgs,
}

#[derive(Parser, Debug)]
struct RendererArgs {
    /// Program used for canvas creation and text annotation.
    #[arg(long, default_value = "convert")]
    convert: String,

    /// Program used for image overlay.
    #[arg(long, default_value = "composite")]
    composite: String,
}

impl RendererArgs {
    fn magick_opts(&self) -> layercomp::MagickOpts {
        layercomp::MagickOpts {
            convert: self.convert.clone(),
            composite: self.composite.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_layers_json(path: &Path) -> anyhow::Result<Vec<layercomp::Layer>> {
    let f = File::open(path).with_context(|| format!("open layers '{}'", path.display()))?;
    let layers = layercomp::read_layers(BufReader::new(f))
        .with_context(|| format!("parse layers '{}'", path.display()))?;
    Ok(layers)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let layers = read_layers_json(&args.layers)?;

    let options = layercomp::ProcessingOptions {
        width: args.width,
        height: args.height,
        source: args.source.clone(),
    };

    let opts = layercomp::PipelineOpts {
        workspace: layercomp::WorkspaceOpts {
            root: args.work_dir.clone(),
        },
        fetch: layercomp::FetchOpts {
            concurrency: args.fetch_concurrency,
            timeout: (args.fetch_timeout_secs > 0)
                .then(|| Duration::from_secs(args.fetch_timeout_secs)),
            ..layercomp::FetchOpts::default()
        },
        magick: args.renderer.magick_opts(),
        compositor: layercomp::CompositorOpts {
            strict_kinds: args.strict,
        },
        reject_empty_canvas: true,
    };

    let pipeline = layercomp::Pipeline::new(opts)?;
    let output = pipeline.compose(layers, &options)?;
    output
        .persist(&args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    output.release()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_check(args: RendererArgs) -> anyhow::Result<()> {
    let mut missing = Vec::new();
    for program in [&args.convert, &args.composite] {
        if layercomp::is_program_on_path(program) {
            eprintln!("found {program}");
        } else {
            missing.push(program.as_str());
        }
    }
    if !missing.is_empty() {
        anyhow::bail!("not found on PATH: {}", missing.join(", "));
    }
    Ok(())
}
