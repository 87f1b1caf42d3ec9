use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use vizbridge::embed::Block;
use vizbridge::{
    normalize, render_chart, render_reply, ArtifactStore, ChartRequest, Config, RenderDefaults,
    Table, VizReference,
};

#[derive(Parser, Debug)]
#[command(name = "vizbridge")]
#[command(about = "Render tabular results into chart artifacts and resolve [VIZ:...] references", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory (overrides config and VIZBRIDGE_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one chart and print the artifact path
    Render(RenderArgs),

    /// Strip [VIZ:...] references from a reply and resolve them
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Chart request as JSON, or @path to a JSON file
    #[arg(long)]
    request: String,

    /// Data file (JSON, literal text, or .csv); "-" or omitted reads stdin
    #[arg(long)]
    data: Option<String>,

    /// Print the [VIZ:...] reference instead of the path
    #[arg(long)]
    embed: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Reply text file; "-" or omitted reads stdin
    #[arg(long)]
    input: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    let store = ArtifactStore::open(&config.output_dir).context("Failed to open output directory")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Render(args) => {
            let request = load_request(&args.request)?;
            let table = load_table(args.data.as_deref())?;
            let path = render_chart(&request, &table, &store, &RenderDefaults::from_config(&config))
                .context("Failed to render chart")?;

            if args.embed {
                let reference = VizReference::from_path(&path)?;
                writeln!(out, "{}", reference)?;
            } else {
                writeln!(out, "{}", path.display())?;
            }
        }
        Commands::Extract(args) => {
            let text = read_input(args.input.as_deref())?;
            let reply = render_reply(&text, &store);

            writeln!(out, "{}", reply.text)?;
            for block in &reply.blocks {
                match block {
                    Block::Image { path, .. } => writeln!(out, "image: {}", path.display())?,
                    Block::Missing { .. } => {
                        writeln!(out, "warning: {}", block.warning().unwrap_or_default())?
                    }
                }
            }
        }
    }

    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn load_request(arg: &str) -> Result<ChartRequest> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path))?,
        None => arg.to_string(),
    };
    let request: ChartRequest = serde_json::from_str(&text)
        .map_err(|e| vizbridge::VizError::InvalidRequest(e.to_string()))?;
    Ok(request)
}

fn load_table(data: Option<&str>) -> Result<Table> {
    if let Some(path) = data.filter(|p| *p != "-") {
        let path = Path::new(path);
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            return Ok(Table::from_csv_reader(file)?);
        }
    }
    let text = read_input(data)?;
    Ok(normalize(text)?)
}

fn read_input(source: Option<&str>) -> Result<String> {
    match source.filter(|s| *s != "-") {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
