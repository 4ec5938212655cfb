//! fuzzywash - wash-cycle recommender
//!
//! Command-line interface over the fuzzy washing-machine controller.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use fuzzywash::config::{LogLevel, OutputFormat, WashConfig};
use fuzzywash::washer::{ClothItem, LoadSummary, WashProgram, WashRequest, Washer};
use fuzzywash::{logging, server};

#[derive(Parser)]
#[command(name = "fuzzywash")]
#[command(version)]
#[command(
    about = "Fuzzy-logic washing machine - recommends wash time, water, spin and detergent",
    long_about = None
)]
struct Cli {
    /// Configuration file (defaults to the first fuzzywash.toml found)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recommend a program for one load
    Simulate {
        /// Total weight in kg
        #[arg(long)]
        load: f64,

        /// Average dirt level (1-10)
        #[arg(long)]
        dirt: f64,

        /// Maximum delicateness (1 = robust, 10 = delicate)
        #[arg(long)]
        delicate: f64,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// Also print the rules that fired
        #[arg(long)]
        explain: bool,
    },

    /// Aggregate several garments into one load, then recommend
    Mix {
        /// Garment as name:weight:dirt:delicateness (repeatable)
        #[arg(
            long = "item",
            value_name = "NAME:KG:DIRT:DELICATE",
            required_unless_present = "file"
        )]
        items: Vec<ClothItem>,

        /// JSON file holding an array of garments
        #[arg(long, value_name = "FILE", conflicts_with = "items")]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Run the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show or create the configuration file
    Config {
        /// Write a commented default ./fuzzywash.toml
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Write the effective configuration to FILE
        #[arg(long, value_name = "FILE", conflicts_with = "init")]
        save: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Human-readable
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = WashConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides();
            config
        }
        None => WashConfig::load().context("Failed to load configuration")?,
    };

    if cli.quiet {
        config.general.log_level = LogLevel::Quiet;
    } else if cli.verbose {
        config.general.log_level = LogLevel::Verbose;
    }
    logging::init(config.general.log_level);
    debug!(engine = ?config.engine, "configuration loaded");

    let washer =
        Washer::shared(config.engine.to_engine()).context("Failed to build rule bank")?;

    match cli.command {
        Command::Simulate {
            load,
            dirt,
            delicate,
            format,
            explain,
        } => {
            let request = WashRequest::new(load, dirt, delicate);
            let format = format.map(Into::into).unwrap_or(config.general.format);
            let program = washer.recommend(&request)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&program)?),
                OutputFormat::Text => print_program(&program),
            }

            if explain {
                let simulation = washer.simulate(&request)?;
                if let Some(inference) = simulation.inference() {
                    println!("\n[Rules Fired]");
                    print!("{}", inference.explain(washer.bank()));
                }
            }
        }

        Command::Mix {
            items,
            file,
            format,
        } => {
            let items = match file {
                Some(path) => {
                    let content = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read file: {}", path.display()))?;
                    serde_json::from_str::<Vec<ClothItem>>(&content)
                        .with_context(|| format!("Invalid garment list in {}", path.display()))?
                }
                None => items,
            };

            let summary = LoadSummary::from_items(&items)?;
            let program = washer.recommend(&summary.to_request())?;

            match format.map(Into::into).unwrap_or(config.general.format) {
                OutputFormat::Json => {
                    let json = serde_json::json!({ "load": summary, "program": program });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Text => {
                    println!("[Aggregated Inputs]");
                    println!("Garments:         {}", summary.items);
                    println!("Total Load:       {:.2} kg", summary.total_load);
                    println!("Avg Dirt Level:   {:.2}", summary.avg_dirt_level);
                    println!("Max Delicateness: {:.1}", summary.max_delicateness);
                    println!();
                    print_program(&program);
                }
            }
        }

        Command::Serve { host, port } => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            runtime
                .block_on(server::run_server(washer, server_config))
                .context("Server error")?;
        }

        Command::Config { init, show, save } => {
            if init {
                let path = PathBuf::from("fuzzywash.toml");
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                fs::write(&path, WashConfig::default_config_content())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
            if let Some(path) = &save {
                config
                    .save_to_file(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
            if show || (!init && save.is_none()) {
                print!("{}", config.to_toml()?);
            }
        }
    }

    Ok(())
}

fn print_program(program: &WashProgram) {
    println!("[Fuzzy Logic Results]");
    println!("Wash Time:       {:.1} min", program.wash_time);
    println!("Water Level:     {:.1} %", program.water_level);
    println!("Spin Speed:      {:.0} RPM", program.spin_speed);
    println!("Detergent:       {:.1} ml", program.detergent_amount);
    if !program.fallback_outputs.is_empty() {
        println!(
            "\nNo rule fired for: {} (fallback values shown)",
            program.fallback_outputs.join(", ")
        );
    }
}
