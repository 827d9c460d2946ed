use {
    clap::{CommandFactory, Parser, Subcommand},
    clap_complete::Shell,
    color_eyre::eyre::Result,
    shafer_cli::{
        demo,
        errors::CliArgumentError,
        evaluate::evaluate,
        report::{render_json, render_text, Report},
    },
    std::path::PathBuf,
    tracing_forest::ForestLayer,
    tracing_log::LogTracer,
    tracing_subscriber::layer::SubscriberExt,
    tracing_subscriber::{EnvFilter, Registry},
};

/// shafer combines bodies of evidence with Dempster-Shafer theory and prints the resulting beliefs.
#[derive(Parser)]
#[command(name = "shafer", author, version, about, long_about = None)]
#[clap(arg_required_else_help = true)]
struct Cli {
    /// Log levels: error, warn, info, debug, trace
    ///
    /// Default is "info".
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Log formats: forest, plain
    ///
    /// Default is "forest". Logs are always written to stderr.
    #[arg(short = 'f', long)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

/// The subcommands supported by the shafer CLI.
#[derive(Subcommand)]
enum Command {
    /// Evaluate the built-in example scenarios
    Demo {
        /// Output formats: text, json
        ///
        /// Default is "text".
        #[arg(long)]
        format: Option<String>,
    },
    /// Evaluate the evidence and combinations in a config file
    Evaluate {
        /// Sets the config file
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Output formats: text, json
        ///
        /// Default is "text".
        #[arg(long)]
        format: Option<String>,
    },
    /// Print a shell completion script
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// The rendering selected with `--format`.
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(format: &Option<String>) -> Result<Self, CliArgumentError> {
        match format.as_deref().unwrap_or("text") {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(CliArgumentError::InvalidOutputFormat(other.to_string())),
        }
    }

    fn render(&self, report: &Report, precision: usize) -> Result<String> {
        Ok(match self {
            OutputFormat::Text => render_text(report, precision)?,
            OutputFormat::Json => render_json(report)?,
        })
    }
}

/// An [`EnvFilter`] pattern to limit matched log events to error events.
const ERROR_FILTER: &str = "error";
/// An [`EnvFilter`] pattern to limit matched log events to warning events.
const WARN_FILTER: &str = "warn";
/// An [`EnvFilter`] pattern to limit matched log events to informational events.
const INFO_FILTER: &str = "info";
/// An [`EnvFilter`] pattern to limit matched log events to debug events.
///
/// Only the shafer crates log at debug level, everything else stays at info. The unfiltered behavior
/// can still be accessed by specifying `debug,` with a trailing comma as the log level argument.
const DEBUG_FILTER: &str = "info,shafer_cli=debug,shafer_config=debug,shafer_mass=debug";
/// An [`EnvFilter`] pattern to limit matched log events to trace events.
const TRACE_FILTER: &str = "trace";

fn init_tracing(cli: &Cli) -> Result<()> {
    color_eyre::install()?;

    LogTracer::init()?;

    let log_level: &str = cli.log_level.as_ref().map_or("info", |ll| ll.as_str());
    let log_format: &str = cli.log_format.as_ref().map_or("forest", |lf| lf.as_str());
    let mut forest_layer = None;
    let mut plain_layer = None;
    match log_format {
        "forest" => {
            forest_layer = Some(ForestLayer::from(
                tracing_forest::Printer::new().writer(std::io::stderr),
            ));
        }
        "plain" => {
            plain_layer = Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
        }
        _ => {
            Err(CliArgumentError::InvalidLogFormat(log_format.to_string()))?;
        }
    }

    let subscriber = Registry::default()
        .with(forest_layer)
        .with(plain_layer)
        .with(EnvFilter::new(
            match log_level.to_ascii_lowercase().as_str() {
                "error" => ERROR_FILTER,
                "warn" => WARN_FILTER,
                "info" => INFO_FILTER,
                "debug" => DEBUG_FILTER,
                "trace" => TRACE_FILTER,
                _ => log_level,
            },
        ));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    match &cli.command.ok_or(CliArgumentError::MissingSubcommand)? {
        Command::Demo { format } => {
            let format = OutputFormat::parse(format)?;
            let precision = shafer_config::DEFAULT_PRECISION;
            let reports = demo::run()?;
            match format {
                OutputFormat::Text => {
                    for (index, (name, report)) in reports.iter().enumerate() {
                        if index > 0 {
                            println!();
                        }
                        println!("# {}", name);
                        print!("{}", format.render(report, precision)?);
                    }
                }
                OutputFormat::Json => {
                    let scenarios: Vec<_> = reports
                        .iter()
                        .map(|(name, report)| {
                            serde_json::json!({ "scenario": name, "entries": report.entries })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&scenarios)?);
                }
            }
        }
        Command::Evaluate { config, format } => {
            let format = OutputFormat::parse(format)?;
            let config = shafer_config::toml::load_config(config)?;
            let report = evaluate(&config)?;
            let rendered = format.render(&report, config.output.precision)?;
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
        Command::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "shafer",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
