use serde::{Deserialize, Serialize};
use std::io::Read;
use strata::{DiagramEvent, LayoutAction, LayoutConfig, LayoutEngine, LayoutGeometry};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout { batch: usize, err: strata::Error },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Layout { batch, err } => write!(f, "batch {batch}: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    pretty: bool,
    trace: bool,
}

/// An event script: either one batch or a list of batches.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Script {
    Batches { batches: Vec<Vec<DiagramEvent>> },
    Events(Vec<DiagramEvent>),
}

impl Script {
    fn into_batches(self) -> Vec<Vec<DiagramEvent>> {
        match self {
            Script::Batches { batches } => batches,
            Script::Events(events) => vec![events],
        }
    }
}

#[derive(Serialize)]
struct LayoutOut<'a> {
    batches: &'a [Vec<LayoutAction>],
    geometry: &'a LayoutGeometry,
}

fn usage() -> &'static str {
    "strata-cli\n\
\n\
USAGE:\n\
  strata-cli [layout] [--pretty] [--config <path>] [--trace] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON array of diagram events, or {\"batches\": [[...], ...]} for several passes.\n\
  - --config reads a JSON layout config; missing fields keep their defaults.\n\
  - --trace logs engine events to stderr (STRATA_LOG overrides the filter).\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "--pretty" => args.pretty = true,
            "--trace" => args.trace = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn read_config(path: Option<&str>) -> Result<LayoutConfig, CliError> {
    match path {
        None => Ok(LayoutConfig::default()),
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn init_tracing(trace: bool) {
    let filter = EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if trace { "strata=trace" } else { "warn" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    init_tracing(args.trace);
    let config = read_config(args.config.as_deref())?;
    let text = read_input(args.input.as_deref())?;
    let script: Script = serde_json::from_str(&text)?;

    match args.command {
        Command::Layout => {
            let mut engine = LayoutEngine::new(config);
            let mut batches = Vec::new();
            for (batch, events) in script.into_batches().into_iter().enumerate() {
                let actions = engine
                    .process(&events)
                    .map_err(|err| CliError::Layout { batch, err })?;
                tracing::debug!(batch, actions = actions.len(), "batch laid out");
                batches.push(actions);
            }
            write_json(
                &LayoutOut {
                    batches: &batches,
                    geometry: engine.geometry(),
                },
                args.pretty,
            )
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
