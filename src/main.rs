use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use viker::error::Diagnostic;
use viker::parser::{self, Document};
use viker::transform::{ForwardOptions, arm_to_eer, eer_to_arm_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Eer,
    Arm,
}

impl Target {
    fn label(self) -> &'static str {
        match self {
            Target::Eer => "EER",
            Target::Arm => "ARM",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "viker", version, about = "Transform schemas between EER and ARM")]
struct Cli {
    /// Input schema document (`-` reads from stdin)
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Expected output kind; must be the opposite of the input kind
    #[arg(long, value_enum)]
    to: Option<Target>,

    /// Exit with status 2 when the transformation reports diagnostics
    #[arg(long)]
    strict: bool,

    /// Log at debug level unless VIKER_LOG says otherwise
    #[arg(long)]
    verbose: bool,

    /// Do not make unrelated top-level relations disjoint
    #[arg(long)]
    open_world: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("VIKER_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
    }
}

fn run(cli: &Cli) -> Result<Vec<Diagnostic>, String> {
    let input = read_input(&cli.input)?;
    let document = parser::parse_document(&input).map_err(|e| e.to_string())?;

    let opposite = match document {
        Document::Eer(_) => Target::Arm,
        Document::Arm(_) => Target::Eer,
    };
    if let Some(to) = cli.to
        && to != opposite
    {
        return Err(viker::ModelError::TypeMismatch {
            expected: opposite.label(),
            found: to.label(),
        }
        .to_string());
    }

    let (rendered, diagnostics) = match document {
        Document::Eer(eer) => {
            let options = ForwardOptions {
                implicit_disjointness: !cli.open_world,
            };
            let out = eer_to_arm_with(&eer, &options).map_err(|e| e.to_string())?;
            (out.model.to_string(), out.diagnostics)
        }
        Document::Arm(arm) => {
            let out = arm_to_eer(&arm).map_err(|e| e.to_string())?;
            (out.model.to_string(), out.diagnostics)
        }
    };

    match &cli.output {
        Some(path) => std::fs::write(path, &rendered)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(diagnostics)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(diagnostics) => {
            if cli.strict && !diagnostics.is_empty() {
                for d in &diagnostics {
                    eprintln!("{d}");
                }
                std::process::exit(2);
            }
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
