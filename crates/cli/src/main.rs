use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use construye_catalog::Catalog;
use construye_engine::{generate_plan, normalize, EngineError, ProjectBrief};
use construye_protocol::{
    intake_schema, serialize_json, serialize_json_pretty, ErrorEnvelope, IntakePayload,
};
use log::info;
use serde::Serialize;

mod svg;

const CATALOG_ENV: &str = "CONSTRUYE_CATALOG";
const EXIT_VALIDATION: i32 = 2;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "construye")]
#[command(about = "Generate floor-plan options, costs and feasibility for a self-build brief", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Catalog overlay (JSON or TOML) merged onto the bundled catalog
    /// (overrides CONSTRUYE_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a plan from an intake payload
    Generate(GenerateArgs),

    /// Validate an intake payload and print the normalized brief
    Validate(InputArgs),

    /// Print the effective catalog
    Catalog(CatalogArgs),

    /// Print the JSON schema of the intake payload
    Schema,
}

#[derive(Args)]
struct InputArgs {
    /// Inline JSON payload (mutually exclusive with --file)
    #[arg(long, conflicts_with = "file")]
    json: Option<String>,

    /// Path to file containing the JSON payload (stdin when omitted)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also write the selected floor plan as SVG
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Floor drawn into the SVG (0 = ground floor)
    #[arg(long, default_value_t = 0, requires = "svg")]
    floor: u32,
}

#[derive(Args)]
struct CatalogArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
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

    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| env::var_os(CATALOG_ENV).map(PathBuf::from));

    let code = match cli.command {
        Commands::Generate(args) => run_generate(&args, catalog_path.as_deref())?,
        Commands::Validate(args) => run_validate(&args, catalog_path.as_deref())?,
        Commands::Catalog(args) => {
            let catalog = load_catalog(catalog_path.as_deref())?;
            print_json(&catalog, args.pretty)?;
            0
        }
        Commands::Schema => {
            println!("{}", intake_schema()?);
            0
        }
    };
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn run_generate(args: &GenerateArgs, catalog_path: Option<&Path>) -> Result<i32> {
    let catalog = load_catalog(catalog_path)?;
    let payload = match read_payload(&args.input) {
        Ok(payload) => payload,
        Err(err) => return fail(&invalid_payload(&err), args.input.pretty),
    };
    let brief = match normalize(&payload, &catalog) {
        Ok(brief) => brief,
        Err(err) => return fail(&engine_error(&EngineError::from(err)), args.input.pretty),
    };

    let plan = match generate_plan(&brief, &catalog) {
        Ok(plan) => plan,
        Err(err) => return fail(&engine_error(&err), args.input.pretty),
    };

    if let Some(path) = &args.svg {
        let markup = svg::render_floor(&plan.plans.selected.blueprint_2d, args.floor)?;
        fs::write(path, markup)
            .with_context(|| format!("Failed to write SVG to {}", path.display()))?;
        info!("floor {} written to {}", args.floor, path.display());
    }

    print_json(&plan, args.input.pretty)?;
    Ok(0)
}

fn run_validate(args: &InputArgs, catalog_path: Option<&Path>) -> Result<i32> {
    #[derive(Serialize)]
    struct Validated<'a> {
        fingerprint: String,
        brief: &'a ProjectBrief,
    }

    let catalog = load_catalog(catalog_path)?;
    let payload = match read_payload(args) {
        Ok(payload) => payload,
        Err(err) => return fail(&invalid_payload(&err), args.pretty),
    };
    match normalize(&payload, &catalog) {
        Ok(brief) => {
            print_json(
                &Validated {
                    fingerprint: brief.fingerprint(),
                    brief: &brief,
                },
                args.pretty,
            )?;
            Ok(0)
        }
        Err(err) => fail(&engine_error(&EngineError::from(err)), args.pretty),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            let catalog = Catalog::from_file(path)?;
            info!(
                "catalog overlay {} loaded ({})",
                path.display(),
                &catalog.fingerprint()[..12]
            );
            Ok(catalog)
        }
        None => Ok(Catalog::bundled().clone()),
    }
}

fn read_payload(args: &InputArgs) -> Result<IntakePayload> {
    let raw = if let Some(raw) = &args.json {
        raw.clone()
    } else if let Some(path) = &args.file {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON from {}", path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read JSON from stdin")?;
        buffer
    };

    if raw.trim().is_empty() {
        anyhow::bail!("Intake payload is empty. Provide --json, --file, or pipe JSON via stdin.");
    }
    IntakePayload::from_json_slice(raw.as_bytes())
}

fn invalid_payload(err: &anyhow::Error) -> (ErrorEnvelope, i32) {
    let envelope = ErrorEnvelope::new("invalid_payload", format!("{err:#}"))
        .with_hint("Send a JSON object with plotWidth, plotLength, budget, occupants, floors and city.");
    (envelope, EXIT_FAILURE)
}

fn engine_error(err: &EngineError) -> (ErrorEnvelope, i32) {
    let envelope = ErrorEnvelope::new(err.code(), err.to_string());
    match err {
        EngineError::Validation(validation) => (
            envelope
                .with_details(serde_json::json!({
                    "field": validation.field,
                    "reason": validation.reason,
                }))
                .with_hint(format!("Revisa el campo '{}' del formulario.", validation.field)),
            EXIT_VALIDATION,
        ),
        EngineError::Estimation(_) => (
            envelope.with_hint("El terreno no admite ningún espacio; revisa sus dimensiones."),
            EXIT_FAILURE,
        ),
    }
}

fn fail((envelope, code): &(ErrorEnvelope, i32), pretty: bool) -> Result<i32> {
    print_json(envelope, pretty)?;
    Ok(*code)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serialize_json_pretty(value)?
    } else {
        serialize_json(value)?
    };
    println!("{output}");
    Ok(())
}
