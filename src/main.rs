//! Confidant CLI entrypoint.
//!
//! This is the main entrypoint for the confidant command-line tool.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use confidant::aws;
use confidant::cli::{format_record_table, Cli, Commands, SortOrder, TerminalPrompt};
use confidant::deploy::{DeployOptions, Deployer, PromptMode};
use confidant::error::{ConfidantError, Result};
use confidant::export::{entries_for_keys, write_export, ExportFormat};
use confidant::spec::{find_spec_file, parse_spec, Provider, ResolvedSpec, SpecLoader};
use confidant::store::{self, Store};
use confidant::vars::VariableResolver;

use aws_config::SdkConfig;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let stage = cli.stage.ok_or_else(|| {
        ConfidantError::usage("--stage is required (or set CONFIDANT_STAGE)")
    })?;

    let (spec, sdk) = load_spec(cli.config.as_deref(), &stage).await?;

    match cli.command {
        Commands::Deploy {
            remove_orphans,
            prompt,
        } => cmd_deploy(&spec, sdk.as_ref(), remove_orphans, prompt).await,
        Commands::List {
            modified,
            by_version,
        } => cmd_list(&spec, sdk.as_ref(), modified, by_version).await,
        Commands::Get { param } => cmd_get(&spec, sdk.as_ref(), &param).await,
        Commands::Export {
            format,
            output_file,
            keys,
        } => cmd_export(&spec, sdk.as_ref(), format, output_file.as_deref(), &keys).await,
    }
}

/// Loads and materializes the spec, building AWS context only when the
/// selected provider needs it.
async fn load_spec(
    config: Option<&Path>,
    stage: &str,
) -> Result<(ResolvedSpec, Option<SdkConfig>)> {
    let path = find_spec_file(config)?;
    debug!("loading spec from: {}", path.display());

    let content = std::fs::read_to_string(&path)?;
    let raw = parse_spec(&content, Some(&path))?;

    if raw.provider.is_some_and(Provider::requires_cloud) {
        let sdk = aws::load_config(raw.region.as_deref()).await;
        let identity = aws::StsIdentity::new(&sdk);
        let stacks = aws::CloudFormationOutputs::new(&sdk);

        let mut loader =
            SpecLoader::new().with_resolver(VariableResolver::new(&identity, &stacks));
        if let Some(region) = aws::effective_region(&sdk) {
            loader = loader.with_region(region);
        }

        let spec = loader.load(raw, stage).await?;
        Ok((spec, Some(sdk)))
    } else {
        let spec = SpecLoader::new().load(raw, stage).await?;
        Ok((spec, None))
    }
}

/// Deploy declared entries to the store.
async fn cmd_deploy(
    spec: &ResolvedSpec,
    sdk: Option<&SdkConfig>,
    remove_orphans: bool,
    prompt: Option<PromptMode>,
) -> Result<()> {
    let store = store::for_spec(spec, sdk)?;
    let prompter = TerminalPrompt;
    let deployer = Deployer::new(spec, store.as_ref(), &prompter);

    info!(
        "deploying {} entries to {} backend",
        spec.all.len(),
        store.backend_type()
    );
    let report = deployer
        .deploy(DeployOptions {
            prompt,
            remove_orphans,
        })
        .await?;

    println!("{report}");
    Ok(())
}

/// List deployed records.
async fn cmd_list(
    spec: &ResolvedSpec,
    sdk: Option<&SdkConfig>,
    modified: bool,
    by_version: bool,
) -> Result<()> {
    let store = store::for_spec(spec, sdk)?;
    let records = store.get_many(&spec.names()).await?;

    let order = if modified {
        SortOrder::Modified
    } else if by_version {
        SortOrder::Version
    } else {
        SortOrder::Name
    };

    println!("{}", format_record_table(spec, &records, order));
    Ok(())
}

/// Print the value of a single record. Prints nothing when the record does
/// not exist.
async fn cmd_get(spec: &ResolvedSpec, sdk: Option<&SdkConfig>, param: &str) -> Result<()> {
    let store = store::for_spec(spec, sdk)?;

    // Short keys resolve through the declaration so shared entries are
    // found under their own path.
    let name = spec
        .entry_by_key(param)
        .map_or_else(|| format!("{}{param}", spec.prefix), |e| e.name.clone());

    if let Some(record) = store.get(&name).await? {
        println!("{}", record.value);
    }
    Ok(())
}

/// Export deployed values.
async fn cmd_export(
    spec: &ResolvedSpec,
    sdk: Option<&SdkConfig>,
    format: ExportFormat,
    output_file: Option<&Path>,
    keys: &[String],
) -> Result<()> {
    let store = store::for_spec(spec, sdk)?;

    let entries = entries_for_keys(spec, keys)?;
    let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
    let records = store.get_many(&names).await?;

    let params: BTreeMap<String, String> = records
        .iter()
        .map(|r| (r.key().to_string(), r.value.clone()))
        .collect();

    if let Some(path) = output_file {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::File::create(path)?;
        write_export(&params, format, &mut file)?;
        info!("wrote export to {}", path.display());
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        write_export(&params, format, &mut handle)?;
    }

    Ok(())
}
