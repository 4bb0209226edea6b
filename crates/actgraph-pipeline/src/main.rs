use actgraph_annotate::Clause;
use actgraph_core::{ActivityId, GraphStore, Topology};
use actgraph_pipeline::{load_config, Pipeline, PipelineConfig};
use actgraph_services::Services;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::new("actgraph")
        .version(actgraph_pipeline::VERSION)
        .about("Build UML activity graphs from process descriptions")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log level used when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("build")
                .about("Run the full pipeline on a text file")
                .arg(config_arg(false))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Plain-text process description"),
                )
                .arg(
                    Arg::new("sync")
                        .long("sync")
                        .action(ArgAction::SetTrue)
                        .help("Post the finished graph to the backend"),
                )
                .arg(dot_arg()),
        )
        .subcommand(
            Command::new("clauses")
                .about("Build a graph offline from a JSON clause list")
                .arg(config_arg(false))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON array of clauses"),
                )
                .arg(
                    Arg::new("activity-id")
                        .long("activity-id")
                        .default_value("-1")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(i64))
                        .help("Activity id stamped on every node"),
                )
                .arg(dot_arg()),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate a configuration file")
                .arg(config_arg(true)),
        )
}

fn config_arg(required: bool) -> Arg {
    Arg::new("config")
        .long("config")
        .required(required)
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file")
}

fn dot_arg() -> Arg {
    Arg::new("dot")
        .long("dot")
        .action(ArgAction::SetTrue)
        .help("Print Graphviz DOT instead of the backend payload")
}

fn init_tracing(fallback_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from(args: &ArgMatches) -> Result<PipelineConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn input_path(args: &ArgMatches) -> Result<&Path> {
    args.get_one::<PathBuf>("input")
        .map(PathBuf::as_path)
        .context("--input is required")
}

fn print_graph(store: &GraphStore, dot: bool) -> Result<()> {
    if dot {
        println!("{}", Topology::of(store).to_dot());
    } else {
        println!("{}", serde_json::to_string_pretty(&store.payload())?);
    }
    Ok(())
}

async fn build(args: &ArgMatches) -> Result<()> {
    let config = config_from(args)?;
    let path = input_path(args)?;
    let document = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let services = Services::http(&config.services).context("creating service clients")?;
    let pipeline = Pipeline::new(config, services).with_sync(args.get_flag("sync"));
    let output = pipeline.run(&document).await?;

    for diagnostic in &output.report.diagnostics {
        tracing::warn!(?diagnostic, "clause not placed as tagged");
    }
    if args.get_flag("sync") && !output.synced {
        tracing::warn!(activity = %output.activity_id, "graph was not persisted");
    }
    print_graph(&output.store, args.get_flag("dot"))
}

fn clauses(args: &ArgMatches) -> Result<()> {
    let config = config_from(args)?;
    let path = input_path(args)?;
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let clauses: Vec<Clause> = serde_json::from_str(&content).context("parsing clause list")?;
    let activity_id = args
        .get_one::<i64>("activity-id")
        .copied()
        .map_or(ActivityId::UNRESOLVED, ActivityId);

    let services = Services::http(&config.services).context("creating service clients")?;
    let pipeline = Pipeline::new(config, services);
    let (store, report) = pipeline.build_from_clauses(&clauses, activity_id)?;
    tracing::info!(runs = report.runs, diagnostics = report.diagnostics.len(), "graph built");
    print_graph(&store, args.get_flag("dot"))
}

fn check_config(args: &ArgMatches) -> Result<()> {
    let config = config_from(args)?;
    println!("config ok");
    for (service, url) in config.services.endpoints() {
        println!("  {service}: {url}");
    }
    println!("  max_search_depth: {}", config.engine.max_search_depth);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(level);

    match matches.subcommand() {
        Some(("build", args)) => build(args).await,
        Some(("clauses", args)) => clauses(args),
        Some(("check-config", args)) => check_config(args),
        _ => Ok(()),
    }
}
