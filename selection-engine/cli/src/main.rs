use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use selection_engine::DisplayMode;
use selection_engine::EngineConfig;
use selection_engine::SchemaIndex;
use selection_engine::SelectionRequest;
use selection_engine::SelectionResolver;
use selection_engine::SelectionSource;
use selection_engine::parser::parse_selection;
use tracing_subscriber::EnvFilter;

/// CLI arguments. See <https://docs.rs/clap/latest/clap/_derive/index.html>
#[derive(Parser, Debug)]
#[command(name = "selection-engine", about = "Resolves field selections against a schema")]
struct Args {
    /// Log level (off|error|warn|info|debug|trace).
    #[arg(
        long = "log",
        default_value = "info",
        alias = "log-level",
        env = "SELECTION_ENGINE_LOG",
        global = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Resolves the selection a command would send, and prints it
    Resolve(ResolveArgs),
    /// Prints the JSON schema of the engine configuration
    ConfigSchema,
}

#[derive(clap::Args, Debug)]
struct ResolveArgs {
    /// The schema description, as JSON or YAML
    #[arg(long, env = "SELECTION_ENGINE_SCHEMA")]
    schema: PathBuf,

    /// Engine configuration file
    #[arg(short, long = "config", env = "SELECTION_ENGINE_CONFIG")]
    config_path: Option<PathBuf>,

    /// How the base selection is chosen (raw|all|default)
    #[arg(long, default_value = "default")]
    mode: DisplayMode,

    /// Root type of the selection
    #[arg(long = "type")]
    root_type: Option<String>,

    /// Resource whose root type is looked up in the configuration
    #[arg(long)]
    resource: Option<String>,

    /// The command's own selection, used in `default` mode
    #[arg(long = "default")]
    default_selection: Option<String>,

    /// Selection text replacing the base selection, or `@path` to read it from a file
    #[arg(long = "select")]
    selection: Option<String>,

    /// Field paths such as `variants.nodes.sku`
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Connections to include in `all` mode
    #[arg(long = "include")]
    include: Vec<String>,

    /// Always select `id`
    #[arg(long)]
    require_id: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Graphql)]
    format: Format,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Format {
    Graphql,
    Json,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = std::env::var("RUST_LOG").ok().unwrap_or(args.log_level);
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::try_new(&env_filter).context("could not parse log")?)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Resolve(resolve_args) => resolve(resolve_args),
        Command::ConfigSchema => {
            let schema = schemars::schema_for!(EngineConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

fn resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let config = match &args.config_path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("could not load configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let schema = SchemaIndex::from_path(&args.schema, config.connection_suffix.clone())?;
    let default_selection = args
        .default_selection
        .as_deref()
        .map(parse_selection)
        .transpose()
        .context("invalid default selection")?;

    let root_type = args
        .root_type
        .clone()
        .or_else(|| {
            args.resource
                .as_deref()
                .and_then(|resource| config.root_type_for(resource))
                .map(str::to_string)
        });
    let request = SelectionRequest {
        mode: args.mode,
        root_type: args.root_type,
        resource: args.resource,
        default_selection,
        selection_override: args.selection.as_deref().map(SelectionSource::parse_arg),
        field_paths: args.fields,
        include_connections: args.include,
        require_id: args.require_id,
    };
    tracing::debug!(?request, "resolving selection");

    let resolver = SelectionResolver::new(Arc::new(schema), config)?;
    let selection = resolver.resolve(&request)?;
    match (args.format, root_type) {
        (Format::Json, _) => println!("{}", serde_json::to_string_pretty(&selection)?),
        (Format::Graphql, Some(root_type)) => {
            println!("{}", selection.to_graphql(&root_type, resolver.schema()))
        }
        (Format::Graphql, None) => println!("{selection}"),
    }
    Ok(())
}
