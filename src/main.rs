use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use pathquery::config::{ConfigOverrides, EngineConfig};
use pathquery::in_memory::{ConditionEvaluator, JsonAccessor, Sorter};
use pathquery::relational::{
    EntityCatalog, JoinType, ParameterStyle, QueryPreparer, QueryRequest, ToDql,
};
use pathquery::value::Value;

/// pathquery - evaluate or compile property path conditions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (YAML); PATHQUERY_* environment variables otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OverrideArgs {
    /// Hex digits of the path hash kept in join aliases
    #[arg(long, global = true)]
    alias_hash_length: Option<usize>,

    /// Join type for association joins (left, inner)
    #[arg(long, global = true)]
    join_type: Option<JoinType>,

    /// Placeholder style (positional, named)
    #[arg(long, global = true)]
    parameter_style: Option<ParameterStyle>,

    /// Maximum value rows per object during in-memory evaluation
    #[arg(long, global = true)]
    max_value_rows: Option<usize>,

    /// Alias of the root entity
    #[arg(long, global = true)]
    root_alias: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        ConfigOverrides {
            alias_hash_length: args.alias_hash_length,
            default_join_type: args.join_type,
            parameter_style: args.parameter_style,
            max_value_rows: args.max_value_rows,
            root_alias: args.root_alias,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compile a query document into DQL and bound parameters
    Compile {
        /// Entity catalog (YAML)
        #[arg(long)]
        schema: PathBuf,
        /// Query document (YAML or JSON)
        #[arg(long)]
        query: PathBuf,
    },
    /// Filter, sort and slice a JSON array in memory
    Filter {
        /// JSON array of objects
        #[arg(long)]
        data: PathBuf,
        /// Query document (YAML or JSON)
        #[arg(long)]
        query: PathBuf,
    },
}

#[derive(Serialize)]
struct CompiledOutput<'q> {
    dql: String,
    parameters: &'q [Value],
    offset: usize,
    limit: Option<usize>,
}

fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::from_env().context("loading config from environment")?,
    };
    config.merge(overrides).context("applying command line overrides")?;
    Ok(config)
}

/// YAML is a superset of JSON, so one parser covers both formats.
fn load_request(path: &Path) -> Result<QueryRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading query {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("parsing query {}", path.display()))
}

fn compile(config: EngineConfig, schema: &Path, query: &Path) -> Result<()> {
    let catalog = EntityCatalog::from_yaml_file(schema)
        .with_context(|| format!("loading schema {}", schema.display()))?;
    let request = load_request(query)?;

    let prepared = QueryPreparer::with_config(&catalog, config).prepare(&request)?;
    let output = CompiledOutput {
        dql: prepared.to_dql(),
        parameters: &prepared.parameters,
        offset: prepared.slice.offset,
        limit: prepared.slice.limit,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn filter(config: EngineConfig, data: &Path, query: &Path) -> Result<()> {
    let content = std::fs::read_to_string(data)
        .with_context(|| format!("reading data {}", data.display()))?;
    let objects: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("parsing data {} as a JSON array", data.display()))?;
    let request = load_request(query)?;
    let slice = request.slice().validate()?;

    let evaluator = ConditionEvaluator::with_config(JsonAccessor, &config);
    let matching = evaluator.filter(&objects, &request.conditions)?;
    let sorted = Sorter::with_config(JsonAccessor, &config).sort(matching, &request.sort)?;
    let page = slice.apply(sorted);

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to WARN level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.overrides.into())?;
    log::debug!("Engine configuration: {:?}", config);

    match cli.command {
        Command::Compile { schema, query } => compile(config, &schema, &query),
        Command::Filter { data, query } => filter(config, &data, &query),
    }
}
