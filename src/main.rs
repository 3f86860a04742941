//! Zentinel route transforms CLI entry point.
//!
//! Applies a configured set of route transforms to a batch of route
//! definitions and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_route_transforms::{Realm, TransformConfig, Value};

#[derive(Parser, Debug)]
#[command(name = "zentinel-route-transforms")]
#[command(
    author,
    version,
    about = "Apply ordered, conflict-checked transforms to route definitions"
)]
struct Args {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long, env = "ROUTE_TRANSFORMS_CONFIG")]
    config: Option<PathBuf>,

    /// Route definitions file (YAML or JSON); reads JSON from stdin if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Scope name reported to handlers (overrides settings.scope)
    #[arg(long)]
    scope: Option<String>,

    /// Pretty-print the transformed routes
    #[arg(long)]
    pretty: bool,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit.
    #[arg(long)]
    example_config: bool,

    /// Validate configuration, print the transform order and exit.
    #[arg(long)]
    validate: bool,
}

fn print_example_config() {
    let example = r#"# Route Transforms Configuration Example
version: "1"

settings:
  # Scope name reported to handlers as ${scope}
  scope: "root"
  # Correlation ID reported as ${correlation_id}
  correlation_id: ""
  # Variables available as ${vars.NAME} or ${NAME}
  vars:
    api_version: "2"

transforms:
  # Turn GET routes into POST routes
  - name: "get-to-post"
    description: "Serve legacy GET endpoints as POST"
    root: "method"
    match:
      valid: ["get"]
    handler:
      set: "post"

  # One route per path when a list of paths is given
  - name: "multi-path"
    root: "path"
    match:
      type: array
    handler:
      spread: true

  # Version every API path; must see paths after they are spread
  - name: "version-paths"
    root: "path"
    after: "multi-path"
    match:
      type: string
      pattern:
        pattern: "/api/*"
        type: glob
    handler:
      prepend: "/v${api_version}"

  # Allow credentials on every route, creating the cors block if needed
  - name: "cors-defaults"
    root: "config.cors"
    match:
      type: object
      default: {}
    handler:
      merge:
        with:
          credentials: true
"#;
    println!("{}", example);
}

/// YAML for `.yaml`/`.yml` files, JSON otherwise.
fn is_yaml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "yaml" || e == "yml")
}

fn load_config(path: &Path) -> Result<TransformConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = if is_yaml(path) {
        TransformConfig::from_yaml(&content)?
    } else {
        TransformConfig::from_json(&content)?
    };
    Ok(config)
}

fn load_routes(path: Option<&Path>) -> Result<Vec<Value>> {
    let parsed: serde_json::Value = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read routes file: {}", path.display()))?;
            if is_yaml(path) {
                serde_yaml::from_str(&content).context("Invalid YAML routes")?
            } else {
                serde_json::from_str(&content).context("Invalid JSON routes")?
            }
        }
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read routes from stdin")?;
            serde_json::from_str(&content).context("Invalid JSON routes")?
        }
    };

    Ok(match parsed {
        serde_json::Value::Array(routes) => routes.into_iter().map(Value::from).collect(),
        route => vec![Value::from(route)],
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries the routes
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Print example config if requested
    if args.example_config {
        print_example_config();
        return Ok(());
    }

    // Load configuration
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TransformConfig::default(),
    };

    if let Some(scope) = &args.scope {
        config.settings.scope = scope.clone();
    }

    let realm = Realm::from_config(&config).context("Invalid transform configuration")?;

    // Validate only if requested
    if args.validate {
        info!(order = ?realm.registry().names(), "Configuration is valid");
        for name in realm.registry().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let routes = load_routes(args.input.as_deref())?;
    let ctx = config.settings.context();

    let mut table: Vec<Value> = Vec::new();
    realm
        .routes(routes, vec![], false, &ctx, &mut table)
        .context("Failed to transform routes")?;

    let output = if args.pretty {
        serde_json::to_string_pretty(&table)?
    } else {
        serde_json::to_string(&table)?
    };
    println!("{}", output);

    Ok(())
}
