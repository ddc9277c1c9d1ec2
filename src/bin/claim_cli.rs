//! Claim Machinery CLI
//!
//! Lists, inspects and renders claim templates from the same catalog the
//! API server uses.
//!
//! # Usage
//!
//! ```bash
//! claim_cli list
//! claim_cli show volumeclaim
//! claim_cli render volumeclaim --set namespace=prod --set storage=5Gi
//! claim_cli render vsphere-vm --set size=random --output /tmp/vm.yaml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use claim_machinery::config::{default_log_filter, Settings};
use claim_machinery::display::{rendered_output, template_summary};
use claim_machinery::params::{
    apply_random_choices, resolve_parameters, stringify_values, validate_parameters, ParamMap,
};
use claim_machinery::render::write_rendered;
use claim_machinery::{render_template, Catalog, KclRenderer};

#[derive(Parser)]
#[command(name = "claim_cli")]
#[command(version)]
#[command(about = "List, inspect and render claim templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to templates directory
    #[arg(long, global = true, env = "TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// Path to template profile YAML
    #[arg(long, global = true, env = "TEMPLATE_PROFILE_PATH")]
    profile: Option<PathBuf>,

    /// KCL binary used for rendering
    #[arg(long, global = true, env = "KCL_BIN")]
    kcl_bin: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all templates in the catalog
    List,

    /// Show a template and its parameters
    Show {
        /// Template name
        name: String,
    },

    /// Render a template with KCL
    Render {
        /// Template name
        name: String,

        /// Parameter value as key=value (repeatable)
        #[arg(long = "set", short = 's', value_parser = parse_key_value)]
        values: Vec<(String, String)>,

        /// Override the template's tag
        #[arg(long)]
        tag: Option<String>,

        /// Refuse to render when parameters break their constraints
        #[arg(long)]
        strict: bool,

        /// Also write the rendered YAML to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        bail!("empty key in '{}'", s);
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut settings = Settings::from_env();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(dir) = cli.templates_dir {
        settings.catalog.templates_dir = dir;
    }
    if let Some(profile) = cli.profile {
        settings.catalog.profile_path = Some(profile);
    }
    if let Some(bin) = cli.kcl_bin {
        settings.render.kcl_binary = bin;
    }

    match run(cli.command, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings: Settings) -> Result<()> {
    let build = Catalog::build(&settings.catalog)
        .await
        .context("failed to build template catalog")?;
    let catalog = build.catalog;

    match command {
        Commands::List => {
            for t in catalog.list() {
                println!(
                    "{}  {}  {}",
                    t.name().bold(),
                    t.metadata.title,
                    t.spec.source.dimmed()
                );
            }
        }

        Commands::Show { name } => {
            let t = catalog
                .get(&name)
                .ok_or_else(|| anyhow!("template '{}' not found", name))?;
            print!("{}", template_summary(t));
            if !t.metadata.description.is_empty() {
                println!("\n{}", t.metadata.description);
            }
        }

        Commands::Render {
            name,
            values,
            tag,
            strict,
            output,
        } => {
            let mut template = catalog
                .get(&name)
                .cloned()
                .ok_or_else(|| anyhow!("template '{}' not found", name))?;
            if tag.is_some() {
                template.spec.tag = tag;
            }

            let overrides: ParamMap = values
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            let mut params = resolve_parameters(&template, Some(&overrides));
            apply_random_choices(&template, &mut params, &mut rand::thread_rng());

            let violations = validate_parameters(&template, &params);
            for v in &violations {
                eprintln!("{} {}: {}", "warning:".yellow().bold(), v.parameter, v.message);
            }
            if strict && !violations.is_empty() {
                bail!("{} parameter(s) failed validation", violations.len());
            }

            // KCL schemas in the catalog expect string values
            let params = stringify_values(&params);

            eprintln!("{}", "Rendering with KCL...".dimmed());
            let renderer = KclRenderer::from_settings(&settings.render);
            let rendered = render_template(&renderer, &template, &params).await?;

            eprintln!("{}", "Rendered successfully!".green().bold());
            println!("{}", rendered_output(template.name(), &rendered));

            if let Some(dest) = output {
                write_rendered(&dest, &rendered).await?;
                eprintln!("Saved to {}", dest.display());
            }
        }
    }

    Ok(())
}
