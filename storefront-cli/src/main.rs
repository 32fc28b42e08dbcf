//! Storefront layout operator CLI
//!
//! Compiles layouts against a customization database and prepares tenants
//! for their first render.
//!
//! Usage:
//!   storefront tenant add --db layouts.db acme
//!   storefront init --db layouts.db --tenant acme
//!   storefront compile --db layouts.db --themes themes --tenant acme --theme dawn --layout product

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storefront_engine::{CompilerConfig, DefinitionLoader, FileDefinitionSource, TemplateCompiler};
use storefront_store::CustomizationStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Compile and manage storefront layout customizations")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the compiled template for a tenant as JSON
    Compile {
        /// Customization database
        #[arg(long)]
        db: PathBuf,
        /// Themes directory
        #[arg(long)]
        themes: PathBuf,
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        theme: String,
        #[arg(long)]
        layout: String,
        /// Keep disabled sections and blocks in the output
        #[arg(long)]
        include_disabled: bool,
    },

    /// List the layout types a theme ships
    Layouts {
        #[arg(long)]
        themes: PathBuf,
        #[arg(long)]
        theme: String,
    },

    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        command: TenantCommand,
    },

    /// Create default layout records for a tenant
    Init {
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        tenant: String,
    },
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Register a tenant by subdomain
    Add {
        #[arg(long)]
        db: PathBuf,
        subdomain: String,
    },
}

fn open_store(path: &Path) -> Result<Arc<CustomizationStore>> {
    let store = CustomizationStore::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match args.command {
        Command::Compile {
            db,
            themes,
            tenant,
            theme,
            layout,
            include_disabled,
        } => {
            let store = open_store(&db)?;
            let compiler = TemplateCompiler::new(Arc::new(FileDefinitionSource::new(themes)), store);
            let template = compiler
                .get_compiled_template(&tenant, &theme, &layout, include_disabled)
                .await
                .with_context(|| format!("Failed to compile {layout} for {tenant}"))?;

            match template {
                Some(template) => {
                    let json = serde_json::to_string_pretty(&template)
                        .context("Failed to encode compiled template")?;
                    println!("{json}");
                }
                None => println!("No definition for layout {layout} in theme {theme}"),
            }
        }

        Command::Layouts { themes, theme } => {
            let loader = DefinitionLoader::new(Arc::new(FileDefinitionSource::new(themes)));
            for layout_type in loader.list_layout_types(&theme).await {
                println!("{layout_type}");
            }
        }

        Command::Tenant {
            command: TenantCommand::Add { db, subdomain },
        } => {
            let store = open_store(&db)?;
            let id = store
                .register_tenant(&subdomain)
                .with_context(|| format!("Failed to register tenant {subdomain}"))?;
            info!("Tenant {} registered", subdomain);
            println!("{id}");
        }

        Command::Init { db, tenant } => {
            let store = open_store(&db)?;
            let tenant_id = store
                .resolve_tenant(&tenant)
                .with_context(|| format!("Failed to look up tenant {tenant}"))?
                .with_context(|| format!("Unknown tenant {tenant}"))?;
            let created = store
                .ensure_default_records(&tenant_id, &CompilerConfig::default().layout_types)
                .with_context(|| format!("Failed to initialize layouts for {tenant}"))?;
            info!("Initialized {} layout records for {}", created, tenant);
            println!("Created {created} layout records for {tenant}");
        }
    }

    Ok(())
}
