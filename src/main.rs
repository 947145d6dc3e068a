// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use cyweb::db::SqliteStore;
use cyweb::repository::{FetchConfig, HttpTransport};
use cyweb::{Catalog, PackageRecord, RepositoryEntry, RepositoryRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cyweb")]
#[command(author, version, about = "Browse and search APT-style (Cydia/Sileo) repositories", long_about = None)]
struct Cli {
    /// Database path
    #[arg(short, long, global = true, default_value = "cyweb.db")]
    db_path: String,

    /// HTTP timeout in seconds
    #[arg(short, long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the Cyweb database
    Init,
    /// Register a repository
    RepoAdd {
        /// Repository base URL
        url: String,
        /// Display name (defaults to the URL)
        #[arg(short, long)]
        name: Option<String>,
        /// Icon URL
        #[arg(long)]
        icon: Option<String>,
        /// Compatibility note, e.g. "iOS 14+"
        #[arg(long)]
        compat: Option<String>,
    },
    /// Unregister a repository
    RepoRemove {
        /// Repository base URL
        url: String,
    },
    /// List registered repositories
    RepoList,
    /// Register the sample repositories (Havoc, Chariz, Procursus)
    RepoSamples,
    /// Describe a repository of your own and register it
    RepoCreate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        /// Icon URL
        #[arg(long)]
        icon: Option<String>,
        /// Compatibility note, e.g. "iOS 14+"
        #[arg(long)]
        compat: Option<String>,
    },
    /// List repositories created with repo-create
    RepoCreated,
    /// Fetch a repository's package index
    Fetch {
        /// Repository base URL
        url: String,
    },
    /// Fetch every registered repository
    Refresh,
    /// List the packages of a repository
    List {
        /// Repository base URL
        url: String,
    },
    /// Search all registered repositories by package, name or maintainer
    Search {
        query: String,
    },
    /// Show details of a package
    Show {
        /// Repository base URL
        url: String,
        /// Package identifier (the `Package` field)
        package: String,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Simulate installing a package (nothing is downloaded)
    Install {
        /// Repository base URL
        url: String,
        /// Package identifier (the `Package` field)
        package: String,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn open_catalog(cli: &Cli) -> Result<Catalog<SqliteStore>> {
    let kv = SqliteStore::open(&cli.db_path)?;
    let config = FetchConfig {
        timeout: Duration::from_secs(cli.timeout),
        ..FetchConfig::default()
    };
    let transport = HttpTransport::with_config(&config)?;
    Ok(Catalog::new(RepositoryRegistry::new(kv), Arc::new(transport)))
}

fn print_repository(repo: &RepositoryEntry) {
    println!("  {}", repo.display_name());
    println!("    URL: {}", repo.url);
    println!("    Compatibility: {}", repo.compat_label());
    if let Some(icon) = &repo.icon {
        println!("    Icon: {}", icon);
    }
}

fn print_summary(pkg: &PackageRecord) {
    println!("  {} {}", pkg.package(), pkg.version().unwrap_or_default());
}

fn print_details(pkg: &PackageRecord) {
    println!("{}", pkg.name());
    println!("  {}", pkg.description().unwrap_or("No description"));
    println!(
        "  Version: {} - Maintainer: {}",
        pkg.version().unwrap_or("?"),
        pkg.maintainer().unwrap_or("?")
    );
    if let Some(icon) = pkg.icon() {
        println!("  Icon: {}", icon);
    }
    println!("  Repository: {}", pkg.repo());
    println!("\nFields:");
    for (name, value) in pkg.fields() {
        println!("  {}: {}", name, value);
    }
}

/// Fetch `url`, turning a failure into a user-facing error
fn fetch(catalog: &Catalog<SqliteStore>, url: &str) -> Result<usize> {
    let count = catalog.fetch(url)?;
    let source = catalog
        .store()
        .entry(url.trim())
        .and_then(|e| e.source_url)
        .unwrap_or_else(|| url.to_string());
    println!("Fetched {} package(s) from {}", count, source);
    Ok(count)
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Init) => {
            info!("Initializing Cyweb database at: {}", cli.db_path);
            cyweb::db::init(&cli.db_path)?;
            println!("Database initialized successfully at: {}", cli.db_path);
            Ok(())
        }
        Some(Commands::RepoAdd {
            url,
            name,
            icon,
            compat,
        }) => {
            let catalog = open_catalog(&cli)?;
            if catalog.add_repository(
                url,
                name.as_deref(),
                icon.as_deref(),
                compat.as_deref(),
            )? {
                println!("Added repository: {}", url.trim());
            } else {
                println!("Repository already registered: {}", url.trim());
            }
            Ok(())
        }
        Some(Commands::RepoRemove { url }) => {
            let catalog = open_catalog(&cli)?;
            if !catalog.remove_repository(url)? {
                return Err(anyhow::anyhow!("Repository '{}' is not registered", url));
            }
            println!("Removed repository: {}", url);
            Ok(())
        }
        Some(Commands::RepoList) => {
            let catalog = open_catalog(&cli)?;
            let repos = catalog.registry().list()?;
            if repos.is_empty() {
                println!("No repositories registered.");
            } else {
                println!("Repositories:");
                for repo in &repos {
                    print_repository(repo);
                }
                println!("\nTotal: {} repository(ies)", repos.len());
            }
            Ok(())
        }
        Some(Commands::RepoSamples) => {
            let catalog = open_catalog(&cli)?;
            let added = catalog.registry().add_samples()?;
            println!("Added {} sample repository(ies)", added);
            Ok(())
        }
        Some(Commands::RepoCreate {
            name,
            url,
            icon,
            compat,
        }) => {
            let catalog = open_catalog(&cli)?;
            let entry = catalog
                .registry()
                .create(name, url, icon.as_deref(), compat.as_deref())?;
            println!("Created repository: {} ({})", entry.display_name(), entry.url);
            Ok(())
        }
        Some(Commands::RepoCreated) => {
            let catalog = open_catalog(&cli)?;
            let created = catalog.registry().created()?;
            if created.is_empty() {
                println!("No created repos yet");
            } else {
                println!("Your created repos (local):");
                for repo in &created {
                    print_repository(repo);
                }
            }
            Ok(())
        }
        Some(Commands::Fetch { url }) => {
            let catalog = open_catalog(&cli)?;
            fetch(&catalog, url)?;
            let featured = catalog.featured(url.trim());
            if !featured.is_empty() {
                println!("\nFeatured:");
                for pkg in &featured {
                    print_summary(pkg);
                }
            }
            Ok(())
        }
        Some(Commands::Refresh) => {
            let catalog = open_catalog(&cli)?;
            let results = catalog.refresh_all()?;
            if results.is_empty() {
                println!("No repositories registered.");
            }
            for (url, result) in &results {
                match result {
                    Ok(count) => println!("  {}: {} package(s)", url, count),
                    Err(e) => println!("  {}: {}", url, e),
                }
            }
            Ok(())
        }
        Some(Commands::List { url }) => {
            let catalog = open_catalog(&cli)?;
            fetch(&catalog, url)?;
            let packages = catalog.packages(url.trim());
            if packages.is_empty() {
                println!("No packages indexed for that repo.");
            } else {
                println!("Packages - {}:", url.trim());
                for pkg in packages.iter() {
                    print_summary(pkg);
                }
                println!("\nTotal: {} package(s)", packages.len());
            }
            Ok(())
        }
        Some(Commands::Search { query }) => {
            let catalog = open_catalog(&cli)?;
            for (url, result) in catalog.refresh_all()? {
                if let Err(e) = result {
                    warn!("Skipping {}: {}", url, e);
                }
            }

            let results = catalog.search(query);
            if results.is_empty() {
                println!("No results");
            } else {
                for pkg in &results {
                    println!(
                        "  {} {} [{}]",
                        pkg.package(),
                        pkg.version().unwrap_or_default(),
                        pkg.repo()
                    );
                }
                println!("\nTotal: {} result(s)", results.len());
            }
            Ok(())
        }
        Some(Commands::Show { url, package, json }) => {
            let catalog = open_catalog(&cli)?;
            catalog.fetch(url)?;
            let pkg = catalog.package(url.trim(), package)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&pkg)?);
            } else {
                print_details(&pkg);
            }
            Ok(())
        }
        Some(Commands::Install { url, package }) => {
            let catalog = open_catalog(&cli)?;
            catalog.fetch(url)?;
            let install = catalog.install(url.trim(), package)?;
            println!(
                "Simulated install - no package was downloaded or installed. .deb URL: {}",
                install.deb_url.as_deref().unwrap_or("unknown")
            );
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "cyweb", &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("Cyweb v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'cyweb --help' for usage information");
            Ok(())
        }
    }
}
