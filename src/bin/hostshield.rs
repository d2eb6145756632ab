//! hostshield: CLI tool for checking host names against ad-block rule files.

use clap::{Parser, Subcommand};
use hostshield::{
    available_methods, AdBlockManager, AdBlockMethod, AdBlockModel, Backend, CacheConfig,
    JsonSettingsStore, LogEntrySort, MemoryBackend, MemoryRuleStore, MemorySettingsStore,
    Settings, SettingsStore, VpnConfig, VpnModel,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hostshield")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Classify host names against ad-block rule files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify host names
    Classify {
        /// Rule text file
        #[arg(short, long)]
        rules: PathBuf,

        /// Host cache capacity
        #[arg(short, long, default_value_t = hostshield::cache::DEFAULT_CACHE_CAPACITY)]
        capacity: usize,

        /// Host names to classify
        #[arg(required = true)]
        hosts: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Record host names and print the classified query log
    Report {
        /// Rule text file
        #[arg(short, long)]
        rules: PathBuf,

        /// Sort order: "tld" or "alphabetical"
        #[arg(short, long, default_value = "tld")]
        sort: String,

        /// Host names to record
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Show or update persisted settings
    Settings {
        /// Settings file
        #[arg(short, long, default_value = "hostshield.json")]
        path: PathBuf,

        /// Enable or disable query log recording
        #[arg(long)]
        recording: Option<bool>,

        /// Blocking method ("vpn" or "root")
        #[arg(long)]
        method: Option<String>,
    },

    /// List available blocking methods
    Methods,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classify {
            rules,
            capacity,
            hosts,
            verbose,
        } => classify(&rules, capacity, &hosts, verbose),
        Commands::Report { rules, sort, hosts } => report(&rules, &sort, &hosts),
        Commands::Settings {
            path,
            recording,
            method,
        } => settings(&path, recording, method.as_deref()),
        Commands::Methods => {
            for method in available_methods() {
                println!("{:<6} {}", method.name, method.display_name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn classify(
    rules: &PathBuf,
    capacity: usize,
    hosts: &[String],
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = MemoryRuleStore::load(rules)?;
    let config = VpnConfig {
        cache: CacheConfig::with_capacity(capacity),
        log_capacity: None,
    };
    let model = VpnModel::new(
        Arc::new(store),
        Arc::new(MemoryBackend::new()),
        Arc::new(MemorySettingsStore::default()),
        config,
    );

    for host in hosts {
        match model.get_entry(host) {
            Some(entry) if entry.host != *host => {
                println!("{} -> {} (via {})", host, entry.classification, entry.host)
            }
            Some(entry) => println!("{} -> {}", host, entry.classification),
            None => println!("{} -> UNCLASSIFIED", host),
        }
    }

    if verbose {
        let stats = model.cache_stats();
        println!(
            "Cache: {}/{} entries, {} hits, {} misses ({:.1}% miss rate)",
            stats.len,
            stats.capacity,
            stats.hits,
            stats.misses,
            stats.miss_ratio() * 100.0
        );
    }
    Ok(())
}

fn report(rules: &PathBuf, sort: &str, hosts: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let sort = LogEntrySort::parse(sort).ok_or_else(|| format!("unknown sort order: {}", sort))?;
    let store = Arc::new(MemoryRuleStore::load(rules)?);
    let settings = Arc::new(MemorySettingsStore::new(Settings {
        recording_enabled: true,
        active_method: AdBlockMethod::Vpn,
    }));
    let manager = AdBlockManager::new(
        store,
        settings,
        Box::new(|_: AdBlockMethod| -> Arc<dyn Backend> { Arc::new(MemoryBackend::new()) }),
    );

    let model = manager.current();
    for host in hosts {
        model.get_entry(host);
    }

    let report = manager.report(sort)?;
    println!("{} ({} hosts)", report.sort(), report.len());
    for entry in report.entries() {
        match entry.classification {
            Some(ref classification) => println!("  {:<40} {}", entry.host, classification),
            None => println!("  {}", entry.host),
        }
    }
    Ok(())
}

fn settings(
    path: &PathBuf,
    recording: Option<bool>,
    method: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonSettingsStore::open(path)?;

    if let Some(recording) = recording {
        store.set_recording_enabled(recording)?;
    }
    if let Some(method) = method {
        store.set_active_method(method.parse()?)?;
    }

    println!("Settings file: {:?}", store.path());
    println!("  recording: {}", store.recording_enabled());
    println!("  method:    {}", store.active_method().display_name());
    Ok(())
}
