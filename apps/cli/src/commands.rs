//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use orphanscan_core::{
    MemorySite, ScanProgress, details_for, find_orphans, find_orphans_cached, report,
};
use orphanscan_shared::{
    AppConfig, ContentStore, OrphanResult, PageId, ProtocolMode, ScanConfiguration, ScanLimits,
    SiteSnapshot, expand_home, init_config, load_config,
};
use orphanscan_storage::Storage;
use tracing::info;

use crate::export::{self, PageWindow};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// orphanscan: find published pages that nothing on the site links to.
#[derive(Parser)]
#[command(
    name = "orphanscan",
    version,
    about = "Find published pages that no content, menu or redirect links to.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Site database path (defaults to `defaults.database` from the config file).
    #[arg(long, env = "ORPHANSCAN_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ReportFormat {
    Text,
    Json,
    Csv,
}

/// Scheme unification for URL comparison.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ProtocolArg {
    None,
    ToHttps,
    ToHttp,
}

impl From<ProtocolArg> for ProtocolMode {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::None => ProtocolMode::None,
            ProtocolArg::ToHttps => ProtocolMode::ForceSecure,
            ProtocolArg::ToHttp => ProtocolMode::ForceInsecure,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan the site and report orphan pages.
    Scan(ScanArgs),

    /// Load a JSON site snapshot into the site database.
    Import {
        /// Snapshot file to import.
        snapshot: PathBuf,
    },

    /// Move pages back to draft status.
    Draft {
        /// Page ids to unpublish.
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Result cache management.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `scan`.
#[derive(clap::Args)]
pub(crate) struct ScanArgs {
    /// Leave posts out of the inventory (they still count as link sources).
    #[arg(long)]
    pub exclude_posts: bool,

    /// Metadata key holding redirect targets.
    #[arg(long)]
    pub redirect_key: Option<String>,

    /// Scheme unification before comparing URLs.
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to this file (CSV defaults to orphan-pages-YYYY-MM-DD.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Page of the text report to show (1-based).
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per text page: 20, 50 or 100.
    #[arg(long, value_parser = parse_per_page)]
    pub per_page: Option<usize>,

    /// Ignore cached results and do not store this one.
    #[arg(long)]
    pub no_cache: bool,

    /// Link scan time limit in seconds.
    #[arg(long)]
    pub max_duration: Option<u64>,

    /// Scan a snapshot file in memory instead of the site database.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

fn parse_per_page(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n @ (20 | 50 | 100)) => Ok(n),
        _ => Err(format!("'{raw}' is not one of 20, 50, 100")),
    }
}

impl ScanArgs {
    /// Flags override the `[defaults]` section.
    fn scan_configuration(&self, config: &AppConfig) -> ScanConfiguration {
        let mut scan = ScanConfiguration::from(config);
        if self.exclude_posts {
            scan.include_listable = false;
        }
        if let Some(key) = &self.redirect_key {
            scan.redirect_key = key.clone();
        }
        if let Some(protocol) = self.protocol {
            scan.protocol_mode = protocol.into();
        }
        scan
    }

    fn limits(&self, config: &AppConfig) -> ScanLimits {
        let mut limits = ScanLimits::from(config);
        if let Some(secs) = self.max_duration {
            limits.max_duration = Duration::from_secs(secs);
        }
        limits
    }
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Drop every cached scan result.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so reports can be piped.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "orphanscan=warn",
        1 => "orphanscan=info",
        2 => "orphanscan=debug",
        _ => "orphanscan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let db = cli.db.as_deref();
    match cli.command {
        Command::Scan(args) => cmd_scan(db, &args).await,
        Command::Import { snapshot } => cmd_import(db, &snapshot).await,
        Command::Draft { ids } => cmd_draft(db, &ids).await,
        Command::Cache { action } => match action {
            CacheAction::Clear => cmd_cache_clear(db).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Open the site database named by `--db` or the config file.
async fn open_storage(db: Option<&Path>, config: &AppConfig) -> Result<Storage> {
    let path = match db {
        Some(path) => path.to_path_buf(),
        None => expand_home(&config.defaults.database)?,
    };
    info!(path = %path.display(), "opening site database");
    Ok(Storage::open(&path).await?)
}

fn read_snapshot(path: &Path) -> Result<SiteSnapshot> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read snapshot {}", path.display()))?;
    Ok(SiteSnapshot::from_json(&text)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scan(db: Option<&Path>, args: &ScanArgs) -> Result<()> {
    let config = load_config()?;
    let scan_config = args.scan_configuration(&config);
    let limits = args.limits(&config);
    let use_cache = config.scan.use_cache && !args.no_cache;

    info!(
        cache_key = %scan_config.cache_key(),
        max_duration_secs = limits.max_duration.as_secs(),
        use_cache,
        "starting orphan scan"
    );

    if let Some(path) = &args.snapshot {
        let site = MemorySite::from_snapshot(read_snapshot(path)?);
        let progress = CliProgress::new();
        let result = find_orphans(&site, &scan_config, &limits, &progress)
            .await
            .map_err(scan_failure)?;
        return emit_report(&site, &result, &scan_config, args, &config).await;
    }

    let storage = open_storage(db, &config).await?;
    if storage.activate_config(&scan_config).await? {
        info!("scan settings changed since the last run");
    }

    let progress = CliProgress::new();
    let scanned = if use_cache {
        find_orphans_cached(&storage, &storage, &scan_config, &limits, &progress).await
    } else {
        find_orphans(&storage, &scan_config, &limits, &progress).await
    };
    let result = scanned.map_err(scan_failure)?;

    emit_report(&storage, &result, &scan_config, args, &config).await
}

/// Attach a retry hint to errors that a second attempt may fix.
fn scan_failure(err: orphanscan_shared::OrphanScanError) -> color_eyre::eyre::Report {
    if err.is_retryable() {
        eyre!(err).wrap_err("orphan scan did not complete; it is safe to run it again")
    } else {
        eyre!(err)
    }
}

async fn emit_report<S: ContentStore>(
    store: &S,
    result: &OrphanResult,
    scan_config: &ScanConfiguration,
    args: &ScanArgs,
    config: &AppConfig,
) -> Result<()> {
    match args.format {
        ReportFormat::Text => {
            let per_page = args.per_page.unwrap_or(config.defaults.per_page).max(1);
            let page = args.page.max(1);
            let rows = details_for(store, result.paginate(page, per_page)).await?;
            let text = export::render_text(
                &rows,
                PageWindow {
                    page,
                    page_count: result.page_count(per_page),
                    total: result.len(),
                },
            );
            write_output(args.output.as_deref(), &text)
        }
        ReportFormat::Json => {
            let rows = report(store, result).await?;
            let json = export::render_json(&scan_config.cache_key(), &rows)?;
            write_output(args.output.as_deref(), &format!("{json}\n"))
        }
        ReportFormat::Csv => {
            let rows = report(store, result).await?;
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(export::default_csv_name(Local::now().date_naive())));
            std::fs::write(&path, export::render_csv(&rows))
                .wrap_err_with(|| format!("cannot write {}", path.display()))?;
            println!("Exported {} orphan page(s) to {}", rows.len(), path.display());
            Ok(())
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .wrap_err_with(|| format!("cannot write {}", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

async fn cmd_import(db: Option<&Path>, snapshot_path: &Path) -> Result<()> {
    let config = load_config()?;
    let snapshot = read_snapshot(snapshot_path)?;
    let storage = open_storage(db, &config).await?;

    let summary = storage.import_snapshot(&snapshot).await?;
    println!();
    println!("  Site snapshot imported.");
    println!("  Home:     {}", snapshot.home_url);
    println!("  Pages:    {}", summary.pages);
    println!("  Menus:    {} ({} entries)", summary.menus, summary.menu_entries);
    println!();
    Ok(())
}

async fn cmd_draft(db: Option<&Path>, ids: &[u64]) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;
    let ids: Vec<PageId> = ids.iter().copied().map(PageId).collect();

    let changed = storage.move_to_draft(&ids).await?;
    println!("{changed} page(s) moved to draft.");
    Ok(())
}

async fn cmd_cache_clear(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(db, &config).await?;
    let removed = storage.clear_scan_cache().await?;
    println!("Removed {removed} cached scan result(s).");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ScanProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_scanned(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Scanning links [{current}/{total}]"));
    }

    fn done(&self, _result: &OrphanResult, _from_cache: bool) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::parse_from([
            "orphanscan",
            "scan",
            "--exclude-posts",
            "--redirect-key",
            "go_to",
            "--protocol",
            "to-https",
            "--max-duration",
            "5",
        ]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };

        let config = AppConfig::default();
        let scan = args.scan_configuration(&config);
        assert!(!scan.include_listable);
        assert_eq!(scan.redirect_key, "go_to");
        assert_eq!(scan.protocol_mode, ProtocolMode::ForceSecure);
        assert_eq!(args.limits(&config).max_duration, Duration::from_secs(5));
    }

    #[test]
    fn config_defaults_apply_without_flags() {
        let cli = Cli::parse_from(["orphanscan", "scan"]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let scan = args.scan_configuration(&AppConfig::default());
        assert_eq!(scan, ScanConfiguration::default());
        assert_eq!(args.format, ReportFormat::Text);
    }

    #[test]
    fn per_page_is_restricted() {
        assert!(Cli::try_parse_from(["orphanscan", "scan", "--per-page", "50"]).is_ok());
        assert!(Cli::try_parse_from(["orphanscan", "scan", "--per-page", "7"]).is_err());
    }

    #[test]
    fn draft_requires_ids() {
        assert!(Cli::try_parse_from(["orphanscan", "draft"]).is_err());
        let cli = Cli::parse_from(["orphanscan", "draft", "4", "9"]);
        assert!(matches!(cli.command, Command::Draft { ids } if ids == vec![4, 9]));
    }
}
