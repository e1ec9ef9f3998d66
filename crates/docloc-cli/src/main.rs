use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use docloc_config::{load_config, DoclocConfig};
use docloc_domain::SyncReport;
use docloc_services::{
    rewrite_links, sync_catalogs, sync_documents, translate_tree, LinkMode, SitePaths, SyncOptions,
};
use docloc_translate::{DeepLClient, Translator};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(name = "docloc", version, about = "Translation sync for multilingual documentation sites")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the whole master docs tree for every target language
    Translate {
        /// Site root (directory containing content/ and i18n/)
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Restrict the run to one target language
        #[arg(long)]
        lang: Option<String>,
        /// Report what would be translated without calling the API
        #[arg(long, alias = "dry-run")]
        check: bool,
    },

    /// Incrementally sync translations, skipping up-to-date documents
    Sync {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, alias = "dry-run")]
        check: bool,
        /// Retranslate even documents the marker proves current
        #[arg(long)]
        force: bool,
    },

    /// Sync per-locale UI-string catalogs against the master catalog
    Catalog {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, alias = "dry-run")]
        check: bool,
    },

    /// Rewrite internal markdown links across the content tree
    Links {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Target link shape
        #[arg(long)]
        mode: Option<LinksTarget>,
        /// Language prefix for docs-mode links
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, alias = "dry-run")]
        check: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LinksTarget {
    /// `{{< doclink … />}}` shortcodes
    Doclink,
    /// `[text](/<lang>/docs/…)` links
    Docs,
}

impl From<LinksTarget> for LinkMode {
    fn from(t: LinksTarget) -> LinkMode {
        match t {
            LinksTarget::Doclink => LinkMode::Doclink,
            LinksTarget::Docs => LinkMode::Docs,
        }
    }
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        info!("▶ Starting command: {}", cmd_name);
        let cfg = load_config()?;

        let result = match self {
            Commands::Translate { root, lang, check } => {
                debug!("Translate args: root={:?} lang={:?} check={}", root, lang, check);
                let paths = SitePaths::resolve(&root, &cfg);
                let translator = build_translator(&cfg, check)?;
                let opts = SyncOptions { check, force: false, lang };
                let report =
                    translate_tree(&paths, translator.as_ref().map(|t| t as &dyn Translator), &opts)?;
                finish_sync(&report, use_color)
            }

            Commands::Sync { root, lang, check, force } => {
                debug!("Sync args: root={:?} lang={:?} check={} force={}", root, lang, check, force);
                let paths = SitePaths::resolve(&root, &cfg);
                let translator = build_translator(&cfg, check)?;
                let opts = SyncOptions { check, force, lang };
                let report =
                    sync_documents(&paths, translator.as_ref().map(|t| t as &dyn Translator), &opts)?;
                finish_sync(&report, use_color)
            }

            Commands::Catalog { root, lang, check } => {
                debug!("Catalog args: root={:?} lang={:?} check={}", root, lang, check);
                let paths = SitePaths::resolve(&root, &cfg);
                let translator = build_translator(&cfg, check)?;
                let opts = SyncOptions { check, force: false, lang };
                let report =
                    sync_catalogs(&paths, translator.as_ref().map(|t| t as &dyn Translator), &opts)?;
                finish_sync(&report, use_color)
            }

            Commands::Links { root, mode, lang, check } => {
                debug!("Links args: root={:?} mode={:?} lang={:?} check={}", root, mode, lang, check);
                let paths = SitePaths::resolve(&root, &cfg);
                let links_cfg = cfg.links.clone().unwrap_or_default();
                let mode: LinkMode = mode
                    .map(Into::into)
                    .or_else(|| match links_cfg.mode.as_deref() {
                        Some("docs") => Some(LinkMode::Docs),
                        Some("doclink") => Some(LinkMode::Doclink),
                        _ => None,
                    })
                    .unwrap_or(LinkMode::Doclink);
                let lang = lang
                    .or(links_cfg.lang)
                    .unwrap_or_else(|| docloc_config::MASTER_LANG.to_string());
                let report = rewrite_links(&paths.content_dir, mode, &lang, check)?;
                print_link_report(&report, check, use_color);
                if check && report.total_conversions > 0 {
                    std::process::exit(1);
                }
                Ok(())
            }
        };

        match &result {
            Ok(_) => info!("✔ Finished command: {}", cmd_name),
            Err(e) => error!("✖ Command {} failed: {:?}", cmd_name, e),
        }

        result
    }
}

/// Outside check mode a translator is mandatory; a missing API key must
/// abort before any file is touched.
fn build_translator(cfg: &DoclocConfig, check: bool) -> Result<Option<DeepLClient>> {
    if check {
        return Ok(None);
    }
    let mut client = DeepLClient::from_env()?;
    if let Some(t) = &cfg.translate {
        // Environment wins over the config file for the endpoint.
        if std::env::var_os("DEEPL_API_URL").is_none() {
            if let Some(url) = &t.api_url {
                client = client.with_api_url(url);
            }
        }
        if let Some(ms) = t.rate_delay_ms {
            client = client.with_rate_delay(Duration::from_millis(ms));
        }
    }
    Ok(Some(client))
}

fn finish_sync(report: &SyncReport, use_color: bool) -> Result<()> {
    print_sync_report(report, use_color);
    if report.check && report.has_pending() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_sync_report(report: &SyncReport, use_color: bool) {
    for lr in &report.locales {
        if report.check {
            println!("{}: {} change(s) pending", lr.locale, lr.pending);
        } else {
            println!(
                "{}: {} translated, {} up to date, {} failed",
                lr.locale, lr.translated, lr.up_to_date, lr.failed
            );
        }
    }
    if report.check {
        for pc in &report.pending_changes {
            println!("  [{}] {} — {}", pc.locale, pc.unit, pc.detail);
        }
        if report.has_pending() {
            let msg = format!("{} change(s) pending", report.total_pending());
            if use_color {
                use owo_colors::OwoColorize;
                println!("⚠ {}", msg.yellow());
            } else {
                println!("⚠ {msg}");
            }
        } else {
            println!("✔ Everything up to date");
        }
    } else {
        println!("✔ Done: {} unit(s) translated", report.total_translated());
    }
}

fn print_link_report(report: &docloc_domain::LinkReport, check: bool, use_color: bool) {
    for file in &report.files {
        println!("{}:", file.path);
        for conv in &file.conversions {
            println!("  [{}] {} → {}", conv.kind, conv.original, conv.converted);
        }
    }
    if check {
        if report.total_conversions > 0 {
            let msg = format!(
                "{} link(s) in {} file(s) need conversion",
                report.total_conversions,
                report.files.len()
            );
            if use_color {
                use owo_colors::OwoColorize;
                println!("⚠ {}", msg.yellow());
            } else {
                println!("⚠ {msg}");
            }
        } else {
            println!("✔ No links need conversion");
        }
    } else {
        println!(
            "✔ Converted {} link(s) in {} file(s)",
            report.total_conversions,
            report.files.len()
        );
    }
}

fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = rolling::daily("logs", "docloc.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _guard = init_tracing();

    let cli = Cli::parse();

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
