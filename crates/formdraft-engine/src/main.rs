use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use formdraft_engine::{
    AlwaysReady, AutosaveContext, DraftSession, EngineSettings, PageConfig, ReconcileOutcome,
    StaticForm, StaticMetadata,
};
use formdraft_model::{PageIdentity, Snapshot};
use formdraft_store::{DraftCache, DurableStore, FileStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn store_arg() -> Arg {
    Arg::new("store")
        .long("store")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file backing the durable store")
}

fn page_arg() -> Arg {
    Arg::new("page")
        .long("page")
        .required(true)
        .help("Page path the draft belongs to")
}

fn cli() -> Command {
    Command::new("formdraft")
        .version(formdraft_engine::VERSION)
        .about("Inspect and reconcile autosaved form drafts")
        .arg(
            Arg::new("settings")
                .long("settings")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine settings TOML file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("reconcile")
                .about("Sweep and reconcile a page load against a captured form")
                .arg(store_arg())
                .arg(page_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Page config JSON"),
                )
                .arg(
                    Arg::new("form")
                        .long("form")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Current form fields as a JSON snapshot"),
                ),
        )
        .subcommand(
            Command::new("prune")
                .about("Remove expired drafts")
                .arg(store_arg())
                .arg(
                    Arg::new("retention")
                        .long("retention")
                        .value_parser(value_parser!(i64))
                        .help("Retention in seconds (defaults to the configured retention)"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print the stored draft for a page")
                .arg(store_arg())
                .arg(page_arg()),
        )
        .subcommand(
            Command::new("discard")
                .about("Delete the stored draft for a page")
                .arg(store_arg())
                .arg(page_arg()),
        )
}

fn required<'a, T: Clone + Send + Sync + 'static>(
    args: &'a ArgMatches,
    id: &str,
) -> anyhow::Result<&'a T> {
    args.get_one::<T>(id)
        .with_context(|| format!("missing --{id}"))
}

fn load_settings(matches: &ArgMatches) -> anyhow::Result<EngineSettings> {
    match matches.get_one::<PathBuf>("settings") {
        Some(path) => EngineSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(EngineSettings::default()),
    }
}

fn open_store(path: &Path) -> anyhow::Result<Arc<dyn DurableStore>> {
    let store = FileStore::open(path)
        .with_context(|| format!("opening store {}", path.display()))?;
    Ok(Arc::new(store))
}

async fn reconcile(args: &ArgMatches, settings: EngineSettings) -> anyhow::Result<()> {
    let store = open_store(required::<PathBuf>(args, "store")?)?;
    let config = PageConfig::load(required::<PathBuf>(args, "config")?)?;
    let form_path = required::<PathBuf>(args, "form")?;
    let text = std::fs::read_to_string(form_path)
        .with_context(|| format!("reading form {}", form_path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text).context("decoding form snapshot")?;

    let page = config.page_identity(required::<String>(args, "page")?);
    let metadata = StaticMetadata::from_config(&config);
    let ctx = Arc::new(AutosaveContext::new(page, config, settings));
    let form = Arc::new(StaticForm::from_snapshot(&snapshot));
    let mut session = DraftSession::new(ctx, Some(store), form);

    match session.setup(&metadata, &AlwaysReady).await {
        ReconcileOutcome::Resume => {
            let record = session.save_now()?;
            println!(
                "resume: saved {} fields at {} (load #{})",
                record.form_values.len(),
                record.timestamp,
                record.save_count
            );
        }
        outcome @ ReconcileOutcome::PromptConflict { .. } => {
            if let Some(prompt) = outcome.prompt() {
                println!("prompt: {prompt}");
            }
        }
        ReconcileOutcome::Abort(reason) => println!("abort: {reason:?}"),
    }
    session.shutdown();
    Ok(())
}

fn prune(args: &ArgMatches, settings: &EngineSettings) -> anyhow::Result<()> {
    let cache = DraftCache::with_namespace(
        open_store(required::<PathBuf>(args, "store")?)?,
        settings.namespace.clone(),
    );
    let retention = args
        .get_one::<i64>("retention")
        .copied()
        .unwrap_or(settings.retention_secs);
    let now = chrono::Utc::now().timestamp();
    let report = cache.prune(now, retention)?;

    println!("Scanned: {}", report.scanned);
    println!("Removed: {}", report.removed.len());
    for key in &report.removed {
        println!("  - {key}");
    }
    if !report.malformed.is_empty() {
        println!("Malformed (kept): {}", report.malformed.len());
    }
    Ok(())
}

fn show(args: &ArgMatches, settings: &EngineSettings) -> anyhow::Result<()> {
    let cache = DraftCache::with_namespace(
        open_store(required::<PathBuf>(args, "store")?)?,
        settings.namespace.clone(),
    );
    let page = PageIdentity::new(required::<String>(args, "page")?.as_str());
    match cache.load(&page)? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("No draft stored for {page}"),
    }
    Ok(())
}

fn discard(args: &ArgMatches, settings: &EngineSettings) -> anyhow::Result<()> {
    let cache = DraftCache::with_namespace(
        open_store(required::<PathBuf>(args, "store")?)?,
        settings.namespace.clone(),
    );
    let page = PageIdentity::new(required::<String>(args, "page")?.as_str());
    cache.remove(&page)?;
    println!("Discarded draft for {page}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        cli().print_help()?;
        return Ok(());
    };
    let settings = load_settings(args)?;

    match name {
        "reconcile" => reconcile(args, settings).await,
        "prune" => prune(args, &settings),
        "show" => show(args, &settings),
        "discard" => discard(args, &settings),
        other => anyhow::bail!("unknown command: {other}"),
    }
}
