//! `shopmirror` — mirror a store's theme and content to a local file tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use shopmirror_remote::{RestClient, ShopClient};
use shopmirror_sync::pipeline::{PullReport, PushReport};
use shopmirror_sync::{pipeline, theme, SyncOptions};

#[derive(Parser)]
#[command(
    name = "shopmirror",
    version,
    about = "Two-way sync between a store and a local file tree"
)]
struct Cli {
    /// Store domain, e.g. example.myshopify.com.
    #[arg(long, env = "SHOPIFY_SHOP")]
    shop: String,

    /// Admin API access token.
    #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Local tree to sync against.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose logging.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the store's themes.
    List,
    /// Make the local tree mirror the remote store.
    Pull(SyncArgs),
    /// Make the remote store mirror the local tree.
    Push(SyncArgs),
    /// Create a theme if it does not exist yet.
    Init {
        /// Theme name.
        #[arg(long)]
        theme: String,
        /// Optional zip URL to seed the theme from.
        #[arg(long)]
        src: Option<String>,
    },
    /// Make a theme the published one.
    Publish {
        /// Theme name.
        #[arg(long)]
        theme: String,
    },
}

#[derive(Args)]
struct SyncArgs {
    /// Theme name; defaults to the published theme.
    #[arg(long)]
    theme: Option<String>,

    /// Transfer everything, even content that looks unchanged.
    #[arg(long)]
    force: bool,

    /// Report what would change without changing anything.
    #[arg(long)]
    dry_run: bool,

    /// Skip theme assets.
    #[arg(long)]
    no_assets: bool,

    /// Skip URL redirects.
    #[arg(long)]
    no_redirects: bool,

    /// Skip script tags.
    #[arg(long)]
    no_scripttags: bool,

    /// Skip pages.
    #[arg(long)]
    no_pages: bool,

    /// Skip blog articles.
    #[arg(long)]
    no_blogs: bool,
}

impl SyncArgs {
    fn to_options(&self) -> SyncOptions {
        SyncOptions {
            theme: self.theme.clone(),
            force: self.force,
            dry_run: self.dry_run,
            assets: !self.no_assets,
            redirects: !self.no_redirects,
            script_tags: !self.no_scripttags,
            pages: !self.no_pages,
            blogs: !self.no_blogs,
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_pull(report: &PullReport) {
    let kinds = [
        ("assets", &report.assets),
        ("redirects", &report.redirects),
        ("script tags", &report.scripts),
        ("pages", &report.pages),
        ("articles", &report.articles),
    ];
    for (kind, outcome) in kinds {
        if outcome.changed() == 0 && outcome.skipped.is_empty() {
            continue;
        }
        println!(
            "{kind}: {} written, {} skipped, {} deleted",
            outcome.written.len(),
            outcome.skipped.len(),
            outcome.deleted.len()
        );
    }
    if report.changed() == 0 {
        println!("everything up to date");
    }
}

fn print_push(report: &PushReport) {
    let kinds = [
        ("assets", &report.assets),
        ("redirects", &report.redirects),
        ("script tags", &report.scripts),
        ("pages", &report.pages),
        ("articles", &report.articles),
    ];
    for (kind, outcome) in kinds {
        if outcome.changed() == 0 {
            continue;
        }
        println!(
            "{kind}: {} created, {} updated, {} deleted",
            outcome.created.len(),
            outcome.updated.len(),
            outcome.deleted.len()
        );
    }
    if report.changed() == 0 {
        println!("nothing to push");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let client: Arc<dyn ShopClient> = Arc::new(RestClient::new(&cli.shop, &cli.token));

    match &cli.command {
        Command::List => {
            let themes = theme::list(client.as_ref())
                .await
                .context("listing themes")?;
            for theme in themes {
                let marker = if theme.is_published() { " (published)" } else { "" };
                println!("{} [{}]{marker}", theme.name, theme.id);
            }
        }
        Command::Pull(args) => {
            let report = pipeline::pull(client, &cli.output_dir, &args.to_options())
                .await
                .context("pull failed")?;
            print_pull(&report);
        }
        Command::Push(args) => {
            let report = pipeline::push(client, &cli.output_dir, &args.to_options())
                .await
                .context("push failed")?;
            print_push(&report);
        }
        Command::Init { theme: name, src } => {
            let theme = theme::init(client.as_ref(), name, src.as_deref())
                .await
                .context("theme init failed")?;
            println!("{} [{}] role={}", theme.name, theme.id, theme.role);
        }
        Command::Publish { theme: name } => {
            let theme = theme::publish(client.as_ref(), name)
                .await
                .context("publish failed")?;
            println!("{} [{}] is now published", theme.name, theme.id);
        }
    }
    Ok(())
}
