use std::time::Duration;

use clap::Parser;
use indicatif::ProgressBar;

mod app;
mod cli;
mod config;
mod crawler;
mod docs;
mod render;
mod semantic;
#[cfg(test)]
mod tests;

use app::App;
use cli::SiteArgs;
use config::Config;
use render::{HttpRenderer, PageRenderer, DEFAULT_RENDER_TIMEOUT};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = cli::Args::parse();
    let config = Config::load();

    match args.command {
        cli::Command::Index { site_args } => {
            with_renderer(config, site_args, |app, site| async move {
                run_interactive(app, site).await
            })
            .await
        }

        cli::Command::Search { query, site_args } => {
            with_renderer(config, site_args, |app, site| async move {
                run_one_shot(app, site, query).await
            })
            .await
        }

        cli::Command::Config {} => {
            println!("{}", serde_yml::to_string(&config).unwrap());
            Ok(())
        }
    }
}

/// Indexing parameters resolved from config + flags.
struct SiteRun {
    seeds: Vec<String>,
    depth: u32,
    top_k: usize,
}

/// Pick the page renderer, build the app, and hand both to `run`.
async fn with_renderer<F, Fut>(config: Config, args: SiteArgs, run: F) -> anyhow::Result<()>
where
    F: FnOnce(App<Renderer>, SiteRun) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let site = SiteRun {
        seeds: if args.seed.is_empty() {
            config.crawl.seed_urls.clone()
        } else {
            args.seed.clone()
        },
        depth: args.depth.unwrap_or(config.crawl.max_depth),
        top_k: args.top_k.unwrap_or(config.semantic_search.top_k),
    };

    let renderer = Renderer::from_args(&args)?;
    let app = App::new(config, renderer)?;

    run(app, site).await
}

/// Renderer selected at startup. An enum rather than a trait object so the
/// crawler stays generic over a concrete `PageRenderer`.
enum Renderer {
    Http(HttpRenderer),
    #[cfg(feature = "headless")]
    Chrome(render::ChromeRenderer),
}

impl Renderer {
    fn from_args(args: &SiteArgs) -> anyhow::Result<Self> {
        #[cfg(feature = "headless")]
        if args.headless {
            return Ok(Renderer::Chrome(render::ChromeRenderer::new(
                DEFAULT_RENDER_TIMEOUT,
            )));
        }

        #[cfg(not(feature = "headless"))]
        let _ = args;

        Ok(Renderer::Http(HttpRenderer::new(DEFAULT_RENDER_TIMEOUT)?))
    }
}

impl PageRenderer for Renderer {
    async fn render(&self, url: &str) -> Option<String> {
        match self {
            Renderer::Http(r) => r.render(url).await,
            #[cfg(feature = "headless")]
            Renderer::Chrome(r) => r.render(url).await,
        }
    }
}

async fn build_index<R: PageRenderer>(app: &mut App<R>, site: &SiteRun) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Indexing...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let stats = app.initialize(&site.seeds, site.depth).await;

    spinner.finish_with_message(format!(
        "Indexed {} of {} documents",
        stats.indexed, stats.crawled
    ));
}

async fn run_interactive(mut app: App<Renderer>, site: SiteRun) -> anyhow::Result<()> {
    build_index(&mut app, &site).await;

    loop {
        // Esc / ctrl-c / eof ends the session
        let query = match inquire::Text::new("search:").prompt() {
            Ok(query) => query,
            Err(_) => break,
        };

        match app.search(&query, site.top_k).await {
            Some(results) if results.is_empty() => println!("no results"),
            Some(results) => {
                for result in &results {
                    println!(
                        "{:5.1}%  {}  ({})",
                        result.similarity_percent(),
                        result.document.text,
                        result.document.source
                    );
                }
            }
            // superseded by a newer query; nothing to print
            None => {}
        }
    }

    Ok(())
}

async fn run_one_shot(mut app: App<Renderer>, site: SiteRun, query: String) -> anyhow::Result<()> {
    build_index(&mut app, &site).await;

    let results = app.search(&query, site.top_k).await.unwrap_or_default();

    let rows: Vec<serde_json::Value> = results
        .iter()
        .map(|result| {
            serde_json::json!({
                "text": result.document.text,
                "source": result.document.source,
                "similarity_percent": result.similarity_percent(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows).unwrap());

    Ok(())
}
