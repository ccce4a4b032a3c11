use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SiteArgs {
    /// Seed URL to crawl from. Repeatable.
    /// Defaults to the configured seed list.
    #[clap(long)]
    pub seed: Vec<String>,

    /// Link hops to follow from each seed
    #[clap(long)]
    pub depth: Option<u32>,

    /// Results returned per query
    #[clap(long)]
    pub top_k: Option<usize>,

    /// Render pages with headless chrome instead of a plain
    /// http fetch (for script-heavy sites)
    #[cfg(feature = "headless")]
    #[clap(long, default_value = "false")]
    pub headless: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl the site, build the search index, then take queries
    /// interactively
    Index {
        #[clap(flatten)]
        site_args: SiteArgs,
    },

    /// Crawl the site, run a single query, print results as JSON
    Search {
        /// Query text. An empty query returns the whole document set.
        query: String,

        #[clap(flatten)]
        site_args: SiteArgs,
    },

    /// Print the effective configuration
    Config {},
}
