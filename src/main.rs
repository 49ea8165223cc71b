use std::{io, sync::Arc};

use anyhow::anyhow;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use github_dependents::{
    CrawlerConfig, DependentType, DependentsCrawler, FetcherRateLimiter, FetcherRetrier,
    GITHUB_API_ENDPOINT, GITHUB_BASE_URL, GitHubRepositoryEnricher, HttpPageFetcher, OutputFormat,
    OutputWriter, RepositoryEnricher, RepositoryEnricherCache, RequestThrottle, SequentialCrawler,
    StdResult, Target,
};

/// Command line arguments for the GitHub dependents crawler
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Repository whose dependents are listed, as `owner/name` or a GitHub URL
    target: String,

    /// Kind of dependents to list (REPOSITORY or PACKAGE)
    #[arg(short = 't', long = "type", default_value = "REPOSITORY")]
    dependent_type: DependentType,

    /// Package of the target to list the dependents of
    #[arg(short, long)]
    pkg: Option<String>,

    /// Stop after this number of dependents (0 for no limit)
    #[arg(short, long, default_value_t = 0)]
    limit: u32,

    /// Print the packages and dependents counts of the target instead of the dependents
    #[arg(short, long)]
    info: bool,

    /// Print one JSON object per dependent
    #[arg(short, long)]
    json: bool,

    /// Add the GitHub API repository metadata to each JSON dependent
    #[arg(short, long, requires = "json")]
    rich: bool,

    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,

    /// GitHub API token, needed by the rich output
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Base URL of the site hosting the dependents listing
    #[arg(long, default_value = GITHUB_BASE_URL)]
    base_url: String,
}

#[tokio::main]
async fn main() -> StdResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let target = Target::resolve(&args.target, args.dependent_type, args.pkg.as_deref())?;
    let config = CrawlerConfig::with_base_url(&args.base_url);
    debug!("Crawler configuration: {config:?}");

    let throttle = Arc::new(RequestThrottle::new(config.min_request_interval));
    let crawler = build_sequential_crawler(&config, throttle)?;

    if args.info {
        let info = crawler.info(&target).await?;
        OutputWriter::write_info(&mut io::stdout().lock(), &info, args.pretty)?;

        return Ok(());
    }

    info!("Starting crawling of dependents of {target}");
    let writer = OutputWriter::new(output_format(&args), build_enricher(&args)?);
    let report = writer
        .write_crawl(crawler.as_ref(), &target, args.limit, io::stdout())
        .await?;
    info!("Crawling completed: {report}");

    Ok(())
}

fn output_format(args: &Args) -> OutputFormat {
    if args.json {
        OutputFormat::Json {
            pretty: args.pretty,
        }
    } else {
        OutputFormat::Plain
    }
}

fn build_enricher(args: &Args) -> StdResult<Option<Arc<dyn RepositoryEnricher>>> {
    if !args.rich {
        return Ok(None);
    }
    let token = args
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("Rich output needs a GitHub API token (--token or GH_TOKEN)"))?;
    let enricher = GitHubRepositoryEnricher::try_new(GITHUB_API_ENDPOINT, token)?;

    Ok(Some(Arc::new(RepositoryEnricherCache::new(Arc::new(
        enricher,
    )))))
}

fn build_sequential_crawler(
    config: &CrawlerConfig,
    throttle: Arc<RequestThrottle>,
) -> StdResult<Arc<dyn DependentsCrawler>> {
    let fetcher = Arc::new(FetcherRetrier::new(
        Arc::new(FetcherRateLimiter::new(
            Arc::new(HttpPageFetcher::try_new(config)?),
            throttle,
        )),
        config.max_attempts,
        config.retry_base_delay,
    ));

    Ok(Arc::new(SequentialCrawler::new(fetcher, config.base_url()?)))
}
