mod crawler_sequential;
mod enricher_cache;
mod enricher_github;
mod extractor_html;
mod fetcher_http;
mod fetcher_rate_limiter;
mod fetcher_retrier;
mod output_writer;

pub use crawler_sequential::*;
pub use enricher_cache::*;
pub use enricher_github::*;
pub use extractor_html::*;
pub use fetcher_http::*;
pub use fetcher_rate_limiter::*;
pub use fetcher_retrier::*;
pub use output_writer::*;
