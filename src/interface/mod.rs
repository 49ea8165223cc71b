mod crawler;
mod enricher;
mod fetcher;

pub use crawler::*;
pub use enricher::*;
pub use fetcher::*;
