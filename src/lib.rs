//! Discover the repositories and packages depending on a GitHub repository by
//! crawling its "network/dependents" listing.

mod infrastructure;
mod interface;
mod model;

pub use infrastructure::*;
pub use interface::*;
pub use model::*;
