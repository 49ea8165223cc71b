mod config;
mod entities;
mod error;
mod page;
mod request;
mod response;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use page::*;
pub use request::*;
pub use response::*;
