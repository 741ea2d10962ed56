pub mod clock;
pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use clock::{Clock, FixedClock, JstClock};
pub use config::{DatabaseConfig, ServerConfig};
pub use error::Error;
pub use storage::ArticleStorage;
pub use types::{dedup_by_url, Article, ArticleCandidate, Headline, Source};

pub type Result<T> = std::result::Result<T, Error>;
