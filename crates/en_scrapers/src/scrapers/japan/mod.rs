pub mod nikkei;
pub mod toyokeizai;
pub mod yahoo;

pub use nikkei::NikkeiScraper;
pub use toyokeizai::ToyoKeizaiScraper;
pub use yahoo::YahooScraper;
