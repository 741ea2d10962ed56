use en_core::Source;

use crate::scrapers::{ListingSelectors, Scraper};

/// 東洋経済オンライン market genre list.
#[derive(Debug, Clone, Default)]
pub struct ToyoKeizaiScraper;

impl ToyoKeizaiScraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://toyokeizai.net";
    const LISTING_URL: &'static str = "https://toyokeizai.net/list/genre/market";
}

impl Scraper for ToyoKeizaiScraper {
    fn source(&self) -> Source {
        Source::ToyoKeizai
    }

    fn listing_url(&self) -> &'static str {
        Self::LISTING_URL
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn selectors(&self) -> ListingSelectors {
        ListingSelectors {
            item: "li.wd217",
            title: Some("span.title"),
            link: Some("span.title > a"),
        }
    }
}
