use en_core::Source;

use crate::scrapers::{ListingSelectors, Scraper};

/// 日経ビジネス ranking page.
#[derive(Debug, Clone, Default)]
pub struct NikkeiScraper;

impl NikkeiScraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://business.nikkei.com";
    const LISTING_URL: &'static str = "https://business.nikkei.com/ranking/?i_cid=nbpnb_ranking";
}

impl Scraper for NikkeiScraper {
    fn source(&self) -> Source {
        Source::Nikkei
    }

    fn listing_url(&self) -> &'static str {
        Self::LISTING_URL
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn selectors(&self) -> ListingSelectors {
        ListingSelectors {
            item: "section.p-articleList_item",
            title: Some("h3.p-articleList_item_title"),
            link: Some("a.p-articleList_item_link"),
        }
    }
}
