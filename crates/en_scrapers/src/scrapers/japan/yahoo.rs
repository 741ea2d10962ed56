use en_core::Source;

use crate::scrapers::{ListingSelectors, Scraper};

/// Yahoo!ニュース business category. Each headline is a bare anchor.
#[derive(Debug, Clone, Default)]
pub struct YahooScraper;

impl YahooScraper {
    pub fn new() -> Self {
        Self
    }

    const BASE_URL: &'static str = "https://news.yahoo.co.jp";
    const LISTING_URL: &'static str = "https://news.yahoo.co.jp/categories/business";
}

impl Scraper for YahooScraper {
    fn source(&self) -> Source {
        Source::Yahoo
    }

    fn listing_url(&self) -> &'static str {
        Self::LISTING_URL
    }

    fn base_url(&self) -> &'static str {
        Self::BASE_URL
    }

    fn selectors(&self) -> ListingSelectors {
        ListingSelectors {
            item: "a.sc-1nhdoj2-1",
            title: None,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_anchors() {
        let html = r#"
            <ul>
              <li><a class="sc-1nhdoj2-1" href="https://news.yahoo.co.jp/articles/abc">円相場、一時150円台</a></li>
              <li><a class="sc-1nhdoj2-1" href="/pickup/6500001">日経平均が反落</a></li>
              <li><a class="sc-1nhdoj2-1">hrefなし</a></li>
              <li><a class="other" href="/pickup/6500002">別枠</a></li>
            </ul>
        "#;
        let headlines = YahooScraper::new().extract(html).unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].url, "https://news.yahoo.co.jp/articles/abc");
        assert_eq!(headlines[1].title, "日経平均が反落");
        assert_eq!(headlines[1].url, "https://news.yahoo.co.jp/pickup/6500001");
    }
}
