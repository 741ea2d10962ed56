use std::time::Duration;

use async_trait::async_trait;
use en_core::{Headline, Result, Source};

use crate::fetcher::PageSession;

pub mod japan;
use japan::{NikkeiScraper, ToyoKeizaiScraper, YahooScraper};

/// Listing pages are read only this far down.
pub const MAX_ITEMS: usize = 10;

/// CSS selectors describing one site's headline list.
#[derive(Debug, Clone, Copy)]
pub struct ListingSelectors {
    /// Matches one element per article
    pub item: &'static str,
    /// Element holding the headline text, relative to the item; `None` means the item itself
    pub title: Option<&'static str>,
    /// Element carrying the `href`, relative to the item; `None` means the item itself
    pub link: Option<&'static str>,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    fn source(&self) -> Source;

    /// Page the headlines are read from
    fn listing_url(&self) -> &'static str;

    /// Origin used to resolve site-relative links
    fn base_url(&self) -> &'static str;

    fn selectors(&self) -> ListingSelectors;

    /// Pulls headlines out of an already loaded listing page.
    fn extract(&self, html: &str) -> Result<Vec<Headline>> {
        utils::extract_listing(html, &self.selectors(), self.base_url(), MAX_ITEMS)
    }

    /// Loads the listing page in `session` and extracts its headlines.
    async fn fetch_headlines(
        &self,
        session: &mut dyn PageSession,
        timeout: Duration,
    ) -> Result<Vec<Headline>> {
        let html = session.load(self.listing_url(), timeout).await?;
        self.extract(&html)
    }

    /// Returns a list of CLI shorthand names for this scraper
    fn cli_names(&self) -> Vec<&str> {
        vec![self.source().cli_name()]
    }
}

pub type ScraperFactory = Box<dyn Fn() -> Box<dyn Scraper> + Send + Sync>;

pub fn get_scraper_factories() -> Vec<ScraperFactory> {
    vec![
        Box::new(|| Box::new(NikkeiScraper::new())),
        Box::new(|| Box::new(YahooScraper::new())),
        Box::new(|| Box::new(ToyoKeizaiScraper::new())),
    ]
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use en_core::{Error, Headline, Result};
    use scraper::{ElementRef, Html, Selector};
    use tracing::debug;
    use url::Url;

    use super::ListingSelectors;

    pub fn parse_selector(selector: &str) -> Result<Selector> {
        Selector::parse(selector)
            .map_err(|e| Error::Scraping(format!("Invalid selector {}: {:?}", selector, e)))
    }

    /// Makes `href` absolute, keeping only http(s) links.
    ///
    /// Absolute links are returned exactly as the page wrote them and
    /// root-relative paths are appended to the origin verbatim, so the stored
    /// url matches what the site serves.
    pub fn absolutize(base: &Url, href: &str) -> Result<String> {
        let href = href.trim();
        if href.is_empty() {
            return Err(Error::InvalidUrl("empty href".to_string()));
        }

        let resolved = match Url::parse(href) {
            Ok(url) => {
                check_scheme(&url, href)?;
                return Ok(href.to_string());
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => base.join(href)?,
            Err(e) => return Err(e.into()),
        };
        check_scheme(&resolved, href)?;

        if href.starts_with('/') && !href.starts_with("//") {
            Ok(format!("{}{}", base.origin().ascii_serialization(), href))
        } else {
            Ok(resolved.to_string())
        }
    }

    fn check_scheme(url: &Url, href: &str) -> Result<()> {
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::InvalidUrl(format!("unsupported scheme {} in {}", other, href))),
        }
    }

    fn pick<'a>(item: ElementRef<'a>, selector: Option<&Selector>, what: &str) -> Result<ElementRef<'a>> {
        match selector {
            Some(selector) => item
                .select(selector)
                .next()
                .ok_or_else(|| Error::Scraping(format!("no {} element", what))),
            None => Ok(item),
        }
    }

    fn extract_item(
        item: ElementRef<'_>,
        title: Option<&Selector>,
        link: Option<&Selector>,
        base: &Url,
    ) -> Result<Headline> {
        let title = pick(item, title, "title")?
            .text()
            .collect::<String>()
            .trim()
            .to_string();
        if title.is_empty() {
            return Err(Error::Scraping("empty title".to_string()));
        }

        let href = pick(item, link, "link")?
            .value()
            .attr("href")
            .ok_or_else(|| Error::Scraping("link has no href".to_string()))?;

        Ok(Headline {
            title,
            url: absolutize(base, href)?,
        })
    }

    /// Reads at most `max_items` item elements; items that cannot be read are skipped.
    pub fn extract_listing(
        html: &str,
        selectors: &ListingSelectors,
        base_url: &str,
        max_items: usize,
    ) -> Result<Vec<Headline>> {
        let base = Url::parse(base_url)?;
        let item = parse_selector(selectors.item)?;
        let title = selectors.title.map(parse_selector).transpose()?;
        let link = selectors.link.map(parse_selector).transpose()?;

        let document = Html::parse_document(html);
        let mut headlines = Vec::new();
        for (index, element) in document.select(&item).take(max_items).enumerate() {
            match extract_item(element, title.as_ref(), link.as_ref(), &base) {
                Ok(headline) => headlines.push(headline),
                Err(e) => debug!(index, selector = selectors.item, "Skipping item: {}", e),
            }
        }

        Ok(headlines)
    }
}

#[cfg(test)]
mod tests {
    use super::utils;
    use super::*;
    use url::Url;

    const SELECTORS: ListingSelectors = ListingSelectors {
        item: "li.story",
        title: Some("span.title"),
        link: Some("a"),
    };

    #[test]
    fn test_absolutize() {
        let base = Url::parse("https://news.example.jp").unwrap();
        assert_eq!(
            utils::absolutize(&base, "/articles/1").unwrap(),
            "https://news.example.jp/articles/1"
        );
        assert_eq!(
            utils::absolutize(&base, "https://other.example/x").unwrap(),
            "https://other.example/x"
        );
        assert_eq!(
            utils::absolutize(&base, "//cdn.example/y").unwrap(),
            "https://cdn.example/y"
        );
        assert!(utils::absolutize(&base, "javascript:void(0)").is_err());
        assert!(utils::absolutize(&base, "  ").is_err());
    }

    #[test]
    fn test_absolutize_keeps_links_as_written() {
        let base = Url::parse("https://toyokeizai.net").unwrap();
        assert_eq!(utils::absolutize(&base, "https://c").unwrap(), "https://c");
        assert_eq!(
            utils::absolutize(&base, " https://Toyokeizai.net/記事?q=日経 ").unwrap(),
            "https://Toyokeizai.net/記事?q=日経"
        );
        assert_eq!(
            utils::absolutize(&base, "/記事?q=日経").unwrap(),
            "https://toyokeizai.net/記事?q=日経"
        );
        assert_eq!(
            utils::absolutize(&base, "/articles/-/1").unwrap(),
            "https://toyokeizai.net/articles/-/1"
        );
    }

    #[test]
    fn test_extract_listing_skips_broken_items() {
        let html = r#"
            <ul>
                <li class="story"><span class="title"> First </span><a href="/a/1">more</a></li>
                <li class="story"><span class="title">No link</span></li>
                <li class="story"><span class="title">   </span><a href="/a/3">more</a></li>
                <li class="story"><a href="/a/4">no title element</a></li>
                <li class="story"><span class="title">Fifth</span><a href="https://elsewhere.example/5">more</a></li>
            </ul>
        "#;
        let headlines = utils::extract_listing(html, &SELECTORS, "https://news.example.jp", 10).unwrap();
        assert_eq!(
            headlines,
            vec![
                Headline {
                    title: "First".to_string(),
                    url: "https://news.example.jp/a/1".to_string()
                },
                Headline {
                    title: "Fifth".to_string(),
                    url: "https://elsewhere.example/5".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_extract_listing_examines_first_items_only() {
        let items: String = (0..15)
            .map(|i| format!(r#"<li class="story"><span class="title">T{i}</span><a href="/a/{i}">x</a></li>"#))
            .collect();
        let html = format!("<ul>{}</ul>", items);
        let headlines = utils::extract_listing(&html, &SELECTORS, "https://news.example.jp", MAX_ITEMS).unwrap();
        assert_eq!(headlines.len(), MAX_ITEMS);
        assert_eq!(headlines[9].title, "T9");
    }

    #[test]
    fn test_extract_listing_without_matches() {
        let headlines =
            utils::extract_listing("<html><body></body></html>", &SELECTORS, "https://news.example.jp", 10)
                .unwrap();
        assert!(headlines.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let broken = ListingSelectors {
            item: "li[",
            title: None,
            link: None,
        };
        assert!(utils::extract_listing("<li></li>", &broken, "https://news.example.jp", 10).is_err());
    }

    #[test]
    fn test_factories_cover_every_source() {
        let sources: Vec<_> = get_scraper_factories().iter().map(|f| f().source()).collect();
        assert_eq!(sources, Source::ALL.to_vec());
    }
}
