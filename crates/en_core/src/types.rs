use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::Error;

/// News sites the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "日経")]
    Nikkei,
    #[serde(rename = "Yahoo")]
    Yahoo,
    #[serde(rename = "東洋経済")]
    ToyoKeizai,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Nikkei, Source::Yahoo, Source::ToyoKeizai];

    /// Label stored in the `source` column.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Nikkei => "日経",
            Source::Yahoo => "Yahoo",
            Source::ToyoKeizai => "東洋経済",
        }
    }

    /// ASCII name accepted on the command line.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Source::Nikkei => "nikkei",
            Source::Yahoo => "yahoo",
            Source::ToyoKeizai => "toyokeizai",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Source::ALL
            .into_iter()
            .find(|source| source.label() == s || source.cli_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Scraping(format!("Unknown source: {}", s)))
    }
}

/// A (title, absolute url) pair read off a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub title: String,
    pub url: String,
}

/// A headline tagged with the site it came from, not yet timestamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCandidate {
    pub source: Source,
    pub title: String,
    pub url: String,
}

impl ArticleCandidate {
    pub fn new(source: Source, headline: Headline) -> Self {
        Self {
            source,
            title: headline.title,
            url: headline.url,
        }
    }

    pub fn stamp(self, scraped_at: DateTime<FixedOffset>) -> Article {
        Article {
            source: self.source,
            title: self.title,
            url: self.url,
            scraped_at,
        }
    }
}

/// One row of `news_articles`, as served by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub source: Source,
    pub title: String,
    pub url: String,
    pub scraped_at: DateTime<FixedOffset>,
}

/// Drops every candidate whose url already appeared earlier in the list.
pub fn dedup_by_url(candidates: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}
