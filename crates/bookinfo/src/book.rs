//! The canonical book record produced by every lookup.
use std::{fmt, num::NonZeroU32};

use reqwest::Url;

/// A normalized book record.
///
/// A [`Book`] can only be created from a catalog item (see
/// [`LookupService`](crate::LookupService)) and cannot be changed afterwards, so the same value
/// can be shared between the search and record caches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Book {
    pub(crate) isbn13: Option<String>,
    pub(crate) isbn10: Option<String>,
    pub(crate) title: String,
    pub(crate) subtitle: Option<String>,
    pub(crate) author: String,
    pub(crate) published_date: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) page_count: Option<NonZeroU32>,
    pub(crate) thumbnail_url: Option<Url>,
    pub(crate) small_thumbnail_url: Option<Url>,
}

impl Book {
    /// The ISBN-13 of the book, if the catalog listed one.
    #[must_use]
    pub fn isbn13(&self) -> Option<&str> {
        self.isbn13.as_deref()
    }

    /// The ISBN-10 of the book, if the catalog listed one.
    #[must_use]
    pub fn isbn10(&self) -> Option<&str> {
        self.isbn10.as_deref()
    }

    /// All identifiers of the book, ISBN-13 first.
    pub fn isbns(&self) -> impl Iterator<Item = &str> {
        self.isbn13().into_iter().chain(self.isbn10())
    }

    /// Returns `true` when either identifier of the book equals `isbn`.
    #[must_use]
    pub fn has_isbn(&self, isbn: &str) -> bool {
        self.isbns().any(|id| id == isbn)
    }

    /// The title, never empty.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The subtitle, if any.
    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Comma separated authors in catalog order, empty when the catalog listed none.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Publication date as reported by the catalog (`2004`, `2004-06`, `2004-06-09`, ..).
    #[must_use]
    pub fn published_date(&self) -> Option<&str> {
        self.published_date.as_deref()
    }

    /// Language code of the edition, e.g. `en`.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Number of pages. The catalog reports unknown page counts as zero, which is read as absent.
    #[must_use]
    pub const fn page_count(&self) -> Option<NonZeroU32> {
        self.page_count
    }

    /// Link to the cover thumbnail.
    #[must_use]
    pub const fn thumbnail_url(&self) -> Option<&Url> {
        self.thumbnail_url.as_ref()
    }

    /// Link to the small cover thumbnail.
    #[must_use]
    pub const fn small_thumbnail_url(&self) -> Option<&Url> {
        self.small_thumbnail_url.as_ref()
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;

        if let Some(subtitle) = &self.subtitle {
            write!(f, ": {subtitle}")?;
        }

        if !self.author.is_empty() {
            write!(f, " by {}", self.author)?;
        }
        Ok(())
    }
}
