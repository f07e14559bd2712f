//! Cached search and ISBN lookups against the catalog.
use std::{num::NonZeroUsize, sync::Arc};

use log::{debug, trace};

use crate::{
    api::{
        google_books::{self, Query},
        Client,
    },
    cache::{
        Cache, CacheStats, CacheStore, LruCache, DEFAULT_RECORD_CAPACITY, DEFAULT_SEARCH_CAPACITY,
    },
    Book, BookList, Error, ErrorKind,
};

const DEFAULT_USER_AGENT: &str = "bookinfo ( gzip )";

/// Looks books up by free-text term or ISBN, remembering what it has seen.
///
/// Every book returned by [`LookupService::search`] is also remembered under each of its ISBNs,
/// so a later [`LookupService::get_by_isbn`] for one of them is answered without a request.
///
/// The service can be shared between threads. Concurrent lookups for the same key may each reach
/// the catalog; the last one to finish is the one that stays cached.
pub struct LookupService<C = reqwest::blocking::Client> {
    client: C,
    caches: CacheStore,
}

impl LookupService {
    /// Starts configuring a [`LookupService`].
    #[must_use]
    pub fn builder() -> Builder {
        Builder::default()
    }
}

impl<C: Client> LookupService<C> {
    /// Searches the catalog for `term`.
    ///
    /// The result keeps the catalog's order and is cached under the lowercased term, while the
    /// request itself uses `term` as given. An empty result is a valid result.
    ///
    /// # Errors
    ///
    /// An [`ErrorKind::InvalidArgument`] error is returned when `term` is empty.
    /// An [`ErrorKind::Transport`] error is returned when the catalog cannot be reached or its
    /// response cannot be decoded.
    /// An [`ErrorKind::InvalidRecord`] error is returned when any item of the response cannot be
    /// turned into a [`Book`]; nothing is cached in that case.
    pub fn search(&self, term: &str) -> Result<BookList, Error> {
        trace!("Search books for term '{term}'");

        if term.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "Search term must not be empty",
            ));
        }

        let key = term.to_lowercase();

        if let Some(books) = self.caches.search(&key) {
            debug!("Search cache hit for '{key}'");
            return Ok(books);
        }

        let books = google_books::fetch_volumes(&self.client, Query::Text(term))?
            .into_iter()
            .map(|item| google_books::normalize(item).map(Arc::new))
            .collect::<Result<BookList, Error>>()?;

        for book in books.iter() {
            for isbn in book.isbns() {
                self.caches.put_record(isbn.to_owned(), Arc::clone(book));
            }
        }
        self.caches.put_search(key, Arc::clone(&books));

        Ok(books)
    }

    /// Looks up the book with the given ISBN-10 or ISBN-13.
    ///
    /// The ISBN is used verbatim, both as cache key and in the request. When the catalog has no
    /// exact match, a free-text search for the ISBN is made and its first book carrying that ISBN
    /// is used instead.
    ///
    /// # Errors
    ///
    /// An [`ErrorKind::InvalidArgument`] error is returned when `isbn` is empty.
    /// An [`ErrorKind::Transport`] error is returned when either request fails.
    /// An [`ErrorKind::InvalidRecord`] error is returned when the catalog item cannot be turned
    /// into a [`Book`].
    pub fn get_by_isbn(&self, isbn: &str) -> Result<Option<Arc<Book>>, Error> {
        trace!("Get book by ISBN '{isbn}'");

        if isbn.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "ISBN must not be empty"));
        }

        if let Some(book) = self.caches.record(isbn) {
            debug!("Record cache hit for ISBN '{isbn}'");
            return Ok(Some(book));
        }

        let items = google_books::fetch_volumes(&self.client, Query::Isbn(isbn))?;

        let book = match items.into_iter().next() {
            Some(item) => Some(google_books::normalize(item).map(Arc::new)?),
            None => {
                debug!("No exact match for ISBN '{isbn}' - falling back to a full-text search");
                self.search(isbn)?
                    .iter()
                    .find(|book| book.has_isbn(isbn))
                    .cloned()
            }
        };

        match &book {
            Some(book) => self.caches.put_record(isbn.to_owned(), Arc::clone(book)),
            None => debug!("No book found for ISBN '{isbn}'"),
        }

        Ok(book)
    }

    /// Usage of the search cache.
    #[must_use]
    pub fn search_stats(&self) -> &CacheStats {
        self.caches.search_stats()
    }

    /// Usage of the record cache.
    #[must_use]
    pub fn record_stats(&self) -> &CacheStats {
        self.caches.record_stats()
    }
}

/// Configuration for a [`LookupService`].
///
/// ```no_run
/// use bookinfo::LookupService;
///
/// let lookup = LookupService::builder()
///     .user_agent("my-shelf/1.0 ( gzip )")
///     .search_cache_capacity(100)
///     .build()?;
///
/// for book in lookup.search("walter moers")?.iter() {
///     println!("{book}");
/// }
/// # Ok::<(), bookinfo::Error>(())
/// ```
pub struct Builder {
    user_agent: String,
    caching_enabled: bool,
    search_cache_capacity: usize,
    record_cache_capacity: usize,
    search_cache: Option<Box<dyn Cache<BookList>>>,
    record_cache: Option<Box<dyn Cache<Arc<Book>>>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            caching_enabled: true,
            search_cache_capacity: DEFAULT_SEARCH_CAPACITY,
            record_cache_capacity: DEFAULT_RECORD_CAPACITY,
            search_cache: None,
            record_cache: None,
        }
    }
}

impl Builder {
    /// The user agent sent with every request. The catalog only compresses responses for user
    /// agents mentioning `gzip`, so it must contain that word.
    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enables or disables both caches, enabled by default.
    #[must_use]
    pub fn caching_enabled(mut self, caching_enabled: bool) -> Self {
        self.caching_enabled = caching_enabled;
        self
    }

    /// Maximum number of search terms remembered, 35 by default.
    #[must_use]
    pub fn search_cache_capacity(mut self, capacity: usize) -> Self {
        self.search_cache_capacity = capacity;
        self
    }

    /// Maximum number of ISBNs remembered, 200 by default.
    #[must_use]
    pub fn record_cache_capacity(mut self, capacity: usize) -> Self {
        self.record_cache_capacity = capacity;
        self
    }

    /// Uses `cache` for search results instead of an [`LruCache`].
    #[must_use]
    pub fn search_cache<T>(mut self, cache: T) -> Self
    where
        T: Cache<BookList> + 'static,
    {
        self.search_cache = Some(Box::new(cache));
        self
    }

    /// Uses `cache` for book records instead of an [`LruCache`].
    #[must_use]
    pub fn record_cache<T>(mut self, cache: T) -> Self
    where
        T: Cache<Arc<Book>> + 'static,
    {
        self.record_cache = Some(Box::new(cache));
        self
    }

    /// Builds a [`LookupService`] backed by a gzip-enabled [`reqwest::blocking::Client`].
    ///
    /// # Errors
    ///
    /// An [`ErrorKind::InvalidArgument`] error is returned when the user agent does not mention
    /// `gzip`, when a capacity is zero, or when caches were supplied while caching is disabled.
    /// An [`ErrorKind::Transport`] error is returned when the HTTP client cannot be created.
    pub fn build(self) -> Result<LookupService, Error> {
        if !self.user_agent.contains("gzip") {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                "User agent must contain 'gzip'",
            ));
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(|e| Error::wrap(ErrorKind::Transport, e))?;

        self.build_with_client(client)
    }

    /// Builds a [`LookupService`] that sends its requests through `client`.
    ///
    /// The configured user agent is not applied to `client`.
    ///
    /// # Errors
    ///
    /// An [`ErrorKind::InvalidArgument`] error is returned when a capacity is zero, or when caches
    /// were supplied while caching is disabled.
    pub fn build_with_client<C: Client>(self, client: C) -> Result<LookupService<C>, Error> {
        Ok(LookupService {
            client,
            caches: self.into_cache_store()?,
        })
    }

    fn into_cache_store(self) -> Result<CacheStore, Error> {
        if !self.caching_enabled {
            if self.search_cache.is_some() || self.record_cache.is_some() {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    "Caches were supplied but caching is disabled",
                ));
            }
            return Ok(CacheStore::disabled());
        }

        let search = match self.search_cache {
            Some(cache) => cache,
            None => Box::new(LruCache::new(capacity(self.search_cache_capacity)?)),
        };
        let record = match self.record_cache {
            Some(cache) => cache,
            None => Box::new(LruCache::new(capacity(self.record_cache_capacity)?)),
        };

        Ok(CacheStore::new(search, record))
    }
}

fn capacity(capacity: usize) -> Result<NonZeroUsize, Error> {
    NonZeroUsize::new(capacity)
        .ok_or_else(|| Error::new(ErrorKind::InvalidArgument, "Cache capacity must not be zero"))
}
