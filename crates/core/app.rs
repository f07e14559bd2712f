use bookinfo::{cache::CacheStats, Book, LookupService};
use eyre::{eyre, Context};
use log::{debug, trace};

use crate::GlobalOpts;

pub fn lookup_service(opts: &GlobalOpts) -> eyre::Result<LookupService> {
    let mut builder = LookupService::builder()
        .caching_enabled(!opts.no_cache)
        .search_cache_capacity(opts.search_cache_capacity)
        .record_cache_capacity(opts.record_cache_capacity);

    if let Some(user_agent) = &opts.user_agent {
        trace!("'user-agent' option used with value of '{user_agent}'");
        builder = builder.user_agent(user_agent.as_str());
    }

    builder
        .build()
        .wrap_err_with(|| eyre!("Cannot set up the catalog lookup"))
}

pub fn log_cache_stats(lookup: &LookupService) {
    debug!("{}", stats_line("search", lookup.search_stats()));
    debug!("{}", stats_line("record", lookup.record_stats()));
}

fn stats_line(name: &str, stats: &CacheStats) -> String {
    format!(
        "{name} cache: {} hit(s), {} miss(es), {:.0}% hit ratio, {} insert(s), {} eviction(s)",
        stats.hits(),
        stats.misses(),
        stats.hit_ratio() * 100.0,
        stats.inserts(),
        stats.evictions()
    )
}

/// Multi-line description of a book: the title line followed by the known details.
pub fn describe(book: &Book) -> String {
    let mut out = book.to_string();

    let details = [
        ("ISBN-13", book.isbn13().map(str::to_owned)),
        ("ISBN-10", book.isbn10().map(str::to_owned)),
        ("Published", book.published_date().map(str::to_owned)),
        ("Pages", book.page_count().map(|pages| pages.to_string())),
        ("Language", book.language().map(str::to_owned)),
        ("Thumbnail", book.thumbnail_url().map(ToString::to_string)),
    ];

    for (label, value) in details {
        if let Some(value) = value {
            out.push_str(&format!("\n    {label}: {value}"));
        }
    }
    out
}
