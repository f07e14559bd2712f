#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::missing_safety_doc,
    clippy::missing_const_for_fn
)]
#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

//! # bookinfo
//!
//! bookinfo looks up book metadata in the Google Books catalog, either by free-text search or by
//! ISBN, and returns it as normalized [`Book`] records.
//!
//! Lookups go through a [`LookupService`], which remembers recent search results and every book
//! it has seen by ISBN in two bounded in-memory caches (see [`cache`]). An ISBN the catalog cannot
//! match exactly is retried as a full-text search filtered on that ISBN.

mod api;
mod book;
pub mod cache;
mod error;
mod lookup;

use std::sync::Arc;

pub use api::Client;
pub use book::Book;
pub use error::{Error, ErrorKind};
pub use lookup::{Builder, LookupService};

/// An ordered, shared list of books as returned by [`LookupService::search`].
pub type BookList = Arc<[Arc<Book>]>;
