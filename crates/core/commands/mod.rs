use bookinfo::LookupService;

use clap::{AppSettings, Subcommand};
use eyre::{eyre, Context};
use log::trace;

use crate::app::describe;

#[derive(Subcommand)]
#[non_exhaustive]
pub enum Commands {
    /// Search the catalog by free-text term
    #[clap(setting(AppSettings::ArgRequiredElseHelp))]
    Search {
        /// The term to search for
        term: String,
    },
    /// Look up books by ISBN-10 or ISBN-13
    #[clap(setting(AppSettings::ArgRequiredElseHelp))]
    Isbn {
        /// The ISBNs to look up
        #[clap(required = true)]
        isbns: Vec<String>,
    },
}

impl Commands {
    pub fn execute(self, lookup: &LookupService) -> eyre::Result<String> {
        match self {
            Commands::Search { term } => {
                trace!("search subcommand called with the value of '{term}'");
                let books = lookup
                    .search(&term)
                    .wrap_err_with(|| eyre!("Search for '{term}' failed"))?;

                if books.is_empty() {
                    Ok(format!("No books found for '{term}'"))
                } else {
                    Ok(books
                        .iter()
                        .map(|book| describe(book))
                        .collect::<Vec<_>>()
                        .join("\n\n"))
                }
            }
            Commands::Isbn { isbns } => {
                trace!("isbn subcommand called with {} ISBN(s)", isbns.len());
                let mut found = Vec::with_capacity(isbns.len());

                // one lookup service for all ISBNs so later lookups can reuse earlier answers
                for isbn in &isbns {
                    let book = lookup
                        .get_by_isbn(isbn)
                        .wrap_err_with(|| eyre!("Lookup of ISBN '{isbn}' failed"))?;

                    found.push(match book {
                        Some(book) => describe(&book),
                        None => format!("No book found with the ISBN of '{isbn}'"),
                    });
                }
                Ok(found.join("\n\n"))
            }
        }
    }
}
