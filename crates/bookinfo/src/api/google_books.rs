use std::{borrow::Cow, num::NonZeroU32};

use log::{info, trace};
use reqwest::Url;
use serde::Deserialize;

use crate::{Book, Error, ErrorKind};

use super::Client;

const GOOGLE_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const FIELDS: &str = "items(volumeInfo(title,subtitle,authors,publishedDate,industryIdentifiers,pageCount,imageLinks,language))";

const ISBN_13: &str = "ISBN_13";
const ISBN_10: &str = "ISBN_10";

/// The two kinds of catalog request.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Query<'a> {
    /// Full-text search, `q=<term>`.
    Text(&'a str),
    /// Exact ISBN search, `q=isbn:<isbn>`.
    Isbn(&'a str),
}

impl Query<'_> {
    pub(crate) fn url(&self) -> Result<String, Error> {
        let q = match *self {
            Query::Text(term) => Cow::Borrowed(term),
            Query::Isbn(isbn) => Cow::Owned(format!("isbn:{isbn}")),
        };

        Url::parse_with_params(GOOGLE_BOOKS_URL, &[("q", &*q), ("fields", FIELDS)])
            .map(String::from)
            .map_err(|e| Error::wrap(ErrorKind::InvalidArgument, e))
    }
}

/// Requests the volumes matching `query`, in catalog order.
pub(crate) fn fetch_volumes<C: Client>(client: &C, query: Query<'_>) -> Result<Vec<Item>, Error> {
    let url = query.url()?;
    info!("Requesting {query:?} from the Google Books API");

    let Volumes { items } = client.get_json(&url)?;
    let items = items.unwrap_or_default();

    trace!("Request was successful - {} item(s) received", items.len());
    Ok(items)
}

/// Turns a catalog item into a [`Book`].
///
/// # Errors
///
/// An [`ErrorKind::InvalidRecord`] error is returned when the item, its volume info or its title
/// is missing, or when an image link is not a valid URL.
pub(crate) fn normalize(item: Item) -> Result<Book, Error> {
    item.and_then(|item| item.volume_info)
        .ok_or_else(|| Error::new(ErrorKind::InvalidRecord, "Item has no volume info"))
        .and_then(Book::try_from)
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct Volumes {
    items: Option<Vec<Item>>,
}

/// A single entry of the `items` array, which the catalog may leave as `null`.
pub(crate) type Item = Option<RawItem>;

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct RawItem {
    #[serde(rename = "volumeInfo")]
    volume_info: Option<VolumeInfo>,
}

/// Volume information from the Google Books API, every field of which may be missing.
#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    authors: Option<Vec<String>>,
    published_date: Option<String>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    page_count: Option<u32>,
    image_links: Option<ImageLinks>,
    language: Option<String>,
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Deserialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

impl TryFrom<VolumeInfo> for Book {
    type Error = Error;

    fn try_from(volume_info: VolumeInfo) -> Result<Self, Error> {
        // Deconstruct to take ownership of fields (avoids cloning).
        let VolumeInfo {
            title,
            subtitle,
            authors,
            published_date,
            industry_identifiers,
            page_count,
            image_links,
            language,
        } = volume_info;

        let title = title
            .filter(|title| !title.is_empty())
            .ok_or_else(|| Error::new(ErrorKind::InvalidRecord, "Volume has no title"))?;

        let mut isbn13 = None;
        let mut isbn10 = None;

        for IndustryIdentifier { kind, identifier } in industry_identifiers.unwrap_or_default() {
            let slot = match kind.as_str() {
                ISBN_13 => &mut isbn13,
                ISBN_10 => &mut isbn10,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(identifier);
            }
        }

        let (thumbnail_url, small_thumbnail_url) = match image_links {
            Some(ImageLinks {
                thumbnail,
                small_thumbnail,
            }) => (parse_link(thumbnail)?, parse_link(small_thumbnail)?),
            None => (None, None),
        };

        Ok(Self {
            isbn13,
            isbn10,
            title,
            subtitle,
            author: authors.unwrap_or_default().join(","),
            published_date,
            language,
            page_count: page_count.and_then(NonZeroU32::new),
            thumbnail_url,
            small_thumbnail_url,
        })
    }
}

fn parse_link(link: Option<String>) -> Result<Option<Url>, Error> {
    link.as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| Error::wrap(ErrorKind::InvalidRecord, e))
}

#[cfg(test)]
mod tests {
    use super::{normalize, Item, Query, Volumes};
    use crate::{api::MockClient, Book, Error, ErrorKind};

    fn item(volume_info: &str) -> Item {
        serde_json::from_str(&format!(r#"{{ "volumeInfo": {volume_info} }}"#)).unwrap()
    }

    fn book(volume_info: &str) -> Result<Book, Error> {
        normalize(item(volume_info))
    }

    #[test]
    fn isbn_url_is_formatted_correctly() {
        let url = Query::Isbn("0735619670").url().unwrap();

        assert!(url.starts_with("https://www.googleapis.com/books/v1/volumes?q=isbn%3A0735619670&fields="));
        assert!(url.ends_with("fields=items%28volumeInfo%28title%2Csubtitle%2Cauthors%2CpublishedDate%2CindustryIdentifiers%2CpageCount%2CimageLinks%2Clanguage%29%29"));
    }

    #[test]
    fn text_url_encodes_the_term() {
        let url = Query::Text("the stand, das letzte gefecht").url().unwrap();

        assert!(url.starts_with(
            "https://www.googleapis.com/books/v1/volumes?q=the+stand%2C+das+letzte+gefecht&fields="
        ));
    }

    #[test]
    fn book_can_be_derived_from_json() {
        let book = book(
            r#"{
                "title": "Code Complete",
                "subtitle": "A Practical Handbook of Software Construction",
                "authors": ["Steve McConnell"],
                "publishedDate": "2004-06-09",
                "industryIdentifiers": [
                    { "type": "ISBN_10", "identifier": "0735619670" },
                    { "type": "ISBN_13", "identifier": "9780735619678" }
                ],
                "pageCount": 914,
                "imageLinks": {
                    "smallThumbnail": "http://books.google.com/books/content?id=LpVQAAAAMAAJ&zoom=5",
                    "thumbnail": "http://books.google.com/books/content?id=LpVQAAAAMAAJ&zoom=1"
                },
                "language": "en",
                "printType": "BOOK"
            }"#,
        )
        .unwrap();

        assert_eq!(Some("9780735619678"), book.isbn13());
        assert_eq!(Some("0735619670"), book.isbn10());
        assert_eq!("Code Complete", book.title());
        assert_eq!(
            Some("A Practical Handbook of Software Construction"),
            book.subtitle()
        );
        assert_eq!("Steve McConnell", book.author());
        assert_eq!(Some("2004-06-09"), book.published_date());
        assert_eq!(Some(914), book.page_count().map(std::num::NonZeroU32::get));
        assert_eq!(Some("en"), book.language());
        assert_eq!(
            "http://books.google.com/books/content?id=LpVQAAAAMAAJ&zoom=1",
            book.thumbnail_url().unwrap().as_str()
        );
        assert_eq!(
            "http://books.google.com/books/content?id=LpVQAAAAMAAJ&zoom=5",
            book.small_thumbnail_url().unwrap().as_str()
        );
    }

    #[test]
    fn first_identifier_of_a_type_wins() {
        let book = book(
            r#"{
                "title": "Walter Moers",
                "industryIdentifiers": [
                    { "type": "OTHER", "identifier": "UOM:39015058" },
                    { "type": "ISBN_13", "identifier": "9783492045612" },
                    { "type": "ISBN_13", "identifier": "9783492045629" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(Some("9783492045612"), book.isbn13());
        assert_eq!(None, book.isbn10());
    }

    #[test]
    fn zero_page_count_is_absent() {
        let book = book(r#"{ "title": "Rumo", "pageCount": 0 }"#).unwrap();
        assert_eq!(None, book.page_count());
    }

    #[test]
    fn missing_image_links_leave_both_thumbnails_absent() {
        let book = book(r#"{ "title": "Rumo" }"#).unwrap();

        assert_eq!(None, book.thumbnail_url());
        assert_eq!(None, book.small_thumbnail_url());
    }

    #[test]
    fn image_links_are_copied_independently() {
        let book = book(
            r#"{ "title": "Rumo", "imageLinks": { "thumbnail": "http://example.com/rumo.jpg" } }"#,
        )
        .unwrap();

        assert!(book.thumbnail_url().is_some());
        assert_eq!(None, book.small_thumbnail_url());
    }

    #[test]
    fn invalid_image_link_is_an_invalid_record() {
        let err = book(r#"{ "title": "Rumo", "imageLinks": { "thumbnail": "not a url" } }"#)
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidRecord, err.kind());
    }

    #[test]
    fn authors_are_joined_with_commas() {
        let programming_rust =
            book(r#"{ "title": "Programming Rust", "authors": ["Jim Blandy", "Jason Orendorff"] }"#)
                .unwrap();
        assert_eq!("Jim Blandy,Jason Orendorff", programming_rust.author());

        let anonymous = book(r#"{ "title": "Anonymous", "authors": [] }"#).unwrap();
        assert_eq!("", anonymous.author());
    }

    #[test]
    fn missing_or_empty_title_is_an_invalid_record() {
        for volume_info in [r#"{ "subtitle": "Nothing else" }"#, r#"{ "title": "" }"#] {
            let err = book(volume_info).unwrap_err();
            assert_eq!(ErrorKind::InvalidRecord, err.kind(), "{volume_info}");
        }
    }

    #[test]
    fn missing_volume_info_or_item_is_an_invalid_record() {
        let no_volume_info: Item = serde_json::from_str("{}").unwrap();
        assert_eq!(
            ErrorKind::InvalidRecord,
            normalize(no_volume_info).unwrap_err().kind()
        );
        assert_eq!(ErrorKind::InvalidRecord, normalize(None).unwrap_err().kind());
    }

    #[test]
    fn missing_or_null_items_decode_to_no_items() {
        for json in ["{}", r#"{ "items": null }"#, r#"{ "kind": "books#volumes", "totalItems": 0 }"#] {
            let model: Volumes = serde_json::from_str(json).unwrap();
            assert!(model.items.unwrap_or_default().is_empty(), "{json}");
        }
    }

    #[test]
    fn fetch_volumes_requests_the_query_url() {
        let query = Query::Isbn("0735619670");
        let client = MockClient::default().with_json(
            &query,
            r#"{ "items": [ { "volumeInfo": { "title": "Code Complete" } } ] }"#,
        );

        let items = super::fetch_volumes(&client, query).unwrap();

        assert_eq!(1, items.len());
        assert_eq!(vec![query.url().unwrap()], client.requests());
    }

    #[test]
    fn fetch_volumes_propagates_transport_errors() {
        let query = Query::Text("walter moers");
        let client = MockClient::default().with_failure(&query, "Network error");

        let err = super::fetch_volumes(&client, query).unwrap_err();

        assert_eq!(ErrorKind::Transport, err.kind());
        assert_eq!("Transport error: Network error", err.to_string());
    }
}
