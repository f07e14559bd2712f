use serde::de::DeserializeOwned;

pub(crate) mod google_books;

/// The transport used to reach the catalog.
///
/// The lookup core only ever asks for a JSON document at a URL; timeouts, proxies and
/// compression are the concern of the implementation. [`reqwest::blocking::Client`] is the
/// default implementation.
pub trait Client {
    /// Requests `url` and decodes the response body as JSON.
    ///
    /// # Errors
    ///
    /// Implementations return an [`ErrorKind::Transport`] error when the request fails or when
    /// the body cannot be decoded into `T`.
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned;
}

impl Client for reqwest::blocking::Client {
    fn get_json<T>(&self, url: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        self.get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::wrap(ErrorKind::Transport, e))
            .and_then(|r| r.json().map_err(|e| Error::wrap(ErrorKind::Transport, e)))
    }
}

#[cfg(test)]
pub(crate) use test::MockClient;

use crate::{Error, ErrorKind};

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::{google_books::Query, *};

    /// Serves canned JSON bodies by request URL and remembers every URL it was asked for.
    ///
    /// A URL without a canned body answers with `{}`, which the catalog model reads as an
    /// empty result.
    #[derive(Default)]
    pub(crate) struct MockClient {
        bodies: HashMap<String, String>,
        failures: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl MockClient {
        pub(crate) fn with_json(mut self, query: &Query<'_>, json: &str) -> Self {
            self.bodies.insert(url(query), json.to_owned());
            self
        }

        pub(crate) fn with_failure(mut self, query: &Query<'_>, message: &str) -> Self {
            self.failures.insert(url(query), message.to_owned());
            self
        }

        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().clone()
        }

        pub(crate) fn fetch_count(&self) -> usize {
            self.requests.lock().len()
        }

        pub(crate) fn fetch_count_of(&self, query: &Query<'_>) -> usize {
            let url = url(query);
            self.requests.lock().iter().filter(|r| **r == url).count()
        }
    }

    pub(crate) fn url(query: &Query<'_>) -> String {
        query.url().expect("catalog URLs are always valid")
    }

    impl Client for MockClient {
        fn get_json<T>(&self, url: &str) -> Result<T, Error>
        where
            T: DeserializeOwned,
        {
            self.requests.lock().push(url.to_owned());

            if let Some(message) = self.failures.get(url) {
                return Err(Error::new(ErrorKind::Transport, message.as_str()));
            }

            let json = self.bodies.get(url).map_or("{}", String::as_str);
            serde_json::from_str(json).map_err(|e| Error::wrap(ErrorKind::Transport, e))
        }
    }
}
