//! Shared types and pagination infrastructure for the BoxCast API client.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::Stream;

/// Name of the response header that carries pagination state.
pub const PAGINATION_HEADER: &str = "X-Pagination";

type OneFuturePage<'a, F, T> =
    Pin<Box<dyn Future<Output = Result<(F, (VecDeque<T>, Option<String>))>> + 'a + Send>>;

/// A paginated stream that walks a BoxCast list endpoint page by page.
///
/// Items are yielded one at a time; the next page is only requested once the current one is
/// exhausted. The fetcher is given `None` for the first page and the server's `next` cursor
/// for each page after that.
///
/// The server alone decides when the listing ends, so the stream refuses to follow a cursor it
/// has already requested and gives up after a maximum number of pages.
pub struct PagedStream<'a, T, F> {
    /// Current batch of items from the most recent API response
    current_items: VecDeque<T>,
    /// Future representing the currently pending API request, if any
    pending_request: Option<OneFuturePage<'a, F, T>>,
    /// Whether we've reached the end of all available data
    is_done: bool,
    /// Cursors requested so far
    seen_cursors: HashSet<String>,
    pages_requested: usize,
    max_pages: usize,
}

impl<'a, T, F> PagedStream<'a, T, F> {
    /// Create a new PagedStream whose first page is fetched on first poll.
    pub fn new<Fut>(fetcher: F) -> Self
    where
        F: Fn(Option<String>) -> Fut,
        F: Send + 'a,
        Fut: Future<Output = Result<(VecDeque<T>, Option<String>)>> + Send + 'a,
    {
        let first_page = async move {
            let results = fetcher(None).await?;
            Ok((fetcher, results))
        };
        Self {
            pending_request: Some(Box::pin(first_page)),
            current_items: VecDeque::new(),
            is_done: false,
            seen_cursors: HashSet::new(),
            pages_requested: 1,
            max_pages: usize::MAX,
        }
    }

    /// Fail the stream instead of requesting more than `max_pages` pages.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn fail(&mut self, error: Error) -> Poll<Option<Result<T>>> {
        self.pending_request = None;
        self.is_done = true;
        Poll::Ready(Some(Err(error)))
    }
}

impl<'a, T: Unpin, F> Unpin for PagedStream<'a, T, F> {}

impl<'a, T: Unpin, F, Fut> Stream for PagedStream<'a, T, F>
where
    F: Fn(Option<String>) -> Fut,
    F: Send + 'a,
    Fut: Future<Output = Result<(VecDeque<T>, Option<String>)>> + Send + 'a,
{
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(item) = self.current_items.pop_front() {
                return Poll::Ready(Some(Ok(item)));
            }

            if self.is_done {
                return Poll::Ready(None);
            }

            let Some(pending) = self.pending_request.as_mut() else {
                self.is_done = true;
                return Poll::Ready(None);
            };

            match pending.as_mut().poll(cx) {
                Poll::Ready(Ok((fetcher, (items, next_cursor)))) => {
                    self.current_items.extend(items);

                    let Some(next_cursor) = next_cursor else {
                        self.is_done = true;
                        self.pending_request = None;
                        continue;
                    };

                    // page 0 is always the first one requested
                    let guard = if next_cursor == "0"
                        || !self.seen_cursors.insert(next_cursor.clone())
                    {
                        tracing::warn!(cursor = %next_cursor, "server repeated a pagination cursor");
                        Some(Error::PaginationCursorRepeated {
                            cursor: next_cursor.clone(),
                        })
                    } else if self.pages_requested >= self.max_pages {
                        tracing::warn!(pages = self.max_pages, "giving up on pagination");
                        Some(Error::PaginationLimitExceeded {
                            pages: self.max_pages,
                        })
                    } else {
                        None
                    };

                    self.pending_request = Some(match guard {
                        // the items of this page are still handed out before the error
                        Some(error) => failed_page(error),
                        None => {
                            self.pages_requested += 1;
                            Box::pin(async move {
                                let results = fetcher(Some(next_cursor)).await?;
                                Ok((fetcher, results))
                            })
                        }
                    });
                }
                Poll::Ready(Err(e)) => return self.fail(e),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn failed_page<'a, F: Send + 'a, T>(error: Error) -> OneFuturePage<'a, F, T> {
    Box::pin(async move { Err(error) })
}

/// Contents of the [`PAGINATION_HEADER`] response header.
///
/// Cursors and the total are numbers in practice, but are accepted as strings too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: Option<serde_json::Value>,
    #[serde(default)]
    pub next: Option<serde_json::Value>,
    #[serde(default)]
    pub last: Option<serde_json::Value>,
}

impl Pagination {
    /// The cursor to request next, if the server announced another page.
    pub fn next_cursor(&self) -> Option<String> {
        cursor_string(self.next.as_ref()?)
    }

    /// The cursor of the final page, if the server reported one.
    pub fn last_cursor(&self) -> Option<String> {
        cursor_string(self.last.as_ref()?)
    }

    /// Total number of items across all pages.
    ///
    /// `None` if the header has no total or the total is not a non-negative integer.
    pub fn total(&self) -> Option<u64> {
        match self.total.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn cursor_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Renders a resource as `<Kind (id) Name: name>`.
pub(crate) fn fmt_resource(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    id: &str,
    name: Option<&str>,
) -> fmt::Result {
    match name {
        Some(name) => write!(f, "<{kind} ({id}) Name: {name}>"),
        None => write!(f, "<{kind} ({id})>"),
    }
}
