use std::collections::HashSet;
use std::future::Future;

use tracing::debug;

use crate::defaults::Defaults;
use crate::error::{Error, Result};

/// One page of a cursor-paginated read. No cursor means the sequence is done.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// The hub sends an empty token on the last page; it is folded into `None`.
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }
}

/// Walks a paginated read to the end, with a hard page limit.
#[derive(Debug, Clone, Copy)]
pub struct PaginationWalker {
    max_pages: usize,
}

impl Default for PaginationWalker {
    fn default() -> Self {
        Self { max_pages: Defaults::MAX_PAGES }
    }
}

impl PaginationWalker {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Calls `fetch_page` with no cursor, then with each returned cursor,
    /// concatenating items in order until a page has no cursor.
    ///
    /// Fails with [`Error::PaginationCycle`] if a cursor comes back twice and
    /// [`Error::PaginationLimit`] after `max_pages` pages.
    pub async fn collect_all<T, F, Fut>(&self, mut fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();

        for page_no in 1..=self.max_pages {
            let page = fetch_page(cursor.take()).await?;
            items.extend(page.items);

            match page.next_cursor {
                None => {
                    debug!(pages = page_no, items = items.len(), "pagination complete");
                    return Ok(items);
                }
                Some(next) => {
                    if !seen.insert(next.clone()) {
                        return Err(Error::PaginationCycle { cursor: next });
                    }
                    cursor = Some(next);
                }
            }
        }

        Err(Error::PaginationLimit { pages: self.max_pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_three_pages_in_order() {
        let calls = Mutex::new(Vec::new());
        let walker = PaginationWalker::default();

        let items = walker
            .collect_all(|cursor: Option<String>| {
                calls.lock().unwrap().push(cursor.clone());
                async move {
                    Ok(match cursor.as_deref() {
                        None => Page::new(vec![1, 2], Some("a".into())),
                        Some("a") => Page::new(vec![3], Some("b".into())),
                        Some("b") => Page::new(vec![4, 5], None),
                        Some(other) => panic!("unexpected cursor {other}"),
                    })
                }
            })
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_page() {
        let items = PaginationWalker::default()
            .collect_all(|_| async { Ok(Page::new(vec!["x"], Some(String::new()))) })
            .await
            .unwrap();
        assert_eq!(items, vec!["x"]);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let mut n = 0u32;
        let err = PaginationWalker::new(4)
            .collect_all(|_| {
                n += 1;
                let next = format!("c{n}");
                async move { Ok(Page::new(vec![0u8], Some(next))) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PaginationLimit { pages: 4 }));
        assert_eq!(n, 4);
    }

    #[tokio::test]
    async fn test_repeating_cursor() {
        let err = PaginationWalker::default()
            .collect_all(|_| async { Ok(Page::new(Vec::<u8>::new(), Some("same".into()))) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PaginationCycle { ref cursor } if cursor == "same"));
    }

    #[tokio::test]
    async fn test_error_propagates() {
        let err = PaginationWalker::default()
            .collect_all(|_| async { Err::<Page<u8>, _>(Error::Transport("down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
