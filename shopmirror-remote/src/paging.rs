//! `since_id` pagination.
//!
//! Listings are capped at [`PAGE_LIMIT`] items per request. Rather than
//! counting up front on every call, the first page is fetched optimistically:
//! a short first page *is* the whole collection, and only a full first page
//! triggers one count request to learn how far to walk. Each subsequent page
//! anchors past the highest id seen so far, so items created behind the
//! cursor during the walk are never duplicated.

use std::future::Future;

use tracing::debug;

use crate::error::RemoteError;

/// Maximum number of items a listing endpoint returns per request.
pub const PAGE_LIMIT: u64 = 250;

/// Anything addressable by a numeric `since_id` cursor.
pub trait HasId {
    fn id(&self) -> u64;
}

/// Drain a paginated listing.
///
/// `page(since_id)` fetches one page of items with ids greater than
/// `since_id`; `count()` reports the collection size and is invoked at most
/// once. An empty page ends the walk early even if the count says more should
/// exist, which covers items deleted mid-walk.
pub async fn fetch_all<T, PF, PFut, CF, CFut>(
    mut page: PF,
    count: CF,
) -> Result<Vec<T>, RemoteError>
where
    T: HasId,
    PF: FnMut(u64) -> PFut,
    PFut: Future<Output = Result<Vec<T>, RemoteError>>,
    CF: FnOnce() -> CFut,
    CFut: Future<Output = Result<u64, RemoteError>>,
{
    let mut items = page(0).await?;
    let total = if (items.len() as u64) < PAGE_LIMIT {
        items.len() as u64
    } else {
        count().await?
    };
    debug!(first_page = items.len(), total, "walking listing");

    while (items.len() as u64) < total {
        let since = items.iter().map(HasId::id).max().unwrap_or(0);
        let next = page(since).await?;
        if next.is_empty() {
            debug!(since, "listing ended before reported count");
            break;
        }
        items.extend(next);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(u64);

    impl HasId for Item {
        fn id(&self) -> u64 {
            self.0
        }
    }

    fn collection(size: u64) -> Vec<Item> {
        (1..=size).map(Item).collect()
    }

    fn page_of(all: &[Item], since: u64) -> Vec<Item> {
        all.iter()
            .filter(|item| item.0 > since)
            .take(PAGE_LIMIT as usize)
            .map(|item| Item(item.0))
            .collect()
    }

    #[tokio::test]
    async fn short_first_page_skips_the_count_call() {
        let all = collection(3);
        let counted = Cell::new(false);
        let counted_flag = &counted;
        let items = fetch_all(
            |since| {
                let page = page_of(&all, since);
                async move { Ok(page) }
            },
            move || async move {
                counted_flag.set(true);
                Ok(3)
            },
        )
        .await
        .expect("fetch");
        assert_eq!(items, collection(3));
        assert!(!counted.get());
    }

    #[tokio::test]
    async fn full_collection_is_walked_in_pages() {
        let all = collection(PAGE_LIMIT * 2 + 10);
        let pages = Cell::new(0u32);
        let items = fetch_all(
            |since| {
                pages.set(pages.get() + 1);
                let page = page_of(&all, since);
                async move { Ok(page) }
            },
            || async { Ok(PAGE_LIMIT * 2 + 10) },
        )
        .await
        .expect("fetch");
        assert_eq!(items.len() as u64, PAGE_LIMIT * 2 + 10);
        assert_eq!(pages.get(), 3);
        // Strictly increasing ids means no duplicates across page seams.
        assert!(items.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn exactly_one_full_page_counts_then_stops() {
        let all = collection(PAGE_LIMIT);
        let counted = Cell::new(false);
        let counted_flag = &counted;
        let items = fetch_all(
            |since| {
                let page = page_of(&all, since);
                async move { Ok(page) }
            },
            move || async move {
                counted_flag.set(true);
                Ok(PAGE_LIMIT)
            },
        )
        .await
        .expect("fetch");
        assert_eq!(items.len() as u64, PAGE_LIMIT);
        assert!(counted.get());
    }

    #[tokio::test]
    async fn empty_page_breaks_despite_stale_count() {
        let all = collection(PAGE_LIMIT);
        let items = fetch_all(
            |since| {
                let page = page_of(&all, since);
                async move { Ok(page) }
            },
            // Items vanished between the count and the walk.
            || async { Ok(PAGE_LIMIT + 50) },
        )
        .await
        .expect("fetch");
        assert_eq!(items.len() as u64, PAGE_LIMIT);
    }

    #[tokio::test]
    async fn empty_collection_yields_no_items() {
        let items: Vec<Item> = fetch_all(
            |_since| async { Ok(Vec::new()) },
            || async { Ok(0) },
        )
        .await
        .expect("fetch");
        assert!(items.is_empty());
    }
}
