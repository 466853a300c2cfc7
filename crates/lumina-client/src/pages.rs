//! Client-side pagination aggregation.
//!
//! The service's envelopes do not always carry totals, so exhaustion is
//! detected from page length alone: keep fetching while each page comes back
//! exactly `page_size` long. A zero-item page is terminal even when a full
//! page was requested, and a hard page ceiling guards against a backend
//! whose pages never shrink.

use std::future::Future;

use lumina_api_models::ImageRecord;

use crate::error::ApiResult;

/// Page size used when the caller does not override it.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched in one aggregation pass.
pub const DEFAULT_MAX_PAGES: u32 = 512;

/// Fetch every page from `fetch_page(0..)`, invoking `on_page` as each page
/// lands so callers can surface partial results progressively.
///
/// # Errors
///
/// Returns the first page fetch error; pages already delivered through
/// `on_page` are the caller's to discard.
pub async fn fetch_all<F, Fut, P>(
    mut fetch_page: F,
    page_size: u32,
    max_pages: u32,
    mut on_page: P,
) -> ApiResult<Vec<ImageRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Vec<ImageRecord>>>,
    P: FnMut(&[ImageRecord]),
{
    let mut all = Vec::new();
    let mut page = 0u32;
    loop {
        let records = fetch_page(page).await?;
        let count = records.len();
        on_page(&records);
        all.extend(records);

        // A short or empty page is the exhaustion signal.
        if count == 0 || count != page_size as usize {
            break;
        }
        page += 1;
        if page >= max_pages {
            tracing::warn!(max_pages, "pagination stopped at the page ceiling before exhaustion");
            break;
        }
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn record(id: i64) -> ImageRecord {
        ImageRecord {
            id,
            filename: format!("img-{id}.jpg"),
            stored_filename: format!("{id}-stored.jpg"),
            original_filename: format!("holiday-{id}.jpg"),
            file_path: format!("/data/{id}-stored.jpg"),
            file_size: 1_024,
            content_type: "image/jpeg".to_string(),
            upload_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .expect("valid date")
                .and_hms_opt(9, 30, 0)
                .expect("valid time"),
            is_favorite: false,
            is_archived: false,
            is_deleted: false,
        }
    }

    fn page_of(start: i64, len: usize) -> Vec<ImageRecord> {
        (0..len).map(|offset| record(start + offset as i64)).collect()
    }

    #[tokio::test]
    async fn aggregates_until_short_page() {
        let requests = Arc::new(AtomicU32::new(0));
        let counter = requests.clone();

        let all = fetch_all(
            move |page| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(match page {
                        0 => page_of(0, 100),
                        1 => page_of(100, 100),
                        2 => page_of(200, 47),
                        _ => panic!("page {page} should never be requested"),
                    })
                }
            },
            100,
            DEFAULT_MAX_PAGES,
            |_| {},
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(all.len(), 247);
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_first_page_is_terminal() {
        let requests = Arc::new(AtomicU32::new(0));
        let counter = requests.clone();

        let all = fetch_all(
            move |_page| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(Vec::new()) }
            },
            100,
            DEFAULT_MAX_PAGES,
            |_| {},
        )
        .await
        .expect("aggregation should succeed");

        assert!(all.is_empty());
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn page_ceiling_stops_a_backend_that_never_shrinks() {
        let all = fetch_all(
            |page| async move { Ok(page_of(i64::from(page) * 10, 10)) },
            10,
            3,
            |_| {},
        )
        .await
        .expect("aggregation should stop at the ceiling");

        assert_eq!(all.len(), 30);
    }

    #[tokio::test]
    async fn on_page_sees_partial_results_in_order() {
        let mut seen = Vec::new();
        let all = fetch_all(
            |page| async move {
                Ok(match page {
                    0 => page_of(0, 2),
                    _ => page_of(2, 1),
                })
            },
            2,
            DEFAULT_MAX_PAGES,
            |records| seen.push(records.len()),
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(seen, vec![2, 1]);
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn first_error_aborts_the_pass() {
        let requests = Arc::new(AtomicU32::new(0));
        let counter = requests.clone();

        let result = fetch_all(
            move |page| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if page == 1 {
                        Err(crate::ApiError::Server { status: 500 })
                    } else {
                        Ok(page_of(0, 2))
                    }
                }
            },
            2,
            DEFAULT_MAX_PAGES,
            |_| {},
        )
        .await;

        assert!(matches!(result, Err(crate::ApiError::Server { status: 500 })));
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }
}
