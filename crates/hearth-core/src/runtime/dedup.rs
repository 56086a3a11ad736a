// ── Deduplicating observation operator ──
//
// Wraps a feed and suppresses elements that duplicate the *last yielded*
// element. The first element always passes. The operator ends when the
// source ends. Dropping the returned stream drops any in-flight source
// poll or predicate future with it, so a cancelled consumer never waits on
// either.

use async_stream::{stream, try_stream};
use futures_util::future::BoxFuture;
use futures_util::{Stream, StreamExt};

/// Suppress consecutive elements that compare equal with `PartialEq`.
pub fn dedup<S>(source: S) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone + PartialEq,
{
    dedup_by(source, |prior, next| prior == next)
}

/// Suppress elements for which `is_duplicate(last_yielded, next)` holds.
pub fn dedup_by<S, F>(source: S, mut is_duplicate: F) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone,
    F: FnMut(&S::Item, &S::Item) -> bool,
{
    stream! {
        let mut source = std::pin::pin!(source);
        let mut last: Option<S::Item> = None;
        while let Some(next) = source.next().await {
            if let Some(prior) = &last {
                if is_duplicate(prior, &next) {
                    continue;
                }
            }
            last = Some(next.clone());
            yield next;
        }
    }
}

/// Like [`dedup_by`], but the predicate is asynchronous.
///
/// The predicate borrows both elements for the lifetime of its future:
///
/// ```ignore
/// dedup_by_async(feed, |prior, next| Box::pin(async move { prior.id == next.id }))
/// ```
pub fn dedup_by_async<S, F>(source: S, mut is_duplicate: F) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone,
    F: for<'a> FnMut(&'a S::Item, &'a S::Item) -> BoxFuture<'a, bool>,
{
    stream! {
        let mut source = std::pin::pin!(source);
        let mut last: Option<S::Item> = None;
        while let Some(next) = source.next().await {
            if let Some(prior) = &last {
                if is_duplicate(prior, &next).await {
                    continue;
                }
            }
            last = Some(next.clone());
            yield next;
        }
    }
}

/// Fallible form of [`dedup_by_async`]: a predicate error is yielded as the
/// stream's final item and ends the stream.
pub fn try_dedup_by_async<S, F, E>(
    source: S,
    mut is_duplicate: F,
) -> impl Stream<Item = Result<S::Item, E>>
where
    S: Stream,
    S::Item: Clone,
    F: for<'a> FnMut(&'a S::Item, &'a S::Item) -> BoxFuture<'a, Result<bool, E>>,
{
    try_stream! {
        let mut source = std::pin::pin!(source);
        let mut last: Option<S::Item> = None;
        while let Some(next) = source.next().await {
            if let Some(prior) = &last {
                if is_duplicate(prior, &next).await? {
                    continue;
                }
            }
            last = Some(next.clone());
            yield next;
        }
    }
}
