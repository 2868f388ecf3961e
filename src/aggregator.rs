use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::hn_client::ItemSource;
use crate::models::{is_eligible, ItemId, Story};

/// How many ids to fetch for `n` stories: about a quarter of the top items
/// are jobs, text posts or fail to load, so fetch 25% more than asked for.
pub fn hedge_count(n: usize) -> usize {
    (n * 5).div_ceil(4)
}

/// Collects the results of a fixed number of tasks.
///
/// Each task takes a [`Ticket`] and arrives exactly once, with or without a
/// value. The arrival count and the decision to close the channel share one
/// lock, so the channel is closed exactly once, right after the last arrival.
pub struct CompletionBarrier<T> {
    expected: usize,
    state: Mutex<BarrierState<T>>,
}

struct BarrierState<T> {
    arrived: usize,
    sender: Option<mpsc::UnboundedSender<T>>,
}

impl<T> CompletionBarrier<T> {
    pub fn new(expected: usize) -> (Arc<Self>, mpsc::UnboundedReceiver<T>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        // Nothing will ever arrive, so the receiver must see a closed channel right away
        let sender = (expected > 0).then_some(sender);

        let barrier = Self {
            expected,
            state: Mutex::new(BarrierState { arrived: 0, sender }),
        };
        (Arc::new(barrier), receiver)
    }

    pub fn ticket(self: &Arc<Self>) -> Ticket<T> {
        Ticket {
            barrier: Some(Arc::clone(self)),
        }
    }

    fn arrive(&self, value: Option<T>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let (Some(value), Some(sender)) = (value, state.sender.as_ref()) {
            // The collector may have given up already; the value is simply lost then
            let _ = sender.send(value);
        }

        state.arrived += 1;
        if state.arrived == self.expected {
            state.sender = None;
        }
    }
}

/// One task's slot at a [`CompletionBarrier`]. Dropping it without calling
/// [`Ticket::complete`] counts as arriving empty-handed.
pub struct Ticket<T> {
    barrier: Option<Arc<CompletionBarrier<T>>>,
}

impl<T> Ticket<T> {
    pub fn complete(mut self, value: Option<T>) {
        if let Some(barrier) = self.barrier.take() {
            barrier.arrive(value);
        }
    }
}

impl<T> Drop for Ticket<T> {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.arrive(None);
        }
    }
}

/// Builds the first `n` link stories of the current ranking, in rank order.
///
/// Only the ranking call can fail the build. Items that fail to load, time
/// out or are not link stories are skipped, so the result is shorter than `n`
/// when the hedged prefix doesn't hold enough eligible items.
pub async fn build_top(
    source: Arc<dyn ItemSource>,
    n: usize,
    fetch_timeout: Duration,
) -> Result<Vec<Story>, SourceError> {
    let started = Instant::now();
    let ids = source.list_top_ids().await?;

    let hedged: Vec<ItemId> = ids.into_iter().take(hedge_count(n)).collect();
    let (barrier, mut completed) = CompletionBarrier::new(hedged.len());

    for &id in &hedged {
        let ticket = barrier.ticket();
        let source = Arc::clone(&source);
        tokio::spawn(async move {
            let story = fetch_story(source.as_ref(), id, fetch_timeout).await;
            ticket.complete(story.map(|story| (id, story)));
        });
    }
    drop(barrier);

    // Completion order is arbitrary, so collect by requested id first
    let mut found: HashMap<ItemId, Story> = HashMap::with_capacity(hedged.len());
    while let Some((id, story)) = completed.recv().await {
        found.insert(id, story);
    }
    let eligible = found.len();

    // Rank order comes from the id list; removing on use also drops repeated ids
    let stories: Vec<Story> = hedged
        .iter()
        .filter_map(|id| found.remove(id))
        .take(n)
        .collect();

    debug!(
        requested = n,
        hedged = hedged.len(),
        eligible,
        returned = stories.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "built top stories"
    );
    if stories.len() < n {
        info!(
            requested = n,
            returned = stories.len(),
            "fewer eligible stories than requested within the hedged ids"
        );
    }

    Ok(stories)
}

async fn fetch_story(source: &dyn ItemSource, id: ItemId, fetch_timeout: Duration) -> Option<Story> {
    let fetched = tokio::time::timeout(fetch_timeout, source.fetch_item(id))
        .await
        .unwrap_or(Err(SourceError::Timeout(id)));

    match fetched {
        Ok(item) if is_eligible(&item) => Some(Story::from(item)),
        Ok(_) => None,
        Err(err) => {
            debug!(id, error = %err, "skipping item");
            None
        }
    }
}
