//! Event helpers for integration tests

use std::time::Duration;
use tokio::sync::broadcast;

use draftline::Event;

/// Drain every event already delivered to `rx`
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Collect events until `done` matches one, or the timeout elapses
///
/// The matching event is included. Returns `None` on timeout or when the
/// channel closes.
pub async fn collect_events_until<F>(
    rx: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    done: F,
) -> Option<Vec<Event>>
where
    F: Fn(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        let mut events = Vec::new();
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let finished = done(&event);
                    events.push(event);
                    if finished {
                        return Some(events);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Accumulated bodies reported for `heading`, in emission order
pub fn progress_for(events: &[Event], heading: &str) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::SectionProgress {
                heading: h,
                content,
            } if h == heading => Some(content.clone()),
            _ => None,
        })
        .collect()
}
