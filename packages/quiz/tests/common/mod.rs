#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use danci_quiz::VocabularyEntry;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts WARN events seen while installed.
#[derive(Clone, Default)]
pub struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `f` with a warning counter installed on this thread.
pub fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let output = tracing::subscriber::with_default(subscriber, f);
    (output, counter.count())
}

pub fn numbered_vocab(count: usize) -> Vec<VocabularyEntry> {
    (0..count)
        .map(|i| VocabularyEntry::new(format!("word{i}"), format!("mean{i}")))
        .collect()
}

pub fn fixed_clock() -> i64 {
    1_700_000_000_000
}
