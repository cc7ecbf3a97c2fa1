use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use tokio::sync::{Semaphore, mpsc};

use sitepipe::exec::{OutputSet, Transform, TransformFuture, TransformRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Started,
    Finished,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub mark: Mark,
    pub at: Instant,
}

/// Shared record of what fake transforms did, in order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, mark: Mark) {
        self.entries.lock().unwrap().push(Entry {
            name: name.to_string(),
            mark,
            at: Instant::now(),
        });
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    /// Names carrying `mark`, in the order they were recorded.
    pub fn names_with(&self, mark: Mark) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.mark == mark)
            .map(|e| e.name)
            .collect()
    }

    pub fn count(&self, name: &str, mark: Mark) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.name == name && e.mark == mark)
            .count()
    }

    pub fn at(&self, name: &str, mark: Mark) -> Option<Instant> {
        self.entries()
            .into_iter()
            .find(|e| e.name == name && e.mark == mark)
            .map(|e| e.at)
    }
}

/// Records start/finish into a [`Journal`], optionally sleeping or failing.
#[derive(Debug, Clone)]
pub struct RecordingTransform {
    name: String,
    journal: Journal,
    delay: Duration,
    fail: bool,
}

impl RecordingTransform {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn shared(self) -> Arc<dyn Transform> {
        Arc::new(self)
    }
}

impl Transform for RecordingTransform {
    fn run<'a>(&'a self, _request: &'a TransformRequest) -> TransformFuture<'a> {
        Box::pin(async move {
            self.journal.record(&self.name, Mark::Started);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                self.journal.record(&self.name, Mark::Failed);
                bail!("{} failed on purpose", self.name);
            }
            self.journal.record(&self.name, Mark::Finished);
            Ok(OutputSet::empty())
        })
    }
}

/// Transform that blocks every invocation until the test releases it.
#[derive(Debug, Clone)]
pub struct GatedTransform {
    gate: Arc<Semaphore>,
    entered: mpsc::UnboundedSender<usize>,
    calls: Arc<AtomicUsize>,
}

/// Test-side handle of a [`GatedTransform`].
#[derive(Debug)]
pub struct GateControl {
    gate: Arc<Semaphore>,
    entered: mpsc::UnboundedReceiver<usize>,
    calls: Arc<AtomicUsize>,
}

impl GatedTransform {
    pub fn new() -> (Self, GateControl) {
        let gate = Arc::new(Semaphore::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                gate: Arc::clone(&gate),
                entered: tx,
                calls: Arc::clone(&calls),
            },
            GateControl {
                gate,
                entered: rx,
                calls,
            },
        )
    }
}

impl Transform for GatedTransform {
    fn run<'a>(&'a self, _request: &'a TransformRequest) -> TransformFuture<'a> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.entered.send(call);
            self.gate
                .acquire()
                .await
                .context("gate closed")?
                .forget();
            Ok(OutputSet::empty())
        })
    }
}

impl GateControl {
    /// Wait until an invocation is blocked at the gate; returns its call number.
    pub async fn wait_entered(&mut self) -> usize {
        self.entered.recv().await.expect("gated transform dropped")
    }

    /// Let one blocked invocation finish.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
