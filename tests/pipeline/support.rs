//! In-memory broker doubles and log capture for pipeline tests.

use lead_verifier::kafka::{Error as KafkaError, Record, RecordSink, RecordSource, Result};
use lead_verifier::MetricsSink;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::MakeWriter;

/// One scripted result of `receive`.
pub enum Step {
    Record(Record),
    Error(&'static str),
}

/// Source fed through a channel. Once the script is exhausted `receive`
/// blocks until more steps are pushed, like a quiet topic.
pub struct MemorySource {
    steps: tokio::sync::Mutex<mpsc::UnboundedReceiver<Step>>,
    acked: Arc<Mutex<Vec<i64>>>,
    rejected: Arc<Mutex<Vec<i64>>>,
    fail_ack: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct SourceHandle {
    tx: mpsc::UnboundedSender<Step>,
    acked: Arc<Mutex<Vec<i64>>>,
    rejected: Arc<Mutex<Vec<i64>>>,
    fail_ack: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new(steps: Vec<Step>) -> (Self, SourceHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        for step in steps {
            tx.send(step).unwrap();
        }
        let acked = Arc::new(Mutex::new(Vec::new()));
        let rejected = Arc::new(Mutex::new(Vec::new()));
        let fail_ack = Arc::new(AtomicBool::new(false));
        let source = Self {
            steps: tokio::sync::Mutex::new(rx),
            acked: Arc::clone(&acked),
            rejected: Arc::clone(&rejected),
            fail_ack: Arc::clone(&fail_ack),
        };
        let handle = SourceHandle {
            tx,
            acked,
            rejected,
            fail_ack,
        };
        (source, handle)
    }
}

impl SourceHandle {
    pub fn push(&self, step: Step) {
        self.tx.send(step).unwrap();
    }

    pub fn acked(&self) -> Vec<i64> {
        self.acked.lock().unwrap().clone()
    }

    /// Make `acknowledge` fail until switched back.
    pub fn set_ack_failing(&self, fail: bool) {
        self.fail_ack.store(fail, Ordering::SeqCst);
    }

    /// Offsets whose acknowledgement failed.
    pub fn rejected(&self) -> Vec<i64> {
        self.rejected.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordSource for MemorySource {
    async fn receive(&self) -> Result<Record> {
        let mut steps = self.steps.lock().await;
        match steps.recv().await {
            Some(Step::Record(record)) => Ok(record),
            Some(Step::Error(msg)) => Err(KafkaError::Consumer(msg.to_string())),
            None => std::future::pending().await,
        }
    }

    fn acknowledge(&self, record: &Record) -> Result<()> {
        if self.fail_ack.load(Ordering::SeqCst) {
            self.rejected.lock().unwrap().push(record.offset);
            return Err(KafkaError::Consumer(
                "Failed to store offset: not assigned".to_string(),
            ));
        }
        self.acked.lock().unwrap().push(record.offset);
        Ok(())
    }
}

/// Sink that keeps everything it was sent. Clones share state.
#[derive(Clone)]
pub struct MemorySink {
    topic: &'static str,
    fail: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<Record>>>,
    flushed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new(topic: &'static str) -> Self {
        Self {
            topic,
            fail: Arc::new(AtomicBool::new(false)),
            sent: Arc::new(Mutex::new(Vec::new())),
            flushed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Record> {
        self.sent.lock().unwrap().clone()
    }

    pub fn was_flushed(&self) -> bool {
        self.flushed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    fn topic(&self) -> &str {
        self.topic
    }

    async fn send(&self, record: &Record) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(KafkaError::Producer(format!(
                "Failed to send to {}: broker down",
                self.topic
            )));
        }
        self.sent.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn flush(&self, _timeout: Duration) -> Result<()> {
        self.flushed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Counter double for the router.
#[derive(Clone, Default)]
pub struct RecordingMetrics {
    verified: Arc<AtomicU64>,
    invalid: Arc<AtomicU64>,
}

impl RecordingMetrics {
    pub fn verified(&self) -> u64 {
        self.verified.load(Ordering::SeqCst)
    }

    pub fn invalid(&self) -> u64 {
        self.invalid.load(Ordering::SeqCst)
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment_verified(&self) {
        self.verified.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route `tracing` output of the current thread into this capture.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached within 5s");
}
