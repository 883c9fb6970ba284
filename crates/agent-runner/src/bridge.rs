//! Bridge from blocking event producers to async consumers
//!
//! Some frameworks expose execution as a blocking generator. The bridge
//! drives such a generator on a blocking worker thread and hands each item to
//! the async side over a bounded channel, so a slow client caps memory
//! instead of letting the queue grow.

use futures::stream::BoxStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{AgentError, Result};

/// Default number of items buffered between producer and consumer
pub const DEFAULT_BRIDGE_CAPACITY: usize = 64;

/// Message sent from the worker to the consumer
#[derive(Debug)]
enum BridgeMessage<T> {
    Item(T),
    /// Producer finished normally
    Done,
    /// Producer failed; always the last message
    Failed(AgentError),
}

/// Runs blocking iterators on dedicated workers
#[derive(Debug, Clone, Copy)]
pub struct StreamBridge {
    capacity: usize,
}

impl Default for StreamBridge {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_CAPACITY)
    }
}

impl StreamBridge {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start draining `iter` on a blocking worker
    ///
    /// Items arrive in producer order. A producer error is delivered after
    /// every item produced before it and ends the stream; a panicking worker
    /// surfaces as an execution error once its queued items are consumed.
    /// The worker stops when `cancel` fires or the returned stream is
    /// dropped, including while it is blocked on a full buffer. It must be
    /// called from within a tokio runtime.
    pub fn spawn<T, I>(&self, iter: I, cancel: CancellationToken) -> BoxStream<'static, Result<T>>
    where
        T: Send + 'static,
        I: Iterator<Item = Result<T>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(self.capacity);
        let runtime = Handle::current();
        let worker = tokio::task::spawn_blocking(move || {
            let sink = Sink {
                runtime,
                tx,
                cancel,
            };
            produce(iter, &sink)
        });

        Box::pin(async_stream::stream! {
            while let Some(message) = rx.recv().await {
                match message {
                    BridgeMessage::Item(item) => yield Ok(item),
                    BridgeMessage::Done => break,
                    BridgeMessage::Failed(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }

            if let Err(e) = worker.await {
                if e.is_panic() {
                    error!("Stream bridge worker panicked");
                    yield Err(AgentError::execution("event producer panicked"));
                } else {
                    debug!("Stream bridge worker was cancelled: {}", e);
                }
            }
        })
    }
}

/// Sending half of a bridge, as seen from the blocking worker
struct Sink<T> {
    runtime: Handle,
    tx: mpsc::Sender<BridgeMessage<T>>,
    cancel: CancellationToken,
}

impl<T> Sink<T> {
    /// Block until `message` is queued; false once the run is cancelled or
    /// the consumer is gone
    fn send(&self, message: BridgeMessage<T>) -> bool {
        self.runtime.block_on(async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Stream bridge cancelled, stopping producer");
                    false
                }
                sent = self.tx.send(message) => {
                    if sent.is_err() {
                        debug!("Stream bridge consumer dropped, stopping producer");
                    }
                    sent.is_ok()
                }
            }
        })
    }
}

fn produce<T, I>(mut iter: I, sink: &Sink<T>)
where
    I: Iterator<Item = Result<T>>,
{
    loop {
        if sink.cancel.is_cancelled() {
            debug!("Stream bridge cancelled, stopping producer");
            return;
        }
        let Some(item) = iter.next() else {
            break;
        };
        match item {
            Ok(item) => {
                if !sink.send(BridgeMessage::Item(item)) {
                    return;
                }
            }
            Err(err) => {
                sink.send(BridgeMessage::Failed(err));
                return;
            }
        }
    }
    sink.send(BridgeMessage::Done);
}
