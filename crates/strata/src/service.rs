//! Background layout service.
//!
//! Producers push [`DiagramEvent`]s onto a bounded queue; one consumer thread owns the
//! [`LayoutEngine`], coalesces bursts inside the debounce window and publishes one
//! [`LayoutBatch`] per pass on an unbounded `futures` channel.

use crate::actions::LayoutAction;
use crate::config::{LayoutConfig, ServiceConfig};
use crate::diagram::DiagramEvent;
use crate::engine::LayoutEngine;
use crate::error::{Error, Result};
use futures::channel::{mpsc as fmpsc, oneshot};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of one pass over a batch of coalesced events.
#[derive(Debug)]
pub struct LayoutBatch {
    pub events: Vec<DiagramEvent>,
    pub outcome: Result<Vec<LayoutAction>>,
}

enum Command {
    Event(DiagramEvent),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Producer side of a running service. Cheap to clone.
#[derive(Clone)]
pub struct LayoutHandle {
    sender: SyncSender<Command>,
}

impl LayoutHandle {
    /// Queues an event, blocking while the queue is full.
    pub fn submit(&self, event: DiagramEvent) -> Result<()> {
        self.sender
            .send(Command::Event(event))
            .map_err(|_| Error::ServiceClosed)
    }

    /// Resolves once every event submitted before this call has been processed.
    pub fn flush(&self) -> Result<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Command::Flush(tx))
            .map_err(|_| Error::ServiceClosed)?;
        Ok(rx)
    }
}

pub struct LayoutService {
    handle: LayoutHandle,
    worker: Option<JoinHandle<()>>,
}

impl LayoutService {
    pub fn spawn(
        layout: LayoutConfig,
        config: ServiceConfig,
    ) -> Result<(Self, fmpsc::UnboundedReceiver<LayoutBatch>)> {
        let (tx, rx) = mpsc::sync_channel::<Command>(config.queue_capacity.max(1));
        let (out_tx, out_rx) = fmpsc::unbounded();
        let worker = thread::Builder::new()
            .name("strata-layout".into())
            .spawn(move || service_loop(LayoutEngine::new(layout), config, rx, out_tx))
            .map_err(Error::Spawn)?;

        Ok((
            Self {
                handle: LayoutHandle { sender: tx },
                worker: Some(worker),
            },
            out_rx,
        ))
    }

    pub fn handle(&self) -> LayoutHandle {
        self.handle.clone()
    }

    pub fn submit(&self, event: DiagramEvent) -> Result<()> {
        self.handle.submit(event)
    }

    pub fn flush(&self) -> Result<oneshot::Receiver<()>> {
        self.handle.flush()
    }

    /// Processes everything already queued, then stops the consumer thread.
    pub fn shutdown(&mut self) {
        let _ = self.handle.sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for LayoutService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn service_loop(
    mut engine: LayoutEngine,
    config: ServiceConfig,
    rx: mpsc::Receiver<Command>,
    out: fmpsc::UnboundedSender<LayoutBatch>,
) {
    let max_batch = config.max_batch.max(1);
    loop {
        let first = match rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => return,
        };

        let mut events = Vec::new();
        let mut flushes = Vec::new();
        let mut stop = false;
        match first {
            Command::Event(event) => events.push(event),
            Command::Flush(done) => flushes.push(done),
            Command::Shutdown => stop = true,
        }

        // Coalesce the rest of the burst. Flush and shutdown end the window early.
        let deadline = Instant::now() + config.debounce();
        while !stop && flushes.is_empty() && events.len() < max_batch {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Command::Event(event)) => events.push(event),
                Ok(Command::Flush(done)) => flushes.push(done),
                Ok(Command::Shutdown) => stop = true,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    stop = true;
                }
            }
        }

        if !events.is_empty() {
            let outcome = engine.process(&events);
            match &outcome {
                Ok(actions) => debug!(
                    events = events.len(),
                    actions = actions.len(),
                    "layout batch processed"
                ),
                Err(err) => warn!(events = events.len(), error = %err, "layout batch dropped"),
            }
            if out.unbounded_send(LayoutBatch { events, outcome }).is_err() {
                debug!("layout batch receiver dropped");
            }
        }

        for done in flushes {
            let _ = done.send(());
        }
        if stop {
            return;
        }
    }
}
