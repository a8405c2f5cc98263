//! The coordinator: job registry, worker sessions, operator console.
//!
//! All state lives in a single event-loop task; accept, per-connection
//! I/O, and console input run as separate tasks that only talk to the
//! loop over channels. Nothing here needs a lock.

pub mod console;
pub mod persist;
pub mod registry;
pub mod session;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::AsyncBufReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::launcher;
use crate::protocol::{self, Message, ProtocolError};
use crate::transport::{self, FramedStream};

use console::ConsoleCommand;
use registry::JobRegistry;
use session::{SessionReply, WorkerSession};

#[derive(Debug)]
enum InboundFrame {
    Message(Message),
    Malformed(ProtocolError),
    Disconnected,
}

#[derive(Debug)]
enum Event {
    Connected { stream: TcpStream, peer: SocketAddr },
    Inbound { worker_id: u64, frame: InboundFrame },
    Console { line: String },
}

/// Handle for feeding the coordinator from outside the event loop:
/// the stdin console task uses it, and tests drive the operator surface
/// through it.
#[derive(Clone)]
pub struct CoordinatorHandle {
    local_addr: SocketAddr,
    events: mpsc::Sender<Event>,
}

impl CoordinatorHandle {
    /// The address the coordinator actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Inject one operator console line.
    pub async fn console_line(&self, line: impl Into<String>) {
        let _ = self
            .events
            .send(Event::Console { line: line.into() })
            .await;
    }
}

pub struct Coordinator {
    config: CoordinatorConfig,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    registry: JobRegistry,
    workers: HashMap<u64, WorkerSession>,
    next_worker_id: u64,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    shutdown: CancellationToken,
}

impl Coordinator {
    /// Bind the listening socket. A bind failure is a startup error and
    /// surfaces here, before the event loop exists.
    pub async fn bind(
        config: CoordinatorConfig,
        shutdown: CancellationToken,
    ) -> Result<(Self, CoordinatorHandle)> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        let (events_tx, events_rx) = mpsc::channel(256);

        let handle = CoordinatorHandle {
            local_addr,
            events: events_tx.clone(),
        };

        let coordinator = Self {
            config,
            listener: Some(listener),
            local_addr,
            registry: JobRegistry::new(),
            workers: HashMap::new(),
            next_worker_id: 0,
            events_tx,
            events_rx,
            shutdown,
        };

        Ok((coordinator, handle))
    }

    /// Run until the operator exits or a shutdown signal arrives.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(addr = %self.local_addr, "Coordinator listening");

        if let Some(path) = self.config.batch_file.take() {
            match self.ingest_file(&path) {
                Ok(added) => tracing::info!(
                    added,
                    pending = self.registry.pending_count(),
                    "Startup batch loaded"
                ),
                Err(e) => tracing::error!(path = %path.display(), error = %e, "Unable to load startup batch"),
            }
        }

        if let Some(path) = self.config.worker_file.take() {
            if let Err(e) = self.preload_workers(&path) {
                tracing::error!(path = %path.display(), error = %e, "Unable to load worker file");
            }
        }

        let listener = self
            .listener
            .take()
            .expect("run is called once, right after bind");
        self.spawn_accept_loop(listener);
        self.spawn_console_reader();

        let shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                }
            }
        }

        tracing::info!("Coordinator stopped");
        Ok(())
    }

    fn spawn_accept_loop(&self, listener: TcpListener) {
        let listener_events = self.events_tx.clone();
        let cancel = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            if listener_events
                                .send(Event::Connected { stream, peer })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "accept failed"),
                    }
                }
            }
        });
    }

    fn spawn_console_reader(&self) {
        let events = self.events_tx.clone();
        let cancel = self.shutdown.clone();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut lines = tokio::io::BufReader::new(stdin).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if events.send(Event::Console { line }).await.is_err() {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
            }
        });
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Connected { stream, peer } => self.register_worker(stream, peer),
            Event::Inbound { worker_id, frame } => self.handle_inbound(worker_id, frame),
            Event::Console { line } => self.handle_console(line),
        }
    }

    fn register_worker(&mut self, stream: TcpStream, peer: SocketAddr) {
        let worker_id = self.next_worker_id;
        self.next_worker_id += 1;

        tracing::info!(worker_id, peer = %peer, "Connection from worker");

        let framed = transport::framed(stream);
        let (sink, frames) = framed.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let cancel = self.shutdown.child_token();

        tokio::spawn(writer_task(out_rx, sink));
        tokio::spawn(reader_task(
            worker_id,
            frames,
            self.events_tx.clone(),
            cancel.clone(),
        ));

        let session = WorkerSession::new(worker_id, peer.to_string(), out_tx, cancel);
        self.workers.insert(worker_id, session);

        self.try_assign(worker_id);
    }

    fn handle_inbound(&mut self, worker_id: u64, frame: InboundFrame) {
        match frame {
            InboundFrame::Message(message) => {
                let Some(session) = self.workers.get_mut(&worker_id) else {
                    tracing::warn!(worker_id, "message from an unregistered worker");
                    return;
                };
                if let Some(reply) = session.on_message(message) {
                    self.apply_reply(reply);
                    // The worker just went idle; it wants more work.
                    self.try_assign(worker_id);
                }
            }
            InboundFrame::Malformed(e) => {
                tracing::warn!(worker_id, error = %e, "protocol error from worker");
            }
            InboundFrame::Disconnected => {
                if let Some(mut session) = self.workers.remove(&worker_id) {
                    tracing::info!(worker_id, "Worker disconnected");
                    if let Some(reply) = session.on_disconnected() {
                        self.apply_reply(reply);
                    }
                }
            }
        }
    }

    fn apply_reply(&mut self, reply: SessionReply) {
        match reply {
            SessionReply::Success {
                id,
                std_out,
                std_err,
                elapsed_secs,
            } => {
                if self.registry.mark_done(&id) {
                    tracing::info!(id = %id.braced(), elapsed_secs, "Job done");
                    tracing::debug!(id = %id.braced(), std_out = %std_out, std_err = %std_err, "Job output");
                } else {
                    tracing::warn!(id = %id.braced(), "success for an unknown job");
                }
            }
            SessionReply::Failure {
                id,
                std_out,
                std_err,
            } => {
                if self.registry.mark_failed(&id) {
                    tracing::info!(id = %id.braced(), "Job failed");
                    tracing::debug!(id = %id.braced(), std_out = %std_out, std_err = %std_err, "Job output");
                } else {
                    tracing::warn!(id = %id.braced(), "failure for an unknown job");
                }
            }
        }
    }

    fn handle_console(&mut self, line: String) {
        let command = match console::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(message) => {
                println!("{message}");
                return;
            }
        };

        match command {
            ConsoleCommand::Exit => {
                tracing::info!("Closing down coordinator");
                self.shutdown.cancel();
            }
            ConsoleCommand::Status => {
                println!("{} jobs pending", self.registry.pending_count());
                if self.registry.failed_count() > 0 {
                    println!("{} jobs failed", self.registry.failed_count());
                }
                self.print_workers();
            }
            ConsoleCommand::Add { path } => {
                tracing::info!(path = %path.display(), "Sourcing new jobs");
                match self.ingest_file(&path) {
                    Ok(added) => tracing::info!(
                        added,
                        pending = self.registry.pending_count(),
                        "Jobs added"
                    ),
                    Err(e) => println!("Unable to open file {}: {e}", path.display()),
                }
            }
            ConsoleCommand::ClearPending => {
                self.registry.clear_pending();
                tracing::info!("Pending queue cleared");
            }
            ConsoleCommand::WorkerList => self.print_workers(),
            ConsoleCommand::WorkerAdd { host, exe } => {
                let exe = exe.unwrap_or_else(default_exe);
                launcher::launch(host, exe, self.local_addr.port());
            }
            ConsoleCommand::WorkerDrop { worker_id } => match self.workers.get(&worker_id) {
                Some(session) => session.kill(),
                None => println!("No worker with id {worker_id}"),
            },
            ConsoleCommand::HaltSave { path } => self.halt_save(&path),
            ConsoleCommand::Restore { path } => self.restore(&path),
        }
    }

    fn halt_save(&self, path: &Path) {
        if self.registry.has_pending() {
            println!("Please clear pending jobs and wait for workers to complete.");
            return;
        }
        if self.registry.has_in_work() {
            println!("Please wait for workers to complete.");
            return;
        }

        match persist::save(path, self.registry.jobs()) {
            Ok(()) => {
                println!("State written. You can stop the coordinator when workers are done.")
            }
            Err(e) => println!("Unable to write state file: {e}"),
        }
    }

    fn restore(&mut self, path: &Path) {
        match persist::load(path) {
            Ok(records) => {
                let queued = self.registry.restore_merge(records);
                tracing::info!(queued, "State loaded");
                self.assign_available();
            }
            Err(e) => println!("Unable to read state file: {e}"),
        }
    }

    fn print_workers(&self) {
        println!("Workers:");
        let mut sessions: Vec<&WorkerSession> = self.workers.values().collect();
        sessions.sort_by_key(|s| s.worker_id());
        for session in sessions {
            println!("{}", session.status_line());
        }
    }

    /// Pair one idle worker with the oldest pending job.
    fn try_assign(&mut self, worker_id: u64) {
        let Some(session) = self.workers.get_mut(&worker_id) else {
            return;
        };
        if !session.is_idle() || session.has_assignment() {
            return;
        }
        let Some(assignment) = self.registry.take_next(worker_id) else {
            return;
        };
        tracing::debug!(worker_id, id = %assignment.id.braced(), "Assigning job");
        session.assign(assignment);
    }

    /// Work became available: offer it to every idle worker, one pairing
    /// at a time, until the queue runs dry.
    fn assign_available(&mut self) {
        let mut worker_ids: Vec<u64> = self.workers.keys().copied().collect();
        worker_ids.sort_unstable();
        for worker_id in worker_ids {
            if !self.registry.has_pending() {
                break;
            }
            self.try_assign(worker_id);
        }
    }

    /// Read a batch file and queue one job per non-empty line, then fan
    /// out work-available. Short synchronous reads are fine on the loop.
    fn ingest_file(&mut self, path: &Path) -> std::io::Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let added = self.registry.ingest_lines(text.lines());
        self.assign_available();
        Ok(added)
    }

    fn preload_workers(&self, path: &Path) -> std::io::Result<()> {
        let text = std::fs::read_to_string(path)?;
        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let Some(host) = parts.next() else { continue };
            let exe = parts
                .next()
                .map(str::to_string)
                .unwrap_or_else(default_exe);
            launcher::launch(host.to_string(), exe, self.local_addr.port());
        }
        Ok(())
    }
}

fn default_exe() -> String {
    std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "jobcast".to_string())
}

async fn writer_task(
    mut outbound: mpsc::UnboundedReceiver<Message>,
    mut sink: SplitSink<FramedStream, Bytes>,
) {
    while let Some(message) = outbound.recv().await {
        if sink
            .send(Bytes::from(protocol::encode(&message)))
            .await
            .is_err()
        {
            break;
        }
    }
    // Dropping the sink closes the socket.
}

async fn reader_task(
    worker_id: u64,
    mut frames: SplitStream<FramedStream>,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => match frame {
                Some(Ok(bytes)) => {
                    let inbound = match protocol::decode(&bytes) {
                        Ok(message) => InboundFrame::Message(message),
                        Err(e) => InboundFrame::Malformed(e),
                    };
                    if events
                        .send(Event::Inbound { worker_id, frame: inbound })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(worker_id, error = %e, "read error");
                    break;
                }
                None => break,
            }
        }
    }

    let _ = events
        .send(Event::Inbound {
            worker_id,
            frame: InboundFrame::Disconnected,
        })
        .await;
}
