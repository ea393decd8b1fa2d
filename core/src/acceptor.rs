//! Connection acceptor: the network context.
//!
//! Binds once, then loops: accept one client, greet it, read until it goes
//! away, return to accepting. One connection at a time; a second client
//! waits in the listen backlog until the first disconnects.
//!
//! Shutdown is cooperative. `ShutdownSignal::request` sets a flag the
//! accept loop polls and shuts down the active stream so a blocked read
//! fails immediately. The thread is always joined, never killed.

use crate::{
    config::BridgeConfig,
    decoder,
    error::{BridgeError, BridgeResult},
    framer::Framer,
    queue::{PushOutcome, SnapshotSender},
};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uuid::Uuid;

const ACCEPT_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct SignalInner {
    requested: AtomicBool,
    active:    Mutex<Option<TcpStream>>,
}

/// Cooperative stop flag shared by the network thread and its owner.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        if let Some(stream) = self.active().take() {
            // Forces any blocked read on the serving thread to return.
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    fn register(&self, stream: &TcpStream) -> std::io::Result<()> {
        let handle = stream.try_clone()?;
        let mut active = self.active();
        if self.is_requested() {
            let _ = handle.shutdown(Shutdown::Both);
        } else {
            *active = Some(handle);
        }
        Ok(())
    }

    fn unregister(&self) {
        self.active().take();
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Option<TcpStream>> {
        self.inner.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Counters for one acceptor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptorStats {
    pub connections:       u64,
    pub connection_errors: u64,
    pub bytes_received:    u64,
    pub frames:            u64,
    pub snapshots:         u64,
    pub decode_failures:   u64,
}

/// Result of pushing one read's worth of bytes through framing and decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub frames:   usize,
    pub decoded:  usize,
    pub rejected: usize,
    /// The consumer has gone away; stop reading.
    pub closed:   bool,
}

/// Frame `bytes`, decode each frame, and queue the snapshots.
/// A malformed frame is logged and skipped; later frames are unaffected.
pub fn ingest(framer: &mut Framer, bytes: &[u8], sender: &SnapshotSender) -> IngestReport {
    let mut report = IngestReport::default();
    for frame in framer.feed(bytes) {
        report.frames += 1;
        match decoder::decode(&frame) {
            Ok(snapshot) => {
                report.decoded += 1;
                if sender.push(snapshot) == PushOutcome::Closed {
                    report.closed = true;
                    break;
                }
            }
            Err(e) => {
                report.rejected += 1;
                log::warn!("dropping frame: {e}: {}", decoder::preview(&frame));
            }
        }
    }
    report
}

#[derive(Debug)]
pub struct Acceptor {
    listener:         TcpListener,
    local_addr:       SocketAddr,
    greeting:         Vec<u8>,
    delimiter:        u8,
    read_buffer_size: usize,
}

impl Acceptor {
    /// Bind the listening socket. Failure here is fatal to the caller.
    pub fn bind(config: &BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        let addr = config.bind_target();
        let bind_err = |source: std::io::Error| BridgeError::Bind { addr: addr.clone(), source };

        let listener = TcpListener::bind(&addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        log::info!("listening on {local_addr}");

        Ok(Self {
            listener,
            local_addr,
            greeting: config.greeting.clone().into_bytes(),
            delimiter: config.delimiter_byte(),
            read_buffer_size: config.read_buffer_size,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Run the accept loop on a dedicated thread.
    pub fn spawn(
        self,
        sender: SnapshotSender,
        signal: ShutdownSignal,
    ) -> BridgeResult<JoinHandle<AcceptorStats>> {
        let handle = thread::Builder::new()
            .name("bridge-net".into())
            .spawn(move || self.run(&sender, &signal))?;
        Ok(handle)
    }

    /// Accept loop. Returns when shutdown is requested or the queue closes.
    pub fn run(&self, sender: &SnapshotSender, signal: &ShutdownSignal) -> AcceptorStats {
        let mut stats = AcceptorStats::default();
        log::info!("waiting for connection");

        while !signal.is_requested() && !sender.is_closed() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stats.connections += 1;
                    let conn_id = Uuid::new_v4();
                    log::info!("client {peer} connected (conn {conn_id})");

                    match self.serve(stream, sender, signal, &mut stats) {
                        Ok(()) => log::info!("conn {conn_id} closed"),
                        Err(e) if signal.is_requested() => {
                            log::debug!("conn {conn_id} interrupted by shutdown: {e}");
                        }
                        Err(e) => {
                            stats.connection_errors += 1;
                            log::warn!("conn {conn_id} failed: {e}");
                        }
                    }

                    if !signal.is_requested() {
                        log::info!("waiting for connection");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    log::warn!("accept failed: {e}");
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        log::info!("network loop stopped after {} connection(s)", stats.connections);
        stats
    }

    fn serve(
        &self,
        mut stream: TcpStream,
        sender: &SnapshotSender,
        signal: &ShutdownSignal,
        stats: &mut AcceptorStats,
    ) -> BridgeResult<()> {
        // Some platforms hand out accepted sockets inheriting the listener's mode.
        stream.set_nonblocking(false)?;
        signal.register(&stream)?;
        let result = self.pump(&mut stream, sender, stats);
        signal.unregister();
        result
    }

    fn pump(
        &self,
        stream: &mut TcpStream,
        sender: &SnapshotSender,
        stats: &mut AcceptorStats,
    ) -> BridgeResult<()> {
        stream.write_all(&self.greeting)?;
        stream.flush()?;

        // Per-connection: a partial frame never survives a reconnect.
        let mut framer = Framer::new(self.delimiter);
        let mut buf = vec![0u8; self.read_buffer_size];

        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) => {
                    if framer.has_partial() {
                        log::debug!("discarding {} buffered byte(s) on disconnect", framer.buffered_len());
                    }
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            stats.bytes_received += n as u64;
            log::debug!("received {n} byte(s)");

            let report = ingest(&mut framer, &buf[..n], sender);
            stats.frames += report.frames as u64;
            stats.snapshots += report.decoded as u64;
            stats.decode_failures += report.rejected as u64;
            if report.closed {
                log::info!("handoff queue closed; dropping connection");
                return Ok(());
            }
        }
    }
}
