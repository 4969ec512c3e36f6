use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use chatwire_core::error::{ChatWireError, Result};
use chatwire_core::protocol::{decode_inbound, encode_outbound, WirePayload};

use crate::config::ChannelSection;
use crate::transport::{Connector, Transport};

use super::reconnect::{ReconnectPolicy, Sleeper, TokioSleeper};
use super::state::ConnectionState;

/// Callback invoked once per inbound payload.
pub type Listener = Arc<dyn Fn(&WirePayload) + Send + Sync>;

/// Handle returned by `on_message`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Channel settings (endpoint, connect timeout, reconnect policy).
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ChannelOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Duration::from_secs(5),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl From<&ChannelSection> for ChannelOptions {
    fn from(cfg: &ChannelSection) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            connect_timeout: cfg.connect_timeout(),
            reconnect: cfg.reconnect.policy(),
        }
    }
}

/// RealtimeChannel: one outbound connection, its listeners, and its
/// bounded reconnect loop.
///
/// Cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<Inner>,
}

struct Inner {
    opts: ChannelOptions,
    connector: Arc<dyn Connector>,
    sleeper: Arc<dyn Sleeper>,
    state: watch::Sender<ConnectionState>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    link: Mutex<Option<Link>>,
    next_link: AtomicU64,
    // stopped link tasks that may still hold an open transport
    retired: Mutex<Vec<JoinHandle<()>>>,
    // serializes connect() callers
    connect_gate: tokio::sync::Mutex<()>,
}

/// The current link (connecting, live, or reconnecting).
/// Dropping it stops the link task.
struct Link {
    id: u64,
    stop: watch::Sender<bool>,
    out_tx: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

impl Link {
    fn new(id: u64, stop: watch::Sender<bool>) -> Self {
        Self {
            id,
            stop,
            out_tx: None,
            task: None,
        }
    }
}

/// Where an attempt loop starts.
#[derive(Debug, Clone, Copy)]
enum Start {
    /// First attempt opens right away (`connect()`).
    Now,
    /// Every attempt waits its delay first (after a dropped link).
    AfterDelay,
}

enum LinkEnd {
    Stopped,
    Dropped(ChatWireError),
}

type Opened = (Box<dyn Transport>, mpsc::UnboundedReceiver<String>);

// No user code runs under these locks; a poisoned guard still holds
// consistent data.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn cancelled() -> ChatWireError {
    ChatWireError::Connection("connect cancelled by disconnect".into())
}

impl RealtimeChannel {
    pub fn new(opts: ChannelOptions, connector: Arc<dyn Connector>) -> Self {
        Self::with_sleeper(opts, connector, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        opts: ChannelOptions,
        connector: Arc<dyn Connector>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                opts,
                connector,
                sleeper,
                state,
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(1),
                link: Mutex::new(None),
                next_link: AtomicU64::new(1),
                retired: Mutex::new(Vec::new()),
                connect_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.opts.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Open the connection. No-op when already connected.
    ///
    /// A failed open is retried under the reconnect policy; the last
    /// `ConnectionError` is returned once every attempt has failed.
    /// Concurrent callers are serialized: a caller arriving while another
    /// attempt is in flight waits for it and returns `Ok` without a new
    /// attempt if that one connected. A pending automatic reconnect is
    /// cancelled and replaced by this attempt. Any previous transport is
    /// closed before the new one opens.
    pub async fn connect(&self) -> Result<()> {
        let _gate = self.inner.connect_gate.lock().await;
        if self.is_connected() {
            debug!(endpoint = %self.inner.opts.endpoint, "connect: already connected");
            return Ok(());
        }

        let id = self.inner.next_link.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        {
            let mut link = lock(&self.inner.link);
            if let Some(old) = link.take() {
                debug!(link = old.id, "replacing previous link");
                self.inner.retire(old);
            }
            *link = Some(Link::new(id, stop_tx));
            self.inner.publish(ConnectionState::Connecting);
        }
        self.inner.drain_retired().await;
        info!(link = id, endpoint = %self.inner.opts.endpoint, "connecting");

        let (transport, out_rx) = establish(&self.inner, id, &mut stop_rx, Start::Now).await?;
        let task = tokio::spawn(run_link(
            Arc::clone(&self.inner),
            id,
            transport,
            out_rx,
            stop_rx,
        ));
        self.inner.attach_task(id, task);
        Ok(())
    }

    /// Encode `payload` and hand it to the transport queue.
    ///
    /// Fails with `NotConnected` unless the state is `Connected`; nothing is
    /// written in that case. Never waits for a reply.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<()> {
        if !self.is_connected() {
            return Err(ChatWireError::NotConnected);
        }
        let frame = encode_outbound(payload)?;

        let link = lock(&self.inner.link);
        let tx = link
            .as_ref()
            .and_then(|l| l.out_tx.as_ref())
            .ok_or(ChatWireError::NotConnected)?;
        let bytes_len = frame.len();
        tx.send(frame).map_err(|_| ChatWireError::NotConnected)?;
        debug!(bytes_len, "frame queued");
        Ok(())
    }

    /// Register a listener for every payload received from now on.
    pub fn on_message<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&WirePayload) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).push((id, Arc::new(f)));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner.listeners);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Close the transport, cancel any pending reconnect or in-flight
    /// connect, and settle in `Disconnected`. Idempotent.
    pub fn disconnect(&self) {
        let prev = {
            let mut link = lock(&self.inner.link);
            let prev = link.take();
            self.inner.publish(ConnectionState::Disconnected);
            prev
        };
        match prev {
            Some(link) => {
                info!(link = link.id, "disconnected");
                self.inner.retire(link);
            }
            None => debug!("disconnect: nothing to close"),
        }
    }
}

impl Inner {
    fn publish(&self, next: ConnectionState) {
        // subscribers are only woken by real transitions
        self.state.send_if_modified(|cur| {
            if *cur == next {
                return false;
            }
            debug!(from = %*cur, to = %next, "connection state");
            *cur = next;
            true
        });
    }

    fn is_current(link: &Option<Link>, id: u64) -> bool {
        matches!(link, Some(l) if l.id == id)
    }

    /// Install the writer for link `id` and mark it connected.
    fn activate(&self, id: u64, out_tx: mpsc::UnboundedSender<String>) -> bool {
        let mut link = lock(&self.link);
        match link.as_mut() {
            Some(l) if l.id == id => {
                l.out_tx = Some(out_tx);
                self.publish(ConnectionState::Connected);
                true
            }
            _ => false,
        }
    }

    /// Stop a link; its task is awaited by the next `connect()`.
    fn retire(&self, link: Link) {
        let _ = link.stop.send(true);
        if let Some(task) = link.task {
            let mut retired = lock(&self.retired);
            retired.retain(|t| !t.is_finished());
            retired.push(task);
        }
    }

    fn attach_task(&self, id: u64, task: JoinHandle<()>) {
        let mut link = lock(&self.link);
        match link.as_mut() {
            Some(l) if l.id == id => l.task = Some(task),
            // disconnected meanwhile; the task has its stop signal already
            _ => lock(&self.retired).push(task),
        }
    }

    /// Wait until every stopped link task has closed its transport.
    async fn drain_retired(&self) {
        let tasks = std::mem::take(&mut *lock(&self.retired));
        for mut task in tasks {
            match tokio::time::timeout(self.opts.connect_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "previous link task ended abnormally"),
                Err(_) => {
                    warn!("previous link did not close in time, aborting it");
                    task.abort();
                    let _ = task.await;
                }
            }
        }
    }

    /// Link `id` lost its transport: stop accepting writes.
    fn detach_writer(&self, id: u64) -> bool {
        let mut link = lock(&self.link);
        match link.as_mut() {
            Some(l) if l.id == id => {
                l.out_tx = None;
                self.publish(ConnectionState::Disconnected);
                true
            }
            _ => false,
        }
    }

    fn set_state_for(&self, id: u64, next: ConnectionState) -> bool {
        let link = lock(&self.link);
        if !Self::is_current(&link, id) {
            return false;
        }
        self.publish(next);
        true
    }

    /// Link `id` is finished for good.
    fn release(&self, id: u64) {
        let mut link = lock(&self.link);
        if Self::is_current(&link, id) {
            *link = None;
            self.publish(ConnectionState::Disconnected);
        }
    }

    async fn open(&self) -> Result<Box<dyn Transport>> {
        let timeout = self.opts.connect_timeout;
        match tokio::time::timeout(timeout, self.connector.open(&self.opts.endpoint)).await {
            Ok(r) => r,
            Err(_) => Err(ChatWireError::Connection(format!(
                "connect timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    fn dispatch(&self, frame: &str) {
        let payload = match decode_inbound(frame) {
            Ok(p) => p,
            Err(e) => {
                warn!(code = e.code().as_str(), error = %e, "dropping inbound frame");
                return;
            }
        };
        // snapshot so listeners may call back into the channel
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in &listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&payload))).is_err() {
                warn!("listener panicked while handling a frame");
            }
        }
    }
}

async fn close_quietly(mut transport: Box<dyn Transport>) {
    if let Err(e) = transport.close().await {
        debug!(error = %e, "transport close failed");
    }
}

/// Link task: pump frames, and after an unexpected closure run the bounded
/// reconnect loop.
async fn run_link(
    inner: Arc<Inner>,
    id: u64,
    transport: Box<dyn Transport>,
    out_rx: mpsc::UnboundedReceiver<String>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut current: Option<Opened> = Some((transport, out_rx));
    while let Some((mut transport, mut out_rx)) = current.take() {
        match pump(&inner, transport.as_mut(), &mut out_rx, &mut stop_rx).await {
            LinkEnd::Stopped => {
                close_quietly(transport).await;
                debug!(link = id, "link stopped");
                return;
            }
            LinkEnd::Dropped(e) => {
                warn!(link = id, error = %e, "connection lost");
                drop(transport);
            }
        }
        if !inner.detach_writer(id) {
            return;
        }
        current = establish(&inner, id, &mut stop_rx, Start::AfterDelay)
            .await
            .ok();
    }
}

async fn pump(
    inner: &Inner,
    transport: &mut dyn Transport,
    out_rx: &mut mpsc::UnboundedReceiver<String>,
    stop_rx: &mut watch::Receiver<bool>,
) -> LinkEnd {
    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => return LinkEnd::Stopped,

            // outbound writer
            out = out_rx.recv() => {
                match out {
                    Some(frame) => {
                        if let Err(e) = transport.send_text(frame).await {
                            return LinkEnd::Dropped(e);
                        }
                    }
                    None => return LinkEnd::Stopped,
                }
            }

            // inbound reader
            inbound = transport.recv() => {
                match inbound {
                    Some(Ok(frame)) => inner.dispatch(&frame),
                    Some(Err(e)) => return LinkEnd::Dropped(e),
                    None => {
                        return LinkEnd::Dropped(ChatWireError::Connection("closed by peer".into()));
                    }
                }
            }
        }
    }
}

/// Bounded attempt loop shared by `connect()` and the link task.
///
/// Returns the opened transport, the last open error once every attempt
/// failed, or a cancellation error when link `id` is stopped.
async fn establish(
    inner: &Inner,
    id: u64,
    stop_rx: &mut watch::Receiver<bool>,
    start: Start,
) -> Result<Opened> {
    let policy = inner.opts.reconnect;
    let mut last_err = None;
    for attempt in 1..=policy.max_attempts {
        let wait = match start {
            Start::Now if attempt == 1 => None,
            Start::Now => Some(policy.delay_for(attempt - 1)),
            Start::AfterDelay => Some(policy.delay_for(attempt)),
        };
        if let Some(delay) = wait {
            info!(
                link = id,
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "reconnect scheduled"
            );
            tokio::select! {
                biased;
                _ = stop_rx.changed() => return Err(cancelled()),
                _ = inner.sleeper.sleep(delay) => {}
            }
        }

        if !inner.set_state_for(id, ConnectionState::Connecting) {
            return Err(cancelled());
        }
        let opened = tokio::select! {
            biased;
            _ = stop_rx.changed() => return Err(cancelled()),
            r = inner.open() => r,
        };

        match opened {
            Ok(transport) => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                if !inner.activate(id, out_tx) {
                    close_quietly(transport).await;
                    return Err(cancelled());
                }
                info!(link = id, attempt, "connected");
                return Ok((transport, out_rx));
            }
            Err(e) => {
                warn!(link = id, attempt, error = %e, "connect attempt failed");
                if !inner.set_state_for(id, ConnectionState::Disconnected) {
                    return Err(cancelled());
                }
                last_err = Some(e);
            }
        }
    }

    warn!(
        link = id,
        attempts = policy.max_attempts,
        "connect attempts exhausted, staying disconnected"
    );
    inner.release(id);
    Err(last_err.unwrap_or_else(|| ChatWireError::Connection("no connect attempts allowed".into())))
}
