//! WS-Discovery engine.
//!
//! [`Discovery::discover`] sends one `Probe` from every eligible local IPv4
//! address to the multicast group and collects `ProbeMatches` until a shared
//! deadline.  Each address gets its own session (socket, message ID and
//! receive loop) running as a tokio task:
//!
//! ```text
//!  discover(duration)
//!    │
//!    ├─ InterfaceSource::probe_addresses()
//!    │
//!    ├─ JoinSet ── session(10.0.0.2) ── bind → send Probe → recv until deadline
//!    │          └─ session(192.168.1.20) ── ...
//!    │
//!    └─ merge results, dedup by device ID
//! ```
//!
//! # Failure policy
//!
//! The first session error aborts every other session and is returned;
//! results gathered so far are discarded.  Responses to other probes are
//! dropped silently.  Responses that are ours but unusable follow
//! [`MalformedResponsePolicy`].
//!
//! # Deadline
//!
//! A receive in progress at the deadline is abandoned; datagrams that arrive
//! afterwards are never read, since the socket is dropped with the session.

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::correlator::{parse_probe_match, CorrelationError};
use super::interfaces::{InterfaceSource, SystemInterfaces};
use super::probe::{build_probe, MULTICAST_ADDR, NETWORK_VIDEO_TRANSMITTER};
use crate::domain::{Device, DiscoveryRequest};
use crate::security::{Entropy, OsEntropy};

/// Receive buffer per datagram.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 10 * 1024;

/// Upper bound on the collection window; longer durations mean "until stopped".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// What a session does with a response that answers its probe but cannot be
/// turned into a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedResponsePolicy {
    /// Fail the whole discovery.
    #[default]
    Abort,
    /// Log at `warn` and keep listening.
    Skip,
}

/// Settings for [`Discovery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Destination of the probe.
    pub multicast_addr: SocketAddr,
    /// Content of `d:Types` in the probe.
    pub probe_types: String,
    /// Bytes reserved per received datagram.
    pub recv_buffer_size: usize,
    pub on_malformed: MalformedResponsePolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            multicast_addr: MULTICAST_ADDR,
            probe_types: NETWORK_VIDEO_TRANSMITTER.to_string(),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            on_malformed: MalformedResponsePolicy::Abort,
        }
    }
}

/// Errors returned by [`Discovery::discover`].
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to enumerate local interfaces: {0}")]
    Interfaces(#[source] io::Error),

    #[error("failed to bind discovery socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to send probe from {addr} to {target}: {source}")]
    Send {
        addr: SocketAddr,
        target: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("recv error on {addr}: {source}")]
    Recv {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("unusable discovery response on {addr} from {from}: {source}")]
    Response {
        addr: SocketAddr,
        from: SocketAddr,
        #[source]
        source: CorrelationError,
    },

    #[error("discovery session task failed: {0}")]
    Session(#[from] JoinError),
}

/// Finds devices on the local network segment.
///
/// Holds no per-call state; one value may serve concurrent `discover` calls.
#[derive(Clone)]
pub struct Discovery {
    config: Arc<DiscoveryConfig>,
    interfaces: Arc<dyn InterfaceSource>,
    entropy: Arc<dyn Entropy>,
}

impl Discovery {
    /// Uses the host's interfaces and the OS random source.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_sources(config, Arc::new(SystemInterfaces), Arc::new(OsEntropy))
    }

    pub fn with_sources(
        config: DiscoveryConfig,
        interfaces: Arc<dyn InterfaceSource>,
        entropy: Arc<dyn Entropy>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            interfaces,
            entropy,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Probes from every eligible address and collects answers for `duration`.
    ///
    /// No eligible address is not an error: the result is simply empty.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryError`] and the module-level failure policy.
    pub async fn discover(&self, duration: Duration) -> Result<Vec<Device>, DiscoveryError> {
        self.discover_until(duration, std::future::pending()).await
    }

    /// Like [`discover`](Self::discover), but resolving `stop` ends collection
    /// early and returns what was gathered so far.
    ///
    /// `Duration::MAX` collects until `stop` resolves.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryError`].
    pub async fn discover_until<F>(
        &self,
        duration: Duration,
        stop: F,
    ) -> Result<Vec<Device>, DiscoveryError>
    where
        F: Future<Output = ()>,
    {
        let addresses = self
            .interfaces
            .probe_addresses()
            .map_err(DiscoveryError::Interfaces)?;
        if addresses.is_empty() {
            warn!("no eligible IPv4 interface; nothing to probe");
            return Ok(Vec::new());
        }

        let deadline = deadline_after(Instant::now(), duration);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut sessions = JoinSet::new();
        for local in addresses {
            let request = DiscoveryRequest::new(self.entropy.as_ref());
            sessions.spawn(run_session(
                local,
                request,
                Arc::clone(&self.config),
                deadline,
                stop_rx.clone(),
            ));
        }

        tokio::pin!(stop);
        let mut stopping = false;
        let mut found = DeviceSet::default();

        loop {
            tokio::select! {
                joined = sessions.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok(devices))) => found.extend(devices),
                    Some(Ok(Err(e))) => {
                        sessions.abort_all();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        sessions.abort_all();
                        return Err(DiscoveryError::Session(e));
                    }
                },
                () = &mut stop, if !stopping => {
                    debug!("discovery stopped early");
                    stopping = true;
                    // Receivers outlive this send: the sessions hold them.
                    let _ = stop_tx.send(true);
                }
            }
        }

        Ok(found.into_vec())
    }
}

/// One probe from one local address.
async fn run_session(
    local: Ipv4Addr,
    request: DiscoveryRequest,
    config: Arc<DiscoveryConfig>,
    deadline: Instant,
    mut stop: watch::Receiver<bool>,
) -> Result<Vec<Device>, DiscoveryError> {
    let bind_addr = SocketAddr::from((local, 0));
    let socket = UdpSocket::bind(bind_addr)
        .await
        .map_err(|source| DiscoveryError::Bind {
            addr: bind_addr,
            source,
        })?;
    let addr = socket.local_addr().unwrap_or(bind_addr);

    let target = config.multicast_addr;
    let probe = build_probe(&request, &config.probe_types);
    socket
        .send_to(probe.as_bytes(), target)
        .await
        .map_err(|source| DiscoveryError::Send {
            addr,
            target,
            source,
        })?;
    debug!("probe {} sent from {addr} to {target}", request.message_id());

    let mut buf = vec![0u8; config.recv_buffer_size];
    let mut devices = Vec::new();

    loop {
        let received = tokio::select! {
            // A dropped sender disables this branch instead of firing it.
            Ok(()) = stop.changed() => break,
            received = timeout_at(deadline, socket.recv_from(&mut buf)) => received,
        };
        let (len, from) = match received {
            Err(_elapsed) => break,
            Ok(Ok(pair)) => pair,
            Ok(Err(source)) => return Err(DiscoveryError::Recv { addr, source }),
        };

        match parse_probe_match(request.message_id(), &buf[..len]) {
            Ok(device) => {
                debug!(
                    "probe match on {addr} from {from}: id={}, xaddr={}",
                    device.id(),
                    device.service_address()
                );
                devices.push(device);
            }
            Err(CorrelationError::Unrelated { actual, .. }) => {
                debug!("dropping response on {addr} from {from} relating to {actual:?}");
            }
            Err(source) => match config.on_malformed {
                MalformedResponsePolicy::Abort => {
                    return Err(DiscoveryError::Response { addr, from, source });
                }
                MalformedResponsePolicy::Skip => {
                    warn!("skipping response on {addr} from {from}: {source}");
                }
            },
        }
    }

    info!("discovery session on {addr} finished with {} device(s)", devices.len());
    Ok(devices)
}

/// `now + duration`, saturating at [`FAR_FUTURE`] from `now`.
fn deadline_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration.min(FAR_FUTURE))
        .unwrap_or(now)
}

/// Devices in arrival order, one per ID.
#[derive(Default)]
struct DeviceSet {
    seen: HashSet<String>,
    devices: Vec<Device>,
}

impl DeviceSet {
    fn extend(&mut self, devices: impl IntoIterator<Item = Device>) {
        for device in devices {
            if self.seen.insert(device.id().to_string()) {
                self.devices.push(device);
            } else {
                debug!("device {} already reported", device.id());
            }
        }
    }

    fn into_vec(self) -> Vec<Device> {
        self.devices
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
