//! Periodic KeepAlive broadcast to logged-in sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::message::Message;
use crate::protocol::play::KeepAlive;
use crate::server::registry::Registry;
use crate::server::ServerContext;
use crate::utils::metrics::Metrics;

/// Outcome of one broadcast tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<SocketAddr>,
}

/// Fresh correlation id in `[0, i32::MAX)`.
pub fn next_keepalive_id() -> i32 {
    rand::rng().random_range(0..i32::MAX)
}

/// Queue one KeepAlive to every logged-in session.
///
/// Each recipient is tried on its own; a closed or full queue is counted and logged
/// and the rest still receive theirs.
pub async fn broadcast_keepalive(
    registry: &Registry,
    metrics: &Metrics,
    id: i32,
) -> BroadcastReport {
    let packet = KeepAlive { id }.to_packet();
    let mut report = BroadcastReport::default();

    for handle in registry.logged_in().await {
        match handle.outbound.try_send(packet.clone()) {
            Ok(()) => {
                report.delivered += 1;
                metrics.keepalive_sent();
            }
            Err(e) => {
                let reason = match e {
                    TrySendError::Full(_) => "queue full",
                    TrySendError::Closed(_) => "session closed",
                };
                warn!(peer = %handle.addr, id, reason, "KeepAlive not delivered");
                metrics.keepalive_failed();
                report.failed.push(handle.addr);
            }
        }
    }

    debug!(
        id,
        delivered = report.delivered,
        failed = report.failed.len(),
        "KeepAlive broadcast"
    );
    report
}

/// Broadcast every `period` until `shutdown` fires. The first tick is one period
/// after start.
pub async fn run_keepalive(ctx: Arc<ServerContext>, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("KeepAlive task stopping");
                return;
            }
            _ = ticker.tick() => {
                broadcast_keepalive(ctx.registry(), ctx.metrics(), next_keepalive_id()).await;
            }
        }
    }
}
