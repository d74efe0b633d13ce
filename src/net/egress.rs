//! Egress address discovery.
//!
//! # Responsibilities
//! - Find the local address used for outbound traffic (for `Forwarded: by=`)
//!
//! # Design Decisions
//! - A connected UDP socket sends nothing; the kernel only picks a route
//! - Bounded by a short timeout; any failure yields the unspecified address
//! - One throwaway socket per call, never retried

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Well-known external address used only for route selection.
const PROBE_TARGET: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);
const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Return this host's egress IP, or `0.0.0.0` when it cannot be determined.
pub async fn egress_ip() -> IpAddr {
    probe(PROBE_TARGET, PROBE_TIMEOUT).await
}

async fn probe(target: SocketAddr, limit: Duration) -> IpAddr {
    let attempt = async {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.connect(target).await?;
        socket.local_addr().map(|addr| addr.ip())
    };

    match timeout(limit, attempt).await {
        Ok(Ok(ip)) => ip,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Egress probe failed");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }
        Err(_) => {
            tracing::debug!("Egress probe timed out");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }
    }
}
