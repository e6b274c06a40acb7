//! Load a ban list, ban a few peers, and forward everything the manager reports to `tracing`.
//! Running this twice shows the bans surviving a restart.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use banman::{unix_time_now, Builder, Event, LogLevel, Network, SubNet};

#[tokio::main]
async fn main() {
    // Add third-party logging
    let subscriber = tracing_subscriber::FmtSubscriber::new();
    tracing::subscriber::set_global_default(subscriber).unwrap();
    // Create the manager and the client that receives its messages
    let (mut manager, client) = Builder::new(Network::Signet)
        // Where banlist.dat and banlist.json are kept
        .data_dir(".banman-demo")
        // Bans without an explicit expiry last an hour
        .default_ban_time(Duration::from_secs(60 * 60))
        // Sweep and write the ban list often for the demonstration
        .dump_interval(Duration::from_secs(5))
        .log_level(LogLevel::Debug)
        .build();
    let report = manager.load_from_disk().unwrap();
    tracing::info!(
        "Accepted {} bans, {} had expired",
        report.accepted(),
        report.expired
    );
    let manager = Arc::new(manager);
    let handle = tokio::task::spawn(Arc::clone(&manager).run());
    // Split the client so different tasks may own the receivers
    let banman::Client {
        requester,
        mut log_rx,
        mut info_rx,
        mut warn_rx,
        mut event_rx,
    } = client;
    let listener = tokio::task::spawn(async move {
        loop {
            tokio::select! {
                log = log_rx.recv() => {
                    if let Some(log) = log {
                        tracing::debug!("{log}");
                    }
                }
                info = info_rx.recv() => {
                    if let Some(info) = info {
                        tracing::info!("{info}");
                    }
                }
                warn = warn_rx.recv() => {
                    match warn {
                        Some(warn) => tracing::warn!("{warn}"),
                        None => break,
                    }
                }
                event = event_rx.recv() => {
                    if let Some(Event::BanListChanged) = event {
                        tracing::info!("Connected peers should be checked against the ban list");
                    }
                }
            }
        }
    });
    // A single misbehaving peer, for the default ban time
    let peer = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7));
    manager.ban_for_default(peer).unwrap();
    // An entire range, for a day
    let range: SubNet = "203.0.113.0/24".parse().unwrap();
    manager.ban_for(range, Duration::from_secs(60 * 60 * 24)).unwrap();
    // The reserved subnet is refused
    if let Err(e) = manager.ban(SubNet::invalid(), i64::MAX) {
        tracing::info!("{e}");
    }
    let now = unix_time_now();
    let candidate = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 42));
    tracing::info!("{candidate} banned: {}", manager.is_banned(candidate, now));
    for (subnet, entry) in manager.banned(now) {
        tracing::info!("{subnet} banned until {}", entry.expires_at);
    }
    requester.dump().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    requester.shutdown().unwrap();
    handle.await.unwrap().unwrap();
    // Dropping the last handle to the manager closes the warning channel
    drop(manager);
    let _ = listener.await;
}
