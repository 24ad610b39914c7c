use async_io::Async;
use axum::Router;
use bevy_defer::{AccessError, AsyncAccess, AsyncExecutor, AsyncWorld};
use bevy_log::{debug, error};
use hyper::server::conn::http1;
use hyper_util::service::TowerToHyperService;
use smol_hyper::rt::{FuturesIo, SmolTimer};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use super::{TaskKind, TaskStore};
use crate::tracker::ActivityTracker;
use crate::PortfolioResult;

const ACCEPT_ERROR_BACKOFF_MS: u64 = 100;

/// Accepts connections until the listener task is dropped.
pub(super) async fn accept_loop(
    listener: Async<TcpListener>,
    router: Router,
    connections: ActivityTracker,
    tasks: TaskStore,
) -> PortfolioResult<()> {
    let executor = AsyncWorld
        .non_send_resource::<AsyncExecutor>()
        .get(|executor| executor.clone())?;
    let service = TowerToHyperService::new(router);

    loop {
        match listener.accept().await {
            Ok((client, peer)) => {
                let guard = connections.begin();
                let connection_id = connections.total();
                let service = service.clone();

                let task = executor.spawn_task(async move {
                    let _guard = guard;
                    serve_connection(connection_id, peer, client, service).await;
                    Ok::<(), AccessError>(())
                });
                tasks.insert(TaskKind::Connection(connection_id), task);
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                AsyncWorld
                    .sleep(Duration::from_millis(ACCEPT_ERROR_BACKOFF_MS))
                    .await;
            }
        }
        AsyncWorld.yield_now().await;
    }
}

async fn serve_connection(
    connection_id: usize,
    peer: SocketAddr,
    client: Async<TcpStream>,
    service: TowerToHyperService<Router>,
) {
    let start_time = Instant::now();
    let result = http1::Builder::new()
        .timer(SmolTimer::new())
        .serve_connection(FuturesIo::new(client), service)
        .await;
    let duration = start_time.elapsed();

    match result {
        Ok(()) => debug!(
            "Connection {} from {} completed in {:?}",
            connection_id, peer, duration
        ),
        // Clients dropping idle keep-alive connections is routine.
        Err(err) if err.is_timeout() || err.is_incomplete_message() => debug!(
            "Connection {} from {} closed after {:?}: {}",
            connection_id, peer, duration, err
        ),
        Err(err) => error!(
            "Connection {} from {} failed after {:?}: {}",
            connection_id, peer, duration, err
        ),
    }
}
