//! The HTTP listener in front of the API router.
//!
//! [`ApiServer`] is a Bevy resource. Systems bind it, reschedule failed binds
//! and stop it once the app exits; the accept loop and every connection run as
//! `bevy_defer` tasks owned by the server's [`TaskStore`].

use async_io::Async;
use axum::Router;
use bevy_app::AppExit;
use bevy_defer::{AccessError, AsyncAccess, AsyncExecutor, AsyncWorld};
use bevy_ecs::prelude::*;
use bevy_log::{debug, error, info, warn};
use std::net::{IpAddr, TcpListener};
use std::time::{Duration, Instant};

use crate::tracker::ActivityTracker;
use crate::{PortfolioError, PortfolioResult};

mod listener;
mod status;
mod task_store;

pub use status::ServerStatus;
pub(crate) use task_store::{TaskKind, TaskStore};

pub type WebPort = u16;

pub const RETRY_DELAY: Duration = Duration::from_secs(10);
pub const MAX_RETRY_ATTEMPTS: usize = 100;

/// Bind attempts made after the first failure.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct RetrySchedule {
    attempts: usize,
    next_attempt: Option<Instant>,
}

impl RetrySchedule {
    pub(crate) fn is_due(&self, now: Instant) -> bool {
        self.attempts < MAX_RETRY_ATTEMPTS && self.next_attempt.map_or(true, |at| now >= at)
    }

    /// Books the next attempt. `false` once the attempts are used up.
    pub(crate) fn schedule(&mut self, now: Instant) -> bool {
        if self.attempts >= MAX_RETRY_ATTEMPTS {
            return false;
        }
        self.attempts += 1;
        self.next_attempt = Some(now + RETRY_DELAY);
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts
    }
}

#[derive(Debug, Resource)]
pub struct ApiServer {
    ip: IpAddr,
    port: WebPort,
    router: Router,
    status: ServerStatus,
    tasks: TaskStore,
    connections: ActivityTracker,
    last_error: Option<String>,
    retry: RetrySchedule,
}

impl ApiServer {
    pub fn new(ip: IpAddr, port: WebPort, router: Router) -> Self {
        Self {
            ip,
            port,
            router,
            status: ServerStatus::default(),
            tasks: TaskStore::default(),
            connections: ActivityTracker::default(),
            last_error: None,
            retry: RetrySchedule::default(),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn port(&self) -> WebPort {
        self.port
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn retry_attempts(&self) -> usize {
        self.retry.attempts()
    }

    pub fn active_connections(&self) -> usize {
        self.connections.active()
    }

    pub fn served_connections(&self) -> usize {
        self.connections.total()
    }

    /// Binds the listener and spawns the accept loop.
    pub fn start(&mut self, executor: &AsyncExecutor) -> PortfolioResult<()> {
        if self.tasks.is_running(TaskKind::Listener) {
            return Err(PortfolioError::server_already_running(self.port));
        }

        let listener = Async::<TcpListener>::bind((self.ip, self.port))
            .map_err(|e| PortfolioError::bind_failed(self.ip, self.port, e))?;
        let local = listener
            .get_ref()
            .local_addr()
            .map_err(|e| PortfolioError::io_error("read listener address", e))?;

        let router = self.router.clone();
        let connections = self.connections.clone();
        let tasks = self.tasks.clone();
        let task = executor.spawn_task(async move {
            if let Err(err) = listener::accept_loop(listener, router, connections, tasks).await {
                error!("Listener on {} stopped: {}", local, err);
                AsyncWorld
                    .resource::<ApiServer>()
                    .get_mut(|server| server.record_failure(&err))?;
            }
            Ok::<(), AccessError>(())
        });
        self.tasks.insert(TaskKind::Listener, task);

        self.status = ServerStatus::Running;
        self.last_error = None;
        self.retry.reset();
        info!("Portfolio API listening on http://{}", local);
        Ok(())
    }

    /// Keeps `error` and books a retry, or gives up when the attempts are used up.
    pub(crate) fn record_failure(&mut self, error: &PortfolioError) {
        self.last_error = Some(error.to_string());

        if self.retry.schedule(Instant::now()) {
            self.status = ServerStatus::Retrying;
            info!(
                "Retry {} of {} for {}:{} in {} seconds",
                self.retry.attempts(),
                MAX_RETRY_ATTEMPTS,
                self.ip,
                self.port,
                RETRY_DELAY.as_secs()
            );
        } else {
            self.status = ServerStatus::Failed;
            warn!(
                "Giving up on {}:{} after {} attempts",
                self.ip, self.port, MAX_RETRY_ATTEMPTS
            );
        }
    }

    /// Cancels the accept loop and every open connection.
    pub fn stop(&mut self) {
        self.tasks.clear();
        self.status = ServerStatus::Stopped;
        debug!("Stopped API server on {}:{}", self.ip, self.port);
    }

    pub(crate) fn launch(mut server: ResMut<Self>, executor: NonSend<AsyncExecutor>) {
        if !server.status.can_start() || !server.retry.is_due(Instant::now()) {
            return;
        }

        if let Err(err) = server.start(&executor) {
            error!("Failed to start API server: {}", err);
            server.record_failure(&err);
        }
    }

    pub(crate) fn reap_tasks(server: Res<Self>) {
        let finished = server.tasks.finished_count();
        if finished > 0 {
            debug!("Cleaning up {} finished server task(s)", finished);
            server.tasks.cleanup_finished();
        }
    }

    pub(crate) fn stop_on_exit(mut server: ResMut<Self>, mut exits: EventReader<AppExit>) {
        if exits.read().next().is_none() || server.status == ServerStatus::Stopped {
            return;
        }
        info!(
            "Shutting down, {} connection(s) still open",
            server.active_connections()
        );
        server.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_schedule_waits_between_attempts() {
        let now = Instant::now();
        let mut retry = RetrySchedule::default();
        assert!(retry.is_due(now));

        assert!(retry.schedule(now));
        assert_eq!(retry.attempts(), 1);
        assert!(!retry.is_due(now));
        assert!(!retry.is_due(now + RETRY_DELAY - Duration::from_millis(1)));
        assert!(retry.is_due(now + RETRY_DELAY));
    }

    #[test]
    fn test_retry_schedule_gives_up() {
        let now = Instant::now();
        let mut retry = RetrySchedule::default();
        for _ in 0..MAX_RETRY_ATTEMPTS {
            assert!(retry.schedule(now));
        }
        assert!(!retry.schedule(now));
        assert!(!retry.is_due(now + RETRY_DELAY * 2));

        retry.reset();
        assert!(retry.is_due(now));
    }

    #[test]
    fn test_failures_move_server_to_retrying_then_failed() {
        let mut server = ApiServer::new(crate::DEFAULT_IP, 5000, Router::new());
        assert_eq!(server.status(), ServerStatus::Idle);

        server.record_failure(&PortfolioError::config_error("port", "in use"));
        assert_eq!(server.status(), ServerStatus::Retrying);
        assert_eq!(server.retry_attempts(), 1);
        assert!(server.last_error().unwrap().contains("in use"));

        for _ in 1..=MAX_RETRY_ATTEMPTS {
            server.record_failure(&PortfolioError::config_error("port", "in use"));
        }
        assert_eq!(server.status(), ServerStatus::Failed);
        assert!(server.status().is_terminal());
    }
}
