use super::*;
use crate::config::PortfolioConfig;
use axum::{routing::get, Router};
use bevy_app::AppExit;
use bevy_diagnostic::FrameCount;
use std::net::{IpAddr, Ipv4Addr, TcpListener};

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(headless_plugins());
    app
}

fn hello_router() -> Router {
    Router::new().route("/hello", get(|| async { "hello" }))
}

fn server(app: &App) -> &ApiServer {
    app.world().resource::<ApiServer>()
}

#[test]
fn test_serve_router_uses_configured_address() {
    let mut app = create_test_app();
    app.insert_resource(PortfolioConfig {
        ip: LOCALHOST,
        port: 27080,
        ..Default::default()
    })
    .serve_router(hello_router());

    assert!(app.is_plugin_added::<PortfolioServerPlugin>());
    assert_eq!(server(&app).ip(), LOCALHOST);
    assert_eq!(server(&app).port(), 27080);
    assert_eq!(app.api_server_status(), Some(ServerStatus::Idle));
}

#[test]
fn test_serve_router_falls_back_to_defaults() {
    let mut app = create_test_app();
    app.serve_router(hello_router());

    assert_eq!(server(&app).ip(), DEFAULT_IP);
    assert_eq!(server(&app).port(), DEFAULT_PORT);
}

#[test]
fn test_no_status_without_server() {
    let app = create_test_app();
    assert_eq!(app.api_server_status(), None);
}

#[test]
fn test_first_frame_runs_with_headless_plugins() {
    let mut app = create_test_app();
    app.insert_resource(PortfolioConfig {
        ip: LOCALHOST,
        port: 0,
        ..Default::default()
    })
    .serve_router(hello_router());

    app.update();
    assert!(app.world().contains_resource::<FrameCount>());
    assert_eq!(app.api_server_status(), Some(ServerStatus::Running));
}

#[test]
fn test_server_starts_and_stops_on_exit() {
    let mut app = create_test_app();
    app.insert_resource(PortfolioConfig {
        ip: LOCALHOST,
        port: 0,
        ..Default::default()
    })
    .serve_router(hello_router());

    app.update();
    assert_eq!(app.api_server_status(), Some(ServerStatus::Running));
    assert_eq!(server(&app).last_error(), None);

    app.world_mut().send_event(AppExit::Success);
    app.update();
    assert_eq!(app.api_server_status(), Some(ServerStatus::Stopped));

    // Stopped servers are not restarted.
    app.update();
    assert_eq!(app.api_server_status(), Some(ServerStatus::Stopped));
}

#[test]
fn test_occupied_port_schedules_retry() {
    let occupied = TcpListener::bind((LOCALHOST, 0)).unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut app = create_test_app();
    app.insert_resource(PortfolioConfig {
        ip: LOCALHOST,
        port,
        ..Default::default()
    })
    .serve_router(hello_router());

    app.update();
    assert_eq!(app.api_server_status(), Some(ServerStatus::Retrying));
    assert_eq!(server(&app).retry_attempts(), 1);
    assert!(server(&app).last_error().is_some());

    // The next attempt waits for the retry delay.
    app.update();
    assert_eq!(server(&app).retry_attempts(), 1);
    assert_eq!(app.api_server_status(), Some(ServerStatus::Retrying));
}
