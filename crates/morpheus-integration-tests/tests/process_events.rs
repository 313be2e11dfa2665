//! Shutdown driven by the process itself: termination signals and the host
//! going away.
//!
//! Kept in its own test binary since a signal reaches every test in the
//! process.

#![cfg(unix)]

use std::time::Duration;

use morpheus_plugin::{PluginServer, Provider, RunOptions, ServeOpts, ServeState, ShutdownReason};
use morpheus_test::prelude::*;
use nix::sys::signal::{Signal, kill};
use nix::unistd::getpid;
use tokio::signal::unix::{SignalKind, signal};

fn factory() -> Box<dyn Provider> {
    Box::new(MockProvider::new())
}

#[tokio::test]
async fn sigterm_terminates_plugin() {
    init_test_logging();
    // Keeps the process alive should the plugin's handler not be installed yet.
    let mut own_handler = signal(SignalKind::terminate()).unwrap();

    let server = PluginServer::start(&ServeOpts::new(factory), &host_config())
        .await
        .unwrap();
    let state = server.subscribe_state();
    let run = server.run(RunOptions {
        watch_signals: true,
        watch_host: false,
        ..RunOptions::default()
    });
    tokio::pin!(run);

    // The first poll installs the signal watcher before any await point.
    tokio::select! {
        biased;
        result = &mut run => panic!("run resolved before any signal: {result:?}"),
        () = tokio::task::yield_now() => {},
    }
    assert_eq!(*state.borrow(), ServeState::Serving);

    kill(getpid(), Signal::SIGTERM).unwrap();

    let reason = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("run did not resolve after SIGTERM")
        .unwrap();
    assert_eq!(reason, ShutdownReason::Terminated);
    assert_eq!(*state.borrow(), ServeState::Terminated);

    tokio::time::timeout(Duration::from_secs(5), own_handler.recv())
        .await
        .expect("SIGTERM was not delivered")
        .unwrap();
}

#[tokio::test]
async fn host_watcher_is_quiet_while_host_lives() {
    let server = PluginServer::start(&ServeOpts::new(factory), &host_config())
        .await
        .unwrap();
    let state = server.subscribe_state();
    let trigger = server.shutdown_sender();
    let task = tokio::spawn(server.run(RunOptions {
        watch_signals: false,
        watch_host: true,
        host_check_interval: Duration::from_millis(50),
    }));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!task.is_finished(), "host watcher fired with the host alive");
    assert_eq!(*state.borrow(), ServeState::Serving);

    trigger.send(ShutdownReason::HostRequested).unwrap();
    let reason = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("run did not resolve after shutdown request")
        .unwrap()
        .unwrap();
    assert_eq!(reason, ShutdownReason::HostRequested);
    assert_eq!(*state.borrow(), ServeState::Terminated);
}
