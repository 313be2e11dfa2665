//! Background tasks that turn process events into shutdown requests.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::ShutdownReason;
use crate::error::{PluginError, PluginResult};

/// Watch for termination signals.
///
/// Interrupts are logged and ignored: the host forwards Ctrl-C to its
/// plugins and then shuts them down through the controller. SIGTERM ends the
/// plugin.
pub(super) fn spawn_signal_watcher(
    tx: broadcast::Sender<ShutdownReason>,
) -> PluginResult<JoinHandle<()>> {
    let mut signals = Signals::install()?;

    Ok(tokio::spawn(async move {
        let mut interrupts: u64 = 0;
        loop {
            match signals.next().await {
                Signal::Interrupt => {
                    interrupts = interrupts.saturating_add(1);
                    info!(count = interrupts, "Plugin received interrupt signal, ignoring");
                },
                Signal::Terminate => {
                    info!("Plugin received termination signal");
                    let _ = tx.send(ShutdownReason::Terminated);
                    return;
                },
                Signal::Unavailable => return,
            }
        }
    }))
}

enum Signal {
    Interrupt,
    Terminate,
    Unavailable,
}

struct Signals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Signals {
    #[cfg(unix)]
    fn install() -> PluginResult<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        let terminate =
            signal(SignalKind::terminate()).map_err(|e| PluginError::Signal(e.to_string()))?;
        Ok(Self { terminate })
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn install() -> PluginResult<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn next(&mut self) -> Signal {
        tokio::select! {
            res = tokio::signal::ctrl_c() => interrupt_or_unavailable(res),
            received = self.terminate.recv() => match received {
                Some(()) => Signal::Terminate,
                None => Signal::Unavailable,
            },
        }
    }

    #[cfg(not(unix))]
    async fn next(&mut self) -> Signal {
        interrupt_or_unavailable(tokio::signal::ctrl_c().await)
    }
}

fn interrupt_or_unavailable(res: std::io::Result<()>) -> Signal {
    match res {
        Ok(()) => Signal::Interrupt,
        Err(e) => {
            warn!(error = %e, "Cannot listen for interrupts");
            Signal::Unavailable
        },
    }
}

/// Watch for the host process going away.
///
/// When the host dies the plugin is re-parented, so a changed parent PID
/// means nobody will ever call `plugin_shutdown`.
#[cfg(unix)]
pub(super) fn spawn_host_watcher(
    tx: broadcast::Sender<ShutdownReason>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    use nix::unistd::getppid;

    let host = getppid();
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if getppid() != host {
                warn!(host_pid = %host, "Host process exited");
                let _ = tx.send(ShutdownReason::HostExited);
                return;
            }
        }
    }))
}

#[cfg(not(unix))]
pub(super) fn spawn_host_watcher(
    _tx: broadcast::Sender<ShutdownReason>,
    _interval: Duration,
) -> Option<JoinHandle<()>> {
    None
}
