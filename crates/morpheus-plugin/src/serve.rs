//! The blocking `serve` entry point.

use std::io::Write;

use tracing::{info, warn};

use crate::config::ServeConfig;
use crate::error::PluginResult;
use crate::provider::ServeOpts;
use crate::reattach::{self, ReattachConfig};
use crate::server::{PluginServer, RunOptions};

/// Serve a provider to the host that launched this process.
///
/// Reads the handshake environment, sets up logging on stderr, writes the
/// handshake line to stdout and serves until the host shuts the plugin down,
/// the host goes away or the process receives SIGTERM.
///
/// # Errors
///
/// Returns an error if the process was not launched by a host, no protocol
/// version is shared with the host, or the server cannot start.
pub async fn serve(opts: ServeOpts) -> PluginResult<()> {
    let config = ServeConfig::from_env()?;

    if let Err(e) = morpheus_telemetry::setup_logging(&config.log_config()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    serve_with_config(opts, &config, std::io::stdout()).await
}

/// [`serve`] with explicit configuration and handshake output.
///
/// # Errors
///
/// See [`serve`].
pub async fn serve_with_config(
    opts: ServeOpts,
    config: &ServeConfig,
    mut out: impl Write,
) -> PluginResult<()> {
    let server = PluginServer::start(&opts, config).await?;

    let announced = if opts.debug {
        let reattach = ReattachConfig::new(server.app_version(), server.addr(), std::process::id());
        reattach::write_instructions(&mut out, &opts.provider_addr, reattach)
    } else {
        server.handshake().write_to(&mut out)
    };
    if let Err(e) = announced {
        // The host never learned the address and will not call shutdown.
        warn!(error = %e, "Failed to announce plugin, shutting down");
        server.shutdown().await;
        return Err(e);
    }

    let reason = server
        .run(RunOptions {
            watch_signals: true,
            watch_host: !opts.debug,
            host_check_interval: config.host_check_interval(),
        })
        .await?;

    info!(%reason, "Plugin exited");
    Ok(())
}
