pub mod fs;
pub mod process;

use std::net::Ipv4Addr;
use std::path::Path;

use ambar_shared::constants::files;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber: stderr plus an optional log file.
///
/// `RUST_LOG` overrides `default_directive`. The returned guard flushes the
/// file writer on drop and must be held for the life of the process.
pub fn init_logging(log_dir: Option<&Path>, default_directive: &str) -> Option<WorkerGuard> {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let file = log_dir.and_then(|dir| {
        std::fs::create_dir_all(dir).ok()?;
        let appender = tracing_appender::rolling::never(dir, files::LOG_FILE);
        Some(tracing_appender::non_blocking(appender))
    });

    match file {
        Some((non_blocking, guard)) => {
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .with_ansi(false),
                )
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .try_init();
            None
        }
    }
}

/// Primary IPv4 address of this host, as the kernel would route outbound.
///
/// Falls back to loopback when `ip` is unavailable or the output is not
/// understood.
pub async fn machine_address() -> Ipv4Addr {
    match process::capture("ip", &process::args(["route", "get", "8.8.8.8"])).await {
        Ok(out) => parse_route_source(&out).unwrap_or_else(|| {
            tracing::warn!(output = %out.trim(), "Could not find source address in route output");
            Ipv4Addr::LOCALHOST
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Could not detect machine address");
            Ipv4Addr::LOCALHOST
        }
    }
}

/// Extract the address following `src` in `ip route get` output.
fn parse_route_source(output: &str) -> Option<Ipv4Addr> {
    let line = output.lines().next()?;
    let mut tokens = line.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "src" {
            return tokens.next()?.parse().ok();
        }
    }
    None
}
