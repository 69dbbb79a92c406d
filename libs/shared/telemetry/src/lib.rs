// [libs/shared/telemetry/src/lib.rs]
/*!
 * Tracing init shared by `apps/scanner` and every crate's test harness:
 * compact color output in debug builds, flat JSON in release, plus a
 * panic hook that routes thread panics through `tracing::error!` instead
 * of stderr so a panic in a spawned task still lands in the log sink.
 */

use std::panic;
use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber for `service_name`. Panics if
/// a global subscriber is already installed — callers invoke this once,
/// at process bootstrap.
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,libsql=error",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    install_panic_hook(service_name);
    info!(service = service_name, "tracing initialized");
}

fn install_panic_hook(service_name: &str) {
    let service_name = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");

        error!(target: "panic", service = %service_name, location = %location, "thread panicked: {}", message);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_falls_back_to_per_service_default_in_debug() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "sentinel_scanner=debug,tower_http=warn,hyper=warn,libsql=error".into());
        assert_eq!(filter.to_string(), "sentinel_scanner=debug,tower_http=warn,hyper=warn,libsql=error");
    }
}
