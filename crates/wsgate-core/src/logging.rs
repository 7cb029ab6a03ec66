//! `tracing` subscriber installation.
//!
//! Only the binary installs a subscriber; library crates just emit events.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Third-party targets that are too chatty at `debug`/`trace`.
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("tungstenite", "warn"),
    ("tokio_tungstenite", "warn"),
];

/// Build the filter directive string for a base level.
///
/// `RUST_LOG` takes priority when set; otherwise `level` is used with the
/// noisy-target overrides appended.
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    for (target, lvl) in NOISY_TARGETS {
        directives.push(format!("{target}={lvl}"));
    }
    directives.join(",")
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directives(level)))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, in which case
/// nothing changes.
pub fn init_subscriber(level: &str, json: bool) -> bool {
    let filter = build_filter(level);
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    result.is_ok()
}
