#![forbid(unsafe_code)]

//! Log targets and subscriber setup.
//!
//! The crate only emits `tracing` events; installing a subscriber is the
//! embedder's call. With the `tracing-json` feature,
//! [`init_json_subscriber`] installs a JSON formatter filtered by `RUST_LOG`
//! (default `formtrack=info`).

/// Target for key classification.
pub const TARGET_FILTER: &str = "formtrack.filter";
/// Target for key/delta pairing.
pub const TARGET_RECONCILER: &str = "formtrack.reconciler";
/// Target for cursor movement and task completion.
pub const TARGET_PROGRESSION: &str = "formtrack.progression";
/// Target for click classification.
pub const TARGET_CLICK: &str = "formtrack.click";
/// Target for telemetry delivery.
pub const TARGET_TELEMETRY: &str = "formtrack.telemetry";
/// Target for the browser adapter.
pub const TARGET_WEB: &str = "formtrack.web";

/// Default directive when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "formtrack=info";

/// Install a global JSON subscriber.
///
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(true)
        .try_init()
        .is_ok()
}
