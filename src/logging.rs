use tracing::Subscriber;
use tracing_subscriber::EnvFilter;

/// Builds the log filter: `RUST_LOG` when set, otherwise `default_level`.
/// An explicit `--log-level` is passed as `default_level` and also wins over
/// `RUST_LOG`.
pub fn log_filter(default_level: &str, explicit: bool) -> EnvFilter {
	if explicit {
		return EnvFilter::new(default_level);
	}
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// A stderr subscriber, so command output on stdout stays clean
pub fn subscriber(default_level: &str, explicit: bool) -> impl Subscriber + Send + Sync + 'static {
	tracing_subscriber::fmt()
		.with_env_filter(log_filter(default_level, explicit))
		.with_writer(std::io::stderr)
		.with_target(false)
		.finish()
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(default_level: &str, explicit: bool) {
	let _ = tracing::subscriber::set_global_default(subscriber(default_level, explicit));
}

#[cfg(test)]
mod tests {
	use tracing::Level;

	use super::*;

	#[test]
	fn explicit_level_wins() {
		assert_eq!(log_filter("debug", true).to_string(), "debug");
	}

	#[test]
	fn subscriber_applies_level() {
		tracing::subscriber::with_default(subscriber("error", true), || {
			assert!(tracing::enabled!(Level::ERROR));
			assert!(!tracing::enabled!(Level::WARN));
		});
	}
}
