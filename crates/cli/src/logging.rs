use tracing_subscriber::EnvFilter;

/// Installs the compact stderr subscriber.
///
/// Every event carries an explicit `viewerq.*` target (`viewerq.queue`,
/// `viewerq.config`, `viewerq.auth`, `viewerq.supervisor`, `viewerq.chat`).
/// The `-v` count raises only those; dependencies such as hyper or tungstenite
/// stay at `warn`. `RUST_LOG` replaces the whole filter.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.compact()
		.init();
}

fn default_directives(verbosity: u8) -> String {
	let level = match verbosity {
		0 => return "warn".to_string(),
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	format!("warn,viewerq={level}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_only_raises_viewerq_targets() {
		assert_eq!(default_directives(0), "warn");
		assert_eq!(default_directives(1), "warn,viewerq=info");
		assert_eq!(default_directives(2), "warn,viewerq=debug");
		assert_eq!(default_directives(7), "warn,viewerq=trace");
	}

	#[test]
	fn directives_parse_as_a_filter() {
		for verbosity in 0..4 {
			assert!(EnvFilter::try_new(default_directives(verbosity)).is_ok());
		}
	}
}
