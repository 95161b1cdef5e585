use tracing_subscriber::EnvFilter;

pub fn init_logging(verbosity: u8) {
	// 0 = errors only (the step trace on stdout is the human surface)
	// 1 (-v) = library progress, including echoed engine launcher output
	// 2+ (-vv) = everything
	let filter = match verbosity {
		0 => "error",
		1 => "info,emrpilot=debug",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
