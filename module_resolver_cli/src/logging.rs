use std::io::IsTerminal;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

const DEBUG_ENV_VAR: &str = "MODULES_DEBUG";

/// Initializes the logging system; a no-op unless `MODULES_DEBUG` is set (spec §6.4: "an
/// environment debug switch enabling verbose tracing").
pub(crate) fn initialize() {
    if std::env::var_os(DEBUG_ENV_VAR).is_none() {
        return;
    }

    let enable_ansi = std::io::stdout().is_terminal();
    let format = fmt::format()
        .with_ansi(enable_ansi)
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .compact();

    let filter = EnvFilter::new("module_resolver=debug,module_resolver_cli=debug");
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .fmt_fields(fmt::format::DefaultFields::new())
        .event_format(format)
        .init();
}
