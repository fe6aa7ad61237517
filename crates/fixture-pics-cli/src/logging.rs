/// Initialize tracing according to `RUST_LOG` and `FIXTURE_PICS_LOG_FORMAT`.
///
/// Defaults to `warn` so regular runs only show the command's own output.
/// `FIXTURE_PICS_LOG_FORMAT=json` emits JSON lines instead of compact text.
/// Logs always go to stderr.
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("FIXTURE_PICS_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = registry.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = registry.with(fmt_layer.compact()).try_init();
        }
    }
}
