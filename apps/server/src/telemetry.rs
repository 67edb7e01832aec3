use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Startup and migration progress is logged by the workspace crates at info.
const DEFAULT_FILTER: &str =
    "warn,server=info,db_infra=info,migration=info,actix_web=info,sqlx=warn,sea_orm=warn";

/// JSON logs on stdout, filtered by `RUST_LOG` or [`DEFAULT_FILTER`].
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses_and_covers_workspace_crates() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        for krate in ["server=info", "db_infra=info", "migration=info"] {
            assert!(DEFAULT_FILTER.contains(krate), "missing {krate}");
        }
    }
}
