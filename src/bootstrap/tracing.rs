//! Tracing configuration
//!
//! Installs a global `tracing-subscriber` with an env-filter and one fmt
//! layer on stdout. `log` records emitted by the database adapters are
//! forwarded through the subscriber's log bridge.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Check if running in development environment
fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// - **Development**: debug for the adapters, info elsewhere
/// - **Production**: info everywhere, pool/migration chatter at warn
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    vec![
        "info".to_string(),
        if is_dev {
            "illu_infra=debug"
        } else {
            "illu_infra=info"
        }
        .to_string(),
        if is_dev {
            "illu_app=debug"
        } else {
            "illu_app=info"
        }
        .to_string(),
        if is_dev { "illu_core=debug" } else { "illu_core=info" }.to_string(),
        "r2d2=warn".to_string(),
    ]
}

/// Initialize the tracing subscriber with appropriate configuration
///
/// `RUST_LOG` overrides the default directives when set.
///
/// ## Call this / 调用位置
///
/// Once, at startup, before building any [`crate::Illustrated`]:
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     illustrated::init_tracing_subscriber()?;
///     let config = illustrated::load_config("illustrated.toml")?;
///     // ...
///     Ok(())
/// }
/// ```
///
/// ## Errors / 错误
///
/// Returns `Err` if a global subscriber is already registered.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives.join(",")));

    // "2025-01-15 10:30:45.123 INFO [file.rs:42] [target] message"
    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)));

    registry().with(env_filter).with(stdout_layer).try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_directives() {
        let dev_directives = build_filter_directives(true);
        assert!(dev_directives.contains(&"info".to_string()));
        assert!(dev_directives.contains(&"illu_infra=debug".to_string()));
        assert!(dev_directives.contains(&"illu_app=debug".to_string()));

        let prod_directives = build_filter_directives(false);
        assert!(prod_directives.contains(&"illu_infra=info".to_string()));
        assert!(prod_directives.contains(&"r2d2=warn".to_string()));
    }

    #[test]
    fn test_directives_parse_as_env_filter() {
        for is_dev in [true, false] {
            let joined = build_filter_directives(is_dev).join(",");
            assert!(EnvFilter::try_new(&joined).is_ok(), "bad directives: {}", joined);
        }
    }
}
