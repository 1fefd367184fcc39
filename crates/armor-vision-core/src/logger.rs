//! Log installation for binaries and tools built on the workspace.
//!
//! The requested level applies to the `armor_vision*` crates only; image and
//! runtime dependencies stay at `warn` or quieter. `RUST_LOG` directives are
//! applied on top, so `RUST_LOG=armor_vision_detect::snipe=trace` still works.

use env_logger::{Builder, Env};
use log::LevelFilter;

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Log targets that follow the requested level.
const WORKSPACE_TARGETS: [&str; 5] = [
    "armor_vision",
    "armor_vision_core",
    "armor_vision_detect",
    "armor_vision_nn",
    "armor_vision_predict",
];

/// Filter directives in the `RUST_LOG` syntax shared by `env_logger` and
/// `tracing_subscriber::EnvFilter`.
pub fn filter_directives(level: LevelFilter) -> String {
    let lower = |l: LevelFilter| l.as_str().to_ascii_lowercase();
    let mut out = lower(level.min(LevelFilter::Warn));
    for target in WORKSPACE_TARGETS {
        out.push(',');
        out.push_str(target);
        out.push('=');
        out.push_str(&lower(level));
    }
    out
}

/// `env_logger` builder with the workspace filter and millisecond stamps.
/// The environment is not consulted.
pub fn log_builder(level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder
        .parse_filters(&filter_directives(level))
        .format_timestamp_millis();
    builder
}

/// Install the stderr logger. Fails if a `log` logger is already set.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log_builder(level).parse_env(Env::default()).try_init()
}

/// Install a `tracing` subscriber with the same per-crate filter as
/// [`init_with_level`]. A set `RUST_LOG` replaces the filter entirely.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &env_logger::Logger, level: Level, target: &str) -> bool {
        logger.enabled(&Metadata::builder().level(level).target(target).build())
    }

    #[test]
    fn directives_name_every_workspace_crate() {
        let d = filter_directives(LevelFilter::Debug);
        assert!(d.starts_with("warn,"));
        for target in WORKSPACE_TARGETS {
            assert!(d.contains(&format!("{target}=debug")), "{d}");
        }
        assert!(filter_directives(LevelFilter::Off).starts_with("off,"));
    }

    #[test]
    fn level_applies_to_workspace_crates_only() {
        let logger = log_builder(LevelFilter::Debug).build();
        assert_eq!(logger.filter(), LevelFilter::Debug);
        assert!(enabled(&logger, Level::Debug, "armor_vision_detect::snipe"));
        assert!(!enabled(&logger, Level::Trace, "armor_vision_detect::snipe"));
        assert!(!enabled(&logger, Level::Debug, "imageproc::contours"));
        assert!(enabled(&logger, Level::Warn, "imageproc::contours"));
    }

    #[test]
    fn quiet_levels_also_quiet_dependencies() {
        let logger = log_builder(LevelFilter::Error).build();
        assert!(enabled(&logger, Level::Error, "armor_vision_nn::engine"));
        assert!(!enabled(&logger, Level::Warn, "armor_vision_nn::engine"));
        assert!(!enabled(&logger, Level::Warn, "image"));
    }
}
