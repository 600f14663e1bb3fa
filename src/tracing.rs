//! Tracing initialization.
//!
//! Logs always go to stderr: stdout carries the MCP protocol.
//! `RUST_LOG` controls filtering; `RUSTDOC_IMPLEMENTORS_LOG=json` switches to
//! JSON lines.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, util::SubscriberInitExt};

/// Environment variable selecting the log format (`json` or anything else for compact).
pub const LOG_FORMAT_ENV: &str = "RUSTDOC_IMPLEMENTORS_LOG";

static INIT: Once = Once::new();

/// Initialize tracing. Safe to call multiple times.
pub fn init() {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let level = if is_test {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };
        let filter = EnvFilter::from_default_env().add_directive(level.into());
        let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_span_events(FmtSpan::NONE);

        let result = if is_test {
            builder.compact().with_test_writer().finish().try_init()
        } else if json {
            builder.json().with_writer(std::io::stderr).finish().try_init()
        } else {
            builder.compact().with_writer(std::io::stderr).finish().try_init()
        };

        if let Err(e) = result {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
