//! Terminal display system
//!
//! User-facing communication kept apart from logging: semantic status lines
//! and per-mod progress, styled for what the terminal supports.

use crate::primitives::ConfigError;
use std::sync::OnceLock;

pub mod progress;
pub mod status;
pub mod styling;

pub use progress::{CliProgress, ProgressTracker};
pub use status::StatusDisplay;
pub use styling::StyleManager;

static GLOBAL_DISPLAY: OnceLock<Display> = OnceLock::new();

/// Display manager holding the resolved styling
#[derive(Debug)]
pub struct Display {
    styling: StyleManager,
    interactive: bool,
}

impl Display {
    /// Initialize the global display
    pub fn init(colors: bool, interactive: bool) -> Result<&'static Self, ConfigError> {
        let unicode = console::Term::stdout().features().wants_emoji();
        let display = Display {
            styling: StyleManager::new(colors, unicode),
            interactive,
        };

        GLOBAL_DISPLAY
            .set(display)
            .map_err(|_| ConfigError::AlreadyInitialized)?;

        GLOBAL_DISPLAY.get().ok_or(ConfigError::AlreadyInitialized)
    }

    /// Global display, falling back to plain output when never initialized
    pub fn global() -> &'static Self {
        GLOBAL_DISPLAY.get_or_init(|| Display {
            styling: StyleManager::plain(),
            interactive: false,
        })
    }

    pub fn status() -> StatusDisplay<'static> {
        StatusDisplay::new(&Self::global().styling)
    }

    /// Progress renderer for an update run; bars only on interactive terminals
    pub fn run_progress() -> CliProgress<'static> {
        let display = Self::global();
        CliProgress::new(&display.styling, display.interactive)
    }

    pub fn styling() -> &'static StyleManager {
        &Self::global().styling
    }
}
