use owo_colors::Style;
use std::sync::OnceLock;

use crate::storage::BackendKind;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for `formcraft` status lines. `Default` is unstyled.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub banner: Style,
    pub ok: Style,
    pub failure: Style,
    pub fallback: Style,
    pub label: Style,
    pub icon: Style,
}

impl Theme {
    /// Colored when `console` reports colors enabled (a tty, no `CLICOLOR=0`).
    pub fn detect() -> Self {
        if console::colors_enabled() {
            Self::colored()
        } else {
            Self::default()
        }
    }

    pub fn colored() -> Self {
        Self {
            banner: Style::new().cyan().bold(),
            ok: Style::new().green().bold(),
            failure: Style::new().red().bold(),
            fallback: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
            icon: Style::new().magenta(),
        }
    }

    /// Database storage reads as healthy, fallback storage as a warning.
    pub fn backend(&self, kind: BackendKind) -> &Style {
        if kind.is_fallback() { &self.fallback } else { &self.ok }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
