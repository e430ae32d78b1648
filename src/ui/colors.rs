//! 24-bit RGB color theme for terminal output.

use owo_colors::Rgb;

/// Color palette of the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Success notices and healthy values - green (34, 197, 94)
    pub success: Rgb,
    /// Error notices - red (239, 68, 68)
    pub error: Rgb,
    /// Timeouts, validation problems, warning insights - yellow (234, 179, 8)
    pub warning: Rgb,
    /// Retry status lines - blue (59, 130, 246)
    pub in_progress: Rgb,
    /// Secondary text - gray (107, 114, 128)
    pub muted: Rgb,
    /// Names and headings - cyan (34, 211, 238)
    pub accent: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Rgb(34, 197, 94),
            error: Rgb(239, 68, 68),
            warning: Rgb(234, 179, 8),
            in_progress: Rgb(59, 130, 246),
            muted: Rgb(107, 114, 128),
            accent: Rgb(34, 211, 238),
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns false when the `NO_COLOR` environment variable is set.
pub fn color_allowed() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}
