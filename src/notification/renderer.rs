//! Notice renderer for themed terminal panels.
//!
//! Turns notices into bordered panels using the color scheme from the UI
//! module. Errors are drawn in the error color with the category in the
//! header; success notices use the success color.

use std::time::Duration;

use owo_colors::{OwoColorize, Rgb};

use super::{Notice, NoticeKind};
use crate::error::{ErrorCategory, FailureReason};
use crate::ui::Theme;

/// Renderer for notice panels.
#[derive(Debug, Clone)]
pub struct NotificationRenderer {
    theme: Theme,
    /// Panel width (characters)
    width: usize,
    colored: bool,
}

impl Default for NotificationRenderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl NotificationRenderer {
    /// Creates a renderer with the given theme.
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            width: 60,
            colored: true,
        }
    }

    /// Sets the panel width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(20);
        self
    }

    /// Enables or disables ANSI colors.
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.colored {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_bold(&self, text: &str, color: Rgb) -> String {
        if self.colored {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn border_line(&self, color: Rgb) -> String {
        self.paint(&"─".repeat(self.width - 2), color)
    }

    /// Safely truncates a string to the given maximum character count.
    fn safe_truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            s.to_string()
        } else {
            let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", truncated)
        }
    }

    /// Wraps text on word boundaries to fit inside the panel.
    fn wrap(&self, text: &str) -> Vec<String> {
        let max = self.width.saturating_sub(4);
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            let word = Self::safe_truncate(word, max);
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn category_color(&self, category: ErrorCategory) -> Rgb {
        match category {
            ErrorCategory::Timeout | ErrorCategory::Validation => self.theme.warning,
            _ => self.theme.error,
        }
    }

    /// Renders a notice as a panel.
    pub fn render(&self, notice: &Notice) -> String {
        let (header, color) = match &notice.kind {
            NoticeKind::Error(error) => (
                format!("Error ({}) · {}", error.category, notice.action),
                self.category_color(error.category),
            ),
            NoticeKind::Success => ("Done".to_string(), self.theme.success),
        };
        let inner_width = self.width - 2;
        let mut output = String::new();

        output.push_str(&format!("{}\n", self.border_line(color)));
        let header = Self::safe_truncate(&header, inner_width.saturating_sub(2));
        output.push_str(&format!(" {}\n", self.paint_bold(&header, color)));
        output.push_str(&format!("{}\n", self.border_line(color)));

        for line in self.wrap(&notice.message) {
            output.push_str(&format!(" {}\n", line));
        }

        if notice.is_error() {
            let hint = format!("Dismisses in {}s", notice.display_for.as_secs());
            output.push_str(&format!(" {}\n", self.paint(&hint, self.theme.muted)));
        }

        output.push_str(&self.border_line(color));
        output
    }

    /// Renders a one-line retry status.
    pub fn render_retry(
        &self,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        failure: &FailureReason,
    ) -> String {
        let summary = Self::safe_truncate(&failure.to_string(), self.width.saturating_sub(30));
        let line = format!(
            "Retrying ({}/{}) in {}s: {}",
            attempt + 1,
            max_attempts,
            delay.as_secs(),
            summary
        );
        self.paint(&line, self.theme.in_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifiedError;
    use crate::notification::Notifier;

    fn plain() -> NotificationRenderer {
        NotificationRenderer::default().with_color(false)
    }

    #[test]
    fn test_render_error_panel() {
        let notifier = Notifier::new();
        notifier.report(ClassifiedError::new(ErrorCategory::Network, "load the dashboard"));
        let panel = plain().render(&notifier.active()[0]);

        assert!(panel.contains("Error (network) · load the dashboard"));
        assert!(panel.contains("Could not reach the server"));
        assert!(panel.contains("Dismisses in 8s"));
    }

    #[test]
    fn test_render_success_panel() {
        let notifier = Notifier::new();
        notifier.notify_success("Client Ana saved", "create a client");
        let panel = plain().render(&notifier.active()[0]);

        assert!(panel.contains("Done"));
        assert!(panel.contains("Client Ana saved"));
        assert!(!panel.contains("Dismisses"));
    }

    #[test]
    fn test_long_message_wraps() {
        let renderer = plain().with_width(30);
        let lines = renderer.wrap("one two three four five six seven eight nine ten");
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 26));
    }

    #[test]
    fn test_render_retry() {
        let line = plain().render_retry(
            1,
            3,
            Duration::from_secs(2),
            &FailureReason::http(503, ""),
        );
        assert_eq!(line, "Retrying (2/3) in 2s: HTTP 503");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        let truncated = NotificationRenderer::safe_truncate("ñññññññññ", 5);
        assert_eq!(truncated, "ññ...");
    }
}
