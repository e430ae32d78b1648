//! Terminal output for the console.
//!
//! Provides the 24-bit color theme, views of backend data and the markdown
//! emphasis used in agent replies.

mod colors;
pub mod markdown;
mod views;

pub use colors::{color_allowed, Theme};
pub use views::ConsoleView;
