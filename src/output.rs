//! Console rendering.
//!
//! Three styles, matching the hook's historical look: `error` (bold white on
//! red) for violations, `warning` (bold black on yellow) for configuration
//! problems, `good` (bold white on green) for progress and post-push notes.
//! Errors and warnings go to stderr so git surfaces them prominently; good
//! news goes to stdout.
//!
//! Blank messages are never printed. Color is handled by `colored`, which
//! already backs off when the stream is not a terminal or `NO_COLOR` is set.

use colored::Colorize;

/// Styled console for the hook's three message kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl Console {
    /// Print a violation message to stderr.
    pub fn error(&self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        eprintln!("{}\n", message.white().on_red().bold());
    }

    /// Print a configuration warning to stderr.
    pub fn warning(&self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        eprintln!("{}\n", message.black().on_yellow().bold());
    }

    /// Print a progress or post-push message to stdout.
    pub fn good(&self, message: &str) {
        let message = message.trim();
        if message.is_empty() {
            return;
        }
        println!("{}\n", message.white().on_green().bold());
    }
}
