//! # Output Configuration
//!
//! Utilities for controlling CLI output appearance and for routing output
//! away from the library core.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Sinks
//!
//! Commands never print directly. They receive an [`OutputSink`]:
//! [`TerminalSink`] writes status lines to stderr and machine-readable
//! output to stdout, [`MemorySink`] collects everything for tests.
//!
//! ```rust,ignore
//! use shiplog::output::{OutputConfig, TerminalSink, OutputSink};
//!
//! let sink = TerminalSink::new(OutputConfig::from_env_and_flag("auto"));
//! sink.success("Created entry fix-a");
//! ```

use std::cell::RefCell;
use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stderr is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stderr().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Destination for everything a command wants to tell the user.
pub trait OutputSink {
    /// Progress and informational status.
    fn info(&self, message: &str);
    /// A completed action.
    fn success(&self, message: &str);
    /// Something the user should look at, without failing the command.
    fn warn(&self, message: &str);
    /// Primary command output: tables, cards, JSON, notes.
    fn emit(&self, text: &str);
    /// Output configuration for callers that format their own text.
    fn config(&self) -> &OutputConfig;
}

/// Writes status lines to stderr and primary output to stdout.
#[derive(Debug, Clone)]
pub struct TerminalSink {
    config: OutputConfig,
}

impl TerminalSink {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }
}

impl OutputSink for TerminalSink {
    fn info(&self, message: &str) {
        eprintln!("{} {}", emoji(&self.config, "ℹ️", "[INFO]"), message);
    }

    fn success(&self, message: &str) {
        if self.config.use_color {
            eprintln!("✅ {}", style(message).green());
        } else {
            eprintln!("[OK] {}", message);
        }
    }

    fn warn(&self, message: &str) {
        if self.config.use_color {
            eprintln!("⚠️  {}", style(message).yellow());
        } else {
            eprintln!("[WARN] {}", message);
        }
    }

    fn emit(&self, text: &str) {
        println!("{}", text);
    }

    fn config(&self) -> &OutputConfig {
        &self.config
    }
}

/// Which [`OutputSink`] method produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Info,
    Success,
    Warn,
    Emit,
}

/// Collects output in memory.
#[derive(Debug)]
pub struct MemorySink {
    config: OutputConfig,
    lines: RefCell<Vec<(Channel, String)>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            config: OutputConfig::without_color(),
            lines: RefCell::new(Vec::new()),
        }
    }

    /// Every recorded line with its channel.
    pub fn lines(&self) -> Vec<(Channel, String)> {
        self.lines.borrow().clone()
    }

    /// Lines recorded on one channel.
    pub fn channel(&self, channel: Channel) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Everything written through [`OutputSink::emit`], joined by newlines.
    pub fn emitted(&self) -> String {
        self.channel(Channel::Emit).join("\n")
    }

    fn push(&self, channel: Channel, message: &str) {
        self.lines.borrow_mut().push((channel, message.to_string()));
    }
}

impl OutputSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(Channel::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(Channel::Success, message);
    }

    fn warn(&self, message: &str) {
        self.push(Channel::Warn, message);
    }

    fn emit(&self, text: &str) {
        self.push(Channel::Emit, text);
    }

    fn config(&self) -> &OutputConfig {
        &self.config
    }
}
