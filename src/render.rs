//! Output rendering for the chat transcript.
//!
//! This module provides the renderer trait the chat session drives and a plain-text
//! implementation with optional ANSI styling.

use std::io::{self, Stdout, Write};

use crate::types::Role;

/// ANSI escape code for bold text (used for role labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for info lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the model label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for notices).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering the chat transcript.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Render a complete stored message with its role's visual identity.
    fn print_message(&mut self, role: Role, text: &str);

    /// Render the message the user just submitted.
    ///
    /// Interactive front ends that already show typed input can skip it.
    fn print_user_input(&mut self, text: &str) {
        self.print_message(Role::User, text);
    }

    /// Called before the first fragment of a model answer.
    fn start_response(&mut self);

    /// Print a chunk of answer text.
    ///
    /// This is called incrementally as fragments are streamed from the API.
    fn print_text(&mut self, text: &str);

    /// Called when an answer is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Print a one-line advisory shown alongside an answer.
    fn print_notice(&mut self, notice: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// Writes to stdout by default; any [`Write`] sink can be used instead.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    echo_input: bool,
    line_start: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            echo_input: true,
            line_start: true,
        }
    }

    /// Do not repeat submitted input; the line editor already shows it.
    pub fn without_input_echo(mut self) -> Self {
        self.echo_input = false;
        self
    }

    /// Consumes the renderer and returns its sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.line_start = text.ends_with('\n');
    }

    /// Writes `text` on its own line, in `color` when styling is on.
    fn write_line(&mut self, color: &str, text: &str) {
        if !self.line_start {
            self.write("\n");
        }
        if self.use_color {
            self.write(&format!("{color}{text}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("{text}\n"));
        }
    }

    fn label(&mut self, role: Role) {
        let (color, label) = match role {
            Role::User => (ANSI_CYAN, "You"),
            Role::Model => (ANSI_GREEN, "Assistant"),
        };
        if !self.line_start {
            self.write("\n");
        }
        if self.use_color {
            self.write(&format!("{ANSI_BOLD}{color}{label}:{ANSI_RESET} "));
        } else {
            self.write(&format!("{label}: "));
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, role: Role, text: &str) {
        self.label(role);
        self.write(text);
        if !self.line_start {
            self.write("\n");
        }
    }

    fn print_user_input(&mut self, text: &str) {
        if self.echo_input {
            self.print_message(Role::User, text);
        }
    }

    fn start_response(&mut self) {
        self.label(Role::Model);
    }

    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn finish_response(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }

    fn print_notice(&mut self, notice: &str) {
        self.write_line(ANSI_YELLOW, &format!("[i] {notice}"));
    }

    fn print_error(&mut self, error: &str) {
        self.write_line(ANSI_RED, &format!("Error: {error}"));
    }

    fn print_info(&mut self, info: &str) {
        self.write_line(ANSI_DIM, info);
    }
}
