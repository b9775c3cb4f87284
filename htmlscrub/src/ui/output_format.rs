// htmlscrub/src/ui/output_format.rs
//! Styled status messages on stderr.
//!
//! Colors are applied only when the target stream is a terminal.

use std::io::{self, Write};

use is_terminal::IsTerminal;
use owo_colors::{AnsiColors, OwoColorize};

/// Kind of a status message, which decides its prefix and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warn,
    Error,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "done",
            Self::Warn => "warning",
            Self::Error => "error",
        }
    }

    fn color(self) -> AnsiColors {
        match self {
            Self::Info => AnsiColors::Blue,
            Self::Success => AnsiColors::Green,
            Self::Warn => AnsiColors::Yellow,
            Self::Error => AnsiColors::Red,
        }
    }
}

/// Writes `[prefix] message` to `writer`, colored when `use_color` is set.
pub fn print_message<W: Write>(writer: &mut W, kind: MessageKind, message: &str, use_color: bool) -> io::Result<()> {
    if use_color {
        let prefix = format!("[{}]", kind.prefix());
        writeln!(writer, "{} {}", prefix.color(kind.color()).bold(), message)
    } else {
        writeln!(writer, "[{}] {}", kind.prefix(), message)
    }
}

fn to_stderr(kind: MessageKind, message: &str) {
    let stderr = io::stderr();
    let use_color = stderr.is_terminal();
    let _ = print_message(&mut stderr.lock(), kind, message, use_color);
}

pub fn info_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Info, message.as_ref());
}

pub fn success_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Success, message.as_ref());
}

pub fn warn_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Warn, message.as_ref());
}

pub fn error_msg(message: impl AsRef<str>) {
    to_stderr(MessageKind::Error, message.as_ref());
}
