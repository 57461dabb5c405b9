//! Process-wide ring buffer of log lines, written to by the macros below and dumped on demand.

use std::io::{self, Write};
use std::sync::Mutex;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    Gold,
    Gray,
}

impl Color {
    fn ansi(self) -> &'static str {
        match self {
            Color::Green => "\x1b[32m",
            Color::Red => "\x1b[31m",
            Color::Gold => "\x1b[33m",
            Color::Gray => "\x1b[90m",
        }
    }
}

#[macro_export]
macro_rules! notify {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Color::Green);
    }};
}

#[macro_export]
macro_rules! strong {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Color::Red);
    }};
}

#[macro_export]
macro_rules! warn {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Color::Gold);
    }};
}

#[macro_export]
macro_rules! trace {
    () => {};

    ($($arg:tt)*) => {{
        $crate::append(format!($($arg)*), $crate::Color::Gray);
    }};
}

/// Like [`warn!`] but also echoed to stderr, for problems the user should see right away.
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => {{
        let line = format!($($arg)*);
        eprintln!("{line}");
        $crate::append(line, $crate::Color::Gold);
    }};
}

/// Print the message to stderr and terminate with a non-zero exit code.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

pub static LOGGER: Lazy<Mutex<Logger<300>>> = Lazy::new(|| Mutex::new(Logger::new()));

/// Append a line to the global logger.
///
/// A poisoned lock still holds a usable ring buffer, so logging never panics.
pub fn append(line: String, color: Color) {
    let mut logger = match LOGGER.lock() {
        Ok(logger) => logger,
        Err(poisoned) => poisoned.into_inner(),
    };

    logger.append(line, color);
}

pub struct Logger<const N: usize> {
    lines: [(String, Color); N],
    head: usize,
    len: usize,
}

impl<const N: usize> Logger<N> {
    pub fn new() -> Self {
        Self {
            lines: std::array::from_fn(|_| (String::new(), Color::Gray)),
            head: 0,
            len: 0,
        }
    }

    pub fn append(&mut self, line: String, color: Color) {
        self.lines[self.head] = (line + "\n", color);
        self.head = (self.head + 1) % N;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len.min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn lines(&self) -> (&[(String, Color)], &[(String, Color)]) {
        if self.len < N {
            (&self.lines[0..self.len], &[])
        } else {
            // wrapped around, so we need to return two slices
            let (a, b) = self.lines.split_at(self.head);

            (b, a)
        }
    }

    /// Iterate over the buffered lines, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        let (a, b) = self.lines();
        a.iter().chain(b).map(|(line, color)| (line.as_str(), *color))
    }

    /// Write every buffered line to `out`, colored with ansi escapes when `colored` is set.
    pub fn dump<W: Write>(&self, out: &mut W, colored: bool) -> io::Result<()> {
        for (line, color) in self.iter() {
            if colored {
                write!(out, "{}{line}\x1b[0m", color.ansi())?;
            } else {
                out.write_all(line.as_bytes())?;
            }
        }

        out.flush()
    }
}

impl<const N: usize> Default for Logger<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        let mut logger = Logger::<3>::new();
        for idx in 0..5 {
            logger.append(format!("line {idx}"), Color::Gray);
        }

        let lines: Vec<&str> = logger.iter().map(|(line, _)| line).collect();
        assert_eq!(lines, ["line 2\n", "line 3\n", "line 4\n"]);
        assert_eq!(logger.len(), 3);
    }

    #[test]
    fn dump_plain() {
        let mut logger = Logger::<4>::new();
        logger.append("first".to_string(), Color::Green);
        logger.append("second".to_string(), Color::Red);

        let mut out = Vec::new();
        logger.dump(&mut out, false).unwrap();
        assert_eq!(out, b"first\nsecond\n");

        logger.clear();
        assert!(logger.is_empty());
    }
}
