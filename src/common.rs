// Licensed under the Apache-2.0 license

//! Crate-wide logging hooks.
//!
//! Drivers take a `Logger` type parameter that defaults to [`NoOpLogger`], so
//! diagnostics cost nothing unless a board wires a sink in. [`WriterLogger`]
//! forwards lines to any `embedded_io::Write` implementation (typically a
//! UART).
//!
//! Log output is advisory: a failing sink never changes driver behaviour.

use embedded_io::Write;

/// Diagnostic sink used by the drivers in this crate.
pub trait Logger {
    /// Report progress or state useful while bringing up a board.
    fn debug(&mut self, msg: &str);

    /// Report a failed operation. The error itself is still returned to the caller.
    fn error(&mut self, msg: &str);
}

/// Logger that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Logger writing `<tag>: <message>` lines to an `embedded_io::Write` sink.
pub struct WriterLogger<W: Write> {
    writer: W,
    tag: &'static str,
}

impl<W: Write> WriterLogger<W> {
    /// Create a logger prefixing every line with `tag`.
    pub fn new(writer: W, tag: &'static str) -> Self {
        Self { writer, tag }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, level: &str, msg: &str) {
        // Write errors are swallowed on purpose; logging must not fail an operation.
        let _ = write!(self.writer, "{}: [{}] {}\r\n", self.tag, level, msg);
    }
}

impl<W: Write> Logger for WriterLogger<W> {
    fn debug(&mut self, msg: &str) {
        self.line("debug", msg);
    }

    fn error(&mut self, msg: &str) {
        self.line("error", msg);
    }
}

impl<T: Logger + ?Sized> Logger for &mut T {
    fn debug(&mut self, msg: &str) {
        (**self).debug(msg);
    }

    fn error(&mut self, msg: &str) {
        (**self).error(msg);
    }
}
