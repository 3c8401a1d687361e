use metric::Point;
use sink::{Error, Sink};
use std::io::{self, Write};

/// Console sink
///
/// Prints every point of a batch as a line of InfluxDB line protocol. Used
/// when no store is configured, or alongside the store when running
/// verbosely.
pub struct Console {
    out: Box<Write + Send>,
}

impl Default for Console {
    fn default() -> Console {
        Console::new()
    }
}

impl Console {
    /// Create a console sink writing to stdout.
    pub fn new() -> Console {
        Console::with_writer(Box::new(io::stdout()))
    }

    /// Create a console sink writing to `out`.
    pub fn with_writer(out: Box<Write + Send>) -> Console {
        Console { out: out }
    }
}

impl Sink for Console {
    fn name(&self) -> &'static str {
        "console"
    }

    fn deliver(&mut self, batch: &[Point]) -> Result<(), Error> {
        for point in batch {
            writeln!(self.out, "{}", point)?;
        }
        self.out.flush()?;
        Ok(())
    }
}
