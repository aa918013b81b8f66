use std::io::{BufRead, Lines};

use crate::error::SimError;

/// Which side of the split caches/TLBs a reference goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Instruction,
    Data,
}

impl Stream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Instruction => "inst",
            Stream::Data => "data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// An input event to the memory simulation
///
/// Implicitly, `addr` is either physical or virtual depending on the program config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub stream: Stream,
    pub access: Access,
    pub addr: u32,
}

impl Reference {
    pub fn new(stream: Stream, access: Access, addr: u32) -> Self {
        Reference { stream, access, addr }
    }

    /// Tokenizes one `S:A:HEX` record, e.g. `I:R:0c84` or `D:W:fe0`
    pub fn parse(line: &str) -> Option<Reference> {
        let mut fields = line.trim().splitn(3, ':');
        let stream = match fields.next()?.trim() {
            "I" | "i" => Stream::Instruction,
            "D" | "d" => Stream::Data,
            _ => return None,
        };
        let access = match fields.next()?.trim() {
            "R" | "r" => Access::Read,
            "W" | "w" => Access::Write,
            _ => return None,
        };
        let hex = fields.next()?.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let addr = u32::from_str_radix(hex, 16).ok()?;
        Some(Reference { stream, access, addr })
    }
}

/// Reads in the trace line by line, yielding a Reference for every record.
///
/// Blank lines are skipped; anything else that doesn't tokenize is an error.
pub struct TraceReader<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        TraceReader { lines: reader.lines(), line_no: 0 }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<Reference, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(Reference::parse(&line).ok_or_else(|| SimError::MalformedTrace {
                line: self.line_no,
                text: line,
            }));
        }
    }
}
