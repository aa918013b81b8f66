use std::fmt;

/// Which part of an address blew past the configured capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    VirtualPage,
    PhysicalPage,
    TlbIndex,
    CacheIndex,
}

impl AddressField {
    fn as_str(&self) -> &'static str {
        match self {
            AddressField::VirtualPage => "virtual page number",
            AddressField::PhysicalPage => "physical page number",
            AddressField::TlbIndex => "TLB index",
            AddressField::CacheIndex => "cache index",
        }
    }
}

/// Every way a simulation can fail. None of these are recoverable: the trace
/// and configuration don't describe the same machine, so the run stops.
#[derive(Debug)]
pub enum SimError {
    /// The configuration contradicts itself (e.g. TLBs without virtual addresses)
    ConfigInconsistency(String),
    /// A configuration value is out of range or not a power of two
    InvalidConfig(String),
    /// A well-formed record that asks for something the hierarchy can't do
    MalformedReference { addr: u32, reason: &'static str },
    /// A trace line that couldn't be tokenized at all
    MalformedTrace { line: usize, text: String },
    AddressOutOfRange { addr: u32, field: AddressField },
    Io(std::io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::ConfigInconsistency(msg) => write!(f, "inconsistent configuration: {msg}"),
            SimError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            SimError::MalformedReference { addr, reason } => {
                write!(f, "malformed reference at address {addr:08x}: {reason}")
            }
            SimError::MalformedTrace { line, text } => {
                write!(f, "malformed trace record on line {line}: {text:?}")
            }
            SimError::AddressOutOfRange { addr, field } => {
                write!(f, "address {addr:x} is too large ({} out of range)", field.as_str())
            }
            SimError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

// Lets `utils::error!` build config errors straight from a format string
impl From<String> for SimError {
    fn from(msg: String) -> Self {
        SimError::InvalidConfig(msg)
    }
}
