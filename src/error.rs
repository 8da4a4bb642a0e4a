//! Error types for virtual-stepper.
//!
//! Command handlers have no recoverable error channel: anything they detect is a
//! fatal fault that shuts the whole system down. Configuration and wire-text
//! parsing happen outside the real-time path and return ordinary errors.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all virtual-stepper operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// This call raised a fatal fault; every stepper has been stopped.
    Shutdown(ShutdownReason),
    /// The system was already shut down and refused the command.
    IsShutdown(ShutdownReason),
    /// Machine configuration parsing or validation error
    Config(ConfigError),
    /// Wire text command could not be parsed
    Parse(ParseError),
}

/// Reason attached to a fatal shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownReason {
    /// A move was queued with a step count of zero.
    InvalidCount,
    /// The step clock was reset while a move was executing.
    ResetWhileActive,
    /// The move pool had no free slot left.
    MoveQueueOverflow,
    /// The oid does not name a configured virtual stepper.
    InvalidOid,
    /// The oid is out of range or already configured.
    OidAssign,
    /// Shutdown was requested explicitly.
    Requested,
}

impl ShutdownReason {
    /// Static message reported to the host.
    pub const fn as_str(self) -> &'static str {
        match self {
            ShutdownReason::InvalidCount => "Invalid count parameter",
            ShutdownReason::ResetWhileActive => "Can't reset time when stepper active",
            ShutdownReason::MoveQueueOverflow => "Move queue overflow",
            ShutdownReason::InvalidOid => "Invalid oid type",
            ShutdownReason::OidAssign => "Can't assign oid",
            ShutdownReason::Requested => "Shutdown requested",
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Two stepper entries share an oid
    DuplicateOid(u8),
    /// Oid does not fit in the stepper registry
    OidOutOfRange {
        /// Offending oid
        oid: u8,
        /// Registry capacity
        capacity: usize,
    },
    /// More stepper entries than the registry can hold
    TooManySteppers(usize),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Wire text command parse errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Line held no command name
    Empty,
    /// Command name is not known
    UnknownCommand(heapless::String<32>),
    /// A required argument was not supplied
    MissingArgument(&'static str),
    /// Argument value is not a number or does not fit its type
    InvalidArgument(&'static str),
    /// Token is not of the form `key=value`
    MalformedToken,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Shutdown(reason) => write!(f, "Shutdown: {}", reason),
            Error::IsShutdown(reason) => write!(f, "System is shut down: {}", reason),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Parse(e) => write!(f, "Command parse error: {}", e),
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::DuplicateOid(oid) => write!(f, "Duplicate stepper oid: {}", oid),
            ConfigError::OidOutOfRange { oid, capacity } => {
                write!(f, "Stepper oid {} out of range (capacity {})", oid, capacity)
            }
            ConfigError::TooManySteppers(n) => write!(f, "Too many steppers configured: {}", n),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "Empty command line"),
            ParseError::UnknownCommand(name) => write!(f, "Unknown command '{}'", name),
            ParseError::MissingArgument(arg) => write!(f, "Missing argument '{}'", arg),
            ParseError::InvalidArgument(arg) => write!(f, "Invalid value for argument '{}'", arg),
            ParseError::MalformedToken => write!(f, "Expected key=value argument"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}
