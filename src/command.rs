//! Wire commands and responses.
//!
//! Commands use the firmware's text form: a command name followed by
//! `key=value` arguments in any order, e.g.
//! `virtual_queue_step oid=0 interval=1000 count=5 add=0`. Parsing happens in
//! task context before anything reaches the state machine, so a parse error is
//! an ordinary error and never a shutdown.

use core::fmt;
use core::str::FromStr;

use heapless::{String, Vec};

use crate::error::{Error, ParseError, Result, ShutdownReason};
use crate::motion::Direction;
use crate::stepper::{Position, StepperSystem};
use crate::timer::StepTimer;

/// Maximum number of `key=value` arguments on one line.
const MAX_ARGS: usize = 8;

/// One host command addressed to the virtual stepper system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `config_virtual_stepper oid=%c`
    ConfigVirtualStepper {
        /// Stepper oid
        oid: u8,
    },
    /// `virtual_queue_step oid=%c interval=%u count=%hu add=%hi`
    QueueStep {
        /// Stepper oid
        oid: u8,
        /// Ticks until the first step
        interval: u32,
        /// Number of steps
        count: u16,
        /// Per-step interval increment
        add: i16,
    },
    /// `virtual_set_next_step_dir oid=%c dir=%c`
    SetNextStepDir {
        /// Stepper oid
        oid: u8,
        /// Nonzero counts position up
        dir: u8,
    },
    /// `virtual_reset_step_clock oid=%c clock=%u`
    ResetStepClock {
        /// Stepper oid
        oid: u8,
        /// Absolute tick the next move is timed from
        clock: u32,
    },
    /// `virtual_stepper_get_position oid=%c`
    GetPosition {
        /// Stepper oid
        oid: u8,
    },
    /// `virtual_stepper_stop oid=%c`
    Stop {
        /// Stepper oid
        oid: u8,
    },
    /// `emergency_stop`
    EmergencyStop,
    /// `clear_shutdown`
    ClearShutdown,
}

impl Command {
    /// Declared wire formats of every command.
    pub const FORMATS: [&'static str; 8] = [
        "config_virtual_stepper oid=%c",
        "virtual_queue_step oid=%c interval=%u count=%hu add=%hi",
        "virtual_set_next_step_dir oid=%c dir=%c",
        "virtual_reset_step_clock oid=%c clock=%u",
        "virtual_stepper_get_position oid=%c",
        "virtual_stepper_stop oid=%c",
        "emergency_stop",
        "clear_shutdown",
    ];

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ConfigVirtualStepper { .. } => "config_virtual_stepper",
            Command::QueueStep { .. } => "virtual_queue_step",
            Command::SetNextStepDir { .. } => "virtual_set_next_step_dir",
            Command::ResetStepClock { .. } => "virtual_reset_step_clock",
            Command::GetPosition { .. } => "virtual_stepper_get_position",
            Command::Stop { .. } => "virtual_stepper_stop",
            Command::EmergencyStop => "emergency_stop",
            Command::ClearShutdown => "clear_shutdown",
        }
    }

    /// Parse one line of wire text.
    pub fn parse(line: &str) -> core::result::Result<Self, ParseError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ParseError::Empty)?;

        let mut args = Args::default();
        for token in tokens {
            let pair = token.split_once('=').ok_or(ParseError::MalformedToken)?;
            args.0.push(pair).map_err(|_| ParseError::MalformedToken)?;
        }

        let cmd = match name {
            "config_virtual_stepper" => Command::ConfigVirtualStepper {
                oid: args.get("oid")?,
            },
            "virtual_queue_step" => Command::QueueStep {
                oid: args.get("oid")?,
                interval: args.get("interval")?,
                count: args.get("count")?,
                add: args.get("add")?,
            },
            "virtual_set_next_step_dir" => Command::SetNextStepDir {
                oid: args.get("oid")?,
                dir: args.get("dir")?,
            },
            "virtual_reset_step_clock" => Command::ResetStepClock {
                oid: args.get("oid")?,
                clock: args.get("clock")?,
            },
            "virtual_stepper_get_position" => Command::GetPosition {
                oid: args.get("oid")?,
            },
            "virtual_stepper_stop" => Command::Stop {
                oid: args.get("oid")?,
            },
            "emergency_stop" => Command::EmergencyStop,
            "clear_shutdown" => Command::ClearShutdown,
            other => {
                return Err(ParseError::UnknownCommand(
                    String::try_from(other).unwrap_or_default(),
                ))
            }
        };
        Ok(cmd)
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Command::parse(s)
    }
}

#[derive(Default)]
struct Args<'a>(Vec<(&'a str, &'a str), MAX_ARGS>);

impl<'a> Args<'a> {
    fn get<T: FromStr>(&self, key: &'static str) -> core::result::Result<T, ParseError> {
        let (_, value) = self
            .0
            .iter()
            .find(|(k, _)| *k == key)
            .ok_or(ParseError::MissingArgument(key))?;
        value.parse().map_err(|_| ParseError::InvalidArgument(key))
    }
}

/// Reply to `virtual_stepper_get_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionReport {
    /// Stepper oid
    pub oid: u8,
    /// Position snapshot
    pub position: Position,
}

impl PositionReport {
    /// Position as sent on the wire: the raw counter reinterpreted as `i32`.
    #[inline]
    pub fn pos(&self) -> i32 {
        self.position.reported()
    }
}

/// Message sent back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// `stepper_position oid=%c pos=%i`
    StepperPosition(PositionReport),
    /// The system shut down.
    Shutdown(ShutdownReason),
}

impl Response {
    /// Response the host should see for a failed command, if any.
    pub fn for_error(error: &Error) -> Option<Self> {
        match error {
            Error::Shutdown(reason) | Error::IsShutdown(reason) => Some(Response::Shutdown(*reason)),
            _ => None,
        }
    }
}

impl fmt::Display for PositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stepper_position oid={} pos={}", self.oid, self.pos())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::StepperPosition(report) => report.fmt(f),
            Response::Shutdown(reason) => write!(f, "shutdown reason=\"{}\"", reason),
        }
    }
}

impl<const S: usize, const M: usize> StepperSystem<S, M> {
    /// Execute one decoded command.
    ///
    /// Returns the reply, if the command has one.
    pub fn dispatch<T: StepTimer>(&self, timer: &mut T, cmd: Command) -> Result<Option<Response>> {
        match cmd {
            Command::ConfigVirtualStepper { oid } => self.config_stepper(timer, oid)?,
            Command::QueueStep {
                oid,
                interval,
                count,
                add,
            } => self.queue_move(timer, oid, interval, count, add)?,
            Command::SetNextStepDir { oid, dir } => {
                self.set_next_direction(timer, oid, Direction::from_bit(dir != 0))?
            }
            Command::ResetStepClock { oid, clock } => self.reset_clock(timer, oid, clock)?,
            Command::GetPosition { oid } => {
                let report = self.get_position(timer, oid)?;
                return Ok(Some(Response::StepperPosition(report)));
            }
            Command::Stop { oid } => self.stop(timer, oid)?,
            Command::EmergencyStop => {
                let reason = self.shutdown(timer, ShutdownReason::Requested);
                return Ok(Some(Response::Shutdown(reason)));
            }
            Command::ClearShutdown => self.clear_shutdown(),
        }
        Ok(None)
    }

    /// Parse and execute one line of wire text.
    pub fn dispatch_line<T: StepTimer>(&self, timer: &mut T, line: &str) -> Result<Option<Response>> {
        let cmd = Command::parse(line)?;
        self.dispatch(timer, cmd)
    }
}
