use std::io::Write;
use std::sync::mpsc::Sender;

use serde_json::{json, Value};

use crate::errors::BoardError;
use crate::worker::WorkerId;

pub const KIND_INCREMENT_WORKER: u64 = 0;
pub const KIND_SET_STATUS: u64 = 1;
pub const KIND_SET_STEPS: u64 = 2;
pub const KIND_SET_VALUE: u64 = 3;
pub const KIND_INCREMENT_APP: u64 = 4;
pub const KIND_SET_APP_STEPS: u64 = 5;
pub const KIND_RESET_START: u64 = 6;

/// Progress report from a worker, matched exhaustively by the router.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    IncrementWorker { id: WorkerId, amount: f64 },
    SetStatus { id: WorkerId, status: String },
    SetSteps { id: WorkerId, steps: f64 },
    SetValue { id: WorkerId, value: f64 },
    IncrementApp { amount: f64 },
    SetAppSteps { steps: f64 },
    ResetStart { id: WorkerId },
}

impl Command {
    /// Wire shape is an unversioned `[kind, target, value]` tuple, one per
    /// line; the target is null for app-level commands.
    pub fn to_wire_line(&self) -> String {
        let tuple = match self {
            Self::IncrementWorker { id, amount } => json!([KIND_INCREMENT_WORKER, id, amount]),
            Self::SetStatus { id, status } => json!([KIND_SET_STATUS, id, status]),
            Self::SetSteps { id, steps } => json!([KIND_SET_STEPS, id, steps]),
            Self::SetValue { id, value } => json!([KIND_SET_VALUE, id, value]),
            Self::IncrementApp { amount } => json!([KIND_INCREMENT_APP, Value::Null, amount]),
            Self::SetAppSteps { steps } => json!([KIND_SET_APP_STEPS, Value::Null, steps]),
            Self::ResetStart { id } => json!([KIND_RESET_START, id, Value::Null]),
        };
        tuple.to_string()
    }
}

pub fn parse_wire_line(line: &str) -> Result<Command, BoardError> {
    let value: Value =
        serde_json::from_str(line).map_err(|error| malformed(line, &error.to_string()))?;
    let tuple = value
        .as_array()
        .ok_or_else(|| malformed(line, "not a tuple"))?;
    if tuple.len() != 3 {
        return Err(malformed(line, "wrong tuple arity"));
    }

    let kind = tuple[0]
        .as_u64()
        .ok_or_else(|| malformed(line, "kind is not an integer"))?;
    let target = || -> Result<WorkerId, BoardError> {
        tuple[1]
            .as_u64()
            .and_then(|id| WorkerId::try_from(id).ok())
            .ok_or_else(|| malformed(line, "target is not a pid"))
    };
    let number = || -> Result<f64, BoardError> {
        tuple[2]
            .as_f64()
            .ok_or_else(|| malformed(line, "value is not a number"))
    };

    match kind {
        KIND_INCREMENT_WORKER => Ok(Command::IncrementWorker {
            id: target()?,
            amount: number()?,
        }),
        KIND_SET_STATUS => Ok(Command::SetStatus {
            id: target()?,
            status: tuple[2]
                .as_str()
                .ok_or_else(|| malformed(line, "status is not a string"))?
                .to_string(),
        }),
        KIND_SET_STEPS => Ok(Command::SetSteps {
            id: target()?,
            steps: number()?,
        }),
        KIND_SET_VALUE => Ok(Command::SetValue {
            id: target()?,
            value: number()?,
        }),
        KIND_INCREMENT_APP => Ok(Command::IncrementApp { amount: number()? }),
        KIND_SET_APP_STEPS => Ok(Command::SetAppSteps { steps: number()? }),
        KIND_RESET_START => Ok(Command::ResetStart { id: target()? }),
        other => Err(malformed(line, &format!("unknown kind {other}"))),
    }
}

fn malformed(line: &str, reason: &str) -> BoardError {
    BoardError::MalformedCommand(format!(
        "{reason}; line={}",
        line.chars().take(256).collect::<String>()
    ))
}

/// In-process producer handle. Clones share the dashboard's channel; sends
/// only enqueue, they never touch dashboard state or the terminal.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    pub(crate) fn new(tx: Sender<Command>) -> Self {
        Self { tx }
    }

    pub fn send(&self, command: Command) -> Result<(), BoardError> {
        self.tx
            .send(command)
            .map_err(|_| BoardError::Channel("dashboard command channel closed".to_string()))
    }

    pub fn increment(&self, id: WorkerId, amount: f64) -> Result<(), BoardError> {
        self.send(Command::IncrementWorker { id, amount })
    }

    pub fn set_status(&self, id: WorkerId, status: impl Into<String>) -> Result<(), BoardError> {
        self.send(Command::SetStatus {
            id,
            status: status.into(),
        })
    }

    pub fn set_steps(&self, id: WorkerId, steps: f64) -> Result<(), BoardError> {
        self.send(Command::SetSteps { id, steps })
    }

    pub fn set_value(&self, id: WorkerId, value: f64) -> Result<(), BoardError> {
        self.send(Command::SetValue { id, value })
    }

    pub fn reset_start(&self, id: WorkerId) -> Result<(), BoardError> {
        self.send(Command::ResetStart { id })
    }

    pub fn increment_app(&self, amount: f64) -> Result<(), BoardError> {
        self.send(Command::IncrementApp { amount })
    }

    pub fn set_app_steps(&self, steps: f64) -> Result<(), BoardError> {
        self.send(Command::SetAppSteps { steps })
    }
}

/// Worker-process producer face: writes wire lines to the pipe the dashboard
/// reads on the other side.
#[derive(Debug)]
pub struct WireWriter<W: Write> {
    out: W,
}

impl<W: Write> WireWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn send(&mut self, command: &Command) -> Result<(), BoardError> {
        writeln!(self.out, "{}", command.to_wire_line())
            .map_err(|error| BoardError::Io(error.to_string()))?;
        self.out
            .flush()
            .map_err(|error| BoardError::Io(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_wire_line, Command, WireWriter};

    #[test]
    fn worker_commands_survive_the_wire() {
        let command = Command::SetStatus {
            id: 4242,
            status: "Iteration #9".to_string(),
        };
        assert_eq!(
            parse_wire_line(&command.to_wire_line()).expect("parse"),
            command
        );

        let command = Command::IncrementWorker {
            id: 4242,
            amount: 2.5,
        };
        assert_eq!(
            parse_wire_line(&command.to_wire_line()).expect("parse"),
            command
        );
    }

    #[test]
    fn app_commands_carry_a_null_target() {
        let line = Command::IncrementApp { amount: 1.0 }.to_wire_line();
        assert_eq!(line, "[4,null,1.0]");
        assert_eq!(
            parse_wire_line(&line).expect("parse"),
            Command::IncrementApp { amount: 1.0 }
        );
    }

    #[test]
    fn malformed_lines_are_rejected_not_panicked() {
        for line in [
            "",
            "{\"kind\":0}",
            "[0,1]",
            "[0,1,2,3]",
            "[\"zero\",1,2]",
            "[99,1,2]",
            "[1,7,42]",
            "[0,\"pid\",1]",
            "[0,1,\"much\"]",
        ] {
            assert!(parse_wire_line(line).is_err(), "accepted {line:?}");
        }
    }

    #[test]
    fn wire_writer_emits_one_line_per_command() {
        let mut buffer = Vec::new();
        {
            let mut wire = WireWriter::new(&mut buffer);
            wire.send(&Command::SetAppSteps { steps: 50.0 }).expect("send");
            wire.send(&Command::ResetStart { id: 1 }).expect("send");
        }
        let text = String::from_utf8(buffer).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        for line in lines {
            parse_wire_line(line).expect("round trip");
        }
    }
}
