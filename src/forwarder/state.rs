//! Pipeline state: run flag, counters, the recent-error ring buffer and the
//! admin command history.
//!
//! Everything here is memory-only and starts fresh on every launch.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Local, TimeDelta};

/// Number of error records kept for `/logs`.
pub const ERROR_LOG_CAPACITY: usize = 50;

/// Number of admin commands remembered.
pub const COMMAND_HISTORY_CAPACITY: usize = 100;

/// Whether inbound messages are being forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// What kind of operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sending a cleaned message to the destination group.
    Forward,

    /// Replying to the admin.
    AdminReply,

    /// Receiving updates from Telegram.
    Updates,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "Forward failed",
            Self::AdminReply => "Admin reply failed",
            Self::Updates => "Update stream error",
        })
    }
}

/// One non-fatal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Local>,

    pub kind: ErrorKind,

    /// Source message id, when the failure concerned a message.
    pub message_id: Option<i32>,

    pub message: String,
}

/// One authorized admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub timestamp: DateTime<Local>,
    pub command: String,
}

/// Fixed-capacity log that evicts its oldest entry when full.
#[derive(Debug, Clone)]
pub struct RingLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

/// Recent failures shown by `/logs`.
pub type ErrorLog = RingLog<ErrorRecord>;

/// Recent admin commands.
pub type CommandLog = RingLog<CommandRecord>;

impl<T> RingLog<T> {
    /// Creates an empty log holding at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest one if the log is full.
    pub fn push(&mut self, record: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    /// The `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ErrorLog {
    /// Number of records newer than `cutoff`.
    #[must_use]
    pub fn count_since(&self, cutoff: DateTime<Local>) -> usize {
        self.entries.iter().filter(|r| r.timestamp > cutoff).count()
    }
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Messages that passed the run/source gate.
    pub processed: u64,
    pub forwarded: u64,
    pub filtered: u64,
    pub errors: u64,
}

impl Counters {
    /// Share of processed messages that were forwarded, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.forwarded as f64 / self.processed as f64 * 100.0
        }
    }
}

/// Process-wide mutable state of the forwarding pipeline.
#[derive(Debug)]
pub struct PipelineState {
    run_state: RunState,

    /// Process start, for uptime.
    started_at: DateTime<Local>,

    /// Start of the current counting period (process start or last reset).
    stats_since: DateTime<Local>,

    last_forwarded_at: Option<DateTime<Local>>,

    counters: Counters,

    errors: ErrorLog,

    commands: CommandLog,
}

impl Default for PipelineState {
    fn default() -> Self {
        let now = Local::now();
        Self {
            run_state: RunState::Stopped,
            started_at: now,
            stats_since: now,
            last_forwarded_at: None,
            counters: Counters::default(),
            errors: ErrorLog::with_capacity(ERROR_LOG_CAPACITY),
            commands: CommandLog::with_capacity(COMMAND_HISTORY_CAPACITY),
        }
    }
}

impl PipelineState {
    /// Creates stopped state with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    /// Switches to running. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        let changed = self.run_state == RunState::Stopped;
        self.run_state = RunState::Running;
        changed
    }

    /// Switches to stopped. Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        let changed = self.run_state == RunState::Running;
        self.run_state = RunState::Stopped;
        changed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    #[must_use]
    pub fn stats_since(&self) -> DateTime<Local> {
        self.stats_since
    }

    #[must_use]
    pub fn last_forwarded_at(&self) -> Option<DateTime<Local>> {
        self.last_forwarded_at
    }

    /// Time since the process started; resets do not affect it.
    #[must_use]
    pub fn uptime(&self) -> TimeDelta {
        Local::now() - self.started_at
    }

    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    #[must_use]
    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    #[must_use]
    pub fn commands(&self) -> &CommandLog {
        &self.commands
    }

    /// A message was dropped by a filter.
    pub fn record_filtered(&mut self) {
        self.counters.processed += 1;
        self.counters.filtered += 1;
    }

    /// A message was delivered to the destination.
    pub fn record_forwarded(&mut self) {
        self.counters.processed += 1;
        self.counters.forwarded += 1;
        self.last_forwarded_at = Some(Local::now());
    }

    /// Delivering a message failed.
    pub fn record_failure(&mut self, message_id: i32, error: impl Into<String>) {
        self.counters.processed += 1;
        self.record_error(ErrorKind::Forward, Some(message_id), error);
    }

    /// Records a non-fatal error.
    pub fn record_error(
        &mut self,
        kind: ErrorKind,
        message_id: Option<i32>,
        error: impl Into<String>,
    ) {
        self.counters.errors += 1;
        self.errors.push(ErrorRecord {
            timestamp: Local::now(),
            kind,
            message_id,
            message: error.into(),
        });
    }

    /// Remembers an authorized admin command.
    pub fn record_command(&mut self, command: impl Into<String>) {
        self.commands.push(CommandRecord {
            timestamp: Local::now(),
            command: command.into(),
        });
    }

    /// Zeroes every counter and empties the error log and command history.
    /// The run state and process uptime are kept.
    pub fn reset_stats(&mut self) {
        self.counters = Counters::default();
        self.errors.clear();
        self.commands.clear();
        self.last_forwarded_at = None;
        self.stats_since = Local::now();
    }
}
