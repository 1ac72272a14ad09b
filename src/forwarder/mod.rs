//! Message forwarding module.
//!
//! Holds the pipeline that republishes source-group messages and the state
//! it shares with the admin commands.

mod pipeline;
mod state;

pub use pipeline::{FilterReason, ForwardOutcome, ForwardingPipeline, SkipReason};
pub use state::{
    COMMAND_HISTORY_CAPACITY, CommandLog, CommandRecord, Counters, ERROR_LOG_CAPACITY, ErrorKind,
    ErrorLog, ErrorRecord, PipelineState, RingLog, RunState,
};
