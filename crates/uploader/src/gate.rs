//! Join of "source exhausted" and "last append acknowledged".
//!
//! The two events may arrive in either order. FINALIZE must go out exactly
//! once, after both have happened, so the session routes every event through
//! this single state value instead of a pair of flags.

/// Where the session stands with respect to finalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionGate {
    /// No append outstanding; the source may still produce chunks.
    #[default]
    Streaming,
    /// An append is outstanding; the source may still produce chunks.
    AwaitingAppend,
    /// An append is outstanding and the source has nothing left.
    StreamEndedAwaitingAppend,
    /// Both conditions met. Terminal.
    Finalizing,
}

/// What the session should do after feeding an event to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Pull the next chunk.
    Continue,
    /// Nothing to do until the other event arrives.
    Wait,
    /// Send FINALIZE now. Returned at most once per gate.
    Finalize,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// An APPEND was just sent.
    pub fn append_started(&mut self) -> GateAction {
        match self {
            CompletionGate::Streaming => {
                *self = CompletionGate::AwaitingAppend;
                GateAction::Wait
            }
            // One outstanding append at a time.
            other => {
                debug_assert!(
                    matches!(other, CompletionGate::Finalizing),
                    "append started while another is outstanding"
                );
                GateAction::Wait
            }
        }
    }

    /// The outstanding APPEND came back successfully.
    pub fn append_acked(&mut self) -> GateAction {
        match self {
            CompletionGate::AwaitingAppend => {
                *self = CompletionGate::Streaming;
                GateAction::Continue
            }
            CompletionGate::StreamEndedAwaitingAppend => {
                *self = CompletionGate::Finalizing;
                GateAction::Finalize
            }
            CompletionGate::Streaming | CompletionGate::Finalizing => GateAction::Wait,
        }
    }

    /// The chunk source reported that it has nothing left.
    pub fn source_exhausted(&mut self) -> GateAction {
        match self {
            CompletionGate::Streaming => {
                *self = CompletionGate::Finalizing;
                GateAction::Finalize
            }
            CompletionGate::AwaitingAppend => {
                *self = CompletionGate::StreamEndedAwaitingAppend;
                GateAction::Wait
            }
            CompletionGate::StreamEndedAwaitingAppend | CompletionGate::Finalizing => {
                GateAction::Wait
            }
        }
    }

    pub fn is_finalizing(&self) -> bool {
        matches!(self, CompletionGate::Finalizing)
    }
}
