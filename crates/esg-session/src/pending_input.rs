#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInputKind {
    /// The reviewer must approve or reject the latest prompt.
    Confirmation,
    /// The reviewer rejected and the session now waits for the comment.
    ConfirmationWithComment,
}

impl PendingInputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmation => "confirmation",
            Self::ConfirmationWithComment => "confirmation_with_comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Armed,
    /// The server raised a prompt while another was still unresolved.
    Overwritten { previous: PendingInputKind },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Single-slot gate: a session is blocked on at most one human decision.
pub struct PendingInputGate {
    slot: Option<PendingInputKind>,
}

impl PendingInputGate {
    pub fn pending(&self) -> Option<PendingInputKind> {
        self.slot
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    pub fn awaiting_comment(&self) -> bool {
        self.slot == Some(PendingInputKind::ConfirmationWithComment)
    }

    /// Last write wins: arming an occupied slot resets it to a fresh confirmation.
    pub(crate) fn arm(&mut self) -> GateOutcome {
        match self.slot.replace(PendingInputKind::Confirmation) {
            Some(previous) => GateOutcome::Overwritten { previous },
            None => GateOutcome::Armed,
        }
    }

    pub(crate) fn enter_comment_mode(&mut self) -> bool {
        if self.slot.is_none() {
            return false;
        }
        self.slot = Some(PendingInputKind::ConfirmationWithComment);
        true
    }

    pub(crate) fn clear(&mut self) -> Option<PendingInputKind> {
        self.slot.take()
    }
}
