use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of an interaction. `Pending` is the only state with outgoing
/// transitions; `Accepted` and `Rejected` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Pending,
    Accepted,
    Rejected,
}

/// The only two moves out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("interaction is already {0}; terminal states are final")]
    Terminal(InteractionStatus),

    #[error("cannot move an interaction from {from} to {to}")]
    NotAllowed {
        from: InteractionStatus,
        to: InteractionStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}'")]
pub struct ParseStatusError(pub String);

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Applies a decision. This is the single place the transition table lives.
    pub fn decide(self, decision: Decision) -> Result<InteractionStatus, TransitionError> {
        match (self, decision) {
            (Self::Pending, Decision::Accept) => Ok(Self::Accepted),
            (Self::Pending, Decision::Reject) => Ok(Self::Rejected),
            (terminal, _) => Err(TransitionError::Terminal(terminal)),
        }
    }

    /// Moves towards an arbitrary target status, as requested through a
    /// generic "set status" call.
    pub fn transition_to(
        self,
        target: InteractionStatus,
    ) -> Result<InteractionStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        let decision = Decision::try_from(target).map_err(|_| TransitionError::NotAllowed {
            from: self,
            to: target,
        })?;
        self.decide(decision)
    }
}

impl TryFrom<InteractionStatus> for Decision {
    type Error = InteractionStatus;

    fn try_from(target: InteractionStatus) -> Result<Self, Self::Error> {
        match target {
            InteractionStatus::Accepted => Ok(Decision::Accept),
            InteractionStatus::Rejected => Ok(Decision::Reject),
            other => Err(other),
        }
    }
}

impl Decision {
    pub fn target(&self) -> InteractionStatus {
        match self {
            Decision::Accept => InteractionStatus::Accepted,
            Decision::Reject => InteractionStatus::Rejected,
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Status of the parent swap request. Completion is a one-way flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapRequestStatus {
    Open,
    Completed,
}

impl SwapRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SwapRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapRequestStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
