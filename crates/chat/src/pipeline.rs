use maddy_client::{ChatResponse, ClientError};

/// Busy status label shown while a send is in flight.
pub const BUSY_STATUS: &str = "Thinking...";
/// Bot message for a server error without an explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again.";
/// Bot message for a request that never completed.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
/// Bot message for a successful but empty reply.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "(No response)";
/// User message text when attachments were sent without any text.
pub const ATTACHMENTS_CAPTION: &str = "[Sent files/images]";

/// Identifies one send so late completions can be told apart.
///
/// A new ticket is issued for every accepted send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SendTicket(pub u64);

impl SendTicket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending(SendTicket),
}

/// Why a send was not started. No transition happens in either case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRejection {
    NothingToSend,
    AlreadySending { active: SendTicket },
    UploadTooLarge { total: u64, limit: u64 },
}

/// Why a completion was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionRejection {
    NotSending,
    StaleTicket {
        active: SendTicket,
        attempted: SendTicket,
    },
}

impl SendState {
    pub fn active_ticket(&self) -> Option<SendTicket> {
        match self {
            Self::Sending(ticket) => Some(*ticket),
            Self::Idle => None,
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self, Self::Sending(_))
    }

    /// `idle -> sending`. Only one send may be in flight.
    pub fn begin(&self, ticket: SendTicket) -> Result<Self, SendRejection> {
        match self {
            Self::Idle => Ok(Self::Sending(ticket)),
            Self::Sending(active) => Err(SendRejection::AlreadySending { active: *active }),
        }
    }

    /// `sending -> idle`. The completion must belong to the active ticket.
    pub fn finish(&self, ticket: SendTicket) -> Result<Self, CompletionRejection> {
        match self {
            Self::Sending(active) if *active == ticket => Ok(Self::Idle),
            Self::Sending(active) => Err(CompletionRejection::StaleTicket {
                active: *active,
                attempted: ticket,
            }),
            Self::Idle => Err(CompletionRejection::NotSending),
        }
    }
}

/// How a completed send ended, as seen by the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Replied { reply: String },
    Rejected { status: u16, message: String },
    TransportFailed,
}

impl SendOutcome {
    /// Interprets a transport result.
    pub fn from_result(result: &Result<ChatResponse, ClientError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Replied {
                reply: response
                    .reply
                    .clone()
                    .filter(|reply| !reply.is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string()),
            },
            Ok(response) => Self::Rejected {
                status: response.status,
                message: response
                    .reply
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            },
            Err(_) => Self::TransportFailed,
        }
    }

    /// Bot-authored text appended for this outcome.
    pub fn bot_text(&self) -> &str {
        match self {
            Self::Replied { reply } => reply,
            Self::Rejected { message, .. } => message,
            Self::TransportFailed => NETWORK_ERROR_MESSAGE,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Replied { .. })
    }
}
