use crate::schema::DetectionResponse;

/// The one current outcome of the upload flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Success(DetectionResponse),
    Error(String),
}

impl UiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn result(&self) -> Option<&DetectionResponse> {
        match self {
            UiState::Success(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UiState::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// Handle for one in-flight attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// State plus the generation counter that orders attempts. Only the most
/// recent generation may write a completion.
#[derive(Debug, Default)]
pub struct Session {
    state: UiState,
    generation: u64,
}

impl Session {
    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = UiState::Loading;
        Ticket(self.generation)
    }

    /// Apply a completion. Returns false when the ticket was superseded.
    pub fn complete(&mut self, ticket: Ticket, next: UiState) -> bool {
        if ticket.0 != self.generation {
            return false;
        }
        self.state = next;
        true
    }

    /// Record a validation failure; it supersedes any in-flight attempt.
    pub fn reject(&mut self, message: String) {
        self.generation += 1;
        self.state = UiState::Error(message);
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = UiState::Idle;
    }
}
