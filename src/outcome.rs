//! Outcome tags shared by the question and poll stores.

/// Result of adding a question or poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Another live item already uses this identifier (case-insensitive)
    DuplicateId,
}

/// Result of removing a question or poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Result of publishing a single question or poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Publishing again leaves the publish time and announcement flag untouched
    AlreadyPublished,
    NotFound,
}

/// Who is asking for an owner-restricted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester<'a> {
    User(&'a str),
    /// The configured developer may act on anyone's items
    Developer,
}

impl Requester<'_> {
    pub fn may_manage(&self, owner_id: &str) -> bool {
        match self {
            Requester::User(id) => *id == owner_id,
            Requester::Developer => true,
        }
    }
}
