use shared::domain::{Session, TravelMode};

/// Cached copy of the backend's current open check-in, if any.
///
/// Replace-only: every write swaps the whole record so a field the backend has
/// dropped can never linger locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStore {
    current: Option<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current(&mut self, session: Option<Session>) {
        self.current = session;
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn can_open(&self) -> bool {
        self.current.is_none()
    }

    pub fn can_close(&self) -> bool {
        self.current.is_some()
    }

    pub fn mode_of(&self) -> Option<&TravelMode> {
        self.current.as_ref().map(|session| &session.mode)
    }
}
