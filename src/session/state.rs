//! Module `state`
//!
//! Server-side lifecycle of one session:
//! `Uninitialized -> Active -> Closed`. `Closed` is terminal.

use crate::session::SessionId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Active(SessionId),
    Closed(SessionId),
}

impl SessionState {
    /// Moves an uninitialized session to `Active`.
    ///
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn activate(&mut self, id: SessionId) -> bool {
        match self {
            Self::Uninitialized => {
                *self = Self::Active(id);
                true
            }
            _ => false,
        }
    }

    /// Moves an active session to `Closed`, returning its id.
    ///
    /// Yields `None` when the session was never activated or is already
    /// closed, so a caller acting on `Some` acts exactly once.
    pub fn close(&mut self) -> Option<SessionId> {
        match self {
            Self::Active(id) => {
                let id = id.clone();
                *self = Self::Closed(id.clone());
                Some(id)
            }
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::Uninitialized => None,
            Self::Active(id) | Self::Closed(id) => Some(id),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut state = SessionState::default();
        assert_eq!(state.session_id(), None);

        assert!(state.activate(SessionId::from("a")));
        assert_eq!(state, SessionState::Active(SessionId::from("a")));
        assert!(!state.activate(SessionId::from("b")));
        assert_eq!(state.session_id(), Some(&SessionId::from("a")));

        assert_eq!(state.close(), Some(SessionId::from("a")));
        assert!(state.is_closed());
        assert_eq!(state.close(), None);
    }

    #[test]
    fn test_closed_is_terminal() {
        let mut state = SessionState::Closed(SessionId::from("a"));
        assert!(!state.activate(SessionId::from("b")));
        assert!(state.is_closed());
    }

    #[test]
    fn test_close_before_activate() {
        let mut state = SessionState::Uninitialized;
        assert_eq!(state.close(), None);
        assert_eq!(state, SessionState::Uninitialized);
    }
}
