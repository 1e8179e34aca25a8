use std::fmt;

use crate::error::{ProtocolError, Result};

/// Connection state; selects which packet table an id is read against.
///
/// `Configuration` exists in later revisions of the protocol. This server never
/// enters it, but ids arriving there are still routed and reported as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolState {
    #[default]
    Handshake,
    Status,
    Login,
    Configuration,
    Play,
}

impl ProtocolState {
    /// Move to `to` if the protocol allows it.
    ///
    /// Staying in the same state is always allowed.
    pub fn transition(self, to: ProtocolState) -> Result<ProtocolState> {
        use ProtocolState::*;

        let allowed = match (self, to) {
            (Handshake, Handshake) | (Handshake, Status) | (Handshake, Login) => true,
            (Handshake, Configuration) | (Handshake, Play) => false,
            (Status, Status) => true,
            (Status, Handshake) | (Status, Login) | (Status, Configuration) | (Status, Play) => {
                false
            }
            (Login, Login) | (Login, Play) => true,
            (Login, Handshake) | (Login, Status) | (Login, Configuration) => false,
            (Configuration, Configuration) => true,
            (Configuration, Handshake)
            | (Configuration, Status)
            | (Configuration, Login)
            | (Configuration, Play) => false,
            (Play, Play) => true,
            (Play, Handshake) | (Play, Status) | (Play, Login) | (Play, Configuration) => false,
        };

        if allowed {
            Ok(to)
        } else {
            Err(ProtocolError::IllegalTransition { from: self, to })
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ProtocolState::Handshake => "handshake",
            ProtocolState::Status => "status",
            ProtocolState::Login => "login",
            ProtocolState::Configuration => "configuration",
            ProtocolState::Play => "play",
        }
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProtocolState::*;

    const ALL: [ProtocolState; 5] = [Handshake, Status, Login, Configuration, Play];

    #[test]
    fn legal_moves() {
        assert_eq!(Handshake.transition(Status).unwrap(), Status);
        assert_eq!(Handshake.transition(Login).unwrap(), Login);
        assert_eq!(Login.transition(Play).unwrap(), Play);
    }

    #[test]
    fn same_state_is_a_no_op() {
        for state in ALL {
            assert_eq!(state.transition(state).unwrap(), state);
        }
    }

    #[test]
    fn everything_else_is_rejected() {
        let legal = [(Handshake, Status), (Handshake, Login), (Login, Play)];
        for from in ALL {
            for to in ALL {
                if from == to || legal.contains(&(from, to)) {
                    continue;
                }
                match from.transition(to) {
                    Err(ProtocolError::IllegalTransition { from: f, to: t }) => {
                        assert_eq!((f, t), (from, to));
                    }
                    other => panic!("{from} -> {to} should be illegal, got {other:?}"),
                }
            }
        }
    }
}
