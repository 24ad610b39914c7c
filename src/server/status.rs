#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ServerStatus {
    /// Configured but not started yet
    #[default]
    Idle,
    /// Bound and accepting connections
    Running,
    /// Waiting for the next bind attempt
    Retrying,
    /// Gave up after too many failed binds
    Failed,
    /// Stopped on application exit
    Stopped,
}

impl ServerStatus {
    pub(crate) fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Retrying)
    }

    /// No automatic transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "waiting to start",
            Self::Running => "accepting connections",
            Self::Retrying => "waiting to retry binding",
            Self::Failed => "failed to bind",
            Self::Stopped => "stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_idle_and_retrying_can_start() {
        assert!(ServerStatus::Idle.can_start());
        assert!(ServerStatus::Retrying.can_start());
        assert!(!ServerStatus::Running.can_start());
        assert!(!ServerStatus::Failed.can_start());
        assert!(!ServerStatus::Stopped.can_start());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ServerStatus::Failed.is_terminal());
        assert!(ServerStatus::Stopped.is_terminal());
        assert!(!ServerStatus::Retrying.is_terminal());
    }
}
