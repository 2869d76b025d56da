//! State reported by the render orchestrator.

use crate::core::data::generation::Generation;

/// Where a render request stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Running(Generation),
    /// A newer request or a cancel arrived before it finished.
    Superseded(Generation),
    Completed(Generation),
    /// No execution path could run it.
    Failed(Generation),
}

impl RenderState {
    #[must_use]
    pub fn generation(&self) -> Option<Generation> {
        match *self {
            Self::Idle => None,
            Self::Running(g) | Self::Superseded(g) | Self::Completed(g) | Self::Failed(g) => Some(g),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Execution path picked at startup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Backend {
    Gpu,
    Cpu,
    /// The CPU pool died or could not be created; the next request retries.
    Unavailable,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gpu => f.write_str("gpu"),
            Self::Cpu => f.write_str("cpu"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_of_state() {
        assert_eq!(RenderState::Idle.generation(), None);
        assert_eq!(
            RenderState::Superseded(Generation::new(3)).generation(),
            Some(Generation::new(3))
        );
        assert!(RenderState::Running(Generation::new(1)).is_running());
        assert!(!RenderState::Completed(Generation::new(1)).is_running());
    }
}
