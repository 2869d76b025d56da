/// Refinement step names, coarse to fine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassKind {
    Preview,
    Low,
    Medium,
    High,
}

impl PassKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for PassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Iteration budget of a pass. Fixed budgets keep coarse passes fast no
/// matter how high the requested quality is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IterationBudget {
    Fixed(u32),
    Requested,
}

/// One step of progressive refinement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderPass {
    pub kind: PassKind,
    pub resolution_scale: f64,
    pub budget: IterationBudget,
}

pub const CANONICAL_PASSES: [RenderPass; 4] = [
    RenderPass {
        kind: PassKind::Preview,
        resolution_scale: 0.25,
        budget: IterationBudget::Fixed(100),
    },
    RenderPass {
        kind: PassKind::Low,
        resolution_scale: 0.5,
        budget: IterationBudget::Fixed(200),
    },
    RenderPass {
        kind: PassKind::Medium,
        resolution_scale: 0.75,
        budget: IterationBudget::Fixed(500),
    },
    RenderPass {
        kind: PassKind::High,
        resolution_scale: 1.0,
        budget: IterationBudget::Requested,
    },
];

impl RenderPass {
    /// `min(budget, requested)`, never zero.
    #[must_use]
    pub fn effective_iterations(&self, requested: u32) -> u32 {
        let budget = match self.budget {
            IterationBudget::Fixed(budget) => budget.min(requested),
            IterationBudget::Requested => requested,
        };

        budget.max(1)
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.resolution_scale < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_sequence_refines_monotonically() {
        assert!(
            CANONICAL_PASSES
                .windows(2)
                .all(|pair| pair[0].resolution_scale < pair[1].resolution_scale)
        );
        assert_eq!(CANONICAL_PASSES[3].resolution_scale, 1.0);
        assert!(!CANONICAL_PASSES[3].is_partial());
        assert!(CANONICAL_PASSES[..3].iter().all(RenderPass::is_partial));
    }

    #[test]
    fn test_effective_iterations_caps_at_request() {
        let budgets: Vec<u32> = CANONICAL_PASSES
            .iter()
            .map(|pass| pass.effective_iterations(1000))
            .collect();
        assert_eq!(budgets, vec![100, 200, 500, 1000]);

        let budgets: Vec<u32> = CANONICAL_PASSES
            .iter()
            .map(|pass| pass.effective_iterations(150))
            .collect();
        assert_eq!(budgets, vec![100, 150, 150, 150]);
    }

    #[test]
    fn test_effective_iterations_never_zero() {
        assert_eq!(CANONICAL_PASSES[0].effective_iterations(0), 1);
    }
}
