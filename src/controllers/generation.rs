//! The render-generation counter shared by the orchestrator and the pool.
//!
//! Bumping the counter is the only cancellation primitive. Every
//! check-and-act on it goes through the gate so that it is atomic with
//! respect to a concurrent bump: once [`Generations::advance`] returns, no
//! action guarded by [`Generations::apply_if_current`] for an older
//! generation can still run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::actions::cancellation::CancelToken;
use crate::core::data::generation::Generation;

#[derive(Debug, Default)]
pub struct Generations {
    current: AtomicU64,
    gate: Mutex<()>,
}

impl Generations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a new generation current and returns it.
    pub fn advance(&self) -> Generation {
        self.advance_with(|_| ()).0
    }

    /// Makes a new generation current and runs `f` before any guarded action
    /// can observe it.
    pub fn advance_with<R>(&self, f: impl FnOnce(Generation) -> R) -> (Generation, R) {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = Generation::new(self.current.fetch_add(1, Ordering::SeqCst) + 1);
        let result = f(generation);

        (generation, result)
    }

    #[must_use]
    pub fn current(&self) -> Generation {
        Generation::new(self.current.load(Ordering::SeqCst))
    }

    /// Snapshot comparison; use [`Self::apply_if_current`] when acting on
    /// the answer.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Runs `f` only if `generation` is still current, holding off any
    /// concurrent [`Self::advance`] until it returns. `f` must not advance
    /// the counter itself.
    pub fn apply_if_current<R>(&self, generation: Generation, f: impl FnOnce() -> R) -> Option<R> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        if self.is_current(generation) {
            Some(f())
        } else {
            None
        }
    }

    #[must_use]
    pub fn watch(self: &Arc<Self>, generation: Generation) -> GenerationWatch {
        GenerationWatch {
            generations: Arc::clone(self),
            generation,
        }
    }
}

/// Cancel token that fires once `generation` stops being current.
#[derive(Debug, Clone)]
pub struct GenerationWatch {
    generations: Arc<Generations>,
    generation: Generation,
}

impl GenerationWatch {
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl CancelToken for GenerationWatch {
    #[inline]
    fn is_cancelled(&self) -> bool {
        !self.generations.is_current(self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_advance_increments_by_exactly_one() {
        let generations = Generations::new();
        assert_eq!(generations.current(), Generation::NONE);

        let values: Vec<u64> = (0..5).map(|_| generations.advance().value()).collect();

        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        assert_eq!(generations.current().value(), 5);
    }

    #[test]
    fn test_apply_if_current_skips_stale_generation() {
        let generations = Generations::new();
        let first = generations.advance();
        let second = generations.advance();

        assert_eq!(generations.apply_if_current(first, || 1), None);
        assert_eq!(generations.apply_if_current(second, || 2), Some(2));
    }

    #[test]
    fn test_watch_cancels_after_advance() {
        let generations = Arc::new(Generations::new());
        let watch = generations.watch(generations.advance());

        assert!(!watch.is_cancelled());
        generations.advance();
        assert!(watch.is_cancelled());
    }

    #[test]
    fn test_concurrent_advances_are_unique() {
        let generations = Arc::new(Generations::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generations = Arc::clone(&generations);
                thread::spawn(move || {
                    (0..100)
                        .map(|_| generations.advance().value())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (1..=800).collect::<Vec<_>>());
    }

    #[test]
    fn test_advance_with_runs_before_generation_is_observable_by_guarded_actions() {
        let generations = Generations::new();

        let (generation, seen) = generations.advance_with(|g| g);

        assert_eq!(generation, seen);
        assert!(generations.is_current(generation));
    }
}
