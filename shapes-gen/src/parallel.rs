//! Worker pool for large boards.
//!
//! Work is partitioned purely by seed: each worker owns its PRNG, its solver
//! context, and its candidate puzzle, so the only shared state is the
//! publication slot below. A worker checks the flag between candidate boards
//! (cooperative cancellation; a running solve is never interrupted) and the
//! first to publish under the mutex wins. With several capable workers the
//! winner depends on scheduling, so the parallel path is deterministic per
//! seed only in which results are *possible*, not which one is returned.

use std::sync::Mutex;
use std::thread;

use shapes_core::rng::Rng;
use shapes_solver::Context;

use crate::GenError;
use crate::generator::{GeneratedPuzzle, GeneratorConfig, attempt_candidate};

const WORKERS: u64 = 4;
const WORKER_ATTEMPTS: u32 = 15;
const WORKER_SEED_STRIDE: u64 = 1000;

struct Outcome {
    found: bool,
    result: Option<GeneratedPuzzle>,
}

pub(crate) fn generate_parallel(
    config: &GeneratorConfig,
    base_seed: u64,
) -> Result<GeneratedPuzzle, GenError> {
    let shared = Mutex::new(Outcome {
        found: false,
        result: None,
    });

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let shared = &shared;
            let config = *config;
            scope.spawn(move || {
                let mut rng = Rng::new(base_seed.wrapping_add(worker * WORKER_SEED_STRIDE));
                let mut ctx = Context::new();
                for attempt in 0..WORKER_ATTEMPTS {
                    {
                        let Ok(outcome) = shared.lock() else {
                            return;
                        };
                        if outcome.found {
                            return;
                        }
                    }
                    match attempt_candidate(&config, &mut rng, &mut ctx) {
                        Ok(Some(mut generated)) => {
                            generated.attempts = attempt + 1;
                            let Ok(mut outcome) = shared.lock() else {
                                return;
                            };
                            if !outcome.found {
                                outcome.found = true;
                                outcome.result = Some(generated);
                            }
                            return;
                        }
                        Ok(None) => {}
                        // Candidate construction cannot fail after config
                        // validation; bail out of this worker if it somehow
                        // does and let the others keep searching.
                        Err(_) => return,
                    }
                }
            });
        }
    });

    shared
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .result
        .ok_or(GenError::AttemptsExhausted {
            attempts: WORKERS as u32 * WORKER_ATTEMPTS,
        })
}
