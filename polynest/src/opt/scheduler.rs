//! Single-flight evaluation scheduling.
//!
//! The control thread drives [`OptState::tick`] on a fixed interval and
//! whenever a response arrives. At most one evaluation is in flight at a
//! time, tracked in a pending slot keyed by population index so that late
//! or superseded responses can be told apart from live ones.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::SmallRng;

use crate::config::NestConfig;
use crate::entities::{NestResult, PartInstance};
use crate::io::ext_repr::{EvalRequest, EvalResponse};
use crate::opt::eval::{SheetSet, build_request};
use crate::opt::ga::GeneticOptimizer;

/// Interval of the scheduling tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);
/// An evaluation older than this is considered hung and requeued.
pub const EVAL_TIMEOUT: Duration = Duration::from_secs(120);
/// Capacity of the best-results list.
pub const BEST_CAPACITY: usize = 10;

/// The one evaluation currently in flight.
#[derive(Clone, Copy, Debug)]
pub struct PendingEval {
    pub index: usize,
    pub since: Instant,
}

/// Optimization state shared between the session facade and the control
/// thread. Only ever touched under its lock.
#[derive(Default)]
pub struct OptState {
    pub ga: Option<GeneticOptimizer>,
    /// Instance pool the population is seeded from, one entry per quantity
    /// unit of every placeable part.
    pub instances: Vec<PartInstance>,
    pub sheet_set: SheetSet,
    pub pending: Option<PendingEval>,
    /// Best results seen so far, best first, at most [`BEST_CAPACITY`].
    pub best: Vec<NestResult>,
}

impl OptState {
    /// One scheduling step: seed the population if absent, advance the
    /// generation once fully evaluated, requeue a hung evaluation, then
    /// dispatch the next unevaluated individual if nothing is in flight.
    pub fn tick(&mut self, config: &NestConfig, rng: &mut SmallRng, req_tx: &Sender<EvalRequest>) {
        if self.ga.is_none() {
            let seeded = GeneticOptimizer::new(self.instances.clone(), config.clone(), rng);
            debug!(
                "[GA] seeded a population of {} over {} instances",
                seeded.population.len(),
                self.instances.len()
            );
            self.ga = Some(seeded);
        }
        let Some(ga) = self.ga.as_mut() else {
            return;
        };

        if ga.complete() {
            ga.generation(rng);
        }

        if let Some(pending) = self.pending {
            if pending.since.elapsed() >= EVAL_TIMEOUT {
                warn!(
                    "[EVAL] evaluation of individual {} timed out, requeueing",
                    pending.index
                );
                ga.population[pending.index].processing = false;
                self.pending = None;
            }
        }

        if self.pending.is_some() {
            return;
        }
        let next = ga
            .population
            .iter()
            .position(|i| !i.processing && i.fitness.is_none());
        if let Some(index) = next {
            ga.population[index].processing = true;
            let request = build_request(index, &ga.population[index], &self.sheet_set, config);
            match req_tx.send(request) {
                Ok(()) => {
                    self.pending = Some(PendingEval {
                        index,
                        since: Instant::now(),
                    });
                }
                Err(_) => {
                    warn!("[EVAL] worker unavailable, dispatch skipped");
                    ga.population[index].processing = false;
                }
            }
        }
    }

    /// Consumes an evaluator response. Returns the new best result when the
    /// response improves on it, so the caller can notify the display
    /// callback outside the lock.
    pub fn on_response(&mut self, response: EvalResponse) -> Option<NestResult> {
        let Some(ga) = self.ga.as_mut() else {
            debug!("[EVAL] stale response dropped, no active population");
            return None;
        };
        match self.pending {
            Some(pending) if pending.index == response.index => self.pending = None,
            _ => {
                debug!(
                    "[EVAL] stale response for individual {} dropped",
                    response.index
                );
                return None;
            }
        }

        let individual = &mut ga.population[response.index];
        individual.processing = false;
        individual.fitness = Some(response.fitness);

        let improved = match self.best.first() {
            Some(front) => front.fitness > response.fitness,
            None => true,
        };
        if !improved {
            return None;
        }
        info!(
            "[NEST] new best fitness {:.4} (individual {})",
            response.fitness, response.index
        );
        let result = NestResult {
            fitness: response.fitness,
            placements: response.placements,
        };
        self.best.insert(0, result.clone());
        self.best.truncate(BEST_CAPACITY);
        Some(result)
    }

    /// Fraction of the population already evaluated.
    pub fn progress(&self) -> f64 {
        match &self.ga {
            Some(ga) => {
                let done = ga.population.iter().filter(|i| i.fitness.is_some()).count();
                done as f64 / ga.population.len() as f64
            }
            None => 0.0,
        }
    }

    /// Clears in-flight bookkeeping so a later start re-dispatches cleanly.
    pub fn halt(&mut self) {
        self.pending = None;
        if let Some(ga) = self.ga.as_mut() {
            for individual in &mut ga.population {
                individual.processing = false;
            }
        }
    }

    /// Drops the population and best results, keeping the instance pool.
    /// The next tick reseeds from scratch.
    pub fn clear_optimizer(&mut self) {
        self.ga = None;
        self.pending = None;
        self.best.clear();
    }
}
