//! Session facade owning parts, configuration and the optimization
//! lifecycle.
//!
//! A [`NestSession`] is the single entry point: import parts, configure,
//! then `start`/`stop`/`reset`. While running, a control thread drives the
//! scheduler tick and a worker thread runs the evaluator; both shut down
//! when the session stops. All shared state lives behind locks owned here,
//! the control thread never touches anything else.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, ensure};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{ConfigUpdate, NestConfig};
use crate::entities::{NestResult, PartDefinition, PartInstance};
use crate::geometry::simplification::SimplifyConfig;
use crate::io::{ImportReport, Importer, OutlineLoader};
use crate::opt::eval::{PlacementEvaluator, SheetSet, spawn_worker};
use crate::opt::scheduler::{OptState, TICK_INTERVAL};
use crate::opt::spacing;

/// Called on every scheduling tick with the fraction of the population
/// already evaluated.
pub type ProgressCallback = Box<dyn Fn(f64) + Send>;
/// Called whenever a new best result is recorded.
pub type DisplayCallback = Box<dyn Fn(&NestResult) + Send>;

/// Summary of one import handed back to the caller.
#[derive(Debug)]
pub struct ImportSummary {
    /// Index of the first newly added part.
    pub first_part: usize,
    /// Number of parts added.
    pub imported: usize,
    /// Drawing elements no part claimed, to surface as errors.
    pub unclaimed: Vec<usize>,
}

pub struct NestSession<E: PlacementEvaluator> {
    evaluator: Arc<E>,
    config: Arc<Mutex<NestConfig>>,
    parts: Arc<Mutex<Vec<PartDefinition>>>,
    state: Arc<Mutex<OptState>>,
    running: Arc<AtomicBool>,
    control: Option<JoinHandle<()>>,
}

impl<E: PlacementEvaluator> NestSession<E> {
    pub fn new(evaluator: E) -> Self {
        NestSession {
            evaluator: Arc::new(evaluator),
            config: Arc::new(Mutex::new(NestConfig::default())),
            parts: Arc::new(Mutex::new(vec![])),
            state: Arc::new(Mutex::new(OptState::default())),
            running: Arc::new(AtomicBool::new(false)),
            control: None,
        }
    }

    /// Extracts parts from a drawing and registers them with the session.
    pub fn import<L: OutlineLoader>(&self, loader: &L) -> Result<ImportSummary> {
        let curve_tolerance = lock(&self.config).curve_tolerance;
        let ImportReport { parts, unclaimed } = Importer::new(curve_tolerance).import(loader)?;

        let mut registry = lock(&self.parts);
        let first_part = registry.len();
        let imported = parts.len();
        registry.extend(parts);
        Ok(ImportSummary {
            first_part,
            imported,
            unclaimed,
        })
    }

    /// Applies a configuration change. Invalid fields keep their prior
    /// value. Any change resets the optimizer and the best-results list;
    /// imported parts are kept.
    pub fn configure(&self, update: &ConfigUpdate) -> NestConfig {
        let updated = {
            let mut config = lock(&self.config);
            config.apply(update);
            config.clone()
        };
        lock(&self.state).clear_optimizer();
        updated
    }

    pub fn config(&self) -> NestConfig {
        lock(&self.config).clone()
    }

    pub fn parts(&self) -> Vec<PartDefinition> {
        lock(&self.parts).clone()
    }

    pub fn set_quantity(&self, part: usize, quantity: u32) -> Result<()> {
        let mut parts = lock(&self.parts);
        let part = parts
            .get_mut(part)
            .with_context(|| format!("no part at index {part}"))?;
        part.quantity = quantity;
        Ok(())
    }

    pub fn set_sheet(&self, part: usize, is_sheet: bool) -> Result<()> {
        let mut parts = lock(&self.parts);
        let part = parts
            .get_mut(part)
            .with_context(|| format!("no part at index {part}"))?;
        part.is_sheet = is_sheet;
        Ok(())
    }

    /// Best results so far, best first.
    pub fn best(&self) -> Vec<NestResult> {
        lock(&self.state).best.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Starts (or resumes) optimization. Builds spacing-adjusted instances
    /// unless a population from a previous run is being resumed, then
    /// spawns the worker and control threads. A run whose control thread
    /// already exited on its own does not count as running.
    pub fn start(&mut self, progress: ProgressCallback, display: DisplayCallback) -> Result<()> {
        // the control thread exits on its own when the worker goes away,
        // clearing the running flag last but leaving its handle behind
        if !self.is_running() {
            if let Some(control) = self.control.take() {
                let _ = control.join();
                lock(&self.state).halt();
            }
        }
        ensure!(self.control.is_none(), "optimization is already running");

        let config = lock(&self.config).clone();
        {
            let parts = lock(&self.parts);
            ensure!(
                parts.iter().any(|p| p.is_sheet && p.quantity > 0),
                "no sheet to place onto"
            );
            ensure!(
                parts.iter().any(|p| !p.is_sheet && p.quantity > 0),
                "no placeable part with a nonzero quantity"
            );
        }

        {
            let mut state = lock(&self.state);
            if state.ga.is_none() {
                let parts = lock(&self.parts).clone();
                let (instances, sheet_set) = build_instances(&parts, &config);
                state.instances = instances;
                state.sheet_set = sheet_set;
            }
        }

        let evaluator = Arc::clone(&self.evaluator);
        let config_arc = Arc::clone(&self.config);
        let state_arc = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);

        let seed = config.prng_seed;
        let control = thread::Builder::new()
            .name("polynest-control".into())
            .spawn(move || {
                let (req_tx, resp_rx) = match spawn_worker(evaluator) {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("[NEST] {e:#}");
                        running.store(false, Ordering::Release);
                        return;
                    }
                };
                let mut rng = match seed {
                    Some(seed) => SmallRng::seed_from_u64(seed),
                    None => SmallRng::from_os_rng(),
                };

                while running.load(Ordering::Acquire) {
                    match resp_rx.recv_timeout(TICK_INTERVAL) {
                        Ok(response) => {
                            let improved = lock(&state_arc).on_response(response);
                            if let Some(best) = improved {
                                display(&best);
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            error!("[NEST] evaluator worker disconnected, stopping");
                            break;
                        }
                    }

                    let config = lock(&config_arc).clone();
                    let fraction = {
                        let mut state = lock(&state_arc);
                        state.tick(&config, &mut rng, &req_tx);
                        state.progress()
                    };
                    progress(fraction);
                }
                running.store(false, Ordering::Release);
            })
            .context("failed to spawn the control thread")?;

        self.control = Some(control);
        info!("[NEST] optimization started");
        Ok(())
    }

    /// Halts the tick loop and clears in-flight bookkeeping. The population
    /// and best results survive, so a later [`start`](Self::start) resumes.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(control) = self.control.take() {
            if control.join().is_err() {
                error!("[NEST] control thread panicked");
            }
        }
        lock(&self.state).halt();
        info!("[NEST] optimization stopped");
    }

    /// Stops and discards everything: optimizer state, best results and
    /// imported parts.
    pub fn reset(&mut self) {
        self.stop();
        {
            let mut state = lock(&self.state);
            state.clear_optimizer();
            state.instances.clear();
            state.sheet_set = SheetSet::default();
        }
        lock(&self.parts).clear();
        info!("[NEST] session reset");
    }
}

impl<E: PlacementEvaluator> Drop for NestSession<E> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(control) = self.control.take() {
            let _ = control.join();
        }
    }
}

/// Builds the spacing-adjusted instance pool and sheet set for one run.
/// Part instances get dense ids in definition order; sheet instances get a
/// dense id sequence of their own.
fn build_instances(parts: &[PartDefinition], config: &NestConfig) -> (Vec<PartInstance>, SheetSet) {
    let simplify_cfg = SimplifyConfig {
        curve_tolerance: config.curve_tolerance,
        hull_only: config.simplify,
    };

    let mut instances = vec![];
    let mut sheet_set = SheetSet::default();
    let mut next_id = 0;
    for (source, part) in parts.iter().enumerate() {
        if part.quantity == 0 {
            continue;
        }
        let spaced = Arc::new(spacing::apply(
            &part.tree,
            0.5 * config.spacing,
            part.is_sheet,
            &simplify_cfg,
        ));
        for _ in 0..part.quantity {
            if part.is_sheet {
                sheet_set.push(&spaced, source);
            } else {
                instances.push(PartInstance {
                    id: next_id,
                    source,
                    tree: Arc::clone(&spaced),
                });
                next_id += 1;
            }
        }
    }
    (instances, sheet_set)
}

/// Locks a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
