//! Boundary to the external placement evaluator.
//!
//! The evaluator runs on its own worker thread and communicates over
//! channels, one request in flight at a time. Requests are flattened into
//! structure-of-arrays form before crossing the boundary.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::config::NestConfig;
use crate::entities::PolyTree;
use crate::geometry::primitives::Point;
use crate::io::ext_repr::{EvalRequest, EvalResponse, ExtIndividual, ExtPolygon};
use crate::opt::ga::Individual;

/// Computes a concrete layout and scalar fitness for one individual.
/// Implementations are opaque to the engine; they typically hand the work
/// to another process.
pub trait PlacementEvaluator: Send + Sync + 'static {
    fn evaluate(&self, request: EvalRequest) -> Result<EvalResponse>;
}

/// The sheet instances of one run in dispatch form, each definition repeated
/// per quantity unit. Sheet ids are a dense sequence of their own, separate
/// from part instance ids.
#[derive(Clone, Debug, Default)]
pub struct SheetSet {
    pub sheets: Vec<Vec<Point>>,
    pub ids: Vec<usize>,
    pub sources: Vec<usize>,
    pub children: Vec<Vec<ExtPolygon>>,
}

impl SheetSet {
    pub fn push(&mut self, tree: &PolyTree, source: usize) {
        self.sheets.push(tree.root().contour.points.clone());
        self.ids.push(self.ids.len());
        self.sources.push(source);
        self.children.push(root_children(tree));
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Flattens one individual plus the sheet set into a request.
pub fn build_request(
    index: usize,
    individual: &Individual,
    sheet_set: &SheetSet,
    config: &NestConfig,
) -> EvalRequest {
    let placement = individual
        .placement
        .iter()
        .map(|p| p.tree.root().contour.points.clone())
        .collect();
    EvalRequest {
        index,
        individual: ExtIndividual {
            placement,
            rotation: individual.rotation.clone(),
        },
        sheets: sheet_set.sheets.clone(),
        sheet_ids: sheet_set.ids.clone(),
        sheet_sources: sheet_set.sources.clone(),
        sheet_children: sheet_set.children.clone(),
        config: config.clone(),
        ids: individual.placement.iter().map(|p| p.id).collect(),
        sources: individual.placement.iter().map(|p| p.source).collect(),
        children: individual
            .placement
            .iter()
            .map(|p| root_children(&p.tree))
            .collect(),
    }
}

fn root_children(tree: &PolyTree) -> Vec<ExtPolygon> {
    tree.root()
        .children()
        .iter()
        .map(|&c| ExtPolygon::from_tree(tree, c))
        .collect()
}

/// Runs the evaluator on a dedicated worker thread. Requests arrive over the
/// returned sender; responses come back over the returned receiver. Dropping
/// the sender shuts the worker down.
pub fn spawn_worker<E: PlacementEvaluator>(
    evaluator: Arc<E>,
) -> Result<(Sender<EvalRequest>, Receiver<EvalResponse>)> {
    let (req_tx, req_rx) = channel::<EvalRequest>();
    let (resp_tx, resp_rx) = channel();
    thread::Builder::new()
        .name("polynest-eval".into())
        .spawn(move || {
            while let Ok(request) = req_rx.recv() {
                let index = request.index;
                match evaluator.evaluate(request) {
                    Ok(response) => {
                        if resp_tx.send(response).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("[EVAL] evaluation of individual {index} failed: {e:#}"),
                }
            }
            debug!("[EVAL] worker shut down");
        })
        .context("failed to spawn the evaluator worker thread")?;
    Ok((req_tx, resp_rx))
}

/// Convenience impl so evaluators can be plain closures in simple setups.
impl<F> PlacementEvaluator for F
where
    F: Fn(EvalRequest) -> Result<EvalResponse> + Send + Sync + 'static,
{
    fn evaluate(&self, request: EvalRequest) -> Result<EvalResponse> {
        self(request)
    }
}
