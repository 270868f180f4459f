//! Turns a flat drawing into a forest of part trees.
//!
//! Closed elements are flattened, cleaned and grouped into part/hole/island
//! trees by containment sampling; every remaining drawing element is then
//! claimed by the part it lies inside, so exporting a placement can carry
//! decorative elements along with the geometry.

use anyhow::Result;
use itertools::Itertools;
use log::{debug, info};

use crate::entities::{NodeId, PartDefinition, PolyTree};
use crate::geometry::clip;
use crate::geometry::primitives::{Contour, Point};

/// Access to the elements of a loaded drawing. The core does not parse
/// drawing formats itself, it only needs to enumerate elements, test them
/// for closedness, and flatten them to polylines.
pub trait OutlineLoader {
    type Element;

    /// Top-level elements, in document order.
    fn elements(&self) -> &[Self::Element];

    /// Whether the element forms a closed loop, endpoints within `tolerance`.
    fn is_closed(&self, element: &Self::Element, tolerance: f64) -> bool;

    /// Flattens the element into a polyline. Open elements yield their
    /// points, point-like elements (e.g. images) a single representative
    /// point, unsupported elements may yield none.
    fn polygonify(&self, element: &Self::Element) -> Vec<Point>;
}

/// Outcome of one import.
#[derive(Debug)]
pub struct ImportReport {
    pub parts: Vec<PartDefinition>,
    /// Drawing elements no part claimed, to be surfaced as errors.
    pub unclaimed: Vec<usize>,
}

/// Converts loader elements into [`PartDefinition`]s.
#[derive(Clone, Copy, Debug)]
pub struct Importer {
    pub curve_tolerance: f64,
}

impl Importer {
    pub fn new(curve_tolerance: f64) -> Importer {
        Importer { curve_tolerance }
    }

    pub fn import<L: OutlineLoader>(&self, loader: &L) -> Result<ImportReport> {
        let ct = self.curve_tolerance;
        let elements = loader.elements();

        // closed elements that survive cleaning and the area floor become
        // candidate contours
        let mut candidates = vec![];
        for (source, element) in elements.iter().enumerate() {
            if !loader.is_closed(element, 2.0 * ct) {
                continue;
            }
            let raw = Contour::new(loader.polygonify(element));
            let Some(cleaned) = clip::clean(&raw, ct) else {
                debug!("[IMPORT] element {source} collapsed during cleaning, dropped");
                continue;
            };
            if cleaned.area() <= ct * ct {
                debug!("[IMPORT] element {source} below the area floor, dropped");
                continue;
            }
            candidates.push(RawNode {
                id: 0,
                source,
                contour: cleaned,
                children: vec![],
            });
        }
        let total_candidates = candidates.len();

        let mut next_id = 0;
        let mut dropped = 0;
        let roots = build_forest(candidates, &mut next_id, &mut dropped);
        if dropped > 0 {
            debug!("[IMPORT] {dropped} shape(s) dropped by cyclic containment");
        }

        let mut parts = roots
            .into_iter()
            .map(|root| PartDefinition::new(root.into_poly_tree(), 1, false))
            .collect::<Result<Vec<_>>>()?;

        claim_elements(loader, &mut parts);
        let claimed = parts.iter().flat_map(|p| p.elements.iter().copied()).collect_vec();
        let unclaimed = (0..elements.len())
            .filter(|i| !claimed.contains(i))
            .collect_vec();

        info!(
            "[IMPORT] {} part(s) from {} closed contour(s), {} element(s) unclaimed",
            parts.len(),
            total_candidates,
            unclaimed.len()
        );
        Ok(ImportReport { parts, unclaimed })
    }
}

struct RawNode {
    id: usize,
    source: usize,
    contour: Contour,
    children: Vec<RawNode>,
}

impl RawNode {
    fn into_poly_tree(self) -> PolyTree {
        let mut tree = PolyTree::new(self.contour, Some(self.id), Some(self.source));
        for child in self.children {
            attach(&mut tree, PolyTree::ROOT, child);
        }
        return tree;

        fn attach(tree: &mut PolyTree, parent: NodeId, node: RawNode) {
            let id = tree.add_child(parent, node.contour, Some(node.id), Some(node.source));
            for child in node.children {
                attach(tree, id, child);
            }
        }
    }
}

/// `true` when strictly more than half of up to 10 sampled vertices of
/// `inner` lie inside `outer`.
fn sampled_inside(inner: &Contour, outer: &Contour) -> bool {
    let samples = inner.len().min(10);
    if samples == 0 {
        return false;
    }
    let inside = (0..samples)
        .filter(|&k| clip::point_in_contour(inner[k], outer))
        .count();
    inside as f64 > 0.5 * samples as f64
}

/// Groups `nodes` into a forest by containment sampling and assigns densely
/// increasing ids: the top level of each recursion step first, then each
/// top-level node's subtree in order.
///
/// Classification runs again on every child list, so a shape first attached
/// to its grandparent migrates down to its true parent. Mutual containment
/// (possible under coarse sampling) leaves shapes unreachable from any root;
/// those are dropped and counted.
fn build_forest(nodes: Vec<RawNode>, next_id: &mut usize, dropped: &mut usize) -> Vec<RawNode> {
    let n = nodes.len();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if sampled_inside(&nodes[i].contour, &nodes[j].contour) {
                parent[i] = Some(j);
                break;
            }
        }
    }

    let mut children_of: Vec<Vec<usize>> = vec![vec![]; n];
    let mut top: Vec<usize> = vec![];
    for i in 0..n {
        match parent[i] {
            Some(p) => children_of[p].push(i),
            None => top.push(i),
        }
    }

    let mut slots: Vec<Option<RawNode>> = nodes.into_iter().map(Some).collect();
    let mut roots = vec![];
    for i in top {
        if let Some(root) = take(&mut slots, &children_of, i) {
            roots.push(root);
        }
    }
    *dropped += slots.iter().filter(|s| s.is_some()).count();

    for root in &mut roots {
        root.id = *next_id;
        *next_id += 1;
    }
    for root in &mut roots {
        let children = std::mem::take(&mut root.children);
        if !children.is_empty() {
            root.children = build_forest(children, next_id, dropped);
        }
    }
    return roots;

    fn take(
        slots: &mut Vec<Option<RawNode>>,
        children_of: &[Vec<usize>],
        i: usize,
    ) -> Option<RawNode> {
        let mut node = slots[i].take()?;
        for &c in &children_of[i] {
            if let Some(child) = take(slots, children_of, c) {
                node.children.push(child);
            }
        }
        Some(node)
    }
}

/// Assigns every drawing element to the first part that claims it: first by
/// subtree membership of its source index, then by point containment for
/// whatever remains (open polylines by vertex and edge midpoint, point-like
/// elements by their single point).
fn claim_elements<L: OutlineLoader>(loader: &L, parts: &mut [PartDefinition]) {
    let elements = loader.elements();
    let mut open: Vec<usize> = (0..elements.len()).collect();

    for part in parts.iter_mut() {
        let sources = part
            .tree
            .iter_depth_first()
            .filter_map(|(id, _)| part.tree.node(id).source)
            .collect_vec();
        for &source in &sources {
            if let Some(pos) = open.iter().position(|&e| e == source) {
                part.elements.push(source);
                open.remove(pos);
            }
        }
    }

    for part in parts.iter_mut() {
        let outline = &part.tree.root().contour;
        let mut i = 0;
        while i < open.len() {
            let points = loader.polygonify(&elements[open[i]]);
            if claimed_by(&points, outline) {
                part.elements.push(open.remove(i));
            } else {
                i += 1;
            }
        }
    }
}

fn claimed_by(points: &[Point], outline: &Contour) -> bool {
    match points.len() {
        0 => false,
        1 => clip::point_in_contour(points[0], outline),
        n => (0..n).any(|k| {
            if clip::point_in_contour(points[k], outline) {
                return true;
            }
            let mid = points[k].mid(&points[(k + 1) % n]);
            clip::point_in_contour(mid, outline)
        }),
    }
}
