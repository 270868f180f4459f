//! Realizes edge-to-edge spacing by offsetting part trees before packing.

use log::debug;

use crate::entities::{NodeId, PolyTree};
use crate::geometry::clip;
use crate::geometry::primitives::Contour;
use crate::geometry::simplification::{SimplifyConfig, simplify};

/// Offsets every contour of `tree` by half the configured spacing, outward
/// for solid outlines and inward for holes, alternating sign by depth.
/// Sheets use the inverse convention, shrinking the usable area instead of
/// growing the part. Each contour passes through simplification with the
/// matching bias first; extra holes produced there become children of the
/// node that produced them and take part in the recursion themselves.
pub fn apply(tree: &PolyTree, half_spacing: f64, is_sheet: bool, cfg: &SimplifyConfig) -> PolyTree {
    let delta = match is_sheet {
        true => -half_spacing,
        false => half_spacing,
    };
    let root = tree.root();
    let (contour, extras) = offset_contour(&root.contour, delta, is_sheet, cfg);
    let mut pass = Pass {
        src: tree,
        dst: PolyTree::new(contour, root.id, root.source),
        cfg,
    };
    pass.descend(PolyTree::ROOT, PolyTree::ROOT, extras, -delta, !is_sheet);
    pass.dst
}

/// Simplifies with the given bias, then offsets. A collapsed offset keeps
/// the input contour so the part stays usable.
fn offset_contour(
    contour: &Contour,
    delta: f64,
    inside: bool,
    cfg: &SimplifyConfig,
) -> (Contour, Vec<Contour>) {
    let simplified = simplify(contour, inside, cfg);
    let offset = match clip::offset(&simplified.contour, delta).into_iter().next() {
        Some(first) => first,
        None => {
            debug!("[NEST] offset by {delta} collapsed a contour, keeping it unoffset");
            contour.clone()
        }
    };
    (offset, simplified.holes)
}

struct Pass<'a> {
    src: &'a PolyTree,
    dst: PolyTree,
    cfg: &'a SimplifyConfig,
}

impl Pass<'_> {
    fn descend(
        &mut self,
        src_id: NodeId,
        dst_id: NodeId,
        extras: Vec<Contour>,
        delta: f64,
        inside: bool,
    ) {
        for &child in self.src.node(src_id).children() {
            let node = self.src.node(child);
            let (contour, child_extras) = offset_contour(&node.contour, delta, inside, self.cfg);
            let new_id = self.dst.add_child(dst_id, contour, node.id, node.source);
            self.descend(child, new_id, child_extras, -delta, !inside);
        }
        self.append_extras(dst_id, extras, delta, inside);
    }

    fn append_extras(&mut self, dst_id: NodeId, extras: Vec<Contour>, delta: f64, inside: bool) {
        for extra in extras {
            let (contour, child_extras) = offset_contour(&extra, delta, inside, self.cfg);
            let new_id = self.dst.add_child(dst_id, contour, None, None);
            self.append_extras(new_id, child_extras, -delta, !inside);
        }
    }
}
