use crate::geometry::primitives::Contour;

/// Index of a node in a [`PolyTree`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single contour in a part's outline hierarchy.
#[derive(Clone, Debug)]
pub struct PolyNode {
    /// Dense id assigned while the containment forest is built, unique across
    /// every tree of one import. Absent on nodes synthesized later, such as
    /// holes produced by simplification.
    pub id: Option<usize>,
    pub contour: Contour,
    /// Index of the drawing element this contour was flattened from.
    pub source: Option<usize>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl PolyNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Outline hierarchy of a single part. The root is solid material, its
/// children are holes, their children islands, alternating by depth.
///
/// Nodes live in a flat arena and are addressed by [`NodeId`]. Nodes are
/// never removed, so a `NodeId` stays valid for the lifetime of the tree.
/// Transforms that change contours build a new tree instead of mutating
/// in place.
#[derive(Clone, Debug)]
pub struct PolyTree {
    nodes: Vec<PolyNode>,
}

impl PolyTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(contour: Contour, id: Option<usize>, source: Option<usize>) -> Self {
        PolyTree {
            nodes: vec![PolyNode {
                id,
                contour,
                source,
                parent: None,
                children: vec![],
            }],
        }
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        contour: Contour,
        id: Option<usize>,
        source: Option<usize>,
    ) -> NodeId {
        let child = NodeId(self.nodes.len());
        self.nodes.push(PolyNode {
            id,
            contour,
            source,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(child);
        child
    }

    pub fn node(&self, id: NodeId) -> &PolyNode {
        &self.nodes[id.0]
    }

    pub fn root(&self) -> &PolyNode {
        &self.nodes[Self::ROOT.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of parent links between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Pre-order traversal yielding each node with its depth.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        let mut stack = vec![(Self::ROOT, 0)];
        std::iter::from_fn(move || {
            let (id, depth) = stack.pop()?;
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, depth + 1));
            }
            Some((id, depth))
        })
    }
}
