//! Basis representation as a rooted spanning tree.
//!
//! A transportation basis of `m+n−1` arcs spans the bipartite node set: row
//! nodes `0..m` are the sources, column nodes `m..m+n` the destinations, and
//! every tree edge joins a row node to a column node. The tree is held as
//! fixed-size index arrays (parent, first child, doubly linked sibling list)
//! so a pivot only rewires a handful of links; nodes are plain indices and
//! an absent link is `None`.
//!
//! The tree carries everything the simplex core asks of the basis:
//!
//! * dual-multiplier propagation from the root, or from a "dirty" subroot
//!   after a pivot re-attached only part of the tree;
//! * the stepping-stone cycle closed by a non-basic arc, with two
//!   interchangeable search strategies (see [crate::config::CycleStrategy]);
//! * the pivot update itself: detach the leaving arc, re-root the severed
//!   subtree and attach it through the entering arc;
//! * the subtree colouring that backs the multi-pivot safety oracle
//!   [SpanningTree::check_arc]. Colours are maintained incrementally within
//!   a multi-pivot round: the round starts from the uniform reset state,
//!   each applied pivot cuts the subtree under its freshly-zeroed arc into a
//!   new colour, and arcs regaining flow merge their subtree back into the
//!   parent colour. `parent_color` links a colour to the colour across its
//!   positive-flow boundary edge and the per-node `subtree_level` records
//!   the depth within the coloured subtree, whose parity the oracle tests.

use thiserror::Error;

use crate::config::CycleStrategy;
use crate::flow::FlowStore;

mod cycle;
pub use cycle::{Cycle, Stone};

pub type NodeId = usize;
pub type ColorId = usize;

/// A tree edge given by its two node ids (one row node, one column node).
pub type TreeArc = (NodeId, NodeId);

// -------------------------------------------------------------------------------------------------
// Main structs.

#[derive(Debug, Clone)]
pub struct SpanningTree {
    root: NodeId,
    nodes: usize,
    m: usize,
    n: usize,
    built: bool,

    level: Vec<usize>,
    subtree_level: Vec<Option<usize>>,
    parent: Vec<Option<NodeId>>,
    first_child: Vec<Option<NodeId>>,
    elder_sib: Vec<Option<NodeId>>,
    younger_sib: Vec<Option<NodeId>>,
    color: Vec<ColorId>,
    parent_color: Vec<Option<ColorId>>,
    path_mask: Vec<bool>,
    next_color: ColorId,
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Tree has no edges yet; build it from a basis first")]
    EmptyTree,
    #[error("Invalid tree operation: {0}")]
    InvalidTree(String),
    #[error("Arcs do not form a consistent basis: {0}")]
    InconsistentBasis(String),
    #[error("No stepping-stone cycle closes arc ({i},{j}); it is probably basic")]
    NoCycle { i: usize, j: usize },
}

// -------------------------------------------------------------------------------------------------
// Construction.

impl SpanningTree {
    /// Allocate a tree over `nodes = m+n` nodes with `m` row nodes. The tree
    /// has no edges until [SpanningTree::build] is called.
    pub fn new(root: NodeId, nodes: usize, m: usize) -> Result<Self, TreeError> {
        if nodes == 0 || root >= nodes || m == 0 || m >= nodes {
            return Err(TreeError::InvalidTree(format!(
                "bad tree shape: {} nodes, root {}, {} row nodes",
                nodes, root, m
            )));
        }
        Ok(SpanningTree {
            root,
            nodes,
            m,
            n: nodes - m,
            built: false,
            level: vec![0; nodes],
            subtree_level: vec![None; nodes],
            parent: vec![None; nodes],
            first_child: vec![None; nodes],
            elder_sib: vec![None; nodes],
            younger_sib: vec![None; nodes],
            color: vec![0; nodes],
            parent_color: vec![None; nodes],
            path_mask: vec![false; nodes],
            next_color: 1,
        })
    }

    /// Build the tree links by DFS from the root over the basic arcs, given
    /// as per-row and per-column adjacency (`rows[i]` lists the basic `j`s).
    pub fn build(&mut self, rows: &[Vec<usize>], cols: &[Vec<usize>]) -> Result<(), TreeError> {
        if rows.len() != self.m || cols.len() != self.n {
            return Err(TreeError::InvalidTree(format!(
                "adjacency is {}x{}, tree is {}x{}",
                rows.len(),
                cols.len(),
                self.m,
                self.n
            )));
        }

        self.parent.iter_mut().for_each(|p| *p = None);
        self.first_child.iter_mut().for_each(|p| *p = None);
        self.elder_sib.iter_mut().for_each(|p| *p = None);
        self.younger_sib.iter_mut().for_each(|p| *p = None);

        // Stack entries: (index within its own side, partner of the arc we
        // arrived through, side flag).
        let mut stack: Vec<(usize, Option<usize>, bool)> = Vec::with_capacity(self.nodes);
        let root_is_col = self.root >= self.m;
        self.level[self.root] = 0;
        stack.push((
            if root_is_col {
                self.root - self.m
            } else {
                self.root
            },
            None,
            root_is_col,
        ));

        while let Some((curr, partner, by_col)) = stack.pop() {
            if by_col {
                let cnode = self.m + curr;
                let mut prev: Option<NodeId> = None;
                for &i in &cols[curr] {
                    if Some(i) == partner {
                        continue;
                    }
                    self.parent[i] = Some(cnode);
                    self.level[i] = self.level[cnode] + 1;
                    match prev {
                        None => self.first_child[cnode] = Some(i),
                        Some(p) => {
                            self.elder_sib[i] = Some(p);
                            self.younger_sib[p] = Some(i);
                        }
                    }
                    prev = Some(i);
                    stack.push((i, Some(curr), false));
                }
            } else {
                let mut prev: Option<NodeId> = None;
                for &j in &rows[curr] {
                    if Some(j) == partner {
                        continue;
                    }
                    let cnode = self.m + j;
                    self.parent[cnode] = Some(curr);
                    self.level[cnode] = self.level[curr] + 1;
                    match prev {
                        None => self.first_child[curr] = Some(cnode),
                        Some(p) => {
                            self.elder_sib[cnode] = Some(p);
                            self.younger_sib[p] = Some(cnode);
                        }
                    }
                    prev = Some(cnode);
                    stack.push((j, Some(curr), true));
                }
            }
        }

        self.built = true;
        Ok(())
    }

    /// Convenience wrapper over [SpanningTree::build] for a flat arc list.
    pub fn build_from_arcs(&mut self, arcs: &[(usize, usize)]) -> Result<(), TreeError> {
        let mut rows = vec![Vec::new(); self.m];
        let mut cols = vec![Vec::new(); self.n];
        for &(i, j) in arcs {
            if i >= self.m || j >= self.n {
                return Err(TreeError::InvalidTree(format!(
                    "arc ({},{}) out of bounds",
                    i, j
                )));
            }
            rows[i].push(j);
            cols[j].push(i);
        }
        self.build(&rows, &cols)
    }

    fn ensure_built(&self) -> Result<(), TreeError> {
        if self.built {
            Ok(())
        } else {
            Err(TreeError::EmptyTree)
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Accessor methods.

impl SpanningTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    pub fn row_count(&self) -> usize {
        self.m
    }

    pub fn is_row_node(&self, nd: NodeId) -> bool {
        nd < self.m
    }

    pub fn parent_of(&self, nd: NodeId) -> Option<NodeId> {
        self.parent[nd]
    }

    pub fn level_of(&self, nd: NodeId) -> usize {
        self.level[nd]
    }

    pub fn color_of(&self, nd: NodeId) -> ColorId {
        self.color[nd]
    }

    pub fn color_count(&self) -> ColorId {
        self.next_color
    }

    /// Number of non-root nodes without a parent. Zero on a spanning tree.
    pub fn detached_count(&self) -> usize {
        (0..self.nodes)
            .filter(|&v| v != self.root && self.parent[v].is_none())
            .count()
    }

    /// Walk up to the top of the (sub)tree containing `nd`.
    fn root_of(&self, mut nd: NodeId) -> NodeId {
        while let Some(p) = self.parent[nd] {
            nd = p;
        }
        nd
    }
}

// -------------------------------------------------------------------------------------------------
// Dual multipliers and tree walks.

impl SpanningTree {
    /// Propagate the dual multipliers `u`, `v` so that `u[i] + v[j] =
    /// c[i,j]` holds on every tree arc.
    ///
    /// With `start == None` the whole tree is walked from the root, whose
    /// multiplier anchors the system at zero. With `start == Some(nd)` only
    /// the subtree under `nd` is re-propagated; `nd`'s own multiplier must
    /// still be valid from an earlier propagation.
    pub fn propagate_multipliers(
        &self,
        costs: &[f64],
        us: &mut [f64],
        vs: &mut [f64],
        start: Option<NodeId>,
    ) -> Result<(), TreeError> {
        self.ensure_built()?;

        let mut stack: Vec<(NodeId, bool)> = Vec::with_capacity(self.nodes);
        match start {
            None => {
                let root_is_col = self.root >= self.m;
                if root_is_col {
                    vs[self.root - self.m] = 0.0;
                } else {
                    us[self.root] = 0.0;
                }
                stack.push((self.root, root_is_col));
            }
            Some(nd) => stack.push((nd, nd >= self.m)),
        }

        while let Some((cnd, is_col)) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                if is_col {
                    us[b] = costs[b * self.n + (cnd - self.m)] - vs[cnd - self.m];
                } else {
                    vs[b - self.m] = costs[cnd * self.n + (b - self.m)] - us[cnd];
                }
                stack.push((b, !is_col));
                bnd = self.younger_sib[b];
            }
        }
        Ok(())
    }

    /// Objective value and total shipped quantity over the basic arcs.
    /// Flows are rounded to the integral target regime before summing.
    pub fn objective(&self, costs: &[f64], flows: &FlowStore) -> Result<(f64, f64), TreeError> {
        self.ensure_built()?;

        let mut objf = 0.0;
        let mut total = 0.0;
        let mut stack = vec![(self.root, self.root >= self.m)];
        while let Some((cnd, is_col)) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                let c = if is_col {
                    b * self.n + (cnd - self.m)
                } else {
                    cnd * self.n + (b - self.m)
                };
                let q = flows.get(c).unwrap_or(0.0).round();
                objf += costs[c] * q;
                total += q;
                stack.push((b, !is_col));
                bnd = self.younger_sib[b];
            }
        }
        Ok((objf, total))
    }

    /// The basic cells `(i, j)` in tree walk order.
    pub fn basic_cells(&self) -> Result<Vec<(usize, usize)>, TreeError> {
        self.ensure_built()?;

        let mut cells = Vec::with_capacity(self.nodes - 1);
        let mut stack = vec![(self.root, self.root >= self.m)];
        while let Some((cnd, is_col)) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                if is_col {
                    cells.push((b, cnd - self.m));
                } else {
                    cells.push((cnd, b - self.m));
                }
                stack.push((b, !is_col));
                bnd = self.younger_sib[b];
            }
        }
        Ok(cells)
    }

    /// Per-source support `supp[i] = { j : x[i,j] > threshold }` for the
    /// shielding neighbourhood, gathered in one tree walk.
    pub fn shielding_support(
        &self,
        flows: &FlowStore,
        threshold: f64,
    ) -> Result<Vec<Vec<usize>>, TreeError> {
        self.ensure_built()?;

        let mut supp = vec![Vec::new(); self.m];
        let mut stack = vec![(self.root, self.root >= self.m)];
        while let Some((cnd, is_col)) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                let (i, j) = if is_col {
                    (b, cnd - self.m)
                } else {
                    (cnd, b - self.m)
                };
                if flows.get(i * self.n + j).unwrap_or(0.0) > threshold {
                    supp[i].push(j);
                }
                stack.push((b, !is_col));
                bnd = self.younger_sib[b];
            }
        }
        Ok(supp)
    }
}

// -------------------------------------------------------------------------------------------------
// Cycle search.

impl SpanningTree {
    /// Find the unique cycle in `tree ∪ {entering}`.
    ///
    /// Both strategies return the identical stone sequence: the entering arc
    /// first, then the alternating tree arcs around the loop.
    pub fn find_cycle(
        &mut self,
        entering: Stone,
        strategy: CycleStrategy,
    ) -> Result<Cycle, TreeError> {
        self.ensure_built()?;
        if entering.i >= self.m || entering.j >= self.n {
            return Err(TreeError::InvalidTree(format!(
                "entering arc ({},{}) out of bounds",
                entering.i, entering.j
            )));
        }
        match strategy {
            CycleStrategy::TwoSidedApex => self.find_cycle_two_sided(entering),
            CycleStrategy::PathThenCut => self.find_cycle_path_cut(entering),
        }
    }

    /// One step of a walk toward the root, recording the traversed arc.
    fn walk_step(&self, node: &mut Option<NodeId>, is_col: &mut bool, stones: &mut Vec<Stone>) {
        let next = match *node {
            Some(nd) => {
                let p = self.parent[nd];
                if let Some(p) = p {
                    if *is_col {
                        stones.push(Stone::new(p, nd - self.m));
                    } else {
                        stones.push(Stone::new(nd, p - self.m));
                    }
                }
                p
            }
            None => None,
        };
        *node = next;
        *is_col = !*is_col;
    }

    /// Full walk to the root, recording every traversed arc.
    fn walk_to_root(&self, mut node: NodeId, mut is_col: bool, stones: &mut Vec<Stone>) {
        while let Some(p) = self.parent[node] {
            if is_col {
                stones.push(Stone::new(p, node - self.m));
            } else {
                stones.push(Stone::new(node, p - self.m));
            }
            node = p;
            is_col = !is_col;
        }
    }

    /// Two-sided walk: both endpoints climb simultaneously, marking visited
    /// nodes; the first walk to step onto a marked node has reached the
    /// apex. `O(cycle length)`.
    fn find_cycle_two_sided(&mut self, entering: Stone) -> Result<Cycle, TreeError> {
        let m = self.m;
        let mut left: Vec<Stone> = Vec::with_capacity(m / 2 + 2);
        let mut right: Vec<Stone> = Vec::with_capacity(m / 2 + 2);
        let mut lnode: Option<NodeId> = Some(m + entering.j);
        let mut rnode: Option<NodeId> = Some(entering.i);
        let mut lcol = true;
        let mut rcol = false;
        let mut right_hit = false;

        left.push(entering);
        self.path_mask[m + entering.j] = true;
        self.path_mask[entering.i] = true;

        loop {
            self.walk_step(&mut lnode, &mut lcol, &mut left);
            if let Some(nd) = lnode {
                if self.path_mask[nd] {
                    break;
                }
                self.path_mask[nd] = true;
            }
            self.walk_step(&mut rnode, &mut rcol, &mut right);
            if let Some(nd) = rnode {
                if self.path_mask[nd] {
                    right_hit = true;
                    break;
                }
                self.path_mask[nd] = true;
            }
            if lnode.is_none() && rnode.is_none() {
                // Both walks fell off without meeting: corrupt tree. The
                // length check below reports it.
                break;
            }
        }
        self.path_mask.iter_mut().for_each(|v| *v = false);

        let no_cycle = TreeError::NoCycle {
            i: entering.i,
            j: entering.j,
        };
        if right_hit {
            let apex = *right.last().ok_or(no_cycle)?;
            let s = left
                .iter()
                .position(|st| st.i == apex.i || st.j == apex.j)
                .map_or(left.len(), |p| p + 1);
            left.truncate(s);
            left.extend(right.iter().rev());
        } else {
            let apex = *left.last().ok_or(no_cycle)?;
            let s = right
                .iter()
                .position(|st| st.i == apex.i || st.j == apex.j)
                .map_or(right.len(), |p| p + 1);
            right.truncate(s);
            let first = left[0];
            let last = left[left.len() - 1];
            if !(first.i == last.i || first.j == last.j) {
                left.extend(right.iter().rev());
            }
        }

        if left.len() < 4 {
            return Err(TreeError::NoCycle {
                i: entering.i,
                j: entering.j,
            });
        }
        Ok(Cycle::new(left, self.n))
    }

    /// Path-then-cut: walk each side fully to the root, then drop the
    /// longest common suffix. `O(path lengths)`.
    fn find_cycle_path_cut(&self, entering: Stone) -> Result<Cycle, TreeError> {
        let mut left: Vec<Stone> = Vec::with_capacity(self.m + 1);
        left.push(entering);
        self.walk_to_root(self.m + entering.j, true, &mut left);

        let mut right: Vec<Stone> = Vec::with_capacity(self.m + 1);
        self.walk_to_root(entering.i, false, &mut right);

        let mut k = 0;
        while k < left.len() && k < right.len() {
            if left[left.len() - 1 - k] == right[right.len() - 1 - k] {
                k += 1;
            } else {
                break;
            }
        }
        left.truncate(left.len() - k);
        right.truncate(right.len() - k);
        left.extend(right.iter().rev());

        if left.len() < 4 {
            return Err(TreeError::NoCycle {
                i: entering.i,
                j: entering.j,
            });
        }
        Ok(Cycle::new(left, self.n))
    }
}

// -------------------------------------------------------------------------------------------------
// Pivot update.

impl SpanningTree {
    /// Replace the leaving tree arc by the entering one: detach splits the
    /// tree in two, attach re-roots the severed part and hangs it back
    /// through the entering arc.
    pub fn swap_arc(
        &mut self,
        leaving: TreeArc,
        entering: TreeArc,
        update_levels: bool,
    ) -> Result<(), TreeError> {
        self.ensure_built()?;
        self.detach(leaving.0, leaving.1)?;
        self.attach(entering.0, entering.1, update_levels)?;
        Ok(())
    }

    /// Sever the tree edge between `a` and `b`; returns the root of the
    /// subtree that came loose.
    fn detach(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, TreeError> {
        let (parent, child) = if self.parent[b] == Some(a) {
            (a, b)
        } else if self.parent[a] == Some(b) {
            (b, a)
        } else {
            return Err(TreeError::InconsistentBasis(format!(
                "detach of non-adjacent nodes {} (parent {:?}) and {} (parent {:?})",
                a, self.parent[a], b, self.parent[b]
            )));
        };

        self.parent[child] = None;
        if self.first_child[parent] == Some(child) {
            self.first_child[parent] = self.younger_sib[child];
            if let Some(y) = self.younger_sib[child] {
                self.elder_sib[y] = None;
            }
        } else {
            if let Some(e) = self.elder_sib[child] {
                self.younger_sib[e] = self.younger_sib[child];
            }
            if let Some(y) = self.younger_sib[child] {
                self.elder_sib[y] = self.elder_sib[child];
            }
        }
        self.elder_sib[child] = None;
        self.younger_sib[child] = None;
        Ok(child)
    }

    /// Make `child` a child of `parent`, prepending it to the sibling list.
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if self.parent[child].is_some() {
            return Err(TreeError::InvalidTree(format!(
                "node {} already has a parent",
                child
            )));
        }
        self.parent[child] = Some(parent);
        self.younger_sib[child] = self.first_child[parent];
        if let Some(fc) = self.first_child[parent] {
            self.elder_sib[fc] = Some(child);
        }
        self.first_child[parent] = Some(child);
        Ok(())
    }

    /// Invert the parent links along the path from `nd` to the root of its
    /// subtree, making `nd` that subtree's root.
    fn revert_ancestry(&mut self, nd: NodeId) -> Result<(), TreeError> {
        let mut path = Vec::with_capacity(self.m.max(2));
        let mut cur = nd;
        path.push(cur);
        while let Some(p) = self.parent[cur] {
            path.push(p);
            cur = p;
        }
        for k in (1..path.len()).rev() {
            self.detach(path[k], path[k - 1])?;
            self.add_child(path[k - 1], path[k])?;
        }
        Ok(())
    }

    /// Re-connect the two subtrees through the arc `(a, b)`. The side still
    /// holding the tree root keeps its ancestry; the other side is inverted
    /// so the arc can take over as its parent link.
    fn attach(&mut self, a: NodeId, b: NodeId, update_levels: bool) -> Result<(), TreeError> {
        if self.root_of(a) == self.root {
            self.revert_ancestry(b)?;
            self.add_child(a, b)?;
            if update_levels {
                self.update_levels_from(b, self.level[a] + 1);
            }
        } else {
            self.revert_ancestry(a)?;
            self.add_child(b, a)?;
            if update_levels {
                self.update_levels_from(a, self.level[b] + 1);
            }
        }
        Ok(())
    }

    /// Recompute `level` in the subtree under `nd`.
    fn update_levels_from(&mut self, nd: NodeId, nd_level: usize) {
        let mut stack = vec![nd];
        self.level[nd] = nd_level;
        while let Some(cnd) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                self.level[b] = self.level[cnd] + 1;
                stack.push(b);
                bnd = self.younger_sib[b];
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Subtree colouring and the multi-pivot oracle.

impl SpanningTree {
    /// Back to the uniform colouring: one colour, no boundaries, levels
    /// unknown. Called at the end of every multi-pivot round.
    pub fn reset_colors(&mut self) {
        self.subtree_level.iter_mut().for_each(|l| *l = None);
        self.color.iter_mut().for_each(|c| *c = 0);
        self.parent_color = vec![None; self.nodes];
        self.next_color = 1;
    }

    fn new_color(&mut self) -> ColorId {
        if self.next_color + 1 >= self.parent_color.len() {
            let grow = self.parent_color.len() + self.nodes;
            self.parent_color.resize(grow, None);
        }
        let c = self.next_color;
        self.next_color += 1;
        c
    }

    /// Cut the subtree hanging under the freshly-zeroed arc into a new
    /// colour, recording the parent colour across the cut.
    pub fn color_subtree(&mut self, zero_arc: TreeArc) -> Result<(), TreeError> {
        self.recolor(zero_arc, 0, None, false)
    }

    /// Merge the subtree under a freshly-unzeroed arc back into the colour
    /// on the parent side of that arc.
    pub fn merge_subtree(&mut self, unzero_arc: TreeArc) -> Result<(), TreeError> {
        self.ensure_built()?;
        let (a, b) = unzero_arc;
        let par = if self.parent[b] == Some(a) { a } else { b };
        let strl = self.subtree_level[par].map_or(0, |l| l + 1);
        let clr = self.color[par];
        self.recolor(unzero_arc, strl, Some(clr), false)
    }

    fn recolor(
        &mut self,
        arc: TreeArc,
        strl: usize,
        clr: Option<ColorId>,
        ignore_levels: bool,
    ) -> Result<(), TreeError> {
        self.ensure_built()?;
        let (a, b) = arc;
        if a >= self.nodes || b >= self.nodes {
            return Err(TreeError::InvalidTree(format!(
                "colouring arc ({},{}) out of bounds",
                a, b
            )));
        }

        let rnd = if self.parent[b] == Some(a) { b } else { a };
        let other = if rnd == b { a } else { b };
        let stc = match clr {
            Some(c) => c,
            None => {
                let c = self.new_color();
                self.parent_color[c] = Some(self.color[other]);
                c
            }
        };

        self.color[rnd] = stc;
        self.subtree_level[rnd] = if clr == Some(0) { None } else { Some(strl) };

        let mut stack = vec![rnd];
        while let Some(cnd) = stack.pop() {
            let mut bnd = self.first_child[cnd];
            while let Some(b) = bnd {
                if ignore_levels || self.subtree_level[b] != Some(0) {
                    self.color[b] = stc;
                    self.subtree_level[b] = if clr == Some(0) {
                        None
                    } else {
                        Some(self.subtree_level[cnd].map_or(0, |l| l + 1))
                    };
                    stack.push(b);
                } else {
                    // A previously-cut subtree roots here: just relink its
                    // parent colour.
                    let cb = self.color[b];
                    self.parent_color[cb] = Some(stc);
                }
                bnd = self.younger_sib[b];
            }
        }
        Ok(())
    }

    /// Whether `subtree_level` parity counts as odd; an unknown level does.
    fn stl_odd(&self, nd: NodeId) -> bool {
        self.subtree_level[nd].map_or(true, |l| l % 2 == 1)
    }

    /// The multi-pivot safety oracle: may the entering arc be pivoted in the
    /// current round without invalidating the pivots already applied?
    ///
    /// At greed level 0 the oracle only accepts arcs it can prove safe from
    /// the colour structure; higher levels accept more arcs, trading the
    /// occasional wasted cycle search for fewer rejections.
    pub fn check_arc(&self, arc: TreeArc, greed_level: u8) -> Result<bool, TreeError> {
        self.ensure_built()?;
        let (a, b) = arc;
        if a >= self.nodes || b >= self.nodes {
            return Err(TreeError::InvalidTree(format!(
                "oracle arc ({},{}) out of bounds",
                a, b
            )));
        }

        let ca = self.color[a];
        let cb = self.color[b];
        if greed_level > 0 {
            let c1 = ca == cb;
            let c2 = ca != cb
                && ((self.parent_color[ca] == Some(cb) && self.stl_odd(a))
                    || (self.parent_color[cb] == Some(ca) && self.stl_odd(b)));
            let c3 = ca != cb
                && self.parent_color[ca] == self.parent_color[cb]
                && self.stl_odd(a)
                && self.stl_odd(b);
            Ok(c1 || c2 || c3)
        } else {
            let mut c1 = false;
            if ca != cb {
                let mut cb_is_ancestor = false;
                let mut pcl = self.parent_color[ca];
                while let Some(c) = pcl {
                    if c == cb {
                        cb_is_ancestor = true;
                        break;
                    }
                    pcl = self.parent_color[c];
                }
                let mut ca_is_ancestor = false;
                let mut pcl = self.parent_color[cb];
                while let Some(c) = pcl {
                    if c == ca {
                        ca_is_ancestor = true;
                        break;
                    }
                    pcl = self.parent_color[c];
                }
                c1 = (cb_is_ancestor && !self.stl_odd(a)) || (ca_is_ancestor && !self.stl_odd(b));
            }
            let c2 = ca != cb
                && ((self.parent_color[ca] == Some(cb) && !self.stl_odd(a))
                    || (self.parent_color[cb] == Some(ca) && !self.stl_odd(b)));
            Ok(!(c1 || c2))
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Structural equality: same node set, same parent links.

impl PartialEq for SpanningTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.root == other.root && self.parent == other.parent
    }
}

// -------------------------------------------------------------------------------------------------
// Unit tests.
