//! The integrated vertex/edge queue driving the search.
//!
//! Two ordered structures work together. The *vertex queue* holds tree
//! vertices awaiting expansion, ordered by `g_t(v) ⊕ h_hat(v)`. The *edge
//! queue* holds candidate edges, ordered lexicographically by the solution
//! estimate through the edge and then the tree cost it would produce at the
//! target. The main loop only ever consumes edges; vertices are expanded
//! lazily, one at a time, whenever the best queued vertex could still
//! produce an edge better than the best queued edge.
//!
//! Both structures are `BTreeMap`s with side lookups keyed by vertex id /
//! edge pair, giving targeted O(log n) removal during pruning and
//! resorting without intrusive heap handles.

use std::collections::{BTreeMap, HashMap, HashSet};

use ordered_float::OrderedFloat;

use crate::context::SearchContext;
use crate::objective::{Cost, Objective};
use crate::vertex::{Membership, VertexId};

type VertexKey = (OrderedFloat<f64>, VertexId);

/// Edge-queue sort key. `seq` stabilises ties in insertion order and makes
/// keys unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct EdgeKey {
    f: OrderedFloat<f64>,
    g: OrderedFloat<f64>,
    seq: u64,
}

pub struct SearchQueue<const D: usize> {
    vertex_queue: BTreeMap<VertexKey, VertexId>,
    vertex_lookup: HashMap<VertexId, VertexKey>,
    edge_queue: BTreeMap<EdgeKey, (VertexId, VertexId)>,
    edge_lookup: HashMap<(VertexId, VertexId), EdgeKey>,
    edges_from: HashMap<VertexId, HashSet<VertexId>>,
    edges_to: HashMap<VertexId, HashSet<VertexId>>,
    /// The queue's view of the best solution cost; edges that cannot beat
    /// it are not admitted.
    threshold: Cost,
    /// Roots of subtrees whose cached keys went stale through a rewire.
    unsorted: Vec<VertexId>,
    use_failure_tracking: bool,
    /// Bumped on every reset; vertices whose mark differs have not been
    /// expanded this batch.
    epoch: u64,
    next_seq: u64,
}

impl<const D: usize> SearchQueue<D> {
    pub fn new(use_failure_tracking: bool) -> Self {
        Self {
            vertex_queue: BTreeMap::new(),
            vertex_lookup: HashMap::new(),
            edge_queue: BTreeMap::new(),
            edge_lookup: HashMap::new(),
            edges_from: HashMap::new(),
            edges_to: HashMap::new(),
            threshold: Cost(f64::INFINITY),
            unsorted: Vec::new(),
            use_failure_tracking,
            epoch: 0,
            next_seq: 0,
        }
    }

    pub fn set_use_failure_tracking(&mut self, enabled: bool) {
        self.use_failure_tracking = enabled;
    }

    pub fn use_failure_tracking(&self) -> bool {
        self.use_failure_tracking
    }

    /// Record the new best solution cost.
    pub fn set_threshold(&mut self, threshold: Cost) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> Cost {
        self.threshold
    }

    // ------------------------------------------------------------------
    // Vertex queue
    // ------------------------------------------------------------------

    /// Queue a tree vertex for (re-)expansion, unless it already cannot
    /// help the current solution.
    pub(crate) fn insert_vertex<O: Objective<D>>(
        &mut self,
        ctx: &SearchContext<D, O>,
        v: VertexId,
    ) {
        self.remove_vertex(v);
        let value = ctx.oracle.current_vertex_value(&ctx.graph, v);
        let obj = ctx.oracle.objective();
        if !obj.is_cost_better_than_or_equivalent_to(value, self.threshold) {
            return;
        }
        let key = (OrderedFloat(value.value()), v);
        self.vertex_queue.insert(key, v);
        self.vertex_lookup.insert(v, key);
    }

    fn remove_vertex(&mut self, v: VertexId) {
        if let Some(key) = self.vertex_lookup.remove(&v) {
            self.vertex_queue.remove(&key);
        }
    }

    // ------------------------------------------------------------------
    // Edge queue
    // ------------------------------------------------------------------

    fn insert_edge<O: Objective<D>>(
        &mut self,
        ctx: &SearchContext<D, O>,
        u: VertexId,
        x: VertexId,
    ) {
        let (f, g) = ctx.oracle.edge_sort_key(&ctx.graph, u, x);
        let key = EdgeKey {
            f: OrderedFloat(f.value()),
            g: OrderedFloat(g.value()),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.edge_queue.insert(key, (u, x));
        self.edge_lookup.insert((u, x), key);
        self.edges_from.entry(u).or_default().insert(x);
        self.edges_to.entry(x).or_default().insert(u);
    }

    fn remove_edge(&mut self, u: VertexId, x: VertexId) {
        if let Some(key) = self.edge_lookup.remove(&(u, x)) {
            self.edge_queue.remove(&key);
            if let Some(targets) = self.edges_from.get_mut(&u) {
                targets.remove(&x);
            }
            if let Some(sources) = self.edges_to.get_mut(&x) {
                sources.remove(&u);
            }
        }
    }

    fn remove_edges_incident(&mut self, v: VertexId) {
        if let Some(targets) = self.edges_from.remove(&v) {
            for x in targets {
                if let Some(key) = self.edge_lookup.remove(&(v, x)) {
                    self.edge_queue.remove(&key);
                }
                if let Some(sources) = self.edges_to.get_mut(&x) {
                    sources.remove(&v);
                }
            }
        }
        if let Some(sources) = self.edges_to.remove(&v) {
            for u in sources {
                if let Some(key) = self.edge_lookup.remove(&(u, v)) {
                    self.edge_queue.remove(&key);
                }
                if let Some(targets) = self.edges_from.get_mut(&u) {
                    targets.remove(&v);
                }
            }
        }
    }

    /// Admit the edge `(u, x)` if it passes every insertion condition:
    /// no recorded failure, admissibly better than the threshold, not a
    /// duplicate, not the existing parent relation, and (for tree targets)
    /// actually capable of lowering the target's cost.
    fn enqueue_edge_conditionally<O: Objective<D>>(
        &mut self,
        ctx: &SearchContext<D, O>,
        u: VertexId,
        x: VertexId,
    ) {
        if x == u || self.edge_lookup.contains_key(&(u, x)) {
            return;
        }
        if self.use_failure_tracking && ctx.graph.vertex(u).has_failed_child(x) {
            return;
        }

        let obj = ctx.oracle.objective();
        let admissible = ctx.oracle.lower_bound_edge(&ctx.graph, u, x);
        if !obj.is_cost_better_than(admissible, self.threshold) {
            return;
        }

        let target = ctx.graph.vertex(x);
        if target.membership() == Membership::Tree {
            if target.parent() == Some(u) {
                return;
            }
            let through = ctx.oracle.current_edge_target_value(&ctx.graph, u, x);
            if !obj.is_cost_better_than(through, target.cost()) {
                return;
            }
        }

        self.insert_edge(ctx, u, x);
    }

    // ------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------

    /// Expand queued vertices while the best of them could still produce an
    /// edge better than the current best edge.
    fn update_queue<O: Objective<D>>(&mut self, ctx: &mut SearchContext<D, O>) {
        loop {
            let Some((&(vertex_value, _), &v)) = self.vertex_queue.first_key_value() else {
                break;
            };
            let expand = match self.edge_queue.first_key_value() {
                None => true,
                Some((edge_key, _)) => vertex_value <= edge_key.f,
            };
            if !expand {
                break;
            }
            self.expand_vertex(ctx, v);
        }
    }

    /// Pop one vertex and enumerate its outgoing edge candidates: always
    /// edges to nearby free samples, plus rewiring edges to nearby tree
    /// vertices the first time the vertex is expanded in a batch.
    fn expand_vertex<O: Objective<D>>(&mut self, ctx: &mut SearchContext<D, O>, v: VertexId) {
        self.remove_vertex(v);

        for x in ctx.nearest_samples(v) {
            self.enqueue_edge_conditionally(&*ctx, v, x);
        }

        if ctx.graph.vertex(v).queue_epoch != self.epoch {
            for x in ctx.nearest_vertices(v) {
                self.enqueue_edge_conditionally(&*ctx, v, x);
            }
            ctx.graph.vertex_mut(v).queue_epoch = self.epoch;
        }
    }

    // ------------------------------------------------------------------
    // Consumption
    // ------------------------------------------------------------------

    /// Peek at the best edge, expanding vertices as required.
    pub(crate) fn front_edge<O: Objective<D>>(
        &mut self,
        ctx: &mut SearchContext<D, O>,
    ) -> Option<(VertexId, VertexId)> {
        self.update_queue(ctx);
        self.edge_queue.first_key_value().map(|(_, &edge)| edge)
    }

    /// Sort key of the best edge, expanding vertices as required.
    pub(crate) fn front_edge_value<O: Objective<D>>(
        &mut self,
        ctx: &mut SearchContext<D, O>,
    ) -> Option<(Cost, Cost)> {
        self.update_queue(ctx);
        self.edge_queue
            .first_key_value()
            .map(|(key, _)| (Cost(key.f.0), Cost(key.g.0)))
    }

    /// Remove and return the best edge, expanding vertices as required.
    pub(crate) fn pop_front_edge<O: Objective<D>>(
        &mut self,
        ctx: &mut SearchContext<D, O>,
    ) -> Option<(VertexId, VertexId)> {
        self.update_queue(ctx);
        let (_, (u, x)) = self.edge_queue.pop_first()?;
        self.edge_lookup.remove(&(u, x));
        if let Some(targets) = self.edges_from.get_mut(&u) {
            targets.remove(&x);
        }
        if let Some(sources) = self.edges_to.get_mut(&x) {
            sources.remove(&u);
        }
        Some((u, x))
    }

    /// Drop queued edges into `x` that can no longer lower its cost.
    pub(crate) fn prune_edges_to<O: Objective<D>>(
        &mut self,
        ctx: &SearchContext<D, O>,
        x: VertexId,
    ) {
        let sources: Vec<VertexId> = match self.edges_to.get(&x) {
            Some(sources) => sources.iter().copied().collect(),
            None => return,
        };
        let obj = ctx.oracle.objective();
        let target_cost = ctx.graph.vertex(x).cost();
        for u in sources {
            let through = ctx.oracle.current_edge_target_value(&ctx.graph, u, x);
            if obj.is_cost_worse_than_or_equivalent_to(through, target_cost) {
                self.remove_edge(u, x);
            }
        }
    }

    // ------------------------------------------------------------------
    // Batch lifecycle
    // ------------------------------------------------------------------

    /// Empty both queues and mark every tree vertex as needing
    /// re-expansion in the coming batch.
    pub(crate) fn reset<O: Objective<D>>(&mut self, ctx: &SearchContext<D, O>) {
        self.vertex_queue.clear();
        self.vertex_lookup.clear();
        self.edge_queue.clear();
        self.edge_lookup.clear();
        self.edges_from.clear();
        self.edges_to.clear();
        self.unsorted.clear();
        self.epoch += 1;
        for v in ctx.graph.tree_ids() {
            self.insert_vertex(ctx, v);
        }
    }

    /// Give up on the remainder of the batch.
    pub fn finish(&mut self) {
        self.vertex_queue.clear();
        self.vertex_lookup.clear();
        self.edge_queue.clear();
        self.edge_lookup.clear();
        self.edges_from.clear();
        self.edges_to.clear();
        self.unsorted.clear();
    }

    // ------------------------------------------------------------------
    // Resorting and pruning
    // ------------------------------------------------------------------

    /// Note that a rewire changed `v`'s cost (and, through the cascade, its
    /// whole subtree's); cached keys below `v` are stale until the next
    /// resort.
    pub fn mark_vertex_unsorted(&mut self, v: VertexId) {
        self.unsorted.push(v);
    }

    pub fn is_sorted(&self) -> bool {
        self.unsorted.is_empty()
    }

    /// Recompute stale keys, pruning any vertex that the rewire pushed past
    /// the threshold. Returns `(vertices_disconnected, states_destroyed)`.
    pub(crate) fn resort<O: Objective<D>>(
        &mut self,
        ctx: &mut SearchContext<D, O>,
    ) -> (u64, u64) {
        let mut disconnected = 0;
        let mut destroyed = 0;
        let roots = std::mem::take(&mut self.unsorted);
        let mut visited: HashSet<VertexId> = HashSet::new();
        let obj = ctx.oracle.objective().clone();

        for root in roots {
            if !ctx.graph.contains(root)
                || ctx.graph.vertex(root).membership() != Membership::Tree
            {
                continue;
            }
            for v in ctx.graph.subtree_ids(root) {
                if !visited.insert(v) {
                    continue;
                }
                if !ctx.graph.contains(v) || ctx.graph.vertex(v).membership() != Membership::Tree
                {
                    continue;
                }

                let value = ctx.oracle.current_vertex_value(&ctx.graph, v);
                if obj.is_cost_worse_than(value, self.threshold) {
                    let (d, p) = self.prune_branch(ctx, v);
                    disconnected += d;
                    destroyed += p;
                } else {
                    // Fresh vertex-queue key; an already-expanded vertex
                    // re-enters so its now-cheaper outgoing edges can be
                    // reconsidered.
                    self.insert_vertex(&*ctx, v);
                    let targets: Vec<VertexId> = self
                        .edges_from
                        .get(&v)
                        .map(|targets| targets.iter().copied().collect())
                        .unwrap_or_default();
                    for x in targets {
                        self.remove_edge(v, x);
                        self.enqueue_edge_conditionally(&*ctx, v, x);
                    }
                }
            }
        }

        (disconnected, destroyed)
    }

    /// Full sweep over the tree at a batch boundary, disconnecting every
    /// vertex that cannot beat the threshold. Returns
    /// `(vertices_disconnected, states_destroyed)`.
    pub(crate) fn prune<O: Objective<D>>(&mut self, ctx: &mut SearchContext<D, O>) -> (u64, u64) {
        let mut disconnected = 0;
        let mut destroyed = 0;
        let obj = ctx.oracle.objective().clone();

        for v in ctx.graph.tree_ids() {
            if !ctx.graph.contains(v) || ctx.graph.vertex(v).membership() != Membership::Tree {
                continue;
            }
            let value = ctx.oracle.current_vertex_value(&ctx.graph, v);
            if obj.is_cost_worse_than(value, self.threshold) {
                let (d, p) = self.prune_branch(ctx, v);
                disconnected += d;
                destroyed += p;
            }
        }

        (disconnected, destroyed)
    }

    /// Whether a free sample can no longer be part of a better solution.
    pub(crate) fn sample_prune_condition<O: Objective<D>>(
        &self,
        ctx: &SearchContext<D, O>,
        s: VertexId,
    ) -> bool {
        let obj = ctx.oracle.objective();
        obj.is_cost_worse_than_or_equivalent_to(ctx.oracle.f_hat(&ctx.graph, s), self.threshold)
    }

    /// Disconnect the subtree rooted at `v`. Members whose admissible
    /// solution estimate still beats the threshold are recycled into the
    /// sample pool; the rest are destroyed.
    fn prune_branch<O: Objective<D>>(
        &mut self,
        ctx: &mut SearchContext<D, O>,
        v: VertexId,
    ) -> (u64, u64) {
        let obj = ctx.oracle.objective().clone();
        ctx.graph.clear_parent(v, true, &obj);
        let members = ctx.graph.subtree_ids(v);

        let mut disconnected = 0;
        let mut destroyed = 0;
        for m in members {
            self.remove_vertex(m);
            self.remove_edges_incident(m);
            disconnected += 1;
            if obj.is_cost_better_than(ctx.oracle.f_hat(&ctx.graph, m), self.threshold) {
                ctx.graph.recycle_to_pool(m);
            } else {
                ctx.graph.destroy_tree_vertex(m);
                destroyed += 1;
            }
        }

        (disconnected, destroyed)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// True when there is nothing queued and nothing left to expand.
    pub fn is_empty(&self) -> bool {
        self.edge_queue.is_empty() && self.vertex_queue.is_empty()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_queue.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_queue.len()
    }

    /// Queued edges, best first.
    pub fn list_edges(&self) -> Vec<(VertexId, VertexId)> {
        self.edge_queue.values().copied().collect()
    }

    /// Queued vertices, best first.
    pub fn list_vertices(&self) -> Vec<VertexId> {
        self.vertex_queue.values().copied().collect()
    }
}
