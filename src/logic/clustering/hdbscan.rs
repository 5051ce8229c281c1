//! Hierarchical density clustering (HDBSCAN, excess-of-mass selection)
//!
//! 1. Core distance of each point = distance to its `min_samples`-th neighbour
//! 2. Minimum spanning tree over mutual reachability distance (Prim, O(n) memory)
//! 3. Single-linkage hierarchy from the sorted tree edges
//! 4. Condensed tree: splits smaller than `min_cluster_size` become point fall-out
//! 5. Pick the most stable non-overlapping clusters; the root is never a cluster
//!
//! Points that fall out before reaching a selected cluster are noise.

use std::cmp::Ordering;
use std::collections::VecDeque;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use super::types::ClusterError;
use crate::constants::NOISE_LABEL;

/// Distances below this are treated as equal to it when taking 1/d
const MIN_DISTANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hdbscan {
    min_cluster_size: usize,
    min_samples: usize,
}

impl Default for Hdbscan {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            min_samples: 5,
        }
    }
}

impl Hdbscan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size.max(2);
        self
    }

    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples.max(1);
        self
    }

    /// Label every row. Groups are numbered 0.. in order of discovery.
    pub fn fit(&self, data: &Array2<f64>) -> Result<Vec<i32>, ClusterError> {
        let n = data.nrows();
        if n == 0 {
            return Err(ClusterError::Empty);
        }
        for (row, values) in data.rows().into_iter().enumerate() {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ClusterError::NonFinite { row });
            }
        }
        if n < self.min_cluster_size || n < 2 {
            return Ok(vec![NOISE_LABEL; n]);
        }

        let k = self.min_samples.min(n - 1);
        let core = core_distances(data, k);
        let mst = mutual_reachability_mst(data, &core);
        let hierarchy = single_linkage(n, mst);
        let condensed = condense(n, &hierarchy, self.min_cluster_size);
        let selected = select_clusters(n, &condensed);
        Ok(assign_labels(n, &condensed, &selected))
    }
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

// ============================================================================
// CORE DISTANCES + SPANNING TREE
// ============================================================================

/// Distance to the k-th nearest neighbour, the point itself at index 0
fn core_distances(data: &Array2<f64>, k: usize) -> Vec<f64> {
    let n = data.nrows();
    (0..n)
        .into_par_iter()
        .map(|i| {
            let row = data.row(i);
            let mut dists: Vec<f64> = (0..n).map(|j| euclidean(row, data.row(j))).collect();
            let (_, kth, _) = dists.select_nth_unstable_by(k, |a, b| a.total_cmp(b));
            *kth
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    a: usize,
    b: usize,
    weight: f64,
}

fn mutual_reachability_mst(data: &Array2<f64>, core: &[f64]) -> Vec<Edge> {
    let n = data.nrows();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut best_from = vec![0usize; n];
    let mut edges = Vec::with_capacity(n - 1);

    let mut current = 0;
    in_tree[0] = true;

    for _ in 1..n {
        let from = data.row(current);
        let core_from = core[current];
        best.par_iter_mut()
            .zip(best_from.par_iter_mut())
            .enumerate()
            .for_each(|(j, (b, f))| {
                if in_tree[j] {
                    return;
                }
                let d = euclidean(from, data.row(j)).max(core_from).max(core[j]);
                if d < *b {
                    *b = d;
                    *f = current;
                }
            });

        let mut next = usize::MAX;
        let mut next_weight = f64::INFINITY;
        for j in 0..n {
            if !in_tree[j] && (next == usize::MAX || best[j] < next_weight) {
                next = j;
                next_weight = best[j];
            }
        }

        in_tree[next] = true;
        edges.push(Edge {
            a: best_from[next],
            b: next,
            weight: next_weight,
        });
        current = next;
    }

    edges
}

// ============================================================================
// HIERARCHY
// ============================================================================

/// Merge `n + i` of the single-linkage dendrogram
#[derive(Debug, Clone, Copy)]
struct Merge {
    left: usize,
    right: usize,
    distance: f64,
    size: usize,
}

struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..2 * n - 1).collect(),
            size: (0..2 * n - 1).map(|i| if i < n { 1 } else { 0 }).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    /// Join two roots under the new node `into`
    fn union(&mut self, a: usize, b: usize, into: usize) {
        self.parent[a] = into;
        self.parent[b] = into;
        self.size[into] = self.size[a] + self.size[b];
    }
}

fn single_linkage(n: usize, mut edges: Vec<Edge>) -> Vec<Merge> {
    edges.sort_by(|x, y| x.weight.total_cmp(&y.weight));

    let mut uf = UnionFind::new(n);
    let mut merges = Vec::with_capacity(n - 1);
    for (i, edge) in edges.iter().enumerate() {
        let left = uf.find(edge.a);
        let right = uf.find(edge.b);
        let node = n + i;
        uf.union(left, right, node);
        merges.push(Merge {
            left,
            right,
            distance: edge.weight,
            size: uf.size[node],
        });
    }
    merges
}

fn node_size(n: usize, hierarchy: &[Merge], node: usize) -> usize {
    if node < n {
        1
    } else {
        hierarchy[node - n].size
    }
}

/// Breadth-first walk of a dendrogram subtree
fn subtree(n: usize, hierarchy: &[Merge], root: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        out.push(node);
        if node >= n {
            let merge = hierarchy[node - n];
            queue.push_back(merge.left);
            queue.push_back(merge.right);
        }
    }
    out
}

// ============================================================================
// CONDENSED TREE
// ============================================================================

/// Edge of the condensed tree. Children below `n` are points, the rest clusters.
#[derive(Debug, Clone, Copy)]
struct CondensedEdge {
    parent: usize,
    child: usize,
    lambda: f64,
    size: usize,
}

fn condense(n: usize, hierarchy: &[Merge], min_cluster_size: usize) -> Vec<CondensedEdge> {
    let root = 2 * n - 2;
    let mut relabel = vec![0usize; 2 * n - 1];
    relabel[root] = n;
    let mut next_label = n + 1;
    let mut ignore = vec![false; 2 * n - 1];
    let mut out = Vec::new();

    for node in subtree(n, hierarchy, root) {
        if ignore[node] || node < n {
            continue;
        }

        let merge = hierarchy[node - n];
        let lambda = 1.0 / merge.distance.max(MIN_DISTANCE);
        let parent = relabel[node];
        let left_size = node_size(n, hierarchy, merge.left);
        let right_size = node_size(n, hierarchy, merge.right);

        let fall_out = |side: usize, ignore: &mut [bool], out: &mut Vec<CondensedEdge>| {
            for sub in subtree(n, hierarchy, side) {
                if sub < n {
                    out.push(CondensedEdge {
                        parent,
                        child: sub,
                        lambda,
                        size: 1,
                    });
                }
                ignore[sub] = true;
            }
        };

        match (left_size >= min_cluster_size, right_size >= min_cluster_size) {
            (true, true) => {
                for (side, size) in [(merge.left, left_size), (merge.right, right_size)] {
                    relabel[side] = next_label;
                    out.push(CondensedEdge {
                        parent,
                        child: next_label,
                        lambda,
                        size,
                    });
                    next_label += 1;
                }
            }
            (false, false) => {
                fall_out(merge.left, &mut ignore[..], &mut out);
                fall_out(merge.right, &mut ignore[..], &mut out);
            }
            (true, false) => {
                relabel[merge.left] = parent;
                fall_out(merge.right, &mut ignore[..], &mut out);
            }
            (false, true) => {
                relabel[merge.right] = parent;
                fall_out(merge.left, &mut ignore[..], &mut out);
            }
        }
    }

    out
}

// ============================================================================
// SELECTION + LABELS
// ============================================================================

/// Excess-of-mass selection. Returns a flag per condensed label (index - n).
fn select_clusters(n: usize, condensed: &[CondensedEdge]) -> Vec<bool> {
    let max_label = condensed
        .iter()
        .map(|e| e.parent.max(e.child))
        .max()
        .unwrap_or(n)
        .max(n);
    let count = max_label - n + 1;

    let mut birth = vec![0.0f64; count];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for edge in condensed.iter().filter(|e| e.child >= n) {
        birth[edge.child - n] = edge.lambda;
        children[edge.parent - n].push(edge.child - n);
    }

    let mut stability = vec![0.0f64; count];
    for edge in condensed {
        let p = edge.parent - n;
        stability[p] += (edge.lambda - birth[p]) * edge.size as f64;
    }

    let mut selected = vec![true; count];
    selected[0] = false;

    // children always carry larger labels than their parent
    for c in (1..count).rev() {
        let child_total: f64 = children[c].iter().map(|&ch| stability[ch]).sum();
        if child_total.partial_cmp(&stability[c]) == Some(Ordering::Greater) {
            selected[c] = false;
            stability[c] = child_total;
        } else {
            let mut stack = children[c].clone();
            while let Some(d) = stack.pop() {
                selected[d] = false;
                stack.extend(children[d].iter().copied());
            }
        }
    }

    selected
}

fn assign_labels(n: usize, condensed: &[CondensedEdge], selected: &[bool]) -> Vec<i32> {
    let mut parent_of = vec![usize::MAX; n + selected.len()];
    for edge in condensed {
        parent_of[edge.child] = edge.parent;
    }

    let mut label_of = vec![NOISE_LABEL; selected.len()];
    let mut next = 0;
    for (c, &is_selected) in selected.iter().enumerate() {
        if is_selected {
            label_of[c] = next;
            next += 1;
        }
    }

    (0..n)
        .map(|point| {
            let mut node = parent_of[point];
            while node != usize::MAX && node > n {
                if selected[node - n] {
                    return label_of[node - n];
                }
                node = parent_of[node];
            }
            NOISE_LABEL
        })
        .collect()
}
