//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the bounding boxes of its items, stored as a flat node
//! array. Construction splits each node on the longest axis of its bounding
//! box, at the midpoint of the members' centroid extent along that axis, and
//! partitions the item array in place. Leaves refer to ranges of that array.

use crate::hittable::{HitDistance, Hittable};
use lumen_math::{Aabb, Interval, Ray};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with a range of items.
#[derive(Debug, Clone, Copy)]
enum BvhNode {
    /// Internal node with two children (indices into the node array).
    Branch { bbox: Aabb, left: usize, right: usize },
    /// Leaf node covering `items[start..end]`.
    Leaf { bbox: Aabb, start: usize, end: usize },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// A BVH that owns its items.
pub struct Bvh<T: Hittable> {
    items: Vec<T>,
    nodes: Vec<BvhNode>,
}

impl<T: Hittable> Bvh<T> {
    /// Build a BVH over the given items.
    ///
    /// The items are reordered during construction; use [`Bvh::items`] to see
    /// the final order.
    pub fn new(mut items: Vec<T>) -> Self {
        let mut nodes = Vec::new();
        if !items.is_empty() {
            nodes.reserve(2 * items.len() / LEAF_MAX_SIZE + 1);
            Self::build(&mut items, 0, &mut nodes);
        }
        Self { items, nodes }
    }

    /// Recursive construction; returns the index of the created node.
    fn build(items: &mut [T], offset: usize, nodes: &mut Vec<BvhNode>) -> usize {
        let bbox = items
            .iter()
            .fold(Aabb::EMPTY, |acc, item| Aabb::surrounding(&acc, &item.bounding_box()));

        let index = nodes.len();
        let leaf = BvhNode::Leaf {
            bbox,
            start: offset,
            end: offset + items.len(),
        };
        nodes.push(leaf);

        if items.len() <= LEAF_MAX_SIZE {
            return index;
        }

        let axis = bbox.longest_axis();
        let (lo, hi) = items.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), item| {
            let c = item.centroid()[axis];
            (lo.min(c), hi.max(c))
        });
        let mid = (lo + hi) * 0.5;

        let split = partition(items, |item| item.centroid()[axis] < mid);
        if split == 0 || split == items.len() {
            // Every centroid fell on one side; keep the node as a leaf
            return index;
        }

        let (left_items, right_items) = items.split_at_mut(split);
        let left = Self::build(left_items, offset, nodes);
        let right = Self::build(right_items, offset + split, nodes);
        nodes[index] = BvhNode::Branch { bbox, left, right };

        index
    }

    /// Items in BVH order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of levels in the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[BvhNode], index: usize) -> usize {
            match nodes[index] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Branch { left, right, .. } => {
                    1 + depth_of(nodes, left).max(depth_of(nodes, right))
                }
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }

    /// Bounding box of everything in the tree.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| *root.bbox())
    }

    /// Closest hit strictly inside `ray_t`.
    ///
    /// Returns the index into [`Bvh::items`] of the item that was hit along
    /// with its hit record.
    pub fn intersect_nearest(&self, ray: &Ray, ray_t: Interval) -> Option<(usize, T::Hit)> {
        let root = self.nodes.first()?;
        let root_distance = root.bbox().hit_distance(ray, ray_t)?;

        let mut closest = ray_t.max;
        let mut best = None;
        let mut stack = Vec::with_capacity(32);
        stack.push((0usize, root_distance));

        while let Some((index, entry)) = stack.pop() {
            // A closer hit may have been found since this node was pushed
            if entry > closest {
                continue;
            }

            match self.nodes[index] {
                BvhNode::Leaf { start, end, .. } => {
                    for index in start..end {
                        if let Some(hit) = self.items[index].hit(ray, ray_t.with_max(closest)) {
                            closest = hit.distance();
                            best = Some((index, hit));
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    let interval = ray_t.with_max(closest);
                    let left_distance = self.nodes[left].bbox().hit_distance(ray, interval);
                    let right_distance = self.nodes[right].bbox().hit_distance(ray, interval);

                    // Push the farther child first so the nearer one is visited first
                    match (left_distance, right_distance) {
                        (Some(l), Some(r)) if l <= r => {
                            stack.push((right, r));
                            stack.push((left, l));
                        }
                        (Some(l), Some(r)) => {
                            stack.push((left, l));
                            stack.push((right, r));
                        }
                        (Some(l), None) => stack.push((left, l)),
                        (None, Some(r)) => stack.push((right, r)),
                        (None, None) => {}
                    }
                }
            }
        }

        best
    }

    /// True as soon as any item is hit with `0 < t < max_distance`.
    pub fn intersect_any(&self, ray: &Ray, max_distance: f32) -> bool {
        let ray_t = Interval::POSITIVE.with_max(max_distance);
        let Some(root) = self.nodes.first() else {
            return false;
        };
        if !root.bbox().hit(ray, ray_t) {
            return false;
        }

        let mut stack = Vec::with_capacity(32);
        stack.push(0usize);

        while let Some(index) = stack.pop() {
            match self.nodes[index] {
                BvhNode::Leaf { start, end, .. } => {
                    if self.items[start..end].iter().any(|item| item.hit(ray, ray_t).is_some()) {
                        return true;
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    for child in [left, right] {
                        if self.nodes[child].bbox().hit(ray, ray_t) {
                            stack.push(child);
                        }
                    }
                }
            }
        }

        false
    }
}

/// Two-pointer in-place partition; returns the number of items satisfying `pred`,
/// which end up at the front.
fn partition<T>(items: &mut [T], mut pred: impl FnMut(&T) -> bool) -> usize {
    let mut i = 0;
    let mut j = items.len();
    while i < j {
        if pred(&items[i]) {
            i += 1;
        } else {
            j -= 1;
            items.swap(i, j);
        }
    }
    i
}
