use crate::aabb::AABB;
use crate::config::BvhStrategy;
use crate::ray::Ray;
use crate::shape::{intersect_arc, GeoPoint, SyncGeometry};
use crate::vector::Axis;

use std::cmp;
use std::sync::Arc;

/// Reusable scratch buffer for BVH traversal, sized once at construction so
/// a render never has to allocate mid-trace (spec.md §5's "no heap
/// allocation per ray" note). Mirrors the teacher's `Workspace` enum.
pub struct Workspace {
    stack: Vec<usize>,
}

impl Workspace {
    fn new(capacity: usize) -> Workspace {
        Workspace {
            stack: Vec::with_capacity(capacity),
        }
    }
}

enum Node {
    Leaf {
        bounding_box: AABB,
        shapes: Vec<Arc<SyncGeometry>>,
    },
    Interior {
        bounding_box: AABB,
        cut_axis: Axis,
        // Left child is always this node's index + 1; only the right
        // child's offset needs to be stored (teacher's aggregate.rs arena
        // layout, addressed by index rather than parent/child pointers).
        right_offset: usize,
    },
}

fn node_bounding_box(node: &Node) -> &AABB {
    match node {
        Node::Leaf { bounding_box, .. } => bounding_box,
        Node::Interior { bounding_box, .. } => bounding_box,
    }
}

/// Bounding volume hierarchy over a flat shape list, with a configurable
/// split strategy and leaf capacity (spec.md §4.3). Infinite geometry
/// (planes, tubes with `aabb() == None`) never enters the tree; callers
/// keep those in a separate unbounded list tested linearly on every ray.
pub struct Bvh {
    nodes: Vec<Node>,
}

impl Bvh {
    pub fn build(shapes: Vec<Arc<SyncGeometry>>, strategy: BvhStrategy, leaf_size: usize) -> Bvh {
        let leaf_size = leaf_size.clamp(1, 4);
        let mut nodes = Vec::new();
        if !shapes.is_empty() && strategy != BvhStrategy::Off {
            build_recursive(&mut nodes, shapes, strategy, leaf_size, 0);
        } else if !shapes.is_empty() {
            // bvh: Off still needs a traversable structure: one leaf holding
            // everything, which degrades gracefully to a linear scan.
            let bounding_box = union_all(&shapes);
            nodes.push(Node::Leaf {
                bounding_box,
                shapes,
            });
        }
        Bvh { nodes }
    }

    pub fn get_workspace(&self) -> Workspace {
        Workspace::new(self.nodes.len().max(1))
    }

    /// Closest intersection within `(t_min, t_max)`, or `None`.
    pub fn closest_hit(&self, r: &Ray, t_min: f32, t_max: f32, workspace: &mut Workspace) -> Option<GeoPoint> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut modified_t_max = t_max;
        let mut closest: Option<GeoPoint> = None;

        workspace.stack.clear();
        workspace.stack.push(0);

        while let Some(cur_idx) = workspace.stack.pop() {
            match &self.nodes[cur_idx] {
                Node::Leaf {
                    bounding_box,
                    shapes,
                } => {
                    if !bounding_box.intersect(r, t_min, modified_t_max) {
                        continue;
                    }
                    for shape in shapes {
                        if let Some(hits) = intersect_arc(shape, r, modified_t_max) {
                            for gp in hits {
                                let t = (gp.point - r.origin).length();
                                if t > t_min && t < modified_t_max {
                                    modified_t_max = t;
                                    closest = Some(gp);
                                }
                            }
                        }
                    }
                }
                Node::Interior {
                    bounding_box,
                    cut_axis,
                    right_offset,
                } => {
                    if !bounding_box.intersect(r, t_min, modified_t_max) {
                        continue;
                    }
                    // Push far first so the near child pops (and prunes
                    // modified_t_max) before the far child is explored.
                    if r.dir[*cut_axis] < 0_f32 {
                        workspace.stack.push(cur_idx + 1);
                        workspace.stack.push(cur_idx + right_offset);
                    } else {
                        workspace.stack.push(cur_idx + right_offset);
                        workspace.stack.push(cur_idx + 1);
                    }
                }
            }
        }

        closest
    }

    /// Every intersection within `(t_min, t_max)`, for shadow/transparency
    /// queries that need the full set of blockers rather than just the
    /// nearest one.
    pub fn all_hits(&self, r: &Ray, t_min: f32, t_max: f32, workspace: &mut Workspace) -> Vec<GeoPoint> {
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            return out;
        }

        workspace.stack.clear();
        workspace.stack.push(0);

        while let Some(cur_idx) = workspace.stack.pop() {
            match &self.nodes[cur_idx] {
                Node::Leaf {
                    bounding_box,
                    shapes,
                } => {
                    if !bounding_box.intersect(r, t_min, t_max) {
                        continue;
                    }
                    for shape in shapes {
                        if let Some(hits) = intersect_arc(shape, r, t_max) {
                            out.extend(hits.into_iter().filter(|gp| {
                                let t = (gp.point - r.origin).length();
                                t > t_min && t < t_max
                            }));
                        }
                    }
                }
                Node::Interior {
                    bounding_box,
                    right_offset,
                    ..
                } => {
                    if !bounding_box.intersect(r, t_min, t_max) {
                        continue;
                    }
                    workspace.stack.push(cur_idx + 1);
                    workspace.stack.push(cur_idx + right_offset);
                }
            }
        }

        out
    }
}

fn union_all(shapes: &[Arc<SyncGeometry>]) -> AABB {
    let mut bounds = AABB::empty();
    for s in shapes {
        if let Some(bb) = s.aabb() {
            bounds = AABB::union(&bounds, &bb);
        }
    }
    bounds
}

fn build_recursive(
    nodes: &mut Vec<Node>,
    mut shapes: Vec<Arc<SyncGeometry>>,
    strategy: BvhStrategy,
    leaf_size: usize,
    depth: usize,
) {
    let total_bounds = union_all(&shapes);

    if shapes.len() <= leaf_size {
        nodes.push(Node::Leaf {
            bounding_box: total_bounds,
            shapes,
        });
        return;
    }

    let mut centroid_bounds = AABB::empty();
    for s in &shapes {
        if let Some(bb) = s.aabb() {
            centroid_bounds = AABB::union_point(&centroid_bounds, &bb.center());
        }
    }

    let cut_axis = match strategy {
        BvhStrategy::Median => Axis::from_index(depth % 3),
        _ => centroid_bounds.largest_axis(),
    };

    if centroid_bounds.max[cut_axis] == centroid_bounds.min[cut_axis] {
        nodes.push(Node::Leaf {
            bounding_box: total_bounds,
            shapes,
        });
        return;
    }

    shapes.sort_by(|a, b| {
        let a_c = a.aabb().map(|bb| bb.center()[cut_axis]).unwrap_or(0_f32);
        let b_c = b.aabb().map(|bb| bb.center()[cut_axis]).unwrap_or(0_f32);
        a_c.partial_cmp(&b_c).unwrap_or(cmp::Ordering::Equal)
    });

    let split_index = match strategy {
        BvhStrategy::Median => shapes.len() / 2,
        _ => match sah_split(&shapes, &total_bounds) {
            Some(idx) => idx,
            None => {
                nodes.push(Node::Leaf {
                    bounding_box: total_bounds,
                    shapes,
                });
                return;
            }
        },
    };
    let split_index = split_index.clamp(1, shapes.len() - 1);

    let second_half = shapes.split_off(split_index);

    nodes.push(Node::Interior {
        bounding_box: AABB::empty(),
        cut_axis,
        right_offset: 0,
    });
    let node_idx = nodes.len() - 1;

    build_recursive(nodes, shapes, strategy, leaf_size, depth + 1);

    let right_offset = nodes.len() - node_idx;
    nodes[node_idx] = Node::Interior {
        bounding_box: total_bounds,
        cut_axis,
        right_offset,
    };

    build_recursive(nodes, second_half, strategy, leaf_size, depth + 1);
}

/// Binned SAH cost comparison (spec.md §4.3): picks the split index with
/// lowest estimated traversal cost, falling back to `None` (meaning "just
/// make a leaf") when even the best split costs more than visiting every
/// object directly.
fn sah_split(shapes: &[Arc<SyncGeometry>], total_bounds: &AABB) -> Option<usize> {
    let n = shapes.len();
    let mut reverse_bounds = vec![AABB::empty(); n];
    for i in (0..n - 1).rev() {
        let mut bb = shapes[i].aabb().unwrap_or(AABB::empty());
        bb = AABB::union(&bb, &reverse_bounds[i + 1]);
        reverse_bounds[i] = bb;
    }

    let mut forward_bounds = AABB::empty();
    let mut min_cost = f32::MAX;
    let mut min_cost_index = 0;
    let total_area = total_bounds.surface_area().max(1e-6_f32);

    for idx in 0..n - 1 {
        if let Some(bb) = shapes[idx].aabb() {
            forward_bounds = AABB::union(&forward_bounds, &bb);
        }
        let cost = 1_f32
            + (forward_bounds.surface_area() / total_area) * (idx + 1) as f32
            + (reverse_bounds[idx + 1].surface_area() / total_area) * (n - (idx + 1)) as f32;
        if cost < min_cost {
            min_cost = cost;
            min_cost_index = idx;
        }
    }

    if min_cost < n as f32 {
        Some(min_cost_index + 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::point::Point3;
    use crate::shape::Sphere;
    use crate::vector::Vector3;

    fn sphere_at(x: f32) -> Arc<SyncGeometry> {
        Arc::new(Sphere::new(Point3::new(x, 0_f32, 0_f32), 1_f32, Material::black()).unwrap())
    }

    #[test]
    fn bvh_finds_closest_of_two_spheres_in_line() {
        let shapes = vec![sphere_at(0_f32), sphere_at(4_f32)];
        let bvh = Bvh::build(shapes, BvhStrategy::Sah, 1);
        let mut ws = bvh.get_workspace();
        let r = Ray::new(Point3::new(-5_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32));
        let hit = bvh.closest_hit(&r, 1e-3, f32::MAX, &mut ws).unwrap();
        assert!((hit.point.x() - (-1_f32)).abs() < 1e-3);
    }

    #[test]
    fn bvh_all_hits_returns_every_intersection() {
        let shapes = vec![sphere_at(0_f32), sphere_at(4_f32)];
        let bvh = Bvh::build(shapes, BvhStrategy::Median, 1);
        let mut ws = bvh.get_workspace();
        let r = Ray::new(Point3::new(-5_f32, 0_f32, 0_f32), Vector3::new(1_f32, 0_f32, 0_f32));
        let hits = bvh.all_hits(&r, 1e-3, f32::MAX, &mut ws);
        assert_eq!(hits.len(), 4);
    }

    #[test]
    fn empty_bvh_has_no_hits() {
        let bvh = Bvh::build(Vec::new(), BvhStrategy::Sah, 2);
        let mut ws = bvh.get_workspace();
        let r = Ray::new(Point3::origin(), Vector3::new(1_f32, 0_f32, 0_f32));
        assert!(bvh.closest_hit(&r, 1e-3, f32::MAX, &mut ws).is_none());
    }
}
