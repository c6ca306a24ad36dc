//! Layered node placement.
//!
//! Placement works in a top-to-bottom frame: ranks advance along `y` and
//! nodes within a rank are ordered along `x`. Callers handle other rank
//! directions by transposing sizes going in and positions coming out.
//!
//! rust-sugiyama assigns each connected component its own coordinates; its
//! `y` values identify ranks and its `x` values give the crossing-reduced
//! order inside each rank. Both are mapped onto real sizes here: ranks are
//! stacked using the tallest node of each rank, and nodes in a rank are
//! pushed apart until their boxes no longer overlap.

use std::collections::{HashMap, HashSet};

use log::debug;
use rust_sugiyama::configure::Config;

use clickgraph_core::geometry::{Point, Size};

use crate::error::{DotError, Result};

/// Gaps between placed nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    /// Minimum horizontal gap between neighbours in a rank and between components.
    pub node: f32,
    /// Vertical gap between consecutive ranks.
    pub rank: f32,
}

/// A node with its rank and provisional horizontal position.
#[derive(Debug, Clone, Copy)]
struct Slot {
    rank: usize,
    x: f32,
}

/// Returns the centre of every node, indexed like `sizes`.
///
/// All coordinates are non-negative and the top-left of the occupied area is
/// at the origin.
pub fn place(sizes: &[Size], edges: &[(usize, usize)], spacing: Spacing) -> Result<Vec<Point>> {
    if sizes.is_empty() {
        return Ok(Vec::new());
    }

    let mut layout_edges: Vec<(u32, u32)> = Vec::new();
    let mut seen = HashSet::new();
    for &(source, target) in edges {
        if source == target || source >= sizes.len() || target >= sizes.len() {
            continue;
        }
        let edge = (source as u32, target as u32);
        if seen.insert(edge) {
            layout_edges.push(edge);
        }
    }

    let mut slots: Vec<Option<Slot>> = vec![None; sizes.len()];
    let mut component_spans: Vec<Vec<usize>> = Vec::new();

    if !layout_edges.is_empty() {
        debug!(
            nodes = sizes.len(),
            edges = layout_edges.len();
            "Applying Sugiyama placement"
        );
        for component in run_sugiyama(layout_edges.clone(), sizes)? {
            let members = assign_component(&component, &layout_edges, &mut slots);
            component_spans.push(members);
        }
    }

    // Nodes without any edge share the first rank, after the components.
    let isolated: Vec<usize> = (0..sizes.len()).filter(|i| slots[*i].is_none()).collect();
    for (order, index) in isolated.iter().enumerate() {
        slots[*index] = Some(Slot {
            rank: 0,
            x: order as f32,
        });
    }
    if !isolated.is_empty() {
        component_spans.push(isolated);
    }

    let rank_count = slots
        .iter()
        .flatten()
        .map(|slot| slot.rank + 1)
        .max()
        .unwrap_or(1);
    let rank_centers = stack_ranks(&slots, sizes, rank_count, spacing.rank);

    let mut centers = vec![Point::default(); sizes.len()];
    let mut offset_x = 0.0f32;
    for members in &component_spans {
        let xs = spread_ranks(members, &slots, sizes, rank_count, spacing.node);
        let min_left = members
            .iter()
            .map(|i| xs[i] - sizes[*i].width() / 2.0)
            .fold(f32::INFINITY, f32::min);
        let max_right = members
            .iter()
            .map(|i| xs[i] + sizes[*i].width() / 2.0)
            .fold(f32::NEG_INFINITY, f32::max);

        for index in members {
            let Some(slot) = slots[*index] else {
                continue;
            };
            centers[*index] = Point::new(
                offset_x + xs[index] - min_left,
                rank_centers[slot.rank],
            );
        }
        offset_x += (max_right - min_left) + spacing.node;
    }

    Ok(centers)
}

type SugiyamaCoords = Vec<(usize, (f64, f64))>;

fn run_sugiyama(edges: Vec<(u32, u32)>, sizes: &[Size]) -> Result<Vec<SugiyamaCoords>> {
    let avg_node_size = sizes
        .iter()
        .map(|s| (s.width() + s.height()) / 2.0)
        .sum::<f32>()
        / sizes.len() as f32;

    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: (avg_node_size / 50.0).clamp(2.0, 5.0) as f64,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    });

    match layouts {
        Ok(results) if !results.is_empty() => Ok(results
            .into_iter()
            .map(|(coords, _, _)| {
                coords
                    .into_iter()
                    .map(|(id, (x, y))| (id as usize, (x as f64, y as f64)))
                    .collect()
            })
            .collect()),
        Ok(_) => Err(DotError::Layout(
            "rust-sugiyama returned empty layout results".to_string(),
        )),
        Err(err) => {
            let message = if let Some(panic_msg) = err.downcast_ref::<String>() {
                format!("rust-sugiyama panicked: {panic_msg}")
            } else if let Some(panic_msg) = err.downcast_ref::<&str>() {
                format!("rust-sugiyama panicked: {panic_msg}")
            } else {
                "rust-sugiyama panicked with unknown error".to_string()
            };
            Err(DotError::Layout(message))
        }
    }
}

/// Records rank and order for one component, returning its member indices.
fn assign_component(
    coords: &SugiyamaCoords,
    edges: &[(u32, u32)],
    slots: &mut [Option<Slot>],
) -> Vec<usize> {
    let mut levels: Vec<f64> = coords.iter().map(|(_, (_, y))| *y).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup_by(|a, b| (*a - *b).abs() < 1e-6);

    let rank_of = |y: f64| {
        levels
            .iter()
            .position(|level| (level - y).abs() < 1e-6)
            .unwrap_or(0)
    };

    let mut ranks: HashMap<usize, usize> = HashMap::new();
    let mut order: HashMap<usize, f32> = HashMap::new();
    for &(id, (x, y)) in coords {
        if id >= slots.len() {
            debug!(id; "Node id from rust-sugiyama result is out of range");
            continue;
        }
        ranks.insert(id, rank_of(y));
        order.insert(id, x as f32);
    }

    // Edges should point down the rank axis; flip when the engine went the other way.
    let (mut down, mut up) = (0usize, 0usize);
    for (source, target) in edges {
        if let (Some(s), Some(t)) = (ranks.get(&(*source as usize)), ranks.get(&(*target as usize))) {
            match s.cmp(t) {
                std::cmp::Ordering::Less => down += 1,
                std::cmp::Ordering::Greater => up += 1,
                std::cmp::Ordering::Equal => {}
            }
        }
    }
    let max_rank = levels.len().saturating_sub(1);
    let flip = up > down;

    let mut members: Vec<usize> = ranks.keys().copied().collect();
    members.sort_unstable();
    for id in &members {
        let rank = if flip { max_rank - ranks[id] } else { ranks[id] };
        slots[*id] = Some(Slot {
            rank,
            x: order[id],
        });
    }
    members
}

/// Centre `y` of every rank, stacking ranks by their tallest member.
fn stack_ranks(slots: &[Option<Slot>], sizes: &[Size], rank_count: usize, gap: f32) -> Vec<f32> {
    let mut heights = vec![0.0f32; rank_count];
    for (index, slot) in slots.iter().enumerate() {
        if let Some(slot) = slot {
            heights[slot.rank] = heights[slot.rank].max(sizes[index].height());
        }
    }

    let mut centers = Vec::with_capacity(rank_count);
    let mut top = 0.0f32;
    for height in heights {
        centers.push(top + height / 2.0);
        top += height + gap;
    }
    centers
}

/// Final `x` centre of each member, keeping the engine's order within a rank
/// and separating neighbours by at least `gap`.
fn spread_ranks(
    members: &[usize],
    slots: &[Option<Slot>],
    sizes: &[Size],
    rank_count: usize,
    gap: f32,
) -> HashMap<usize, f32> {
    let max_width = members
        .iter()
        .map(|i| sizes[*i].width())
        .fold(0.0f32, f32::max);
    let unit = max_width + gap;

    let mut by_rank: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for index in members {
        if let Some(slot) = slots[*index] {
            by_rank[slot.rank].push(*index);
        }
    }

    let mut xs = HashMap::new();
    for rank in &mut by_rank {
        rank.sort_by(|a, b| {
            let (xa, xb) = (slot_x(slots, *a), slot_x(slots, *b));
            xa.total_cmp(&xb).then(a.cmp(b))
        });

        let mut previous: Option<(f32, f32)> = None;
        for index in rank.iter() {
            let half = sizes[*index].width() / 2.0;
            let mut x = slot_x(slots, *index) * unit;
            if let Some((previous_x, previous_half)) = previous {
                x = x.max(previous_x + previous_half + gap + half);
            }
            xs.insert(*index, x);
            previous = Some((x, half));
        }
    }
    xs
}

fn slot_x(slots: &[Option<Slot>], index: usize) -> f32 {
    slots[index].map_or(0.0, |slot| slot.x)
}
