//! Earth mover's distance between images.
//!
//! An image of `image_width x image_height` pixels, stored row-major with
//! one coordinate per pixel, is cut into a grid of equally sized windows.
//! A window's weight is its total brightness plus one, so no window is ever
//! empty, and each signature is scaled to total mass one. The distance is
//! the cost of the cheapest flow that moves one signature onto the other,
//! where moving unit mass between two windows costs the Euclidean distance
//! between their centers.

use crate::error::{HashClustError, Result};
use serde::{Deserialize, Serialize};

/// Residual capacities at or below this count as saturated.
const FLOW_EPSILON: f64 = 1e-12;

/// Partition of an image into equally sized windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGrid {
    /// Image width in pixels.
    pub image_width: usize,

    /// Image height in pixels.
    pub image_height: usize,

    /// Window width in pixels; divides `image_width`.
    pub window_width: usize,

    /// Window height in pixels; divides `image_height`.
    pub window_height: usize,
}

impl WindowGrid {
    /// Create a grid, failing unless the window size divides the image size.
    pub fn new(image_width: usize, image_height: usize, window_width: usize, window_height: usize) -> Result<Self> {
        if image_width == 0 || image_height == 0 || window_width == 0 || window_height == 0 {
            return Err(HashClustError::configuration("image and window sizes must be > 0"));
        }
        if image_width % window_width != 0 || image_height % window_height != 0 {
            return Err(HashClustError::configuration(format!(
                "{window_width}x{window_height} windows do not tile a {image_width}x{image_height} image"
            )));
        }
        Ok(Self {
            image_width,
            image_height,
            window_width,
            window_height,
        })
    }

    /// Windows per grid row.
    pub fn columns(&self) -> usize {
        self.image_width / self.window_width
    }

    /// Windows per grid column.
    pub fn rows(&self) -> usize {
        self.image_height / self.window_height
    }

    /// Total number of windows.
    pub fn num_windows(&self) -> usize {
        self.columns() * self.rows()
    }

    /// Pixels per image.
    pub fn dimensionality(&self) -> usize {
        self.image_width * self.image_height
    }

    /// Center of window `index`. Windows are numbered row-major from the
    /// top-left one; `y` grows upward.
    pub fn window_center(&self, index: usize) -> (f64, f64) {
        let column = index % self.columns();
        let row = index / self.columns();
        let x = (column as f64 + 0.5) * self.window_width as f64;
        let y = ((self.rows() - row) as f64 - 0.5) * self.window_height as f64;
        (x, y)
    }

    /// Ground distance between the centers of two windows.
    pub fn window_distance(&self, a: usize, b: usize) -> f64 {
        let (ax, ay) = self.window_center(a);
        let (bx, by) = self.window_center(b);
        (ax - bx).hypot(ay - by)
    }

    /// Normalized window weights of `image`.
    pub fn signature(&self, image: &[f32]) -> Result<Vec<f64>> {
        if image.len() != self.dimensionality() {
            return Err(HashClustError::dimension_mismatch(self.dimensionality(), image.len()));
        }

        let mut weights = vec![1.0f64; self.num_windows()];
        for (pixel, &value) in image.iter().enumerate() {
            let x = pixel % self.image_width;
            let y = pixel / self.image_width;
            weights[(y / self.window_height) * self.columns() + x / self.window_width] += value as f64;
        }
        if weights.iter().any(|&w| w < 0.0) {
            return Err(HashClustError::configuration("window brightness must be non-negative"));
        }

        let total: f64 = weights.iter().sum();
        weights.iter_mut().for_each(|w| *w /= total);
        Ok(weights)
    }
}

/// Earth mover's distance over a fixed [`WindowGrid`].
///
/// Ground distances between all window pairs are computed once.
#[derive(Debug, Clone)]
pub struct EarthMoverDistance {
    grid: WindowGrid,
    ground: Vec<f64>,
}

impl EarthMoverDistance {
    /// Create the distance for images cut by `grid`.
    pub fn new(grid: WindowGrid) -> Self {
        let n = grid.num_windows();
        let ground = (0..n * n).map(|i| grid.window_distance(i / n, i % n)).collect();
        Self { grid, ground }
    }

    /// The window grid.
    pub fn grid(&self) -> &WindowGrid {
        &self.grid
    }

    /// Distance between two images.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        let from = self.grid.signature(a)?;
        let to = self.grid.signature(b)?;
        Ok(self.between_signatures(&from, &to))
    }

    /// Distance between two signatures produced by [`WindowGrid::signature`].
    pub fn between_signatures(&self, from: &[f64], to: &[f64]) -> f64 {
        debug_assert_eq!(from.len(), self.grid.num_windows());
        debug_assert_eq!(to.len(), self.grid.num_windows());
        transport_cost(from, to, &self.ground)
    }
}

#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    to: usize,
    residual: f64,
    cost: f64,
}

/// Residual network; edge `e ^ 1` is the reverse of edge `e`.
#[derive(Debug)]
struct FlowNetwork {
    edges: Vec<FlowEdge>,
    outgoing: Vec<Vec<usize>>,
}

impl FlowNetwork {
    fn new(nodes: usize) -> Self {
        Self {
            edges: Vec::new(),
            outgoing: vec![Vec::new(); nodes],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, capacity: f64, cost: f64) {
        self.outgoing[from].push(self.edges.len());
        self.edges.push(FlowEdge {
            to,
            residual: capacity,
            cost,
        });
        self.outgoing[to].push(self.edges.len());
        self.edges.push(FlowEdge {
            to: from,
            residual: 0.0,
            cost: -cost,
        });
    }

    /// Cheapest residual path by Bellman-Ford, as its cost and its edges
    /// from sink back to source.
    fn cheapest_path(&self, source: usize, sink: usize) -> Option<(f64, Vec<usize>)> {
        let nodes = self.outgoing.len();
        let mut dist = vec![f64::INFINITY; nodes];
        let mut via: Vec<Option<usize>> = vec![None; nodes];
        dist[source] = 0.0;

        for _ in 1..nodes {
            let mut changed = false;
            for u in 0..nodes {
                if dist[u].is_infinite() {
                    continue;
                }
                for &e in &self.outgoing[u] {
                    let edge = self.edges[e];
                    let through = dist[u] + edge.cost;
                    if edge.residual > FLOW_EPSILON && through < dist[edge.to] - FLOW_EPSILON {
                        dist[edge.to] = through;
                        via[edge.to] = Some(e);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        if dist[sink].is_infinite() {
            return None;
        }
        let mut path = Vec::new();
        let mut node = sink;
        while node != source {
            let e = via[node]?;
            path.push(e);
            if path.len() > nodes {
                return None;
            }
            node = self.edges[e ^ 1].to;
        }
        Some((dist[sink], path))
    }

    /// Send up to `amount` from `source` to `sink` along successively
    /// cheapest paths and return the total cost.
    fn min_cost_flow(&mut self, source: usize, sink: usize, amount: f64) -> f64 {
        let mut remaining = amount;
        let mut cost = 0.0;
        let max_augmentations = self.edges.len() * self.outgoing.len();

        for _ in 0..max_augmentations {
            if remaining <= FLOW_EPSILON {
                break;
            }
            let Some((path_cost, path)) = self.cheapest_path(source, sink) else {
                break;
            };
            let pushed = path.iter().map(|&e| self.edges[e].residual).fold(remaining, f64::min);
            for &e in &path {
                self.edges[e].residual -= pushed;
                self.edges[e ^ 1].residual += pushed;
            }
            remaining -= pushed;
            cost += pushed * path_cost;
        }
        cost
    }
}

/// Minimum cost of moving `supply` onto `demand`, with `ground[i * m + j]`
/// the unit cost from supplier `i` to consumer `j` of `m`.
fn transport_cost(supply: &[f64], demand: &[f64], ground: &[f64]) -> f64 {
    let (n, m) = (supply.len(), demand.len());
    debug_assert_eq!(ground.len(), n * m);

    let source = 0;
    let sink = n + m + 1;
    let mut network = FlowNetwork::new(n + m + 2);
    for (i, &s) in supply.iter().enumerate() {
        network.add_edge(source, 1 + i, s, 0.0);
        for j in 0..m {
            network.add_edge(1 + i, 1 + n + j, f64::INFINITY, ground[i * m + j]);
        }
    }
    for (j, &d) in demand.iter().enumerate() {
        network.add_edge(1 + n + j, sink, d, 0.0);
    }

    let amount = supply.iter().sum::<f64>().min(demand.iter().sum());
    network.min_cost_flow(source, sink, amount)
}
