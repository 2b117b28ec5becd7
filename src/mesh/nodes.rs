//! Node generation on a rectangular domain.

use super::Point;
use crate::{
  config::Domain,
  error::{FemError, FemResult},
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Strategy for placing the mesh nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeLayout {
  /// Regular lattice with `nnodes_axis` nodes along each axis.
  Lattice { nnodes_axis: usize },
  /// Uniformly random nodes.
  ///
  /// With at least 8 nodes, the first 8 are pinned to the corners and the
  /// side midpoints, such that the convex hull is the whole domain.
  Random {
    nnodes: usize,
    #[serde(default)]
    seed: u64,
  },
}

impl NodeLayout {
  pub fn validate(&self) -> FemResult<()> {
    match *self {
      Self::Lattice { nnodes_axis } if nnodes_axis < 2 => Err(FemError::InvalidConfiguration(
        format!("lattice needs at least 2 nodes per axis, got {nnodes_axis}"),
      )),
      Self::Random { nnodes, .. } if nnodes < 3 => Err(FemError::InvalidConfiguration(format!(
        "random layout needs at least 3 nodes, got {nnodes}"
      ))),
      _ => Ok(()),
    }
  }

  pub fn nnodes(&self) -> usize {
    match *self {
      Self::Lattice { nnodes_axis } => nnodes_axis * nnodes_axis,
      Self::Random { nnodes, .. } => nnodes,
    }
  }
}

/// `n` equidistant values from `start` to `end` (both inclusive).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
  match n {
    0 => Vec::new(),
    1 => vec![start],
    _ => {
      let step = (end - start) / (n - 1) as f64;
      (0..n)
        .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
        .collect()
    }
  }
}

pub fn generate_nodes(domain: &Domain, layout: &NodeLayout) -> Vec<Point> {
  match *layout {
    NodeLayout::Lattice { nnodes_axis } => lattice_nodes(domain, nnodes_axis),
    NodeLayout::Random { nnodes, seed } => random_nodes(domain, nnodes, seed),
  }
}

/// Lattice nodes, ordered lexicographically with x running fastest:
/// node `i + k*j` sits at `(x_i, y_j)`.
pub fn lattice_nodes(domain: &Domain, nnodes_axis: usize) -> Vec<Point> {
  let xs = linspace(domain.x_min, domain.x_max, nnodes_axis);
  let ys = linspace(domain.y_min, domain.y_max, nnodes_axis);
  ys.iter()
    .flat_map(|&y| xs.iter().map(move |&x| Point::new(x, y)))
    .collect()
}

pub fn random_nodes(domain: &Domain, nnodes: usize, seed: u64) -> Vec<Point> {
  let mut rng = StdRng::seed_from_u64(seed);
  let mut nodes: Vec<Point> = (0..nnodes)
    .map(|_| {
      let x = domain.x_min + domain.width() * rng.random::<f64>();
      let y = domain.y_min + domain.height() * rng.random::<f64>();
      Point::new(x, y)
    })
    .collect();

  if nnodes >= 8 {
    let (x_mid, y_mid) = domain.center();
    let pinned = [
      Point::new(domain.x_min, domain.y_min),
      Point::new(domain.x_min, domain.y_max),
      Point::new(domain.x_max, domain.y_min),
      Point::new(domain.x_max, domain.y_max),
      Point::new(domain.x_min, y_mid),
      Point::new(domain.x_max, y_mid),
      Point::new(x_mid, domain.y_min),
      Point::new(x_mid, domain.y_max),
    ];
    nodes[..pinned.len()].copy_from_slice(&pinned);
  }

  nodes
}
