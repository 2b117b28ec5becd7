use super::{NodeIdx, Point, Triangulation, Triangulator};
use crate::error::{FemError, FemResult};

/// Triangulates lexicographically ordered lattice nodes
/// (see [`super::nodes::lattice_nodes`]) by splitting each lattice cell
/// along its diagonal.
#[derive(Debug, Clone, Copy)]
pub struct LatticeTriangulator {
  nnodes_axis: usize,
}

impl LatticeTriangulator {
  pub fn new(nnodes_axis: usize) -> Self {
    Self { nnodes_axis }
  }

  pub fn nnodes_axis(&self) -> usize {
    self.nnodes_axis
  }
  pub fn ncells_axis(&self) -> usize {
    self.nnodes_axis.saturating_sub(1)
  }

  fn node(&self, ix: usize, iy: usize) -> NodeIdx {
    ix + iy * self.nnodes_axis
  }
}

impl Triangulator for LatticeTriangulator {
  fn triangulate(&self, points: &[Point]) -> FemResult<Triangulation> {
    let k = self.nnodes_axis;
    if k < 2 {
      return Err(FemError::Triangulation(format!(
        "lattice needs at least 2 nodes per axis, got {k}"
      )));
    }
    if points.len() != k * k {
      return Err(FemError::Triangulation(format!(
        "expected {} lattice nodes, got {}",
        k * k,
        points.len()
      )));
    }

    let ncells_axis = self.ncells_axis();
    let mut cells = Vec::with_capacity(2 * ncells_axis * ncells_axis);
    for iy in 0..ncells_axis {
      for ix in 0..ncells_axis {
        let v00 = self.node(ix, iy);
        let v10 = self.node(ix + 1, iy);
        let v01 = self.node(ix, iy + 1);
        let v11 = self.node(ix + 1, iy + 1);
        cells.push([v00, v10, v11]);
        cells.push([v11, v01, v00]);
      }
    }

    // counter-clockwise around the hull, starting at the lower left corner
    let last = k - 1;
    let mut segments = Vec::with_capacity(4 * ncells_axis);
    for i in 0..last {
      segments.push([self.node(i, 0), self.node(i + 1, 0)]);
    }
    for i in 0..last {
      segments.push([self.node(last, i), self.node(last, i + 1)]);
    }
    for i in (1..=last).rev() {
      segments.push([self.node(i, last), self.node(i - 1, last)]);
    }
    for i in (1..=last).rev() {
      segments.push([self.node(0, i), self.node(0, i - 1)]);
    }

    Ok(Triangulation { cells, segments })
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{config::Domain, mesh::nodes::lattice_nodes};

  use itertools::Itertools;

  #[test]
  fn counts() {
    for k in 2..=6 {
      let points = lattice_nodes(&Domain::reference_square(), k);
      let tria = LatticeTriangulator::new(k).triangulate(&points).unwrap();
      assert_eq!(points.len(), k * k);
      assert_eq!(tria.cells.len(), 2 * (k - 1) * (k - 1));
      assert_eq!(tria.segments.len(), 4 * (k - 1));
    }
  }

  #[test]
  fn hull_is_closed_loop() {
    let k = 4;
    let points = lattice_nodes(&Domain::reference_square(), k);
    let tria = LatticeTriangulator::new(k).triangulate(&points).unwrap();
    for (a, b) in tria.segments.iter().circular_tuple_windows() {
      assert_eq!(a[1], b[0]);
    }
  }

  #[test]
  fn wrong_point_count() {
    let points = lattice_nodes(&Domain::reference_square(), 3);
    assert!(LatticeTriangulator::new(4).triangulate(&points).is_err());
  }
}
