//! Boundary conditions on the convex hull segments of the mesh.
//!
//! Classification tags every segment once, from the position of its endpoints
//! relative to the sides of the rectangular domain. Enforcement then
//! modifies the assembled system according to the tags.

use crate::{
  config::{BoundaryCondition, Domain, SideConditions},
  matrix::GalerkinMatrix,
  mesh::{NodeIdx, Point, SegmentIdx, TriangleMesh},
  util,
};

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
  Left,
  Right,
  Bottom,
  Top,
}
impl Side {
  /// Order in which the sides are tested. The first match wins.
  pub const PRIORITY: [Side; 4] = [Side::Left, Side::Right, Side::Bottom, Side::Top];

  pub fn condition(self, conditions: &SideConditions) -> BoundaryCondition {
    match self {
      Side::Left => conditions.left,
      Side::Right => conditions.right,
      Side::Bottom => conditions.bottom,
      Side::Top => conditions.top,
    }
  }

  /// Whether `p` lies within `tol` of this side of `domain`.
  pub fn is_near(self, domain: &Domain, tol: f64, p: &Point) -> bool {
    match self {
      Side::Left => p.x < domain.x_min + tol,
      Side::Right => p.x > domain.x_max - tol,
      Side::Bottom => p.y < domain.y_min + tol,
      Side::Top => p.y > domain.y_max - tol,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryTag {
  Dirichlet(f64),
  Neumann(f64),
}
impl From<BoundaryCondition> for BoundaryTag {
  fn from(condition: BoundaryCondition) -> Self {
    match condition {
      BoundaryCondition::Dirichlet(v) => Self::Dirichlet(v),
      BoundaryCondition::Neumann(v) => Self::Neumann(v),
      BoundaryCondition::None => Self::Neumann(0.0),
    }
  }
}

/// Classified boundary segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBoundary {
  pub iseg: SegmentIdx,
  pub nodes: [NodeIdx; 2],
  /// `None` if the segment could not be attributed to any side.
  pub side: Option<Side>,
  pub tag: BoundaryTag,
  pub length: f64,
}

/// Half of the mean boundary segment length.
pub fn classification_tolerance(segment_lengths: &[f64]) -> f64 {
  0.5 * util::mean(segment_lengths.iter().copied()).unwrap_or(0.0)
}

/// First side (in [`Side::PRIORITY`] order) both endpoints are near to.
pub fn classify_segment(coords: &[Point; 2], domain: &Domain, tol: f64) -> Option<Side> {
  Side::PRIORITY
    .into_iter()
    .find(|side| coords.iter().all(|p| side.is_near(domain, tol, p)))
}

/// Tags every boundary segment of the mesh.
///
/// Segments not attributable to any side get a zero-flux Neumann condition.
pub fn classify_boundary(
  mesh: &TriangleMesh,
  domain: &Domain,
  conditions: &SideConditions,
) -> Vec<SegmentBoundary> {
  let lengths = mesh.segment_lengths();
  let tol = classification_tolerance(&lengths);

  let boundary: Vec<_> = (0..mesh.nsegments())
    .map(|iseg| {
      let side = classify_segment(&mesh.segment_coords(iseg), domain, tol);
      let tag = match side {
        Some(side) => side.condition(conditions).into(),
        None => {
          tracing::debug!("boundary segment {iseg} matches no side, using zero-flux Neumann");
          BoundaryTag::Neumann(0.0)
        }
      };
      SegmentBoundary {
        iseg,
        nodes: mesh.segment(iseg),
        side,
        tag,
        length: lengths[iseg],
      }
    })
    .collect();

  let ndirichlet = boundary
    .iter()
    .filter(|s| matches!(s.tag, BoundaryTag::Dirichlet(_)))
    .count();
  tracing::info!(
    "classified {} boundary segments ({} dirichlet) with tolerance {tol:.3e}",
    boundary.len(),
    ndirichlet
  );
  boundary
}

/// Adds the Neumann fluxes to the right-hand side.
///
/// The total flux of a segment, `value * length`, is split equally between
/// its two endpoints.
pub fn enforce_neumann_bc(boundary: &[SegmentBoundary], galvec: &mut na::DVector<f64>) {
  for seg in boundary {
    if let BoundaryTag::Neumann(flux) = seg.tag {
      let contribution = flux * seg.length / 2.0;
      for &inode in &seg.nodes {
        galvec[inode] += contribution;
      }
    }
  }
}

/// The distinct Dirichlet nodes with their prescribed value, in order of
/// first appearance.
///
/// A node shared by segments with conflicting values keeps the value of the
/// last segment.
pub fn dirichlet_dof_coeffs(boundary: &[SegmentBoundary]) -> Vec<(NodeIdx, f64)> {
  let mut coeffs: IndexMap<NodeIdx, f64> = IndexMap::new();
  for seg in boundary {
    let BoundaryTag::Dirichlet(value) = seg.tag else {
      continue;
    };
    for &inode in &seg.nodes {
      if let Some(old) = coeffs.insert(inode, value) {
        if old != value {
          tracing::warn!(
            "node {inode} has conflicting dirichlet values {old} and {value}, using {value}"
          );
        }
      }
    }
  }
  coeffs.into_iter().collect()
}

/// Fix DOFs of FE solution.
///
/// Modifies supplied galerkin matrix and galerkin vector,
/// such that the FE solution has the given coefficents on the dofs.
/// $mat(A_0, 0; 0, I) vec(mu_0, mu_diff) = vec(phi - A_(0 diff) gamma, gamma)$
///
/// The dofs must be distinct.
pub fn fix_dofs_coeff<M: GalerkinMatrix>(
  dof_coeffs: &[(NodeIdx, f64)],
  galmat: &mut M,
  galvec: &mut na::DVector<f64>,
) {
  let ndofs = galmat.nrows();

  let dof_coeffs_opt = util::sparse_to_dense_data(dof_coeffs.to_vec(), ndofs);
  let dof_coeffs_zeroed =
    na::DVector::from_iterator(ndofs, dof_coeffs_opt.iter().map(|v| v.unwrap_or(0.0)));

  // Modify galvec with the still unconstrained matrix.
  *galvec -= galmat.mul_vec(&dof_coeffs_zeroed);

  // Set galvec to prescribed coefficents.
  dof_coeffs.iter().for_each(|&(i, v)| galvec[i] = v);

  // Set entires zero that share a (row or column) index with a fixed dof.
  galmat.set_zero(|r, c| dof_coeffs_opt[r].is_some() || dof_coeffs_opt[c].is_some());

  // Set galmat diagonal for dofs to one.
  for &(i, _) in dof_coeffs {
    galmat.accumulate(i, i, 1.0);
  }
}

pub fn enforce_dirichlet_bc<M: GalerkinMatrix>(
  boundary: &[SegmentBoundary],
  galmat: &mut M,
  galvec: &mut na::DVector<f64>,
) {
  let dof_coeffs = dirichlet_dof_coeffs(boundary);
  fix_dofs_coeff(&dof_coeffs, galmat, galvec);
}

/// Constrains the Dirichlet nodes of the operator matrix only:
/// zero rows and columns with a unit diagonal.
///
/// Returns the constrained nodes.
pub fn enforce_homogeneous_dirichlet_bc<M: GalerkinMatrix>(
  boundary: &[SegmentBoundary],
  galmat: &mut M,
) -> Vec<NodeIdx> {
  let dofs: Vec<_> = dirichlet_dof_coeffs(boundary)
    .into_iter()
    .map(|(inode, _)| inode)
    .collect();
  galmat.constrain_dofs(&dofs);
  dofs
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    linalg::assert_mat_eq,
    mesh::{nodes::NodeLayout, Triangulation},
  };

  fn lattice(k: usize) -> TriangleMesh {
    TriangleMesh::generate(
      &Domain::reference_square(),
      &NodeLayout::Lattice { nnodes_axis: k },
    )
    .unwrap()
  }

  #[test]
  fn lattice_sides() {
    let mesh = lattice(4);
    let conditions = SideConditions {
      left: BoundaryCondition::Dirichlet(1.0),
      right: BoundaryCondition::Dirichlet(2.0),
      bottom: BoundaryCondition::Neumann(3.0),
      top: BoundaryCondition::None,
    };
    let boundary = classify_boundary(&mesh, &Domain::reference_square(), &conditions);
    assert_eq!(boundary.len(), 12);

    let count = |side| boundary.iter().filter(|s| s.side == Some(side)).count();
    for side in Side::PRIORITY {
      assert_eq!(count(side), 3);
    }
    for seg in &boundary {
      let expected = match seg.side {
        Some(Side::Left) => BoundaryTag::Dirichlet(1.0),
        Some(Side::Right) => BoundaryTag::Dirichlet(2.0),
        Some(Side::Bottom) => BoundaryTag::Neumann(3.0),
        Some(Side::Top) => BoundaryTag::Neumann(0.0),
        None => panic!("unclassified segment {}", seg.iseg),
      };
      assert_eq!(seg.tag, expected);
      assert!((seg.length - 2.0 / 3.0).abs() < 1e-12);
    }
  }

  #[test]
  fn corner_priority() {
    let domain = Domain::reference_square();
    let corner = [Point::new(-1.0, -0.95), Point::new(-0.95, -1.0)];
    assert_eq!(classify_segment(&corner, &domain, 0.1), Some(Side::Left));
    let corner = [Point::new(1.0, 0.95), Point::new(0.95, 1.0)];
    assert_eq!(classify_segment(&corner, &domain, 0.1), Some(Side::Right));
    let corner = [Point::new(0.0, 1.0), Point::new(0.5, 1.0)];
    assert_eq!(classify_segment(&corner, &domain, 0.1), Some(Side::Top));
  }

  #[test]
  fn unclassified_defaults_to_zero_flux() {
    // a triangle well inside the domain, its hull touches no side
    let points = vec![
      Point::new(-0.1, -0.1),
      Point::new(0.1, -0.1),
      Point::new(0.0, 0.1),
    ];
    let triangulation = Triangulation {
      cells: vec![[0, 1, 2]],
      segments: vec![[0, 1], [1, 2], [2, 0]],
    };
    let mesh = TriangleMesh::new(points, triangulation).unwrap();
    let conditions = SideConditions::uniform(BoundaryCondition::Dirichlet(5.0));
    let boundary = classify_boundary(&mesh, &Domain::reference_square(), &conditions);
    for seg in &boundary {
      assert_eq!(seg.side, None);
      assert_eq!(seg.tag, BoundaryTag::Neumann(0.0));
    }
    assert!(dirichlet_dof_coeffs(&boundary).is_empty());
  }

  #[test]
  fn shared_nodes_are_fixed_once() {
    let mesh = lattice(3);
    let conditions = SideConditions {
      left: BoundaryCondition::Dirichlet(1.0),
      right: BoundaryCondition::Neumann(0.0),
      bottom: BoundaryCondition::Dirichlet(2.0),
      top: BoundaryCondition::Neumann(0.0),
    };
    let boundary = classify_boundary(&mesh, &Domain::reference_square(), &conditions);
    let coeffs = dirichlet_dof_coeffs(&boundary);

    // bottom nodes 0, 1, 2 and left nodes 6, 3, 0
    assert_eq!(coeffs.len(), 5);
    let value = |inode| coeffs.iter().find(|c| c.0 == inode).map(|c| c.1);
    // the left side comes last in hull order and wins the shared corner
    assert_eq!(value(0), Some(1.0));
    assert_eq!(value(2), Some(2.0));
    assert_eq!(value(6), Some(1.0));
  }

  #[test]
  fn neumann_flux_split() {
    let boundary = [SegmentBoundary {
      iseg: 0,
      nodes: [0, 2],
      side: Some(Side::Top),
      tag: BoundaryTag::Neumann(3.0),
      length: 0.5,
    }];
    let mut galvec = na::DVector::zeros(3);
    enforce_neumann_bc(&boundary, &mut galvec);
    assert_eq!(galvec.as_slice(), &[0.75, 0.0, 0.75]);
  }

  #[test]
  fn fix_dofs() {
    #[rustfmt::skip]
    let mut galmat = na::DMatrix::from_row_slice(3, 3, &[
       2.0, -1.0,  0.0,
      -1.0,  2.0, -1.0,
       0.0, -1.0,  2.0,
    ]);
    let mut galvec = na::DVector::from_vec(vec![1.0, 1.0, 1.0]);
    fix_dofs_coeff(&[(0, 3.0)], &mut galmat, &mut galvec);

    #[rustfmt::skip]
    let expected = na::DMatrix::from_row_slice(3, 3, &[
      1.0,  0.0,  0.0,
      0.0,  2.0, -1.0,
      0.0, -1.0,  2.0,
    ]);
    assert_mat_eq(&galmat, &expected);
    assert_eq!(galvec.as_slice(), &[3.0, 4.0, 1.0]);
  }
}
