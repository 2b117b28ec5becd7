//! Global assembly.
//!
//! Element contributions are computed in parallel and purely functionally.
//! The scatter into the global storage is a separate sequential step with
//! exclusive access, so the result does not depend on the thread schedule.

use crate::{
  fe::{ElmatProvider, ElvecProvider, TriangleElement},
  matrix::GalerkinMatrix,
};

use rayon::prelude::*;

pub type GalVec = na::DVector<f64>;

/// Assembly algorithm for the Galerkin Matrix.
pub fn assemble_galmat<M: GalerkinMatrix>(
  nnodes: usize,
  elements: &[TriangleElement],
  elmat: impl ElmatProvider,
) -> M {
  let elmats: Vec<_> = elements.par_iter().map(|elem| elmat.eval(elem)).collect();

  let mut galmat = M::zeros(nnodes);
  for (elem, elmat) in elements.iter().zip(&elmats) {
    let nodes = elem.nodes();
    for (ilocal, &iglobal) in nodes.iter().enumerate() {
      for (jlocal, &jglobal) in nodes.iter().enumerate() {
        galmat.accumulate(iglobal, jglobal, elmat[(ilocal, jlocal)]);
      }
    }
  }
  galmat
}

/// Assembly algorithm for the Galerkin Vector.
pub fn assemble_galvec(
  nnodes: usize,
  elements: &[TriangleElement],
  elvec: impl ElvecProvider,
) -> GalVec {
  let elvecs: Vec<_> = elements.par_iter().map(|elem| elvec.eval(elem)).collect();

  let mut galvec = GalVec::zeros(nnodes);
  for (elem, elvec) in elements.iter().zip(&elvecs) {
    for (ilocal, &iglobal) in elem.nodes().iter().enumerate() {
      galvec[iglobal] += elvec[ilocal];
    }
  }
  galvec
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    fe::{compute_elements, LoadElvec, StiffnessElmat},
    linalg::assert_mat_eq,
    mesh::{Point, TriangleMesh, Triangulation},
  };

  fn unit_square() -> TriangleMesh {
    let points = vec![
      Point::new(0.0, 0.0),
      Point::new(1.0, 0.0),
      Point::new(1.0, 1.0),
      Point::new(0.0, 1.0),
    ];
    let triangulation = Triangulation {
      cells: vec![[0, 1, 2], [2, 3, 0]],
      segments: vec![[0, 1], [1, 2], [2, 3], [3, 0]],
    };
    TriangleMesh::new(points, triangulation).unwrap()
  }

  #[test]
  fn two_triangle_square() {
    let mesh = unit_square();
    let elements = compute_elements(&mesh).unwrap();
    let galmat: na::DMatrix<f64> = assemble_galmat(4, &elements, StiffnessElmat::new(1.0));

    #[rustfmt::skip]
    let expected = na::DMatrix::from_row_slice(4, 4, &[
       1.0, -0.5,  0.0, -0.5,
      -0.5,  1.0, -0.5,  0.0,
       0.0, -0.5,  1.0, -0.5,
      -0.5,  0.0, -0.5,  1.0,
    ]);
    assert_mat_eq(&galmat, &expected);

    let galvec = assemble_galvec(4, &elements, LoadElvec::new(3.0));
    assert_eq!(galvec.as_slice(), &[1.0, 0.5, 1.0, 0.5]);
  }
}
