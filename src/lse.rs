//! Linear systems of equations.
//!
//! Singular systems are reported as [`FemError::SingularSystem`] instead of
//! returning non-finite values.

use crate::{
  error::{FemError, FemResult},
  linalg::{self, FaerLu},
  matrix::GalerkinMatrix,
};

/// Smallest admissible pivot relative to the largest one.
const PIVOT_TOL: f64 = 1e-12;
/// Largest admissible relative residual of a sparse solve.
const RESIDUAL_TOL: f64 = 1e-8;

pub trait LseSolver {
  fn solve_lse(self, rhs: &na::DVector<f64>) -> FemResult<na::DVector<f64>>;
}

/// Dense LU with partial pivoting.
impl LseSolver for na::DMatrix<f64> {
  fn solve_lse(self, rhs: &na::DVector<f64>) -> FemResult<na::DVector<f64>> {
    if self.is_empty() {
      return Ok(na::DVector::zeros(0));
    }

    let lu = self.lu();
    let pivots = lu.u().diagonal().abs();
    let max = pivots.max();
    let (icol, min) = pivots.argmin();
    if !(min > PIVOT_TOL * max) {
      return Err(FemError::SingularSystem(format!(
        "pivot of column {icol} is {min:e}, largest pivot is {max:e}"
      )));
    }

    let sol = lu
      .solve(rhs)
      .ok_or_else(|| FemError::SingularSystem("dense LU solve failed".to_owned()))?;
    ensure_finite(&sol)?;
    Ok(sol)
  }
}

/// Sparse direct LU.
impl LseSolver for nas::CscMatrix<f64> {
  fn solve_lse(self, rhs: &na::DVector<f64>) -> FemResult<na::DVector<f64>> {
    let sol = FaerLu::new(self.clone())?.solve(rhs);
    ensure_finite(&sol)?;

    let mut asol = na::DVector::zeros(self.nrows());
    for (r, c, &v) in self.triplet_iter() {
      asol[r] += v * sol[c];
    }
    let residual = linalg::relative_residual(&asol, rhs);
    if residual > RESIDUAL_TOL {
      return Err(FemError::SingularSystem(format!(
        "relative residual {residual:e} of sparse solve exceeds {RESIDUAL_TOL:e}"
      )));
    }
    Ok(sol)
  }
}

fn ensure_finite(sol: &na::DVector<f64>) -> FemResult<()> {
  match sol.iter().position(|v| !v.is_finite()) {
    Some(inode) => Err(FemError::SingularSystem(format!(
      "solution value at node {inode} is not finite"
    ))),
    None => Ok(()),
  }
}

/// Converts the matrix into its solve-ready form and solves.
pub fn solve_lse<M>(galmat: M, galvec: &na::DVector<f64>) -> FemResult<na::DVector<f64>>
where
  M: GalerkinMatrix,
  M::Ready: LseSolver,
{
  galmat.into_ready().solve_lse(galvec)
}
