use crate::error::{FemError, FemResult};

use faer::solvers::SpSolver;

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

/// Sparse direct LU factorization.
pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: nas::CscMatrix<f64>) -> FemResult<Self> {
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|err| FemError::SingularSystem(format!("sparse LU factorization failed: {err:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &na::DVector<f64>) -> na::DVector<f64> {
    let b = faer::col::from_slice(b.as_slice());
    na::DVector::from_vec(self.raw.solve(b).as_slice().to_vec())
  }
}

/// $norm(A x - b) / norm(b)$, or the absolute residual for $b = 0$.
pub fn relative_residual(ax: &na::DVector<f64>, b: &na::DVector<f64>) -> f64 {
  let residual = (ax - b).norm();
  let bnorm = b.norm();
  if bnorm > 0.0 {
    residual / bnorm
  } else {
    residual
  }
}

pub fn assert_mat_eq(a: &na::DMatrix<f64>, b: &na::DMatrix<f64>) {
  const TOL: f64 = 10e-12;
  let diff = a - b;
  let error = diff.norm();
  let equal = error <= TOL;
  if !equal {
    println!("Matrix a={a:.3}");
    println!("Matrix b={b:.3}");
    println!("a-b={diff:.3}");
    panic!("Matrices not equal.");
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::matrix::{GalerkinMatrix, SparseMatrix};

  #[test]
  fn faer_lu_solves_tridiagonal() {
    let n = 6;
    let mut mat = SparseMatrix::zeros(n);
    for i in 0..n {
      mat.accumulate(i, i, 2.0);
      if i + 1 < n {
        mat.accumulate(i, i + 1, -1.0);
        mat.accumulate(i + 1, i, -1.0);
      }
    }
    let x_exact = na::DVector::from_fn(n, |i, _| i as f64 - 1.5);
    let b = mat.mul_vec(&x_exact);

    let x = FaerLu::new(mat.into_ready()).unwrap().solve(&b);
    assert!((x - x_exact).norm() < 1e-12);
  }

  #[test]
  fn residual() {
    let b = na::DVector::from_vec(vec![3.0, 4.0]);
    let ax = na::DVector::from_vec(vec![3.0, 4.5]);
    assert_eq!(relative_residual(&ax, &b), 0.1);
    assert_eq!(relative_residual(&b, &na::DVector::zeros(2)), 5.0);
  }
}
