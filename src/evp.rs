//! Symmetric Generalized Eigenvalue Problems
//!
//! $A u = lambda B u$ with symmetric $A$ and symmetric positive definite $B$.
//! Both solvers reduce to the standard problem
//! $L^(-1) A L^(-T) y = lambda y$ with the Cholesky factor $B = L L^T$
//! and map the eigenvectors back with $u = L^(-T) y$.

pub mod lanczos;

use crate::error::{FemError, FemResult};

use nas::ops::{serial::spsolve_csc_lower_triangular, Op};

/// Seed of the Lanczos start vector.
const LANCZOS_SEED: u64 = 42;
/// Largest accepted relative residual of a sparse eigenpair.
const EIGENPAIR_TOL: f64 = 1e-8;

/// Eigenpairs in ascending eigenvalue order.
#[derive(Debug, Clone)]
pub struct Spectrum {
  pub eigenvals: na::DVector<f64>,
  /// Eigenvectors as columns, matching `eigenvals`.
  pub eigenvecs: na::DMatrix<f64>,
}
impl Spectrum {
  pub fn len(&self) -> usize {
    self.eigenvals.len()
  }
  pub fn is_empty(&self) -> bool {
    self.eigenvals.is_empty()
  }
}

pub trait GhepSolver: Sized {
  fn solve_ghep(self, mass: Self) -> FemResult<Spectrum>;
}

/// Full spectrum through a dense symmetric eigendecomposition.
impl GhepSolver for na::DMatrix<f64> {
  fn solve_ghep(self, mass: Self) -> FemResult<Spectrum> {
    let l = na::Cholesky::new(mass)
      .ok_or_else(|| FemError::SingularSystem("mass matrix is not positive definite".to_owned()))?
      .unpack();

    let singular_factor = || FemError::SingularSystem("singular cholesky factor".to_owned());
    let linva = l
      .solve_lower_triangular(&self)
      .ok_or_else(singular_factor)?;
    let mut standard = l
      .solve_lower_triangular(&linva.transpose())
      .ok_or_else(singular_factor)?;
    symmetrize(&mut standard);

    let eigen = na::SymmetricEigen::new(standard);
    let eigenvecs = l
      .transpose()
      .solve_upper_triangular(&eigen.eigenvectors)
      .ok_or_else(singular_factor)?;

    Ok(sort_spectrum(eigen.eigenvalues, eigenvecs))
  }
}

/// The `n - 1` smallest eigenpairs through the Lanczos algorithm.
///
/// The reduced operator $L^(-1) A L^(-T)$ is never formed, it is applied
/// through a sparse matrix product and two sparse triangular solves.
/// The Lanczos basis and the returned eigenvectors are dense.
impl GhepSolver for nas::CscMatrix<f64> {
  fn solve_ghep(self, mass: Self) -> FemResult<Spectrum> {
    let n = self.nrows();
    if n < 2 {
      return Err(FemError::InvalidConfiguration(format!(
        "sparse eigensolver needs at least 2 dofs, got {n}"
      )));
    }

    let cholesky = nas::factorization::CscCholesky::factor(&mass).map_err(|err| {
      FemError::SingularSystem(format!("mass matrix is not positive definite: {err}"))
    })?;
    let l = cholesky.l();

    let reduced = |y: &na::DVector<f64>| -> FemResult<na::DVector<f64>> {
      let mut x = na::DMatrix::from_column_slice(n, 1, y.as_slice());
      spsolve_csc_lower_triangular(Op::Transpose(l), &mut x).map_err(triangular_failure)?;
      let mut ax = &self * &x;
      spsolve_csc_lower_triangular(Op::NoOp(l), &mut ax).map_err(triangular_failure)?;
      Ok(ax.column(0).into_owned())
    };
    let decomposition = lanczos::lanczos(n, n, LANCZOS_SEED, reduced)?;
    let (ritz_vals, ritz_vecs) = decomposition.ritz_pairs();

    let Spectrum {
      eigenvals,
      eigenvecs,
    } = sort_spectrum(ritz_vals, ritz_vecs);
    let eigenvals = eigenvals.rows(0, n - 1).into_owned();
    let mut eigenvecs = eigenvecs.columns(0, n - 1).into_owned();
    spsolve_csc_lower_triangular(Op::Transpose(l), &mut eigenvecs).map_err(triangular_failure)?;

    check_eigenpairs(&self, &mass, &eigenvals, &eigenvecs)?;
    Ok(Spectrum {
      eigenvals,
      eigenvecs,
    })
  }
}

fn triangular_failure(err: nas::ops::serial::OperationError) -> FemError {
  FemError::SingularSystem(format!("triangular solve failed: {err}"))
}

/// Fails if some pair has a residual $norm(A u - lambda B u)$ above [`EIGENPAIR_TOL`]
/// relative to $(norm(A) + |lambda| norm(B)) norm(u)$ with Frobenius norms.
fn check_eigenpairs(
  stiffness: &nas::CscMatrix<f64>,
  mass: &nas::CscMatrix<f64>,
  eigenvals: &na::DVector<f64>,
  eigenvecs: &na::DMatrix<f64>,
) -> FemResult<()> {
  let frobenius =
    |mat: &nas::CscMatrix<f64>| mat.values().iter().map(|v| v * v).sum::<f64>().sqrt();
  let (anorm, bnorm) = (frobenius(stiffness), frobenius(mass));

  let au = stiffness * eigenvecs;
  let bu = mass * eigenvecs;
  for (k, &lambda) in eigenvals.iter().enumerate() {
    let residual = (au.column(k).into_owned() - lambda * bu.column(k)).norm();
    let scale = (anorm + lambda.abs() * bnorm) * eigenvecs.column(k).norm();
    if !(residual <= EIGENPAIR_TOL * scale) {
      return Err(FemError::SingularSystem(format!(
        "eigenpair {k} did not converge, residual {residual:e}"
      )));
    }
  }
  Ok(())
}

fn symmetrize(mat: &mut na::DMatrix<f64>) {
  let transpose = mat.transpose();
  *mat += transpose;
  *mat *= 0.5;
}

/// Reorders the eigenpairs by ascending eigenvalue.
pub fn sort_spectrum(eigenvals: na::DVector<f64>, eigenvecs: na::DMatrix<f64>) -> Spectrum {
  let mut order: Vec<usize> = (0..eigenvals.len()).collect();
  order.sort_by(|&i, &j| eigenvals[i].total_cmp(&eigenvals[j]));

  let eigenvals = na::DVector::from_iterator(order.len(), order.iter().map(|&i| eigenvals[i]));
  let eigenvecs = na::DMatrix::from_fn(eigenvecs.nrows(), order.len(), |r, c| {
    eigenvecs[(r, order[c])]
  });
  Spectrum {
    eigenvals,
    eigenvecs,
  }
}
