//! Lanczos tridiagonalization with full reorthogonalization.
//!
//! The operator is only accessed through matrix-vector products. Every new
//! Lanczos vector is orthogonalized twice against the whole basis, so the
//! basis stays orthonormal to machine precision and the Ritz pairs of the
//! tridiagonal matrix are accurate. When the Krylov space becomes invariant,
//! which happens for repeated eigenvalues, the iteration restarts with a
//! fresh vector orthogonal to the basis and continues in a new block.

use crate::error::{FemError, FemResult};

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Relative size of the residual below which the Krylov space counts as invariant.
const BREAKDOWN_TOL: f64 = 1e-10;
const MAX_RESTART_ATTEMPTS: usize = 16;

/// Orthonormal basis $Q$ and tridiagonal $T = Q^T S Q$.
#[derive(Debug, Clone)]
pub struct LanczosDecomposition {
  pub basis: na::DMatrix<f64>,
  pub tridiagonal: na::DMatrix<f64>,
}

impl LanczosDecomposition {
  /// Ritz values, unordered, with their Ritz vectors $Q z$.
  pub fn ritz_pairs(&self) -> (na::DVector<f64>, na::DMatrix<f64>) {
    let eigen = na::SymmetricEigen::new(self.tridiagonal.clone());
    let ritz_vecs = &self.basis * eigen.eigenvectors;
    (eigen.eigenvalues, ritz_vecs)
  }
}

/// Runs `nsteps` Lanczos steps on the symmetric operator `apply` of size `n`.
///
/// The start and restart vectors are drawn from a generator seeded with `seed`,
/// so the result is reproducible.
pub fn lanczos<F>(n: usize, nsteps: usize, seed: u64, apply: F) -> FemResult<LanczosDecomposition>
where
  F: Fn(&na::DVector<f64>) -> FemResult<na::DVector<f64>>,
{
  let nsteps = nsteps.min(n);
  let mut rng = StdRng::seed_from_u64(seed);
  let mut basis = na::DMatrix::zeros(n, nsteps);
  let mut alphas = Vec::with_capacity(nsteps);
  let mut betas = Vec::with_capacity(nsteps.saturating_sub(1));
  let mut opnorm: f64 = 0.0;

  let mut q = fresh_vector(&mut rng, &basis.columns(0, 0))?;
  for j in 0..nsteps {
    basis.set_column(j, &q);

    let mut w = apply(&q)?;
    opnorm = opnorm.max(w.norm());
    alphas.push(q.dot(&w));
    orthogonalize(&mut w, &basis.columns(0, j + 1));

    if j + 1 == nsteps {
      break;
    }
    let beta = w.norm();
    if beta > BREAKDOWN_TOL * opnorm {
      betas.push(beta);
      q = w / beta;
    } else {
      tracing::trace!("lanczos restart after {} steps", j + 1);
      betas.push(0.0);
      q = fresh_vector(&mut rng, &basis.columns(0, j + 1))?;
    }
  }

  let mut tridiagonal = na::DMatrix::from_diagonal(&na::DVector::from_vec(alphas));
  for (j, &beta) in betas.iter().enumerate() {
    tridiagonal[(j, j + 1)] = beta;
    tridiagonal[(j + 1, j)] = beta;
  }
  Ok(LanczosDecomposition { basis, tridiagonal })
}

/// Classical Gram-Schmidt, applied twice.
fn orthogonalize(w: &mut na::DVector<f64>, basis: &na::DMatrixView<f64>) {
  for _ in 0..2 {
    let coeffs = basis.tr_mul(&*w);
    *w -= basis * coeffs;
  }
}

/// Random unit vector orthogonal to `basis`.
fn fresh_vector(rng: &mut StdRng, basis: &na::DMatrixView<f64>) -> FemResult<na::DVector<f64>> {
  let n = basis.nrows();
  for _ in 0..MAX_RESTART_ATTEMPTS {
    let mut v = na::DVector::from_fn(n, |_, _| rng.random::<f64>() - 0.5);
    let norm = v.norm();
    orthogonalize(&mut v, basis);
    let orth_norm = v.norm();
    if orth_norm > 1e-6 * norm {
      return Ok(v / orth_norm);
    }
  }
  Err(FemError::SingularSystem(
    "lanczos could not extend the krylov basis".to_owned(),
  ))
}

#[cfg(test)]
mod test {
  use super::*;

  fn dense_operator(
    mat: &na::DMatrix<f64>,
  ) -> impl Fn(&na::DVector<f64>) -> FemResult<na::DVector<f64>> + '_ {
    move |x| Ok(mat * x)
  }

  #[test]
  fn orthonormal_basis() {
    #[rustfmt::skip]
    let mat = na::DMatrix::from_row_slice(4, 4, &[
       4.0, -1.0,  0.0,  0.5,
      -1.0,  3.0, -1.0,  0.0,
       0.0, -1.0,  2.0, -1.0,
       0.5,  0.0, -1.0,  1.0,
    ]);
    let decomp = lanczos(4, 4, 0, dense_operator(&mat)).unwrap();
    let gram = decomp.basis.tr_mul(&decomp.basis);
    assert!((gram - na::DMatrix::identity(4, 4)).amax() < 1e-12);

    let projected = decomp.basis.tr_mul(&(&mat * &decomp.basis));
    assert!((projected - &decomp.tridiagonal).amax() < 1e-10);

    let (ritz_vals, _) = decomp.ritz_pairs();
    let mut exact = na::SymmetricEigen::new(mat).eigenvalues;
    exact.as_mut_slice().sort_by(f64::total_cmp);
    let mut ritz_vals = ritz_vals;
    ritz_vals.as_mut_slice().sort_by(f64::total_cmp);
    assert!((ritz_vals - exact).amax() < 1e-12);
  }

  #[test]
  fn restarts_on_repeated_eigenvalues() {
    let mat = na::DMatrix::from_diagonal(&na::DVector::from_vec(vec![2.0, 2.0, 2.0, 5.0]));
    let decomp = lanczos(4, 4, 1, dense_operator(&mat)).unwrap();
    let (mut ritz_vals, ritz_vecs) = decomp.ritz_pairs();
    for (k, v) in ritz_vecs.column_iter().enumerate() {
      assert!((&mat * v - ritz_vals[k] * v).norm() < 1e-10);
    }
    ritz_vals.as_mut_slice().sort_by(f64::total_cmp);
    assert!((ritz_vals - na::DVector::from_vec(vec![2.0, 2.0, 2.0, 5.0])).amax() < 1e-12);
  }

  #[test]
  fn reproducible() {
    let mat = na::DMatrix::from_fn(6, 6, |i, j| 1.0 / (1 + i + j) as f64);
    let first = lanczos(6, 6, 7, dense_operator(&mat)).unwrap();
    let second = lanczos(6, 6, 7, dense_operator(&mat)).unwrap();
    assert_eq!(first.basis, second.basis);
    assert_eq!(first.tridiagonal, second.tridiagonal);
  }
}
