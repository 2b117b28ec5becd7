//! Storage of the global Galerkin matrices.
//!
//! Assembly, boundary enforcement and the solvers are written once against
//! [`GalerkinMatrix`]. The dense storage is a plain [`na::DMatrix`], the sparse
//! storage is a triplet list that is cheap to grow and to filter, and is
//! converted into compressed columns before solving.

use crate::util;

pub trait GalerkinMatrix: Sized {
  /// Solve-ready form handed to the solvers.
  type Ready;

  fn zeros(n: usize) -> Self;
  fn nrows(&self) -> usize;

  /// Adds `v` to the entry `(r, c)`.
  fn accumulate(&mut self, r: usize, c: usize, v: f64);

  fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64>;

  /// Sets every entry with `predicate(r, c)` to zero.
  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool;

  fn scale(&mut self, factor: f64);

  fn to_dense(&self) -> na::DMatrix<f64>;

  fn into_ready(self) -> Self::Ready;

  /// Zeros all rows and columns of the flagged dofs and puts a one on their diagonal.
  fn constrain_dofs(&mut self, dofs: &[usize]) {
    let flags = util::indicies_to_flags(dofs, self.nrows());
    self.set_zero(|r, c| flags[r] || flags[c]);
    for &idof in dofs {
      self.accumulate(idof, idof, 1.0);
    }
  }
}

impl GalerkinMatrix for na::DMatrix<f64> {
  type Ready = na::DMatrix<f64>;

  fn zeros(n: usize) -> Self {
    na::DMatrix::zeros(n, n)
  }
  fn nrows(&self) -> usize {
    self.nrows()
  }

  fn accumulate(&mut self, r: usize, c: usize, v: f64) {
    self[(r, c)] += v;
  }

  fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    self * x
  }

  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    for c in 0..self.ncols() {
      for r in 0..self.nrows() {
        if predicate(r, c) {
          self[(r, c)] = 0.0;
        }
      }
    }
  }

  fn scale(&mut self, factor: f64) {
    *self *= factor;
  }

  fn to_dense(&self) -> na::DMatrix<f64> {
    self.clone()
  }

  fn into_ready(self) -> Self::Ready {
    self
  }
}

/// Square sparse matrix in triplet (coordinate) format.
///
/// Duplicate entries are allowed and summed up on conversion.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
  n: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn new(n: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
    assert!(
      triplets.iter().all(|&(r, c, _)| r < n && c < n),
      "triplet out of bounds"
    );
    Self { n, triplets }
  }

  pub fn ntriplets(&self) -> usize {
    self.triplets.len()
  }
  pub fn triplets(&self) -> &[(usize, usize, f64)] {
    &self.triplets
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) {
    assert!(r < self.n && c < self.n, "triplet out of bounds");
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let mut coo = nas::CooMatrix::new(self.n, self.n);
    for &(r, c, v) in &self.triplets {
      coo.push(r, c, v);
    }
    coo
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }
}

impl GalerkinMatrix for SparseMatrix {
  type Ready = nas::CscMatrix<f64>;

  fn zeros(n: usize) -> Self {
    Self::new(n, Vec::new())
  }
  fn nrows(&self) -> usize {
    self.n
  }

  fn accumulate(&mut self, r: usize, c: usize, v: f64) {
    self.push(r, c, v);
  }

  fn mul_vec(&self, x: &na::DVector<f64>) -> na::DVector<f64> {
    let mut y = na::DVector::zeros(self.n);
    for &(r, c, v) in &self.triplets {
      y[r] += v * x[c];
    }
    y
  }

  fn set_zero<F>(&mut self, predicate: F)
  where
    F: Fn(usize, usize) -> bool,
  {
    self.triplets.retain(|&(r, c, _)| !predicate(r, c));
  }

  fn scale(&mut self, factor: f64) {
    self.triplets.iter_mut().for_each(|t| t.2 *= factor);
  }

  fn to_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  fn into_ready(self) -> Self::Ready {
    self.to_nalgebra_csc()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::linalg::assert_mat_eq;

  fn fill<M: GalerkinMatrix>() -> M {
    let mut mat = M::zeros(3);
    mat.accumulate(0, 0, 2.0);
    mat.accumulate(0, 0, 1.0);
    mat.accumulate(0, 2, -1.0);
    mat.accumulate(2, 0, -1.0);
    mat.accumulate(1, 1, 4.0);
    mat.accumulate(2, 2, 5.0);
    mat
  }

  #[test]
  fn sparse_matches_dense() {
    let dense: na::DMatrix<f64> = fill();
    let sparse: SparseMatrix = fill();
    assert_mat_eq(&dense, &sparse.to_dense());
    assert_eq!(dense[(0, 0)], 3.0);

    let x = na::DVector::from_vec(vec![1.0, -2.0, 0.5]);
    assert_eq!(dense.mul_vec(&x), sparse.mul_vec(&x));

    let csc = sparse.into_ready();
    assert_eq!(csc.nnz(), 5);
  }

  #[test]
  fn constrain() {
    let mut dense: na::DMatrix<f64> = fill();
    let mut sparse: SparseMatrix = fill();
    dense.constrain_dofs(&[0]);
    sparse.constrain_dofs(&[0]);
    let expected = na::DMatrix::from_diagonal(&na::DVector::from_vec(vec![1.0, 4.0, 5.0]));
    assert_mat_eq(&dense, &expected);
    assert_mat_eq(&sparse.to_dense(), &expected);
  }
}
