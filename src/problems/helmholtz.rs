//! Eigenvalue problem of the Helmholtz operator.
//!
//! $-div(p grad u) = lambda omega^2 q u$ with homogeneous boundary conditions,
//! discretized as $A u = lambda omega^2 B u$.

use crate::{
  assemble,
  boundary::{self, SegmentBoundary},
  config::{HelmholtzConfig, StorageMode},
  error::FemResult,
  evp::{GhepSolver, Spectrum},
  fe,
  matrix::{GalerkinMatrix, SparseMatrix},
  mesh::{NodeIdx, TriangleMesh},
};

/// Eigenvalues with smaller magnitude count as zero.
pub const ZERO_EIGENVALUE_TOL: f64 = 1e-6;

/// Assembled Helmholtz pencil.
///
/// The Dirichlet nodes are constrained in the stiffness matrix only,
/// the mass matrix stays untouched.
#[derive(Debug, Clone)]
pub struct HelmholtzSystem<M> {
  pub stiffness: M,
  pub mass: M,
  pub boundary: Vec<SegmentBoundary>,
  pub constrained: Vec<NodeIdx>,
}

pub fn assemble_helmholtz<M: GalerkinMatrix>(
  mesh: &TriangleMesh,
  config: &HelmholtzConfig,
) -> FemResult<HelmholtzSystem<M>> {
  let nnodes = mesh.nnodes();
  let elements = fe::compute_elements(mesh)?;

  let mut stiffness: M =
    assemble::assemble_galmat(nnodes, &elements, fe::StiffnessElmat::new(config.p));
  let mass: M = assemble::assemble_galmat(nnodes, &elements, fe::MassElmat::new(config.q));
  tracing::info!("assembled helmholtz pencil with {nnodes} dofs");

  let boundary = boundary::classify_boundary(mesh, &config.domain, &config.boundary);
  let constrained = boundary::enforce_homogeneous_dirichlet_bc(&boundary, &mut stiffness);

  Ok(HelmholtzSystem {
    stiffness,
    mass,
    boundary,
    constrained,
  })
}

#[derive(Debug, Clone)]
pub struct HelmholtzSolution {
  spectrum: Spectrum,
  constrained: Vec<NodeIdx>,
}
impl HelmholtzSolution {
  pub fn new(spectrum: Spectrum, constrained: Vec<NodeIdx>) -> Self {
    Self {
      spectrum,
      constrained,
    }
  }

  pub fn spectrum(&self) -> &Spectrum {
    &self.spectrum
  }
  /// Eigenvalues in ascending order.
  pub fn eigenvals(&self) -> &na::DVector<f64> {
    &self.spectrum.eigenvals
  }
  /// Eigenvectors as columns, matching [`Self::eigenvals`].
  pub fn eigenvecs(&self) -> &na::DMatrix<f64> {
    &self.spectrum.eigenvecs
  }
  pub fn eigenvec(&self, k: usize) -> na::DVector<f64> {
    self.spectrum.eigenvecs.column(k).into_owned()
  }
  pub fn neigenpairs(&self) -> usize {
    self.spectrum.len()
  }
  /// Nodes constrained by a Dirichlet condition.
  pub fn constrained(&self) -> &[NodeIdx] {
    &self.constrained
  }

  /// $sqrt(lambda)$ of the non-negative eigenvalues.
  pub fn wavenumbers(&self) -> Vec<f64> {
    self
      .eigenvals()
      .iter()
      .filter(|&&lambda| lambda >= 0.0)
      .map(|lambda| lambda.sqrt())
      .collect()
  }

  pub fn nonzero_eigenvalues(&self) -> Vec<f64> {
    self
      .eigenvals()
      .iter()
      .copied()
      .filter(|lambda| lambda.abs() >= ZERO_EIGENVALUE_TOL)
      .collect()
  }

  pub fn nzero_eigenvalues(&self) -> usize {
    self.neigenpairs() - self.nonzero_eigenvalues().len()
  }
}

pub fn solve_helmholtz_with<M>(
  mesh: &TriangleMesh,
  config: &HelmholtzConfig,
) -> FemResult<HelmholtzSolution>
where
  M: GalerkinMatrix,
  M::Ready: GhepSolver,
{
  let HelmholtzSystem {
    stiffness,
    mut mass,
    constrained,
    ..
  } = assemble_helmholtz::<M>(mesh, config)?;
  mass.scale(config.omega * config.omega);

  let spectrum = stiffness.into_ready().solve_ghep(mass.into_ready())?;
  let solution = HelmholtzSolution::new(spectrum, constrained);
  tracing::info!(
    "computed {} eigenpairs, {} of them zero",
    solution.neigenpairs(),
    solution.nzero_eigenvalues()
  );
  Ok(solution)
}

/// Solves the Helmholtz eigenproblem with the configured matrix storage.
///
/// The dense storage yields all eigenpairs, the sparse one all but the largest.
/// The sparse solver keeps the matrices compressed, but the eigenvectors it
/// returns are dense like the dense ones.
pub fn solve_helmholtz(
  mesh: &TriangleMesh,
  config: &HelmholtzConfig,
) -> FemResult<HelmholtzSolution> {
  config.validate()?;
  match config.storage {
    StorageMode::Dense => solve_helmholtz_with::<na::DMatrix<f64>>(mesh, config),
    StorageMode::Sparse => solve_helmholtz_with::<SparseMatrix>(mesh, config),
  }
}
