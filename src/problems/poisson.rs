//! Module for the Poisson Equation, the prototypical ellipitic PDE.
//!
//! $-div(p grad u) = f$ with Dirichlet and Neumann conditions on the sides
//! of the domain.

use crate::{
  assemble,
  boundary::{self, SegmentBoundary},
  config::{PoissonConfig, StorageMode},
  error::FemResult,
  fe,
  lse::{self, LseSolver},
  matrix::{GalerkinMatrix, SparseMatrix},
  mesh::{NodeIdx, TriangleMesh},
};

/// Assembled Poisson system with all boundary conditions enforced.
#[derive(Debug, Clone)]
pub struct PoissonSystem<M> {
  pub galmat: M,
  pub galvec: na::DVector<f64>,
  pub boundary: Vec<SegmentBoundary>,
}

pub fn assemble_poisson<M: GalerkinMatrix>(
  mesh: &TriangleMesh,
  config: &PoissonConfig,
) -> FemResult<PoissonSystem<M>> {
  let nnodes = mesh.nnodes();
  let elements = fe::compute_elements(mesh)?;

  let mut galmat: M =
    assemble::assemble_galmat(nnodes, &elements, fe::StiffnessElmat::new(config.p));
  let mut galvec = assemble::assemble_galvec(nnodes, &elements, fe::LoadElvec::new(config.f));
  tracing::info!("assembled poisson system with {nnodes} dofs");

  if !config.boundary.has_dirichlet() {
    tracing::warn!("no side has a dirichlet condition, the solution is not unique");
  }
  let boundary = boundary::classify_boundary(mesh, &config.domain, &config.boundary);
  boundary::enforce_neumann_bc(&boundary, &mut galvec);
  boundary::enforce_dirichlet_bc(&boundary, &mut galmat, &mut galvec);

  Ok(PoissonSystem {
    galmat,
    galvec,
    boundary,
  })
}

#[derive(Debug, Clone)]
pub struct PoissonSolution {
  values: na::DVector<f64>,
}
impl PoissonSolution {
  pub fn new(values: na::DVector<f64>) -> Self {
    Self { values }
  }

  /// Nodal values, indexed by global node id.
  pub fn values(&self) -> &na::DVector<f64> {
    &self.values
  }
  pub fn into_values(self) -> na::DVector<f64> {
    self.values
  }
  pub fn value(&self, inode: NodeIdx) -> f64 {
    self.values[inode]
  }

  pub fn min(&self) -> f64 {
    self.values.min()
  }
  pub fn max(&self) -> f64 {
    self.values.max()
  }
}

pub fn solve_poisson_with<M>(
  mesh: &TriangleMesh,
  config: &PoissonConfig,
) -> FemResult<PoissonSolution>
where
  M: GalerkinMatrix,
  M::Ready: LseSolver,
{
  let PoissonSystem { galmat, galvec, .. } = assemble_poisson::<M>(mesh, config)?;
  let values = lse::solve_lse(galmat, &galvec)?;
  let solution = PoissonSolution::new(values);
  tracing::info!(
    "solved poisson system, solution range [{:.6}, {:.6}]",
    solution.min(),
    solution.max()
  );
  Ok(solution)
}

/// Solves the Poisson problem with the configured matrix storage.
pub fn solve_poisson(mesh: &TriangleMesh, config: &PoissonConfig) -> FemResult<PoissonSolution> {
  config.validate()?;
  match config.storage {
    StorageMode::Dense => solve_poisson_with::<na::DMatrix<f64>>(mesh, config),
    StorageMode::Sparse => solve_poisson_with::<SparseMatrix>(mesh, config),
  }
}
