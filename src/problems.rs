pub mod helmholtz;
pub mod poisson;

use crate::{
  config::{ProblemConfig, ProblemKind},
  error::FemResult,
  mesh::TriangleMesh,
};

use helmholtz::HelmholtzSolution;
use poisson::PoissonSolution;

#[derive(Debug, Clone)]
pub enum Solution {
  Poisson(PoissonSolution),
  Helmholtz(HelmholtzSolution),
}

/// Generates the mesh and solves the configured problem on it.
pub fn run(config: &ProblemConfig) -> FemResult<(TriangleMesh, Solution)> {
  let mesh = TriangleMesh::generate(config.domain(), &config.layout)?;
  let solution = match &config.problem {
    ProblemKind::Poisson(problem) => {
      tracing::info!("solving poisson problem with {} storage", problem.storage);
      Solution::Poisson(poisson::solve_poisson(&mesh, problem)?)
    }
    ProblemKind::Helmholtz(problem) => {
      tracing::info!("solving helmholtz problem with {} storage", problem.storage);
      Solution::Helmholtz(helmholtz::solve_helmholtz(&mesh, problem)?)
    }
  };
  Ok((mesh, solution))
}
