//! Computes the Helmholtz eigenpairs and writes the mesh, the eigenvalues and
//! the first eigenvectors as CSV into `out/helmholtz`.
//!
//! Usage: `cargo run --example helmholtz [config.json]`

use fem2d::{
  config::{
    BoundaryCondition, Domain, HelmholtzConfig, ProblemConfig, ProblemKind, SideConditions,
    StorageMode,
  },
  io,
  mesh::nodes::NodeLayout,
  problems::{self, Solution},
};

const NMODES: usize = 10;

fn default_config() -> ProblemConfig {
  ProblemConfig {
    layout: NodeLayout::Random {
      nnodes: 300,
      seed: 0,
    },
    problem: ProblemKind::Helmholtz(HelmholtzConfig {
      domain: Domain::reference_square(),
      boundary: SideConditions::uniform(BoundaryCondition::Dirichlet(0.0)),
      storage: StorageMode::Dense,
      p: 1.0,
      q: 1.0,
      omega: 1.0,
    }),
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt::init();

  let config = match std::env::args().nth(1) {
    Some(path) => ProblemConfig::load(path)?,
    None => default_config(),
  };

  let (mesh, solution) = problems::run(&config)?;
  let Solution::Helmholtz(solution) = solution else {
    return Err("configuration does not describe a helmholtz problem".into());
  };

  println!(
    "nodes={} eigenpairs={} zero eigenvalues={}",
    mesh.nnodes(),
    solution.neigenpairs(),
    solution.nzero_eigenvalues()
  );
  for (k, lambda) in solution.nonzero_eigenvalues().iter().take(NMODES).enumerate() {
    println!("k={k} eigenval={lambda:.6} wavenumber={:.6}", lambda.max(0.0).sqrt());
  }

  let out_path = "out/helmholtz";
  io::remove_output_dir(out_path)?;
  io::save_helmholtz(out_path, &mesh, &solution, NMODES)?;
  Ok(())
}
