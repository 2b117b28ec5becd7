//! Solves a Poisson problem and writes the mesh and the solution as CSV into `out/poisson`.
//!
//! Usage: `cargo run --example poisson [config.json]`

use fem2d::{
  config::{
    BoundaryCondition, Domain, PoissonConfig, ProblemConfig, ProblemKind, SideConditions,
    StorageMode,
  },
  io,
  mesh::nodes::NodeLayout,
  problems::{self, Solution},
};

fn default_config() -> ProblemConfig {
  ProblemConfig {
    layout: NodeLayout::Lattice { nnodes_axis: 21 },
    problem: ProblemKind::Poisson(PoissonConfig {
      domain: Domain::reference_square(),
      boundary: SideConditions {
        left: BoundaryCondition::Dirichlet(0.0),
        right: BoundaryCondition::Dirichlet(1.0),
        bottom: BoundaryCondition::Neumann(0.0),
        top: BoundaryCondition::None,
      },
      storage: StorageMode::Sparse,
      p: 1.0,
      f: 1.0,
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
  let Solution::Poisson(solution) = solution else {
    return Err("configuration does not describe a poisson problem".into());
  };
  println!(
    "nodes={} triangles={} min={:.6} max={:.6}",
    mesh.nnodes(),
    mesh.ncells(),
    solution.min(),
    solution.max()
  );

  let out_path = "out/poisson";
  io::remove_output_dir(out_path)?;
  io::save_poisson(out_path, &mesh, &solution)?;
  Ok(())
}
