//! Plain text export of the mesh and the solutions for visualization.
//!
//! All files are comma separated with a header line.

use crate::{
  mesh::TriangleMesh,
  problems::{helmholtz::HelmholtzSolution, poisson::PoissonSolution},
};

use std::{
  fs::{self, File},
  io::{self, BufWriter, Write},
  path::Path,
};

/// Writes one line per node: its coordinates followed by the given nodal fields.
pub fn write_nodes<W: Write>(
  mut writer: W,
  mesh: &TriangleMesh,
  fields: &[(&str, &na::DVector<f64>)],
) -> io::Result<()> {
  write!(writer, "x,y")?;
  for (name, _) in fields {
    write!(writer, ",{name}")?;
  }
  writeln!(writer)?;

  for (inode, p) in mesh.points().iter().enumerate() {
    write!(writer, "{:.6},{:.6}", p.x, p.y)?;
    for (_, field) in fields {
      write!(writer, ",{:.6}", field[inode])?;
    }
    writeln!(writer)?;
  }
  Ok(())
}

pub fn write_cells<W: Write>(mut writer: W, mesh: &TriangleMesh) -> io::Result<()> {
  writeln!(writer, "n0,n1,n2")?;
  for [n0, n1, n2] in mesh.cells() {
    writeln!(writer, "{n0},{n1},{n2}")?;
  }
  Ok(())
}

pub fn write_segments<W: Write>(mut writer: W, mesh: &TriangleMesh) -> io::Result<()> {
  writeln!(writer, "n0,n1")?;
  for [n0, n1] in mesh.segments() {
    writeln!(writer, "{n0},{n1}")?;
  }
  Ok(())
}

pub fn write_eigenvals<W: Write>(mut writer: W, eigenvals: &na::DVector<f64>) -> io::Result<()> {
  writeln!(writer, "k,eigenval")?;
  for (k, lambda) in eigenvals.iter().enumerate() {
    writeln!(writer, "{k},{lambda:.9e}")?;
  }
  Ok(())
}

/// Removes `dir` with all its contents. A missing directory is not an error.
pub fn remove_output_dir(dir: impl AsRef<Path>) -> io::Result<()> {
  match fs::remove_dir_all(dir) {
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
    result => result,
  }
}

fn create(path: impl AsRef<Path>) -> io::Result<BufWriter<File>> {
  File::create(path).map(BufWriter::new)
}

/// Saves `nodes.csv`, `cells.csv` and `segments.csv` into `dir`.
pub fn save_mesh(dir: impl AsRef<Path>, mesh: &TriangleMesh) -> io::Result<()> {
  let dir = dir.as_ref();
  fs::create_dir_all(dir)?;
  write_nodes(create(dir.join("nodes.csv"))?, mesh, &[])?;
  write_cells(create(dir.join("cells.csv"))?, mesh)?;
  write_segments(create(dir.join("segments.csv"))?, mesh)
}

/// Saves the mesh and `solution.csv` with the nodal values into `dir`.
pub fn save_poisson(
  dir: impl AsRef<Path>,
  mesh: &TriangleMesh,
  solution: &PoissonSolution,
) -> io::Result<()> {
  let dir = dir.as_ref();
  save_mesh(dir, mesh)?;
  write_nodes(
    create(dir.join("solution.csv"))?,
    mesh,
    &[("u", solution.values())],
  )
}

/// Saves the mesh, `eigenvals.csv` and the first `nmodes` eigenvectors as
/// `eigenvecs.csv` into `dir`.
pub fn save_helmholtz(
  dir: impl AsRef<Path>,
  mesh: &TriangleMesh,
  solution: &HelmholtzSolution,
  nmodes: usize,
) -> io::Result<()> {
  let dir = dir.as_ref();
  save_mesh(dir, mesh)?;
  write_eigenvals(create(dir.join("eigenvals.csv"))?, solution.eigenvals())?;

  let nmodes = nmodes.min(solution.neigenpairs());
  let modes: Vec<(String, na::DVector<f64>)> = (0..nmodes)
    .map(|k| (format!("u{k}"), solution.eigenvec(k)))
    .collect();
  let fields: Vec<(&str, &na::DVector<f64>)> = modes
    .iter()
    .map(|(name, mode)| (name.as_str(), mode))
    .collect();
  write_nodes(create(dir.join("eigenvecs.csv"))?, mesh, &fields)
}
