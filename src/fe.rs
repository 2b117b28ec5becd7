//! Linear Lagrangian finite elements on triangles.
//!
//! Every element carries its area and the coefficients of its three linear
//! shape functions $N_i (x, y) = (a_i + b_i x + c_i y) / D$, where $D$ is twice
//! the signed area. The element matrix providers only depend on these.

use crate::{
  error::{FemError, FemResult},
  mesh::{CellIdx, NodeIdx, Point, TriangleMesh},
};

use rayon::prelude::*;

/// Relative area below which a triangle counts as degenerate.
const DEGENERACY_TOL: f64 = 1e-12;

pub type ElMat = na::Matrix3<f64>;
pub type ElVec = na::Vector3<f64>;

/// Twice the signed area of the triangle: positive for counter-clockwise vertices.
///
/// $D = (x_1 - x_0)(y_2 - y_0) - (x_2 - x_0)(y_1 - y_0)$
pub fn signed_area_proxy(coords: &[Point; 3]) -> f64 {
  let [p0, p1, p2] = coords;
  (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

/// Coefficients of the linear shape functions, indexed by local node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCoeffs {
  pub a: [f64; 3],
  pub b: [f64; 3],
  pub c: [f64; 3],
}
impl ShapeCoeffs {
  pub fn new(coords: &[Point; 3]) -> Self {
    let mut a = [0.0; 3];
    let mut b = [0.0; 3];
    let mut c = [0.0; 3];
    for i in 0..3 {
      let pj = coords[(i + 1) % 3];
      let pk = coords[(i + 2) % 3];
      a[i] = pj.x * pk.y - pk.x * pj.y;
      b[i] = pj.y - pk.y;
      c[i] = pk.x - pj.x;
    }
    Self { a, b, c }
  }
}

#[derive(Debug, Clone)]
pub struct TriangleElement {
  icell: CellIdx,
  nodes: [NodeIdx; 3],
  coords: [Point; 3],
  det: f64,
  area: f64,
  shape: ShapeCoeffs,
}

// constructors
impl TriangleElement {
  pub fn new(icell: CellIdx, nodes: [NodeIdx; 3], coords: [Point; 3]) -> FemResult<Self> {
    let det = signed_area_proxy(&coords);
    let area = det.abs() / 2.0;

    let longest_sq = [(0, 1), (1, 2), (2, 0)]
      .iter()
      .map(|&(i, j)| na::distance_squared(&coords[i], &coords[j]))
      .fold(0.0, f64::max);
    if !area.is_finite() || area <= DEGENERACY_TOL * longest_sq {
      return Err(FemError::DegenerateElement { icell, area });
    }

    let shape = ShapeCoeffs::new(&coords);
    Ok(Self {
      icell,
      nodes,
      coords,
      det,
      area,
      shape,
    })
  }

  pub fn from_mesh(mesh: &TriangleMesh, icell: CellIdx) -> FemResult<Self> {
    Self::new(icell, mesh.cell(icell), mesh.cell_coords(icell))
  }
}

// getters
impl TriangleElement {
  pub fn icell(&self) -> CellIdx {
    self.icell
  }
  /// Global node ids in local order.
  pub fn nodes(&self) -> [NodeIdx; 3] {
    self.nodes
  }
  pub fn coords(&self) -> &[Point; 3] {
    &self.coords
  }
  pub fn area(&self) -> f64 {
    self.area
  }
  pub fn is_ccw(&self) -> bool {
    self.det > 0.0
  }
  pub fn shape(&self) -> &ShapeCoeffs {
    &self.shape
  }

  /// Value of the shape function of local node `i` at `p`.
  pub fn basis(&self, i: usize, p: &Point) -> f64 {
    let ShapeCoeffs { a, b, c } = &self.shape;
    (a[i] + b[i] * p.x + c[i] * p.y) / self.det
  }

  /// Constant gradient of the shape function of local node `i`.
  pub fn basis_grad(&self, i: usize) -> na::Vector2<f64> {
    na::Vector2::new(self.shape.b[i], self.shape.c[i]) / self.det
  }
}

/// Computes the elements of all triangles of the mesh.
///
/// Fails with the degenerate triangle of lowest index, if there is any.
pub fn compute_elements(mesh: &TriangleMesh) -> FemResult<Vec<TriangleElement>> {
  let elements: Vec<FemResult<TriangleElement>> = (0..mesh.ncells())
    .into_par_iter()
    .map(|icell| TriangleElement::from_mesh(mesh, icell))
    .collect();
  elements.into_iter().collect()
}

pub trait ElmatProvider: Sync {
  fn eval(&self, elem: &TriangleElement) -> ElMat;
}
impl<F> ElmatProvider for F
where
  F: Fn(&TriangleElement) -> ElMat + Sync,
{
  fn eval(&self, elem: &TriangleElement) -> ElMat {
    self(elem)
  }
}

pub trait ElvecProvider: Sync {
  fn eval(&self, elem: &TriangleElement) -> ElVec;
}
impl<F> ElvecProvider for F
where
  F: Fn(&TriangleElement) -> ElVec + Sync,
{
  fn eval(&self, elem: &TriangleElement) -> ElVec {
    self(elem)
  }
}

/// Element Matrix Provider for the diffusion bilinear form $integral p grad u dot grad v$.
///
/// $A_(i j) = p / (4 |K|) (b_i b_j + c_i c_j)$
#[derive(Debug, Clone, Copy)]
pub struct StiffnessElmat {
  pub p: f64,
}
impl StiffnessElmat {
  pub fn new(p: f64) -> Self {
    Self { p }
  }
}
impl ElmatProvider for StiffnessElmat {
  fn eval(&self, elem: &TriangleElement) -> ElMat {
    let ShapeCoeffs { b, c, .. } = elem.shape;
    let scale = self.p / (4.0 * elem.area);
    ElMat::from_fn(|i, j| scale * (b[i] * b[j] + c[i] * c[j]))
  }
}

/// Exact Element Matrix Provider for the mass bilinear form $integral q u v$.
#[derive(Debug, Clone, Copy)]
pub struct MassElmat {
  pub q: f64,
}
impl MassElmat {
  pub fn new(q: f64) -> Self {
    Self { q }
  }
}
impl ElmatProvider for MassElmat {
  fn eval(&self, elem: &TriangleElement) -> ElMat {
    let v = self.q * elem.area / 12.0;
    let mut elmat = ElMat::from_element(v);
    elmat.fill_diagonal(2.0 * v);
    elmat
  }
}

/// Element Vector Provider for a uniform source term.
///
/// The total source $f |K|$ is split equally between the three nodes,
/// which is exact for constant $f$.
#[derive(Debug, Clone, Copy)]
pub struct LoadElvec {
  pub f: f64,
}
impl LoadElvec {
  pub fn new(f: f64) -> Self {
    Self { f }
  }
}
impl ElvecProvider for LoadElvec {
  fn eval(&self, elem: &TriangleElement) -> ElVec {
    ElVec::from_element(self.f * elem.area / 3.0)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use approx::assert_relative_eq;

  fn unit_triangle() -> TriangleElement {
    let coords = [
      Point::new(0.0, 0.0),
      Point::new(1.0, 0.0),
      Point::new(0.0, 1.0),
    ];
    TriangleElement::new(0, [0, 1, 2], coords).unwrap()
  }

  #[test]
  fn shape_coeffs_unit_triangle() {
    let elem = unit_triangle();
    let shape = elem.shape();
    assert_eq!(shape.a, [1.0, 0.0, 0.0]);
    assert_eq!(shape.b, [-1.0, 1.0, 0.0]);
    assert_eq!(shape.c, [-1.0, 0.0, 1.0]);
    assert_eq!(elem.area(), 0.5);
    assert!(elem.is_ccw());
  }

  #[test]
  fn basis_is_nodal() {
    let coords = [
      Point::new(0.3, -0.2),
      Point::new(2.0, 0.1),
      Point::new(0.7, 1.4),
    ];
    // clockwise order on purpose
    let coords_cw = [coords[0], coords[2], coords[1]];
    for coords in [coords, coords_cw] {
      let elem = TriangleElement::new(0, [0, 1, 2], coords).unwrap();
      for i in 0..3 {
        for (j, p) in coords.iter().enumerate() {
          let expected = if i == j { 1.0 } else { 0.0 };
          assert_relative_eq!(elem.basis(i, p), expected, epsilon = 1e-12);
        }
      }
      let grad_sum: na::Vector2<f64> = (0..3).map(|i| elem.basis_grad(i)).sum();
      assert_relative_eq!(grad_sum.norm(), 0.0, epsilon = 1e-12);
    }
  }

  #[test]
  fn lowest_degenerate_cell_is_reported() {
    use crate::{
      config::Domain,
      mesh::{lattice::LatticeTriangulator, nodes::lattice_nodes, Triangulator},
    };

    let points = lattice_nodes(&Domain::reference_square(), 7);
    let mut triangulation = LatticeTriangulator::new(7).triangulate(&points).unwrap();
    // nodes 0, 1 and 2 lie on the bottom side
    for icell in [5, 40, 60] {
      triangulation.cells[icell] = [0, 1, 2];
    }
    let mesh = TriangleMesh::new(points, triangulation).unwrap();

    for _ in 0..10 {
      assert!(matches!(
        compute_elements(&mesh),
        Err(FemError::DegenerateElement { icell: 5, .. })
      ));
    }
  }

  #[test]
  fn mass_sums_to_area() {
    let elem = unit_triangle();
    let elmat = MassElmat::new(3.0).eval(&elem);
    assert_relative_eq!(elmat.sum(), 3.0 * 0.5, epsilon = 1e-14);
    assert_relative_eq!(elmat[(0, 0)], 3.0 * 0.5 / 6.0);
    assert_relative_eq!(elmat[(0, 1)], 3.0 * 0.5 / 12.0);

    let elvec = LoadElvec::new(2.0).eval(&elem);
    assert_relative_eq!(elvec.sum(), 2.0 * 0.5, epsilon = 1e-14);
  }

  #[test]
  fn closure_provider() {
    let elem = unit_triangle();
    let provider = |elem: &TriangleElement| ElMat::from_element(elem.area());
    assert_eq!(ElmatProvider::eval(&provider, &elem), ElMat::from_element(0.5));
  }

  #[test]
  fn degenerate_triangle() {
    let coords = [
      Point::new(0.0, 0.0),
      Point::new(1.0, 1.0),
      Point::new(2.0, 2.0),
    ];
    let err = TriangleElement::new(7, [0, 1, 2], coords).unwrap_err();
    assert!(matches!(err, FemError::DegenerateElement { icell: 7, .. }));
  }
}
