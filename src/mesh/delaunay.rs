//! Delaunay triangulation of arbitrary point sets with the Bowyer-Watson algorithm.
//!
//! The points are inserted one at a time. Each insertion removes the triangles
//! whose circumcircle contains the new point and re-triangulates the resulting
//! cavity as a fan around the point.
//!
//! The outside of the convex hull is covered by ghost triangles, which join
//! every hull edge to a vertex at infinity. The circumcircle of a ghost triangle
//! degenerates to the open half-plane beyond its hull edge, so points outside
//! the current hull are inserted like any other point and the final hull is
//! exactly the set of edges shared with a ghost triangle.

use super::{bounding_box, NodeIdx, Point, Triangulation, Triangulator};
use crate::error::{FemError, FemResult};

use std::collections::HashSet;

/// Vertex at infinity.
const GHOST: NodeIdx = NodeIdx::MAX;
/// Relative tolerance for collinearity and coincidence checks.
const GEOMETRIC_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, Default)]
pub struct BowyerWatson;

#[derive(Debug, Clone, Copy)]
enum Circumcircle {
  Disk { center: Point, radius_sq: f64 },
  /// Open half-plane left of the directed hull edge `(a, b)`,
  /// together with the open edge itself.
  HalfPlane { a: NodeIdx, b: NodeIdx },
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
  /// Counter-clockwise vertices, possibly including [`GHOST`].
  vertices: [NodeIdx; 3],
  circle: Circumcircle,
}
impl Triangle {
  fn new(vertices: [NodeIdx; 3], points: &[Point]) -> Self {
    let circle = match vertices {
      [a, b, GHOST] | [GHOST, a, b] | [b, GHOST, a] => Circumcircle::HalfPlane { a, b },
      _ => {
        let [a, b, c] = vertices.map(|v| points[v]);
        let (center, radius_sq) = circumcircle(&a, &b, &c);
        Circumcircle::Disk { center, radius_sq }
      }
    };
    Self { vertices, circle }
  }

  fn circumcircle_contains(&self, p: &Point, points: &[Point]) -> bool {
    match self.circle {
      Circumcircle::Disk { center, radius_sq } => {
        na::distance_squared(&center, p) < radius_sq * (1.0 - GEOMETRIC_EPS)
      }
      Circumcircle::HalfPlane { a, b } => {
        let (a, b) = (&points[a], &points[b]);
        let o = orient(a, b, p);
        o > 0.0 || (o == 0.0 && (a - p).dot(&(b - p)) < 0.0)
      }
    }
  }

  fn edges(&self) -> [(NodeIdx, NodeIdx); 3] {
    let [a, b, c] = self.vertices;
    [(a, b), (b, c), (c, a)]
  }
}

/// Twice the signed area of the triangle `abc`. Positive if counter-clockwise.
pub fn orient(a: &Point, b: &Point, c: &Point) -> f64 {
  (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// Center and squared radius of the circle through `a`, `b` and `c`.
fn circumcircle(a: &Point, b: &Point, c: &Point) -> (Point, f64) {
  let d = 2.0 * orient(a, b, c);
  let ab = b - a;
  let ac = c - a;
  let ab2 = ab.norm_squared();
  let ac2 = ac.norm_squared();
  let ux = (ac.y * ab2 - ab.y * ac2) / d;
  let uy = (ab.x * ac2 - ac.x * ab2) / d;
  let center = Point::new(a.x + ux, a.y + uy);
  (center, ux * ux + uy * uy)
}

impl Triangulator for BowyerWatson {
  fn triangulate(&self, points: &[Point]) -> FemResult<Triangulation> {
    let npoints = points.len();
    if npoints < 3 {
      return Err(FemError::Triangulation(format!(
        "need at least 3 points, got {npoints}"
      )));
    }

    // Work in coordinates normalized to the unit box around the origin.
    let bbox = bounding_box(points);
    let scale = bbox.width().max(bbox.height());
    if !(scale.is_finite() && scale > 0.0) {
      return Err(FemError::Triangulation(
        "points do not span a region".to_owned(),
      ));
    }
    let (cx, cy) = bbox.center();
    let work: Vec<Point> = points
      .iter()
      .map(|p| Point::new((p.x - cx) / scale, (p.y - cy) / scale))
      .collect();

    let seed @ [s0, s1, s2] = seed_triangle(&work)?;
    let mut triangles = vec![
      Triangle::new(seed, &work),
      Triangle::new([s1, s0, GHOST], &work),
      Triangle::new([s2, s1, GHOST], &work),
      Triangle::new([s0, s2, GHOST], &work),
    ];

    for ipoint in (0..npoints).filter(|i| !seed.contains(i)) {
      let p = work[ipoint];

      let (mut bad, good): (Vec<Triangle>, Vec<Triangle>) = triangles
        .into_iter()
        .partition(|t| t.circumcircle_contains(&p, &work));
      triangles = good;
      triangles.extend(star_shape_cavity(&mut bad, &p, &work));

      for (u, v) in cavity_boundary(&bad) {
        triangles.push(Triangle::new([u, v, ipoint], &work));
      }
    }

    let mut cells = Vec::new();
    let mut segments = Vec::new();
    for t in &triangles {
      match t.circle {
        // hull edges run counter-clockwise, opposite to their ghost
        Circumcircle::HalfPlane { a, b } => segments.push([b, a]),
        Circumcircle::Disk { .. } => cells.push(t.vertices),
      }
    }
    tracing::debug!(
      "delaunay triangulation with {} triangles and {} hull segments",
      cells.len(),
      segments.len()
    );
    Ok(Triangulation { cells, segments })
  }
}

/// Directed cavity edges without a twin, which form the cavity boundary.
fn cavity_boundary(cavity: &[Triangle]) -> Vec<(NodeIdx, NodeIdx)> {
  let edges: HashSet<(NodeIdx, NodeIdx)> = cavity.iter().flat_map(|t| t.edges()).collect();
  cavity
    .iter()
    .flat_map(|t| t.edges())
    .filter(|&(u, v)| !edges.contains(&(v, u)))
    .collect()
}

/// Shrinks the cavity until `p` sees every boundary edge from the inside,
/// so the fan around `p` has no inverted triangles. Returns the triangles
/// taken out of the cavity.
///
/// Only matters for nearly cocircular points, where the rounded circumcircle
/// tests can disagree with each other.
fn star_shape_cavity(cavity: &mut Vec<Triangle>, p: &Point, points: &[Point]) -> Vec<Triangle> {
  let mut restored = Vec::new();
  loop {
    let boundary: HashSet<(NodeIdx, NodeIdx)> = cavity_boundary(cavity).into_iter().collect();
    let invisible = cavity.iter().position(|t| {
      t.edges().iter().any(|&(u, v)| {
        u != GHOST
          && v != GHOST
          && boundary.contains(&(u, v))
          && orient(&points[u], &points[v], p) <= 0.0
      })
    });
    match invisible {
      Some(i) => restored.push(cavity.swap_remove(i)),
      None => return restored,
    }
  }
}

/// Rejects coincident and collinear point sets and picks a counter-clockwise
/// starting triangle of maximal extent.
fn seed_triangle(points: &[Point]) -> FemResult<[NodeIdx; 3]> {
  let mut sorted: Vec<(usize, &Point)> = points.iter().enumerate().collect();
  sorted.sort_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
  for w in sorted.windows(2) {
    let ((i, a), (j, b)) = (w[0], w[1]);
    if na::distance_squared(a, b) <= GEOMETRIC_EPS * GEOMETRIC_EPS {
      return Err(FemError::Triangulation(format!(
        "points {i} and {j} coincide"
      )));
    }
  }

  let i0 = 0;
  let p0 = &points[i0];
  let i1 = argmax(points, |p| na::distance_squared(p0, p));
  let p1 = &points[i1];
  let i2 = argmax(points, |p| orient(p0, p1, p).abs());
  let o = orient(p0, p1, &points[i2]);
  if o.abs() <= GEOMETRIC_EPS {
    return Err(FemError::Triangulation(
      "all points are collinear".to_owned(),
    ));
  }
  Ok(if o > 0.0 { [i0, i1, i2] } else { [i0, i2, i1] })
}

fn argmax(points: &[Point], measure: impl Fn(&Point) -> f64) -> NodeIdx {
  points
    .iter()
    .map(measure)
    .enumerate()
    .max_by(|a, b| a.1.total_cmp(&b.1))
    .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    config::Domain,
    mesh::nodes::{random_nodes, NodeLayout},
    mesh::TriangleMesh,
  };

  fn area(points: &[Point], cell: &[NodeIdx; 3]) -> f64 {
    0.5 * orient(&points[cell[0]], &points[cell[1]], &points[cell[2]])
  }

  #[test]
  fn square_with_center() {
    let points = vec![
      Point::new(0.0, 0.0),
      Point::new(1.0, 0.0),
      Point::new(1.0, 1.0),
      Point::new(0.0, 1.0),
      Point::new(0.5, 0.5),
    ];
    let tria = BowyerWatson.triangulate(&points).unwrap();
    assert_eq!(tria.cells.len(), 4);
    assert_eq!(tria.segments.len(), 4);
    for cell in &tria.cells {
      assert!(cell.contains(&4));
      assert!(area(&points, cell) > 0.0);
    }
    for seg in &tria.segments {
      assert!(!seg.contains(&4));
    }
  }

  #[test]
  fn random_covers_domain() {
    let domain = Domain::reference_square();
    let points = random_nodes(&domain, 60, 3);
    let tria = BowyerWatson.triangulate(&points).unwrap();

    let total_area: f64 = tria.cells.iter().map(|c| area(&points, c)).sum();
    assert!((total_area - domain.area()).abs() < 1e-9, "{total_area}");

    // Euler: a triangulation of n points with h hull points has 2n - 2 - h triangles.
    let nhull = tria.segments.len();
    assert_eq!(tria.cells.len(), 2 * points.len() - 2 - nhull);
  }

  #[test]
  fn hull_is_the_domain_boundary() {
    let domains = [
      Domain::reference_square(),
      Domain::new(0.0, 10.0, 0.0, 0.1),
      Domain::new(-0.5, 0.5, 0.0, 4.0),
    ];
    for domain in &domains {
      for nnodes in [8, 9, 12, 20, 50, 200] {
        for seed in 0..40 {
          let points = random_nodes(domain, nnodes, seed);
          let tria = BowyerWatson.triangulate(&points).unwrap();

          let total_area: f64 = tria.cells.iter().map(|c| area(&points, c)).sum();
          assert!(
            (total_area - domain.area()).abs() < 1e-9 * domain.area(),
            "n={nnodes} seed={seed}: area {total_area} != {}",
            domain.area()
          );
          assert!(tria.cells.iter().all(|c| area(&points, c) > 0.0));

          // only the pinned corners and midpoints lie on the boundary
          assert_eq!(tria.segments.len(), 8, "n={nnodes} seed={seed}");
          for &[a, b] in &tria.segments {
            let (pa, pb) = (points[a], points[b]);
            let on_side = (pa.x == pb.x && (pa.x == domain.x_min || pa.x == domain.x_max))
              || (pa.y == pb.y && (pa.y == domain.y_min || pa.y == domain.y_max));
            assert!(on_side, "n={nnodes} seed={seed}: chord {pa} {pb}");
          }
        }
      }
    }
  }

  #[test]
  fn collinear_hull_points() {
    let points = random_nodes(&Domain::reference_square(), 8, 0);
    let tria = BowyerWatson.triangulate(&points).unwrap();
    assert_eq!(tria.segments.len(), 8);
    assert_eq!(tria.cells.len(), 2 * 8 - 2 - 8);
    let total_area: f64 = tria.cells.iter().map(|c| area(&points, c)).sum();
    assert!((total_area - 4.0).abs() < 1e-12);
  }

  #[test]
  fn delaunay_property() {
    let points = random_nodes(&Domain::new(0.0, 3.0, 0.0, 1.0), 40, 11);
    let tria = BowyerWatson.triangulate(&points).unwrap();
    for cell in &tria.cells {
      let [a, b, c] = cell.map(|v| points[v]);
      let (center, radius_sq) = circumcircle(&a, &b, &c);
      for (ip, p) in points.iter().enumerate() {
        if !cell.contains(&ip) {
          assert!(na::distance_squared(&center, p) >= radius_sq * (1.0 - 1e-9));
        }
      }
    }
  }

  #[test]
  fn generate_random_mesh() {
    let layout = NodeLayout::Random {
      nnodes: 30,
      seed: 5,
    };
    let mesh = TriangleMesh::generate(&Domain::reference_square(), &layout).unwrap();
    assert_eq!(mesh.nnodes(), 30);
    assert!(mesh.nsegments() >= 8);
  }

  #[test]
  fn degenerate_inputs() {
    let collinear = vec![
      Point::new(0.0, 0.0),
      Point::new(1.0, 1.0),
      Point::new(2.0, 2.0),
    ];
    assert!(BowyerWatson.triangulate(&collinear).is_err());

    let duplicate = vec![
      Point::new(0.0, 0.0),
      Point::new(1.0, 0.0),
      Point::new(0.0, 1.0),
      Point::new(1.0, 0.0),
    ];
    assert!(BowyerWatson.triangulate(&duplicate).is_err());

    assert!(BowyerWatson.triangulate(&collinear[..2]).is_err());
  }
}
