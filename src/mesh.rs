//! The mesh is the container of the nodes, triangles and boundary segments.
//! It provides the global numbering of the nodes (the index into the point
//! sequence), which is the only node identity used throughout assembly.
//!
//! Triangulating the nodes is delegated to a [`Triangulator`].

pub mod delaunay;
pub mod lattice;
pub mod nodes;

use crate::{
  config::Domain,
  error::{FemError, FemResult},
};

use itertools::Itertools;

pub type Point = na::Point2<f64>;

pub type NodeIdx = usize;
pub type CellIdx = usize;
pub type SegmentIdx = usize;

/// Output of a triangulation service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triangulation {
  /// Triangles as triples of node indices.
  pub cells: Vec<[NodeIdx; 3]>,
  /// Convex hull edges as pairs of node indices.
  pub segments: Vec<[NodeIdx; 2]>,
}

/// A service that triangulates a point set.
///
/// The returned segments must be the edges of the convex hull of the points.
pub trait Triangulator {
  fn triangulate(&self, points: &[Point]) -> FemResult<Triangulation>;
}

#[derive(Debug, Clone)]
pub struct TriangleMesh {
  points: Vec<Point>,
  cells: Vec<[NodeIdx; 3]>,
  segments: Vec<[NodeIdx; 2]>,
}

// constructors
impl TriangleMesh {
  pub fn new(points: Vec<Point>, triangulation: Triangulation) -> FemResult<Self> {
    let nnodes = points.len();
    let Triangulation { cells, segments } = triangulation;

    if let Some((icell, _)) = cells
      .iter()
      .find_position(|cell| cell.iter().any(|&v| v >= nnodes))
    {
      return Err(FemError::Triangulation(format!(
        "triangle {icell} references a node outside of 0..{nnodes}"
      )));
    }
    if let Some((iseg, _)) = segments
      .iter()
      .find_position(|seg| seg.iter().any(|&v| v >= nnodes))
    {
      return Err(FemError::Triangulation(format!(
        "segment {iseg} references a node outside of 0..{nnodes}"
      )));
    }

    Ok(Self {
      points,
      cells,
      segments,
    })
  }

  pub fn from_points(points: Vec<Point>, triangulator: &impl Triangulator) -> FemResult<Self> {
    let triangulation = triangulator.triangulate(&points)?;
    let mesh = Self::new(points, triangulation)?;
    tracing::info!(
      "triangulated {} nodes into {} triangles and {} boundary segments",
      mesh.nnodes(),
      mesh.ncells(),
      mesh.nsegments()
    );
    Ok(mesh)
  }

  /// Generates the nodes on `domain` and triangulates them with the
  /// triangulator suited for the layout.
  pub fn generate(domain: &Domain, layout: &nodes::NodeLayout) -> FemResult<Self> {
    domain.validate()?;
    layout.validate()?;
    let points = nodes::generate_nodes(domain, layout);
    match *layout {
      nodes::NodeLayout::Lattice { nnodes_axis } => {
        Self::from_points(points, &lattice::LatticeTriangulator::new(nnodes_axis))
      }
      nodes::NodeLayout::Random { .. } => Self::from_points(points, &delaunay::BowyerWatson),
    }
  }
}

// getters
impl TriangleMesh {
  pub fn nnodes(&self) -> usize {
    self.points.len()
  }
  pub fn ncells(&self) -> usize {
    self.cells.len()
  }
  pub fn nsegments(&self) -> usize {
    self.segments.len()
  }

  pub fn points(&self) -> &[Point] {
    &self.points
  }
  pub fn cells(&self) -> &[[NodeIdx; 3]] {
    &self.cells
  }
  pub fn segments(&self) -> &[[NodeIdx; 2]] {
    &self.segments
  }

  pub fn point(&self, inode: NodeIdx) -> &Point {
    &self.points[inode]
  }
  pub fn cell(&self, icell: CellIdx) -> [NodeIdx; 3] {
    self.cells[icell]
  }
  pub fn segment(&self, iseg: SegmentIdx) -> [NodeIdx; 2] {
    self.segments[iseg]
  }
}

// local coordinates
impl TriangleMesh {
  /// Vertex positions of a triangle, in the order of its node triple.
  pub fn cell_coords(&self, icell: CellIdx) -> [Point; 3] {
    self.cells[icell].map(|v| self.points[v])
  }

  /// Endpoint positions of a boundary segment.
  pub fn segment_coords(&self, iseg: SegmentIdx) -> [Point; 2] {
    self.segments[iseg].map(|v| self.points[v])
  }

  pub fn all_cell_coords(&self) -> Vec<[Point; 3]> {
    (0..self.ncells()).map(|icell| self.cell_coords(icell)).collect()
  }

  pub fn all_segment_coords(&self) -> Vec<[Point; 2]> {
    (0..self.nsegments())
      .map(|iseg| self.segment_coords(iseg))
      .collect()
  }

  pub fn segment_length(&self, iseg: SegmentIdx) -> f64 {
    let [a, b] = self.segment_coords(iseg);
    na::distance(&a, &b)
  }

  pub fn segment_lengths(&self) -> Vec<f64> {
    (0..self.nsegments())
      .map(|iseg| self.segment_length(iseg))
      .collect()
  }

  /// The nodes that lie on a boundary segment.
  /// Ordered by first occurrence.
  pub fn boundary_nodes(&self) -> Vec<NodeIdx> {
    self.segments.iter().flatten().copied().unique().collect()
  }

  /// Smallest axis-aligned box containing all nodes.
  pub fn bounding_box(&self) -> Domain {
    bounding_box(&self.points)
  }
}

pub fn bounding_box(points: &[Point]) -> Domain {
  let (x_min, x_max) = points
    .iter()
    .map(|p| p.x)
    .minmax_by(f64::total_cmp)
    .into_option()
    .unwrap_or((0.0, 0.0));
  let (y_min, y_max) = points
    .iter()
    .map(|p| p.y)
    .minmax_by(f64::total_cmp)
    .into_option()
    .unwrap_or((0.0, 0.0));
  Domain::new(x_min, x_max, y_min, y_max)
}
