use crate::mesh::CellIdx;

pub type FemResult<T> = Result<T, FemError>;

#[derive(Debug, thiserror::Error)]
pub enum FemError {
  /// Triangle with (numerically) vanishing area.
  #[error("degenerate triangle {icell} with area {area:e}")]
  DegenerateElement { icell: CellIdx, area: f64 },

  #[error("singular system: {0}")]
  SingularSystem(String),

  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),

  #[error("triangulation failed: {0}")]
  Triangulation(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for FemError {
  fn from(err: serde_json::Error) -> Self {
    Self::InvalidConfiguration(err.to_string())
  }
}
