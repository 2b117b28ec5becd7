//! Problem configuration.
//!
//! Raw (serde) representations are deserialized from JSON and then validated
//! into typed values. All validation happens here, before any mesh or
//! assembly work is done.

use crate::{
  error::{FemError, FemResult},
  mesh::nodes::NodeLayout,
};

use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

/// Axis-aligned rectangular domain $[x_min, x_max] times [y_min, y_max]$.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
  pub x_min: f64,
  pub x_max: f64,
  pub y_min: f64,
  pub y_max: f64,
}
impl Domain {
  pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
    Self {
      x_min,
      x_max,
      y_min,
      y_max,
    }
  }

  /// The square $[-1, 1]^2$.
  pub fn reference_square() -> Self {
    Self::new(-1.0, 1.0, -1.0, 1.0)
  }

  pub fn width(&self) -> f64 {
    self.x_max - self.x_min
  }
  pub fn height(&self) -> f64 {
    self.y_max - self.y_min
  }
  pub fn area(&self) -> f64 {
    self.width() * self.height()
  }
  pub fn center(&self) -> (f64, f64) {
    (
      0.5 * (self.x_min + self.x_max),
      0.5 * (self.y_min + self.y_max),
    )
  }

  pub fn validate(&self) -> FemResult<()> {
    let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
    if bounds.iter().any(|b| !b.is_finite()) {
      return Err(FemError::InvalidConfiguration(format!(
        "domain bounds must be finite, got {self:?}"
      )));
    }
    if self.x_min >= self.x_max || self.y_min >= self.y_max {
      return Err(FemError::InvalidConfiguration(format!(
        "domain must have positive extent, got {self:?}"
      )));
    }
    Ok(())
  }
}
impl Default for Domain {
  fn default() -> Self {
    Self::reference_square()
  }
}

/// Boundary condition configured for one side of the domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
  /// Fixed solution value.
  Dirichlet(f64),
  /// Fixed outward flux.
  Neumann(f64),
  /// Leaves the system untouched (natural, zero-flux).
  None,
}
impl BoundaryCondition {
  pub fn is_dirichlet(&self) -> bool {
    matches!(self, Self::Dirichlet(_))
  }
  pub fn is_homogeneous(&self) -> bool {
    match *self {
      Self::Dirichlet(v) | Self::Neumann(v) => v == 0.0,
      Self::None => true,
    }
  }
}

/// Serialized form of a [`BoundaryCondition`], e.g. `{"kind": "Dirichlet", "value": 0.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConditionSpec {
  pub kind: String,
  #[serde(default)]
  pub value: f64,
}
impl Default for BoundaryConditionSpec {
  fn default() -> Self {
    Self {
      kind: "None".to_owned(),
      value: 0.0,
    }
  }
}
impl TryFrom<&BoundaryConditionSpec> for BoundaryCondition {
  type Error = FemError;

  fn try_from(spec: &BoundaryConditionSpec) -> FemResult<Self> {
    if !spec.value.is_finite() {
      return Err(FemError::InvalidConfiguration(format!(
        "boundary value must be finite, got {}",
        spec.value
      )));
    }
    match spec.kind.to_ascii_lowercase().as_str() {
      "dirichlet" => Ok(Self::Dirichlet(spec.value)),
      "neumann" => Ok(Self::Neumann(spec.value)),
      "none" => Ok(Self::None),
      other => Err(FemError::InvalidConfiguration(format!(
        "unknown boundary condition kind `{other}`"
      ))),
    }
  }
}

/// Boundary conditions of the four sides of a rectangular domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideConditions {
  pub left: BoundaryCondition,
  pub right: BoundaryCondition,
  pub bottom: BoundaryCondition,
  pub top: BoundaryCondition,
}
impl SideConditions {
  pub fn uniform(condition: BoundaryCondition) -> Self {
    Self {
      left: condition,
      right: condition,
      bottom: condition,
      top: condition,
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = BoundaryCondition> {
    [self.left, self.right, self.bottom, self.top].into_iter()
  }

  pub fn has_dirichlet(&self) -> bool {
    self.iter().any(|c| c.is_dirichlet())
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SideConditionsSpec {
  #[serde(default)]
  pub left: BoundaryConditionSpec,
  #[serde(default)]
  pub right: BoundaryConditionSpec,
  #[serde(default)]
  pub bottom: BoundaryConditionSpec,
  #[serde(default)]
  pub top: BoundaryConditionSpec,
}
impl TryFrom<&SideConditionsSpec> for SideConditions {
  type Error = FemError;

  fn try_from(spec: &SideConditionsSpec) -> FemResult<Self> {
    let side = |name: &str, spec: &BoundaryConditionSpec| {
      BoundaryCondition::try_from(spec).map_err(|err| match err {
        FemError::InvalidConfiguration(msg) => {
          FemError::InvalidConfiguration(format!("{name} side: {msg}"))
        }
        err => err,
      })
    };
    Ok(Self {
      left: side("left", &spec.left)?,
      right: side("right", &spec.right)?,
      bottom: side("bottom", &spec.bottom)?,
      top: side("top", &spec.top)?,
    })
  }
}

/// Storage of the global system matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
  #[default]
  Dense,
  Sparse,
}
impl FromStr for StorageMode {
  type Err = FemError;

  fn from_str(s: &str) -> FemResult<Self> {
    match s.to_ascii_lowercase().as_str() {
      "dense" | "basic" => Ok(Self::Dense),
      "sparse" => Ok(Self::Sparse),
      other => Err(FemError::InvalidConfiguration(format!(
        "unknown storage mode `{other}`"
      ))),
    }
  }
}
impl fmt::Display for StorageMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Dense => write!(f, "dense"),
      Self::Sparse => write!(f, "sparse"),
    }
  }
}

/// $-div(p grad u) = f$ with mixed boundary conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonConfig {
  pub domain: Domain,
  pub boundary: SideConditions,
  pub storage: StorageMode,
  /// Diffusion coefficient.
  pub p: f64,
  /// Uniform source term.
  pub f: f64,
}
impl PoissonConfig {
  pub fn validate(&self) -> FemResult<()> {
    self.domain.validate()?;
    if !(self.p.is_finite() && self.p > 0.0) {
      return Err(FemError::InvalidConfiguration(format!(
        "diffusion coefficient p must be positive, got {}",
        self.p
      )));
    }
    if !self.f.is_finite() {
      return Err(FemError::InvalidConfiguration(format!(
        "source term f must be finite, got {}",
        self.f
      )));
    }
    Ok(())
  }
}

/// Generalized eigenproblem $A u = lambda omega^2 B u$ of the Helmholtz operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelmholtzConfig {
  pub domain: Domain,
  pub boundary: SideConditions,
  pub storage: StorageMode,
  /// Diffusion coefficient.
  pub p: f64,
  /// Reaction coefficient.
  pub q: f64,
  /// Reference frequency.
  pub omega: f64,
}
impl HelmholtzConfig {
  pub fn validate(&self) -> FemResult<()> {
    self.domain.validate()?;
    for (name, value) in [("p", self.p), ("q", self.q), ("omega", self.omega)] {
      if !(value.is_finite() && value > 0.0) {
        return Err(FemError::InvalidConfiguration(format!(
          "{name} must be positive, got {value}"
        )));
      }
    }
    if let Some(c) = self.boundary.iter().find(|c| !c.is_homogeneous()) {
      return Err(FemError::InvalidConfiguration(format!(
        "eigenproblem only supports homogeneous boundary conditions, got {c:?}"
      )));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProblemKind {
  Poisson(PoissonConfig),
  Helmholtz(HelmholtzConfig),
}

/// Full, validated run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemConfig {
  pub layout: NodeLayout,
  pub problem: ProblemKind,
}
impl ProblemConfig {
  pub fn from_json_str(json: &str) -> FemResult<Self> {
    let raw: RawProblemConfig = serde_json::from_str(json)?;
    Self::try_from(&raw)
  }

  pub fn load(path: impl AsRef<Path>) -> FemResult<Self> {
    let json = std::fs::read_to_string(path)?;
    Self::from_json_str(&json)
  }

  pub fn domain(&self) -> &Domain {
    match &self.problem {
      ProblemKind::Poisson(c) => &c.domain,
      ProblemKind::Helmholtz(c) => &c.domain,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawProblemParams {
  Poisson {
    #[serde(default = "unit")]
    p: f64,
    #[serde(default = "unit")]
    f: f64,
  },
  Helmholtz {
    #[serde(default = "unit")]
    p: f64,
    #[serde(default = "unit")]
    q: f64,
    #[serde(default = "unit")]
    omega: f64,
  },
}

fn unit() -> f64 {
  1.0
}

/// Deserialized, not yet validated, configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProblemConfig {
  #[serde(default)]
  pub domain: Domain,
  pub mesh: NodeLayout,
  #[serde(default = "default_storage")]
  pub storage: String,
  #[serde(default)]
  pub boundary: SideConditionsSpec,
  pub problem: RawProblemParams,
}

fn default_storage() -> String {
  StorageMode::default().to_string()
}

impl TryFrom<&RawProblemConfig> for ProblemConfig {
  type Error = FemError;

  fn try_from(raw: &RawProblemConfig) -> FemResult<Self> {
    raw.mesh.validate()?;
    let domain = raw.domain;
    let storage: StorageMode = raw.storage.parse()?;
    let boundary = SideConditions::try_from(&raw.boundary)?;

    let problem = match raw.problem {
      RawProblemParams::Poisson { p, f } => {
        let config = PoissonConfig {
          domain,
          boundary,
          storage,
          p,
          f,
        };
        config.validate()?;
        ProblemKind::Poisson(config)
      }
      RawProblemParams::Helmholtz { p, q, omega } => {
        let config = HelmholtzConfig {
          domain,
          boundary,
          storage,
          p,
          q,
          omega,
        };
        config.validate()?;
        ProblemKind::Helmholtz(config)
      }
    };

    Ok(Self {
      layout: raw.mesh,
      problem,
    })
  }
}
