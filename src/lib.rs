extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod boundary;
pub mod config;
pub mod error;
pub mod evp;
pub mod fe;
pub mod io;
pub mod linalg;
pub mod lse;
pub mod matrix;
pub mod mesh;
pub mod problems;
pub mod util;

pub use error::{FemError, FemResult};
