use thiserror::Error;

use crate::body::BodyId;
use crate::steps::JointId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("invalid mass {0}: dynamic bodies need a finite mass > 0")]
    InvalidMass(f64),
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
    #[error("unknown joint {0}")]
    UnknownJoint(JointId),
    #[error("degenerate shape: {0}")]
    DegenerateShape(&'static str),
    #[error("invalid material: {0}")]
    InvalidMaterial(&'static str),
    #[error("invalid world configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("non-finite state detected, bodies frozen: {bodies:?}")]
    NumericInstability { bodies: Vec<BodyId> },
}

pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
