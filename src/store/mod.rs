//! State Container Factory
//!
//! - [`state`] - [`ContainerState`] and its synchronous transitions
//! - [`container`] - [`Container`], the per-resource async state machine
//! - [`registry`] - [`Store`], mapping resource names to containers

pub mod container;
pub mod registry;
pub mod state;

pub use container::{make_container, Container};
pub use registry::Store;
pub use state::{Channel, ContainerState, ItemSnapshot, Operation, OperationError, Status};
