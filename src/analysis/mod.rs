//! Analysis over the live buffers: bounded storage, averages and trends,
//! and the risk estimators.

pub mod buffer;
pub mod risk;
pub mod trend;
