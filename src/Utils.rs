//! different utility modules used throughout the project
/// terminal and file logger setup shared by the solvers
pub mod logger;
