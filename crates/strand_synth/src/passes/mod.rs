//! Netlist cleanup passes run after statement synthesis.
//!
//! Each pass carries its own visitor-local state and walks the design
//! directly; none of them keeps state between invocations.

mod nodangle;
mod nobufz;
mod sigfold;

pub use nodangle::nodangle;
pub use nobufz::nobufz;
pub use sigfold::sigfold;
