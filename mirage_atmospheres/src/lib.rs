//! The two atmospheres of the simulator, and ready-to-trace setups for each.
//!
//! - [`DesertAtmosphere`]: hot ground, index increasing with height, inferior mirages.
//! - [`OceanAtmosphere`]: temperature inversion over the sea, ducts, superior mirages.

mod desert;
mod error;
mod ocean;

pub use desert::*;
pub use error::*;
pub use ocean::*;

use mirage::*;

#[cfg(feature = "rayon")]
use mirage::par_trace_fan as trace_fan;
