//! Rise of the Triad to Quake conversion.
//!
//! [`level`] loads RTL map archives, [`analysis`] recovers doors, paths,
//! areas and actors from the tile planes, and [`quakemap`] synthesizes a
//! `.map` document from the result. Lump archives are read through
//! [`archive`] and their pictures decoded and re-encoded by [`picture`].

pub mod analysis;
pub mod archive;
pub mod binary;
pub mod error;
pub mod level;
pub mod picture;
pub mod plane;
pub mod quakemap;

pub use error::{ConvertError, Result};
