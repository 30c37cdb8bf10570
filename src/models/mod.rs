//! Bundled model definitions
//!
//! Two structurally different systems sharing one engine: the minimal
//! one-compartment-with-absorption model [`pk1`] and the whole-body
//! voriconazole physiology, in its perfusion-limited form
//! [`voriconazole`] and its permeability-limited extension
//! [`voriconazole_ext`].

pub mod pk1;
pub mod voriconazole;
pub mod voriconazole_ext;
