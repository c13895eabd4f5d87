//! Domain layer for Domain Guardian
//!
//! CDD Principle: Domain Model - Pure vocabulary of markers, declarations and violations
//! - Marker kinds are data values, evaluated by one engine
//! - Records are ordered and hashable so results merge as plain set/map unions
//! - Independent of the file system and of how reports are rendered

pub mod declarations;
pub mod markers;
pub mod violations;

// Re-export main domain types for convenience
pub use declarations::*;
pub use markers::*;
pub use violations::*;
