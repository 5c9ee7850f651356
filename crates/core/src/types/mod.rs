//! Core types for Stockroom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod ability;
pub mod email;
pub mod id;
pub mod page;
pub mod price;

pub use ability::Abilities;
pub use email::{Email, EmailError};
pub use id::*;
pub use page::{Page, PageLinks, PageMeta, PageRequest};
pub use price::{Price, PriceError};
