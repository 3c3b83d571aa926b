//! Domain Module
//!
//! Entities, value objects, events and the trait seams they persist
//! through. Entities hold data only; behaviour that varies per variant
//! lives on the owning sum type.

pub mod entities;
pub mod events;
pub mod repositories;
pub mod services;
pub mod value_objects;
