//! Domain layer: desired/observed repository state, change plans and the diff engine.

pub mod entities;
pub mod services;
pub mod value_objects;
