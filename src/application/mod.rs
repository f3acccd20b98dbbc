//! Application layer: services, forms and the ports they depend on.

pub mod authors;
pub mod crud;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod search;
pub mod tags;
