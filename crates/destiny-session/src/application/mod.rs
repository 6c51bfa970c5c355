//! Application services for the Session & Persistence context.

pub mod observer;
pub mod service;
pub mod store;
