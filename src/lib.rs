//! Professor recommendation service: retrieves similar reviews for a student's
//! question and streams a model-written answer back over HTTP.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
