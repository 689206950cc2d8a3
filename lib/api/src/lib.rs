//! HTTP surface of Metallo

pub mod rest;

pub use rest::{AppState, PassageResponse, RelatedItem, RestApi};
