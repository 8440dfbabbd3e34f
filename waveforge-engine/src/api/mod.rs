//! HTTP/SSE control surface
//!
//! Thin axum layer over the service facade. Unary operations are plain
//! JSON endpoints; render operations and subscriptions stream
//! `EngineEvent`s over Server-Sent Events.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{start, AppContext};
