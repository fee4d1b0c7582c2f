//! Runtime wrapper for the box office workspace. Keeps thread and tokio
//! plumbing out of the pool crate: the pool only talks to `threads` or
//! `tasks`, never to `std::thread` or `tokio` directly.

pub mod tasks;
pub mod threads;
pub(crate) mod tracing;
