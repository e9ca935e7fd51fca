//! Offline-first sync core for the family budget app.
//!
//! Household members record transactions even while offline; this crate
//! guarantees each logical transaction reaches the authoritative store
//! exactly once. It is built from a durable client-side submission queue,
//! a sequential replay (drain) protocol, a server-side idempotent commit
//! operation keyed by client-minted idempotency keys, and an optimistic
//! projection that keeps read views consistent until the server confirms.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
