//! Persisted game-state store for the Lexis arcade games.
//!
//! Tracks, per game, whether a session is active, whether it has ended and
//! the current win streak. Every mutation is flushed to the durable backend
//! before the call returns, so progress survives restarts.
//!
//! # Components
//! - [`GameStateStore`]: the store itself, generic over a [`DurableBackend`]
//! - [`FileBackend`] / [`MemoryBackend`]: durable and test backends
//! - [`SessionPhase`] / [`Transition`]: the explicit session lifecycle

pub mod backend;
pub mod error;
pub mod game;
pub mod lifecycle;
pub mod store;

pub use backend::{DurableBackend, FileBackend, MemoryBackend};
pub use error::StoreError;
pub use game::{Game, UnknownGame};
pub use lifecycle::{SessionPhase, Transition};
pub use store::{GameRecord, GameStateStore, STORAGE_KEY};
