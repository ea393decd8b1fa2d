//! Live bridge from a TCP simulation stream to a reconciled entity set.
//!
//! Data flow:
//!   socket bytes → Framer → decoder → handoff queue → TickDriver → Reconciler → view

pub mod acceptor;
pub mod clock;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod framer;
pub mod queue;
pub mod reconciler;
pub mod snapshot;
pub mod tick;
pub mod types;
pub mod view;
