//! Event and message types exchanged across systems.
//!
//! Messages ([`actor::ActorCommand`], [`loader::LoaderCmd`],
//! [`loader::LoaderMessage`]) are queued and read once per frame. Events are
//! triggered and handled by observers, such as the per-actor subscriptions
//! opened when an actor becomes ready.
//!
//! Submodules:
//! - [`actor`] – script commands and actor ready/failure notifications
//! - [`aspect`] – scene output aspect changes
//! - [`loader`] – commands and replies of the background loader thread
//! - [`print`] – text printing and voice playback notifications
//!
//! See each submodule for concrete event data, semantics, and example usage.
pub mod actor;
pub mod aspect;
pub mod loader;
pub mod print;
