//! ECS components for actor entities.
//!
//! An actor is an entity carrying the component set spawned by
//! [`crate::systems::actorcommands::spawn_actor`]. Model-dependent components
//! ([`modelinstance::ModelInstance`], [`drawableset::DrawableSet`],
//! [`compositor::Compositor`]) exist only while the actor is ready.
//!
//! Submodules overview:
//! - [`actor`] – actor id and model id
//! - [`appearance`] – requested appearance and the bindings it resolves to
//! - [`compositor`] – offscreen surface bookkeeping and per-frame draw batches
//! - [`drawableset`] – cached drawables and their sorted draw order
//! - [`gaze`] – look direction driving the head-angle parameter
//! - [`lifecycle`] – load/ready/dispose state machine
//! - [`mapposition`] – world-space position (pivot) of the actor sprite
//! - [`modelinstance`] – the live deformation model and its placement slot
//! - [`rotation`] – rotation angle in degrees
//! - [`scale`] – 2D scale factor
//! - [`subscriptions`] – observers opened for the actor while ready
//! - [`talk`] – speech-driven mouth animation state
//! - [`tint`] – compositing color
//! - [`transition`] – cancellable interpolated property transitions
//! - [`visibility`] – visible flag and current opacity
//! - [`zindex`] – rendering order hint for 2D drawing

pub mod actor;
pub mod appearance;
pub mod compositor;
pub mod drawableset;
pub mod gaze;
pub mod lifecycle;
pub mod mapposition;
pub mod modelinstance;
pub mod rotation;
pub mod scale;
pub mod subscriptions;
pub mod talk;
pub mod tint;
pub mod transition;
pub mod visibility;
pub mod zindex;
