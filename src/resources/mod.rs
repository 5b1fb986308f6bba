//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution. Each submodule documents the
//! semantics and intended usage of its resource(s).
//!
//! Overview
//! - `actorregistry` – actor id lookup and placement slot allocation
//! - `loader` – bridge and channels for the background loader thread
//! - `modelprovider` – the provider instantiating deformation models
//! - `modelresources` – loaded model bytes and the holders keeping them resident
//! - `rendertarget` – render textures mirroring actor surfaces (NonSend)
//! - `stageconfig` – INI-backed stage configuration
//! - `texturestore` – part textures keyed by material texture name (NonSend)
//! - `worldtime` – simulation time and delta
pub mod actorregistry;
pub mod loader;
pub mod modelprovider;
pub mod modelresources;
pub mod rendertarget;
pub mod stageconfig;
pub mod texturestore;
pub mod worldtime;
