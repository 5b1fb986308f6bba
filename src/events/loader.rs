use bevy_ecs::message::Message;

use crate::error::ActorError;
use crate::resources::modelresources::ModelResource;

/// Commands sent *to* the loader thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum LoaderCmd {
    Load { id: String },
    Unload { id: String },
    UnloadAll,
    Shutdown,
}

/// Messages sent *back* from the loader thread
#[derive(Message, Debug, Clone)]
pub enum LoaderMessage {
    Loaded { id: String, resource: ModelResource },
    LoadFailed { id: String, error: ActorError },
    Unloaded { id: String },
    UnloadedAll,
}
