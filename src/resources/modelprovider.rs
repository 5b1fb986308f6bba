use bevy_ecs::prelude::Resource;

use crate::model::ModelProvider;

/// The model provider used to instantiate every actor's model.
#[derive(Resource)]
pub struct ModelProviderRes(pub Box<dyn ModelProvider>);

impl ModelProviderRes {
    pub fn new(provider: impl ModelProvider + 'static) -> Self {
        Self(Box::new(provider))
    }
}
