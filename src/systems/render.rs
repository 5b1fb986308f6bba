//! raylib presentation of the composited actors.
//!
//! Runs after compositing. Three passes:
//! 1. mirror every live [`RenderSurface`](crate::components::compositor::RenderSurface)
//!    into a render texture (see [`SurfaceStore`])
//! 2. replay each actor's [`FrameBatch`](crate::components::compositor::FrameBatch)
//!    into its texture, cleared to transparent
//! 3. draw the scene: `Sprite` outputs are blended in at the actor's position,
//!    rotated, scaled and tinted by `tint * opacity`, lowest [`ZIndex`] first.
//!    Positions are in reference-resolution pixels and scaled to the window
//!    (see [`StageConfig::scene_scale`]). `Texture` outputs are only
//!    published by name.
//!
//! The only per-draw material override applied here is `opacity`; any other
//! override name is reported once and ignored.

use bevy_ecs::prelude::*;
use log::warn;
use raylib::prelude::*;
use rustc_hash::FxHashSet;

use crate::components::compositor::{CompositeOutput, Compositor};
use crate::components::mapposition::MapPosition;
use crate::components::rotation::Rotation;
use crate::components::scale::Scale;
use crate::components::tint::Tint;
use crate::components::visibility::ActorVisibility;
use crate::components::zindex::ZIndex;
use crate::model::MaterialRef;
use crate::resources::rendertarget::SurfaceStore;
use crate::resources::stageconfig::StageConfig;
use crate::resources::texturestore::TextureStore;

pub const BACKGROUND: Color = Color::new(40, 40, 48, 255);

/// Material overrides the replay pass understands.
pub const SUPPORTED_OVERRIDES: &[&str] = &["opacity"];

/// Override names on `material` the replay pass ignores.
pub fn unsupported_overrides(material: &MaterialRef) -> impl Iterator<Item = &str> {
    material
        .overrides
        .iter()
        .map(|o| o.name.as_str())
        .filter(|name| !SUPPORTED_OVERRIDES.contains(name))
}

#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn render_system(
    mut rl: NonSendMut<RaylibHandle>,
    th: NonSend<RaylibThread>,
    config: Res<StageConfig>,
    mut ignored: Local<FxHashSet<String>>,
    mut surfaces: NonSendMut<SurfaceStore>,
    mut textures: NonSendMut<TextureStore>,
    compositors: Query<(Entity, &Compositor)>,
    sprites: Query<(
        Entity,
        &Compositor,
        &MapPosition,
        &Rotation,
        &Scale,
        &ZIndex,
        &Tint,
        &ActorVisibility,
    )>,
) {
    surfaces.retain(|e| {
        compositors
            .get(e)
            .is_ok_and(|(_, c)| c.surface().live)
    });

    for (entity, compositor) in compositors.iter() {
        if let Err(err) = surfaces.sync(&mut rl, &th, entity, compositor.surface()) {
            warn!("{}", err);
            continue;
        }
        if let CompositeOutput::Texture { name } = compositor.output() {
            surfaces.publish(name, entity);
        }
        if let Some(batch) = compositor.batch() {
            for draw in &batch.draws {
                textures.ensure(&mut rl, &th, &draw.material.texture);
                for name in unsupported_overrides(&draw.material) {
                    if ignored.insert(name.to_string()) {
                        warn!("material override '{}' is not supported; ignored", name);
                    }
                }
            }
        }
    }

    for (entity, compositor) in compositors.iter() {
        let Some(batch) = compositor.batch() else {
            continue;
        };
        let Some(target) = surfaces.get_mut(entity) else {
            continue;
        };
        let mut d = rl.begin_texture_mode(&th, &mut target.texture);
        d.clear_background(batch.clear);
        for draw in &batch.draws {
            let Some(tex) = textures.get(&draw.material.texture) else {
                continue;
            };
            let src = Rectangle {
                x: 0.0,
                y: 0.0,
                width: tex.width as f32,
                height: tex.height as f32,
            };
            let dest = Rectangle {
                x: draw.position.x,
                y: draw.position.y,
                width: draw.size.x,
                height: draw.size.y,
            };
            let opacity = draw.material.get_override("opacity").unwrap_or(1.0);
            let tint = Color::new(255, 255, 255, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
            d.draw_texture_pro(tex, src, dest, draw.origin, draw.rotation, tint);
        }
    }

    let mut to_draw: Vec<_> = sprites
        .iter()
        .filter(|(_, c, .., vis)| {
            *c.output() == CompositeOutput::Sprite && c.batch().is_some() && !vis.is_transparent()
        })
        .collect();
    to_draw.sort_by_key(|(_, _, _, _, _, z, _, _)| **z);

    let view = config.scene_scale(rl.get_screen_width(), rl.get_screen_height());
    let mut d = rl.begin_drawing(&th);
    d.clear_background(BACKGROUND);
    for (entity, _, pos, rot, scale, _, tint, vis) in to_draw {
        let Some(target) = surfaces.get(entity) else {
            continue;
        };
        let dest = Rectangle {
            x: pos.pos.x * view,
            y: pos.pos.y * view,
            width: target.width as f32 * scale.scale.x * view,
            height: target.height as f32 * scale.scale.y * view,
        };
        let origin = Vector2 {
            x: dest.width * 0.5,
            y: dest.height * 0.5,
        };
        d.draw_texture_pro(
            target.texture.texture(),
            target.source_rect(),
            dest,
            origin,
            rot.degrees,
            tint.with_opacity(vis.opacity),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_opacity_is_a_supported_override() {
        let material = MaterialRef::new("hero/body")
            .with_override("opacity", 0.5)
            .with_override("multiply", 0.25)
            .with_override("screen", 1.0);
        let ignored: Vec<&str> = unsupported_overrides(&material).collect();
        assert_eq!(ignored, vec!["multiply", "screen"]);
        assert_eq!(
            unsupported_overrides(&MaterialRef::new("x").with_override("opacity", 1.0)).count(),
            0
        );
    }
}
