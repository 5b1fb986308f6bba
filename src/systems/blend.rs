//! Parameter blending.
//!
//! Every frame each ready actor's model parameters ease toward their
//! targets:
//! - the head-angle parameter follows the actor's [`Gaze`]
//! - while talking, the mouth parameter is overwritten with the talk curve
//! - every other parameter follows the active appearance binding, falling
//!   back to the model's declared default
//!
//! The step is exponential: `value += (target - value) * clamp01(dt * speed * rate)`.
//! Values already within [`BLEND_TOLERANCE`] of their target are left alone.

use bevy_ecs::prelude::*;

use crate::components::appearance::{Appearance, AppearanceBindings, AppearanceTarget};
use crate::components::gaze::Gaze;
use crate::components::modelinstance::ModelInstance;
use crate::components::talk::Talking;
use crate::model::ModelParameter;
use crate::resources::stageconfig::StageConfig;
use crate::resources::worldtime::WorldTime;

pub const BLEND_TOLERANCE: f32 = 1e-4;

/// Parameter names and rates shared by every actor.
#[derive(Clone, Copy, Debug)]
pub struct BlendSettings<'a> {
    pub head_angle_parameter: &'a str,
    pub mouth_parameter: &'a str,
    pub appearance_blend_rate: f32,
    pub gaze_blend_rate: f32,
}

impl<'a> BlendSettings<'a> {
    pub fn from_config(config: &'a StageConfig) -> Self {
        Self {
            head_angle_parameter: &config.head_angle_parameter,
            mouth_parameter: &config.mouth_parameter,
            appearance_blend_rate: config.appearance_blend_rate,
            gaze_blend_rate: config.gaze_blend_rate,
        }
    }
}

/// Per-actor inputs for one blend step.
pub struct BlendInputs<'a> {
    pub appearance: &'a Appearance,
    pub bindings: &'a AppearanceBindings,
    pub gaze: &'a Gaze,
    /// Direct mouth value while talking.
    pub mouth_override: Option<f32>,
}

/// Advance `params` by `dt` seconds. Returns how many values were written.
pub fn blend_model_parameters(
    params: &mut [ModelParameter],
    dt: f32,
    settings: &BlendSettings,
    inputs: &BlendInputs,
) -> usize {
    let binding = match &inputs.appearance.target {
        AppearanceTarget::Binding(name) => inputs.bindings.get(name),
        _ => None,
    };
    let mut writes = 0;

    for p in params.iter_mut() {
        if p.id == settings.mouth_parameter {
            if let Some(mouth) = inputs.mouth_override {
                let v = p.clamp(mouth);
                if (p.value - v).abs() > BLEND_TOLERANCE {
                    p.value = v;
                    writes += 1;
                }
                continue;
            }
        }

        let (target, rate) = if p.id == settings.head_angle_parameter {
            (inputs.gaze.angle, inputs.gaze.speed * settings.gaze_blend_rate)
        } else {
            let target = match inputs.appearance.target {
                AppearanceTarget::Hold => continue,
                AppearanceTarget::Defaults => p.default,
                AppearanceTarget::Binding(_) => binding
                    .and_then(|b| b.get(&p.id))
                    .unwrap_or(p.default),
            };
            (
                target,
                inputs.appearance.speed * settings.appearance_blend_rate,
            )
        };

        let target = p.clamp(target);
        if (p.value - target).abs() <= BLEND_TOLERANCE {
            continue;
        }
        let t = (dt * rate).clamp(0.0, 1.0);
        p.value += (target - p.value) * t;
        writes += 1;
    }
    writes
}

/// Blend every ready actor's parameters toward their targets.
pub fn blend_parameters(
    world_time: Res<WorldTime>,
    config: Res<StageConfig>,
    mut query: Query<(
        &mut ModelInstance,
        &Appearance,
        &AppearanceBindings,
        &Gaze,
        &Talking,
    )>,
) {
    let dt = world_time.delta.max(0.0);
    let settings = BlendSettings::from_config(&config);
    for (mut instance, appearance, bindings, gaze, talking) in query.iter_mut() {
        let inputs = BlendInputs {
            appearance,
            bindings,
            gaze,
            mouth_override: talking.mouth_value(config.talk_speed, config.talk_amplitude),
        };
        blend_model_parameters(
            instance.model_mut().parameters_mut(),
            dt,
            &settings,
            &inputs,
        );
    }
}

/// Advance the talk phase of every talking actor.
pub fn advance_talking(world_time: Res<WorldTime>, mut query: Query<&mut Talking>) {
    let dt = world_time.delta.max(0.0);
    for mut talking in query.iter_mut() {
        if talking.active {
            talking.elapsed += dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::gaze::LookDirection;
    use crate::model::AppearanceBinding;

    const HEAD: &str = "ParamAngleX";
    const MOUTH: &str = "ParamMouthOpenY";

    fn settings() -> BlendSettings<'static> {
        BlendSettings {
            head_angle_parameter: HEAD,
            mouth_parameter: MOUTH,
            appearance_blend_rate: 10.0,
            gaze_blend_rate: 10.0,
        }
    }

    fn params() -> Vec<ModelParameter> {
        vec![
            ModelParameter::new(HEAD, -30.0, 30.0, 0.0),
            ModelParameter::new(MOUTH, 0.0, 1.0, 0.0),
            ModelParameter::new("ParamBrow", -1.0, 1.0, 0.25),
        ]
    }

    fn bindings() -> AppearanceBindings {
        let mut b = AppearanceBindings::default();
        b.insert(
            AppearanceBinding::new("smile")
                .with(MOUTH, 0.8)
                .with(HEAD, 25.0),
        );
        b.insert(AppearanceBinding::new("shout").with(MOUTH, 4.0));
        b
    }

    fn run(
        params: &mut [ModelParameter],
        appearance: &Appearance,
        gaze: &Gaze,
        mouth: Option<f32>,
        steps: usize,
        dt: f32,
    ) {
        let b = bindings();
        let inputs = BlendInputs {
            appearance,
            bindings: &b,
            gaze,
            mouth_override: mouth,
        };
        for _ in 0..steps {
            blend_model_parameters(params, dt, &settings(), &inputs);
        }
    }

    #[test]
    fn smile_converges_within_its_duration() {
        let mut p = params();
        p[0].value = 12.0;
        let mut appearance = Appearance::default();
        appearance.request(Some("smile"), 1.0 / 0.5);
        let mut gaze = Gaze::default();
        gaze.angle = 12.0;

        run(&mut p, &appearance, &gaze, None, 30, 1.0 / 60.0);

        assert!((p[1].value - 0.8).abs() < 1e-3);
        // Head angle belongs to gaze even when the binding names it.
        assert_eq!(p[0].value, 12.0);
    }

    #[test]
    fn unbound_parameters_return_to_default() {
        let mut p = params();
        p[2].value = -1.0;
        let mut appearance = Appearance::default();
        appearance.request(Some("smile"), 10.0);
        run(&mut p, &appearance, &Gaze::default(), None, 60, 0.05);
        assert!((p[2].value - 0.25).abs() < 1e-3);
    }

    #[test]
    fn unknown_appearance_falls_back_to_defaults() {
        let mut p = params();
        p[1].value = 0.6;
        let mut appearance = Appearance::default();
        appearance.request(Some("nope"), 10.0);
        run(&mut p, &appearance, &Gaze::default(), None, 60, 0.05);
        assert!(p[1].value.abs() < 1e-3);
    }

    #[test]
    fn targets_are_clamped_to_parameter_range() {
        let mut p = params();
        let mut appearance = Appearance::default();
        appearance.request(Some("shout"), 10.0);
        run(&mut p, &appearance, &Gaze::default(), None, 60, 0.05);
        assert!(p[1].value <= 1.0);
        assert!((p[1].value - 1.0).abs() < 1e-3);
    }

    #[test]
    fn hold_keeps_current_values() {
        let mut p = params();
        p[1].value = 0.4;
        p[2].value = -0.5;
        let mut appearance = Appearance::default();
        appearance.request(None, 10.0);
        run(&mut p, &appearance, &Gaze::default(), None, 10, 0.1);
        assert_eq!(p[1].value, 0.4);
        assert_eq!(p[2].value, -0.5);
    }

    #[test]
    fn gaze_drives_head_angle() {
        let mut p = params();
        let mut gaze = Gaze::default();
        gaze.look(LookDirection::Left, 30.0, 1.0 / 0.2);
        run(&mut p, &Appearance::default(), &gaze, None, 60, 0.05);
        assert!((p[0].value + 30.0).abs() < 1e-3);
    }

    #[test]
    fn talking_writes_mouth_directly() {
        let mut p = params();
        let appearance = Appearance::default();
        run(&mut p, &appearance, &Gaze::default(), Some(0.7), 1, 0.001);
        assert_eq!(p[1].value, 0.7);
    }

    #[test]
    fn settled_parameters_are_not_rewritten() {
        let mut p = params();
        let appearance = Appearance::default();
        let b = bindings();
        let gaze = Gaze::default();
        let inputs = BlendInputs {
            appearance: &appearance,
            bindings: &b,
            gaze: &gaze,
            mouth_override: None,
        };
        assert_eq!(blend_model_parameters(&mut p, 0.1, &settings(), &inputs), 0);
        p[2].value = 0.0;
        assert_eq!(blend_model_parameters(&mut p, 0.1, &settings(), &inputs), 1);
    }

    #[test]
    fn zero_duration_snaps_in_one_step() {
        let mut p = params();
        let mut appearance = Appearance::default();
        appearance.request(Some("smile"), 1.0 / 0.0001);
        run(&mut p, &appearance, &Gaze::default(), None, 1, 1.0 / 60.0);
        assert_eq!(p[1].value, 0.8);
    }
}
