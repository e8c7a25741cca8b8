//! Control panels for editing spawners and masses live.
//!
//! The panels read and write the ECS world directly; scenes pick the
//! changes up on their next frame. Directions and forces are shown
//! negated, so dragging a slider up turns a stream the way it looks on
//! screen.

use bevy_ecs::prelude::*;
use std::f32::consts::TAU;

use crate::components::{select, selected, Position};
use crate::mass::{add_mass, mass_entities, Mass};
use crate::math::wrap_angle;
use crate::scenes::SceneKind;
use crate::spawner::{add_spawner, mirror_x, mirror_y, spawner_entities, Spawner};
use crate::time::Time;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelTab {
    #[default]
    Spawners,
    Warpers,
}

/// What the global panel asked for this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlobalRequest {
    pub reset: bool,
    pub switch_to: Option<SceneKind>,
}

/// Slider value for a stored direction.
pub fn displayed_direction(direction: f32) -> f32 {
    wrap_angle(-direction)
}

/// Stored direction for a slider value.
pub fn direction_from_display(shown: f32) -> f32 {
    wrap_angle(-shown)
}

/// Time, pause, reset, FPS and the scene picker.
pub fn global_panel(ui: &mut egui::Ui, time: &mut Time, current: SceneKind) -> GlobalRequest {
    let mut request = GlobalRequest::default();

    let mut picked = current;
    egui::ComboBox::from_label("Scene")
        .selected_text(current.label())
        .show_ui(ui, |ui| {
            for kind in SceneKind::ALL {
                ui.selectable_value(&mut picked, kind, kind.label());
            }
        });
    if picked != current {
        request.switch_to = Some(picked);
    }

    ui.horizontal(|ui| {
        let mut scale = time.time_scale();
        ui.label("Time scale:");
        if ui.add(egui::Slider::new(&mut scale, 0.0..=3.0)).changed() {
            time.set_time_scale(scale);
        }
    });

    ui.horizontal(|ui| {
        let label = if time.is_paused() { "Resume" } else { "Pause" };
        if ui.button(label).clicked() {
            time.toggle_pause();
        }
        if ui.button("Reset").clicked() {
            request.reset = true;
        }
        ui.label(format!("{:.0} FPS", time.fps()));
    });

    request
}

/// Tabbed spawner and warper editor.
pub fn plasma_panel(ui: &mut egui::Ui, world: &mut World, tab: &mut PanelTab) {
    ui.horizontal(|ui| {
        ui.selectable_value(tab, PanelTab::Spawners, "Spawners");
        ui.selectable_value(tab, PanelTab::Warpers, "Warpers");
    });
    ui.separator();

    match tab {
        PanelTab::Spawners => spawner_panel(ui, world),
        PanelTab::Warpers => warper_panel(ui, world),
    }
}

pub fn spawner_panel(ui: &mut egui::Ui, world: &mut World) {
    let spawners = spawner_entities(world);
    let current = selected(world);

    ui.horizontal_wrapped(|ui| {
        for (i, &entity) in spawners.iter().enumerate() {
            if ui
                .selectable_label(current == Some(entity), format!("#{}", i + 1))
                .clicked()
            {
                select(world, Some(entity));
            }
        }
        if ui.button("Add").clicked() {
            let e = add_spawner(world, glam::Vec2::ZERO, Spawner::default());
            select(world, Some(e));
        }
    });

    let Some(entity) = current.filter(|e| spawners.contains(e)) else {
        ui.label("Select a spawner to edit it.");
        return;
    };

    ui.separator();
    ui.horizontal(|ui| {
        if ui.button("Mirror X").clicked() {
            if let Some(e) = mirror_x(world, entity) {
                select(world, Some(e));
            }
        }
        if ui.button("Mirror Y").clicked() {
            if let Some(e) = mirror_y(world, entity) {
                select(world, Some(e));
            }
        }
        if ui.button("Delete").clicked() {
            world.despawn(entity);
        }
    });

    if let Some(mut pos) = world.get_mut::<Position>(entity) {
        slider(ui, "X", &mut pos.0.x, -1.0, 1.0);
        slider(ui, "Y", &mut pos.0.y, -1.0, 1.0);
    }

    if let Some(mut spawner) = world.get_mut::<Spawner>(entity) {
        let iv = &mut spawner.initial_vel;
        let mut shown = displayed_direction(iv.direction);
        if slider(ui, "Direction", &mut shown, 0.0, TAU) {
            iv.direction = direction_from_display(shown);
        }
        slider(ui, "Spread", &mut iv.spread, 0.0, TAU);
        slider(ui, "Min speed", &mut iv.min_speed, 0.0, 1.0);
        slider(ui, "Max speed", &mut iv.max_speed, 0.0, 1.0);
        if iv.min_speed > iv.max_speed {
            iv.max_speed = iv.min_speed;
        }
        slider(ui, "Size", &mut spawner.radius, 0.01, 0.5);
    }
}

pub fn warper_panel(ui: &mut egui::Ui, world: &mut World) {
    let masses = mass_entities(world);
    let current = selected(world);

    ui.horizontal_wrapped(|ui| {
        for (i, &entity) in masses.iter().enumerate() {
            if ui
                .selectable_label(current == Some(entity), format!("#{}", i + 1))
                .clicked()
            {
                select(world, Some(entity));
            }
        }
        if ui.button("Add").clicked() {
            let e = add_mass(world, glam::Vec2::ZERO, Mass::default());
            select(world, Some(e));
        }
    });

    let Some(entity) = current.filter(|e| masses.contains(e)) else {
        ui.label("Select a warper to edit it.");
        return;
    };

    ui.separator();
    if ui.button("Delete").clicked() {
        world.despawn(entity);
        return;
    }

    if let Some(mut pos) = world.get_mut::<Position>(entity) {
        slider(ui, "X", &mut pos.0.x, -1.0, 1.0);
        slider(ui, "Y", &mut pos.0.y, -1.0, 1.0);
    }

    if let Some(mut mass) = world.get_mut::<Mass>(entity) {
        let mut shown = -mass.0;
        if slider(ui, "Force", &mut shown, -1.0, 1.0) {
            mass.0 = -shown;
        }
    }
}

/// Labelled slider. Returns whether the value changed.
fn slider(ui: &mut egui::Ui, label: &str, value: &mut f32, min: f32, max: f32) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::Slider::new(value, min..=max)).changed()
    })
    .inner
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_direction_display_round_trip() {
        for d in [0.0, 0.5, PI, 4.0] {
            let back = direction_from_display(displayed_direction(d));
            assert!((back - d).abs() < 1e-5, "{d} -> {back}");
        }
    }

    #[test]
    fn test_direction_display_is_negated() {
        assert!((displayed_direction(PI / 2.0) - 3.0 * PI / 2.0).abs() < 1e-5);
    }
}
