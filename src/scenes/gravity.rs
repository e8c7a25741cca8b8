//! Mass table shared by the plasma scenes: world masses first, then the
//! pointer.

use bevy_ecs::prelude::*;

use crate::gpu::MassLayer;
use crate::input::MouseButton;
use crate::mass::{collect_masses, MassTable, MouseForce, MASS_CAPACITY};

use super::UpdateContext;

pub(crate) struct Gravity {
    table: MassTable,
    mouse: MouseForce,
    visible: usize,
}

impl Gravity {
    pub(crate) fn new(mouse_strength: f32) -> Self {
        Self {
            table: MassTable::new(),
            mouse: MouseForce::new(mouse_strength),
            visible: 0,
        }
    }

    /// Follow the pointer and repack the table from `world`.
    pub(crate) fn update(&mut self, world: &mut World, ctx: &UpdateContext) {
        let held =
            ctx.input.mouse_held(MouseButton::Left) || ctx.input.mouse_held(MouseButton::Right);
        self.mouse.sync(ctx.pointer_active(), held);
        self.mouse.set_position(ctx.pointer());

        let masses = collect_masses(world);
        self.visible = masses
            .iter()
            .filter(|m| m.mass != 0.0)
            .count()
            .min(MASS_CAPACITY);
        self.table.pack(masses.into_iter().chain(self.mouse.as_mass()));
    }

    pub(crate) fn upload(&self, queue: &wgpu::Queue, layer: &mut MassLayer) {
        layer.upload(queue, &self.table, self.visible);
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &MassTable {
        &self.table
    }

    /// World masses in the table; the pointer entry, if any, follows them.
    #[cfg(test)]
    pub(crate) fn visible(&self) -> usize {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::mass::{add_mass, Mass};
    use crate::time::Time;
    use glam::Vec2;

    #[test]
    fn test_pointer_outside_adds_nothing() {
        let mut world = World::new();
        add_mass(&mut world, Vec2::ZERO, Mass(0.5));
        add_mass(&mut world, Vec2::X, Mass(0.0));

        let time = Time::new();
        let input = Input::new();
        let ctx = UpdateContext {
            time: &time,
            input: &input,
            view_scale: Vec2::ONE,
            pointer_captured: false,
        };

        let mut gravity = Gravity::new(1.0);
        gravity.update(&mut world, &ctx);
        assert_eq!(gravity.visible(), 1);
        assert_eq!(gravity.table().len(), 1);
    }
}
