//! The frame driver: a scene registry and the fixed-timestep loop.
//!
//! The host owns the window, the GL context, and the animation-frame
//! callback; each callback invokes [`Engine::run_frame`], which catches
//! the simulation up to real time in fixed steps and then initializes and
//! renders every scene. Surface management (resize, clear, blending) stays
//! with the host.

use log::debug;

use crate::api::GraphicsApi;
use crate::clock::Clock;
use crate::error::Error;
use crate::scene::Scene;

/// Drives a set of named [`Scene`]s with a fixed-timestep simulation.
pub struct Engine<G: GraphicsApi> {
    gl: G,
    scenes: Vec<(String, Scene<G>)>,
    clock: Clock,
    accumulator_ms: f32,
}

impl<G: GraphicsApi> Engine<G> {
    /// An engine over the given device, with a started clock.
    #[must_use]
    pub fn new(gl: G) -> Self {
        let mut clock = Clock::new();
        clock.start();
        Self {
            gl,
            scenes: Vec::new(),
            clock,
            accumulator_ms: 0.0,
        }
    }

    /// An engine with a custom simulation step in milliseconds.
    #[must_use]
    pub fn with_step(gl: G, step_ms: f32) -> Self {
        let mut clock = Clock::with_step(step_ms);
        clock.start();
        Self {
            gl,
            scenes: Vec::new(),
            clock,
            accumulator_ms: 0.0,
        }
    }

    /// Create (or replace) the scene registered under `name` and return
    /// it.
    pub fn new_scene(&mut self, name: &str) -> &mut Scene<G> {
        debug!("creating scene `{name}`");
        if let Some(index) = self.scenes.iter().position(|(n, _)| n == name) {
            self.scenes[index].1 = Scene::new(self.gl.clone());
            return &mut self.scenes[index].1;
        }
        self.scenes.push((name.to_owned(), Scene::new(self.gl.clone())));
        // Just pushed, so the list is non-empty.
        let last = self.scenes.len() - 1;
        &mut self.scenes[last].1
    }

    /// The scene registered under `name`, if any.
    #[must_use]
    pub fn scene(&self, name: &str) -> Option<&Scene<G>> {
        self.scenes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, scene)| scene)
    }

    /// The scene registered under `name`, mutable, if any.
    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene<G>> {
        self.scenes
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, scene)| scene)
    }

    /// The engine's clock.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Run one frame: consume real elapsed time in fixed simulation
    /// steps, then initialize and render every scene in registration
    /// order.
    ///
    /// # Errors
    ///
    /// Propagates the first simulation, initialization, or render failure.
    pub fn run_frame(&mut self) -> Result<(), Error> {
        let delta = self.clock.delta_time();
        self.step_simulation(delta)?;

        for (_, scene) in &mut self.scenes {
            scene.initialize()?;
            scene.render()?;
        }
        Ok(())
    }

    /// Feed `delta_ms` of real time into the fixed-step accumulator and
    /// run as many whole simulation steps as it covers, for every scene.
    /// Returns the number of steps executed.
    ///
    /// # Errors
    ///
    /// Propagates the first scene update failure; the consumed time is
    /// not replayed.
    pub fn step_simulation(&mut self, delta_ms: f32) -> Result<usize, Error> {
        let step = self.clock.physics_time_step();
        self.accumulator_ms += delta_ms;

        let mut steps = 0;
        while self.accumulator_ms >= step {
            self.accumulator_ms -= step;
            steps += 1;
            for (_, scene) in &mut self.scenes {
                scene.update_simulation_step(step)?;
            }
        }
        Ok(steps)
    }

    /// Initialize and render only the named scenes, in the order given.
    /// Unknown names are skipped.
    ///
    /// # Errors
    ///
    /// Propagates the first initialization or render failure.
    pub fn render_scenes(&mut self, names: &[&str]) -> Result<(), Error> {
        for name in names {
            if let Some(scene) = self.scene_mut(name) {
                scene.initialize()?;
                scene.render()?;
            }
        }
        Ok(())
    }
}
