//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend. The
//! render tick hands a store snapshot to whatever implements `RenderSink`.

use arena_shared::entity::Entity;
use tracing::info;

/// The drawing collaborator's interface.
///
/// `local_id` is the designated local entity, which may be absent from
/// `entities` if the server stopped reporting it.
pub trait RenderSink: Send {
    fn draw(&mut self, entities: &[Entity], local_id: Option<&str>);
}

/// A no-op sink useful for headless tests.
#[derive(Default)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn draw(&mut self, _entities: &[Entity], _local_id: Option<&str>) {}
}

/// Logs a world summary every 60 frames; the demo binary's stand-in for a
/// canvas.
#[derive(Default)]
pub struct LogRender {
    frames: u64,
}

impl RenderSink for LogRender {
    fn draw(&mut self, entities: &[Entity], local_id: Option<&str>) {
        self.frames += 1;
        if self.frames % 60 != 0 {
            return;
        }
        let local = local_id.and_then(|id| entities.iter().find(|e| e.id == id));
        match local {
            Some(e) => info!(
                frame = self.frames,
                entities = entities.len(),
                position = ?e.position,
                "world"
            ),
            None => info!(
                frame = self.frames,
                entities = entities.len(),
                "world (no local entity)"
            ),
        }
    }
}
