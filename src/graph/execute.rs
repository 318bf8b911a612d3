//! Replays a compiled timeline against a device.

use anyhow::Result;

use crate::Error;
use crate::graph::compile::Timeline;
use crate::graph::framegraph::Framegraph;
use crate::graph::physical_resource::Device;
use crate::graph::resource::ResourceId;

impl<D: Device> Framegraph<D> {
    /// Execute the compiled timeline. For every step, the resources whose lifetime starts there are realized
    /// through the device, the task executor is called with `context`, and the resources whose lifetime ends
    /// there are derealized again.
    /// # Errors
    /// - Fails with [`Error::NotCompiled`] if the graph changed since the last call to [`Framegraph::compile()`].
    /// - Fails with the first error returned by the device or a task executor. All transient resources that are
    ///   still realized at that point are derealized before the error is returned.
    pub fn execute(&mut self, device: &mut D, context: &mut D::Context) -> Result<()> {
        let Some(timeline) = self.timeline.take() else {
            return Err(Error::NotCompiled.into());
        };
        let result = self.run(&timeline, device, context);
        self.timeline = Some(timeline);
        if result.is_err() {
            self.release_transients(device);
        }
        result
    }

    fn run(&mut self, timeline: &Timeline, device: &mut D, context: &mut D::Context) -> Result<()> {
        for step in timeline.steps() {
            for &id in &step.realized_resources {
                self.realize(device, id)?;
            }

            let check_access = self.settings.check_access;
            let Some(task) = self.tasks.get_mut(step.task.index()) else {
                continue;
            };
            #[cfg(feature = "debug-markers")]
            device.begin_task(context, task.base().name());
            trace!("Executing task `{}`", task.base().name());
            let result = task.execute(&self.resources, check_access, context);
            #[cfg(feature = "debug-markers")]
            device.end_task(context, task.base().name());
            result?;

            for &id in &step.derealized_resources {
                self.derealize(device, id)?;
            }
        }
        Ok(())
    }

    fn realize(&mut self, device: &mut D, id: ResourceId) -> Result<()> {
        let Some(node) = self.resources.get_mut(id) else {
            return Ok(());
        };
        if node.actual.is_some() {
            return Ok(());
        }
        let description = node
            .description
            .as_deref()
            .ok_or_else(|| Error::UnboundResource(node.name.clone()))?;
        let realizer = self
            .realizers
            .get(id.key())
            .ok_or_else(|| Error::UnboundResource(node.name.clone()))?;
        trace!("Realizing {} `{}`", node.kind, node.name);
        let actual = realizer.realize(device, &node.name, description)?;
        node.actual = Some(actual);
        Ok(())
    }

    fn derealize(&mut self, device: &mut D, id: ResourceId) -> Result<()> {
        let Some(node) = self.resources.get_mut(id) else {
            return Ok(());
        };
        let Some(actual) = node.actual.take() else {
            return Ok(());
        };
        let realizer = self
            .realizers
            .get(id.key())
            .ok_or_else(|| Error::UnboundResource(node.name.clone()))?;
        trace!("Derealizing {} `{}`", node.kind, node.name);
        realizer.derealize(device, &node.name, actual)
    }

    /// Hand every retained resource the graph realized itself back to the device. Retained resources whose actual
    /// was supplied at registration belong to the host and are left alone.
    /// # Errors
    /// - Fails with the first error returned by the device. The remaining resources are still released.
    pub fn release_retained(&mut self, device: &mut D) -> Result<()> {
        let realized: Vec<ResourceId> = self
            .resources
            .iter()
            .filter(|(_, node)| node.is_retained() && !node.is_external() && node.is_realized())
            .map(|(id, _)| id)
            .collect();
        let mut result = Ok(());
        for id in realized {
            if let Err(error) = self.derealize(device, id) {
                warn!("Failed to release retained resource {:?}: {}", id, error);
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    /// Like [`Framegraph::clear()`], but first releases the retained resources realized by the graph through
    /// `device` instead of dropping them.
    /// # Errors
    /// - Fails with the first error returned by the device. The graph is cleared either way.
    pub fn clear_with(&mut self, device: &mut D) -> Result<()> {
        let result = self.release_retained(device);
        self.clear();
        result
    }

    /// Derealize every transient resource that still holds an actual resource.
    fn release_transients(&mut self, device: &mut D) {
        let realized: Vec<ResourceId> = self
            .resources
            .iter()
            .filter(|(_, node)| node.is_transient() && node.is_realized())
            .map(|(id, _)| id)
            .collect();
        for id in realized {
            if let Err(error) = self.derealize(device, id) {
                warn!("Failed to derealize resource {:?} after a failed execution: {}", id, error);
            }
        }
    }
}
