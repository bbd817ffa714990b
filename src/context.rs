//! Process-wide settings context.
//!
//! A [`PropertyContext`] is built once at startup and handed to the
//! components that need settings. It layers a writable user layer over the
//! loaded defaults and lets overlays (profiles, sessions) be stacked on top.

use crate::error::{PropertyError, Result};
use crate::layer::PropertyLayer;
use crate::manager::{PropertyManager, PropertyManagerExt, SharedManager};
use crate::stack::PropertyStack;
use crate::views::{PropertyFilter, PropertyReadOnly};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Context configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Priority of the writable user layer.
    pub user_priority: u32,

    /// Priority of the defaults layer.
    pub defaults_priority: u32,

    /// Wrap the defaults read-only, so they can only be overridden through
    /// the user layer.
    pub read_only_defaults: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            user_priority: 0,
            defaults_priority: 10,
            read_only_defaults: false,
        }
    }
}

/// Settings shared across the application.
pub struct PropertyContext {
    config: ContextConfig,
    settings: Arc<PropertyStack>,
    user: Arc<PropertyLayer>,
    defaults: Arc<PropertyLayer>,
}

impl PropertyContext {
    /// Build the context from loaded defaults.
    pub fn new(config: ContextConfig, defaults: PropertyLayer) -> Result<Self> {
        if config.user_priority == config.defaults_priority {
            return Err(PropertyError::Structural(format!(
                "user and defaults layers share priority {}",
                config.user_priority
            )));
        }

        let settings = PropertyStack::new();
        let user = PropertyLayer::new().shared();
        let defaults = defaults.shared();

        let defaults_view: SharedManager = if config.read_only_defaults {
            Arc::new(PropertyReadOnly::new(defaults.clone()))
        } else {
            defaults.clone()
        };
        settings.add_layer(config.defaults_priority, defaults_view);
        settings.add_layer(config.user_priority, user.clone());

        debug!(
            defaults = defaults.len(),
            read_only_defaults = config.read_only_defaults,
            "property context created"
        );

        Ok(Self {
            config,
            settings,
            user,
            defaults,
        })
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The resolved settings.
    pub fn settings(&self) -> &Arc<PropertyStack> {
        &self.settings
    }

    /// The writable user layer.
    pub fn user_layer(&self) -> &Arc<PropertyLayer> {
        &self.user
    }

    pub fn defaults(&self) -> &Arc<PropertyLayer> {
        &self.defaults
    }

    /// Stack an overlay (e.g. a profile) at `priority`.
    pub fn push_overlay(&self, priority: u32, overlay: SharedManager) -> Result<()> {
        self.check_overlay_priority(priority)?;
        self.settings.add_layer(priority, overlay);
        Ok(())
    }

    /// Swap the overlay at `priority` for another one.
    pub fn swap_overlay(&self, priority: u32, overlay: SharedManager) -> Result<()> {
        self.check_overlay_priority(priority)?;
        self.settings.replace_layer(priority, overlay)
    }

    pub fn remove_overlay(&self, overlay: &SharedManager) -> Result<()> {
        self.settings.remove_layer(overlay)
    }

    /// A view of the settings limited to `names`, for a single consumer.
    pub fn section<I, S>(&self, names: I) -> PropertyFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.filter(names)
    }

    fn check_overlay_priority(&self, priority: u32) -> Result<()> {
        if priority == self.config.user_priority || priority == self.config.defaults_priority {
            return Err(PropertyError::Structural(format!(
                "priority {priority} is reserved by the context"
            )));
        }
        Ok(())
    }
}
