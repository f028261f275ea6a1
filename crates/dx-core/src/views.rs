//! View accessors: how to open, observe and close each dashboard view.
//!
//! Accessors are polymorphic over the view set so the capture pipeline never
//! names a concrete view. The built-in accessor is driven entirely by a
//! [`ViewBinding`] from the configuration.

use crate::host::LiveApp;
use crate::readiness::ReadinessSpec;
use async_trait::async_trait;
use dx_common::{Error, Result, ViewId};
use dx_config::{ExportConfig, PostProcessRules, UiTiming, ViewBinding};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Open/observe/close capability for one view.
#[async_trait]
pub trait ViewAccessor: Send + Sync {
    fn view_id(&self) -> ViewId;

    /// Navigate until the view's container is mounted.
    async fn open(&self, app: &dyn LiveApp, timing: &UiTiming) -> Result<()>;

    /// Selector of the view's root container.
    fn container(&self) -> &str;

    fn readiness(&self) -> ReadinessSpec;

    fn post_process(&self) -> &PostProcessRules;

    /// Style concept styling this view.
    fn style_concept(&self) -> &str;

    /// Dismiss the view. Safe to call on a view that never opened.
    async fn close(&self, app: &dyn LiveApp, timing: &UiTiming) -> Result<()>;
}

/// Accessor backed by a configured binding.
#[derive(Debug, Clone)]
pub struct BoundView {
    binding: ViewBinding,
}

impl BoundView {
    pub fn new(binding: ViewBinding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> &ViewBinding {
        &self.binding
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[async_trait]
impl ViewAccessor for BoundView {
    fn view_id(&self) -> ViewId {
        self.binding.view
    }

    async fn open(&self, app: &dyn LiveApp, timing: &UiTiming) -> Result<()> {
        let b = &self.binding;
        let current = app.active_tab().await?;
        if current != b.tab {
            debug!(view = %b.view, from = %current, to = %b.tab, "Switching tab");
            app.set_active_tab(&b.tab).await?;
            settle(timing.tab_settle_ms).await;
        }

        app.click_label(&b.open_label, None).await?;
        settle(timing.open_settle_ms).await;

        if let Some(subview) = &b.subview {
            let via_command = match &subview.command {
                Some(command) => match app.run_command(command).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(view = %b.view, command = %command, error = %e, "Subview command failed, using pointer events");
                        false
                    }
                },
                None => false,
            };
            if !via_command {
                app.pointer_sequence(&subview.label, &b.container).await?;
            }
            settle(timing.open_settle_ms).await;
        }
        Ok(())
    }

    fn container(&self) -> &str {
        &self.binding.container
    }

    fn readiness(&self) -> ReadinessSpec {
        ReadinessSpec::from_binding(&self.binding.readiness)
    }

    fn post_process(&self) -> &PostProcessRules {
        &self.binding.post_process
    }

    fn style_concept(&self) -> &str {
        &self.binding.style_concept
    }

    async fn close(&self, app: &dyn LiveApp, timing: &UiTiming) -> Result<()> {
        app.click_label(&self.binding.dismiss_label, Some(&self.binding.container))
            .await?;
        settle(timing.close_settle_ms).await;
        Ok(())
    }
}

/// Accessors for every view, iterated in card order.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    accessors: BTreeMap<ViewId, Arc<dyn ViewAccessor>>,
}

impl ViewRegistry {
    /// One [`BoundView`] per configured binding.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let mut registry = Self::default();
        for binding in &config.views {
            if registry.accessors.contains_key(&binding.view) {
                return Err(Error::Config(format!(
                    "view '{}' is bound more than once",
                    binding.view
                )));
            }
            registry.register(Arc::new(BoundView::new(binding.clone())));
        }
        Ok(registry)
    }

    /// Add or replace the accessor for its view.
    pub fn register(&mut self, accessor: Arc<dyn ViewAccessor>) {
        self.accessors.insert(accessor.view_id(), accessor);
    }

    pub fn get(&self, view: ViewId) -> Option<&Arc<dyn ViewAccessor>> {
        self.accessors.get(&view)
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Registered accessors in [`ViewId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ViewAccessor>> {
        ViewId::ALL.iter().filter_map(|view| self.accessors.get(view))
    }
}
