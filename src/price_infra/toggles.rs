use dashmap::DashMap;
use crate::price_infra::SourceConfig;
use crate::types::SourceId;

/// Runtime on/off switch per source, shared with the collector.
///
/// A disabled source is skipped on the next cycle; unknown sources are
/// treated as disabled.
#[derive(Default)]
pub struct SourceToggles {
    enabled: DashMap<SourceId, bool>,
}

impl SourceToggles {
    pub fn from_configs(configs: &[SourceConfig]) -> Self {
        let toggles = SourceToggles::default();
        for config in configs {
            toggles.enabled.insert(config.source_id, config.enabled);
        }
        toggles
    }

    pub fn is_enabled(&self, source_id: SourceId) -> bool {
        self.enabled.get(&source_id).is_some_and(|e| *e)
    }

    pub fn set_enabled(&self, source_id: SourceId, enabled: bool) {
        let previous = self.enabled.insert(source_id, enabled);
        if previous != Some(enabled) {
            tracing::info!(
                "Source {} {}",
                source_id,
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn enabled_sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<_> = self
            .enabled
            .iter()
            .filter(|e| *e.value())
            .map(|e| *e.key())
            .collect();
        sources.sort();
        sources
    }
}
