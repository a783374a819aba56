use std::collections::HashSet;
use std::time::Duration;

use crate::error::{IconError, Result};
use crate::zip::ArchiveLimits;

/// Sizes generated when the caller does not choose, largest first.
pub const DEFAULT_SIZES: [u32; 4] = [128, 48, 32, 16];

/// What a run does when one size fails to rasterize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterizePolicy {
    /// Discard everything generated so far and fail the run.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining sizes.
    Skip,
}

/// Settings for an [`IconPipeline`](super::IconPipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Edge lengths to generate, in processing and export order.
    pub sizes: Vec<u32>,
    pub policy: RasterizePolicy,
    /// Pause after each size, e.g. to let a UI repaint.
    pub step_delay: Option<Duration>,
    /// Yield to the runtime between sizes.
    pub yield_between_steps: bool,
    pub archive_limits: ArchiveLimits,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_SIZES.to_vec(),
            policy: RasterizePolicy::default(),
            step_delay: None,
            yield_between_steps: true,
            archive_limits: ArchiveLimits::default(),
        }
    }
}

impl PipelineConfig {
    /// Default settings with a custom size list.
    ///
    /// # Errors
    ///
    /// Returns [`IconError::InvalidConfig`] if the list is empty, contains
    /// zero or repeats a size.
    pub fn with_sizes(sizes: Vec<u32>) -> Result<Self> {
        let config = Self {
            sizes,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn policy(mut self, policy: RasterizePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = Some(delay);
        self
    }

    pub fn archive_limits(mut self, limits: ArchiveLimits) -> Self {
        self.archive_limits = limits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sizes.is_empty() {
            return Err(IconError::InvalidConfig("no icon sizes configured".to_string()));
        }
        if self.sizes.contains(&0) {
            return Err(IconError::InvalidConfig("icon sizes must be positive".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.sizes.iter().find(|s| !seen.insert(**s)) {
            return Err(IconError::InvalidConfig(format!("duplicate icon size {dup}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.sizes, vec![128, 48, 32, 16]);
        assert_eq!(config.policy, RasterizePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_size_lists() {
        for sizes in [vec![], vec![16, 0], vec![32, 16, 32]] {
            assert!(matches!(
                PipelineConfig::with_sizes(sizes),
                Err(IconError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn builder_methods() {
        let config = PipelineConfig::with_sizes(vec![64])
            .unwrap()
            .policy(RasterizePolicy::Skip)
            .step_delay(Duration::from_millis(100));
        assert_eq!(config.policy, RasterizePolicy::Skip);
        assert_eq!(config.step_delay, Some(Duration::from_millis(100)));
    }
}
