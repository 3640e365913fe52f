//! Construction parameters.

use crate::error::MapError;
use crate::hashing::DEFAULT_LOAD_FACTOR;
use crate::order::OrderMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters accepted by [`ChainMap::with_config`](crate::ChainMap::with_config)
/// and the other configured constructors.
///
/// ```
/// use chain_map::{MapConfig, OrderMode};
///
/// let config = MapConfig::default()
///     .with_initial_capacity(100)
///     .with_order(OrderMode::Insertion);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapConfig {
    /// Requested bucket count, rounded up to a power of two on first
    /// allocation. `None` uses 16.
    pub initial_capacity: Option<usize>,
    /// Ratio of entries to buckets that triggers growth. Must be finite
    /// and positive.
    pub load_factor: f32,
    pub order: OrderMode,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
            order: OrderMode::Unordered,
        }
    }
}

impl MapConfig {
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_order(mut self, order: OrderMode) -> Self {
        self.order = order;
        self
    }

    /// Reject load factors that are zero, negative, NaN or infinite.
    pub fn validate(&self) -> Result<(), MapError> {
        let lf = self.load_factor;
        if !lf.is_finite() || lf <= 0.0 {
            return Err(MapError::invalid(format!(
                "load factor must be finite and positive, got {lf}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_base_variant() {
        let c = MapConfig::default();
        assert_eq!(c.initial_capacity, None);
        assert_eq!(c.load_factor, 0.75);
        assert_eq!(c.order, OrderMode::Unordered);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn bad_load_factors_are_rejected() {
        for lf in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = MapConfig::default().with_load_factor(lf).validate().unwrap_err();
            assert!(matches!(err, MapError::InvalidConfiguration { .. }), "{lf}");
        }
        assert!(MapConfig::default().with_load_factor(4.0).validate().is_ok());
    }
}
