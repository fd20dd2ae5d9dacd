//! Units authority boundary.
//!
//! Formats never interpret unit names themselves. They ask a
//! [`UnitsProvider`] to resolve each name to a [`UnitProps`] descriptor and,
//! when preparing a formatter, for the [`UnitConversion`] between two units.
//!
//! [`BasicUnitsProvider`] is an in-memory implementation backed by a registry
//! of scale factors against one canonical unit per phenomenon.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UnitsError;

pub mod registry;

pub use registry::{BasicUnitsProvider, UnitDefinition};

/// Descriptor of a resolved unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProps {
    /// Registry name, e.g. `"Foot"`.
    pub name: String,
    /// Default display label, e.g. `"ft"`.
    #[serde(default)]
    pub label: String,
    /// What the unit measures, e.g. `"Length"`.
    #[serde(default)]
    pub phenomenon: String,
    /// Unit system, e.g. `"Metric"` or `"Imperial"`.
    #[serde(default)]
    pub system: String,
    #[serde(default = "default_is_valid")]
    pub is_valid: bool,
}

fn default_is_valid() -> bool {
    true
}

impl UnitProps {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        phenomenon: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            phenomenon: phenomenon.into(),
            system: system.into(),
            is_valid: true,
        }
    }
}

/// Linear conversion `value * factor + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    pub factor: f64,
    pub offset: f64,
}

impl UnitConversion {
    /// Conversion that leaves values unchanged.
    pub const IDENTITY: UnitConversion = UnitConversion {
        factor: 1.0,
        offset: 0.0,
    };

    pub fn new(factor: f64, offset: f64) -> Self {
        Self { factor, offset }
    }

    /// Apply the conversion to a magnitude.
    #[inline]
    pub fn evaluate(&self, value: f64) -> f64 {
        value * self.factor + self.offset
    }

    /// Conversion in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            factor: 1.0 / self.factor,
            offset: -self.offset / self.factor,
        }
    }

    /// Conversion equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &UnitConversion) -> Self {
        Self {
            factor: self.factor * next.factor,
            offset: self.offset * next.factor + next.offset,
        }
    }
}

impl Default for UnitConversion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Capability that resolves unit names and conversions.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: several format constructions may
/// query the same provider at once, and a single construction issues all of
/// its composite-unit lookups concurrently.
#[async_trait]
pub trait UnitsProvider: Send + Sync {
    /// Resolve a unit by name.
    ///
    /// # Returns
    /// * `Ok(UnitProps)` - the unit descriptor
    /// * `Err(UnitsError::NotFound)` - if the name is unknown
    async fn find_unit_by_name(&self, name: &str) -> Result<UnitProps, UnitsError>;

    /// Conversion that turns a magnitude in `from` into a magnitude in `to`.
    ///
    /// # Returns
    /// * `Err(UnitsError::IncompatibleUnits)` - if the units measure different phenomena
    async fn get_conversion(
        &self,
        from: &UnitProps,
        to: &UnitProps,
    ) -> Result<UnitConversion, UnitsError>;
}
