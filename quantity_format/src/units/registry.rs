//! In-memory unit registry.
//!
//! Every unit is stored with its scaling against the canonical unit of its
//! phenomenon (Meter for Length, Radian for Angle, Second for Time, Kelvin for
//! Temperature):
//!
//! ```text
//! v_canonical = v_src * src.scale_to_canonical + src.offset
//! v_dst = (v_canonical - dst.offset) / dst.scale_to_canonical
//! ```
//!
//! Lookups are case-insensitive. Definitions can be registered in code or
//! loaded from TOML:
//!
//! ```toml
//! [[unit]]
//! name = "Chain"
//! label = "ch"
//! phenomenon = "Length"
//! system = "Imperial"
//! scale_to_canonical = 20.1168
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{UnitConversion, UnitProps, UnitsProvider};
use crate::error::UnitsError;

/// Registry entry for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub phenomenon: String,
    #[serde(default)]
    pub system: String,
    /// Multiplier to the canonical unit of the phenomenon.
    #[serde(default = "default_scale")]
    pub scale_to_canonical: f64,
    /// Added after scaling, for units with a shifted origin.
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_is_valid")]
    pub is_valid: bool,
}

fn default_scale() -> f64 {
    1.0
}

fn default_is_valid() -> bool {
    true
}

impl UnitDefinition {
    pub fn new(
        name: &str,
        label: &str,
        phenomenon: &str,
        system: &str,
        scale_to_canonical: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            phenomenon: phenomenon.to_string(),
            system: system.to_string(),
            scale_to_canonical,
            offset: 0.0,
            is_valid: true,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    fn props(&self) -> UnitProps {
        UnitProps {
            name: self.name.clone(),
            label: self.label.clone(),
            phenomenon: self.phenomenon.clone(),
            system: self.system.clone(),
            is_valid: self.is_valid,
        }
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "unit")]
    units: Vec<UnitDefinition>,
}

/// In-memory units provider.
///
/// Cloning is cheap and clones share the same registry.
///
/// # Example
/// ```
/// use quantity_format::units::{BasicUnitsProvider, UnitDefinition};
///
/// let provider = BasicUnitsProvider::with_default_units();
/// provider.register(UnitDefinition::new("Chain", "ch", "Length", "Imperial", 20.1168));
/// assert!(provider.contains("chain"));
/// ```
#[derive(Clone, Default)]
pub struct BasicUnitsProvider {
    units: Arc<RwLock<HashMap<String, UnitDefinition>>>,
}

impl BasicUnitsProvider {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with common length, angle, time and
    /// temperature units.
    pub fn with_default_units() -> Self {
        let provider = Self::new();
        for def in default_units() {
            provider.register(def);
        }
        provider
    }

    /// Load unit definitions from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, UnitsError> {
        let file: RegistryFile = toml::from_str(content).map_err(|e| {
            UnitsError::Configuration(format!("Failed to parse unit registry: {}", e))
        })?;

        let provider = Self::new();
        for def in file.units {
            if def.scale_to_canonical == 0.0 || !def.scale_to_canonical.is_finite() {
                return Err(UnitsError::Configuration(format!(
                    "Unit '{}' has an unusable scale_to_canonical {}",
                    def.name, def.scale_to_canonical
                )));
            }
            provider.register(def);
        }
        Ok(provider)
    }

    /// Load unit definitions from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, UnitsError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            UnitsError::Configuration(format!(
                "Failed to read unit registry {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Add or replace a unit definition.
    pub fn register(&self, def: UnitDefinition) {
        let key = def.name.to_lowercase();
        if self.units.write().insert(key.clone(), def).is_some() {
            log::debug!("Replaced existing definition of unit '{}'", key);
        }
    }

    /// Check if a unit is registered under `name` (any case).
    pub fn contains(&self, name: &str) -> bool {
        self.units.read().contains_key(&name.to_lowercase())
    }

    /// Get the number of registered units.
    pub fn unit_count(&self) -> usize {
        self.units.read().len()
    }

    fn definition(&self, name: &str) -> Result<UnitDefinition, UnitsError> {
        self.units
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| UnitsError::NotFound(name.to_string()))
    }
}

#[async_trait]
impl UnitsProvider for BasicUnitsProvider {
    async fn find_unit_by_name(&self, name: &str) -> Result<UnitProps, UnitsError> {
        self.definition(name).map(|def| def.props())
    }

    async fn get_conversion(
        &self,
        from: &UnitProps,
        to: &UnitProps,
    ) -> Result<UnitConversion, UnitsError> {
        let src = self.definition(&from.name)?;
        let dst = self.definition(&to.name)?;

        if !src.is_valid {
            return Err(UnitsError::InvalidUnit(src.name));
        }
        if !dst.is_valid {
            return Err(UnitsError::InvalidUnit(dst.name));
        }
        if src.phenomenon != dst.phenomenon {
            return Err(UnitsError::IncompatibleUnits {
                from: src.name,
                to: dst.name,
            });
        }

        if src.name.eq_ignore_ascii_case(&dst.name) {
            return Ok(UnitConversion::IDENTITY);
        }

        let factor = src.scale_to_canonical / dst.scale_to_canonical;
        let offset = (src.offset - dst.offset) / dst.scale_to_canonical;
        Ok(UnitConversion::new(factor, offset))
    }
}

fn default_units() -> Vec<UnitDefinition> {
    vec![
        // Length
        UnitDefinition::new("Meter", "m", "Length", "Metric", 1.0),
        UnitDefinition::new("Millimeter", "mm", "Length", "Metric", 1.0e-3),
        UnitDefinition::new("Centimeter", "cm", "Length", "Metric", 1.0e-2),
        UnitDefinition::new("Kilometer", "km", "Length", "Metric", 1.0e3),
        UnitDefinition::new("Inch", "in", "Length", "Imperial", 0.0254),
        UnitDefinition::new("Foot", "ft", "Length", "Imperial", 0.3048),
        UnitDefinition::new("Yard", "yd", "Length", "Imperial", 0.9144),
        UnitDefinition::new("Mile", "mi", "Length", "Imperial", 1609.344),
        UnitDefinition::new(
            "USSurveyFoot",
            "ft (US Survey)",
            "Length",
            "USCustomary",
            1200.0 / 3937.0,
        ),
        // Angle
        UnitDefinition::new("Radian", "rad", "Angle", "Metric", 1.0),
        UnitDefinition::new("Degree", "°", "Angle", "Metric", PI / 180.0),
        UnitDefinition::new("ArcMinute", "'", "Angle", "Metric", PI / 10_800.0),
        UnitDefinition::new("ArcSecond", "\"", "Angle", "Metric", PI / 648_000.0),
        // Time
        UnitDefinition::new("Second", "s", "Time", "Metric", 1.0),
        UnitDefinition::new("Minute", "min", "Time", "Metric", 60.0),
        UnitDefinition::new("Hour", "h", "Time", "Metric", 3600.0),
        UnitDefinition::new("Day", "d", "Time", "Metric", 86_400.0),
        // Temperature
        UnitDefinition::new("Kelvin", "K", "Temperature", "Metric", 1.0),
        UnitDefinition::new("Celsius", "°C", "Temperature", "Metric", 1.0).with_offset(273.15),
        UnitDefinition::new("Fahrenheit", "°F", "Temperature", "Imperial", 5.0 / 9.0)
            .with_offset(459.67 * 5.0 / 9.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    async fn conversion(provider: &BasicUnitsProvider, from: &str, to: &str) -> UnitConversion {
        let from = provider.find_unit_by_name(from).await.unwrap();
        let to = provider.find_unit_by_name(to).await.unwrap();
        provider.get_conversion(&from, &to).await.unwrap()
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let provider = BasicUnitsProvider::with_default_units();
        let unit = provider.find_unit_by_name("FOOT").await.unwrap();
        assert_eq!(unit.name, "Foot");
        assert_eq!(unit.label, "ft");
        assert_eq!(unit.phenomenon, "Length");
    }

    #[tokio::test]
    async fn test_unknown_unit_not_found() {
        let provider = BasicUnitsProvider::with_default_units();
        let result = provider.find_unit_by_name("Furlong").await;
        assert_eq!(result, Err(UnitsError::NotFound("Furlong".to_string())));
    }

    #[tokio::test]
    async fn test_convert_feet_to_inches() {
        let provider = BasicUnitsProvider::with_default_units();
        let conv = conversion(&provider, "Foot", "Inch").await;
        assert_relative_eq!(conv.evaluate(1.0), 12.0, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_convert_degrees_to_arc_minutes() {
        let provider = BasicUnitsProvider::with_default_units();
        let conv = conversion(&provider, "Degree", "ArcMinute").await;
        assert_relative_eq!(conv.evaluate(1.5), 90.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_convert_with_offsets() {
        let provider = BasicUnitsProvider::with_default_units();
        let c_to_f = conversion(&provider, "Celsius", "Fahrenheit").await;
        assert_relative_eq!(c_to_f.evaluate(100.0), 212.0, epsilon = 1e-9);
        assert_relative_eq!(c_to_f.evaluate(-40.0), -40.0, epsilon = 1e-9);

        let k_to_c = conversion(&provider, "Kelvin", "Celsius").await;
        assert_relative_eq!(k_to_c.evaluate(0.0), -273.15, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_same_unit_is_identity() {
        let provider = BasicUnitsProvider::with_default_units();
        assert_eq!(conversion(&provider, "Meter", "meter").await, UnitConversion::IDENTITY);
    }

    #[tokio::test]
    async fn test_incompatible_phenomena() {
        let provider = BasicUnitsProvider::with_default_units();
        let meter = provider.find_unit_by_name("Meter").await.unwrap();
        let second = provider.find_unit_by_name("Second").await.unwrap();
        let result = provider.get_conversion(&meter, &second).await;
        assert!(matches!(result, Err(UnitsError::IncompatibleUnits { .. })));
    }

    #[tokio::test]
    async fn test_from_toml_str() {
        let toml = r#"
[[unit]]
name = "Meter"
label = "m"
phenomenon = "Length"

[[unit]]
name = "Chain"
label = "ch"
phenomenon = "Length"
system = "Imperial"
scale_to_canonical = 20.1168

[[unit]]
name = "Rod"
phenomenon = "Length"
scale_to_canonical = 5.0292
is_valid = false
"#;

        let provider = BasicUnitsProvider::from_toml_str(toml).unwrap();
        assert_eq!(provider.unit_count(), 3);
        assert_relative_eq!(
            conversion(&provider, "Chain", "Meter").await.evaluate(1.0),
            20.1168,
            epsilon = 1e-12
        );
        assert!(!provider.find_unit_by_name("rod").await.unwrap().is_valid);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let toml = r#"
[[unit]]
name = "Nothing"
phenomenon = "Length"
scale_to_canonical = 0.0
"#;
        assert!(matches!(
            BasicUnitsProvider::from_toml_str(toml),
            Err(UnitsError::Configuration(_))
        ));
    }

    #[test]
    fn test_register_replaces_case_insensitively() {
        let provider = BasicUnitsProvider::new();
        provider.register(UnitDefinition::new("Meter", "m", "Length", "Metric", 1.0));
        provider.register(UnitDefinition::new("METER", "M", "Length", "Metric", 1.0));
        assert_eq!(provider.unit_count(), 1);
        assert!(provider.contains("meter"));
    }
}
