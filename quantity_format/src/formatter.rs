//! Conversion preparation for rendering.
//!
//! A [`FormatterSpec`] pairs a [`Format`] with the unit stored magnitudes are
//! expressed in, and resolves ahead of time every conversion a renderer needs
//! to walk the format's composite units. For a feet-and-inches format over
//! meters the chain is `Meter -> Foot`, then `Foot -> Inch`.

use futures::future::try_join_all;

use crate::error::FormatResult;
use crate::format::Format;
use crate::units::{UnitConversion, UnitProps, UnitsProvider};

/// Conversion into one display unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversionSpec {
    pub name: String,
    /// Label shown next to the converted part.
    pub label: String,
    /// From the persistence unit for the first entry, from the preceding
    /// display unit for every later entry.
    pub conversion: UnitConversion,
}

/// A format ready to be applied to magnitudes in a known persistence unit.
#[derive(Debug, Clone)]
pub struct FormatterSpec<C = serde_json::Value> {
    name: String,
    format: Format<C>,
    persistence_unit: UnitProps,
    conversions: Vec<UnitConversionSpec>,
}

impl<C: Clone> FormatterSpec<C> {
    /// Resolve the conversions for `format` over `persistence_unit`.
    ///
    /// # Returns
    /// * `Err(FormatError::Units)` if the provider cannot convert between
    ///   any two units of the chain
    pub async fn create<P>(
        name: &str,
        format: &Format<C>,
        provider: &P,
        persistence_unit: &UnitProps,
    ) -> FormatResult<Self>
    where
        P: UnitsProvider + ?Sized,
    {
        let conversions = if format.has_units() {
            let sources = std::iter::once(persistence_unit)
                .chain(format.units().iter().map(|u| &u.unit));
            let lookups = sources
                .zip(format.units())
                .map(|(from, to)| provider.get_conversion(from, &to.unit));
            let resolved = try_join_all(lookups).await?;

            format
                .units()
                .iter()
                .zip(resolved)
                .map(|(unit, conversion)| UnitConversionSpec {
                    name: unit.unit.name.clone(),
                    label: unit.display_label().to_string(),
                    conversion,
                })
                .collect()
        } else {
            vec![UnitConversionSpec {
                name: persistence_unit.name.clone(),
                label: persistence_unit.label.clone(),
                conversion: UnitConversion::IDENTITY,
            }]
        };

        log::debug!(
            "Formatter '{}' prepared {} conversion(s) from '{}'",
            name,
            conversions.len(),
            persistence_unit.name
        );

        Ok(Self {
            name: name.to_string(),
            format: format.clone(),
            persistence_unit: persistence_unit.clone(),
            conversions,
        })
    }
}

impl<C> FormatterSpec<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> &Format<C> {
        &self.format
    }

    pub fn persistence_unit(&self) -> &UnitProps {
        &self.persistence_unit
    }

    /// Conversions in display order.
    pub fn conversions(&self) -> &[UnitConversionSpec] {
        &self.conversions
    }

    /// Express a persisted magnitude in the first (largest) display unit.
    pub fn to_display_magnitude(&self, magnitude: f64) -> f64 {
        self.conversions
            .first()
            .map_or(magnitude, |spec| spec.conversion.evaluate(magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormatError, UnitsError};
    use crate::units::BasicUnitsProvider;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_composite_chain() {
        let provider = BasicUnitsProvider::with_default_units();
        let format: Format = Format::from_json(
            "FeetInches",
            &json!({
                "type": "fractional",
                "precision": 8,
                "composite": {"units": [{"name": "Foot", "label": "'"}, {"name": "Inch"}]}
            }),
            &provider,
        )
        .await
        .unwrap();
        let meter = provider.find_unit_by_name("Meter").await.unwrap();

        let spec = FormatterSpec::create("FeetInches", &format, &provider, &meter)
            .await
            .unwrap();

        let conversions = spec.conversions();
        assert_eq!(conversions.len(), 2);
        assert_eq!(conversions[0].name, "Foot");
        assert_eq!(conversions[0].label, "'");
        assert_eq!(conversions[1].name, "Inch");
        assert_eq!(conversions[1].label, "in");
        assert_relative_eq!(conversions[0].conversion.evaluate(0.3048), 1.0, epsilon = 1e-12);
        assert_relative_eq!(conversions[1].conversion.evaluate(1.0), 12.0, epsilon = 1e-12);
        assert_relative_eq!(spec.to_display_magnitude(3.048), 10.0, epsilon = 1e-12);
    }

    #[tokio::test]
    async fn test_no_composite_uses_persistence_unit() {
        let provider = BasicUnitsProvider::with_default_units();
        let format: Format = Format::from_json("Plain", &json!({"type": "decimal"}), &provider)
            .await
            .unwrap();
        let meter = provider.find_unit_by_name("Meter").await.unwrap();

        let spec = FormatterSpec::create("Plain", &format, &provider, &meter)
            .await
            .unwrap();
        assert_eq!(spec.conversions().len(), 1);
        assert_eq!(spec.conversions()[0].label, "m");
        assert_eq!(spec.to_display_magnitude(2.5), 2.5);
        assert_eq!(spec.persistence_unit().name, "Meter");
    }

    #[tokio::test]
    async fn test_incompatible_persistence_unit() {
        let provider = BasicUnitsProvider::with_default_units();
        let format: Format = Format::from_json(
            "Angle",
            &json!({"type": "decimal", "composite": {"units": [{"name": "Degree"}]}}),
            &provider,
        )
        .await
        .unwrap();
        let meter = provider.find_unit_by_name("Meter").await.unwrap();

        let err = FormatterSpec::create("Angle", &format, &provider, &meter)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::Units(UnitsError::IncompatibleUnits { .. })
        ));
    }
}
