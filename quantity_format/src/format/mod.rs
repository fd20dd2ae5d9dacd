//! Validated display-format specifications.
//!
//! A [`Format`] describes how a quantity is rendered: its numeric layout,
//! precision, separators, trait bits and, optionally, the composite units a
//! value is split into (feet and inches, degrees/minutes/seconds, ...).
//!
//! Formats are built from JSON through [`Format::from_json`] and written back
//! with [`Format::to_json`]. Construction is all-or-nothing: either every rule
//! holds and an immutable `Format` is returned, or a single
//! [`FormatError::InvalidJson`] names the offending attribute.
//!
//! # Example
//!
//! ```
//! use quantity_format::codec::FormatTraits;
//! use quantity_format::format::Format;
//! use quantity_format::units::BasicUnitsProvider;
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let provider = BasicUnitsProvider::with_default_units();
//! let json = json!({
//!     "type": "fractional",
//!     "precision": 8,
//!     "formatTraits": ["keepSingleZero", "showUnitLabel"],
//!     "composite": {
//!         "units": [{"name": "Foot", "label": "'"}, {"name": "Inch", "label": "\""}]
//!     }
//! });
//!
//! let format: Format = Format::from_json("FeetInches", &json, &provider).await.unwrap();
//! assert_eq!(format.precision(), 8);
//! assert!(format.has_format_trait_set(FormatTraits::SHOW_UNIT_LABEL));
//! assert_eq!(format.units().len(), 2);
//! # });
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

mod builder;
pub mod composite;
pub mod props;

pub use composite::{CompositeUnit, MAX_COMPOSITE_UNITS};
pub use props::{CompositeProps, CompositeUnitProps, FormatProps};

use crate::codec::{
    self, FormatTraits, FormatType, ScientificType, ShowSignOption, DEFAULT_PRECISION,
};
use crate::config::LocaleSeparators;
use crate::error::{FormatError, FormatResult};
use crate::units::UnitsProvider;
use builder::FormatBuilder;

/// An immutable, validated format specification.
///
/// `C` is the type of the opaque `custom` payload carried by custom-extended
/// formats; it defaults to raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Format<C = Value> {
    pub(crate) name: String,
    pub(crate) format_type: FormatType,
    /// `None` when the definition left it out.
    pub(crate) precision: Option<u32>,
    pub(crate) min_width: Option<u32>,
    pub(crate) scientific_type: Option<ScientificType>,
    pub(crate) station_offset_size: Option<u32>,
    pub(crate) round_factor: f64,
    pub(crate) show_sign_option: ShowSignOption,
    pub(crate) decimal_separator: char,
    pub(crate) thousand_separator: char,
    pub(crate) station_separator: char,
    pub(crate) uom_separator: Option<char>,
    pub(crate) spacer: Option<char>,
    pub(crate) format_traits: FormatTraits,
    pub(crate) include_zero: bool,
    pub(crate) units: Vec<CompositeUnit>,
    pub(crate) custom_props: Option<C>,
}

impl<C> Format<C>
where
    C: Serialize + DeserializeOwned,
{
    /// Build a format from its JSON definition using the default locale.
    ///
    /// Composite unit names are resolved through `provider`, all at once.
    ///
    /// # Returns
    /// * `Ok(Format)` if every attribute is valid
    /// * `Err(FormatError::InvalidJson)` naming the first violated rule
    pub async fn from_json<P>(name: &str, json: &Value, provider: &P) -> FormatResult<Self>
    where
        P: UnitsProvider + ?Sized,
    {
        Self::from_json_with_locale(name, json, provider, &LocaleSeparators::default()).await
    }

    /// Build a format, taking separator defaults from `locale`.
    pub async fn from_json_with_locale<P>(
        name: &str,
        json: &Value,
        provider: &P,
        locale: &LocaleSeparators,
    ) -> FormatResult<Self>
    where
        P: UnitsProvider + ?Sized,
    {
        let format = FormatBuilder::<C>::load(name, json, provider, locale)
            .await?
            .build()?;
        log::debug!(
            "Built format '{}' (type={}, units={})",
            format.name,
            format.format_type,
            format.units.len()
        );
        Ok(format)
    }

    /// Build a format from typed props.
    pub async fn from_props<P>(
        name: &str,
        props: &FormatProps<C>,
        provider: &P,
    ) -> FormatResult<Self>
    where
        P: UnitsProvider + ?Sized,
    {
        let json = serde_json::to_value(props).map_err(|e| {
            FormatError::invalid_json(name, format!("props could not be serialized: {}", e))
        })?;
        Self::from_json(name, &json, provider).await
    }
}

impl<C> Format<C>
where
    C: Serialize + Clone,
{
    /// Serialize back to the JSON shape accepted by [`Format::from_json`].
    ///
    /// Only fails if the custom payload's own serializer fails.
    pub fn to_json(&self) -> FormatResult<Value> {
        serde_json::to_value(self.to_props()).map_err(|e| {
            FormatError::invalid_json(
                &self.name,
                format!("custom payload could not be serialized: {}", e),
            )
        })
    }

    /// Typed form of [`Format::to_json`].
    pub fn to_props(&self) -> FormatProps<C> {
        let traits = codec::format_traits_to_array(self.format_traits);
        let composite = (!self.units.is_empty()).then(|| CompositeProps {
            spacer: Some(self.spacer.map(String::from).unwrap_or_default()),
            include_zero: Some(self.include_zero),
            units: self
                .units
                .iter()
                .map(|u| CompositeUnitProps {
                    name: u.unit.name.clone(),
                    label: u.label.clone(),
                })
                .collect(),
        });

        FormatProps {
            format_type: codec::format_type_to_string(self.format_type).to_string(),
            precision: self.precision,
            round_factor: Some(self.round_factor),
            min_width: self.min_width,
            scientific_type: self
                .scientific_type
                .map(|t| codec::scientific_type_to_string(t).to_string()),
            show_sign_option: Some(
                codec::show_sign_option_to_string(self.show_sign_option).to_string(),
            ),
            format_traits: (!traits.is_empty())
                .then(|| traits.into_iter().map(str::to_string).collect()),
            decimal_separator: Some(self.decimal_separator.to_string()),
            thousand_separator: Some(self.thousand_separator.to_string()),
            uom_separator: Some(self.uom_separator.map(String::from).unwrap_or_default()),
            station_separator: Some(self.station_separator.to_string()),
            station_offset_size: self.station_offset_size,
            composite,
            custom: self.custom_props.clone(),
        }
    }
}

impl<C> Format<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format_type(&self) -> FormatType {
        self.format_type
    }

    /// Decimal places, or the fraction denominator for fractional formats.
    pub fn precision(&self) -> u32 {
        self.precision.unwrap_or(DEFAULT_PRECISION)
    }

    pub fn min_width(&self) -> Option<u32> {
        self.min_width
    }

    /// Set only for scientific formats.
    pub fn scientific_type(&self) -> Option<ScientificType> {
        self.scientific_type
    }

    /// Set only for station formats.
    pub fn station_offset_size(&self) -> Option<u32> {
        self.station_offset_size
    }

    pub fn round_factor(&self) -> f64 {
        self.round_factor
    }

    pub fn show_sign_option(&self) -> ShowSignOption {
        self.show_sign_option
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn thousand_separator(&self) -> char {
        self.thousand_separator
    }

    pub fn station_separator(&self) -> char {
        self.station_separator
    }

    /// Separator between magnitude and unit label; `None` means no separator.
    pub fn uom_separator(&self) -> Option<char> {
        self.uom_separator
    }

    /// Separator between composite parts; `None` means no separator.
    pub fn spacer(&self) -> Option<char> {
        self.spacer
    }

    pub fn format_traits(&self) -> FormatTraits {
        self.format_traits
    }

    pub fn include_zero(&self) -> bool {
        self.include_zero
    }

    /// Resolved composite units in declaration order.
    pub fn units(&self) -> &[CompositeUnit] {
        &self.units
    }

    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }

    pub fn custom_props(&self) -> Option<&C> {
        self.custom_props.as_ref()
    }

    /// `true` when the definition carried a `custom` payload.
    pub fn is_custom(&self) -> bool {
        self.custom_props.is_some()
    }

    /// Check that every bit of `traits` is set.
    ///
    /// Multi-bit masks require all of their bits, not just one.
    pub fn has_format_trait_set(&self, traits: FormatTraits) -> bool {
        self.format_traits & traits == traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::BasicUnitsProvider;
    use serde_json::json;

    async fn build(json: Value) -> FormatResult<Format> {
        let provider = BasicUnitsProvider::with_default_units();
        Format::from_json("TestFormat", &json, &provider).await
    }

    #[tokio::test]
    async fn test_defaults() {
        let format = build(json!({"type": "decimal"})).await.unwrap();
        assert_eq!(format.name(), "TestFormat");
        assert_eq!(format.format_type(), FormatType::Decimal);
        assert_eq!(format.precision(), 6);
        assert_eq!(format.min_width(), None);
        assert_eq!(format.round_factor(), 0.0);
        assert_eq!(format.show_sign_option(), ShowSignOption::OnlyNegative);
        assert_eq!(format.decimal_separator(), '.');
        assert_eq!(format.thousand_separator(), ',');
        assert_eq!(format.station_separator(), '+');
        assert_eq!(format.uom_separator(), Some(' '));
        assert_eq!(format.spacer(), Some(' '));
        assert!(format.format_traits().is_empty());
        assert!(format.include_zero());
        assert!(!format.has_units());
        assert!(!format.is_custom());
    }

    #[tokio::test]
    async fn test_missing_or_bad_type() {
        assert!(build(json!({"precision": 2})).await.unwrap_err().is_invalid_json());
        assert!(build(json!({"type": 3})).await.is_err());
        assert!(build(json!({"type": "bogus"})).await.is_err());
        assert!(build(json!("decimal")).await.is_err());
    }

    #[tokio::test]
    async fn test_irrelevant_type_fields_ignored() {
        let format = build(json!({
            "type": "decimal",
            "scientificType": "bogus",
            "stationOffsetSize": -4
        }))
        .await
        .unwrap();
        assert_eq!(format.scientific_type(), None);
        assert_eq!(format.station_offset_size(), None);
    }

    #[tokio::test]
    async fn test_omitted_precision_not_serialized() {
        let format = build(json!({"type": "fractional"})).await.unwrap();
        assert_eq!(format.precision(), 6);

        let json = format.to_json().unwrap();
        assert!(json.get("precision").is_none());

        let provider = BasicUnitsProvider::with_default_units();
        let rebuilt: Format = Format::from_json("TestFormat", &json, &provider)
            .await
            .unwrap();
        assert_eq!(rebuilt, format);
    }

    #[tokio::test]
    async fn test_precision_validated_against_type() {
        assert_eq!(
            build(json!({"type": "fractional", "precision": 16})).await.unwrap().precision(),
            16
        );
        assert!(build(json!({"type": "fractional", "precision": 3})).await.is_err());
        assert!(build(json!({"type": "decimal", "precision": 16})).await.is_err());
        assert!(build(json!({"type": "decimal", "precision": 2.5})).await.is_err());
    }

    #[tokio::test]
    async fn test_scalar_type_errors() {
        assert!(build(json!({"type": "decimal", "roundFactor": "0.5"})).await.is_err());
        assert!(build(json!({"type": "decimal", "minWidth": -1})).await.is_err());
        assert!(build(json!({"type": "decimal", "showSignOption": "sometimes"})).await.is_err());
        assert!(build(json!({"type": "decimal", "thousandSeparator": 1})).await.is_err());
        assert!(build(json!({"type": "decimal", "uomSeparator": "--"})).await.is_err());
        assert!(build(json!({"type": "decimal", "formatTraits": 7})).await.is_err());
        assert!(
            build(json!({"type": "decimal", "formatTraits": ["trailZeroes", 1]}))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_empty_uom_separator() {
        let format = build(json!({"type": "decimal", "uomSeparator": ""})).await.unwrap();
        assert_eq!(format.uom_separator(), None);
        assert_eq!(format.to_json().unwrap()["uomSeparator"], json!(""));
    }

    #[tokio::test]
    async fn test_locale_defaults_apply() {
        let provider = BasicUnitsProvider::new();
        let locale = LocaleSeparators {
            decimal: ',',
            thousand: '.',
            station: '+',
        };
        let format: Format = Format::from_json_with_locale(
            "Euro",
            &json!({"type": "decimal", "thousandSeparator": " "}),
            &provider,
            &locale,
        )
        .await
        .unwrap();
        assert_eq!(format.decimal_separator(), ',');
        assert_eq!(format.thousand_separator(), ' ');
    }

    #[tokio::test]
    async fn test_unknown_trait_names_token() {
        let err = build(json!({"type": "decimal", "formatTraits": "trailZeroes|sparkle"}))
            .await
            .unwrap_err();
        assert_eq!(err.format_name(), Some("TestFormat"));
        assert!(err.to_string().contains("sparkle"));
    }

    #[tokio::test]
    async fn test_multi_bit_query_requires_all_bits() {
        let format = build(json!({"type": "decimal", "formatTraits": ["applyRounding"]}))
            .await
            .unwrap();
        assert!(format.has_format_trait_set(FormatTraits::APPLY_ROUNDING));
        assert!(!format.has_format_trait_set(
            FormatTraits::APPLY_ROUNDING | FormatTraits::ZERO_EMPTY
        ));
        assert!(format.has_format_trait_set(FormatTraits::empty()));
    }

    #[tokio::test]
    async fn test_custom_payload_typed() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Bearing {
            direction: String,
        }

        let provider = BasicUnitsProvider::new();
        let json = json!({"type": "decimal", "custom": {"direction": "north"}});
        let format: Format<Bearing> = Format::from_json("Bearing", &json, &provider)
            .await
            .unwrap();
        assert!(format.is_custom());
        assert_eq!(format.custom_props().unwrap().direction, "north");
        assert_eq!(format.to_json().unwrap()["custom"], json!({"direction": "north"}));

        let bad = json!({"type": "decimal", "custom": {"heading": 1}});
        let result: FormatResult<Format<Bearing>> =
            Format::from_json("Bearing", &bad, &provider).await;
        assert!(result.unwrap_err().is_invalid_json());
    }

    #[tokio::test]
    async fn test_composite_must_be_object_with_unit_array() {
        assert!(build(json!({"type": "decimal", "composite": []})).await.is_err());
        assert!(build(json!({"type": "decimal", "composite": {}})).await.is_err());
        assert!(build(json!({"type": "decimal", "composite": {"units": "Foot"}})).await.is_err());
        assert!(build(json!({
            "type": "decimal",
            "composite": {"units": [{"label": "ft"}]}
        }))
        .await
        .is_err());
        assert!(build(json!({
            "type": "decimal",
            "composite": {"includeZero": "yes", "units": [{"name": "Foot"}]}
        }))
        .await
        .is_err());
    }

    #[tokio::test]
    async fn test_to_json_shape() {
        let format = build(json!({
            "type": "station",
            "stationOffsetSize": 2,
            "precision": 2,
            "formatTraits": "trailZeroes",
            "composite": {"spacer": "", "includeZero": false, "units": [{"name": "Foot"}]}
        }))
        .await
        .unwrap();

        assert_eq!(
            format.to_json().unwrap(),
            json!({
                "type": "station",
                "precision": 2,
                "roundFactor": 0.0,
                "showSignOption": "onlyNegative",
                "formatTraits": ["trailZeroes"],
                "decimalSeparator": ".",
                "thousandSeparator": ",",
                "uomSeparator": " ",
                "stationSeparator": "+",
                "stationOffsetSize": 2,
                "composite": {"spacer": "", "includeZero": false, "units": [{"name": "Foot"}]}
            })
        );
    }
}
