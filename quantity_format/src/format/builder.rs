//! Field-by-field loading of a format from raw JSON.
//!
//! [`FormatBuilder`] is the only mutable form of a format. Each loader
//! validates one attribute and the builder is turned into an immutable
//! [`Format`] once every rule has passed.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::composite::{resolve_units, CompositeUnit, UnitRequest};
use super::Format;
use crate::codec::{self, FormatTraits, FormatType, ScientificType, ShowSignOption};
use crate::config::LocaleSeparators;
use crate::error::{FormatError, FormatResult};
use crate::units::UnitsProvider;

pub(crate) struct FormatBuilder<'a, C> {
    name: &'a str,
    format_type: FormatType,
    precision: Option<u32>,
    min_width: Option<u32>,
    scientific_type: Option<ScientificType>,
    station_offset_size: Option<u32>,
    round_factor: f64,
    show_sign_option: ShowSignOption,
    decimal_separator: char,
    thousand_separator: char,
    station_separator: char,
    uom_separator: Option<char>,
    spacer: Option<char>,
    format_traits: FormatTraits,
    include_zero: bool,
    units: Vec<CompositeUnit>,
    composite_declared: bool,
    custom_props: Option<C>,
}

impl<'a, C: DeserializeOwned> FormatBuilder<'a, C> {
    fn new(name: &'a str, format_type: FormatType, locale: &LocaleSeparators) -> Self {
        Self {
            name,
            format_type,
            precision: None,
            min_width: None,
            scientific_type: None,
            station_offset_size: None,
            round_factor: 0.0,
            show_sign_option: ShowSignOption::default(),
            decimal_separator: locale.decimal,
            thousand_separator: locale.thousand,
            station_separator: locale.station,
            uom_separator: Some(' '),
            spacer: Some(' '),
            format_traits: FormatTraits::empty(),
            include_zero: true,
            units: Vec::new(),
            composite_declared: false,
            custom_props: None,
        }
    }

    /// Run every loader in order and resolve composite units.
    pub(crate) async fn load<P>(
        name: &'a str,
        json: &Value,
        provider: &P,
        locale: &LocaleSeparators,
    ) -> FormatResult<Self>
    where
        P: UnitsProvider + ?Sized,
    {
        let obj = json.as_object().ok_or_else(|| {
            FormatError::invalid_json(name, "format definition must be a JSON object")
        })?;

        let custom_props = load_custom::<C>(name, obj)?;

        let type_token = match field(obj, "type") {
            None => {
                return Err(FormatError::invalid_json(
                    name,
                    "missing required 'type' attribute",
                ))
            }
            Some(value) => expect_str(name, "type", value)?,
        };
        let format_type = codec::parse_format_type(type_token, name)?;

        let mut builder = Self::new(name, format_type, locale);
        builder.custom_props = custom_props;

        builder.load_precision(obj)?;
        builder.load_type_requirements(obj)?;
        builder.load_scalars(obj)?;
        builder.load_format_traits(obj)?;
        if let Some(composite) = field(obj, "composite") {
            builder.load_composite(composite, provider).await?;
        }

        Ok(builder)
    }

    pub(crate) fn build(self) -> FormatResult<Format<C>> {
        if self.composite_declared && self.units.is_empty() {
            return Err(FormatError::invalid_json(
                self.name,
                "'composite' did not yield any units",
            ));
        }

        Ok(Format {
            name: self.name.to_string(),
            format_type: self.format_type,
            precision: self.precision,
            min_width: self.min_width,
            scientific_type: self.scientific_type,
            station_offset_size: self.station_offset_size,
            round_factor: self.round_factor,
            show_sign_option: self.show_sign_option,
            decimal_separator: self.decimal_separator,
            thousand_separator: self.thousand_separator,
            station_separator: self.station_separator,
            uom_separator: self.uom_separator,
            spacer: self.spacer,
            format_traits: self.format_traits,
            include_zero: self.include_zero,
            units: self.units,
            custom_props: self.custom_props,
        })
    }

    fn load_precision(&mut self, obj: &Map<String, Value>) -> FormatResult<()> {
        if let Some(value) = field(obj, "precision") {
            let raw = expect_integer(self.name, "precision", value)?;
            self.precision = Some(codec::parse_precision(raw, self.format_type, self.name)?);
        }
        Ok(())
    }

    fn load_type_requirements(&mut self, obj: &Map<String, Value>) -> FormatResult<()> {
        match self.format_type {
            FormatType::Scientific => {
                let value = field(obj, "scientificType").ok_or_else(|| {
                    FormatError::invalid_json(
                        self.name,
                        "'scientificType' is required for scientific formats",
                    )
                })?;
                let token = expect_str(self.name, "scientificType", value)?;
                self.scientific_type = Some(codec::parse_scientific_type(token, self.name)?);
            }
            FormatType::Station => {
                let value = field(obj, "stationOffsetSize").ok_or_else(|| {
                    FormatError::invalid_json(
                        self.name,
                        "'stationOffsetSize' is required for station formats",
                    )
                })?;
                let size = expect_integer(self.name, "stationOffsetSize", value)?;
                if size <= 0 || size > i64::from(u32::MAX) {
                    return Err(FormatError::invalid_json(
                        self.name,
                        format!("'stationOffsetSize' must be a positive integer, got {}", size),
                    ));
                }
                self.station_offset_size = Some(size as u32);
            }
            FormatType::Decimal | FormatType::Fractional => {}
        }
        Ok(())
    }

    fn load_scalars(&mut self, obj: &Map<String, Value>) -> FormatResult<()> {
        let name = self.name;

        if let Some(value) = field(obj, "roundFactor") {
            self.round_factor = value
                .as_f64()
                .filter(|f| f.is_finite())
                .ok_or_else(|| invalid_attribute(name, "roundFactor", "a number", value))?;
        }

        if let Some(value) = field(obj, "minWidth") {
            let width = expect_integer(name, "minWidth", value)?;
            let width = u32::try_from(width).map_err(|_| {
                FormatError::invalid_json(
                    name,
                    format!("'minWidth' must be a non-negative integer, got {}", width),
                )
            })?;
            self.min_width = Some(width);
        }

        if let Some(value) = field(obj, "showSignOption") {
            let token = expect_str(name, "showSignOption", value)?;
            self.show_sign_option = codec::parse_show_sign_option(token, name)?;
        }

        if let Some(value) = field(obj, "decimalSeparator") {
            self.decimal_separator = expect_one_char(name, "decimalSeparator", value)?;
        }
        if let Some(value) = field(obj, "thousandSeparator") {
            self.thousand_separator = expect_one_char(name, "thousandSeparator", value)?;
        }
        if let Some(value) = field(obj, "stationSeparator") {
            self.station_separator = expect_one_char(name, "stationSeparator", value)?;
        }
        if let Some(value) = field(obj, "uomSeparator") {
            self.uom_separator = expect_at_most_one_char(name, "uomSeparator", value)?;
        }

        Ok(())
    }

    fn load_format_traits(&mut self, obj: &Map<String, Value>) -> FormatResult<()> {
        let Some(value) = field(obj, "formatTraits") else {
            return Ok(());
        };

        let tokens: Vec<&str> = match value {
            Value::String(s) => s
                .split([',', ';', '|'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::trim).ok_or_else(|| {
                        invalid_attribute(self.name, "formatTraits", "a list of strings", value)
                    })
                })
                .collect::<FormatResult<_>>()?,
            _ => {
                return Err(invalid_attribute(
                    self.name,
                    "formatTraits",
                    "a string or a list of strings",
                    value,
                ))
            }
        };

        for token in tokens {
            let bit = codec::parse_format_trait(token, self.name).ok_or_else(|| {
                FormatError::invalid_json(
                    self.name,
                    format!("'formatTraits' contains unknown trait '{}'", token),
                )
            })?;
            self.format_traits |= bit;
        }
        Ok(())
    }

    async fn load_composite<P>(&mut self, composite: &Value, provider: &P) -> FormatResult<()>
    where
        P: UnitsProvider + ?Sized,
    {
        let name = self.name;
        let obj = composite
            .as_object()
            .ok_or_else(|| invalid_attribute(name, "composite", "an object", composite))?;
        self.composite_declared = true;

        if let Some(value) = field(obj, "includeZero") {
            self.include_zero = value.as_bool().ok_or_else(|| {
                invalid_attribute(name, "composite.includeZero", "a boolean", value)
            })?;
        }
        if let Some(value) = field(obj, "spacer") {
            self.spacer = expect_at_most_one_char(name, "composite.spacer", value)?;
        }

        let units = field(obj, "units")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                FormatError::invalid_json(name, "'composite.units' must be an array")
            })?;

        let requests = units
            .iter()
            .map(|entry| unit_request(name, entry))
            .collect::<FormatResult<Vec<_>>>()?;

        self.units = resolve_units(name, requests, provider).await?;
        Ok(())
    }
}

fn unit_request(format_name: &str, entry: &Value) -> FormatResult<UnitRequest> {
    let obj = entry.as_object().ok_or_else(|| {
        invalid_attribute(format_name, "composite.units", "a list of objects", entry)
    })?;

    let name = match field(obj, "name") {
        Some(value) => expect_str(format_name, "composite.units.name", value)?,
        None => {
            return Err(FormatError::invalid_json(
                format_name,
                "every composite unit requires a 'name'",
            ))
        }
    };
    let label = match field(obj, "label") {
        Some(value) => Some(expect_str(format_name, "composite.units.label", value)?.to_string()),
        None => None,
    };

    Ok(UnitRequest {
        name: name.to_string(),
        label,
    })
}

fn load_custom<C: DeserializeOwned>(
    format_name: &str,
    obj: &Map<String, Value>,
) -> FormatResult<Option<C>> {
    field(obj, "custom")
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| {
                FormatError::invalid_json(format_name, format!("'custom' is malformed: {}", e))
            })
        })
        .transpose()
}

// =============================================================================
// JSON helpers
// =============================================================================

/// Look up a key, treating an explicit `null` like an absent key.
fn field<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn invalid_attribute(format_name: &str, key: &str, expected: &str, found: &Value) -> FormatError {
    FormatError::invalid_json(
        format_name,
        format!("'{}' must be {}, got {}", key, expected, found),
    )
}

fn expect_str<'v>(format_name: &str, key: &str, value: &'v Value) -> FormatResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| invalid_attribute(format_name, key, "a string", value))
}

/// Integral JSON numbers, including floats with no fractional part.
fn expect_integer(format_name: &str, key: &str, value: &Value) -> FormatResult<i64> {
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
        .ok_or_else(|| invalid_attribute(format_name, key, "an integer", value))
}

fn expect_one_char(format_name: &str, key: &str, value: &Value) -> FormatResult<char> {
    let s = expect_str(format_name, key, value)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FormatError::invalid_json(
            format_name,
            format!("'{}' must be exactly one character, got '{}'", key, s),
        )),
    }
}

fn expect_at_most_one_char(
    format_name: &str,
    key: &str,
    value: &Value,
) -> FormatResult<Option<char>> {
    let s = expect_str(format_name, key, value)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (first, None) => Ok(first),
        _ => Err(FormatError::invalid_json(
            format_name,
            format!("'{}' must be at most one character, got '{}'", key, s),
        )),
    }
}
