//! Mapping between the persisted format vocabulary and internal enumerations.
//!
//! Every function here is a pure lookup. Parsers take the name of the format
//! being built so that failures can be reported as
//! [`FormatError::InvalidJson`] for that format.
//!
//! | Persisted token | Internal value |
//! |---|---|
//! | `decimal`, `fractional`, `scientific`, `station` | [`FormatType`] |
//! | `normalized`, `zeroNormalized` | [`ScientificType`] |
//! | `noSign`, `onlyNegative`, `signAlways`, `negativeParentheses` | [`ShowSignOption`] |
//! | `trailZeroes`, `keepSingleZero`, ... | one bit of [`FormatTraits`] |
//!
//! Token matching is case-insensitive; serialization always produces the
//! spellings in the table.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::{FormatError, FormatResult};

// =============================================================================
// Enumerations
// =============================================================================

/// Numeric layout of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    Decimal,
    Fractional,
    Scientific,
    Station,
}

/// Exponent normalization used by scientific formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScientificType {
    /// Mantissa in `[1, 10)`, e.g. `1.5E3`.
    Normalized,
    /// Mantissa in `[0.1, 1)`, e.g. `0.15E4`.
    ZeroNormalized,
}

/// How the sign of a value is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShowSignOption {
    NoSign,
    #[default]
    OnlyNegative,
    SignAlways,
    NegativeParentheses,
}

/// Number of digits after the decimal point for non-fractional formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum DecimalPrecision {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

/// Denominator used by fractional formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum FractionalPrecision {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
    SixtyFour = 64,
    OneHundredTwentyEight = 128,
    TwoHundredFiftySix = 256,
}

impl TryFrom<u32> for DecimalPrecision {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            4 => Self::Four,
            5 => Self::Five,
            6 => Self::Six,
            7 => Self::Seven,
            8 => Self::Eight,
            _ => return Err(format!("Decimal precision must be 0-8, got {}", value)),
        })
    }
}

impl TryFrom<u32> for FractionalPrecision {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => Self::One,
            2 => Self::Two,
            4 => Self::Four,
            8 => Self::Eight,
            16 => Self::Sixteen,
            32 => Self::ThirtyTwo,
            64 => Self::SixtyFour,
            128 => Self::OneHundredTwentyEight,
            256 => Self::TwoHundredFiftySix,
            _ => {
                return Err(format!(
                    "Fractional precision must be a power of two between 1 and 256, got {}",
                    value
                ))
            }
        })
    }
}

/// Precision applied when a format does not specify one.
pub const DEFAULT_PRECISION: u32 = DecimalPrecision::Six as u32;

bitflags! {
    /// Secondary rendering behaviors, one bit per trait.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FormatTraits: u32 {
        const TRAILING_ZEROES = 0x001;
        const KEEP_SINGLE_ZERO = 0x002;
        const ZERO_EMPTY = 0x004;
        const KEEP_DECIMAL_POINT = 0x008;
        const APPLY_ROUNDING = 0x010;
        const FRACTION_DASH = 0x020;
        const SHOW_UNIT_LABEL = 0x040;
        const PREPEND_UNIT_LABEL = 0x080;
        const USE_1000_SEPARATOR = 0x100;
        const EXPONENT_ONLY_NEGATIVE = 0x200;
    }
}

/// Persisted token for every trait bit, in declaration order.
const TRAIT_TOKENS: [(&str, FormatTraits); 10] = [
    ("trailZeroes", FormatTraits::TRAILING_ZEROES),
    ("keepSingleZero", FormatTraits::KEEP_SINGLE_ZERO),
    ("zeroEmpty", FormatTraits::ZERO_EMPTY),
    ("keepDecimalPoint", FormatTraits::KEEP_DECIMAL_POINT),
    ("applyRounding", FormatTraits::APPLY_ROUNDING),
    ("fractionDash", FormatTraits::FRACTION_DASH),
    ("showUnitLabel", FormatTraits::SHOW_UNIT_LABEL),
    ("prependUnitLabel", FormatTraits::PREPEND_UNIT_LABEL),
    ("use1000Separator", FormatTraits::USE_1000_SEPARATOR),
    ("exponentOnlyNegative", FormatTraits::EXPONENT_ONLY_NEGATIVE),
];

// =============================================================================
// Parsing
// =============================================================================

/// Parse a format type token.
pub fn parse_format_type(token: &str, format_name: &str) -> FormatResult<FormatType> {
    token.parse().map_err(|_: String| {
        FormatError::invalid_json(
            format_name,
            format!("'type' has an invalid value '{}'", token),
        )
    })
}

/// Parse a scientific type token.
pub fn parse_scientific_type(token: &str, format_name: &str) -> FormatResult<ScientificType> {
    token.parse().map_err(|_: String| {
        FormatError::invalid_json(
            format_name,
            format!("'scientificType' has an invalid value '{}'", token),
        )
    })
}

/// Parse a sign option token.
pub fn parse_show_sign_option(token: &str, format_name: &str) -> FormatResult<ShowSignOption> {
    token.parse().map_err(|_: String| {
        FormatError::invalid_json(
            format_name,
            format!("'showSignOption' has an invalid value '{}'", token),
        )
    })
}

/// Validate a precision value against the format type.
///
/// Fractional formats take a power-of-two denominator; every other type takes
/// a digit count in the [`DecimalPrecision`] range.
pub fn parse_precision(
    value: i64,
    format_type: FormatType,
    format_name: &str,
) -> FormatResult<u32> {
    let invalid = |reason: String| {
        FormatError::invalid_json(
            format_name,
            format!("'precision' has an invalid value {}: {}", value, reason),
        )
    };

    let raw = u32::try_from(value).map_err(|_| invalid("must not be negative".to_string()))?;
    match format_type {
        FormatType::Fractional => FractionalPrecision::try_from(raw)
            .map(|p| p as u32)
            .map_err(invalid),
        FormatType::Decimal | FormatType::Scientific | FormatType::Station => {
            DecimalPrecision::try_from(raw)
                .map(|p| p as u32)
                .map_err(invalid)
        }
    }
}

/// Map a single trait token to its bit.
///
/// Returns `None` for unknown tokens so the caller can report the token
/// together with the attribute it came from.
pub fn parse_format_trait(token: &str, format_name: &str) -> Option<FormatTraits> {
    let found = TRAIT_TOKENS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(token))
        .map(|(_, bit)| *bit);
    if found.is_none() {
        log::debug!("Format '{}': unknown trait token '{}'", format_name, token);
    }
    found
}

/// List the tokens of every bit set in `traits`, in declaration order.
pub fn format_traits_to_array(traits: FormatTraits) -> Vec<&'static str> {
    TRAIT_TOKENS
        .iter()
        .filter(|(_, bit)| traits.contains(*bit))
        .map(|(name, _)| *name)
        .collect()
}

// =============================================================================
// Serialization
// =============================================================================

pub fn format_type_to_string(format_type: FormatType) -> &'static str {
    match format_type {
        FormatType::Decimal => "decimal",
        FormatType::Fractional => "fractional",
        FormatType::Scientific => "scientific",
        FormatType::Station => "station",
    }
}

pub fn scientific_type_to_string(scientific_type: ScientificType) -> &'static str {
    match scientific_type {
        ScientificType::Normalized => "normalized",
        ScientificType::ZeroNormalized => "zeroNormalized",
    }
}

pub fn show_sign_option_to_string(option: ShowSignOption) -> &'static str {
    match option {
        ShowSignOption::NoSign => "noSign",
        ShowSignOption::OnlyNegative => "onlyNegative",
        ShowSignOption::SignAlways => "signAlways",
        ShowSignOption::NegativeParentheses => "negativeParentheses",
    }
}

impl FromStr for FormatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "decimal" => Ok(Self::Decimal),
            "fractional" => Ok(Self::Fractional),
            "scientific" => Ok(Self::Scientific),
            "station" => Ok(Self::Station),
            _ => Err(format!("Unknown format type: {}", s)),
        }
    }
}

impl FromStr for ScientificType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normalized" => Ok(Self::Normalized),
            "zeronormalized" => Ok(Self::ZeroNormalized),
            _ => Err(format!("Unknown scientific type: {}", s)),
        }
    }
}

impl FromStr for ShowSignOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nosign" => Ok(Self::NoSign),
            "onlynegative" => Ok(Self::OnlyNegative),
            "signalways" => Ok(Self::SignAlways),
            "negativeparentheses" => Ok(Self::NegativeParentheses),
            _ => Err(format!("Unknown sign option: {}", s)),
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(format_type_to_string(*self))
    }
}

impl fmt::Display for ScientificType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(scientific_type_to_string(*self))
    }
}

impl fmt::Display for ShowSignOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(show_sign_option_to_string(*self))
    }
}
