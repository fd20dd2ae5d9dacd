//! # Quantity Format
//!
//! Validated, serializable display-format specifications for physical
//! quantities.
//!
//! A format says how a magnitude such as a length or an angle is turned into
//! text: decimal, fractional, scientific or station layout, precision,
//! separators, sign handling, a set of trait flags, and an optional chain of
//! up to four composite units (feet and inches, degrees/minutes/seconds).
//! Formats are loaded from and saved to a JSON object and reject malformed
//! input with a message naming the format and the attribute at fault.
//!
//! ## Architecture
//!
//! - [`codec`]: token <-> enum and trait-bit mapping
//! - [`format`]: the [`Format`] type, its validation and JSON round trip
//! - [`units`]: the [`UnitsProvider`] boundary and an in-memory registry
//! - [`formatter`]: conversions prepared for a renderer
//! - [`config`]: locale separator defaults from TOML
//! - [`error`]: error types
//!
//! Unit names in a composite block are resolved through a caller-supplied
//! [`UnitsProvider`]. All lookups for a format run concurrently and the
//! format is only built if every one of them succeeds.

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod formatter;
pub mod units;

pub use codec::{FormatTraits, FormatType, ScientificType, ShowSignOption};
pub use config::{FormatConfig, LocaleSeparators};
pub use error::{FormatError, FormatResult, UnitsError};
pub use format::{CompositeUnit, Format, FormatProps};
pub use formatter::FormatterSpec;
pub use units::{BasicUnitsProvider, UnitConversion, UnitProps, UnitsProvider};
