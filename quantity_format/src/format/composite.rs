//! Composite unit resolution.
//!
//! A composite block names one to four units. Names are checked for
//! duplicates up front, then every name is sent to the units provider at once
//! and the results are joined in declaration order. One failed lookup fails
//! the whole block.

use futures::future::try_join_all;

use crate::error::{FormatError, FormatResult};
use crate::units::{UnitProps, UnitsProvider};

/// Largest number of units a composite block may declare.
pub const MAX_COMPOSITE_UNITS: usize = 4;

/// A resolved composite unit and its optional display label.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeUnit {
    pub unit: UnitProps,
    pub label: Option<String>,
}

impl CompositeUnit {
    /// Label to display: the explicit one, else the unit's own label.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.unit.label)
    }
}

/// A declared `{name, label?}` entry awaiting resolution.
#[derive(Debug, Clone)]
pub(crate) struct UnitRequest {
    pub name: String,
    pub label: Option<String>,
}

/// Resolve all requests concurrently, preserving declaration order.
pub(crate) async fn resolve_units<P>(
    format_name: &str,
    requests: Vec<UnitRequest>,
    provider: &P,
) -> FormatResult<Vec<CompositeUnit>>
where
    P: UnitsProvider + ?Sized,
{
    if requests.is_empty() || requests.len() > MAX_COMPOSITE_UNITS {
        return Err(FormatError::invalid_json(
            format_name,
            format!(
                "'composite' must declare between 1 and {} units, got {}",
                MAX_COMPOSITE_UNITS,
                requests.len()
            ),
        ));
    }

    let mut accepted: Vec<String> = Vec::with_capacity(requests.len());
    for request in &requests {
        let key = request.name.to_lowercase();
        if accepted.contains(&key) {
            return Err(FormatError::invalid_json(
                format_name,
                format!("'composite' lists unit '{}' more than once", request.name),
            ));
        }
        accepted.push(key);
    }

    log::debug!(
        "Format '{}': resolving {} composite unit(s)",
        format_name,
        requests.len()
    );

    let lookups = requests
        .iter()
        .map(|request| resolve_one(format_name, &request.name, provider));
    let resolved = try_join_all(lookups).await?;

    Ok(resolved
        .into_iter()
        .zip(requests)
        .map(|(unit, request)| CompositeUnit {
            unit,
            label: request.label,
        })
        .collect())
}

async fn resolve_one<P>(format_name: &str, name: &str, provider: &P) -> FormatResult<UnitProps>
where
    P: UnitsProvider + ?Sized,
{
    match provider.find_unit_by_name(name).await {
        Ok(unit) if unit.is_valid => Ok(unit),
        Ok(_) => Err(FormatError::invalid_json(
            format_name,
            format!("composite unit '{}' is not a valid unit", name),
        )),
        Err(e) => {
            log::warn!("Format '{}': failed to resolve unit '{}': {}", format_name, name, e);
            Err(FormatError::invalid_json(
                format_name,
                format!("invalid unit name '{}'", name),
            ))
        }
    }
}
