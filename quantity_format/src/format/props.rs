//! Persisted shape of a format.
//!
//! [`FormatProps`] mirrors the JSON object a format is loaded from and saved
//! to. It is a plain data carrier: nothing here is validated, that happens
//! when a [`Format`](super::Format) is built from it.

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts `formatTraits` either as a delimited string or as a list.
fn deserialize_format_traits<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        String(String),
        List(Vec<String>),
    }

    Ok(match Option::<StringOrList>::deserialize(deserializer)? {
        None => None,
        Some(StringOrList::List(tokens)) => Some(tokens),
        Some(StringOrList::String(s)) => Some(
            s.split([',', ';', '|'])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    })
}

/// JSON shape of a format definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatProps<C = serde_json::Value> {
    #[serde(rename = "type")]
    pub format_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_sign_option: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_format_traits",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_traits: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thousand_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uom_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station_offset_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<C>,
}

/// JSON shape of the `composite` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_zero: Option<bool>,
    pub units: Vec<CompositeUnitProps>,
}

/// One `{name, label?}` entry of a composite block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeUnitProps {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl<C> FormatProps<C> {
    /// Minimal props for the given type token.
    pub fn new(format_type: impl Into<String>) -> Self {
        Self {
            format_type: format_type.into(),
            precision: None,
            round_factor: None,
            min_width: None,
            scientific_type: None,
            show_sign_option: None,
            format_traits: None,
            decimal_separator: None,
            thousand_separator: None,
            uom_separator: None,
            station_separator: None,
            station_offset_size: None,
            composite: None,
            custom: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_traits_accept_delimited_string() {
        let props: FormatProps = serde_json::from_value(json!({
            "type": "decimal",
            "formatTraits": "trailZeroes; keepSingleZero|showUnitLabel"
        }))
        .unwrap();
        assert_eq!(
            props.format_traits.unwrap(),
            vec!["trailZeroes", "keepSingleZero", "showUnitLabel"]
        );
    }

    #[test]
    fn test_traits_accept_list() {
        let props: FormatProps =
            serde_json::from_value(json!({"type": "decimal", "formatTraits": ["zeroEmpty"]}))
                .unwrap();
        assert_eq!(props.format_traits.unwrap(), vec!["zeroEmpty"]);
    }

    #[test]
    fn test_absent_fields_are_not_serialized() {
        let props: FormatProps = FormatProps::new("decimal");
        assert_eq!(serde_json::to_value(&props).unwrap(), json!({"type": "decimal"}));
    }

    #[test]
    fn test_composite_label_optional() {
        let props: FormatProps = serde_json::from_value(json!({
            "type": "decimal",
            "composite": {"units": [{"name": "Foot", "label": "'"}, {"name": "Inch"}]}
        }))
        .unwrap();
        let composite = props.composite.unwrap();
        assert_eq!(composite.units[0].label.as_deref(), Some("'"));
        assert_eq!(composite.units[1].label, None);
        assert_eq!(composite.include_zero, None);
    }
}
