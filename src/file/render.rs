//! Conversion of decoded documents into `serde_yaml` values for printing.

use crate::document::node::{YamlNode, YamlNumber, YamlValue};
use anyhow::{Context, Result};

/// Converts a node value into a `serde_yaml::Value`.
pub fn node_to_serde_value(value: &YamlValue) -> serde_yaml::Value {
    match value {
        YamlValue::Object(entries) => {
            let map: serde_yaml::Mapping = entries
                .iter()
                .map(|(k, v)| {
                    (
                        serde_yaml::Value::String(k.clone()),
                        node_to_serde_value(v.value()),
                    )
                })
                .collect();
            serde_yaml::Value::Mapping(map)
        }
        YamlValue::Array(elements) => {
            let arr: Vec<serde_yaml::Value> = elements
                .iter()
                .map(|v| node_to_serde_value(v.value()))
                .collect();
            serde_yaml::Value::Sequence(arr)
        }
        YamlValue::String(s) => serde_yaml::Value::String(s.as_str().to_string()),
        YamlValue::Number(n) => match n {
            YamlNumber::Integer(i) => serde_yaml::Value::Number(serde_yaml::Number::from(*i)),
            YamlNumber::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
        },
        YamlValue::Boolean(b) => serde_yaml::Value::Bool(*b),
        YamlValue::Null => serde_yaml::Value::Null,
        // Unresolved aliases have no serde_yaml form
        YamlValue::Alias(id) => serde_yaml::Value::String(format!("*{}", id)),
    }
}

/// Renders one decoded document as YAML text.
///
/// Comment lines of the document's leading content are written first so
/// header comments survive the round trip.
pub fn render_document(node: &YamlNode) -> Result<String> {
    let mut out = String::new();
    if let Some(leading) = node.leading_content() {
        for line in leading.lines().filter(|l| l.trim_start().starts_with('#')) {
            out.push_str(line);
            out.push('\n');
        }
    }

    let body = serde_yaml::to_string(&node_to_serde_value(node.value()))
        .context("Failed to render document as YAML")?;
    out.push_str(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_render_mapping() {
        let mut map = IndexMap::new();
        map.insert("m_Name".to_string(), YamlNode::plain_string("Rock"));
        map.insert(
            "m_Layer".to_string(),
            YamlNode::new(YamlValue::Number(YamlNumber::Integer(3))),
        );
        let rendered = render_document(&YamlNode::new(YamlValue::Object(map))).unwrap();
        assert_eq!(rendered, "m_Name: Rock\nm_Layer: 3\n");
    }

    #[test]
    fn test_unresolved_alias_renders_as_text() {
        assert_eq!(
            node_to_serde_value(&YamlValue::Alias(7)),
            serde_yaml::Value::String("*7".to_string())
        );
    }
}
