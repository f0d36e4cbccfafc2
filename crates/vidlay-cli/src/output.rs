//! Output formatting for CLI

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

pub fn to_json<T: Serialize>(data: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

pub fn to_table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render a flag that may be unset
pub fn flag(value: Option<bool>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        key: &'static str,
        value: String,
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_table_has_headers() {
        let table = to_table([Row {
            key: "muted",
            value: "true".into(),
        }]);
        assert!(table.contains("key"));
        assert!(table.contains("muted"));
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(None), "-");
        assert_eq!(flag(Some(false)), "false");
    }
}
