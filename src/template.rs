use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FpnaError, Result};
use crate::source::ItemFamily;

const BUILTIN_TEMPLATE: &str = include_str!("../templates/budget_vs_actual.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    Account,
    Metric,
    Percentage,
}

impl LineItemKind {
    /// Dataset family the item is joined against; percentages are never joined.
    pub fn family(&self) -> Option<ItemFamily> {
        match self {
            Self::Account => Some(ItemFamily::Account),
            Self::Metric => Some(ItemFamily::Metric),
            Self::Percentage => None,
        }
    }
}

/// Rows a percentage line is computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentBasis {
    pub numerator: String,
    pub denominator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemSpec {
    pub name: String,
    pub kind: LineItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_group_header: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<PercentBasis>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
impl LineItemSpec {
    fn with_kind(name: &str, kind: LineItemKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            group: None,
            is_group_header: false,
            basis: None,
        }
    }

    pub fn account(name: &str) -> Self {
        Self::with_kind(name, LineItemKind::Account)
    }

    pub fn metric(name: &str) -> Self {
        Self::with_kind(name, LineItemKind::Metric)
    }

    pub fn percentage(name: &str) -> Self {
        Self::with_kind(name, LineItemKind::Percentage)
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn group_header(mut self) -> Self {
        self.is_group_header = true;
        self
    }

    pub fn of(mut self, numerator: &str, denominator: &str) -> Self {
        self.basis = Some(PercentBasis {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        });
        self
    }
}

/// Ordered line-item catalog for one report layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub items: Vec<LineItemSpec>,
}

fn default_version() -> u32 {
    1
}

#[cfg(test)]
impl Template {
    pub fn new(name: &str, items: Vec<LineItemSpec>) -> Result<Self> {
        let template = Self {
            name: name.to_string(),
            version: default_version(),
            items,
        };
        template.validate()?;
        Ok(template)
    }
}

impl Template {
    pub fn from_json(json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The bundled budget-vs-actual income statement layout.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TEMPLATE)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Join keys of every item in `family`.
    pub fn names(&self, family: ItemFamily) -> BTreeSet<String> {
        self.items
            .iter()
            .filter(|i| i.kind.family() == Some(family))
            .map(|i| i.name.clone())
            .collect()
    }

    pub fn needs(&self, family: ItemFamily) -> bool {
        self.items.iter().any(|i| i.kind.family() == Some(family))
    }

    pub fn validate(&self) -> Result<()> {
        let mut joined: HashMap<&str, LineItemKind> = HashMap::new();
        for item in &self.items {
            if item.name.is_empty() {
                return Err(FpnaError::Template("line item with empty name".into()));
            }
            if item.kind == LineItemKind::Percentage {
                continue;
            }
            if item.basis.is_some() {
                return Err(FpnaError::Template(format!(
                    "'{}' declares a percentage basis but is not a percentage row",
                    item.name
                )));
            }
            if item.is_group_header && item.group.is_none() {
                return Err(FpnaError::Template(format!(
                    "group header '{}' has no group",
                    item.name
                )));
            }
            if joined.insert(&item.name, item.kind).is_some() {
                return Err(FpnaError::Template(format!(
                    "duplicate line item '{}'",
                    item.name
                )));
            }
        }

        for item in self.items.iter().filter(|i| i.kind == LineItemKind::Percentage) {
            if item.group.is_some() || item.is_group_header {
                return Err(FpnaError::Template(format!(
                    "percentage row '{}' cannot belong to a group",
                    item.name
                )));
            }
            if let Some(basis) = &item.basis {
                for operand in [&basis.numerator, &basis.denominator] {
                    if !joined.contains_key(operand.as_str()) {
                        return Err(FpnaError::Template(format!(
                            "percentage row '{}' refers to unknown line item '{operand}'",
                            item.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_template_loads() {
        let t = Template::builtin().unwrap();
        assert_eq!(t.name, "budget_vs_actual");
        assert_eq!(t.items.first().unwrap().name, "Sales - Aluminum");
        assert_eq!(t.items.last().unwrap().name, "Net Income/(Loss)");
        assert!(t.needs(ItemFamily::Account));
        assert!(t.needs(ItemFamily::Metric));
    }

    #[test]
    fn test_builtin_group_headers() {
        let t = Template::builtin().unwrap();
        let headers: Vec<&str> = t
            .items
            .iter()
            .filter(|i| i.is_group_header)
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(
            headers,
            vec![
                "Gross Sales",
                "Sales Deductions",
                "Total Metal Costs",
                "Total Outside Costs",
                "Total Direct Labor",
            ]
        );
    }

    #[test]
    fn test_builtin_percentages_have_basis() {
        let t = Template::builtin().unwrap();
        let pcts: Vec<_> = t
            .items
            .iter()
            .filter(|i| i.kind == LineItemKind::Percentage)
            .collect();
        assert!(!pcts.is_empty());
        assert!(pcts.iter().all(|p| p.basis.is_some()));
    }

    #[test]
    fn test_percentage_names_may_repeat() {
        let t = Template::new(
            "t",
            vec![
                LineItemSpec::metric("Net Sales"),
                LineItemSpec::metric("Total Direct"),
                LineItemSpec::percentage("% of Net Sales").of("Total Direct", "Net Sales"),
                LineItemSpec::metric("Total Indirect"),
                LineItemSpec::percentage("% of Net Sales").of("Total Indirect", "Net Sales"),
            ],
        );
        assert!(t.is_ok());
    }

    #[test]
    fn test_duplicate_joined_name_rejected() {
        let t = Template::new(
            "t",
            vec![LineItemSpec::account("Melt - Flux"), LineItemSpec::account("Melt - Flux")],
        );
        assert!(matches!(t, Err(FpnaError::Template(_))));
    }

    #[test]
    fn test_grouped_percentage_rejected() {
        let t = Template::new("t", vec![LineItemSpec::percentage("% of Sales").in_group("sales")]);
        assert!(matches!(t, Err(FpnaError::Template(_))));
    }

    #[test]
    fn test_header_without_group_rejected() {
        let t = Template::new("t", vec![LineItemSpec::metric("Gross Sales").group_header()]);
        assert!(matches!(t, Err(FpnaError::Template(_))));
    }

    #[test]
    fn test_basis_must_name_joined_rows() {
        let t = Template::new(
            "t",
            vec![
                LineItemSpec::metric("Net Sales"),
                LineItemSpec::percentage("% of Sales").of("Gross Sales", "Net Sales"),
            ],
        );
        let msg = t.unwrap_err().to_string();
        assert!(msg.contains("Gross Sales"), "got: {msg}");
    }

    #[test]
    fn test_names_by_family() {
        let t = Template::new(
            "t",
            vec![
                LineItemSpec::account("Sales - Returns").in_group("deductions"),
                LineItemSpec::metric("Sales Deductions").in_group("deductions").group_header(),
                LineItemSpec::percentage("% of Sales"),
            ],
        )
        .unwrap();
        assert_eq!(t.names(ItemFamily::Account), BTreeSet::from(["Sales - Returns".to_string()]));
        assert_eq!(t.names(ItemFamily::Metric), BTreeSet::from(["Sales Deductions".to_string()]));
    }

    #[test]
    fn test_from_json_defaults() {
        let json = r#"{"name": "mini", "items": [{"name": "Net Sales", "kind": "metric"}]}"#;
        let t = Template::from_json(json).unwrap();
        assert_eq!(t.version, 1);
        assert!(!t.items[0].is_group_header);
        assert!(t.items[0].group.is_none());
    }

    #[test]
    fn test_empty_item_list() {
        let t = Template::from_json(r#"{"name": "blank", "items": []}"#).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert!(!Template::builtin().unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(
            &path,
            r#"{"name": "file", "version": 3, "items": [{"name": "Sales - Aluminum", "kind": "account"}]}"#,
        )
        .unwrap();
        let t = Template::load(&path).unwrap();
        assert_eq!(t.version, 3);
        assert_eq!(t.len(), 1);
    }
}
