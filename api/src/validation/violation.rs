//! Field violations and their flattening into client-facing messages.

use serde::Serialize;

/// One field's failure, possibly with failures of nested fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub property: String,
    pub constraints: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Violation>,
}

impl Violation {
    pub fn new(
        property: impl Into<String>,
        constraints: Vec<String>,
        children: Vec<Violation>,
    ) -> Self {
        Self {
            property: property.into(),
            constraints,
            children,
        }
    }

    pub fn leaf(property: impl Into<String>, constraints: Vec<String>) -> Self {
        Self::new(property, constraints, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty() && self.children.is_empty()
    }

    /// Join this field's messages with `"; "`. When the field has children,
    /// the result is prefixed once with `"<property>: "` and carries the
    /// field's own messages followed by each child's flattened output.
    pub fn flatten(&self) -> String {
        if self.children.is_empty() {
            return self.constraints.join("; ");
        }

        let parts: Vec<String> = self
            .constraints
            .iter()
            .cloned()
            .chain(self.children.iter().map(Violation::flatten))
            .collect();
        format!("{}: {}", self.property, parts.join("; "))
    }
}

/// One message per top-level violation, in field-declaration order.
pub fn flatten_all(violations: &[Violation]) -> Vec<String> {
    violations
        .iter()
        .filter(|v| !v.is_empty())
        .map(Violation::flatten)
        .collect()
}
