//! Data-described request shapes.
//!
//! A [`Shape`] is an ordered list of [`Field`]s, each with a [`FieldKind`],
//! a required flag and a list of [`Rule`]s. Shapes are declared once at
//! startup through [`ShapeBuilder`], which rejects malformed declarations, and
//! are then used read-only to coerce and validate request bodies.
//!
//! ```ignore
//! let address = Shape::builder()
//!     .field(Field::string("city").rule(Rule::NotEmpty))
//!     .build()?;
//! let contact = Shape::builder()
//!     .field(Field::string("name").rule(Rule::NotEmpty))
//!     .field(Field::object("address", address))
//!     .build()?;
//! ```

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use super::validators::{is_email, is_object_id, is_url};
use super::violation::Violation;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    Boolean,
    Object(Shape),
    List(Box<FieldKind>),
    /// Any JSON value; only the field's rules constrain it.
    Any,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
            }
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object(_) => value.is_object(),
            FieldKind::List(_) => value.is_array(),
            FieldKind::Any => true,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer number",
            FieldKind::Boolean => "a boolean value",
            FieldKind::Object(_) => "an object",
            FieldKind::List(_) => "an array",
            FieldKind::Any => "any value",
        }
    }

    fn coerce(&self, value: &Value) -> Value {
        match (self, value) {
            (FieldKind::Object(shape), Value::Object(_)) => shape.coerce(value),
            (FieldKind::List(element), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| element.coerce(item)).collect())
            }
            _ => value.clone(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Object(_) => "object",
            FieldKind::List(_) => "list",
            FieldKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// A constraint evaluated against a present field value.
#[derive(Debug, Clone)]
pub enum Rule {
    NotEmpty,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Matches(Regex),
    Email,
    Url,
    ObjectId,
    OneOf(Vec<String>),
    MinItems(usize),
    MaxItems(usize),
}

impl Rule {
    pub fn matches(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Rule::Matches)
            .map_err(|e| ConfigError::MalformedShape(format!("invalid pattern '{}': {}", pattern, e)))
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::OneOf(values.into_iter().map(Into::into).collect())
    }

    fn name(&self) -> &'static str {
        match self {
            Rule::NotEmpty => "NotEmpty",
            Rule::MinLength(_) => "MinLength",
            Rule::MaxLength(_) => "MaxLength",
            Rule::Min(_) => "Min",
            Rule::Max(_) => "Max",
            Rule::Matches(_) => "Matches",
            Rule::Email => "Email",
            Rule::Url => "Url",
            Rule::ObjectId => "ObjectId",
            Rule::OneOf(_) => "OneOf",
            Rule::MinItems(_) => "MinItems",
            Rule::MaxItems(_) => "MaxItems",
        }
    }

    fn applies_to(&self, kind: &FieldKind) -> bool {
        match self {
            Rule::NotEmpty => !matches!(
                kind,
                FieldKind::Number | FieldKind::Integer | FieldKind::Boolean
            ),
            Rule::MinLength(_)
            | Rule::MaxLength(_)
            | Rule::Matches(_)
            | Rule::Email
            | Rule::Url
            | Rule::ObjectId
            | Rule::OneOf(_) => matches!(kind, FieldKind::String | FieldKind::Any),
            Rule::Min(_) | Rule::Max(_) => {
                matches!(kind, FieldKind::Number | FieldKind::Integer | FieldKind::Any)
            }
            Rule::MinItems(_) | Rule::MaxItems(_) => {
                matches!(kind, FieldKind::List(_) | FieldKind::Any)
            }
        }
    }

    fn check(&self, value: &Value) -> bool {
        match self {
            Rule::NotEmpty => match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                Value::Array(items) => !items.is_empty(),
                Value::Object(map) => !map.is_empty(),
                _ => true,
            },
            Rule::MinLength(min) => value.as_str().is_some_and(|s| s.chars().count() >= *min),
            Rule::MaxLength(max) => value.as_str().is_some_and(|s| s.chars().count() <= *max),
            Rule::Min(min) => value.as_f64().is_some_and(|n| n >= *min),
            Rule::Max(max) => value.as_f64().is_some_and(|n| n <= *max),
            Rule::Matches(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            Rule::Email => value.as_str().is_some_and(is_email),
            Rule::Url => value.as_str().is_some_and(is_url),
            Rule::ObjectId => value.as_str().is_some_and(is_object_id),
            Rule::OneOf(allowed) => value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| a == s)),
            Rule::MinItems(min) => value.as_array().is_some_and(|a| a.len() >= *min),
            Rule::MaxItems(max) => value.as_array().is_some_and(|a| a.len() <= *max),
        }
    }

    fn message(&self, field: &str) -> String {
        match self {
            Rule::NotEmpty => format!("{} should not be empty", field),
            Rule::MinLength(n) => {
                format!("{} must be longer than or equal to {} characters", field, n)
            }
            Rule::MaxLength(n) => {
                format!("{} must be shorter than or equal to {} characters", field, n)
            }
            Rule::Min(n) => format!("{} must not be less than {}", field, n),
            Rule::Max(n) => format!("{} must not be greater than {}", field, n),
            Rule::Matches(re) => {
                format!("{} must match {} regular expression", field, re.as_str())
            }
            Rule::Email => format!("{} must be an email", field),
            Rule::Url => format!("{} must be a URL address", field),
            Rule::ObjectId => format!("{} must be a mongodb id", field),
            Rule::OneOf(values) => format!(
                "{} must be one of the following values: {}",
                field,
                values.join(", ")
            ),
            Rule::MinItems(n) => format!("{} must contain at least {} elements", field, n),
            Rule::MaxItems(n) => format!("{} must contain no more than {} elements", field, n),
        }
    }
}

/// Declaration of one expected field.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    required: bool,
    rules: Vec<Rule>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            rules: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn object(name: impl Into<String>, shape: Shape) -> Self {
        Self::new(name, FieldKind::Object(shape))
    }

    pub fn list(name: impl Into<String>, element: FieldKind) -> Self {
        Self::new(name, FieldKind::List(Box::new(element)))
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    fn check_declaration(&self) -> Result<(), ConfigError> {
        let malformed = |reason: String| {
            Err(ConfigError::MalformedShape(format!("field '{}': {}", self.name, reason)))
        };

        if let FieldKind::List(element) = &self.kind {
            if matches!(element.as_ref(), FieldKind::List(_)) {
                return malformed("nested lists are not supported".to_string());
            }
        }

        let mut min_len = None;
        let mut max_len = None;
        let mut min = None;
        let mut max = None;
        let mut min_items = None;
        let mut max_items = None;

        for rule in &self.rules {
            if !rule.applies_to(&self.kind) {
                return malformed(format!(
                    "rule {} can not be applied to a {} field",
                    rule.name(),
                    self.kind
                ));
            }
            match rule {
                Rule::MinLength(n) => min_len = Some(*n),
                Rule::MaxLength(n) => max_len = Some(*n),
                Rule::Min(n) | Rule::Max(n) if !n.is_finite() => {
                    return malformed(format!("rule {} needs a finite bound", rule.name()));
                }
                Rule::Min(n) => min = Some(*n),
                Rule::Max(n) => max = Some(*n),
                Rule::MinItems(n) => min_items = Some(*n),
                Rule::MaxItems(n) => max_items = Some(*n),
                Rule::OneOf(values) if values.is_empty() => {
                    return malformed("rule OneOf needs at least one value".to_string());
                }
                _ => {}
            }
        }

        if let (Some(lo), Some(hi)) = (min_len, max_len) {
            if lo > hi {
                return malformed(format!("MinLength {} exceeds MaxLength {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return malformed(format!("Min {} exceeds Max {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (min_items, max_items) {
            if lo > hi {
                return malformed(format!("MinItems {} exceeds MaxItems {}", lo, hi));
            }
        }
        Ok(())
    }

    fn validate(&self, value: Option<&Value>, skip_missing: bool) -> Option<Violation> {
        let value = match value {
            None | Some(Value::Null) => {
                if skip_missing || !self.required {
                    return None;
                }
                let required = vec![format!("{} is required", self.name)];
                // An absent nested object still reports what it would need.
                let children = match &self.kind {
                    FieldKind::Object(shape) => shape.validate(&Value::Object(Map::new()), false),
                    _ => Vec::new(),
                };
                return Some(Violation::new(&self.name, required, children));
            }
            Some(value) => value,
        };

        let mut constraints = Vec::new();
        let mut children = Vec::new();

        if !self.kind.accepts(value) {
            constraints.push(format!("{} must be {}", self.name, self.kind.describe()));
        }
        for rule in &self.rules {
            if !rule.check(value) {
                constraints.push(rule.message(&self.name));
            }
        }

        match (&self.kind, value) {
            (FieldKind::Object(shape), Value::Object(_)) => {
                children = shape.validate(value, skip_missing);
            }
            (FieldKind::List(element), Value::Array(items)) => {
                if items.iter().any(|item| !element.accepts(item)) {
                    constraints.push(format!(
                        "each value in {} must be {}",
                        self.name,
                        element.describe()
                    ));
                }
                if let FieldKind::Object(shape) = element.as_ref() {
                    for (index, item) in items.iter().enumerate() {
                        if !item.is_object() {
                            continue;
                        }
                        let nested = shape.validate(item, skip_missing);
                        if !nested.is_empty() {
                            children.push(Violation::new(index.to_string(), Vec::new(), nested));
                        }
                    }
                }
            }
            _ => {}
        }

        if constraints.is_empty() && children.is_empty() {
            None
        } else {
            Some(Violation::new(&self.name, constraints, children))
        }
    }
}

/// Ordered set of field declarations.
#[derive(Debug, Clone)]
pub struct Shape {
    fields: Vec<Field>,
}

#[derive(Debug, Default)]
pub struct ShapeBuilder {
    fields: Vec<Field>,
}

impl ShapeBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Result<Shape, ConfigError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ConfigError::MalformedShape(
                    "field name can not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::MalformedShape(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
            field.check_declaration()?;
        }
        Ok(Shape {
            fields: self.fields,
        })
    }
}

impl Shape {
    pub fn builder() -> ShapeBuilder {
        ShapeBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Project `raw` onto the declared fields. Undeclared keys and `null`
    /// values are dropped, nested shapes are projected recursively, and
    /// anything that is not a mapping becomes an empty one.
    pub fn coerce(&self, raw: &Value) -> Value {
        let mut out = Map::new();
        if let Value::Object(map) = raw {
            for field in &self.fields {
                if let Some(value) = map.get(&field.name).filter(|v| !v.is_null()) {
                    out.insert(field.name.clone(), field.kind.coerce(value));
                }
            }
        }
        Value::Object(out)
    }

    /// Violations for every failing field, in declaration order. Empty means
    /// the value is acceptable.
    ///
    /// With `skip_missing`, absent fields are not evaluated at all, which is
    /// what partial updates need.
    pub fn validate(&self, raw: &Value, skip_missing: bool) -> Vec<Violation> {
        let empty = Map::new();
        let map = raw.as_object().unwrap_or(&empty);
        self.fields
            .iter()
            .filter_map(|field| field.validate(map.get(&field.name), skip_missing))
            .collect()
    }
}
