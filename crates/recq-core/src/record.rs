//! # Row Access
//!
//! The planner IR does not own record (de)serialization. It only needs a few
//! questions answered about a row ("how many occurrences of repeated field F
//! are there?", "what is the nested record under F?") and, for validation,
//! about a record type ("does field F exist, and is it repeated?").
//!
//! [`RecordView`] and [`RecordDescriptor`] are those seams. `Record` is a plain
//! in-memory implementation used by tests and by callers that already hold
//! decoded rows.

use crate::correlation::CorrelationIdentifier;
use crate::error::{EvalError, ValidationError};
use crate::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A field value inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Datum {
    Scalar(ScalarValue),
    Record(Record),
    Repeated(Vec<Datum>),
}

/// Read access to one row.
pub trait RecordView: Send + Sync {
    /// The value stored under `name`, or `None` if the field is unset.
    fn field(&self, name: &str) -> Option<&Datum>;

    /// Number of occurrences of a repeated field. Unset fields have zero
    /// occurrences; a singular field that is set counts once.
    fn repeated_field_count(&self, name: &str) -> usize {
        match self.field(name) {
            None => 0,
            Some(Datum::Repeated(items)) => items.len(),
            Some(_) => 1,
        }
    }
}

/// In-memory row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub record_type: String,
    pub fields: BTreeMap<String, Datum>,
}

impl Record {
    /// Empty row of the given record type.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set field `name`, replacing any previous value.
    pub fn with_field(mut self, name: impl Into<String>, value: Datum) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set a scalar field.
    pub fn with_scalar(self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.with_field(name, Datum::Scalar(value.into()))
    }

    /// Set a repeated field; `items` keeps its order.
    pub fn with_repeated(self, name: impl Into<String>, items: Vec<Datum>) -> Self {
        self.with_field(name, Datum::Repeated(items))
    }

    /// All occurrences of the repeated field at the end of `path`, in storage
    /// order. Every earlier component must name a nested record; an unset
    /// component anywhere along the path yields no occurrences.
    pub fn repeated_at_path(&self, path: &[String]) -> Result<Vec<Datum>, EvalError> {
        let Some((last, prefix)) = path.split_last() else {
            return Ok(Vec::new());
        };
        let mut current = self;
        for name in prefix {
            match current.field(name) {
                None => return Ok(Vec::new()),
                Some(Datum::Record(nested)) => current = nested,
                Some(_) => return Err(EvalError::NotARecord(name.clone())),
            }
        }
        match current.field(last) {
            None => Ok(Vec::new()),
            Some(Datum::Repeated(items)) => Ok(items.clone()),
            Some(_) => Err(EvalError::NotRepeated(last.clone())),
        }
    }
}

impl RecordView for Record {
    fn field(&self, name: &str) -> Option<&Datum> {
        self.fields.get(name)
    }
}

/// Field cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLabel {
    Optional,
    Required,
    Repeated,
}

/// Schema entry for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: FieldLabel,
    /// Record type of a nested message field, `None` for scalars.
    pub message_type: Option<Box<RecordDescriptor>>,
}

/// Schema of one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    pub name: String,
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl RecordDescriptor {
    /// Record type with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a scalar field.
    pub fn with_field(mut self, name: impl Into<String>, label: FieldLabel) -> Self {
        let name = name.into();
        self.fields.insert(
            name.clone(),
            FieldDescriptor {
                name,
                label,
                message_type: None,
            },
        );
        self
    }

    /// Add a field holding a nested record of type `message_type`.
    pub fn with_message_field(
        mut self,
        name: impl Into<String>,
        label: FieldLabel,
        message_type: RecordDescriptor,
    ) -> Self {
        let name = name.into();
        self.fields.insert(
            name.clone(),
            FieldDescriptor {
                name,
                label,
                message_type: Some(Box::new(message_type)),
            },
        );
        self
    }

    /// Resolve `name`, failing with `UnknownField` if the type lacks it.
    pub fn find_field(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        self.fields.get(name).ok_or_else(|| ValidationError::UnknownField {
            record_type: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Descriptor of the nested record reached by following `path` from this
    /// record type. Every component must name a message field.
    pub fn resolve_path(&self, path: &[String]) -> Result<&RecordDescriptor, ValidationError> {
        let mut current = self;
        for name in path {
            let field = current.find_field(name)?;
            current = field
                .message_type
                .as_deref()
                .ok_or_else(|| ValidationError::NotAMessage {
                    record_type: current.name.clone(),
                    field: name.clone(),
                })?;
        }
        Ok(current)
    }

    /// Resolve `name` and require it to be a repeated field.
    pub fn find_repeated_field(&self, name: &str) -> Result<&FieldDescriptor, ValidationError> {
        let field = self.find_field(name)?;
        if field.label != FieldLabel::Repeated {
            return Err(ValidationError::NotRepeated {
                record_type: self.name.clone(),
                field: name.to_string(),
            });
        }
        Ok(field)
    }
}

/// Rows bound to correlation identifiers for direct evaluation of leaf
/// producers such as unnesting.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    bindings: HashMap<CorrelationIdentifier, Record>,
}

impl EvaluationContext {
    /// Context with no bound rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `row` to `id`.
    pub fn with_binding(mut self, id: CorrelationIdentifier, row: Record) -> Self {
        self.bindings.insert(id, row);
        self
    }

    /// Row bound to `id`, or `UnboundCorrelation`.
    pub fn binding(&self, id: &CorrelationIdentifier) -> Result<&Record, EvalError> {
        self.bindings
            .get(id)
            .ok_or_else(|| EvalError::UnboundCorrelation(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_field_count() {
        let row = Record::new("Item")
            .with_repeated("tags", vec![Datum::Scalar("a".into()), Datum::Scalar("b".into())])
            .with_scalar("name", "x");
        assert_eq!(row.repeated_field_count("tags"), 2);
        assert_eq!(row.repeated_field_count("missing"), 0);
        assert_eq!(row.repeated_field_count("name"), 1);
    }

    #[test]
    fn test_repeated_at_nested_path() {
        let inner = Record::new("Header").with_repeated("ids", vec![Datum::Scalar(1i64.into())]);
        let row = Record::new("Order").with_field("header", Datum::Record(inner));
        let path = vec!["header".to_string(), "ids".to_string()];
        assert_eq!(row.repeated_at_path(&path).unwrap().len(), 1);

        let unset = vec!["footer".to_string(), "ids".to_string()];
        assert!(row.repeated_at_path(&unset).unwrap().is_empty());

        let bad = vec!["header".to_string()];
        assert_eq!(
            row.repeated_at_path(&bad),
            Err(EvalError::NotRepeated("header".to_string()))
        );
    }

    #[test]
    fn test_descriptor_validation() {
        let desc = RecordDescriptor::new("Item")
            .with_field("tags", FieldLabel::Repeated)
            .with_field("name", FieldLabel::Optional);
        assert!(desc.find_repeated_field("tags").is_ok());
        assert!(matches!(
            desc.find_repeated_field("name"),
            Err(ValidationError::NotRepeated { .. })
        ));
        assert!(matches!(
            desc.find_field("nope"),
            Err(ValidationError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_resolve_path_follows_message_fields() {
        let meta = RecordDescriptor::new("Meta").with_field("labels", FieldLabel::Repeated);
        let doc = RecordDescriptor::new("Doc")
            .with_field("title", FieldLabel::Optional)
            .with_message_field("meta", FieldLabel::Optional, meta);

        assert_eq!(doc.resolve_path(&[]).map(|d| d.name.as_str()), Ok("Doc"));
        let nested = doc.resolve_path(&["meta".to_string()]).unwrap();
        assert_eq!(nested.name, "Meta");
        assert!(nested.find_repeated_field("labels").is_ok());

        assert_eq!(
            doc.resolve_path(&["title".to_string()]).map(|d| d.name.clone()),
            Err(ValidationError::NotAMessage {
                record_type: "Doc".into(),
                field: "title".into()
            })
        );
        assert!(matches!(
            doc.resolve_path(&["extra".to_string()]),
            Err(ValidationError::UnknownField { .. })
        ));
    }
}
