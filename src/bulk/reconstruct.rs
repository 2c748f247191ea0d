//! Rebuilding nested objects from the flat bulk result format.
//!
//! A bulk result file holds one JSON object per line. Objects nested in the
//! query (for example the variants of a product) appear as separate lines
//! carrying a `__parentId` back-reference, always after their parent:
//!
//! ```text
//! {"id":"gid://shopify/Product/1","title":"Shirt"}
//! {"id":"gid://shopify/ProductVariant/2","__parentId":"gid://shopify/Product/1"}
//! {"id":"gid://shopify/ProductVariant/3","__parentId":"gid://shopify/Product/1"}
//! {"id":"gid://shopify/Product/4","title":"Hat"}
//! ```
//!
//! IDs and back-references may be strings or numbers. A missing or `null`
//! `__parentId` marks a top-level object.
//!
//! A [`BulkShape`] tells the [`Reconstructor`] which field each child belongs
//! under. The output keeps the order of first appearance at every depth, and
//! every declared collection is present on every object (possibly empty).
//!
//! # Example
//!
//! ```rust
//! use shopify_graphql::bulk::{reconstruct, BulkShape};
//! use serde_json::Value;
//!
//! let lines = concat!(
//!     r#"{"id":"gid://shopify/Product/1"}"#, "\n",
//!     r#"{"id":"gid://shopify/ProductVariant/2","__parentId":"gid://shopify/Product/1"}"#, "\n",
//!     r#"{"id":"gid://shopify/Product/4"}"#, "\n",
//! );
//! let shape = BulkShape::new().collection("variants", "ProductVariant");
//!
//! let products: Vec<Value> = reconstruct(lines.as_bytes(), &shape).unwrap();
//! assert_eq!(products.len(), 2);
//! assert_eq!(products[0]["variants"][0]["id"], "gid://shopify/ProductVariant/2");
//! assert_eq!(products[1]["variants"], serde_json::json!([]));
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::bulk::ReconstructError;

/// Field holding the parent back-reference.
pub const PARENT_ID_FIELD: &str = "__parentId";

/// One line of a bulk result file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

impl FlatRecord {
    /// Parses one line.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the line is not a JSON object.
    pub fn parse(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line).map(|fields| Self { fields })
    }

    /// Returns the record's own ID as an index key.
    ///
    /// String and numeric IDs are accepted; `1` and `"1"` are the same key.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.fields.get("id").and_then(reference_key)
    }

    /// Returns the raw parent back-reference; `null` counts as absent.
    #[must_use]
    pub fn parent_reference(&self) -> Option<&Value> {
        self.fields
            .get(PARENT_ID_FIELD)
            .filter(|reference| !reference.is_null())
    }

    /// Returns the parent back-reference as an index key.
    ///
    /// `None` for top-level records and for references that are neither a
    /// string nor a number.
    #[must_use]
    pub fn parent_id(&self) -> Option<String> {
        self.parent_reference().and_then(reference_key)
    }

    /// Returns the record type from `__typename`, or from the type segment of
    /// a `gid://shopify/<Type>/<id>` ID.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.fields
            .get("__typename")
            .and_then(Value::as_str)
            .or_else(|| {
                self.fields
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|id| id.strip_prefix("gid://"))
                    .and_then(|rest| rest.split('/').nth(1))
                    .filter(|segment| !segment.is_empty())
            })
    }

    /// Returns the fields without the parent back-reference.
    #[must_use]
    pub fn into_fields(mut self) -> Map<String, Value> {
        self.fields.remove(PARENT_ID_FIELD);
        self.fields
    }
}

fn reference_key(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// A named child collection of a [`BulkShape`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    /// Field the children are collected under.
    pub field: String,
    /// Type of the children (`__typename` or the GID type segment).
    pub child_type: String,
    /// Shape of each child.
    pub shape: BulkShape,
}

/// Which nested collections an object has, recursively.
///
/// A shape with a single collection routes every child there, whatever its
/// type. With several collections, children are routed by type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkShape {
    collections: Vec<Collection>,
}

impl BulkShape {
    /// Creates a shape with no nested collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection of leaf children.
    #[must_use]
    pub fn collection(self, field: impl Into<String>, child_type: impl Into<String>) -> Self {
        self.nested(field, child_type, Self::new())
    }

    /// Adds a collection whose children have their own collections.
    #[must_use]
    pub fn nested(
        mut self,
        field: impl Into<String>,
        child_type: impl Into<String>,
        shape: Self,
    ) -> Self {
        self.collections.push(Collection {
            field: field.into(),
            child_type: child_type.into(),
            shape,
        });
        self
    }

    /// Returns the declared collections.
    #[must_use]
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    fn route(&self, record: &FlatRecord) -> Option<usize> {
        if self.collections.len() == 1 {
            return Some(0);
        }
        let child_type = record.type_name()?;
        self.collections
            .iter()
            .position(|collection| collection.child_type == child_type)
    }
}

/// When completed top-level objects are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FinalizePolicy {
    /// Emit the pending top-level objects as soon as the next top-level
    /// record starts. Memory is bounded by the largest single object tree,
    /// but a child arriving after its top-level object was emitted is an
    /// orphan.
    #[default]
    OnNextTopLevel,
    /// Keep everything until [`Reconstructor::finish`].
    AtEnd,
}

#[derive(Debug)]
struct Node<'a> {
    fields: Map<String, Value>,
    shape: &'a BulkShape,
    children: Vec<Vec<usize>>,
}

/// Single-pass reconstructor of nested objects.
///
/// Feed lines in file order with [`push_line`](Self::push_line); finished
/// top-level objects are returned as they complete, and the rest by
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct Reconstructor<'a> {
    shape: &'a BulkShape,
    policy: FinalizePolicy,
    nodes: Vec<Node<'a>>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
    line: usize,
}

impl<'a> Reconstructor<'a> {
    /// Creates a reconstructor with the default [`FinalizePolicy`].
    #[must_use]
    pub fn new(shape: &'a BulkShape) -> Self {
        Self::with_policy(shape, FinalizePolicy::default())
    }

    /// Creates a reconstructor with an explicit policy.
    #[must_use]
    pub fn with_policy(shape: &'a BulkShape, policy: FinalizePolicy) -> Self {
        Self {
            shape,
            policy,
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
            line: 0,
        }
    }

    /// Returns the number of records held in memory.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.nodes.len()
    }

    /// Consumes one line and returns any top-level objects it completed.
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ReconstructError::InvalidJson`] for a malformed line,
    /// [`ReconstructError::InvalidParentReference`] when `__parentId` is not a
    /// string, number or `null`, [`ReconstructError::OrphanRecord`] when the
    /// parent is unknown and [`ReconstructError::UnknownCollection`] when the
    /// parent's shape has no collection for the record.
    pub fn push_line(&mut self, line: &[u8]) -> Result<Vec<Value>, ReconstructError> {
        self.line += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let record = FlatRecord::parse(line).map_err(|source| ReconstructError::InvalidJson {
            line: self.line,
            source,
        })?;

        let Some(reference) = record.parent_reference().cloned() else {
            let completed = match self.policy {
                FinalizePolicy::OnNextTopLevel => self.drain(),
                FinalizePolicy::AtEnd => Vec::new(),
            };
            let node = self.insert(record, self.shape);
            self.roots.push(node);
            return Ok(completed);
        };

        let Some(parent_id) = reference_key(&reference) else {
            return Err(ReconstructError::InvalidParentReference {
                line: self.line,
                reference,
            });
        };

        let Some(&parent) = self.index.get(&parent_id) else {
            return Err(ReconstructError::OrphanRecord {
                line: self.line,
                id: record.id(),
                parent_id,
            });
        };

        let parent_shape = self.nodes[parent].shape;
        let Some(slot) = parent_shape.route(&record) else {
            return Err(ReconstructError::UnknownCollection {
                line: self.line,
                parent_id,
                child_type: record.type_name().map(str::to_string),
            });
        };

        let node = self.insert(record, &parent_shape.collections[slot].shape);
        self.nodes[parent].children[slot].push(node);
        Ok(Vec::new())
    }

    /// Returns every top-level object not yet emitted.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` mirrors [`push_line`](Self::push_line).
    pub fn finish(mut self) -> Result<Vec<Value>, ReconstructError> {
        Ok(self.drain())
    }

    fn insert(&mut self, record: FlatRecord, shape: &'a BulkShape) -> usize {
        let id = record.id();
        let position = self.nodes.len();
        self.nodes.push(Node {
            fields: record.into_fields(),
            shape,
            children: vec![Vec::new(); shape.collections.len()],
        });
        if let Some(id) = id {
            self.index.insert(id, position);
        }
        position
    }

    fn drain(&mut self) -> Vec<Value> {
        let roots = std::mem::take(&mut self.roots);
        let values = roots.into_iter().map(|root| self.build(root)).collect();
        self.nodes.clear();
        self.index.clear();
        values
    }

    fn build(&mut self, position: usize) -> Value {
        let node = &mut self.nodes[position];
        let mut fields = std::mem::take(&mut node.fields);
        let children = std::mem::take(&mut node.children);
        let shape = node.shape;

        for (collection, members) in shape.collections.iter().zip(children) {
            let items = members.into_iter().map(|child| self.build(child)).collect();
            fields.insert(collection.field.clone(), Value::Array(items));
        }
        Value::Object(fields)
    }
}

/// Reconstructs and decodes every top-level object of a result file.
///
/// # Errors
///
/// Returns [`ReconstructError`] for malformed or out-of-order input, a read
/// failure (reported as [`ReconstructError::InvalidJson`]), or an object that
/// does not decode into `T`.
pub fn reconstruct<T, R>(reader: R, shape: &BulkShape) -> Result<Vec<T>, ReconstructError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut reconstructor = Reconstructor::new(shape);
    let mut output = Vec::new();
    for (number, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|error| ReconstructError::InvalidJson {
            line: number + 1,
            source: serde_json::Error::io(error),
        })?;
        for value in reconstructor.push_line(&line)? {
            output.push(decode(value)?);
        }
    }
    for value in reconstructor.finish()? {
        output.push(decode(value)?);
    }
    Ok(output)
}

/// Decodes one reconstructed object.
///
/// # Errors
///
/// Returns [`ReconstructError::Decode`] if `value` does not fit `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ReconstructError> {
    serde_json::from_value(value).map_err(ReconstructError::Decode)
}
