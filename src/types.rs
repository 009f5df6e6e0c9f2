//! Interface type interning
//!
//! Every distinct schema shape maps to exactly one long-lived
//! [`InterfaceType`] handle for the life of the process. Sockets compare and
//! label their types through these handles, so deduplication must be exact:
//! the interning key is the SHA256 checksum of the schema's JSON
//! serialization (see [`Checksum`]). The registry is an explicit service
//! owned by the embedding application, not ambient global state; editors
//! that need to hear about newly synthesized types subscribe with an
//! explicit [`SubscriberId`] and unsubscribe when discarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::checksum::Checksum;
use crate::error::{Result, ToolGraphError};
use crate::schema::name::type_name_of;

/// How an interface type was formed. List and dictionary composites keep a
/// handle to their element type so convertibility to the `unknown`-element
/// supertype can be checked structurally.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Plain,
    List(Arc<InterfaceType>),
    StringDict(Arc<InterfaceType>),
}

/// A named, identity-comparable handle for one resolved concrete type.
#[derive(Debug, Clone)]
pub struct InterfaceType {
    name: String,
    schema: Value,
    kind: TypeKind,
}

impl InterfaceType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Whether a value of this type may flow into a socket of type `target`.
    ///
    /// Interning guarantees one handle per shape, so same-name means
    /// same-type. Beyond identity, everything converts to `unknown`, and the
    /// composite families convert to their `unknown`-element supertypes
    /// (`list[T]` → `list[unknown]`, `stringDict[T]` → `stringDict[unknown]`).
    pub fn converts_to(&self, target: &InterfaceType) -> bool {
        if self.name == target.name || target.name == "unknown" {
            return true;
        }
        match (&self.kind, &target.kind) {
            (TypeKind::List(_), TypeKind::List(element)) => element.name == "unknown",
            (TypeKind::StringDict(_), TypeKind::StringDict(value)) => value.name == "unknown",
            _ => false,
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Token returned by [`TypeRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&Arc<InterfaceType>)>;

/// Process-wide interning service for interface types.
///
/// Mutated only from single-threaded event dispatch, so no interior locking.
/// Types are never evicted: the set of tool schemas is finite and registered
/// at startup, and resolution can only produce shapes derived from them.
pub struct TypeRegistry {
    interned: HashMap<Checksum, Arc<InterfaceType>>,
    by_name: HashMap<String, Arc<InterfaceType>>,
    lists: HashMap<String, Arc<InterfaceType>>,
    dicts: HashMap<String, Arc<InterfaceType>>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: u64,
    unknown: Arc<InterfaceType>,
    never: Arc<InterfaceType>,
}

impl TypeRegistry {
    /// Creates a registry pre-seeded with the core types every graph needs:
    /// `unknown`, `never`, the JSON primitives, and the `unknown`-element
    /// composites.
    pub fn new() -> Self {
        let unknown = Arc::new(InterfaceType {
            name: "unknown".to_string(),
            schema: json!(true),
            kind: TypeKind::Plain,
        });
        let never = Arc::new(InterfaceType {
            name: "never".to_string(),
            schema: json!(false),
            kind: TypeKind::Plain,
        });
        let mut registry = Self {
            interned: HashMap::new(),
            by_name: HashMap::new(),
            lists: HashMap::new(),
            dicts: HashMap::new(),
            subscribers: Vec::new(),
            next_subscriber: 0,
            unknown: unknown.clone(),
            never: never.clone(),
        };
        registry.seed(unknown);
        registry.seed(never);
        for primitive in ["string", "number", "integer", "boolean", "null"] {
            registry.seed(Arc::new(InterfaceType {
                name: primitive.to_string(),
                schema: json!({ "type": primitive }),
                kind: TypeKind::Plain,
            }));
        }
        let unknown = registry.unknown();
        registry.list_of(&unknown);
        registry.dict_of(&unknown);
        registry
    }

    fn seed(&mut self, ty: Arc<InterfaceType>) {
        self.interned
            .insert(Checksum::from_json(&ty.schema), ty.clone());
        self.by_name.insert(ty.name.clone(), ty);
    }

    /// The top type; the fallback for sockets whose schema is still generic.
    pub fn unknown(&self) -> Arc<InterfaceType> {
        self.unknown.clone()
    }

    /// The bottom type (`false` schema).
    pub fn never(&self) -> Arc<InterfaceType> {
        self.never.clone()
    }

    /// Looks a type up by its canonical name.
    pub fn get(&self, name: &str) -> Option<Arc<InterfaceType>> {
        self.by_name.get(name).cloned()
    }

    /// Every currently interned type, in no particular order.
    pub fn all(&self) -> Vec<Arc<InterfaceType>> {
        self.by_name.values().cloned().collect()
    }

    /// Returns the interface type for a schema shape, creating and interning
    /// it on first sight.
    ///
    /// Array schemas with a single (non-tuple) item schema and object
    /// schemas with only `additionalProperties` come back as the `list[T]` /
    /// `stringDict[T]` composites of their element's type, unless an
    /// explicit `title` claims a standalone name for them. Unconstrained and
    /// `false` schemas fold into the seeded `unknown` / `never` handles
    /// regardless of spelling (`true`, `{}`, and
    /// `{ "description": ... }` all denote the top type).
    pub fn upsert(&mut self, schema: &Value) -> Result<Arc<InterfaceType>> {
        let key = Checksum::from_json(schema);
        if let Some(existing) = self.interned.get(&key) {
            return Ok(existing.clone());
        }

        let name = type_name_of(schema).ok_or_else(|| ToolGraphError::MissingTypeName {
            context: "interface type interning".to_string(),
            schema: schema.to_string(),
        })?;
        if name == "unknown" || name == "never" {
            let seeded = if name == "unknown" {
                self.unknown()
            } else {
                self.never()
            };
            self.interned.insert(key, seeded.clone());
            return Ok(seeded);
        }

        let untitled = schema.get("title").is_none();
        if untitled {
            if let Some(composite) = self.upsert_composite(schema)? {
                self.interned.insert(key, composite.clone());
                return Ok(composite);
            }
        }

        if let Some(existing) = self.by_name.get(&name) {
            if existing.schema != *schema {
                return Err(ToolGraphError::CoreTypeConflict { name });
            }
            // Serialization order differed but the shape is the same type.
            self.interned.insert(key, existing.clone());
            return Ok(existing.clone());
        }

        let ty = Arc::new(InterfaceType {
            name: name.clone(),
            schema: schema.clone(),
            kind: TypeKind::Plain,
        });
        debug!(type_name = %name, "interned new interface type");
        self.interned.insert(key, ty.clone());
        self.by_name.insert(name, ty.clone());
        self.notify(&ty);
        Ok(ty)
    }

    fn upsert_composite(&mut self, schema: &Value) -> Result<Option<Arc<InterfaceType>>> {
        let type_tag = schema.get("type").and_then(Value::as_str);
        if type_tag == Some("array") {
            if let Some(items) = schema.get("items") {
                if !items.is_array() {
                    let element = self.upsert_or_unknown(items)?;
                    return Ok(Some(self.list_of(&element)));
                }
            }
        }
        if type_tag == Some("object") {
            let has_fixed_properties = schema
                .get("properties")
                .and_then(Value::as_object)
                .is_some_and(|p| !p.is_empty());
            if !has_fixed_properties {
                if let Some(values) = schema.get("additionalProperties") {
                    let value_type = self.upsert_or_unknown(values)?;
                    return Ok(Some(self.dict_of(&value_type)));
                }
            }
        }
        Ok(None)
    }

    fn upsert_or_unknown(&mut self, schema: &Value) -> Result<Arc<InterfaceType>> {
        match self.upsert(schema) {
            Ok(ty) => Ok(ty),
            Err(ToolGraphError::MissingTypeName { .. }) => Ok(self.unknown()),
            Err(other) => Err(other),
        }
    }

    /// The `list[T]` composite for an element type, cached by the element's
    /// identity.
    pub fn list_of(&mut self, element: &Arc<InterfaceType>) -> Arc<InterfaceType> {
        if let Some(existing) = self.lists.get(element.name()) {
            return existing.clone();
        }
        let ty = Arc::new(InterfaceType {
            name: format!("list[{}]", element.name()),
            schema: json!({ "type": "array", "items": element.schema().clone() }),
            kind: TypeKind::List(element.clone()),
        });
        self.lists.insert(element.name().to_string(), ty.clone());
        self.interned
            .insert(Checksum::from_json(&ty.schema), ty.clone());
        self.by_name.insert(ty.name.clone(), ty.clone());
        self.notify(&ty);
        ty
    }

    /// The `stringDict[T]` composite for a value type, cached by the value
    /// type's identity.
    pub fn dict_of(&mut self, value: &Arc<InterfaceType>) -> Arc<InterfaceType> {
        if let Some(existing) = self.dicts.get(value.name()) {
            return existing.clone();
        }
        let ty = Arc::new(InterfaceType {
            name: format!("stringDict[{}]", value.name()),
            schema: json!({ "type": "object", "additionalProperties": value.schema().clone() }),
            kind: TypeKind::StringDict(value.clone()),
        });
        self.dicts.insert(value.name().to_string(), ty.clone());
        self.interned
            .insert(Checksum::from_json(&ty.schema), ty.clone());
        self.by_name.insert(ty.name.clone(), ty.clone());
        self.notify(&ty);
        ty
    }

    /// Registers a callback invoked for every type interned after this
    /// point. Callers must [`unsubscribe`](Self::unsubscribe) when the
    /// listening editor is discarded.
    pub fn subscribe(&mut self, callback: Subscriber) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, callback));
        id
    }

    /// Removes a previously registered subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(existing, _)| *existing != id);
    }

    fn notify(&mut self, ty: &Arc<InterfaceType>) {
        for (_, callback) in &mut self.subscribers {
            callback(ty);
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.by_name.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
