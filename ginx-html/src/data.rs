//! Render data with named fields and named methods.
//!
//! Plain render data is any `serde::Serialize` value; templates read its
//! fields by name when the template runs. [`DataBinding`] adds methods on
//! top: callables looked up by name at execution time, so a page object can
//! expose behaviour as well as fields.
//!
//! ```rust
//! use ginx_html::{DataBinding, Engine};
//! use minijinja::value::{from_args, Value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Page { title: String }
//!
//! let mut engine = Engine::new();
//! engine.add_template("page", "{{ title }}: {{ add(1, 2) }}").unwrap();
//!
//! let data = DataBinding::new(&Page { title: "Sum".into() })
//!     .method("add", |args| {
//!         let (a, b): (i64, i64) = from_args(args)?;
//!         Ok(Value::from(a + b))
//!     });
//! assert_eq!(engine.render_to_string("page", data).unwrap(), "Sum: 3");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr, Value, ValueKind};
use minijinja::{Error, ErrorKind, State};
use serde::{Serialize, Serializer};

type MethodFn = dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync;

/// Field and method accessors for one render call.
#[derive(Clone)]
pub struct DataBinding {
    fields: Value,
    methods: BTreeMap<String, Arc<MethodFn>>,
}

impl DataBinding {
    /// Bind the serialized form of `data` as the field set.
    pub fn new<S: Serialize + ?Sized>(data: &S) -> Self {
        DataBinding {
            fields: Value::from_serialize(data),
            methods: BTreeMap::new(),
        }
    }

    /// Register a method callable from templates as `name(...)`.
    ///
    /// An `Err` aborts the render that made the call.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Field value by name, if the bound data has it.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .get_attr(name)
            .ok()
            .filter(|v| !v.is_undefined())
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Wrap as a template value.
    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }
}

impl From<DataBinding> for Value {
    fn from(binding: DataBinding) -> Self {
        binding.into_value()
    }
}

/// Serializes as an object handle, so a binding can be passed straight to
/// [`Engine::render`](crate::Engine::render) without losing its methods.
impl Serialize for DataBinding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Value::from_object(self.clone()).serialize(serializer)
    }
}

impl fmt::Debug for DataBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBinding")
            .field("fields", &self.fields)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Object for DataBinding {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let name = key.as_str()?;
        if let Some(value) = self.field(name) {
            return Some(value);
        }
        self.methods.get(name).map(|f| {
            Value::from_object(BoundMethod {
                name: name.to_string(),
                f: Arc::clone(f),
            })
        })
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        if self.fields.kind() != ValueKind::Map {
            return Enumerator::Empty;
        }
        match self.fields.try_iter() {
            Ok(keys) => Enumerator::Values(keys.collect()),
            Err(_) => Enumerator::Empty,
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match self.methods.get(method) {
            Some(f) => f(args),
            None => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("render data has no method {method:?}"),
            )),
        }
    }
}

/// A method looked up as a value (`{{ add(1, 2) }}` at the top level).
struct BoundMethod {
    name: String,
    f: Arc<MethodFn>,
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<method {}>", self.name)
    }
}

impl Object for BoundMethod {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, _state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        (self.f)(args)
    }
}
