//! # Heap Domain Types
//!
//! Shapes of the results returned by the instrumentation agent's heap
//! commands. The agent builds these per call; nothing here is persisted.
//!
//! ## Key Types
//!
//! - [`HeapObjectSummary`] - One live instance found by a class search
//! - [`IvarDump`] / [`IvarValue`] - Instance-variable snapshot of one object
//! - [`MethodList`] / [`MethodSignature`] - Methods implemented by an object's class
//!
//! Pointers are opaque strings owned by the agent. They are never parsed or
//! validated on this side.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// HeapObjectSummary
// ============================================================================

/// A live instance located on the heap by `iosHeapPrintLiveInstances`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapObjectSummary {
    /// Runtime class of the instance
    pub class_name: String,

    /// Pointer to the instance, e.g. `"0x600001130660"`
    pub handle: String,

    /// Ivar map as reported by the agent; only its size is shown
    #[serde(default)]
    pub ivars: Value,

    /// Object kind reported by the runtime (`"instance"`, `"meta"`, ...)
    #[serde(default)]
    pub kind: String,

    /// Method signatures of the instance's class
    #[serde(default)]
    pub methods: Vec<String>,

    /// Superclass name, absent for root classes
    #[serde(default)]
    pub super_class: Option<String>,
}

impl HeapObjectSummary {
    /// Number of instance variables, counting either map keys or list items.
    pub fn ivar_count(&self) -> usize {
        match &self.ivars {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        }
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn super_class_name(&self) -> &str {
        self.super_class.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Ivars
// ============================================================================

/// The value of a single instance variable.
///
/// The agent reports object-typed ivars as `{ className, pointer, value }`
/// descriptors and everything else as plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum IvarValue {
    Scalar(Value),
    Reference {
        class_name: String,
        pointer: String,
        /// Description of the referenced object, when the agent provides one
        value: Option<Value>,
    },
}

impl IvarValue {
    /// The value shown in the main column: the scalar itself or the
    /// reference's embedded value.
    pub fn display_value(&self) -> Option<&Value> {
        match self {
            IvarValue::Scalar(v) => Some(v),
            IvarValue::Reference { value, .. } => value.as_ref(),
        }
    }

    /// `<ClassName:pointer>` for references, `None` for scalars.
    pub fn annotation(&self) -> Option<String> {
        match self {
            IvarValue::Scalar(_) => None,
            IvarValue::Reference {
                class_name,
                pointer,
                ..
            } => Some(format!("<{}:{}>", class_name, pointer)),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, IvarValue::Reference { .. })
    }
}

impl From<Value> for IvarValue {
    fn from(value: Value) -> Self {
        if let Value::Object(map) = &value {
            if let (Some(class_name), Some(pointer)) = (map.get("className"), map.get("pointer"))
            {
                return IvarValue::Reference {
                    class_name: plain_string(class_name),
                    pointer: plain_string(pointer),
                    value: map.get("value").cloned(),
                };
            }
        }
        IvarValue::Scalar(value)
    }
}

/// Strings as-is, anything else through its JSON text.
fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of `iosHeapPrintIvars`: `[className, { ivar: value, ... }]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, Map<String, Value>)")]
pub struct IvarDump {
    pub class_name: String,
    /// Ivars in the order the agent reported them
    pub ivars: Vec<(String, IvarValue)>,
}

impl From<(String, Map<String, Value>)> for IvarDump {
    fn from((class_name, map): (String, Map<String, Value>)) -> Self {
        Self {
            class_name,
            ivars: map
                .into_iter()
                .map(|(name, value)| (name, IvarValue::from(value)))
                .collect(),
        }
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Whether a selector or signature names a method that takes arguments.
///
/// A colon is the only marker the runtime gives us.
pub fn takes_arguments(selector: &str) -> bool {
    selector.contains(':')
}

/// Result of `iosHeapPrintMethods`: `[className, [signature, ...]]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, Vec<String>)")]
pub struct MethodList {
    pub class_name: String,
    pub signatures: Vec<String>,
}

impl From<(String, Vec<String>)> for MethodList {
    fn from((class_name, signatures): (String, Vec<String>)) -> Self {
        Self {
            class_name,
            signatures,
        }
    }
}

impl MethodList {
    /// Drop every signature that takes arguments.
    pub fn without_arguments(mut self) -> Self {
        self.signatures.retain(|sig| !takes_arguments(sig));
        self
    }

    /// Parse every signature.
    pub fn parsed(&self) -> impl Iterator<Item = MethodSignature> + '_ {
        self.signatures.iter().map(|s| MethodSignature::parse(s))
    }
}

/// A method signature split into its method type and selector body.
///
/// Signatures look like `"- viewDidLoad"` or `"+ alloc"`; the leading token
/// is `-` for instance methods and `+` for class methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub raw: String,
    pub kind: String,
    /// Second whitespace-delimited token, if the signature has one
    pub selector: Option<String>,
}

impl MethodSignature {
    pub fn parse(raw: &str) -> Self {
        let mut tokens = raw.split(' ');
        let kind = tokens.next().unwrap_or_default().to_string();
        let selector = tokens.next().map(str::to_string);

        Self {
            raw: raw.to_string(),
            kind,
            selector,
        }
    }

    /// `"<type> [<ClassName> <selector>]"`, or `None` when the signature has
    /// no selector token.
    pub fn full_form(&self, class_name: &str) -> Option<String> {
        self.selector
            .as_ref()
            .map(|selector| format!("{} [{} {}]", self.kind, class_name, selector))
    }

    pub fn takes_arguments(&self) -> bool {
        takes_arguments(&self.raw)
    }
}
