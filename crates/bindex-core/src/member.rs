//! Member descriptors: the unified shape behind fields, properties,
//! methods, and events.
//!
//! A [`MemberDescriptor`] couples a signature (declaring type, value/return
//! shape, parameters, generic parameters) with the capabilities the host
//! supplied at registration: get, set, invoke, observe. Descriptors are
//! resolved, not owned, by callers — the resolution engine caches them as
//! `Arc`s for the process lifetime.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::data_type::DataType;
use crate::error::EvalError;
use crate::metadata::Metadata;
use crate::type_hash::TypeHash;
use crate::value::Value;

bitflags! {
    /// Access-flag constraints on member resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberFlags: u16 {
        const STATIC = 1 << 0;
        const INSTANCE = 1 << 1;
        const PUBLIC = 1 << 2;
        const NON_PUBLIC = 1 << 3;
        /// Registered at runtime outside the type's own declaration.
        const ATTACHED = 1 << 4;
        /// Resolved against the runtime type at invocation time.
        const DYNAMIC = 1 << 5;
        /// A free function taking the receiver as its first parameter.
        const EXTENSION = 1 << 6;
    }
}

impl MemberFlags {
    /// The default request: any public member however it was declared.
    pub fn all_access() -> Self {
        MemberFlags::STATIC
            | MemberFlags::INSTANCE
            | MemberFlags::PUBLIC
            | MemberFlags::ATTACHED
            | MemberFlags::DYNAMIC
            | MemberFlags::EXTENSION
    }

    /// A plain public instance member.
    pub fn instance_public() -> Self {
        MemberFlags::INSTANCE | MemberFlags::PUBLIC
    }

    /// Whether a candidate with `candidate` flags satisfies this request.
    ///
    /// Every flag set on the candidate must be permitted by the request.
    pub fn permits(&self, candidate: MemberFlags) -> bool {
        self.contains(candidate)
    }
}

bitflags! {
    /// Which member kinds a resolution request will accept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemberKinds: u8 {
        const FIELD = 1 << 0;
        const PROPERTY = 1 << 1;
        const METHOD = 1 << 2;
        const EVENT = 1 << 3;
    }
}

impl MemberKinds {
    /// Field-or-property, the usual shape for `.Name` access.
    pub fn accessor() -> Self {
        MemberKinds::FIELD | MemberKinds::PROPERTY
    }
}

/// The concrete kind of a resolved member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Event,
}

impl MemberKind {
    /// The request-kind bit this member satisfies.
    pub fn as_kinds(self) -> MemberKinds {
        match self {
            MemberKind::Field => MemberKinds::FIELD,
            MemberKind::Property => MemberKinds::PROPERTY,
            MemberKind::Method => MemberKinds::METHOD,
            MemberKind::Event => MemberKinds::EVENT,
        }
    }
}

/// A declared parameter of a method or indexer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamInfo {
    pub name: String,
    pub ty: DataType,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A constraint on a generic method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericConstraint {
    None,
    /// Only reference types satisfy the parameter.
    Reference,
    /// Only value types satisfy the parameter.
    ValueType,
    /// Only the named type (or the unknown `object`) satisfies it.
    Base(TypeHash),
}

/// A generic parameter declared on a method.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub constraint: GenericConstraint,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: GenericConstraint::None,
        }
    }

    pub fn constrained(name: impl Into<String>, constraint: GenericConstraint) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }
}

/// Read capability: `(receiver, metadata) -> value`.
pub type Getter = Arc<dyn Fn(&Value, &Metadata) -> Result<Value, EvalError> + Send + Sync>;
/// Write capability: `(receiver, value, metadata)`.
pub type Setter = Arc<dyn Fn(&Value, Value, &Metadata) -> Result<(), EvalError> + Send + Sync>;
/// Invoke capability: `(receiver, args, metadata) -> value`.
pub type Invoker = Arc<dyn Fn(&Value, &[Value], &Metadata) -> Result<Value, EvalError> + Send + Sync>;
/// Change listener handed to an observe capability.
pub type ValueListener = Arc<dyn Fn(&Value) + Send + Sync>;
/// Observe capability: `(receiver, listener) -> subscription`.
pub type Observer =
    Arc<dyn Fn(&Value, ValueListener) -> Result<Subscription, EvalError> + Send + Sync>;

/// Handle returned by an observe capability; dropping does not
/// unsubscribe, calling [`Subscription::unsubscribe`] does.
#[derive(Clone)]
pub struct Subscription(Arc<dyn Fn() + Send + Sync>);

impl Subscription {
    pub fn new(unsubscribe: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(unsubscribe))
    }

    pub fn unsubscribe(&self) {
        (self.0)()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}

/// A resolved handle to a field, property, method, or event.
#[derive(Clone)]
pub struct MemberDescriptor {
    pub name: String,
    pub declaring_type: TypeHash,
    pub kind: MemberKind,
    pub flags: MemberFlags,
    /// Field/property type, or method return type.
    pub value_type: DataType,
    /// Method/indexer parameters; empty for fields, properties, events.
    /// For extension methods the receiver is *not* included here.
    pub params: Vec<ParamInfo>,
    /// Generic parameters awaiting inference; empty for non-generic members.
    pub generic_params: Vec<GenericParam>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    invoker: Option<Invoker>,
    observer: Option<Observer>,
}

impl MemberDescriptor {
    /// A readable (and optionally writable) field.
    pub fn field(
        name: impl Into<String>,
        declaring_type: TypeHash,
        ty: DataType,
        getter: Getter,
        setter: Option<Setter>,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            kind: MemberKind::Field,
            flags: MemberFlags::instance_public(),
            value_type: ty,
            params: Vec::new(),
            generic_params: Vec::new(),
            getter: Some(getter),
            setter,
            invoker: None,
            observer: None,
        }
    }

    /// A property with get/set/observe capabilities.
    pub fn property(
        name: impl Into<String>,
        declaring_type: TypeHash,
        ty: DataType,
        getter: Getter,
        setter: Option<Setter>,
    ) -> Self {
        Self {
            kind: MemberKind::Property,
            ..Self::field(name, declaring_type, ty, getter, setter)
        }
    }

    /// A method (or indexer accessor) with an invoke capability.
    pub fn method(
        name: impl Into<String>,
        declaring_type: TypeHash,
        return_type: DataType,
        params: Vec<ParamInfo>,
        invoker: Invoker,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            kind: MemberKind::Method,
            flags: MemberFlags::instance_public(),
            value_type: return_type,
            params,
            generic_params: Vec::new(),
            getter: None,
            setter: None,
            invoker: Some(invoker),
            observer: None,
        }
    }

    /// An event with an observe capability.
    pub fn event(name: impl Into<String>, declaring_type: TypeHash, observer: Observer) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            kind: MemberKind::Event,
            flags: MemberFlags::instance_public(),
            value_type: DataType::Void,
            params: Vec::new(),
            generic_params: Vec::new(),
            getter: None,
            setter: None,
            invoker: None,
            observer: Some(observer),
        }
    }

    /// Override the access flags.
    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Declare generic parameters on a method.
    pub fn with_generics(mut self, generics: Vec<GenericParam>) -> Self {
        self.generic_params = generics;
        self
    }

    /// Attach an observe capability to a field/property.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn can_get(&self) -> bool {
        self.getter.is_some()
    }

    pub fn can_set(&self) -> bool {
        self.setter.is_some()
    }

    pub fn can_invoke(&self) -> bool {
        self.invoker.is_some()
    }

    pub fn can_observe(&self) -> bool {
        self.observer.is_some()
    }

    /// Read the member value from a receiver.
    pub fn get(&self, receiver: &Value, metadata: &Metadata) -> Result<Value, EvalError> {
        match &self.getter {
            Some(getter) => getter(receiver, metadata),
            None => Err(EvalError::MissingCapability {
                member: self.name.clone(),
                capability: "get",
            }),
        }
    }

    /// Write the member value on a receiver.
    pub fn set(&self, receiver: &Value, value: Value, metadata: &Metadata) -> Result<(), EvalError> {
        match &self.setter {
            Some(setter) => setter(receiver, value, metadata),
            None => Err(EvalError::MissingCapability {
                member: self.name.clone(),
                capability: "set",
            }),
        }
    }

    /// Invoke the member on a receiver.
    pub fn invoke(
        &self,
        receiver: &Value,
        args: &[Value],
        metadata: &Metadata,
    ) -> Result<Value, EvalError> {
        match &self.invoker {
            Some(invoker) => invoker(receiver, args, metadata),
            None => Err(EvalError::MissingCapability {
                member: self.name.clone(),
                capability: "invoke",
            }),
        }
    }

    /// Subscribe to change notifications.
    pub fn observe(
        &self,
        receiver: &Value,
        listener: ValueListener,
    ) -> Result<Subscription, EvalError> {
        match &self.observer {
            Some(observer) => observer(receiver, listener),
            None => Err(EvalError::MissingCapability {
                member: self.name.clone(),
                capability: "observe",
            }),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("value_type", &self.value_type)
            .field("params", &self.params)
            .field("generic_params", &self.generic_params)
            .finish_non_exhaustive()
    }
}

/// A resolution request: type + kind set + flag constraints + name.
///
/// Doubles as the resolution-cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRequest {
    pub ty: TypeHash,
    pub kinds: MemberKinds,
    pub flags: MemberFlags,
    pub name: String,
}

impl MemberRequest {
    pub fn new(
        ty: TypeHash,
        kinds: MemberKinds,
        flags: MemberFlags,
        name: impl Into<String>,
    ) -> Self {
        Self {
            ty,
            kinds,
            flags,
            name: name.into(),
        }
    }

    /// Whether a candidate satisfies this request's kind and flag
    /// constraints.
    pub fn accepts(&self, candidate: &MemberDescriptor) -> bool {
        self.kinds.intersects(candidate.kind.as_kinds()) && self.flags.permits(candidate.flags)
    }
}
