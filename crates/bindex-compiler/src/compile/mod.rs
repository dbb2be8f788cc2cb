//! Expression compilation: AST plus delegate shape in, invocable
//! accessor out.
//!
//! A compiled accessor is a closure over the runtime argument slice.
//! Receivers with a concrete static type resolve their members at
//! compile time; an `Object`-typed receiver defers resolution to
//! invocation and memoizes per runtime type inside the closure.
//! Accessors are cached per (node identity, shape hash); the cache
//! keeps the node alive so its identity cannot be reused.

pub mod ops;

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, RwLock};

use rustc_hash::{FxHashMap, FxHasher};

use bindex_core::data_type::DataType;
use bindex_core::error::{CompileError, EvalError};
use bindex_core::member::{MemberDescriptor, MemberFlags, MemberKinds, MemberRequest};
use bindex_core::metadata::Metadata;
use bindex_core::type_hash::{TypeHash, primitives};
use bindex_core::value::{Delegate, Value};
use bindex_parser::ast::{BinaryExpr, ExprNode};
use bindex_registry::{MemberRegistry, MemberResolver};

use crate::conversion::convert_value;
use crate::overload::resolve_overload;
use ops::{apply_binary, apply_unary, binary_result_type, unary_result_type};

/// An invocable compiled expression. Arguments arrive positionally,
/// laid out per the [`DelegateShape`] the expression was compiled for.
pub type CompiledAccessor =
    Arc<dyn Fn(&Metadata, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// One argument slot of a delegate shape: an optional binding name and
/// a static type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentInfo {
    pub name: Option<String>,
    pub ty: DataType,
}

impl ArgumentInfo {
    pub fn named(name: impl Into<String>, ty: DataType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    pub fn unnamed(ty: DataType) -> Self {
        Self { name: None, ty }
    }
}

/// The invocation signature an expression is compiled against.
///
/// Unqualified identifiers bind to named slots; the first slot is the
/// implicit receiver for identifiers that bind to nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateShape {
    pub args: Vec<ArgumentInfo>,
    pub return_type: DataType,
}

impl DelegateShape {
    pub fn new(args: Vec<ArgumentInfo>, return_type: DataType) -> Self {
        Self { args, return_type }
    }

    /// Shape with `count` untyped positional slots.
    pub fn untyped(count: usize) -> Self {
        Self {
            args: vec![ArgumentInfo::unnamed(DataType::Object); count],
            return_type: DataType::Object,
        }
    }

    fn shape_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Lexical environment during compilation: the delegate shape plus any
/// lambda formals in scope, each mapped to an argument slot.
struct Scope<'c> {
    shape: &'c DelegateShape,
    formals: Vec<(String, usize)>,
    total_slots: usize,
}

impl<'c> Scope<'c> {
    fn root(shape: &'c DelegateShape) -> Self {
        Self {
            shape,
            formals: Vec::new(),
            total_slots: shape.args.len(),
        }
    }

    fn with_formals(&self, names: &[String]) -> Scope<'c> {
        let mut formals = self.formals.clone();
        let mut total = self.total_slots;
        for name in names {
            formals.push((name.clone(), total));
            total += 1;
        }
        Scope {
            shape: self.shape,
            formals,
            total_slots: total,
        }
    }

    fn with_extra_slot(&self) -> (Scope<'c>, usize) {
        let slot = self.total_slots;
        let scope = Scope {
            shape: self.shape,
            formals: self.formals.clone(),
            total_slots: slot + 1,
        };
        (scope, slot)
    }

    /// Innermost lambda formal first, then named shape arguments.
    fn lookup(&self, name: &str) -> Option<(usize, DataType)> {
        for (formal, slot) in self.formals.iter().rev() {
            if formal == name {
                return Some((*slot, DataType::Object));
            }
        }
        self.shape
            .args
            .iter()
            .enumerate()
            .find(|(_, arg)| arg.name.as_deref() == Some(name))
            .map(|(slot, arg)| (slot, arg.ty.clone()))
    }
}

/// A `?.` receiver threaded through the right-hand access spine as an
/// extra trailing argument slot.
#[derive(Clone)]
struct ImplicitSlot {
    slot: usize,
    ty: DataType,
}

struct CacheEntry {
    // Keeps the node's allocation alive so its identity stays unique
    // for the lifetime of the cache entry.
    _node: ExprNode,
    accessor: CompiledAccessor,
}

/// Compiles expression nodes into accessors.
///
/// Holds the member resolver, the registry (for explicit generic
/// argument names), compile-time resources, and the accessor cache.
pub struct ExpressionCompiler {
    resolver: Arc<MemberResolver>,
    registry: Arc<MemberRegistry>,
    resources: Arc<RwLock<FxHashMap<String, Value>>>,
    cache: Mutex<FxHashMap<(usize, u64), CacheEntry>>,
}

impl ExpressionCompiler {
    pub fn new(resolver: Arc<MemberResolver>, registry: Arc<MemberRegistry>) -> Self {
        Self {
            resolver,
            registry,
            resources: Arc::new(RwLock::new(FxHashMap::default())),
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Register a named resource for `$Name` and `$$Name` macros.
    pub fn register_resource(&self, name: impl Into<String>, value: Value) {
        self.resources.write().unwrap().insert(name.into(), value);
    }

    /// Compile `node` against `shape`. Repeat calls with the same node
    /// and shape return the identical cached accessor.
    pub fn compile(
        &self,
        node: &ExprNode,
        shape: &DelegateShape,
        metadata: &Metadata,
    ) -> Result<CompiledAccessor, CompileError> {
        let key = (node.node_id(), shape.shape_hash());
        if let Some(hit) = self.cache.lock().unwrap().get(&key) {
            return Ok(Arc::clone(&hit.accessor));
        }

        let scope = Scope::root(shape);
        let (accessor, _ty) = self.compile_node(node, &scope, metadata)?;

        let mut cache = self.cache.lock().unwrap();
        let entry = cache.entry(key).or_insert_with(|| CacheEntry {
            _node: node.clone(),
            accessor,
        });
        Ok(Arc::clone(&entry.accessor))
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }

    fn compile_node(
        &self,
        node: &ExprNode,
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        match node {
            ExprNode::Constant(c) => {
                let ty = c.value.data_type();
                let value = c.value.clone();
                let acc: CompiledAccessor = Arc::new(move |_, _| Ok(value.clone()));
                Ok((acc, ty))
            }
            ExprNode::Member(_) | ExprNode::MethodCall(_) | ExprNode::Index(_) => {
                self.compile_access(node, scope, metadata, None)
            }
            ExprNode::Binary(b) => match b.token.symbol {
                "?." => self.compile_null_conditional(b, scope, metadata),
                "??" => {
                    let (left, left_ty) = self.compile_node(&b.left, scope, metadata)?;
                    let (right, right_ty) = self.compile_node(&b.right, scope, metadata)?;
                    let ty = binary_result_type(&b.token, &left_ty, &right_ty);
                    let acc: CompiledAccessor = Arc::new(move |meta, args| {
                        let value = left(meta, args)?;
                        if value.is_null() {
                            right(meta, args)
                        } else {
                            Ok(value)
                        }
                    });
                    Ok((acc, ty))
                }
                "&&" | "||" => {
                    let (left, _) = self.compile_node(&b.left, scope, metadata)?;
                    let (right, _) = self.compile_node(&b.right, scope, metadata)?;
                    let is_and = b.token.symbol == "&&";
                    let acc: CompiledAccessor = Arc::new(move |meta, args| {
                        let first = left(meta, args)?.as_bool().ok_or(EvalError::NotBool)?;
                        if first != is_and {
                            // Short-circuit: false for &&, true for ||.
                            return Ok(Value::Bool(first));
                        }
                        let second = right(meta, args)?.as_bool().ok_or(EvalError::NotBool)?;
                        Ok(Value::Bool(second))
                    });
                    Ok((acc, DataType::concrete(primitives::BOOL)))
                }
                "=" => self.compile_assignment(b, scope, metadata),
                _ => {
                    let (left, left_ty) = self.compile_node(&b.left, scope, metadata)?;
                    let (right, right_ty) = self.compile_node(&b.right, scope, metadata)?;
                    let ty = binary_result_type(&b.token, &left_ty, &right_ty);
                    let token = b.token;
                    let acc: CompiledAccessor = Arc::new(move |meta, args| {
                        let l = left(meta, args)?;
                        let r = right(meta, args)?;
                        apply_binary(&token, &l, &r)
                    });
                    Ok((acc, ty))
                }
            },
            ExprNode::Unary(u) => match u.token.symbol {
                "$" => self.compile_dynamic_macro(&u.operand, scope, metadata),
                "$$" => self.compile_static_macro(&u.operand, scope, metadata),
                _ => {
                    let (operand, operand_ty) = self.compile_node(&u.operand, scope, metadata)?;
                    let ty = unary_result_type(&u.token, &operand_ty);
                    let token = u.token;
                    let acc: CompiledAccessor = Arc::new(move |meta, args| {
                        let value = operand(meta, args)?;
                        apply_unary(&token, &value)
                    });
                    Ok((acc, ty))
                }
            },
            ExprNode::Condition(c) => {
                let (condition, _) = self.compile_node(&c.condition, scope, metadata)?;
                let (if_true, true_ty) = self.compile_node(&c.if_true, scope, metadata)?;
                let (if_false, false_ty) = self.compile_node(&c.if_false, scope, metadata)?;
                let ty = if true_ty == false_ty {
                    true_ty
                } else {
                    DataType::Object
                };
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let chosen = condition(meta, args)?.as_bool().ok_or(EvalError::NotBool)?;
                    if chosen {
                        if_true(meta, args)
                    } else {
                        if_false(meta, args)
                    }
                });
                Ok((acc, ty))
            }
            ExprNode::Lambda(l) => {
                let child = scope.with_formals(&l.params);
                let (body, _body_ty) = self.compile_node(&l.body, &child, metadata)?;
                let arity = l.params.len();
                let acc: CompiledAccessor = Arc::new(move |_, args| {
                    let outer: Vec<Value> = args.to_vec();
                    let body = Arc::clone(&body);
                    let delegate = Delegate::new(
                        arity,
                        Arc::new(move |meta: &Metadata, lambda_args: &[Value]| {
                            let mut all = outer.clone();
                            all.extend_from_slice(lambda_args);
                            body(meta, &all)
                        }),
                    );
                    Ok(Value::delegate(delegate))
                });
                Ok((acc, DataType::concrete(primitives::DELEGATE)))
            }
        }
    }

    /// Member access, method call, or indexer, with an optional `?.`
    /// receiver flowing down the target chain.
    fn compile_access(
        &self,
        node: &ExprNode,
        scope: &Scope<'_>,
        metadata: &Metadata,
        implicit: Option<ImplicitSlot>,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        match node {
            ExprNode::Member(m) => {
                let (receiver, receiver_ty) = match &m.target {
                    Some(target) => self.compile_receiver(target, scope, metadata, implicit)?,
                    None => {
                        if let Some(imp) = implicit {
                            (arg_slot_accessor(imp.slot), imp.ty)
                        } else if let Some((slot, ty)) = scope.lookup(&m.name) {
                            // The bare name is the argument itself.
                            return Ok((arg_slot_accessor(slot), ty));
                        } else {
                            self.first_argument_receiver(&m.name, scope)?
                        }
                    }
                };
                self.compile_getter(receiver, receiver_ty, &m.name, metadata)
            }
            ExprNode::MethodCall(c) => {
                if c.target.is_none() && implicit.is_none() {
                    if let Some((slot, _)) = scope.lookup(&c.name) {
                        return self.compile_delegate_call(slot, &c.name, &c.args, scope, metadata);
                    }
                }
                let (receiver, receiver_ty) = match &c.target {
                    Some(target) => self.compile_receiver(target, scope, metadata, implicit)?,
                    None => match implicit {
                        Some(imp) => (arg_slot_accessor(imp.slot), imp.ty),
                        None => self.first_argument_receiver(&c.name, scope)?,
                    },
                };
                self.compile_invocation(
                    receiver,
                    receiver_ty,
                    &c.name,
                    &c.type_args,
                    &c.args,
                    scope,
                    metadata,
                )
            }
            ExprNode::Index(i) => {
                let (receiver, receiver_ty) = match &i.target {
                    Some(target) => self.compile_receiver(target, scope, metadata, implicit)?,
                    None => match implicit {
                        Some(imp) => (arg_slot_accessor(imp.slot), imp.ty),
                        None => self.first_argument_receiver("Item", scope)?,
                    },
                };
                // Indexers are `Item` methods on the receiver type.
                self.compile_invocation(
                    receiver,
                    receiver_ty,
                    "Item",
                    &[],
                    &i.args,
                    scope,
                    metadata,
                )
            }
            _ => self.compile_node(node, scope, metadata),
        }
    }

    fn compile_receiver(
        &self,
        target: &ExprNode,
        scope: &Scope<'_>,
        metadata: &Metadata,
        implicit: Option<ImplicitSlot>,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        match target {
            ExprNode::Member(_) | ExprNode::MethodCall(_) | ExprNode::Index(_) => {
                self.compile_access(target, scope, metadata, implicit)
            }
            _ => self.compile_node(target, scope, metadata),
        }
    }

    fn first_argument_receiver(
        &self,
        name: &str,
        scope: &Scope<'_>,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let Some(first) = scope.shape.args.first() else {
            return Err(CompileError::UnboundIdentifier(name.to_owned()));
        };
        Ok((arg_slot_accessor(0), first.ty.clone()))
    }

    fn compile_getter(
        &self,
        receiver: CompiledAccessor,
        receiver_ty: DataType,
        name: &str,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        match receiver_ty.type_hash() {
            Some(hash) => {
                let request = MemberRequest::new(
                    hash,
                    MemberKinds::accessor(),
                    MemberFlags::all_access(),
                    name,
                );
                let candidates = self.resolver.resolve(&request, metadata)?;
                let descriptor = pick_readable(&candidates);
                let value_type = descriptor.value_type.clone();
                let name = name.to_owned();
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    descriptor.get(&target, meta)
                });
                Ok((acc, value_type))
            }
            None => {
                let resolver = Arc::clone(&self.resolver);
                let name = name.to_owned();
                let memo: Mutex<FxHashMap<TypeHash, Arc<MemberDescriptor>>> =
                    Mutex::new(FxHashMap::default());
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    let hash = target.type_hash();
                    let descriptor = {
                        let mut memo = memo.lock().unwrap();
                        match memo.get(&hash) {
                            Some(found) => Arc::clone(found),
                            None => {
                                let request = MemberRequest::new(
                                    hash,
                                    MemberKinds::accessor(),
                                    MemberFlags::all_access(),
                                    name.clone(),
                                );
                                let candidates = resolver.resolve(&request, meta)?;
                                let found = pick_readable(&candidates);
                                memo.insert(hash, Arc::clone(&found));
                                found
                            }
                        }
                    };
                    descriptor.get(&target, meta)
                });
                Ok((acc, DataType::Object))
            }
        }
    }

    fn compile_invocation(
        &self,
        receiver: CompiledAccessor,
        receiver_ty: DataType,
        name: &str,
        type_args: &[String],
        args: &[ExprNode],
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let explicit: Vec<DataType> = type_args
            .iter()
            .map(|type_name| {
                self.registry
                    .resolve_type(type_name)
                    .map(DataType::Concrete)
                    .ok_or_else(|| CompileError::UnknownTypeName(type_name.clone()))
            })
            .collect::<Result<_, _>>()?;

        let mut arg_accessors = Vec::with_capacity(args.len());
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            let (acc, ty) = self.compile_node(arg, scope, metadata)?;
            arg_accessors.push(acc);
            arg_types.push(ty);
        }

        match receiver_ty.type_hash() {
            Some(hash) => {
                let request =
                    MemberRequest::new(hash, MemberKinds::METHOD, MemberFlags::all_access(), name);
                let candidates = self.resolver.resolve(&request, metadata)?;
                let chosen = resolve_overload(&candidates, &arg_types, &explicit, name, hash)?;
                let return_type = if chosen.return_type.contains_generic() {
                    DataType::Object
                } else {
                    chosen.return_type
                };
                let descriptor = chosen.descriptor;
                let params = chosen.params;
                let name = name.to_owned();
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    let call_args = evaluate_arguments(&arg_accessors, &params, meta, args)?;
                    descriptor.invoke(&target, &call_args, meta)
                });
                Ok((acc, return_type))
            }
            None => {
                let resolver = Arc::clone(&self.resolver);
                let name = name.to_owned();
                let memo: Mutex<FxHashMap<TypeHash, (Arc<MemberDescriptor>, Vec<DataType>)>> =
                    Mutex::new(FxHashMap::default());
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    let hash = target.type_hash();
                    let (descriptor, params) = {
                        let mut memo = memo.lock().unwrap();
                        match memo.get(&hash) {
                            Some(found) => found.clone(),
                            None => {
                                let request = MemberRequest::new(
                                    hash,
                                    MemberKinds::METHOD,
                                    MemberFlags::all_access(),
                                    name.clone(),
                                );
                                let candidates = resolver.resolve(&request, meta)?;
                                let chosen = resolve_overload(
                                    &candidates,
                                    &arg_types,
                                    &explicit,
                                    &name,
                                    hash,
                                )?;
                                let entry = (chosen.descriptor, chosen.params);
                                memo.insert(hash, entry.clone());
                                entry
                            }
                        }
                    };
                    let call_args = evaluate_arguments(&arg_accessors, &params, meta, args)?;
                    descriptor.invoke(&target, &call_args, meta)
                });
                Ok((acc, DataType::Object))
            }
        }
    }

    /// A bare call whose name binds to an argument slot: the slot holds
    /// a delegate and the call invokes it.
    fn compile_delegate_call(
        &self,
        slot: usize,
        name: &str,
        args: &[ExprNode],
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let mut arg_accessors = Vec::with_capacity(args.len());
        for arg in args {
            let (acc, _) = self.compile_node(arg, scope, metadata)?;
            arg_accessors.push(acc);
        }
        let name = name.to_owned();
        let acc: CompiledAccessor = Arc::new(move |meta, args| {
            let callee = arg_slot_accessor(slot)(meta, args)?;
            if callee.is_null() {
                return Err(EvalError::NullReference(name.clone()));
            }
            let delegate = callee
                .downcast_object::<Delegate>()
                .ok_or_else(|| EvalError::Invocation(format!("'{name}' is not invocable")))?;
            let mut call_args = Vec::with_capacity(arg_accessors.len());
            for accessor in &arg_accessors {
                call_args.push(accessor(meta, args)?);
            }
            delegate.invoke(meta, &call_args)
        });
        Ok((acc, DataType::Object))
    }

    /// `left ?. right`: evaluate the left side, stop at null, otherwise
    /// feed it to the right-hand access spine as an extra trailing slot.
    fn compile_null_conditional(
        &self,
        b: &BinaryExpr,
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let (left, left_ty) = self.compile_node(&b.left, scope, metadata)?;
        if !matches!(
            &b.right,
            ExprNode::Member(_) | ExprNode::MethodCall(_) | ExprNode::Index(_)
        ) {
            return Err(CompileError::InvalidNullConditional);
        }
        let (child, slot) = scope.with_extra_slot();
        let implicit = ImplicitSlot {
            slot,
            ty: left_ty,
        };
        let (right, right_ty) = self.compile_access(&b.right, &child, metadata, Some(implicit))?;
        let acc: CompiledAccessor = Arc::new(move |meta, args| {
            let value = left(meta, args)?;
            if value.is_null() {
                return Ok(Value::Null);
            }
            let mut extended = args.to_vec();
            extended.push(value);
            right(meta, &extended)
        });
        Ok((acc, right_ty))
    }

    /// `left = right` with a member access on the left compiles to a
    /// setter call; the assigned value is the expression result.
    fn compile_assignment(
        &self,
        b: &BinaryExpr,
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let (value_acc, value_ty) = self.compile_node(&b.right, scope, metadata)?;
        let ExprNode::Member(m) = &b.left else {
            let (_, left_ty) = self.compile_node(&b.left, scope, metadata)?;
            return Err(CompileError::UnsupportedOperator {
                op: "=".to_owned(),
                left: left_ty,
                right: value_ty,
            });
        };
        let (receiver, receiver_ty) = match &m.target {
            Some(target) => self.compile_receiver(target, scope, metadata, None)?,
            None => self.first_argument_receiver(&m.name, scope)?,
        };
        let setter = self.compile_setter(receiver, receiver_ty, &m.name, metadata)?;
        let acc: CompiledAccessor = Arc::new(move |meta, args| {
            let value = value_acc(meta, args)?;
            setter(meta, args, value.clone())?;
            Ok(value)
        });
        Ok((acc, value_ty))
    }

    fn compile_setter(
        &self,
        receiver: CompiledAccessor,
        receiver_ty: DataType,
        name: &str,
        metadata: &Metadata,
    ) -> Result<
        Arc<dyn Fn(&Metadata, &[Value], Value) -> Result<(), EvalError> + Send + Sync>,
        CompileError,
    > {
        match receiver_ty.type_hash() {
            Some(hash) => {
                let request = MemberRequest::new(
                    hash,
                    MemberKinds::accessor(),
                    MemberFlags::all_access(),
                    name,
                );
                let candidates = self.resolver.resolve(&request, metadata)?;
                let descriptor = pick_writable(&candidates);
                let name = name.to_owned();
                Ok(Arc::new(move |meta, args, value| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    descriptor.set(&target, value, meta)
                }))
            }
            None => {
                let resolver = Arc::clone(&self.resolver);
                let name = name.to_owned();
                let memo: Mutex<FxHashMap<TypeHash, Arc<MemberDescriptor>>> =
                    Mutex::new(FxHashMap::default());
                Ok(Arc::new(move |meta, args, value| {
                    let target = receiver(meta, args)?;
                    if target.is_null() {
                        return Err(EvalError::NullReference(name.clone()));
                    }
                    let hash = target.type_hash();
                    let descriptor = {
                        let mut memo = memo.lock().unwrap();
                        match memo.get(&hash) {
                            Some(found) => Arc::clone(found),
                            None => {
                                let request = MemberRequest::new(
                                    hash,
                                    MemberKinds::accessor(),
                                    MemberFlags::all_access(),
                                    name.clone(),
                                );
                                let candidates = resolver.resolve(&request, meta)?;
                                let found = pick_writable(&candidates);
                                memo.insert(hash, Arc::clone(&found));
                                found
                            }
                        }
                    };
                    descriptor.set(&target, value, meta)
                }))
            }
        }
    }

    /// `$Name` / `$Name(args)`: resolved at every invocation, metadata
    /// first, then registered resources.
    fn compile_dynamic_macro(
        &self,
        operand: &ExprNode,
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let (name, call_args) = macro_operand(operand)?;
        let resources = Arc::clone(&self.resources);
        match call_args {
            None => {
                let acc: CompiledAccessor = Arc::new(move |meta, _| {
                    lookup_resource(meta, &resources, &name)
                });
                Ok((acc, DataType::Object))
            }
            Some(args) => {
                let mut arg_accessors = Vec::with_capacity(args.len());
                for arg in args {
                    let (acc, _) = self.compile_node(&arg, scope, metadata)?;
                    arg_accessors.push(acc);
                }
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let value = lookup_resource(meta, &resources, &name)?;
                    let delegate = value.downcast_object::<Delegate>().ok_or_else(|| {
                        EvalError::Invocation(format!("resource '{name}' is not invocable"))
                    })?;
                    let mut call_args = Vec::with_capacity(arg_accessors.len());
                    for accessor in &arg_accessors {
                        call_args.push(accessor(meta, args)?);
                    }
                    delegate.invoke(meta, &call_args)
                });
                Ok((acc, DataType::Object))
            }
        }
    }

    /// `$$Name` / `$$Name(args)`: the resource is fetched once, at
    /// compile time; a missing resource fails the compilation.
    fn compile_static_macro(
        &self,
        operand: &ExprNode,
        scope: &Scope<'_>,
        metadata: &Metadata,
    ) -> Result<(CompiledAccessor, DataType), CompileError> {
        let (name, call_args) = macro_operand(operand)?;
        let value = self
            .resources
            .read()
            .unwrap()
            .get(&name)
            .cloned()
            .ok_or_else(|| CompileError::StaticResourceMissing(name.clone()))?;
        match call_args {
            None => {
                let ty = value.data_type();
                let acc: CompiledAccessor = Arc::new(move |_, _| Ok(value.clone()));
                Ok((acc, ty))
            }
            Some(args) => {
                let mut arg_accessors = Vec::with_capacity(args.len());
                for arg in args {
                    let (acc, _) = self.compile_node(&arg, scope, metadata)?;
                    arg_accessors.push(acc);
                }
                let acc: CompiledAccessor = Arc::new(move |meta, args| {
                    let delegate = value.downcast_object::<Delegate>().ok_or_else(|| {
                        EvalError::Invocation(format!("resource '{name}' is not invocable"))
                    })?;
                    let mut call_args = Vec::with_capacity(arg_accessors.len());
                    for accessor in &arg_accessors {
                        call_args.push(accessor(meta, args)?);
                    }
                    delegate.invoke(meta, &call_args)
                });
                Ok((acc, DataType::Object))
            }
        }
    }
}

fn arg_slot_accessor(slot: usize) -> CompiledAccessor {
    Arc::new(move |_, args| {
        args.get(slot).cloned().ok_or(EvalError::ArgumentCount {
            expected: slot + 1,
            actual: args.len(),
        })
    })
}

/// Resolver slices are never empty, so the fallback index holds.
fn pick_readable(candidates: &[Arc<MemberDescriptor>]) -> Arc<MemberDescriptor> {
    candidates
        .iter()
        .find(|m| m.can_get())
        .unwrap_or(&candidates[0])
        .clone()
}

fn pick_writable(candidates: &[Arc<MemberDescriptor>]) -> Arc<MemberDescriptor> {
    candidates
        .iter()
        .find(|m| m.can_set())
        .unwrap_or(&candidates[0])
        .clone()
}

fn evaluate_arguments(
    accessors: &[CompiledAccessor],
    params: &[DataType],
    metadata: &Metadata,
    args: &[Value],
) -> Result<Vec<Value>, EvalError> {
    let mut values = Vec::with_capacity(accessors.len());
    for (accessor, param) in accessors.iter().zip(params) {
        let value = accessor(metadata, args)?;
        values.push(convert_value(value, param)?);
    }
    Ok(values)
}

fn lookup_resource(
    metadata: &Metadata,
    resources: &RwLock<FxHashMap<String, Value>>,
    name: &str,
) -> Result<Value, EvalError> {
    if let Some(value) = metadata.get(name) {
        return Ok(value.clone());
    }
    resources
        .read()
        .unwrap()
        .get(name)
        .cloned()
        .ok_or_else(|| EvalError::UnknownResource(name.to_owned()))
}

fn macro_operand(operand: &ExprNode) -> Result<(String, Option<Vec<ExprNode>>), CompileError> {
    match operand {
        ExprNode::Member(m) if m.target.is_none() => Ok((m.name.clone(), None)),
        ExprNode::MethodCall(c) if c.target.is_none() => {
            Ok((c.name.clone(), Some(c.args.clone())))
        }
        other => Err(CompileError::UnboundIdentifier(other.to_string())),
    }
}
