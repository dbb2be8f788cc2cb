//! End-to-end pipeline tests: parse, resolve, compile, invoke.

use std::sync::{Arc, Mutex};

use bindex::{
    ArgumentInfo, CompileError, DataType, Delegate, DelegateShape, EvalError, ExprNode,
    ExprVisitor, ExpressionPipeline, GenericParam, MemberDescriptor, MemberFlags, MemberKinds,
    Metadata, ParamInfo, ResolveError, TypeHash, TypeRegistration, Value, primitives, rewrite,
};

struct Person {
    name: Mutex<Arc<str>>,
    age: i32,
}

fn person_hash() -> TypeHash {
    TypeHash::from_name("Person")
}

fn person(name: &str, age: i32) -> Value {
    Value::object(
        person_hash(),
        Person {
            name: Mutex::new(name.into()),
            age,
        },
    )
}

fn with_person<T>(receiver: &Value, f: impl FnOnce(&Person) -> T) -> Result<T, EvalError> {
    let person = receiver
        .downcast_object::<Person>()
        .ok_or_else(|| EvalError::Invocation("receiver is not a Person".into()))?;
    Ok(f(&person))
}

fn registration() -> TypeRegistration {
    TypeRegistration::new("Person")
        .with_member(MemberDescriptor::property(
            "Name",
            person_hash(),
            DataType::concrete(primitives::STRING),
            Arc::new(|receiver, _| {
                with_person(receiver, |p| Value::Str(Arc::clone(&p.name.lock().unwrap())))
            }),
            Some(Arc::new(|receiver, value, _| {
                let Value::Str(text) = value else {
                    return Err(EvalError::Invocation("Name takes a string".into()));
                };
                with_person(receiver, |p| *p.name.lock().unwrap() = text)
            })),
        ))
        .unwrap()
        .with_member(MemberDescriptor::field(
            "Age",
            person_hash(),
            DataType::concrete(primitives::I32),
            Arc::new(|receiver, _| with_person(receiver, |p| Value::I32(p.age))),
            None,
        ))
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Sum",
            person_hash(),
            DataType::concrete(primitives::I32),
            vec![
                ParamInfo::new("a", DataType::concrete(primitives::I32)),
                ParamInfo::new("b", DataType::concrete(primitives::I32)),
            ],
            Arc::new(|_, args, _| {
                let (Some(Value::I32(a)), Some(Value::I32(b))) = (args.first(), args.get(1)) else {
                    return Err(EvalError::Invocation("Sum expects two i32s".into()));
                };
                Ok(Value::I32(a + b))
            }),
        ))
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Sum",
            person_hash(),
            DataType::concrete(primitives::F64),
            vec![
                ParamInfo::new("a", DataType::concrete(primitives::F64)),
                ParamInfo::new("b", DataType::concrete(primitives::F64)),
            ],
            Arc::new(|_, args, _| {
                let (Some(Value::F64(a)), Some(Value::F64(b))) = (args.first(), args.get(1)) else {
                    return Err(EvalError::Invocation("Sum expects two f64s".into()));
                };
                Ok(Value::F64(a + b))
            }),
        ))
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Pick",
            person_hash(),
            DataType::concrete(primitives::I32),
            vec![
                ParamInfo::new("a", DataType::concrete(primitives::I32)),
                ParamInfo::new("b", DataType::concrete(primitives::F64)),
            ],
            Arc::new(|_, _, _| Ok(Value::I32(1))),
        ))
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Pick",
            person_hash(),
            DataType::concrete(primitives::I32),
            vec![
                ParamInfo::new("a", DataType::concrete(primitives::F64)),
                ParamInfo::new("b", DataType::concrete(primitives::I32)),
            ],
            Arc::new(|_, _, _| Ok(Value::I32(2))),
        ))
        .unwrap()
        .with_member(
            MemberDescriptor::method(
                "Echo",
                person_hash(),
                DataType::Generic(0),
                vec![ParamInfo::new("value", DataType::Generic(0))],
                Arc::new(|_, args, _| {
                    args.first()
                        .cloned()
                        .ok_or(EvalError::ArgumentCount {
                            expected: 1,
                            actual: 0,
                        })
                }),
            )
            .with_generics(vec![GenericParam::new("T")]),
        )
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Item",
            person_hash(),
            DataType::concrete(primitives::STRING),
            vec![ParamInfo::new("index", DataType::concrete(primitives::I32))],
            Arc::new(|_, args, _| {
                let Some(Value::I32(index)) = args.first() else {
                    return Err(EvalError::Invocation("Item expects an i32".into()));
                };
                Ok(Value::string(format!("item-{index}")))
            }),
        ))
        .unwrap()
        .with_member(MemberDescriptor::method(
            "Apply",
            person_hash(),
            DataType::Object,
            vec![ParamInfo::new(
                "f",
                DataType::concrete(primitives::DELEGATE),
            )],
            Arc::new(|_, args, meta| {
                let delegate = args
                    .first()
                    .and_then(Value::downcast_object::<Delegate>)
                    .ok_or_else(|| EvalError::Invocation("Apply expects a delegate".into()))?;
                delegate.invoke(meta, &[Value::I32(21)])
            }),
        ))
        .unwrap()
}

fn pipeline() -> ExpressionPipeline {
    let pipeline = ExpressionPipeline::new();
    pipeline.register(registration()).unwrap();
    pipeline
}

fn shape() -> DelegateShape {
    DelegateShape::new(
        vec![ArgumentInfo::named(
            "p",
            DataType::concrete(person_hash()),
        )],
        DataType::Object,
    )
}

fn compile_one(pipeline: &ExpressionPipeline, text: &str) -> bindex::CompiledAccessor {
    let results = pipeline.parse(text, &Metadata::new()).unwrap();
    pipeline
        .compile(&results[0].target, &shape(), &Metadata::new())
        .unwrap()
}

#[test]
fn statement_list_splits_target_source_and_parameters() {
    let pipeline = pipeline();
    let results = pipeline
        .parse(
            "Target.Text, Source.Name, Converter=Foo, Mode=TwoWay",
            &Metadata::new(),
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.target.to_string(), "Target.Text");
    assert_eq!(result.source.as_ref().unwrap().to_string(), "Source.Name");
    assert_eq!(result.parameters.len(), 2);
    assert_eq!(result.parameters[0].to_string(), "(Converter = Foo)");
}

#[test]
fn printed_expressions_reparse_to_the_same_tree() {
    let pipeline = pipeline();
    let first = pipeline
        .parse("(Age + 2) * Rank ?? Fallback.Value", &Metadata::new())
        .unwrap();
    let printed = first[0].target.to_string();
    let second = pipeline.parse(&printed, &Metadata::new()).unwrap();
    assert_eq!(first[0].target, second[0].target);
}

#[test]
fn members_read_through_the_registry() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let unqualified = compile_one(&pipeline, "Name");
    assert_eq!(
        unqualified(&meta, &[person("Ada", 36)]).unwrap(),
        Value::string("Ada")
    );
    let named = compile_one(&pipeline, "p.Age");
    assert_eq!(named(&meta, &[person("Ada", 36)]).unwrap(), Value::I32(36));
}

#[test]
fn overloads_select_by_conversion_cost() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let ints = compile_one(&pipeline, "Sum(20, 22)");
    assert_eq!(ints(&meta, &[person("Ada", 0)]).unwrap(), Value::I32(42));
    let floats = compile_one(&pipeline, "Sum(1, 2.5)");
    assert_eq!(floats(&meta, &[person("Ada", 0)]).unwrap(), Value::F64(3.5));
}

#[test]
fn equally_ranked_overloads_are_ambiguous() {
    let pipeline = pipeline();
    let results = pipeline.parse("Pick(1, 2)", &Metadata::new()).unwrap();
    let err = pipeline
        .compile(&results[0].target, &shape(), &Metadata::new())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        CompileError::Resolve(ResolveError::AmbiguousMatch { count: 2, .. })
    ));
}

#[test]
fn generic_arguments_infer_from_the_call_site() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let inferred = compile_one(&pipeline, "Echo(5)");
    assert_eq!(inferred(&meta, &[person("Ada", 0)]).unwrap(), Value::I32(5));
    let explicit = compile_one(&pipeline, "Echo<String>(\"hi\")");
    assert_eq!(
        explicit(&meta, &[person("Ada", 0)]).unwrap(),
        Value::string("hi")
    );
}

#[test]
fn unknown_members_fail_at_compile_time() {
    let pipeline = pipeline();
    let results = pipeline.parse("Missing", &Metadata::new()).unwrap();
    let err = pipeline
        .compile(&results[0].target, &shape(), &Metadata::new())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        CompileError::Resolve(ResolveError::InvalidMember { .. })
    ));
}

#[test]
fn attached_members_join_resolution() {
    let pipeline = pipeline();
    pipeline.attach_member(
        person_hash(),
        MemberDescriptor::field(
            "Badge",
            person_hash(),
            DataType::concrete(primitives::STRING),
            Arc::new(|_, _| Ok(Value::string("gold"))),
            None,
        ),
    );
    let accessor = compile_one(&pipeline, "Badge");
    assert_eq!(
        accessor(&Metadata::new(), &[person("Ada", 0)]).unwrap(),
        Value::string("gold")
    );
}

#[test]
fn null_conditional_and_coalescing_chain() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let accessor = compile_one(&pipeline, "p?.Name ?? \"nobody\"");
    assert_eq!(
        accessor(&meta, &[Value::Null]).unwrap(),
        Value::string("nobody")
    );
    assert_eq!(
        accessor(&meta, &[person("Grace", 0)]).unwrap(),
        Value::string("Grace")
    );
}

#[test]
fn conditionals_require_a_boolean_and_pick_one_branch() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let accessor = compile_one(&pipeline, "Age >= 18 ? \"adult\" : \"minor\"");
    assert_eq!(
        accessor(&meta, &[person("Ada", 36)]).unwrap(),
        Value::string("adult")
    );
    assert_eq!(
        accessor(&meta, &[person("Kid", 9)]).unwrap(),
        Value::string("minor")
    );

    let not_bool = compile_one(&pipeline, "Age ? 1 : 2");
    assert!(matches!(
        not_bool(&meta, &[person("Ada", 36)]),
        Err(EvalError::NotBool)
    ));
}

#[test]
fn indexers_call_the_item_member() {
    let pipeline = pipeline();
    let accessor = compile_one(&pipeline, "p[2]");
    assert_eq!(
        accessor(&Metadata::new(), &[person("Ada", 0)]).unwrap(),
        Value::string("item-2")
    );
}

#[test]
fn lambdas_pass_as_delegate_arguments() {
    let pipeline = pipeline();
    let accessor = compile_one(&pipeline, "Apply(x => x * 2)");
    assert_eq!(
        accessor(&Metadata::new(), &[person("Ada", 0)]).unwrap(),
        Value::I32(42)
    );
}

#[test]
fn assignment_writes_and_yields_the_value() {
    let pipeline = pipeline();
    let accessor = compile_one(&pipeline, "Name = \"Grace\"");
    let target = person("Ada", 0);
    let result = accessor(&Metadata::new(), &[target.clone()]).unwrap();
    assert_eq!(result, Value::string("Grace"));
    let inner = target.downcast_object::<Person>().unwrap();
    assert_eq!(&**inner.name.lock().unwrap(), "Grace");
}

#[test]
fn accessor_cache_returns_identical_closures_until_cleared() {
    let pipeline = pipeline();
    let results = pipeline.parse("Name", &Metadata::new()).unwrap();
    let node = &results[0].target;
    let first = pipeline.compile(node, &shape(), &Metadata::new()).unwrap();
    let second = pipeline.compile(node, &shape(), &Metadata::new()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    pipeline.clear_caches();
    let third = pipeline.compile(node, &shape(), &Metadata::new()).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn member_resolution_cache_returns_identical_slices() {
    let pipeline = pipeline();
    let meta = Metadata::new();
    let first = pipeline
        .resolve_member(
            person_hash(),
            MemberKinds::accessor(),
            MemberFlags::all_access(),
            "Name",
            &meta,
        )
        .unwrap();
    let second = pipeline
        .resolve_member(
            person_hash(),
            MemberKinds::accessor(),
            MemberFlags::all_access(),
            "Name",
            &meta,
        )
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn visitor_rewrites_while_preserving_untouched_subtrees() {
    struct RenameAge;
    impl ExprVisitor for RenameAge {
        fn visit(&mut self, node: &ExprNode) -> Option<ExprNode> {
            match node {
                ExprNode::Member(m) if m.name == "Age" => {
                    Some(ExprNode::member(m.target.clone(), "Years"))
                }
                _ => None,
            }
        }
    }

    let pipeline = pipeline();
    let results = pipeline
        .parse("p.Age + Other.Count", &Metadata::new())
        .unwrap();
    let root = &results[0].target;
    let rewritten = rewrite(root, &mut RenameAge);
    assert_eq!(rewritten.to_string(), "(p.Years + Other.Count)");

    // The untouched right operand keeps its allocation.
    let (ExprNode::Binary(before), ExprNode::Binary(after)) = (root, &rewritten) else {
        panic!("expected binary nodes");
    };
    assert!(before.right.same_node(&after.right));

    struct Identity;
    impl ExprVisitor for Identity {
        fn visit(&mut self, _: &ExprNode) -> Option<ExprNode> {
            None
        }
    }
    assert!(rewrite(root, &mut Identity).same_node(root));
}

#[test]
fn resource_macros_resolve_dynamically_and_statically() {
    let pipeline = pipeline();
    pipeline.register_resource("Factor", Value::I32(6));
    pipeline.register_resource("Greeting", Value::string("hello"));

    let static_macro = compile_one(&pipeline, "$$Factor * 7");
    assert_eq!(
        static_macro(&Metadata::new(), &[person("Ada", 0)]).unwrap(),
        Value::I32(42)
    );

    let dynamic = compile_one(&pipeline, "$Greeting");
    assert_eq!(
        dynamic(&Metadata::new(), &[person("Ada", 0)]).unwrap(),
        Value::string("hello")
    );
    let meta = Metadata::new().with("Greeting", Value::string("hi there"));
    assert_eq!(
        dynamic(&meta, &[person("Ada", 0)]).unwrap(),
        Value::string("hi there")
    );
}
