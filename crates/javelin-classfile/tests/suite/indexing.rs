//! End-to-end indexing tests over synthesized class files.

use std::sync::Arc;

use javelin_classfile::Indexer;
use javelin_core::{
    flags, AnnotationTarget, DotName, FieldRef, Index, MethodRef, NestingKind, Primitive,
    RecordComponentRef, Type, Value,
};
use pretty_assertions::assert_eq;

use super::builder::{
    annotation, annotation_default, enclosing_method, exceptions, inner_classes,
    method_parameters, parameter_annotations, record, runtime_annotations, ClassFile, Ev,
};

fn index_all(classes: &[Vec<u8>]) -> Index {
    let mut indexer = Indexer::default();
    for data in classes {
        indexer.index(data).unwrap().unwrap();
    }
    indexer.complete()
}

fn dn(name: &str) -> DotName {
    DotName::simple(name)
}

#[test]
fn hierarchy_and_member_lookup() {
    let base = ClassFile::new("com/example/Base", "java/lang/Object").build();
    let mut child = ClassFile::new("com/example/Child", "com/example/Base");
    child.add_interface("java/io/Serializable");
    child.add_field(flags::ACC_PRIVATE, "id", "I", vec![]);
    child.add_method(flags::ACC_PUBLIC, "run", "()V", vec![]);

    let index = index_all(&[base, child.build()]);
    assert_eq!(index.class_count(), 2);

    let subclasses = index.subclasses_of(&dn("com.example.Base"));
    assert_eq!(subclasses.len(), 1);
    assert_eq!(subclasses[0].name, dn("com.example.Child"));

    let implementors = index.implementors_of(&dn("java.io.Serializable"));
    assert_eq!(implementors.len(), 1);
    assert_eq!(implementors[0].name, dn("com.example.Child"));

    let child = index.class_by_name(&dn("com.example.Child")).unwrap();
    assert_eq!(child.super_name(), Some(dn("com.example.Base")));
    assert_ne!(child.flags & flags::ACC_PUBLIC, 0);

    let field = child.field("id").unwrap();
    assert_eq!(*field.ty, Type::primitive(Primitive::Int));
    assert_ne!(field.flags & flags::ACC_PRIVATE, 0);

    let method = child.method("run").unwrap();
    assert_eq!(*method.return_type, Type::void());
    assert!(method.parameters.is_empty());
}

#[test]
fn declaration_annotations_carry_targets() {
    let mut cf = ClassFile::new("com/example/Service", "java/lang/Object");

    let stateless = annotation(&mut cf.pool, "Lcom/example/Stateless;", vec![]);
    let body = runtime_annotations(vec![stateless]);
    let attr = cf.attr("RuntimeVisibleAnnotations", body);
    cf.add_class_attr(attr);

    let inject = annotation(&mut cf.pool, "Lcom/example/Inject;", vec![]);
    let body = runtime_annotations(vec![inject]);
    let attr = cf.attr("RuntimeVisibleAnnotations", body);
    cf.add_field(flags::ACC_PRIVATE, "repository", "Ljava/lang/Object;", vec![attr]);

    let timed = annotation(&mut cf.pool, "Lcom/example/Timed;", vec![]);
    let body = runtime_annotations(vec![timed]);
    let method_attr = cf.attr("RuntimeVisibleAnnotations", body);
    let not_null = annotation(&mut cf.pool, "Lcom/example/NotNull;", vec![]);
    let body = parameter_annotations(vec![vec![not_null]]);
    let param_attr = cf.attr("RuntimeVisibleParameterAnnotations", body);
    cf.add_method(
        flags::ACC_PUBLIC,
        "handle",
        "(Ljava/lang/String;)V",
        vec![method_attr, param_attr],
    );

    let index = index_all(&[cf.build()]);
    let name = dn("com.example.Service");
    let service = index.class_by_name(&name).unwrap();

    let class_level: Vec<_> = service.class_annotations().collect();
    assert_eq!(class_level.len(), 1);
    assert_eq!(class_level[0].name, dn("com.example.Stateless"));
    assert_eq!(
        class_level[0].target(),
        Some(&AnnotationTarget::Class(name.clone()))
    );

    let inject = index.annotations_of(&dn("com.example.Inject"));
    assert_eq!(inject.len(), 1);
    assert_eq!(
        inject[0].target(),
        Some(&AnnotationTarget::Field(FieldRef {
            class: name.clone(),
            name: Arc::from("repository"),
        }))
    );
    assert_eq!(service.field("repository").unwrap().annotations, inject);

    let method_ref = MethodRef {
        class: name.clone(),
        name: Arc::from("handle"),
        position: 0,
    };
    let timed = index.annotations_of(&dn("com.example.Timed"));
    assert_eq!(timed.len(), 1);
    assert_eq!(
        timed[0].target(),
        Some(&AnnotationTarget::Method(method_ref.clone()))
    );

    let not_null = index.annotations_of(&dn("com.example.NotNull"));
    assert_eq!(not_null.len(), 1);
    assert_eq!(
        not_null[0].target(),
        Some(&AnnotationTarget::MethodParameter {
            method: method_ref,
            position: 0,
        })
    );

    // Method records collect their parameter annotations too.
    let handle = service.method("handle").unwrap();
    assert_eq!(handle.annotations.len(), 2);
}

#[test]
fn annotation_values_are_decoded() {
    let mut cf = ClassFile::new("com/example/Configured", "java/lang/Object");
    let marker = annotation(&mut cf.pool, "Lcom/example/Marker;", vec![]);
    let config = annotation(
        &mut cf.pool,
        "Lcom/example/Config;",
        vec![
            ("count", Ev::Int(42)),
            ("id", Ev::Long(1 << 40)),
            ("ratio", Ev::Double(2.5)),
            ("enabled", Ev::Boolean(true)),
            ("name", Ev::Str("javelin")),
            ("level", Ev::Enum("Lcom/example/Level;", "HIGH")),
            ("type", Ev::ClassLit("[Ljava/lang/String;")),
            ("nested", Ev::Nested(marker)),
            ("tags", Ev::Array(vec![Ev::Str("a"), Ev::Str("b")])),
        ],
    );
    let body = runtime_annotations(vec![config]);
    let attr = cf.attr("RuntimeVisibleAnnotations", body);
    cf.add_class_attr(attr);

    let index = index_all(&[cf.build()]);
    let instances = index.annotations_of(&dn("com.example.Config"));
    assert_eq!(instances.len(), 1);
    let config = &instances[0];

    assert_eq!(config.value("count").unwrap().value, Value::Int(42));
    assert_eq!(config.value("id").unwrap().value, Value::Long(1 << 40));
    assert_eq!(config.value("ratio").unwrap().value, Value::Double(2.5));
    assert_eq!(config.value("enabled").unwrap().value, Value::Boolean(true));
    assert_eq!(
        config.value("name").unwrap().value,
        Value::String(Arc::from("javelin"))
    );
    assert_eq!(
        config.value("level").unwrap().value,
        Value::Enum {
            type_name: dn("com.example.Level"),
            constant: Arc::from("HIGH"),
        }
    );

    let class_lit = &config.value("type").unwrap().value;
    match class_lit {
        Value::Class(ty) => {
            assert_eq!(
                **ty,
                Type::array(Arc::new(Type::class(dn("java.lang.String"))), 1)
            );
        }
        other => panic!("expected a class literal, got {other:?}"),
    }

    match &config.value("nested").unwrap().value {
        Value::Nested(nested) => {
            assert_eq!(nested.name, dn("com.example.Marker"));
            assert!(nested.target().is_none());
        }
        other => panic!("expected a nested annotation, got {other:?}"),
    }

    match &config.value("tags").unwrap().value {
        Value::Array(elements) => {
            assert_eq!(elements.len(), 2);
            // Array elements carry no member name of their own.
            assert_eq!(&*elements[0].name, "");
            assert_eq!(elements[0].value, Value::String(Arc::from("a")));
            assert_eq!(elements[1].value, Value::String(Arc::from("b")));
        }
        other => panic!("expected an array, got {other:?}"),
    }
}

#[test]
fn generic_signatures_replace_descriptor_types() {
    let mut cf = ClassFile::new("com/example/Box", "java/lang/Object");
    cf.add_interface("java/lang/Comparable");
    let attr = cf.signature_attr("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<Lcom/example/Box;>;");
    cf.add_class_attr(attr);

    let attr = cf.signature_attr("Ljava/util/List<TT;>;");
    cf.add_field(flags::ACC_PRIVATE, "items", "Ljava/util/List;", vec![attr]);

    let attr = cf.signature_attr("(TT;)TT;");
    cf.add_method(
        flags::ACC_PUBLIC,
        "identity",
        "(Ljava/lang/Object;)Ljava/lang/Object;",
        vec![attr],
    );

    let index = index_all(&[cf.build()]);
    let class = index.class_by_name(&dn("com.example.Box")).unwrap();

    assert_eq!(class.type_parameters.len(), 1);
    match &*class.type_parameters[0] {
        Type::TypeVariable(t) => {
            assert_eq!(&*t.identifier, "T");
            assert_eq!(t.bounds.len(), 1);
            assert_eq!(t.bounds[0].name(), dn("java.lang.Object"));
        }
        other => panic!("expected a type variable, got {other:?}"),
    }

    match &*class.interface_types[0] {
        Type::Parameterized(t) => {
            assert_eq!(t.name, dn("java.lang.Comparable"));
            assert_eq!(t.arguments.len(), 1);
            assert_eq!(t.arguments[0].name(), dn("com.example.Box"));
        }
        other => panic!("expected a parameterized interface, got {other:?}"),
    }

    // The raw interface name still keys the implementors map.
    assert_eq!(index.implementors_of(&dn("java.lang.Comparable")).len(), 1);

    match &*class.field("items").unwrap().ty {
        Type::Parameterized(t) => {
            assert_eq!(t.name, dn("java.util.List"));
            assert!(matches!(&*t.arguments[0], Type::TypeVariable(v) if &*v.identifier == "T"));
        }
        other => panic!("expected a parameterized field type, got {other:?}"),
    }

    let identity = class.method("identity").unwrap();
    assert!(
        matches!(&*identity.parameters[0], Type::TypeVariable(v) if &*v.identifier == "T"),
        "parameter was {:?}",
        identity.parameters[0]
    );
    assert!(matches!(&*identity.return_type, Type::TypeVariable(_)));
}

#[test]
fn thrown_exceptions_prefer_the_signature() {
    let mut cf = ClassFile::new("com/example/Thrower", "java/lang/Object");

    let body = exceptions(&mut cf.pool, &["java/lang/Exception"]);
    let exc_attr = cf.attr("Exceptions", body);
    let sig_attr = cf.signature_attr("()V^Ljava/io/IOException;");
    cf.add_method(flags::ACC_PUBLIC, "withSignature", "()V", vec![exc_attr, sig_attr]);

    let body = exceptions(&mut cf.pool, &["java/io/IOException"]);
    let exc_attr = cf.attr("Exceptions", body);
    cf.add_method(flags::ACC_PUBLIC, "withoutSignature", "()V", vec![exc_attr]);

    let index = index_all(&[cf.build()]);
    let class = index.class_by_name(&dn("com.example.Thrower")).unwrap();

    let with_sig = class.method("withSignature").unwrap();
    assert_eq!(with_sig.exceptions.len(), 1);
    assert_eq!(with_sig.exceptions[0].name(), dn("java.io.IOException"));

    let without = class.method("withoutSignature").unwrap();
    assert_eq!(without.exceptions.len(), 1);
    assert_eq!(without.exceptions[0].name(), dn("java.io.IOException"));
}

#[test]
fn parameter_names_and_annotation_defaults() {
    let mut cf = ClassFile::new("com/example/Retry", "java/lang/Object");
    cf.access = 0x0601 | flags::ACC_ANNOTATION; // public interface annotation

    let body = annotation_default(&mut cf.pool, Ev::Int(3));
    let attr = cf.attr("AnnotationDefault", body);
    cf.add_method(flags::ACC_PUBLIC | flags::ACC_ABSTRACT, "attempts", "()I", vec![attr]);

    let body = method_parameters(&mut cf.pool, &[Some("input"), None]);
    let attr = cf.attr("MethodParameters", body);
    cf.add_method(
        flags::ACC_PUBLIC | flags::ACC_ABSTRACT,
        "validate",
        "(Ljava/lang/String;I)V",
        vec![attr],
    );

    let index = index_all(&[cf.build()]);
    let class = index.class_by_name(&dn("com.example.Retry")).unwrap();
    assert!(class.is_annotation_type());

    let attempts = class.method("attempts").unwrap();
    let default = attempts.default_value.as_ref().unwrap();
    assert_eq!(&*default.name, "attempts");
    assert_eq!(default.value, Value::Int(3));

    let validate = class.method("validate").unwrap();
    assert_eq!(
        validate.parameter_names,
        vec![Some(Arc::from("input")), None]
    );
    assert!(attempts.parameter_names.is_empty());
}

#[test]
fn record_components_are_indexed() {
    let mut cf = ClassFile::new("com/example/Point", "java/lang/Record");
    cf.access |= flags::ACC_FINAL;

    let marker = annotation(&mut cf.pool, "Lcom/example/Marker;", vec![]);
    let body = runtime_annotations(vec![marker]);
    let component_attr = cf.attr("RuntimeVisibleAnnotations", body);
    let x_name = cf.pool.utf8("x");
    let x_desc = cf.pool.utf8("I");
    let body = record(vec![(x_name, x_desc, vec![component_attr])]);
    let attr = cf.attr("Record", body);
    cf.add_class_attr(attr);

    let index = index_all(&[cf.build()]);
    let name = dn("com.example.Point");
    let class = index.class_by_name(&name).unwrap();

    let component = class.record_component("x").unwrap();
    assert_eq!(*component.ty, Type::primitive(Primitive::Int));
    assert_eq!(component.annotations.len(), 1);
    assert_eq!(
        component.annotations[0].target(),
        Some(&AnnotationTarget::RecordComponent(RecordComponentRef {
            class: name,
            name: Arc::from("x"),
        }))
    );
    assert_eq!(
        index.annotations_of(&dn("com.example.Marker")),
        component.annotations
    );
}

#[test]
fn nesting_kinds_are_resolved() {
    let mut inner = ClassFile::new("com/example/Outer$Task", "java/lang/Object");
    let body = inner_classes(
        &mut inner.pool,
        vec![(
            "com/example/Outer$Task",
            Some("com/example/Outer"),
            Some("Task"),
            0,
        )],
    );
    let attr = inner.attr("InnerClasses", body);
    inner.add_class_attr(attr);

    let mut local = ClassFile::new("com/example/Outer$1Helper", "java/lang/Object");
    let body = inner_classes(
        &mut local.pool,
        vec![("com/example/Outer$1Helper", None, Some("Helper"), 0)],
    );
    let attr = local.attr("InnerClasses", body);
    local.add_class_attr(attr);
    let body = enclosing_method(&mut local.pool, "com/example/Outer", Some(("run", "(I)V")));
    let attr = local.attr("EnclosingMethod", body);
    local.add_class_attr(attr);

    let mut anonymous = ClassFile::new("com/example/Outer$1", "java/lang/Object");
    let body = inner_classes(
        &mut anonymous.pool,
        vec![("com/example/Outer$1", None, None, 0)],
    );
    let attr = anonymous.attr("InnerClasses", body);
    anonymous.add_class_attr(attr);
    // Enclosed directly in an initializer: no method reference.
    let body = enclosing_method(&mut anonymous.pool, "com/example/Outer", None);
    let attr = anonymous.attr("EnclosingMethod", body);
    anonymous.add_class_attr(attr);

    let top = ClassFile::new("com/example/Outer", "java/lang/Object").build();
    let index = index_all(&[top, inner.build(), local.build(), anonymous.build()]);

    let top = index.class_by_name(&dn("com.example.Outer")).unwrap();
    assert_eq!(top.nesting.kind, NestingKind::Top);

    let inner = index.class_by_name(&dn("com.example.Outer$Task")).unwrap();
    assert_eq!(inner.nesting.kind, NestingKind::Inner);
    assert_eq!(inner.nesting.enclosing_class, Some(dn("com.example.Outer")));
    assert_eq!(inner.nesting.simple_name.as_deref(), Some("Task"));

    let local = index
        .class_by_name(&dn("com.example.Outer$1Helper"))
        .unwrap();
    assert_eq!(local.nesting.kind, NestingKind::Local);
    assert_eq!(local.nesting.simple_name.as_deref(), Some("Helper"));
    let enclosing = local.nesting.enclosing_method.as_ref().unwrap();
    assert_eq!(enclosing.class, dn("com.example.Outer"));
    assert_eq!(&*enclosing.name, "run");
    assert_eq!(*enclosing.parameters[0], Type::primitive(Primitive::Int));
    assert_eq!(*enclosing.return_type, Type::void());

    let anonymous = index.class_by_name(&dn("com.example.Outer$1")).unwrap();
    assert_eq!(anonymous.nesting.kind, NestingKind::Anonymous);
    assert!(anonymous.nesting.simple_name.is_none());
    assert!(anonymous.nesting.enclosing_method.is_none());
}

#[test]
fn no_args_constructor_detection() {
    let mut with = ClassFile::new("com/example/Plain", "java/lang/Object");
    with.add_method(flags::ACC_PUBLIC, "<init>", "()V", vec![]);

    let mut without = ClassFile::new("com/example/Args", "java/lang/Object");
    without.add_method(flags::ACC_PUBLIC, "<init>", "(I)V", vec![]);

    let index = index_all(&[with.build(), without.build()]);
    assert!(
        index
            .class_by_name(&dn("com.example.Plain"))
            .unwrap()
            .has_no_args_constructor
    );
    assert!(
        !index
            .class_by_name(&dn("com.example.Args"))
            .unwrap()
            .has_no_args_constructor
    );
}
