//! Type-annotation path resolution over synthesized class files: splicing
//! annotations into rebuilt type trees and locating the annotated node.

use std::sync::Arc;

use javelin_classfile::Indexer;
use javelin_core::{
    flags, AnnotationInstance, AnnotationTarget, ArrayType, ClassType, DotName, EnclosingTarget,
    FieldRef, Index, MethodRef, ParameterizedType, Type, TypeUsage, TypeUseTarget, TypeVariable,
    WildcardType,
};
use pretty_assertions::assert_eq;

use super::builder::{
    annotation, inner_classes, target_class_extends, target_class_type_parameter_bound,
    target_empty_field, target_method_parameter, target_receiver, type_annotations, ClassFile,
    TypeAnnotation,
};

fn index_one(data: Vec<u8>) -> Index {
    let mut indexer = Indexer::default();
    indexer.index(&data).unwrap().unwrap();
    indexer.complete()
}

fn dn(name: &str) -> DotName {
    DotName::simple(name)
}

/// The form an annotation takes once spliced into a type tree: no target.
fn spliced(name: &str) -> AnnotationInstance {
    AnnotationInstance::new(dn(name), None, vec![])
}

fn class_ty(name: &str) -> Arc<Type> {
    Arc::new(Type::class(dn(name)))
}

#[test]
fn path_reaches_a_wildcard_bound() {
    let mut cf = ClassFile::new("com/example/Holder", "java/lang/Object");
    let sig = cf.signature_attr(
        "Ljava/util/Map<+Ljava/lang/String;Ljava/util/List<Ljava/lang/Object;>;>;",
    );
    let not_null = annotation(&mut cf.pool, "Lcom/example/NotNull;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_empty_field(),
        // type argument 0, then into the wildcard bound
        path: vec![(3, 0), (2, 0)],
        annotation: not_null,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_field(flags::ACC_PRIVATE, "map", "Ljava/util/Map;", vec![sig, rvta]);

    let index = index_one(cf.build());
    let class = index.class_by_name(&dn("com.example.Holder")).unwrap();
    let field = class.field("map").unwrap();

    let annotated = Arc::new(Type::Class(ClassType {
        name: dn("java.lang.String"),
        annotations: vec![spliced("com.example.NotNull")],
    }));

    match &*field.ty {
        Type::Parameterized(map) => {
            assert_eq!(map.name, dn("java.util.Map"));
            assert_eq!(
                *map.arguments[0],
                Type::Wildcard(WildcardType {
                    extends: true,
                    bound: Some(annotated.clone()),
                    annotations: vec![],
                })
            );
        }
        other => panic!("expected a parameterized map, got {other:?}"),
    }

    assert_eq!(field.annotations.len(), 1);
    assert_eq!(
        field.annotations[0].target(),
        Some(&AnnotationTarget::TypeUse(TypeUseTarget {
            enclosing: EnclosingTarget::Field(FieldRef {
                class: dn("com.example.Holder"),
                name: Arc::from("map"),
            }),
            ty: annotated,
            usage: TypeUsage::Empty,
        }))
    );
}

fn nested_fixture(middle_flags: u16) -> Vec<u8> {
    let mut cf = ClassFile::new("com/example/Test", "java/lang/Object");
    let body = inner_classes(
        &mut cf.pool,
        vec![
            ("Outer$Middle", Some("Outer"), Some("Middle"), middle_flags),
            ("Outer$Middle$Inner", Some("Outer$Middle"), Some("Inner"), 0),
        ],
    );
    let attr = cf.attr("InnerClasses", body);
    cf.add_class_attr(attr);

    let sig = cf.signature_attr("LOuter$Middle<Ljava/lang/Integer;>.Inner;");
    let tagged = annotation(&mut cf.pool, "Lcom/example/Tagged;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_empty_field(),
        path: vec![(1, 0)], // one nesting step, counted from the outermost class
        annotation: tagged,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_field(
        flags::ACC_PRIVATE,
        "inner",
        "LOuter$Middle$Inner;",
        vec![sig, rvta],
    );
    cf.build()
}

#[test]
fn nesting_step_lands_on_a_non_static_level() {
    let index = index_one(nested_fixture(0));
    let class = index.class_by_name(&dn("com.example.Test")).unwrap();
    let field = class.field("inner").unwrap();

    // Middle is the first level with an enclosing instance, so the single
    // step stops there.
    let annotated = Arc::new(Type::Parameterized(ParameterizedType {
        name: dn("Outer$Middle"),
        arguments: vec![class_ty("java.lang.Integer")],
        owner: None,
        annotations: vec![spliced("com.example.Tagged")],
    }));
    assert_eq!(
        *field.ty,
        Type::Parameterized(ParameterizedType {
            name: dn("Outer$Middle$Inner"),
            arguments: vec![],
            owner: Some(annotated.clone()),
            annotations: vec![],
        })
    );

    match field.annotations[0].target() {
        Some(AnnotationTarget::TypeUse(t)) => assert_eq!(t.ty, annotated),
        other => panic!("expected a type-use target, got {other:?}"),
    }
}

#[test]
fn nesting_step_skips_a_static_level() {
    let index = index_one(nested_fixture(flags::ACC_STATIC));
    let class = index.class_by_name(&dn("com.example.Test")).unwrap();
    let field = class.field("inner").unwrap();

    // A static level has no enclosing instance to annotate, so the step
    // falls through to Inner.
    let middle = Arc::new(Type::Parameterized(ParameterizedType {
        name: dn("Outer$Middle"),
        arguments: vec![class_ty("java.lang.Integer")],
        owner: None,
        annotations: vec![],
    }));
    let annotated = Arc::new(Type::Parameterized(ParameterizedType {
        name: dn("Outer$Middle$Inner"),
        arguments: vec![],
        owner: Some(middle),
        annotations: vec![spliced("com.example.Tagged")],
    }));
    assert_eq!(field.ty, annotated);

    match field.annotations[0].target() {
        Some(AnnotationTarget::TypeUse(t)) => assert_eq!(t.ty, annotated),
        other => panic!("expected a type-use target, got {other:?}"),
    }
}

#[test]
fn unappliable_path_keeps_the_annotation_with_a_void_node() {
    // A bridge method's generic signature is elided, so a path into a type
    // argument has nothing to descend into.
    let mut cf = ClassFile::new("com/example/Impl", "java/lang/Object");
    let not_null = annotation(&mut cf.pool, "Lcom/example/NotNull;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_method_parameter(0),
        path: vec![(3, 0)],
        annotation: not_null,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_method(
        flags::ACC_PUBLIC | flags::ACC_BRIDGE | flags::ACC_SYNTHETIC,
        "compareTo",
        "(Ljava/lang/Object;)I",
        vec![rvta],
    );

    let index = index_one(cf.build());
    let class = index.class_by_name(&dn("com.example.Impl")).unwrap();
    let method = class.method("compareTo").unwrap();

    // The parameter type is untouched.
    assert_eq!(*method.parameters[0], Type::class(dn("java.lang.Object")));

    // The usage is still recorded, with the sentinel node.
    assert_eq!(method.annotations.len(), 1);
    assert_eq!(
        method.annotations[0].target(),
        Some(&AnnotationTarget::TypeUse(TypeUseTarget {
            enclosing: EnclosingTarget::Method(MethodRef {
                class: dn("com.example.Impl"),
                name: Arc::from("compareTo"),
                position: 0,
            }),
            ty: Arc::new(Type::void()),
            usage: TypeUsage::MethodParameter { position: 0 },
        }))
    );
}

#[test]
fn class_extends_targets_annotate_supertypes() {
    let mut cf = ClassFile::new("com/example/Sub", "com/example/Base");
    cf.add_interface("java/io/Serializable");
    let critical = annotation(&mut cf.pool, "Lcom/example/Critical;", vec![]);
    let audited = annotation(&mut cf.pool, "Lcom/example/Audited;", vec![]);
    let body = type_annotations(vec![
        TypeAnnotation {
            target: target_class_extends(65535),
            path: vec![],
            annotation: critical,
        },
        TypeAnnotation {
            target: target_class_extends(0),
            path: vec![],
            annotation: audited,
        },
    ]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_class_attr(rvta);

    let index = index_one(cf.build());
    let name = dn("com.example.Sub");
    let class = index.class_by_name(&name).unwrap();

    let annotated_super = Arc::new(Type::Class(ClassType {
        name: dn("com.example.Base"),
        annotations: vec![spliced("com.example.Critical")],
    }));
    assert_eq!(class.super_type.as_ref(), Some(&annotated_super));

    let annotated_iface = Arc::new(Type::Class(ClassType {
        name: dn("java.io.Serializable"),
        annotations: vec![spliced("com.example.Audited")],
    }));
    assert_eq!(class.interface_types[0], annotated_iface);

    let critical = index.annotations_of(&dn("com.example.Critical"));
    assert_eq!(
        critical[0].target(),
        Some(&AnnotationTarget::TypeUse(TypeUseTarget {
            enclosing: EnclosingTarget::Class(name.clone()),
            ty: annotated_super,
            usage: TypeUsage::ClassExtends { position: 65535 },
        }))
    );
    let audited = index.annotations_of(&dn("com.example.Audited"));
    assert_eq!(
        audited[0].target(),
        Some(&AnnotationTarget::TypeUse(TypeUseTarget {
            enclosing: EnclosingTarget::Class(name),
            ty: annotated_iface,
            usage: TypeUsage::ClassExtends { position: 0 },
        }))
    );
}

#[test]
fn receiver_annotation_synthesizes_the_receiver_type() {
    let mut cf = ClassFile::new("com/example/Resource", "java/lang/Object");
    let locked = annotation(&mut cf.pool, "Lcom/example/Locked;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_receiver(),
        path: vec![],
        annotation: locked,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_method(flags::ACC_PUBLIC, "close", "()V", vec![rvta]);

    let index = index_one(cf.build());
    let class = index.class_by_name(&dn("com.example.Resource")).unwrap();
    let method = class.method("close").unwrap();

    let annotated = Arc::new(Type::Class(ClassType {
        name: dn("com.example.Resource"),
        annotations: vec![spliced("com.example.Locked")],
    }));
    assert_eq!(method.receiver_type.as_ref(), Some(&annotated));

    match method.annotations[0].target() {
        Some(AnnotationTarget::TypeUse(t)) => {
            assert_eq!(t.ty, annotated);
            assert_eq!(t.usage, TypeUsage::Receiver);
        }
        other => panic!("expected a type-use target, got {other:?}"),
    }
}

#[test]
fn type_parameter_bound_is_rebuilt_in_place() {
    let mut cf = ClassFile::new("com/example/Bounded", "java/lang/Object");
    let attr = cf.signature_attr("<T:Ljava/lang/Object;>Ljava/lang/Object;");
    cf.add_class_attr(attr);
    let pure = annotation(&mut cf.pool, "Lcom/example/Pure;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_class_type_parameter_bound(0, 0),
        path: vec![],
        annotation: pure,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_class_attr(rvta);

    let index = index_one(cf.build());
    let class = index.class_by_name(&dn("com.example.Bounded")).unwrap();

    let annotated = Arc::new(Type::Class(ClassType {
        name: dn("java.lang.Object"),
        annotations: vec![spliced("com.example.Pure")],
    }));
    assert_eq!(
        *class.type_parameters[0],
        Type::TypeVariable(TypeVariable {
            identifier: Arc::from("T"),
            bounds: vec![annotated.clone()],
            annotations: vec![],
        })
    );

    let pure = index.annotations_of(&dn("com.example.Pure"));
    assert_eq!(
        pure[0].target(),
        Some(&AnnotationTarget::TypeUse(TypeUseTarget {
            enclosing: EnclosingTarget::Class(dn("com.example.Bounded")),
            ty: annotated,
            usage: TypeUsage::TypeParameterBound {
                position: 0,
                bound: 0,
            },
        }))
    );
}

#[test]
fn array_dimension_step_splits_the_array_node() {
    let mut cf = ClassFile::new("com/example/Grid", "java/lang/Object");
    let not_null = annotation(&mut cf.pool, "Lcom/example/NotNull;", vec![]);
    let body = type_annotations(vec![TypeAnnotation {
        target: target_empty_field(),
        path: vec![(0, 0)], // one array dimension deep
        annotation: not_null,
    }]);
    let rvta = cf.attr("RuntimeVisibleTypeAnnotations", body);
    cf.add_field(flags::ACC_PRIVATE, "cells", "[[Ljava/lang/String;", vec![rvta]);

    let index = index_one(cf.build());
    let class = index.class_by_name(&dn("com.example.Grid")).unwrap();
    let field = class.field("cells").unwrap();

    // The descriptor parses to one two-dimensional node; annotating between
    // the dimensions splits it.
    let annotated = Arc::new(Type::Array(ArrayType {
        component: class_ty("java.lang.String"),
        dimensions: 1,
        annotations: vec![spliced("com.example.NotNull")],
    }));
    assert_eq!(
        *field.ty,
        Type::Array(ArrayType {
            component: annotated.clone(),
            dimensions: 1,
            annotations: vec![],
        })
    );

    match field.annotations[0].target() {
        Some(AnnotationTarget::TypeUse(t)) => {
            assert_eq!(t.ty, annotated);
            assert_eq!(t.usage, TypeUsage::Empty);
        }
        other => panic!("expected a type-use target, got {other:?}"),
    }
}
