//! Decoding and resolution of `RuntimeVisibleTypeAnnotations`.
//!
//! Resolution runs in two passes over a class's pending type annotations.
//! Pass A walks each annotation's type path from its target's start type,
//! rebuilds the addressed branch with the annotation attached (sharing all
//! untouched children), and stores the rebuilt tree back into the member.
//! Pass B re-walks every path against the members' final state, so the
//! recorded target points at the node as it exists after *all* annotations
//! on that member have been spliced in.
//!
//! A path that cannot be applied (an index out of bounds, or generic
//! structure the compiler elided, as with bridge methods) does not lose the
//! annotation: it is still recorded, with the void sentinel standing in for
//! the annotated node.

use std::collections::HashMap;
use std::sync::Arc;

use javelin_core::{
    flags, AnnotationInstance, AnnotationTarget, ArrayType, DotName, ParameterizedType, Type,
    TypeUsage, TypeUseTarget, WildcardType,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::indexer::{ClassState, MemberSlot, PendingTypeAnnotation};
use crate::interners::Interners;
use crate::reader::Reader;

/// One step of a JVMS 4.7.20.2 type path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathStep {
    /// Deeper into an array's component.
    Array,
    /// Deeper into a nested (inner) type.
    Nested,
    /// Into the bound of a wildcard argument.
    WildcardBound,
    /// Into the i-th type argument.
    TypeArgument(u8),
}

/// Decodes a `target_type` byte and its target info. Only the declaration
/// targets that can occur outside a `Code` attribute are recognized.
pub(crate) fn read_target(r: &mut Reader<'_>) -> Result<TypeUsage> {
    let target_type = r.read_u1()?;
    Ok(match target_type {
        0x00 | 0x01 => TypeUsage::TypeParameter {
            position: r.read_u1()? as u16,
        },
        0x10 => TypeUsage::ClassExtends {
            position: r.read_u2()?,
        },
        0x11 | 0x12 => TypeUsage::TypeParameterBound {
            position: r.read_u1()? as u16,
            bound: r.read_u1()? as u16,
        },
        0x13 | 0x14 => TypeUsage::Empty,
        0x15 => TypeUsage::Receiver,
        0x16 => TypeUsage::MethodParameter {
            position: r.read_u1()? as u16,
        },
        0x17 => TypeUsage::Throws {
            position: r.read_u2()?,
        },
        _ => return Err(Error::MalformedAttribute("RuntimeVisibleTypeAnnotations")),
    })
}

pub(crate) fn read_type_path(r: &mut Reader<'_>) -> Result<Vec<PathStep>> {
    let count = r.read_u1()?;
    let mut path = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = r.read_u1()?;
        let argument = r.read_u1()?;
        path.push(match kind {
            0 => PathStep::Array,
            1 => PathStep::Nested,
            2 => PathStep::WildcardBound,
            3 => PathStep::TypeArgument(argument),
            _ => return Err(Error::MalformedAttribute("RuntimeVisibleTypeAnnotations")),
        });
    }
    Ok(path)
}

pub(crate) struct TypePathResolver<'a> {
    pools: &'a mut Interners,
}

impl<'a> TypePathResolver<'a> {
    pub(crate) fn new(pools: &'a mut Interners) -> TypePathResolver<'a> {
        TypePathResolver { pools }
    }

    /// Resolves and records every pending type annotation of `state`.
    pub(crate) fn resolve_all(&mut self, state: &mut ClassState) {
        let mut pending = std::mem::take(&mut state.pending);

        for p in &mut pending {
            if matches!(p.usage, TypeUsage::Receiver) {
                self.ensure_receiver(state, &p.slot);
            }
            p.applied = self.splice(state, p);
            if !p.applied {
                debug!(
                    class = %state.name,
                    annotation = %p.annotation.name,
                    "type annotation path could not be applied"
                );
            }
        }

        for p in &pending {
            let ty = if p.applied {
                self.locate_target(state, p)
            } else {
                None
            };
            let ty = match ty {
                Some(ty) => ty,
                None => self.pools.ty(Type::void()),
            };
            let target = AnnotationTarget::TypeUse(TypeUseTarget {
                enclosing: state.enclosing_target(&p.slot),
                ty,
                usage: p.usage,
            });
            let instance = p.annotation.with_target(Some(target));
            state.record_annotation(&p.slot, instance);
        }
    }

    /// A receiver annotation on a method without an explicit receiver type
    /// materializes one: the plain declaring class.
    fn ensure_receiver(&mut self, state: &mut ClassState, slot: &MemberSlot) {
        if let MemberSlot::Method(i) = slot {
            if state.methods[*i].receiver.is_none() {
                let ty = self.pools.ty(Type::class(state.name.clone()));
                state.methods[*i].receiver = Some(ty);
            }
        }
    }

    fn splice(&mut self, state: &mut ClassState, p: &PendingTypeAnnotation) -> bool {
        let Some(start) = get_slot_type(state, &p.slot, &p.usage) else {
            return false;
        };
        let Some(rebuilt) = self.apply(state, &start, &p.path, &p.annotation) else {
            return false;
        };
        set_slot_type(state, &p.slot, &p.usage, rebuilt)
    }

    fn locate_target(&mut self, state: &ClassState, p: &PendingTypeAnnotation) -> Option<Arc<Type>> {
        let start = get_slot_type(state, &p.slot, &p.usage)?;
        self.locate(state, &start, &p.path)
    }

    /// Pass A: rebuilds the branch of `ty` addressed by `path` with the
    /// annotation attached to its tip. `None` means the path does not fit
    /// the tree and the splice must be dropped.
    fn apply(
        &mut self,
        state: &ClassState,
        ty: &Arc<Type>,
        path: &[PathStep],
        annotation: &AnnotationInstance,
    ) -> Option<Arc<Type>> {
        let Some(step) = path.first() else {
            return Some(self.pools.ty(ty.with_added_annotation(annotation.clone())));
        };
        match step {
            PathStep::Array => {
                let n = leading(path, PathStep::Array);
                let Type::Array(arr) = &**ty else {
                    return None;
                };
                let dims = arr.dimensions as usize;
                let consumed = n.min(dims);
                let rest = &path[consumed..];
                if consumed < dims {
                    // The annotation lands between dimensions: split the
                    // array so the annotated remainder is its own node.
                    let inner = self
                        .pools
                        .ty(Type::array(arr.component.clone(), (dims - consumed) as u8));
                    let inner = self.apply(state, &inner, rest, annotation)?;
                    Some(self.pools.ty(Type::Array(ArrayType {
                        component: inner,
                        dimensions: consumed as u8,
                        annotations: arr.annotations.clone(),
                    })))
                } else {
                    let component = self.apply(state, &arr.component, rest, annotation)?;
                    Some(self.pools.ty(Type::Array(ArrayType {
                        component,
                        dimensions: arr.dimensions,
                        annotations: arr.annotations.clone(),
                    })))
                }
            }
            PathStep::TypeArgument(i) => {
                let Type::Parameterized(pt) = &**ty else {
                    return None;
                };
                let argument = pt.arguments.get(*i as usize)?;
                let argument = self.apply(state, argument, &path[1..], annotation)?;
                let mut arguments = pt.arguments.clone();
                arguments[*i as usize] = argument;
                let arguments = self.pools.type_list(arguments);
                Some(self.pools.ty(Type::Parameterized(ParameterizedType {
                    name: pt.name.clone(),
                    arguments,
                    owner: pt.owner.clone(),
                    annotations: pt.annotations.clone(),
                })))
            }
            PathStep::WildcardBound => {
                let Type::Wildcard(w) = &**ty else {
                    return None;
                };
                let bound = self.apply(state, w.bound.as_ref()?, &path[1..], annotation)?;
                Some(self.pools.ty(Type::Wildcard(WildcardType {
                    extends: w.extends,
                    bound: Some(bound),
                    annotations: w.annotations.clone(),
                })))
            }
            PathStep::Nested => {
                let depth = leading(path, PathStep::Nested);
                self.apply_nested(state, ty, depth, &path[depth..], annotation)
            }
        }
    }

    /// Nested steps count inward from the outermost class, and only levels
    /// that are non-static members consume a step (a static level cannot
    /// carry an enclosing instance, so source syntax cannot annotate it).
    /// The annotated level may be missing from the parsed tree entirely,
    /// e.g. `Outer.Inner` erased to one dollar name; a bare class type is
    /// synthesized for it, which turns the level below into a parameterized
    /// node so the owner link has somewhere to live.
    fn apply_nested(
        &mut self,
        state: &ClassState,
        ty: &Arc<Type>,
        depth: usize,
        rest: &[PathStep],
        annotation: &AnnotationInstance,
    ) -> Option<Arc<Type>> {
        let queue = class_queue(state, ty)?;
        let owners = owner_map(ty);

        let mut remaining = depth;
        let mut target = None;
        for (i, level) in queue.iter().enumerate() {
            let consumes = state
                .inner_classes
                .get(level)
                .map(|e| e.flags & flags::ACC_STATIC == 0)
                .unwrap_or(false);
            if consumes {
                remaining -= 1;
                if remaining == 0 {
                    target = Some(i);
                    break;
                }
            }
        }
        let target = target?;

        let base = match owners.get(&queue[target]) {
            Some(existing) => existing.clone(),
            None => self.pools.ty(Type::class(queue[target].clone())),
        };
        let mut current = self.apply(state, &base, rest, annotation)?;

        for level in &queue[target + 1..] {
            current = match owners.get(level) {
                Some(existing) => match &**existing {
                    Type::Parameterized(pt) => {
                        self.pools.ty(Type::Parameterized(ParameterizedType {
                            name: pt.name.clone(),
                            arguments: pt.arguments.clone(),
                            owner: Some(current),
                            annotations: pt.annotations.clone(),
                        }))
                    }
                    Type::Class(ct) => self.pools.ty(Type::Parameterized(ParameterizedType {
                        name: ct.name.clone(),
                        arguments: Vec::new(),
                        owner: Some(current),
                        annotations: ct.annotations.clone(),
                    })),
                    _ => return None,
                },
                None => self.pools.ty(Type::Parameterized(ParameterizedType {
                    name: level.clone(),
                    arguments: Vec::new(),
                    owner: Some(current),
                    annotations: Vec::new(),
                })),
            };
        }
        Some(current)
    }

    /// Pass B: walks `path` through the final member state and returns the
    /// node it addresses.
    fn locate(&mut self, state: &ClassState, ty: &Arc<Type>, path: &[PathStep]) -> Option<Arc<Type>> {
        let Some(step) = path.first() else {
            return Some(ty.clone());
        };
        match step {
            PathStep::Array => {
                let n = leading(path, PathStep::Array);
                let Type::Array(arr) = &**ty else {
                    return None;
                };
                let dims = arr.dimensions as usize;
                if dims > n {
                    return None;
                }
                self.locate(state, &arr.component, &path[dims..])
            }
            PathStep::TypeArgument(i) => {
                let Type::Parameterized(pt) = &**ty else {
                    return None;
                };
                self.locate(state, pt.arguments.get(*i as usize)?, &path[1..])
            }
            PathStep::WildcardBound => {
                let Type::Wildcard(w) = &**ty else {
                    return None;
                };
                self.locate(state, w.bound.as_ref()?, &path[1..])
            }
            PathStep::Nested => {
                let depth = leading(path, PathStep::Nested);
                let queue = class_queue(state, ty)?;
                let owners = owner_map(ty);
                let mut remaining = depth;
                for level in &queue {
                    let consumes = state
                        .inner_classes
                        .get(level)
                        .map(|e| e.flags & flags::ACC_STATIC == 0)
                        .unwrap_or(false);
                    if consumes {
                        remaining -= 1;
                        if remaining == 0 {
                            let node = owners.get(level)?;
                            let node = node.clone();
                            return self.locate(state, &node, &path[depth..]);
                        }
                    }
                }
                None
            }
        }
    }
}

fn leading(path: &[PathStep], step: PathStep) -> usize {
    path.iter().take_while(|&&s| s == step).count()
}

/// Nesting levels of the type's erased name, outermost first, as recorded by
/// the class's `InnerClasses` table. Stops at levels the table does not
/// chain (local and anonymous classes nest through a method instead).
fn class_queue(state: &ClassState, ty: &Arc<Type>) -> Option<Vec<DotName>> {
    let name = match &**ty {
        Type::Class(c) => c.name.clone(),
        Type::Parameterized(p) => p.name.clone(),
        _ => return None,
    };
    let mut queue = vec![name.clone()];
    let mut current = name;
    while let Some(entry) = state.inner_classes.get(&current) {
        let Some(enclosing) = entry.enclosing_class.clone() else {
            break;
        };
        queue.push(enclosing.clone());
        current = enclosing;
    }
    queue.reverse();
    Some(queue)
}

/// The type nodes of the owner chain, keyed by their erased names.
fn owner_map(ty: &Arc<Type>) -> HashMap<DotName, Arc<Type>> {
    let mut map = HashMap::new();
    let mut current = Some(ty.clone());
    while let Some(node) = current {
        let (name, owner) = match &*node {
            Type::Class(c) => (c.name.clone(), None),
            Type::Parameterized(p) => (p.name.clone(), p.owner.clone()),
            _ => break,
        };
        map.insert(name, node);
        current = owner;
    }
    map
}

/// The stored type a target's path starts from, given the member's current
/// state. `None` when the target's indices do not fit the member.
fn get_slot_type(state: &ClassState, slot: &MemberSlot, usage: &TypeUsage) -> Option<Arc<Type>> {
    match (slot, usage) {
        (MemberSlot::Class, TypeUsage::ClassExtends { position }) => {
            if *position == 65535 {
                state.super_type.clone()
            } else {
                state.interfaces.get(*position as usize).cloned()
            }
        }
        (MemberSlot::Class, TypeUsage::TypeParameter { position }) => {
            state.type_parameters.get(*position as usize).cloned()
        }
        (MemberSlot::Class, TypeUsage::TypeParameterBound { position, bound }) => {
            bound_of(state.type_parameters.get(*position as usize)?, *bound)
        }
        (MemberSlot::Field(i), TypeUsage::Empty) => state.fields.get(*i).map(|f| f.ty.clone()),
        (MemberSlot::RecordComponent(i), TypeUsage::Empty) => {
            state.record_components.get(*i).map(|c| c.ty.clone())
        }
        (MemberSlot::Method(i), usage) => {
            let method = state.methods.get(*i)?;
            match usage {
                TypeUsage::Empty => Some(method.return_type.clone()),
                TypeUsage::Receiver => method.receiver.clone(),
                TypeUsage::MethodParameter { position } => {
                    method.parameters.get(*position as usize).cloned()
                }
                TypeUsage::Throws { position } => {
                    method.exceptions.get(*position as usize).cloned()
                }
                TypeUsage::TypeParameter { position } => {
                    method.type_parameters.get(*position as usize).cloned()
                }
                TypeUsage::TypeParameterBound { position, bound } => {
                    bound_of(method.type_parameters.get(*position as usize)?, *bound)
                }
                TypeUsage::ClassExtends { .. } => None,
            }
        }
        _ => None,
    }
}

/// Stores a rebuilt type back into the member slot pass A read it from.
fn set_slot_type(
    state: &mut ClassState,
    slot: &MemberSlot,
    usage: &TypeUsage,
    ty: Arc<Type>,
) -> bool {
    match (slot, usage) {
        (MemberSlot::Class, TypeUsage::ClassExtends { position }) => {
            if *position == 65535 {
                state.super_type = Some(ty);
                true
            } else if let Some(slot) = state.interfaces.get_mut(*position as usize) {
                *slot = ty;
                true
            } else {
                false
            }
        }
        (MemberSlot::Class, TypeUsage::TypeParameter { position }) => {
            match state.type_parameters.get_mut(*position as usize) {
                Some(slot) => {
                    *slot = ty;
                    true
                }
                None => false,
            }
        }
        (MemberSlot::Class, TypeUsage::TypeParameterBound { position, bound }) => {
            set_bound(&mut state.type_parameters, *position, *bound, ty)
        }
        (MemberSlot::Field(i), TypeUsage::Empty) => match state.fields.get_mut(*i) {
            Some(field) => {
                field.ty = ty;
                true
            }
            None => false,
        },
        (MemberSlot::RecordComponent(i), TypeUsage::Empty) => {
            match state.record_components.get_mut(*i) {
                Some(component) => {
                    component.ty = ty;
                    true
                }
                None => false,
            }
        }
        (MemberSlot::Method(i), usage) => {
            let Some(method) = state.methods.get_mut(*i) else {
                return false;
            };
            match usage {
                TypeUsage::Empty => {
                    method.return_type = ty;
                    true
                }
                TypeUsage::Receiver => {
                    method.receiver = Some(ty);
                    true
                }
                TypeUsage::MethodParameter { position } => {
                    match method.parameters.get_mut(*position as usize) {
                        Some(slot) => {
                            *slot = ty;
                            true
                        }
                        None => false,
                    }
                }
                TypeUsage::Throws { position } => {
                    match method.exceptions.get_mut(*position as usize) {
                        Some(slot) => {
                            *slot = ty;
                            true
                        }
                        None => false,
                    }
                }
                TypeUsage::TypeParameter { position } => {
                    match method.type_parameters.get_mut(*position as usize) {
                        Some(slot) => {
                            *slot = ty;
                            true
                        }
                        None => false,
                    }
                }
                TypeUsage::TypeParameterBound { position, bound } => {
                    set_bound(&mut method.type_parameters, *position, *bound, ty)
                }
                TypeUsage::ClassExtends { .. } => false,
            }
        }
        _ => false,
    }
}

fn bound_of(variable: &Arc<Type>, bound: u16) -> Option<Arc<Type>> {
    match &**variable {
        Type::TypeVariable(v) => v.bounds.get(bound as usize).cloned(),
        _ => None,
    }
}

fn set_bound(variables: &mut [Arc<Type>], position: u16, bound: u16, ty: Arc<Type>) -> bool {
    let Some(variable) = variables.get_mut(position as usize) else {
        return false;
    };
    let Type::TypeVariable(v) = &**variable else {
        return false;
    };
    if bound as usize >= v.bounds.len() {
        return false;
    }
    let mut rebuilt = v.clone();
    rebuilt.bounds[bound as usize] = ty;
    *variable = Arc::new(Type::TypeVariable(rebuilt));
    true
}
