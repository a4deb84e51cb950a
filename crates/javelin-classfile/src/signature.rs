use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use javelin_core::{
    ParameterizedType, Primitive, Type, TypeVariable, UnresolvedTypeVariable, WildcardType,
};

use crate::error::{Error, Result};
use crate::interners::Interners;

/// Type variables visible at some point: the identifier and the resolved
/// variable it denotes.
pub(crate) type Scope = HashMap<Arc<str>, Arc<Type>>;

#[derive(Debug)]
pub(crate) struct ClassSignature {
    pub type_parameters: Vec<Arc<Type>>,
    pub super_type: Arc<Type>,
    pub interfaces: Vec<Arc<Type>>,
    /// The class's type parameters, for resolving member signatures.
    pub scope: Scope,
}

#[derive(Debug)]
pub(crate) struct MethodSignature {
    pub type_parameters: Vec<Arc<Type>>,
    pub parameters: Vec<Arc<Type>>,
    pub return_type: Arc<Type>,
    pub exceptions: Vec<Arc<Type>>,
}

/// Parses the `Signature` attribute grammar (JVMS 4.7.9.1).
///
/// The cache maps signature substrings to their parsed trees and is only fed
/// spans that use no type variables, since those parse identically in every
/// scope. It persists across classes for the lifetime of one indexing run.
pub(crate) struct SignatureParser<'a> {
    pools: &'a mut Interners,
    cache: &'a mut HashMap<Box<str>, Arc<Type>>,
}

impl<'a> SignatureParser<'a> {
    pub(crate) fn new(
        pools: &'a mut Interners,
        cache: &'a mut HashMap<Box<str>, Arc<Type>>,
    ) -> SignatureParser<'a> {
        SignatureParser { pools, cache }
    }

    pub(crate) fn parse_class_signature(&mut self, sig: &str) -> Result<ClassSignature> {
        let mut p = Parse::new(self.pools, self.cache, sig, Scope::new());
        let type_parameters = if p.peek() == Some(b'<') {
            p.parse_type_parameters()?
        } else {
            Vec::new()
        };
        let super_type = p.parse_class_type()?;
        let mut interfaces = Vec::new();
        while !p.at_end() {
            interfaces.push(p.parse_class_type()?);
        }
        Ok(ClassSignature {
            type_parameters,
            super_type,
            interfaces: p.pools.type_list(interfaces),
            scope: p.scope,
        })
    }

    pub(crate) fn parse_method_signature(
        &mut self,
        sig: &str,
        class_scope: &Scope,
    ) -> Result<MethodSignature> {
        let mut p = Parse::new(self.pools, self.cache, sig, class_scope.clone());
        let type_parameters = if p.peek() == Some(b'<') {
            p.parse_type_parameters()?
        } else {
            Vec::new()
        };
        p.expect(b'(')?;
        let mut parameters = Vec::new();
        while p.peek() != Some(b')') {
            parameters.push(p.parse_java_type()?);
        }
        p.expect(b')')?;
        let return_type = if p.peek() == Some(b'V') {
            p.pos += 1;
            p.pools.ty(Type::void())
        } else {
            p.parse_java_type()?
        };
        let mut exceptions = Vec::new();
        while p.peek() == Some(b'^') {
            p.pos += 1;
            let ex = if p.peek() == Some(b'T') {
                p.parse_type_variable()?
            } else {
                p.parse_class_type()?
            };
            exceptions.push(ex);
        }
        if !p.at_end() {
            return Err(p.fail());
        }
        Ok(MethodSignature {
            type_parameters,
            parameters: p.pools.type_list(parameters),
            return_type,
            exceptions: p.pools.type_list(exceptions),
        })
    }

    pub(crate) fn parse_field_signature(
        &mut self,
        sig: &str,
        class_scope: &Scope,
    ) -> Result<Arc<Type>> {
        let mut p = Parse::new(self.pools, self.cache, sig, class_scope.clone());
        let ty = p.parse_reference_type()?;
        if !p.at_end() {
            return Err(p.fail());
        }
        Ok(ty)
    }
}

struct Parse<'a, 's> {
    pools: &'a mut Interners,
    cache: &'a mut HashMap<Box<str>, Arc<Type>>,
    input: &'s str,
    pos: usize,
    scope: Scope,
}

impl<'a, 's> Parse<'a, 's> {
    fn new(
        pools: &'a mut Interners,
        cache: &'a mut HashMap<Box<str>, Arc<Type>>,
        input: &'s str,
        scope: Scope,
    ) -> Parse<'a, 's> {
        Parse {
            pools,
            cache,
            input,
            pos: 0,
            scope,
        }
    }

    fn bytes(&self) -> &'s [u8] {
        self.input.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn next(&mut self) -> Result<u8> {
        let b = self.peek().ok_or_else(|| self.fail())?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, b: u8) -> Result<()> {
        if self.next()? != b {
            return Err(Error::InvalidSignature(self.input.to_string()));
        }
        Ok(())
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }

    fn fail(&self) -> Error {
        Error::InvalidSignature(self.input.to_string())
    }

    /// `<Ident ClassBound InterfaceBound* ...>`. Each completed parameter
    /// enters scope immediately, so a bound may refer back to an earlier
    /// parameter and get its full form. Forward and self references parse as
    /// unresolved and are patched to identifier-only variables afterwards,
    /// which is also what keeps `T extends Comparable<T>` acyclic.
    fn parse_type_parameters(&mut self) -> Result<Vec<Arc<Type>>> {
        self.expect(b'<')?;
        let mut identifiers = Vec::new();
        let mut parameters = Vec::new();
        while self.peek() != Some(b'>') {
            let id = self.read_identifier(b':')?;
            let id = self.pools.str(id);
            self.expect(b':')?;
            let mut bounds = Vec::new();
            // The class bound may be empty when the first bound is an
            // interface, as in `T::Ljava/lang/Runnable;`.
            if matches!(self.peek(), Some(b'L') | Some(b'T') | Some(b'[')) {
                bounds.push(self.parse_reference_type()?);
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                bounds.push(self.parse_reference_type()?);
            }
            let bounds = self.pools.type_list(bounds);
            let var = self.pools.ty(Type::TypeVariable(TypeVariable {
                identifier: id.clone(),
                bounds,
                annotations: Vec::new(),
            }));
            self.scope.insert(id.clone(), var.clone());
            identifiers.push(id);
            parameters.push(var);
        }
        self.expect(b'>')?;

        let declared: HashSet<Arc<str>> = identifiers.iter().cloned().collect();
        let parameters: Vec<Arc<Type>> = parameters
            .into_iter()
            .map(|p| self.patch_unresolved(&p, &declared))
            .collect();
        for (id, var) in identifiers.into_iter().zip(parameters.iter()) {
            self.scope.insert(id, var.clone());
        }
        Ok(self.pools.type_list(parameters))
    }

    /// Rebuilds `ty` with every unresolved variable in `declared` replaced by
    /// an identifier-only type variable. Returns the input when nothing
    /// changed.
    fn patch_unresolved(&mut self, ty: &Arc<Type>, declared: &HashSet<Arc<str>>) -> Arc<Type> {
        self.patch_inner(ty, declared).unwrap_or_else(|| ty.clone())
    }

    fn patch_inner(&mut self, ty: &Arc<Type>, declared: &HashSet<Arc<str>>) -> Option<Arc<Type>> {
        let rebuilt = match &**ty {
            Type::UnresolvedTypeVariable(u) if declared.contains(&u.identifier) => {
                Type::TypeVariable(TypeVariable {
                    identifier: u.identifier.clone(),
                    bounds: Vec::new(),
                    annotations: u.annotations.clone(),
                })
            }
            Type::Parameterized(p) => {
                let mut changed = false;
                let arguments: Vec<Arc<Type>> = p
                    .arguments
                    .iter()
                    .map(|a| match self.patch_inner(a, declared) {
                        Some(n) => {
                            changed = true;
                            n
                        }
                        None => a.clone(),
                    })
                    .collect();
                let owner = match &p.owner {
                    Some(o) => match self.patch_inner(o, declared) {
                        Some(n) => {
                            changed = true;
                            Some(n)
                        }
                        None => Some(o.clone()),
                    },
                    None => None,
                };
                if !changed {
                    return None;
                }
                Type::Parameterized(ParameterizedType {
                    name: p.name.clone(),
                    arguments: self.pools.type_list(arguments),
                    owner,
                    annotations: p.annotations.clone(),
                })
            }
            Type::Array(a) => {
                let component = self.patch_inner(&a.component, declared)?;
                Type::array(component, a.dimensions)
            }
            Type::Wildcard(w) => {
                let bound = self.patch_inner(w.bound.as_ref()?, declared)?;
                Type::Wildcard(WildcardType {
                    extends: w.extends,
                    bound: Some(bound),
                    annotations: w.annotations.clone(),
                })
            }
            Type::TypeVariable(v) => {
                let mut changed = false;
                let bounds: Vec<Arc<Type>> = v
                    .bounds
                    .iter()
                    .map(|b| match self.patch_inner(b, declared) {
                        Some(n) => {
                            changed = true;
                            n
                        }
                        None => b.clone(),
                    })
                    .collect();
                if !changed {
                    return None;
                }
                Type::TypeVariable(TypeVariable {
                    identifier: v.identifier.clone(),
                    bounds: self.pools.type_list(bounds),
                    annotations: v.annotations.clone(),
                })
            }
            _ => return None,
        };
        Some(self.pools.ty(rebuilt))
    }

    /// BaseType or ReferenceTypeSignature.
    fn parse_java_type(&mut self) -> Result<Arc<Type>> {
        if let Some(primitive) = self.peek().and_then(Primitive::from_descriptor) {
            self.pos += 1;
            return Ok(self.pools.ty(Type::primitive(primitive)));
        }
        self.parse_reference_type()
    }

    fn parse_reference_type(&mut self) -> Result<Arc<Type>> {
        let start = self.pos;
        let span = scan_type_end(self.bytes(), start);
        if let Some((end, false)) = span {
            if let Some(cached) = self.cache.get(&self.input[start..end]) {
                let cached = cached.clone();
                self.pos = end;
                return Ok(cached);
            }
        }
        let ty = match self.peek() {
            Some(b'[') => self.parse_array_type()?,
            Some(b'T') => self.parse_type_variable()?,
            Some(b'L') => self.parse_class_type()?,
            _ => return Err(self.fail()),
        };
        if let Some((end, false)) = span {
            self.cache.insert(self.input[start..end].into(), ty.clone());
        }
        Ok(ty)
    }

    fn parse_array_type(&mut self) -> Result<Arc<Type>> {
        let mut dimensions = 0u32;
        while self.peek() == Some(b'[') {
            dimensions += 1;
            self.pos += 1;
        }
        if dimensions > u8::MAX as u32 {
            return Err(self.fail());
        }
        let component = self.parse_java_type()?;
        if matches!(&*component, Type::Void(_)) {
            return Err(self.fail());
        }
        Ok(self.pools.ty(Type::array(component, dimensions as u8)))
    }

    fn parse_type_variable(&mut self) -> Result<Arc<Type>> {
        self.expect(b'T')?;
        let id = self.read_identifier(b';')?;
        self.expect(b';')?;
        if let Some(var) = self.scope.get(id) {
            return Ok(var.clone());
        }
        let identifier = self.pools.str(id);
        Ok(self
            .pools
            .ty(Type::UnresolvedTypeVariable(UnresolvedTypeVariable {
                identifier,
                annotations: Vec::new(),
            })))
    }

    /// ClassTypeSignature. The erased dollar-form name accumulates across
    /// `.Suffix` levels; a level gets its own tree node only once it (or an
    /// enclosing level) carries type arguments, so `La/B$C;` stays one plain
    /// class type while `La/B<TT;>.C;` nests.
    fn parse_class_type(&mut self) -> Result<Arc<Type>> {
        self.expect(b'L')?;
        let mut raw = String::new();
        let mut current: Option<Arc<Type>> = None;
        loop {
            let seg_start = self.pos;
            while !matches!(self.peek(), Some(b'<') | Some(b';') | Some(b'.') | None) {
                self.pos += 1;
            }
            if self.pos == seg_start {
                return Err(self.fail());
            }
            raw.push_str(&self.input[seg_start..self.pos]);

            let arguments = if self.peek() == Some(b'<') {
                Some(self.parse_type_arguments()?)
            } else {
                None
            };
            if arguments.is_some() || current.is_some() {
                let name = self.pools.name(&raw);
                let node = Type::Parameterized(ParameterizedType {
                    name,
                    arguments: arguments.unwrap_or_default(),
                    owner: current.take(),
                    annotations: Vec::new(),
                });
                current = Some(self.pools.ty(node));
            }
            match self.next()? {
                b';' => break,
                b'.' => raw.push('$'),
                _ => return Err(self.fail()),
            }
        }
        Ok(match current {
            Some(ty) => ty,
            None => {
                let name = self.pools.name(&raw);
                self.pools.ty(Type::class(name))
            }
        })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<Arc<Type>>> {
        self.expect(b'<')?;
        let mut arguments = Vec::new();
        while self.peek() != Some(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    self.pools.ty(Type::Wildcard(WildcardType {
                        extends: true,
                        bound: None,
                        annotations: Vec::new(),
                    }))
                }
                Some(b'+') | Some(b'-') => {
                    let extends = self.next()? == b'+';
                    let bound = self.parse_reference_type()?;
                    self.pools.ty(Type::Wildcard(WildcardType {
                        extends,
                        bound: Some(bound),
                        annotations: Vec::new(),
                    }))
                }
                _ => self.parse_reference_type()?,
            };
            arguments.push(arg);
        }
        self.expect(b'>')?;
        Ok(self.pools.type_list(arguments))
    }

    fn read_identifier(&mut self, stop: u8) -> Result<&'s str> {
        let start = self.pos;
        while !matches!(self.peek(), None | Some(b'<') | Some(b'>')) && self.peek() != Some(stop) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.fail());
        }
        Ok(&self.input[start..self.pos])
    }
}

/// Finds the end of the reference type starting at `start` with a flat
/// bracket-depth scan and reports whether the span uses any type variable.
/// Returns `None` for text the scan cannot delimit; the recursive parser then
/// produces the real error.
fn scan_type_end(bytes: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut i = start;
    let mut has_var = false;
    while bytes.get(i) == Some(&b'[') {
        i += 1;
    }
    match *bytes.get(i)? {
        b'T' => {
            while *bytes.get(i)? != b';' {
                i += 1;
            }
            Some((i + 1, true))
        }
        b'L' => {
            let mut depth = 0u32;
            let mut prev = b'L';
            i += 1;
            loop {
                let c = *bytes.get(i)?;
                match c {
                    b'<' => depth += 1,
                    b'>' => depth = depth.checked_sub(1)?,
                    b';' if depth == 0 => return Some((i + 1, has_var)),
                    // A type variable use can only start right after one of
                    // these; a 'T' elsewhere is part of an identifier.
                    b'T' if matches!(prev, b'<' | b';' | b'+' | b'-' | b'[' | b'*') => {
                        has_var = true
                    }
                    _ => {}
                }
                prev = c;
                i += 1;
            }
        }
        c if Primitive::from_descriptor(c).is_some() => Some((i + 1, false)),
        _ => None,
    }
}
