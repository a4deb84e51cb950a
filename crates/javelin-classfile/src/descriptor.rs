use std::sync::Arc;

use javelin_core::{Primitive, Type};

use crate::error::{Error, Result};
use crate::interners::Interners;

/// Parses a field descriptor (`[Ljava/lang/String;`, `I`, ...) into an
/// interned type. `V` is accepted because class literals in annotation
/// values may name `void.class`.
pub(crate) fn parse_field_descriptor(pools: &mut Interners, desc: &str) -> Result<Arc<Type>> {
    let bytes = desc.as_bytes();
    let mut pos = 0usize;
    let ty = parse_type(pools, desc, bytes, &mut pos)?;
    if pos != bytes.len() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

/// Parses a method descriptor into its parameter list and return type.
pub(crate) fn parse_method_descriptor(
    pools: &mut Interners,
    desc: &str,
) -> Result<(Vec<Arc<Type>>, Arc<Type>)> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    let mut pos = 1usize;
    let mut parameters = Vec::new();
    while bytes.get(pos) != Some(&b')') {
        parameters.push(parse_type(pools, desc, bytes, &mut pos)?);
    }
    pos += 1;
    let return_type = parse_type(pools, desc, bytes, &mut pos)?;
    if pos != bytes.len() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok((pools.type_list(parameters), return_type))
}

fn parse_type(
    pools: &mut Interners,
    desc: &str,
    bytes: &[u8],
    pos: &mut usize,
) -> Result<Arc<Type>> {
    let mut dimensions = 0u32;
    while bytes.get(*pos) == Some(&b'[') {
        dimensions += 1;
        *pos += 1;
    }
    if dimensions > u8::MAX as u32 {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    let &first = bytes.get(*pos).ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    let component = match first {
        b'L' => {
            let start = *pos + 1;
            let end = bytes[start..]
                .iter()
                .position(|&b| b == b';')
                .map(|i| start + i)
                .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
            *pos = end + 1;
            let name = pools.name(&desc[start..end]);
            pools.ty(Type::class(name))
        }
        b'V' => {
            *pos += 1;
            pools.ty(Type::void())
        }
        c => {
            let primitive = Primitive::from_descriptor(c)
                .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
            *pos += 1;
            pools.ty(Type::primitive(primitive))
        }
    };
    if dimensions == 0 {
        return Ok(component);
    }
    if matches!(&*component, Type::Void(_)) {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(pools.ty(Type::array(component, dimensions as u8)))
}
