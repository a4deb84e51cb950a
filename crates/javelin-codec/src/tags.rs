//! Wire tags shared by the writers and readers.

pub(crate) const TYPE_CLASS: u8 = 0;
pub(crate) const TYPE_ARRAY: u8 = 1;
pub(crate) const TYPE_PRIMITIVE: u8 = 2;
pub(crate) const TYPE_VOID: u8 = 3;
pub(crate) const TYPE_VARIABLE: u8 = 4;
pub(crate) const TYPE_UNRESOLVED_VARIABLE: u8 = 5;
pub(crate) const TYPE_WILDCARD: u8 = 6;
pub(crate) const TYPE_PARAMETERIZED: u8 = 7;

pub(crate) const VALUE_BYTE: u8 = 0;
pub(crate) const VALUE_CHAR: u8 = 1;
pub(crate) const VALUE_SHORT: u8 = 2;
pub(crate) const VALUE_INT: u8 = 3;
pub(crate) const VALUE_LONG: u8 = 4;
pub(crate) const VALUE_FLOAT: u8 = 5;
pub(crate) const VALUE_DOUBLE: u8 = 6;
pub(crate) const VALUE_BOOLEAN: u8 = 7;
pub(crate) const VALUE_STRING: u8 = 8;
pub(crate) const VALUE_ENUM: u8 = 9;
pub(crate) const VALUE_CLASS: u8 = 10;
pub(crate) const VALUE_NESTED: u8 = 11;
pub(crate) const VALUE_ARRAY: u8 = 12;

pub(crate) const TARGET_NONE: u8 = 0;
pub(crate) const TARGET_CLASS: u8 = 1;
pub(crate) const TARGET_FIELD: u8 = 2;
pub(crate) const TARGET_METHOD: u8 = 3;
pub(crate) const TARGET_METHOD_PARAMETER: u8 = 4;
pub(crate) const TARGET_RECORD_COMPONENT: u8 = 5;
pub(crate) const TARGET_TYPE_USE: u8 = 6;

pub(crate) const ENCLOSING_CLASS: u8 = 0;
pub(crate) const ENCLOSING_FIELD: u8 = 1;
pub(crate) const ENCLOSING_METHOD: u8 = 2;
pub(crate) const ENCLOSING_RECORD_COMPONENT: u8 = 3;

pub(crate) const USAGE_EMPTY: u8 = 0;
pub(crate) const USAGE_RECEIVER: u8 = 1;
pub(crate) const USAGE_CLASS_EXTENDS: u8 = 2;
pub(crate) const USAGE_METHOD_PARAMETER: u8 = 3;
pub(crate) const USAGE_TYPE_PARAMETER: u8 = 4;
pub(crate) const USAGE_TYPE_PARAMETER_BOUND: u8 = 5;
pub(crate) const USAGE_THROWS: u8 = 6;

pub(crate) const NESTING_TOP: u8 = 0;
pub(crate) const NESTING_INNER: u8 = 1;
pub(crate) const NESTING_LOCAL: u8 = 2;
pub(crate) const NESTING_ANONYMOUS: u8 = 3;
