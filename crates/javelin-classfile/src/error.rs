pub type Result<T> = std::result::Result<T, Error>;

/// Failures while decoding a class file. All of these are unrecoverable for
/// the class being parsed; callers batch-processing many classes typically
/// log and continue with the next input.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of class file")]
    UnexpectedEof,

    #[error("invalid class file magic: 0x{0:08x}")]
    InvalidMagic(u32),

    #[error("invalid constant pool tag {tag} at index {index}")]
    InvalidConstantPoolTag { tag: u8, index: u16 },

    #[error("constant pool index {0} out of bounds")]
    BadConstantPoolIndex(u16),

    #[error("constant pool entry {index} is not a {expected}")]
    ConstantPoolTypeMismatch { index: u16, expected: &'static str },

    #[error("invalid modified UTF-8 constant")]
    InvalidModifiedUtf8,

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("invalid generic signature: {0}")]
    InvalidSignature(String),

    #[error("malformed {0} attribute")]
    MalformedAttribute(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
