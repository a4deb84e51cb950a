pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid index file magic: 0x{0:08x}")]
    InvalidMagic(u32),

    /// The version byte named a format this build cannot read or write.
    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u8),

    #[error("corrupt index: {0}")]
    Corrupt(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
