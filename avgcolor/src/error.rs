use crate::average::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Cannot average an empty pixel buffer")]
    EmptyBuffer,
    #[error("The {0} kernel is not supported on this CPU")]
    UnsupportedTier(Tier),
    #[error("Byte buffer length {0} is not a multiple of 4")]
    ByteLength(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
