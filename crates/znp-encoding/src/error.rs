/// Errors that can occur while decoding a wire payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The input ended before the value was complete.
    #[error("unexpected end of payload (needed {needed} bytes, {remaining} remaining)")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// A strict decode left bytes unconsumed.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// A field held a value outside its valid range.
    #[error("invalid {ty} value {value:#x}")]
    InvalidValue { ty: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
