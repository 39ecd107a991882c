use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("spi error: {0}")]
    Spi(String),
    #[error("sensor timeout")]
    Timeout,
    #[error("storage access out of bounds: offset {offset} len {len} (block {size})")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
