use thiserror::Error;

pub const MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Error)]
pub enum LimitError {
    #[error("response too large: {actual} bytes (max {max})")]
    TooLarge { max: usize, actual: usize },
}

pub type LimitResult<T> = Result<T, LimitError>;

pub fn enforce_max_response_size(len: usize, max: usize) -> LimitResult<()> {
    if len > max {
        return Err(LimitError::TooLarge { max, actual: len });
    }
    Ok(())
}
