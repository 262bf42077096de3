use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("input index {0} out of range")]
    InputIndexOutOfRange(usize),
    #[error("serialization error: {0}")]
    SerializationError(String),
}
