use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid Address string provided: {reason}")]
pub struct AddressError {
    pub address: String,
    pub reason: AddressErrorReason,
}

impl AddressError {
    pub(crate) fn new(address: &str, reason: AddressErrorReason) -> Self {
        Self {
            address: address.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressErrorReason {
    #[error("empty")]
    Empty,
    #[error("invalid base58 encoding")]
    InvalidEncoding,
    #[error("too short")]
    TooShort,
    #[error("too long")]
    TooLong,
    #[error("bad checksum")]
    BadChecksum,
    #[error("wrong network")]
    WrongNetwork,
}
