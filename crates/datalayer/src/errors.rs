use thiserror::Error;

/// Errors raised by the data layer and its collaborators
#[derive(Debug, Error)]
pub enum DataLayerError {
    #[error("session store error: {0}")]
    Session(String),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("output error: {0}")]
    Output(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataLayerError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            DataLayerError::Session(_) => 2001,
            DataLayerError::Serialize(_) => 2002,
            DataLayerError::Output(_) => 2003,
            DataLayerError::InvalidArgument(_) => 2004,
            DataLayerError::Io(_) => 2005,
        }
    }

    pub fn session(msg: impl Into<String>) -> Self { Self::Session(msg.into()) }

    pub fn invalid(msg: impl Into<String>) -> Self { Self::InvalidArgument(msg.into()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let errs = [
            DataLayerError::session("x"),
            DataLayerError::Output("x".into()),
            DataLayerError::invalid("x"),
            DataLayerError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")),
        ];
        let mut codes: Vec<u16> = errs.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn display_carries_message() {
        let e = DataLayerError::invalid("keys and values differ in length");
        assert_eq!(e.to_string(), "invalid argument: keys and values differ in length");
    }
}
