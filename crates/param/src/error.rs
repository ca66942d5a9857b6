use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParameterizeError {
    #[error("failed to serialize parameterized body: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("serialized body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
