use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn unknown_vindex_type(name: impl Into<String>) -> Error {
        Error(ErrorKind::UnknownVindexType { name: name.into() }.into())
    }

    pub fn duplicate_vindex_type(name: impl Into<String>) -> Error {
        Error(ErrorKind::DuplicateVindexType { name: name.into() }.into())
    }

    pub fn multiple_results(vindex: impl Into<String>, value: impl Into<String>) -> Error {
        Error(
            ErrorKind::MultipleResults {
                vindex: vindex.into(),
                value: value.into(),
            }
            .into(),
        )
    }

    /// Tags a failure reported by a lookup delegate or an execution cursor with the
    /// vindex operation that triggered it. The source error is kept as is.
    pub fn delegate<E>(operation: impl Into<String>, source: E) -> Error
    where
        E: Into<StdErrorBoxed>,
    {
        Error(
            ErrorKind::Delegate {
                operation: operation.into(),
                source: source.into(),
            }
            .into(),
        )
    }

    /// Returns `true` if this is a configuration (argument) error.
    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("vindex type '{name}' not found")]
    UnknownVindexType { name: String },

    #[error("vindex type '{name}' is already registered")]
    DuplicateVindexType { name: String },

    #[error("lookup.Map: unexpected multiple results from vindex {vindex}: {value}")]
    MultipleResults { vindex: String, value: String },

    #[error("{operation}: {source}")]
    Delegate {
        operation: String,
        source: StdErrorBoxed,
    },

    #[error("failed to serialize vindex: {source}")]
    Serialization { source: serde_json::Error },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::Serialization { source: e }.into()
    }
}
