/// Why a formula produced no value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("formula is {len} bytes, limit is {max}")]
    FormulaTooLong { len: usize, max: usize },

    #[error("formula nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("syntax error at {pos}: {message}")]
    Syntax { pos: usize, message: String },

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("unknown helper: {0}")]
    UnknownHelper(String),

    #[error("helper {name} takes {expected} argument(s), got {got}")]
    HelperArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("arithmetic produced a non-finite number")]
    NotFinite,
}

impl EvalError {
    pub(crate) fn syntax(pos: usize, message: impl Into<String>) -> Self {
        EvalError::Syntax {
            pos,
            message: message.into(),
        }
    }
}
