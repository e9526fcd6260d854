/// Error while loading or building a grammar.
#[derive(Debug)]
pub enum GrammarError {
    Json(serde_json::Error),
    Binary(postcard::Error),
    /// A grammar without productions.
    MissingStart(String),
    UnknownSymbol {
        grammar: String,
        symbol: String,
        referenced_by: Option<String>,
    },
    DuplicateSymbol {
        grammar: String,
        symbol: String,
    },
    DuplicateGrammar(String),
    InvalidUnpack {
        symbol: String,
        message: String,
    },
    InvalidToken {
        symbol: String,
        token: String,
    },
}

impl std::fmt::Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Binary(e) => write!(f, "binary decode error: {e}"),
            Self::MissingStart(grammar) => {
                write!(f, "grammar `{grammar}` has no start production")
            }
            Self::UnknownSymbol {
                grammar,
                symbol,
                referenced_by: Some(parent),
            } => write!(
                f,
                "grammar `{grammar}`: `{parent}` refers to unknown symbol `{symbol}`"
            ),
            Self::UnknownSymbol {
                grammar, symbol, ..
            } => write!(f, "grammar `{grammar}`: unknown start symbol `{symbol}`"),
            Self::DuplicateSymbol { grammar, symbol } => {
                write!(f, "grammar `{grammar}`: symbol `{symbol}` defined twice")
            }
            Self::DuplicateGrammar(name) => write!(f, "grammar `{name}` defined twice"),
            Self::InvalidUnpack { symbol, message } => write!(f, "`{symbol}`: {message}"),
            Self::InvalidToken { symbol, token } => {
                write!(f, "`{symbol}`: invalid lookahead token `{token}`")
            }
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Binary(e) => Some(e),
            _ => None,
        }
    }
}
