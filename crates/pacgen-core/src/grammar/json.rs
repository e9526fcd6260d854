//! JSON grammar format.
//!
//! Productions are objects tagged by `kind` and keyed by symbol, in
//! definition order. Expressions use serde's external tagging, so
//! `"at_eod"`, `{"field": "len"}` and `{"and": [a, b]}` are all expressions.

use indexmap::IndexMap;
use serde::Deserialize;

use super::GrammarError;
use super::set::GrammarSet;
use super::types::{
    Case, CmpOp, Constant, Expr, Grammar, GrammarBuilder, HookRef, Parameter, Production,
    ProductionKind, TokenId, ValueType, VarType,
};

impl Grammar {
    /// Parse and validate a single grammar from JSON.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: RawGrammar = serde_json::from_str(json).map_err(GrammarError::Json)?;
        raw.try_into()
    }
}

impl GrammarSet {
    /// Parse a JSON document holding one grammar object or an array of them.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let raw: RawDocument = serde_json::from_str(json).map_err(GrammarError::Json)?;
        let raws = match raw {
            RawDocument::One(grammar) => vec![grammar],
            RawDocument::Many(grammars) => grammars,
        };
        let grammars = raws
            .into_iter()
            .map(Grammar::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_grammars(grammars)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Many(Vec<RawGrammar>),
    One(RawGrammar),
}

#[derive(Debug, Deserialize)]
struct RawGrammar {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    start: Option<String>,
    productions: IndexMap<String, RawProduction>,
    #[serde(default)]
    params: Vec<Parameter>,
    #[serde(default)]
    variables: Vec<RawVariable>,
}

impl TryFrom<RawGrammar> for Grammar {
    type Error = GrammarError;

    fn try_from(raw: RawGrammar) -> Result<Self, GrammarError> {
        let mut builder = GrammarBuilder::new(raw.name).description(raw.description);
        if let Some(start) = raw.start {
            builder = builder.start(start);
        }
        for param in raw.params {
            builder = builder.param(param.name, param.ty);
        }
        for var in raw.variables {
            builder = builder.variable(var.name, var.ty, var.default.map(Into::into));
        }
        for (symbol, production) in raw.productions {
            builder = builder.production(production.into_production(symbol)?);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
struct RawVariable {
    name: String,
    #[serde(rename = "type", default)]
    ty: ValueType,
    #[serde(default)]
    default: Option<RawConstant>,
}

#[derive(Debug, Deserialize)]
struct RawProduction {
    #[serde(flatten)]
    kind: RawKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    ty: Option<ValueType>,
    #[serde(default)]
    default: Option<RawConstant>,
    #[serde(default)]
    hooks: Vec<HookRef>,
}

impl RawProduction {
    fn into_production(self, symbol: String) -> Result<Production, GrammarError> {
        let kind = match self.kind {
            RawKind::Literal { value, id } => ProductionKind::Literal {
                value: value.into(),
                id: TokenId(id),
            },
            RawKind::Variable { unpack, filter } => ProductionKind::Variable {
                unpack: unpack.into_var_type(&symbol)?,
                filter,
            },
            RawKind::Epsilon => ProductionKind::Epsilon,
            RawKind::Sequence { members } => ProductionKind::Sequence(members),
            RawKind::Lookahead {
                alternatives,
                lookahead: [first, second],
            } => ProductionKind::LookAhead {
                alternatives,
                lookahead: [
                    convert_tokens(&symbol, first)?,
                    convert_tokens(&symbol, second)?,
                ],
            },
            RawKind::Boolean {
                condition,
                then,
                otherwise,
            } => ProductionKind::Boolean {
                condition: condition.into(),
                then,
                otherwise,
            },
            RawKind::Switch {
                discriminant,
                cases,
                default_case,
            } => ProductionKind::Switch {
                discriminant: discriminant.into(),
                cases: cases
                    .into_iter()
                    .map(|c| Case {
                        value: c.value.into(),
                        production: c.production,
                    })
                    .collect(),
                default: default_case,
            },
            RawKind::Child { grammar, args } => ProductionKind::ChildGrammar {
                grammar,
                args: args.into_iter().map(Into::into).collect(),
            },
        };

        Ok(Production {
            symbol,
            name: self.name,
            ty: self.ty,
            default: self.default.map(Into::into),
            hooks: self.hooks,
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RawKind {
    Literal {
        value: RawBytes,
        id: u32,
    },
    Variable {
        unpack: RawUnpack,
        #[serde(default)]
        filter: Option<String>,
    },
    Epsilon,
    Sequence {
        members: Vec<String>,
    },
    Lookahead {
        alternatives: [String; 2],
        lookahead: [Vec<RawToken>; 2],
    },
    Boolean {
        condition: RawExpr,
        then: String,
        #[serde(default, rename = "else")]
        otherwise: Option<String>,
    },
    Switch {
        discriminant: RawExpr,
        cases: Vec<RawCase>,
        #[serde(default)]
        default_case: Option<String>,
    },
    Child {
        grammar: String,
        #[serde(default)]
        args: Vec<RawExpr>,
    },
}

#[derive(Debug, Deserialize)]
struct RawCase {
    value: RawConstant,
    production: String,
}

/// Literal bytes: a UTF-8 string or an array of byte values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBytes {
    Text(String),
    Raw(Vec<u8>),
}

impl From<RawBytes> for Vec<u8> {
    fn from(raw: RawBytes) -> Self {
        match raw {
            RawBytes::Text(s) => s.into_bytes(),
            RawBytes::Raw(b) => b,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUnpack {
    Named(String),
    Bytes { bytes: RawExpr },
}

impl RawUnpack {
    fn into_var_type(self, symbol: &str) -> Result<VarType, GrammarError> {
        match self {
            Self::Named(name) => name.parse().map_err(|message| GrammarError::InvalidUnpack {
                symbol: symbol.to_owned(),
                message,
            }),
            Self::Bytes { bytes } => Ok(VarType::Bytes {
                length: bytes.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawToken {
    Id(u32),
    Named(String),
}

fn convert_tokens(symbol: &str, raw: Vec<RawToken>) -> Result<Vec<TokenId>, GrammarError> {
    raw.into_iter()
        .map(|token| match token {
            RawToken::Id(id) => Ok(TokenId(id)),
            RawToken::Named(name) if name == "eod" => Ok(TokenId::EOD),
            RawToken::Named(name) => Err(GrammarError::InvalidToken {
                symbol: symbol.to_owned(),
                token: name,
            }),
        })
        .collect()
}

/// Untagged constant; strings become bytes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConstant {
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Text(String),
    List(Vec<RawConstant>),
}

impl From<RawConstant> for Constant {
    fn from(raw: RawConstant) -> Self {
        match raw {
            RawConstant::Null => Constant::Null,
            RawConstant::Bool(b) => Constant::Bool(b),
            RawConstant::UInt(n) => Constant::UInt(n),
            RawConstant::Int(n) => Constant::Int(n),
            RawConstant::Text(s) => Constant::Bytes(s.into_bytes()),
            RawConstant::List(items) => Constant::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawExpr {
    Const(RawConstant),
    Field(String),
    Param(String),
    AtEod,
    Stop,
    Not(Box<RawExpr>),
    And(Box<RawExpr>, Box<RawExpr>),
    Or(Box<RawExpr>, Box<RawExpr>),
    Eq(Box<RawExpr>, Box<RawExpr>),
    Ne(Box<RawExpr>, Box<RawExpr>),
    Lt(Box<RawExpr>, Box<RawExpr>),
    Le(Box<RawExpr>, Box<RawExpr>),
    Gt(Box<RawExpr>, Box<RawExpr>),
    Ge(Box<RawExpr>, Box<RawExpr>),
    Len(Box<RawExpr>),
}

impl From<RawExpr> for Expr {
    fn from(raw: RawExpr) -> Self {
        #[allow(clippy::boxed_local)] // Operands are Box<RawExpr>, output needs Box<Expr>
        fn conv(e: Box<RawExpr>) -> Box<Expr> {
            Box::new(Expr::from(*e))
        }

        let cmp = |op, a, b| Expr::Compare(op, conv(a), conv(b));

        match raw {
            RawExpr::Const(c) => Expr::Const(c.into()),
            RawExpr::Field(name) => Expr::Field(name),
            RawExpr::Param(name) => Expr::Param(name),
            RawExpr::AtEod => Expr::AtEod,
            RawExpr::Stop => Expr::Stop,
            RawExpr::Not(e) => Expr::Not(conv(e)),
            RawExpr::And(a, b) => Expr::And(conv(a), conv(b)),
            RawExpr::Or(a, b) => Expr::Or(conv(a), conv(b)),
            RawExpr::Eq(a, b) => cmp(CmpOp::Eq, a, b),
            RawExpr::Ne(a, b) => cmp(CmpOp::Ne, a, b),
            RawExpr::Lt(a, b) => cmp(CmpOp::Lt, a, b),
            RawExpr::Le(a, b) => cmp(CmpOp::Le, a, b),
            RawExpr::Gt(a, b) => cmp(CmpOp::Gt, a, b),
            RawExpr::Ge(a, b) => cmp(CmpOp::Ge, a, b),
            RawExpr::Len(e) => Expr::Len(conv(e)),
        }
    }
}
