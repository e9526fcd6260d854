//! Grammar type definitions.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::GrammarError;

/// Numeric id of a literal token.
///
/// Ids are chosen by the grammar author and are unique per literal value
/// within a grammar. Zero is never a valid literal id: the runtime uses
/// "no id" to mean that no lookahead token is pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

impl TokenId {
    /// Pseudo-token matching the end of a frozen stream.
    pub const EOD: Self = Self(u32::MAX);

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_eod(self) -> bool {
        self == Self::EOD
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eod() {
            f.write_str("eod")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Byte order of a numeric unpack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Network order.
    #[default]
    Big,
    Little,
}

/// How a `Variable` production unpacks its value from the stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VarType {
    UInt { width: u8, order: ByteOrder },
    Int { width: u8, order: ByteOrder },
    /// A byte run whose length is computed from already parsed state.
    Bytes { length: Expr },
    /// All bytes up to the end of the (frozen) stream.
    BytesToEod,
}

impl VarType {
    pub fn uint(width: u8) -> Self {
        Self::UInt {
            width,
            order: ByteOrder::Big,
        }
    }

    pub fn int(width: u8) -> Self {
        Self::Int {
            width,
            order: ByteOrder::Big,
        }
    }

    pub fn bytes(length: Expr) -> Self {
        Self::Bytes { length }
    }

    /// Value type an unpack produces when the production declares none.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::UInt { .. } => ValueType::UInt,
            Self::Int { .. } => ValueType::Int,
            Self::Bytes { .. } | Self::BytesToEod => ValueType::Bytes,
        }
    }
}

impl FromStr for VarType {
    type Err = String;

    /// Parse the short names used in grammar files: `uint8`, `uint16le`,
    /// `int32be`, `bytes_eod`. Multi-byte integers default to big endian.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "bytes_eod" {
            return Ok(Self::BytesToEod);
        }

        let (signed, rest) = if let Some(rest) = s.strip_prefix("uint") {
            (false, rest)
        } else if let Some(rest) = s.strip_prefix("int") {
            (true, rest)
        } else {
            return Err(format!("unknown unpack type `{s}`"));
        };

        let (bits, order) = if let Some(bits) = rest.strip_suffix("le") {
            (bits, ByteOrder::Little)
        } else if let Some(bits) = rest.strip_suffix("be") {
            (bits, ByteOrder::Big)
        } else {
            (rest, ByteOrder::Big)
        };

        let width = match bits {
            "8" => 1,
            "16" => 2,
            "32" => 4,
            "64" => 8,
            _ => return Err(format!("unsupported integer width in `{s}`")),
        };

        Ok(if signed {
            Self::Int { width, order }
        } else {
            Self::UInt { width, order }
        })
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, width, order) = match self {
            Self::UInt { width, order } => ("uint", width, order),
            Self::Int { width, order } => ("int", width, order),
            Self::Bytes { .. } => return f.write_str("bytes"),
            Self::BytesToEod => return f.write_str("bytes_eod"),
        };
        write!(f, "{prefix}{}", u32::from(*width) * 8)?;
        match (width, order) {
            (1, _) => Ok(()),
            (_, ByteOrder::Big) => f.write_str("be"),
            (_, ByteOrder::Little) => f.write_str("le"),
        }
    }
}

/// Declared type of a parse-object slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Any,
    Bool,
    #[serde(rename = "uint")]
    UInt,
    Int,
    Bytes,
    Text,
    List(Box<ValueType>),
    /// Parse object of the named grammar.
    Object(String),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Bool => f.write_str("bool"),
            Self::UInt => f.write_str("uint"),
            Self::Int => f.write_str("int"),
            Self::Bytes => f.write_str("bytes"),
            Self::Text => f.write_str("text"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Object(name) => f.write_str(name),
        }
    }
}

/// Compile-time constant: field defaults and switch case labels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Bytes(Vec<u8>),
    List(Vec<Constant>),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::UInt(n) => write!(f, "{n}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Expressions evaluated against already parsed state.
///
/// Used by `Boolean` conditions, `Switch` discriminants, byte-run lengths and
/// child grammar arguments. `And` and `Or` short-circuit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Const(Constant),
    /// Value of a named production or auxiliary variable of the current grammar.
    Field(String),
    /// Argument bound to a grammar parameter.
    Param(String),
    /// True once the cursor sits at the end of a frozen stream.
    AtEod,
    /// The control flag raised by a control hook.
    Stop,
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    /// Length of a bytes, text or list value.
    Len(Box<Expr>),
}

impl Expr {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn uint(n: u64) -> Self {
        Self::Const(Constant::UInt(n))
    }

    pub fn and(self, other: Expr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn compare(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Self::Compare(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn len(self) -> Self {
        Self::Len(Box::new(self))
    }

    /// Visit this expression and all subexpressions, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Self::Not(e) | Self::Len(e) => e.walk(f),
            Self::And(a, b) | Self::Or(a, b) | Self::Compare(_, a, b) => {
                a.walk(f);
                b.walk(f);
            }
            Self::Const(_) | Self::Field(_) | Self::Param(_) | Self::AtEod | Self::Stop => {}
        }
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(c) => write!(f, "{c}"),
            Self::Field(name) => write!(f, "self.{name}"),
            Self::Param(name) => write!(f, "${name}"),
            Self::AtEod => f.write_str("at_eod"),
            Self::Stop => f.write_str("stop"),
            Self::Not(e) => write!(f, "!{e}"),
            Self::And(a, b) => write!(f, "({a} && {b})"),
            Self::Or(a, b) => write!(f, "({a} || {b})"),
            Self::Compare(op, a, b) => write!(f, "({a} {} {b})", op.as_str()),
            Self::Len(e) => write!(f, "len({e})"),
        }
    }
}

/// When a hook may influence control flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Observes or rewrites parse-object state.
    #[default]
    Field,
    /// May additionally raise the stop flag read by the next `Boolean`.
    Control,
}

/// A user callback attached to a production, resolved by name at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookRef {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Higher priorities run first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub kind: HookKind,
}

impl HookRef {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            priority: 0,
            kind: HookKind::Field,
        }
    }

    pub fn control(name: impl Into<String>) -> Self {
        Self {
            kind: HookKind::Control,
            ..Self::field(name)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// One arm of a `Switch`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub value: Constant,
    pub production: String,
}

/// Grammar parameter, bound per parse (entry) or per embedding (child).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: ValueType,
}

/// Auxiliary identifier of a grammar scope, such as a list accumulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub ty: ValueType,
    #[serde(default)]
    pub default: Option<Constant>,
}

/// Production payloads. Composite kinds refer to children by symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProductionKind {
    Literal {
        value: Vec<u8>,
        id: TokenId,
    },
    Variable {
        unpack: VarType,
        filter: Option<String>,
    },
    Epsilon,
    Sequence(Vec<String>),
    /// Two alternatives routed by the id of the next token.
    /// `lookahead[i]` lists the ids that select `alternatives[i]`.
    LookAhead {
        alternatives: [String; 2],
        lookahead: [Vec<TokenId>; 2],
    },
    Boolean {
        condition: Expr,
        then: String,
        /// Absent means epsilon.
        otherwise: Option<String>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<Case>,
        default: Option<String>,
    },
    ChildGrammar {
        grammar: String,
        args: Vec<Expr>,
    },
}

impl ProductionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Variable { .. } => "variable",
            Self::Epsilon => "epsilon",
            Self::Sequence(_) => "sequence",
            Self::LookAhead { .. } => "lookahead",
            Self::Boolean { .. } => "boolean",
            Self::Switch { .. } => "switch",
            Self::ChildGrammar { .. } => "child",
        }
    }
}

/// One node of a grammar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Unique within the grammar; the memoization key of generated routines.
    pub symbol: String,
    /// Parse-object slot receiving this production's value.
    pub name: Option<String>,
    /// Declared slot type, overriding the inherent one.
    pub ty: Option<ValueType>,
    /// Stored into the slot before matching when the slot is still unset.
    pub default: Option<Constant>,
    pub hooks: Vec<HookRef>,
    pub kind: ProductionKind,
}

impl Production {
    pub fn new(symbol: impl Into<String>, kind: ProductionKind) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            ty: None,
            default: None,
            hooks: Vec::new(),
            kind,
        }
    }

    pub fn literal(symbol: impl Into<String>, value: impl Into<Vec<u8>>, id: u32) -> Self {
        Self::new(
            symbol,
            ProductionKind::Literal {
                value: value.into(),
                id: TokenId(id),
            },
        )
    }

    pub fn variable(symbol: impl Into<String>, unpack: VarType) -> Self {
        Self::new(
            symbol,
            ProductionKind::Variable {
                unpack,
                filter: None,
            },
        )
    }

    pub fn epsilon(symbol: impl Into<String>) -> Self {
        Self::new(symbol, ProductionKind::Epsilon)
    }

    pub fn sequence(
        symbol: impl Into<String>,
        members: impl IntoIterator<Item: Into<String>>,
    ) -> Self {
        Self::new(
            symbol,
            ProductionKind::Sequence(members.into_iter().map(Into::into).collect()),
        )
    }

    pub fn lookahead(
        symbol: impl Into<String>,
        alternatives: [&str; 2],
        lookahead: [Vec<TokenId>; 2],
    ) -> Self {
        Self::new(
            symbol,
            ProductionKind::LookAhead {
                alternatives: alternatives.map(String::from),
                lookahead,
            },
        )
    }

    pub fn boolean(
        symbol: impl Into<String>,
        condition: Expr,
        then: &str,
        otherwise: Option<&str>,
    ) -> Self {
        Self::new(
            symbol,
            ProductionKind::Boolean {
                condition,
                then: then.to_owned(),
                otherwise: otherwise.map(String::from),
            },
        )
    }

    pub fn switch<'a>(
        symbol: impl Into<String>,
        discriminant: Expr,
        cases: impl IntoIterator<Item = (Constant, &'a str)>,
        default: Option<&str>,
    ) -> Self {
        Self::new(
            symbol,
            ProductionKind::Switch {
                discriminant,
                cases: cases
                    .into_iter()
                    .map(|(value, production)| Case {
                        value,
                        production: production.to_owned(),
                    })
                    .collect(),
                default: default.map(String::from),
            },
        )
    }

    pub fn child(symbol: impl Into<String>, grammar: &str, args: Vec<Expr>) -> Self {
        Self::new(
            symbol,
            ProductionKind::ChildGrammar {
                grammar: grammar.to_owned(),
                args,
            },
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn typed(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_default(mut self, default: Constant) -> Self {
        self.default = Some(default);
        self
    }

    pub fn hook(mut self, hook: HookRef) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Attach a filter to a `Variable`. Other kinds are returned unchanged.
    pub fn filter(mut self, name: impl Into<String>) -> Self {
        if let ProductionKind::Variable { filter, .. } = &mut self.kind {
            *filter = Some(name.into());
        }
        self
    }

    /// Symbols this production refers to, in dispatch order.
    pub fn children(&self) -> Vec<&str> {
        match &self.kind {
            ProductionKind::Literal { .. }
            | ProductionKind::Variable { .. }
            | ProductionKind::Epsilon
            | ProductionKind::ChildGrammar { .. } => Vec::new(),
            ProductionKind::Sequence(members) => members.iter().map(String::as_str).collect(),
            ProductionKind::LookAhead { alternatives, .. } => {
                alternatives.iter().map(String::as_str).collect()
            }
            ProductionKind::Boolean {
                then, otherwise, ..
            } => std::iter::once(then.as_str())
                .chain(otherwise.as_deref())
                .collect(),
            ProductionKind::Switch { cases, default, .. } => cases
                .iter()
                .map(|c| c.production.as_str())
                .chain(default.as_deref())
                .collect(),
        }
    }

    /// Expressions embedded in this production.
    pub fn exprs(&self) -> Vec<&Expr> {
        match &self.kind {
            ProductionKind::Variable {
                unpack: VarType::Bytes { length },
                ..
            } => vec![length],
            ProductionKind::Boolean { condition, .. } => vec![condition],
            ProductionKind::Switch { discriminant, .. } => vec![discriminant],
            ProductionKind::ChildGrammar { args, .. } => args.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a completed match yields a value that can be stored in a slot.
    pub fn is_valued(&self) -> bool {
        matches!(
            self.kind,
            ProductionKind::Literal { .. }
                | ProductionKind::Variable { .. }
                | ProductionKind::ChildGrammar { .. }
        )
    }

    /// Slot type: the declared type, else the type the match produces.
    pub fn value_type(&self) -> ValueType {
        if let Some(ty) = &self.ty {
            return ty.clone();
        }
        match &self.kind {
            ProductionKind::Literal { .. } => ValueType::Bytes,
            ProductionKind::Variable {
                filter: Some(_), ..
            } => ValueType::Any,
            ProductionKind::Variable { unpack, .. } => unpack.value_type(),
            ProductionKind::ChildGrammar { grammar, .. } => ValueType::Object(grammar.clone()),
            _ => ValueType::Any,
        }
    }
}

/// A named, parameterized set of productions with a start symbol.
///
/// Built through [`GrammarBuilder`] or loaded from JSON/binary; both paths
/// validate that the start symbol and every child reference resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) start: String,
    /// Arena keyed by symbol, in definition order.
    pub(crate) productions: IndexMap<String, Production>,
    pub(crate) params: Vec<Parameter>,
    pub(crate) variables: Vec<Variable>,
}

impl Grammar {
    pub fn builder(name: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_symbol(&self) -> &str {
        &self.start
    }

    pub fn start_production(&self) -> &Production {
        &self.productions[self.start.as_str()]
    }

    pub fn production(&self, symbol: &str) -> Option<&Production> {
        self.productions.get(symbol)
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.values()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Check that the start symbol and all child symbols resolve.
    pub(crate) fn validate(&self) -> Result<(), GrammarError> {
        if !self.productions.contains_key(&self.start) {
            return Err(GrammarError::UnknownSymbol {
                grammar: self.name.clone(),
                symbol: self.start.clone(),
                referenced_by: None,
            });
        }
        for (key, production) in &self.productions {
            if key != &production.symbol {
                return Err(GrammarError::DuplicateSymbol {
                    grammar: self.name.clone(),
                    symbol: production.symbol.clone(),
                });
            }
            for child in production.children() {
                if !self.productions.contains_key(child) {
                    return Err(GrammarError::UnknownSymbol {
                        grammar: self.name.clone(),
                        symbol: child.to_owned(),
                        referenced_by: Some(production.symbol.clone()),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Incremental constructor for [`Grammar`].
#[derive(Clone, Debug)]
pub struct GrammarBuilder {
    name: String,
    description: String,
    start: Option<String>,
    productions: Vec<Production>,
    params: Vec<Parameter>,
    variables: Vec<Variable>,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            start: None,
            productions: Vec::new(),
            params: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Start symbol. Defaults to the first production added.
    pub fn start(mut self, symbol: impl Into<String>) -> Self {
        self.start = Some(symbol.into());
        self
    }

    pub fn production(mut self, production: Production) -> Self {
        self.productions.push(production);
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn variable(
        mut self,
        name: impl Into<String>,
        ty: ValueType,
        default: Option<Constant>,
    ) -> Self {
        self.variables.push(Variable {
            name: name.into(),
            ty,
            default,
        });
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let start = match self.start {
            Some(start) => start,
            None => self
                .productions
                .first()
                .map(|p| p.symbol.clone())
                .ok_or_else(|| GrammarError::MissingStart(self.name.clone()))?,
        };

        let mut productions = IndexMap::with_capacity(self.productions.len());
        for production in self.productions {
            if productions.contains_key(&production.symbol) {
                return Err(GrammarError::DuplicateSymbol {
                    grammar: self.name,
                    symbol: production.symbol,
                });
            }
            productions.insert(production.symbol.clone(), production);
        }

        let grammar = Grammar {
            name: self.name,
            description: self.description,
            start,
            productions,
            params: self.params,
            variables: self.variables,
        };
        grammar.validate()?;
        Ok(grammar)
    }
}
