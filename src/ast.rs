//! Abstract Syntax Tree types for dynamic expressions
//!
//! These types represent one compiled right-hand side. Identifiers are
//! resolved while lowering the parse tree, so the tree only ever names the
//! four bound inputs or an enclosing arrow-function parameter.

/// A compiled expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    /// One of the bound inputs: project, item, layout
    Input(Input),
    /// Arrow-function parameter in scope
    Param(String),
    /// `object.name`
    Member(Box<Expr>, String),
    /// `object[key]`
    Index(Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Short-circuiting operators return one of their operands
    Logical(Box<Expr>, LogicalOp, Box<Expr>),
    /// `test ? then : otherwise`
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `param => body`
    Lambda(String, Box<Expr>),
    /// `$.break(..)`, `$.exit(..)`, `$.drop(..)`
    Control(ControlCall),
}

/// Bound inputs of a compiled expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// `project` (contextData)
    Project,
    /// `item` (itemData)
    Item,
    /// `layout` (layoutData)
    Layout,
    /// `year` of a prime date
    Year,
    /// `month` of a prime date, 1-based
    Month,
    /// `day` of a prime date
    Day,
}

/// The input names an expression is compiled against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bindings {
    /// Dynamic attributes: `project`, `item`, `layout` and `$`
    #[default]
    Template,
    /// Prime date maps: `year`, `month`, `day`
    PrimeDate,
}

impl Bindings {
    pub fn input(self, name: &str) -> Option<Input> {
        match (self, name) {
            (Bindings::Template, "project") => Some(Input::Project),
            (Bindings::Template, "item") => Some(Input::Item),
            (Bindings::Template, "layout") => Some(Input::Layout),
            (Bindings::PrimeDate, "year") => Some(Input::Year),
            (Bindings::PrimeDate, "month") => Some(Input::Month),
            (Bindings::PrimeDate, "day") => Some(Input::Day),
            _ => None,
        }
    }

    /// Help line for an identifier outside these bindings
    pub fn help(self) -> &'static str {
        match self {
            Bindings::Template => "expressions can read `project`, `item`, `layout` and call `$`",
            Bindings::PrimeDate => "prime date maps can read `year`, `month` and `day`",
        }
    }

    /// Can `$` be called?
    pub fn has_control_api(self) -> bool {
        self == Bindings::Template
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not, // !
    Neg, // -
    Pos, // +
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Rem,      // %
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    Eq,       // ==
    Ne,       // !=
    StrictEq, // ===
    StrictNe, // !==
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,     // &&
    Or,      // ||
    Nullish, // ??
}

/// A call into the control API
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCall {
    pub function: ControlFn,
    pub args: Vec<Expr>,
}

/// Functions exposed on `$`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFn {
    Break,
    Exit,
    Drop,
}

impl ControlFn {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "break" => Some(ControlFn::Break),
            "exit" => Some(ControlFn::Exit),
            "drop" => Some(ControlFn::Drop),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlFn::Break => "break",
            ControlFn::Exit => "exit",
            ControlFn::Drop => "drop",
        }
    }
}
