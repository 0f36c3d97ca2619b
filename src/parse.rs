//! Parse pest pairs into expression AST nodes

use miette::{NamedSource, SourceSpan};
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};

use crate::ast::*;
use crate::defaults;
use crate::errors::CompileError;
use crate::{ExpressionParser, Rule};

/// Parse the right-hand side of one clause into an AST
pub fn parse_expression(source: &str) -> Result<Expr, CompileError> {
    parse_with(source, Bindings::Template)
}

/// Parse an expression that may only read the names in `bindings`
pub fn parse_with(source: &str, bindings: Bindings) -> Result<Expr, CompileError> {
    let mut pairs = ExpressionParser::parse(Rule::expression, source)
        .map_err(|e| syntax_error(source, &e))?;

    let mut lowering = Lowering {
        source,
        bindings,
        params: Vec::new(),
    };
    let whole = SourceSpan::from((0, source.len()));
    let expression = lowering.take(&mut pairs, whole, "expression")?;
    // expression = { SOI ~ expr ~ EOI }
    let expr = lowering.take(&mut expression.into_inner(), whole, "expression")?;
    lowering.expr(expr)
}

fn syntax_error(source: &str, error: &pest::error::Error<Rule>) -> CompileError {
    let span = match error.location {
        InputLocation::Pos(pos) => SourceSpan::from((pos, 0)),
        InputLocation::Span((start, end)) => SourceSpan::from((start, end - start)),
    };
    CompileError::Syntax {
        message: error.variant.message().into_owned(),
        src: NamedSource::new(defaults::DIAGNOSTIC_SOURCE, source.to_string()),
        span,
    }
}

fn span_of(pair: &Pair<Rule>) -> SourceSpan {
    let span = pair.as_span();
    SourceSpan::from((span.start(), span.end() - span.start()))
}

enum Operator {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

fn operator(text: &str) -> Option<Operator> {
    use Operator::*;
    Some(match text {
        "||" => Logical(LogicalOp::Or),
        "??" => Logical(LogicalOp::Nullish),
        "&&" => Logical(LogicalOp::And),
        "===" => Binary(BinaryOp::StrictEq),
        "!==" => Binary(BinaryOp::StrictNe),
        "==" => Binary(BinaryOp::Eq),
        "!=" => Binary(BinaryOp::Ne),
        "<=" => Binary(BinaryOp::Le),
        ">=" => Binary(BinaryOp::Ge),
        "<" => Binary(BinaryOp::Lt),
        ">" => Binary(BinaryOp::Gt),
        "+" => Binary(BinaryOp::Add),
        "-" => Binary(BinaryOp::Sub),
        "*" => Binary(BinaryOp::Mul),
        "/" => Binary(BinaryOp::Div),
        "%" => Binary(BinaryOp::Rem),
        _ => return None,
    })
}

/// Lowers the parse tree while tracking arrow-function parameters in scope
struct Lowering<'s> {
    source: &'s str,
    bindings: Bindings,
    params: Vec<String>,
}

impl Lowering<'_> {
    fn src(&self) -> NamedSource<String> {
        NamedSource::new(defaults::DIAGNOSTIC_SOURCE, self.source.to_string())
    }

    fn malformed(&self, span: SourceSpan, what: &str) -> CompileError {
        CompileError::Syntax {
            message: format!("malformed {what}"),
            src: self.src(),
            span,
        }
    }

    fn take<'i>(
        &self,
        pairs: &mut Pairs<'i, Rule>,
        span: SourceSpan,
        what: &str,
    ) -> Result<Pair<'i, Rule>, CompileError> {
        pairs.next().ok_or_else(|| self.malformed(span, what))
    }

    fn expr(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        let span = span_of(&pair);
        let inner = self.take(&mut pair.into_inner(), span, "expression")?;
        match inner.as_rule() {
            Rule::lambda => self.lambda(inner),
            Rule::conditional => self.conditional(inner),
            _ => Err(self.malformed(span, "expression")),
        }
    }

    fn lambda(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        // lambda = { (IDENT | "(" ~ IDENT ~ ")") ~ "=>" ~ expr }
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let param = self.take(&mut inner, span, "arrow parameter")?.as_str().to_string();
        let body = self.take(&mut inner, span, "arrow body")?;

        self.params.push(param.clone());
        let body = self.expr(body);
        self.params.pop();

        Ok(Expr::Lambda(param, Box::new(body?)))
    }

    fn conditional(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        // conditional = { logic_or ~ ("?" ~ expr ~ ":" ~ expr)? }
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let test = self.take(&mut inner, span, "condition")?;
        let test = self.operand(test)?;

        match inner.next() {
            None => Ok(test),
            Some(then) => {
                let then = self.expr(then)?;
                let otherwise = self.take(&mut inner, span, "conditional branch")?;
                let otherwise = self.expr(otherwise)?;
                Ok(Expr::Conditional(
                    Box::new(test),
                    Box::new(then),
                    Box::new(otherwise),
                ))
            }
        }
    }

    fn operand(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        match pair.as_rule() {
            Rule::logic_or
            | Rule::logic_and
            | Rule::equality
            | Rule::comparison
            | Rule::additive
            | Rule::multiplicative => self.binary_chain(pair),
            Rule::unary => self.unary(pair),
            _ => Err(self.malformed(span_of(&pair), "operand")),
        }
    }

    /// Left-associative `operand (op operand)*`
    fn binary_chain(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let first = self.take(&mut inner, span, "operand")?;
        let mut result = self.operand(first)?;

        while let Some(op_pair) = inner.next() {
            let op = operator(op_pair.as_str())
                .ok_or_else(|| self.malformed(span_of(&op_pair), "operator"))?;
            let rhs = self.take(&mut inner, span, "operand")?;
            let rhs = self.operand(rhs)?;
            result = match op {
                Operator::Logical(op) => Expr::Logical(Box::new(result), op, Box::new(rhs)),
                Operator::Binary(op) => Expr::Binary(Box::new(result), op, Box::new(rhs)),
            };
        }

        Ok(result)
    }

    fn unary(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        // unary = { unary_op* ~ postfix }
        let span = span_of(&pair);
        let mut prefixes = Vec::new();
        let mut postfix = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::unary_op => prefixes.push(match inner.as_str() {
                    "!" => UnaryOp::Not,
                    "-" => UnaryOp::Neg,
                    _ => UnaryOp::Pos,
                }),
                _ => postfix = Some(inner),
            }
        }

        let postfix = postfix.ok_or_else(|| self.malformed(span, "operand"))?;
        let mut result = self.postfix(postfix)?;
        for op in prefixes.into_iter().rev() {
            result = Expr::Unary(op, Box::new(result));
        }
        Ok(result)
    }

    fn postfix(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        // postfix = { primary ~ (member | index | call)* }
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let primary = self.take(&mut inner, span, "primary")?;

        let mut result = if self.is_control_api(&primary) {
            self.control_call(&primary, &mut inner)?
        } else {
            self.primary(primary)?
        };

        for accessor in inner {
            let accessor_span = span_of(&accessor);
            result = match accessor.as_rule() {
                Rule::member => {
                    let name = self.take(&mut accessor.into_inner(), accessor_span, "member")?;
                    Expr::Member(Box::new(result), name.as_str().to_string())
                }
                Rule::index => {
                    let key = self.take(&mut accessor.into_inner(), accessor_span, "index")?;
                    Expr::Index(Box::new(result), Box::new(self.expr(key)?))
                }
                _ => {
                    return Err(CompileError::UnsupportedCall {
                        src: self.src(),
                        span: accessor_span,
                    });
                }
            };
        }

        Ok(result)
    }

    fn is_control_api(&self, primary: &Pair<Rule>) -> bool {
        self.bindings.has_control_api()
            && primary.as_str() == "$"
            && primary
                .clone()
                .into_inner()
                .next()
                .is_some_and(|p| p.as_rule() == Rule::IDENT)
            && !self.params.iter().any(|p| p == "$")
    }

    /// `$` must be followed by `.break(..)`, `.exit(..)` or `.drop(..)`
    fn control_call(
        &mut self,
        primary: &Pair<Rule>,
        accessors: &mut Pairs<Rule>,
    ) -> Result<Expr, CompileError> {
        let invalid = || CompileError::InvalidControlUse {
            src: self.src(),
            span: span_of(primary),
        };

        let function = accessors
            .next()
            .filter(|p| p.as_rule() == Rule::member)
            .and_then(|p| ControlFn::from_name(p.into_inner().as_str()))
            .ok_or_else(invalid)?;
        let call = accessors
            .next()
            .filter(|p| p.as_rule() == Rule::call)
            .ok_or_else(invalid)?;

        let call_span = span_of(&call);
        let args = call
            .into_inner()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        if args.len() > 2 {
            return Err(CompileError::TooManyArguments {
                function: function.name(),
                count: args.len(),
                src: self.src(),
                span: call_span,
            });
        }

        Ok(Expr::Control(ControlCall { function, args }))
    }

    fn primary(&mut self, pair: Pair<Rule>) -> Result<Expr, CompileError> {
        let span = span_of(&pair);
        let inner = self.take(&mut pair.into_inner(), span, "primary")?;
        match inner.as_rule() {
            Rule::expr => self.expr(inner),
            Rule::NUMBER => self.number(&inner),
            Rule::STRING => {
                let body = inner.into_inner().as_str();
                Ok(Expr::Str(unescape(body)))
            }
            Rule::keyword_literal => Ok(match inner.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                _ => Expr::Undefined,
            }),
            Rule::IDENT => self.identifier(&inner),
            _ => Err(self.malformed(span, "primary")),
        }
    }

    fn number(&self, pair: &Pair<Rule>) -> Result<Expr, CompileError> {
        pair.as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|_| CompileError::InvalidNumber {
                literal: pair.as_str().to_string(),
                src: self.src(),
                span: span_of(pair),
            })
    }

    fn identifier(&self, pair: &Pair<Rule>) -> Result<Expr, CompileError> {
        let name = pair.as_str();
        if self.params.iter().any(|p| p == name) {
            return Ok(Expr::Param(name.to_string()));
        }
        if let Some(input) = self.bindings.input(name) {
            return Ok(Expr::Input(input));
        }
        match name {
            "NaN" => Ok(Expr::Number(f64::NAN)),
            "Infinity" => Ok(Expr::Number(f64::INFINITY)),
            "$" => Err(CompileError::InvalidControlUse {
                src: self.src(),
                span: span_of(pair),
            }),
            _ => Err(CompileError::UnknownIdentifier {
                name: name.to_string(),
                help: self.bindings.help(),
                src: self.src(),
                span: span_of(pair),
            }),
        }
    }
}

/// Resolve backslash escapes inside a string literal body
fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push('u');
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => result.push(other),
            None => {}
        }
    }
    result
}
