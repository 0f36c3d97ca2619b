//! Expression evaluation functions

use std::borrow::Cow;
use std::cmp::Ordering;
use std::rc::Rc;

use serde_json::Value as Json;

use crate::ast::*;
use crate::errors::EvalError;

use super::control::{self, Fault, Outcome};
use super::value::{Function, Value};

/// The documents bound as `project`, `item` and `layout`
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub project: &'a Json,
    pub item: &'a Json,
    pub layout: &'a Json,
}

/// What the bound input names read during one run
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope<'a> {
    Template(Inputs<'a>),
    Date { year: i32, month: u32, day: u32 },
}

impl<'a> Scope<'a> {
    fn read(self, input: Input) -> Value<'a> {
        match (self, input) {
            (Scope::Template(inputs), Input::Project) => Value::from_json(inputs.project),
            (Scope::Template(inputs), Input::Item) => Value::from_json(inputs.item),
            (Scope::Template(inputs), Input::Layout) => Value::from_json(inputs.layout),
            (Scope::Date { year, .. }, Input::Year) => Value::Number(f64::from(year)),
            (Scope::Date { month, .. }, Input::Month) => Value::Number(f64::from(month)),
            (Scope::Date { day, .. }, Input::Day) => Value::Number(f64::from(day)),
            // the parser never binds a name outside its scope
            _ => Value::Undefined,
        }
    }
}

/// A compiled right-hand side
///
/// An inert program (from a clause that failed to compile) evaluates to
/// `undefined` and never faults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    expr: Option<Expr>,
}

impl Program {
    pub(crate) fn compiled(expr: Expr) -> Self {
        Program { expr: Some(expr) }
    }

    pub(crate) fn inert() -> Self {
        Program { expr: None }
    }

    pub fn is_inert(&self) -> bool {
        self.expr.is_none()
    }

    pub fn run<'a>(&'a self, inputs: Inputs<'a>) -> Result<Outcome<Value<'a>>, EvalError> {
        self.run_in(Scope::Template(inputs))
    }

    pub(crate) fn run_in<'a>(&'a self, scope: Scope<'a>) -> Result<Outcome<Value<'a>>, EvalError> {
        let Some(expr) = &self.expr else {
            return Ok(Outcome::Value(Value::Undefined));
        };
        let env = Env {
            scope,
            params: Rc::new(Vec::new()),
        };
        match eval_expr(&env, expr) {
            Ok(value) => Ok(Outcome::from_value(value)),
            Err(Fault::Drop) => Ok(Outcome::Drop),
            Err(Fault::Error(e)) => Err(e),
        }
    }
}

struct Env<'a> {
    scope: Scope<'a>,
    /// Innermost parameter last
    params: Rc<Vec<(&'a str, Value<'a>)>>,
}

fn eval_expr<'a>(env: &Env<'a>, expr: &'a Expr) -> Result<Value<'a>, Fault> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(Cow::Borrowed(s))),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Input(input) => Ok(env.scope.read(*input)),
        Expr::Param(name) => Ok(env
            .params
            .iter()
            .rev()
            .find(|(param, _)| *param == name.as_str())
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Undefined)),
        Expr::Member(object, name) => Ok(eval_expr(env, object)?.get(name)?),
        Expr::Index(object, key) => {
            let object = eval_expr(env, object)?;
            let key = eval_expr(env, key)?;
            Ok(object.get(&key.to_string())?)
        }
        Expr::Unary(op, operand) => {
            let v = eval_expr(env, operand)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.is_truthy()),
                UnaryOp::Neg => Value::Number(-v.to_number()),
                UnaryOp::Pos => Value::Number(v.to_number()),
            })
        }
        Expr::Binary(lhs, op, rhs) => {
            let l = eval_expr(env, lhs)?;
            let r = eval_expr(env, rhs)?;
            Ok(binary(&l, *op, &r))
        }
        Expr::Logical(lhs, op, rhs) => {
            let l = eval_expr(env, lhs)?;
            let take_rhs = match op {
                LogicalOp::And => l.is_truthy(),
                LogicalOp::Or => !l.is_truthy(),
                LogicalOp::Nullish => l.is_nullish(),
            };
            if take_rhs { eval_expr(env, rhs) } else { Ok(l) }
        }
        Expr::Conditional(test, then, otherwise) => {
            if eval_expr(env, test)?.is_truthy() {
                eval_expr(env, then)
            } else {
                eval_expr(env, otherwise)
            }
        }
        Expr::Lambda(param, body) => Ok(Value::Function(Function {
            param: param.as_str(),
            body: &**body,
            captured: Rc::clone(&env.params),
        })),
        Expr::Control(call) => eval_control(env, call),
    }
}

fn binary<'a>(l: &Value<'a>, op: BinaryOp, r: &Value<'a>) -> Value<'a> {
    let order = || l.compare(r);
    match op {
        BinaryOp::Add => l.add(r),
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt => Value::Bool(order() == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(order(), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gt => Value::Bool(order() == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            order(),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Eq => Value::Bool(l.loose_equals(r)),
        BinaryOp::Ne => Value::Bool(!l.loose_equals(r)),
        BinaryOp::StrictEq => Value::Bool(l.strict_equals(r)),
        BinaryOp::StrictNe => Value::Bool(!l.strict_equals(r)),
    }
}

fn eval_control<'a>(env: &Env<'a>, call: &'a ControlCall) -> Result<Value<'a>, Fault> {
    let mut args = call.args.iter();
    let value = match args.next() {
        Some(arg) => eval_expr(env, arg)?,
        None => Value::Undefined,
    };
    let check = args.next().map(|arg| eval_expr(env, arg)).transpose()?;
    let fired = control::fires(&value, check.as_ref(), |predicate, arg| {
        call_function(env.scope, predicate, arg)
    })?;
    control::settle(call.function, value, fired)
}

fn call_function<'a>(
    scope: Scope<'a>,
    function: &Function<'a>,
    arg: Value<'a>,
) -> Result<Value<'a>, Fault> {
    let mut params = Vec::with_capacity(function.captured.len() + 1);
    params.extend(function.captured.iter().cloned());
    params.push((function.param, arg));
    let env = Env {
        scope,
        params: Rc::new(params),
    };
    eval_expr(&env, function.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::control::ControlOutcome;
    use crate::parse::parse_expression;
    use serde_json::json;

    fn run(source: &str, item: &Json) -> Result<Outcome<Json>, EvalError> {
        let program = Program::compiled(parse_expression(source).unwrap());
        let empty = json!({});
        let inputs = Inputs {
            project: &empty,
            item,
            layout: &empty,
        };
        Ok(match program.run(inputs)? {
            Outcome::Value(v) => Outcome::Value(v.to_json()),
            Outcome::Break(v) => Outcome::Break(v.to_json()),
            Outcome::Exit(v) => Outcome::Exit(v.to_json()),
            Outcome::Drop => Outcome::Drop,
        })
    }

    #[test]
    fn arithmetic_and_concatenation() {
        let item = json!({ "w": 40 });
        assert_eq!(run("item.w * 2 + 1", &item), Ok(Outcome::Value(json!(81))));
        assert_eq!(
            run("'w=' + item.w", &item),
            Ok(Outcome::Value(json!("w=40")))
        );
        assert_eq!(run("7 % 4", &item), Ok(Outcome::Value(json!(3))));
    }

    #[test]
    fn logical_operators_return_operands() {
        let item = json!({ "label": "", "name": "a" });
        assert_eq!(
            run("item.label || item.name", &item),
            Ok(Outcome::Value(json!("a")))
        );
        assert_eq!(
            run("item.label ?? item.name", &item),
            Ok(Outcome::Value(json!("")))
        );
        assert_eq!(run("item.missing && item.name", &item), Ok(Outcome::Value(Json::Null)));
    }

    #[test]
    fn short_circuit_skips_faulting_branch() {
        let item = json!({});
        assert_eq!(
            run("item.a && item.a.b", &item),
            Ok(Outcome::Value(Json::Null))
        );
        assert_eq!(
            run("item.a.b", &item),
            Err(EvalError::CannotReadProperty {
                property: "b".into(),
                target: "undefined"
            })
        );
    }

    #[test]
    fn index_access_uses_string_keys() {
        let item = json!({ "list": [10, 20], "k": "list" });
        assert_eq!(run("item[item.k][1]", &item), Ok(Outcome::Value(json!(20))));
    }

    #[test]
    fn drop_fires_on_falsy() {
        let item = json!({ "v": 0 });
        assert_eq!(run("$.drop(item.v)", &item), Ok(Outcome::Drop));
        let item = json!({ "v": 3 });
        assert_eq!(run("$.drop(item.v)", &item), Ok(Outcome::Value(json!(3))));
    }

    #[test]
    fn break_with_predicate() {
        let item = json!({ "v": 12 });
        assert_eq!(
            run("$.break(item.v, v => v > 10)", &item),
            Ok(Outcome::Break(json!(12)))
        );
        let item = json!({ "v": 2 });
        assert_eq!(
            run("$.break(item.v, v => v > 10)", &item),
            Ok(Outcome::Value(json!(2)))
        );
    }

    #[test]
    fn exit_with_equal_check() {
        let item = json!({ "state": "done" });
        assert_eq!(
            run("$.exit(item.state, 'done')", &item),
            Ok(Outcome::Exit(json!("done")))
        );
    }

    #[test]
    fn signal_travels_through_nullish() {
        let item = json!({ "v": null });
        let outcome = run("$.break(item.v) ?? 'fallback'", &item).unwrap();
        assert_eq!(outcome.control(), Some(ControlOutcome::Break));
    }

    #[test]
    fn predicate_sees_enclosing_parameter() {
        let item = json!({ "v": 5, "limit": 4 });
        assert_eq!(
            run("$.drop(item.v, v => $.break(v, w => w > item.limit))", &item),
            Ok(Outcome::Drop)
        );
    }

    #[test]
    fn date_scope_reads_numbers() {
        let expr = crate::parse::parse_with("year + '/' + month + '/' + day", Bindings::PrimeDate);
        let program = Program::compiled(expr.unwrap());
        let scope = Scope::Date {
            year: 2024,
            month: 4,
            day: 1,
        };
        assert_eq!(
            program.run_in(scope),
            Ok(Outcome::Value(Value::from("2024/4/1".to_string())))
        );
    }

    #[test]
    fn inert_program_is_undefined() {
        let empty = json!({});
        let inputs = Inputs {
            project: &empty,
            item: &empty,
            layout: &empty,
        };
        assert_eq!(
            Program::inert().run(inputs),
            Ok(Outcome::Value(Value::Undefined))
        );
    }
}
