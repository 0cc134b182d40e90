//! Tree-walking interpreter for constraint expressions.
//!
//! The interpreter knows nothing about stores or caches. Everything it needs
//! from the outside world goes through [`EvalHooks`]; the engine implements
//! the hooks and usually overrides [`EvalHooks::evaluate`] to add
//! memoization and write-back around [`walk_property`].

use std::sync::Arc;

use reckon_foundation::{Error, ErrorKind, Resource, Result, Value, ValueKind};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::path::{EvaluationPath, PathEntry};
use crate::result::EvalResult;

/// Callbacks the interpreter uses to read and create data.
pub trait EvalHooks {
    /// The evaluation path owned by this call tree.
    fn path(&mut self) -> &mut EvaluationPath;

    /// Returns the expression computing `property` on `entity`, if any.
    fn constraint_for(&mut self, entity: &Resource, property: &Resource) -> Option<Arc<Expr>>;

    /// Returns the stored values of a property that no constraint computes.
    ///
    /// # Errors
    ///
    /// Returns an error if the values cannot be read.
    fn stored_values(&mut self, entity: &Resource, property: &Resource) -> Result<Vec<Value>>;

    /// Returns a memoized result for the pair, if one exists.
    fn cached_result(&mut self, entity: &Resource, property: &Resource) -> Option<EvalResult>;

    /// Creates an auxiliary instance of `class` with the given property values.
    ///
    /// The instance belongs to the pair on top of the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be written.
    fn create_instance(&mut self, class: &Resource, fields: Vec<(Resource, Value)>)
    -> Result<Resource>;

    /// Records that the pair `from` read the pair `to`.
    fn record_dependency(&mut self, from: &PathEntry, to: &PathEntry);

    /// Evaluates `property` on `entity`.
    fn evaluate(&mut self, entity: &Resource, property: &Resource) -> EvalResult {
        walk_property(self, entity, property)
    }
}

/// The generic evaluation protocol for one pair.
///
/// 1. Record a dependency from the pair on top of the path, even if the
///    result turns out to be memoized.
/// 2. Return a memoized result if one exists.
/// 3. Return stored data if no constraint applies.
/// 4. Fail with `CycleDetected` if the pair is already on the path.
/// 5. Otherwise push the pair, evaluate its expression, and pop it.
pub fn walk_property<H: EvalHooks + ?Sized>(
    hooks: &mut H,
    entity: &Resource,
    property: &Resource,
) -> EvalResult {
    let target = PathEntry::new(entity.clone(), property.clone());
    if let Some(from) = hooks.path().top().cloned() {
        hooks.record_dependency(&from, &target);
    }

    if let Some(cached) = hooks.cached_result(entity, property) {
        return cached;
    }

    let Some(expr) = hooks.constraint_for(entity, property) else {
        return match hooks.stored_values(entity, property) {
            Ok(values) => EvalResult::from_values(values),
            Err(e) => EvalResult::error(e),
        };
    };

    if hooks.path().contains(&target) {
        return EvalResult::error(Error::cycle(entity, property));
    }

    tracing::trace!(entity = %entity, property = %property, "evaluating constraint");
    hooks.path().push(target);
    let result = evaluate_expr(hooks, entity, &expr);
    hooks.path().pop();
    result.into()
}

/// Evaluates an expression with `this` as the entity being computed.
///
/// # Errors
///
/// Returns the first failure met while evaluating.
pub fn evaluate_expr<H: EvalHooks + ?Sized>(
    hooks: &mut H,
    this: &Resource,
    expr: &Expr,
) -> Result<Value> {
    Interpreter {
        hooks,
        this: this.clone(),
        scope: Vec::new(),
    }
    .eval(expr)
}

struct Interpreter<'h, H: ?Sized> {
    hooks: &'h mut H,
    this: Resource,
    scope: Vec<(Arc<str>, Value)>,
}

impl<H: EvalHooks + ?Sized> Interpreter<'_, H> {
    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(resource) => Ok(Value::Resource(resource.clone())),
            Expr::Var(name) => self
                .scope
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| Error::new(ErrorKind::UnboundVariable(name.to_string()))),
            Expr::Property {
                property,
                subject,
                all,
            } => {
                let subject = match subject {
                    Some(expr) => self.resource(expr)?,
                    None => self.this.clone(),
                };
                let values = self.read(&subject, property)?;
                if *all {
                    Ok(Value::list(values))
                } else {
                    values
                        .into_iter()
                        .next()
                        .ok_or_else(|| Error::missing_value(&subject, property))
                }
            }
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary(*op, &value)
            }
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Call { function, args } => self.call(function, args),
            Expr::Lambda { .. } => Err(invalid("lambda used outside a function argument")),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::list(values))
            }
            Expr::New { class, fields } => {
                let mut values = Vec::with_capacity(fields.len());
                for (property, expr) in fields {
                    values.push((property.clone(), self.eval(expr)?));
                }
                self.hooks
                    .create_instance(class, values)
                    .map(Value::Resource)
            }
            Expr::Invalid(error) => Err(Error::clone(error)),
        }
    }

    /// Reads a property through the hooks, wrapping a nested failure.
    fn read(&mut self, entity: &Resource, property: &Resource) -> Result<Vec<Value>> {
        self.hooks
            .evaluate(entity, property)
            .into_values()
            .map_err(|cause| Error::dependency(entity, property, cause))
    }

    fn resource(&mut self, expr: &Expr) -> Result<Resource> {
        match self.eval(expr)? {
            Value::Resource(r) => Ok(r),
            other => Err(Error::type_mismatch(ValueKind::Resource, other.kind())),
        }
    }

    fn items(&mut self, expr: &Expr) -> Result<Vec<Value>> {
        Ok(match self.eval(expr)? {
            Value::List(items) => items.into_iter().collect(),
            other => vec![other],
        })
    }

    fn apply(&mut self, lambda: &Expr, argument: Value) -> Result<Value> {
        let Expr::Lambda { param, body } = lambda else {
            return Err(invalid("expected a lambda like `$x -> ...`"));
        };
        self.scope.push((Arc::clone(param), argument));
        let result = self.eval(body);
        self.scope.pop();
        result
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And => {
                if !truth(&self.eval(left)?)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(truth(&self.eval(right)?)?))
            }
            BinaryOp::Or => {
                if truth(&self.eval(left)?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(truth(&self.eval(right)?)?))
            }
            _ => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match op {
                    BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
                    BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
                    BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                        compare(op, &left, &right)
                    }
                    _ => arith(op, &left, &right),
                }
            }
        }
    }

    fn call(&mut self, function: &str, args: &[Expr]) -> Result<Value> {
        match function {
            "if" => {
                let [condition, then, otherwise] = args else {
                    return Err(Error::arity_mismatch(function, "3", args.len()));
                };
                if truth(&self.eval(condition)?)? {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            "sum" | "product" | "count" | "min" | "max" | "avg" => {
                let items = match args {
                    [list] => self.items(list)?,
                    [list, lambda] => {
                        let mut mapped = Vec::new();
                        for item in self.items(list)? {
                            mapped.push(self.apply(lambda, item)?);
                        }
                        mapped
                    }
                    _ => return Err(Error::arity_mismatch(function, "1 or 2", args.len())),
                };
                aggregate(function, items)
            }
            "map" | "filter" => {
                let [list, lambda] = args else {
                    return Err(Error::arity_mismatch(function, "2", args.len()));
                };
                let mut out = Vec::new();
                for item in self.items(list)? {
                    let result = self.apply(lambda, item.clone())?;
                    if function == "map" {
                        out.push(result);
                    } else if truth(&result)? {
                        out.push(item);
                    }
                }
                Ok(Value::list(out))
            }
            "abs" | "sqrt" | "floor" | "ceil" | "round" => {
                let [arg] = args else {
                    return Err(Error::arity_mismatch(function, "1", args.len()));
                };
                let value = self.eval(arg)?;
                math(function, &value)
            }
            "pow" => {
                let [base, exponent] = args else {
                    return Err(Error::arity_mismatch(function, "2", args.len()));
                };
                let base = self.eval(base)?;
                let exponent = self.eval(exponent)?;
                arith(BinaryOp::Pow, &base, &exponent)
            }
            _ => Err(Error::new(ErrorKind::UnknownFunction(function.to_string()))),
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

fn invalid(message: &str) -> Error {
    Error::new(ErrorKind::InvalidExpression(message.to_string()))
}

fn truth(value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| Error::type_mismatch(ValueKind::Bool, value.kind()))
}

fn number(value: &Value) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| Error::type_mismatch(ValueKind::Number, value.kind()))
}

fn unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| Error::new(ErrorKind::Overflow)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(Error::type_mismatch(ValueKind::Number, other.kind())),
        (UnaryOp::Not, other) => Ok(Value::Bool(!truth(other)?)),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            left.partial_cmp(right) == Some(std::cmp::Ordering::Equal)
        }
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let ordering = left
        .partial_cmp(right)
        .ok_or_else(|| Error::type_mismatch(left.kind(), right.kind()))?;
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn arith(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_arith(op, *a, *b),
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::string(format!("{a}{b}")))
        }
        _ => float_arith(op, number(left)?, number(right)?),
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    let overflow = || Error::new(ErrorKind::Overflow);
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(Error::new(ErrorKind::DivisionByZero));
            }
            // exact division stays integral
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b).ok_or_else(overflow)?,
                Some(_) => return Ok(Value::Float(a as f64 / b as f64)),
                None => return Err(overflow()),
            }
        }
        BinaryOp::Rem => {
            if b == 0 {
                return Err(Error::new(ErrorKind::DivisionByZero));
            }
            a.checked_rem(b).ok_or_else(overflow)?
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exponent) => a.checked_pow(exponent).ok_or_else(overflow)?,
            Err(_) => return Ok(Value::Float((a as f64).powf(b as f64))),
        },
        other => {
            return Err(Error::new(ErrorKind::Internal(format!(
                "{other} is not arithmetic"
            ))));
        }
    };
    Ok(Value::Int(result))
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
            return Err(Error::new(ErrorKind::DivisionByZero));
        }
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Pow => a.powf(b),
        other => {
            return Err(Error::new(ErrorKind::Internal(format!(
                "{other} is not arithmetic"
            ))));
        }
    };
    Ok(Value::Float(result))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
fn aggregate(function: &str, items: Vec<Value>) -> Result<Value> {
    match function {
        "count" => Ok(Value::Int(items.len() as i64)),
        "sum" => items
            .iter()
            .try_fold(Value::Int(0), |acc, item| arith(BinaryOp::Add, &acc, item)),
        "product" => items
            .iter()
            .try_fold(Value::Int(1), |acc, item| arith(BinaryOp::Mul, &acc, item)),
        "avg" => {
            if items.is_empty() {
                return Err(invalid("avg of an empty list"));
            }
            let total = aggregate("sum", items.clone())?;
            Ok(Value::Float(number(&total)? / items.len() as f64))
        }
        _ => {
            let mut iter = items.into_iter();
            let mut best = iter
                .next()
                .ok_or_else(|| invalid(&format!("{function} of an empty list")))?;
            number(&best)?;
            for item in iter {
                let ordering = item
                    .partial_cmp(&best)
                    .ok_or_else(|| Error::type_mismatch(ValueKind::Number, item.kind()))?;
                let better = if function == "min" {
                    ordering.is_lt()
                } else {
                    ordering.is_gt()
                };
                if better {
                    best = item;
                }
            }
            Ok(best)
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn math(function: &str, value: &Value) -> Result<Value> {
    if let Value::Int(n) = value {
        return match function {
            "abs" => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| Error::new(ErrorKind::Overflow)),
            "sqrt" => Ok(Value::Float(number(value)?.sqrt())),
            _ => Ok(Value::Int(*n)),
        };
    }
    let x = number(value)?;
    Ok(Value::Float(match function {
        "abs" => x.abs(),
        "sqrt" => x.sqrt(),
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        _ => x.round(),
    }))
}
