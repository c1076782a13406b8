extern crate derive_more;
use crate::environment::Environment;
use crate::evaluator;
use crate::interner::Symbol;
use crate::strings::StringMode;
use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use num_complex::Complex64;
use std::cmp::Ordering;
use std::fmt::{self, Formatter};
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::{self, Rc};

#[derive(Deref, DerefMut, Debug)]
pub struct Sequence(pub Vec<Value>);

pub type Int = i64;

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug)]
pub struct BadArgCount {
    name: &'static str,
    expected: Arity,
    got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "when evaluating {} expected {} arguments, but received {}",
            self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &'static str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name,
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "exactly {}", r.start())
                } else {
                    write!(f, "from {} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

pub struct PrimitiveFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&[Value]) -> evaluator::Result,
}

impl fmt::Debug for PrimitiveFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "builtin #<{}>", self.name)
    }
}

/// The file-loading callable. It needs the root frame to evaluate against,
/// but only holds it weakly, since the root frame holds the loader itself.
#[derive(Clone)]
pub struct LoadFile {
    pub env: rc::Weak<Environment>,
    pub strings: StringMode,
}

impl fmt::Debug for LoadFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "LoadFile")
    }
}

#[derive(Clone, Debug)]
pub enum Formals {
    /// One bare symbol takes the whole argument sequence.
    Collected(Symbol),
    /// A list of symbols pairs with the arguments 1:1.
    Positional(Vec<Symbol>),
}

impl fmt::Display for Formals {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Formals::Collected(name) => write!(f, "{}", name),
            Formals::Positional(names) => write!(f, "【{}】", names.iter().join(" ")),
        }
    }
}

#[derive(Clone)]
pub struct Closure {
    pub formals: Formals,
    pub body: Value,
    pub parent: Rc<Environment>,
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the parent: the parent may well
    // contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Closure{{formals: {:?}, body: {:?}}}",
            self.formals, self.body
        )
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    /// The no-value sentinel produced by side-effecting forms.
    Nothing,
    Bool(bool),
    Int(Int),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Symbol(Symbol),
    Seq(Rc<Sequence>),
    Primitive(&'static PrimitiveFn),
    Closure(Rc<Closure>),
    Loader(LoadFile),
}

pub(crate) fn truthy(value: &Value) -> bool {
    use Value::*;
    match value {
        Nothing => false,
        Bool(b) => *b,
        Int(n) => *n != 0,
        Float(x) => *x != 0.0,
        Complex(z) => z.re != 0.0 || z.im != 0.0,
        Str(s) => !s.is_empty(),
        Seq(elements) => !elements.is_empty(),
        Symbol(_) | Primitive(_) | Closure(_) | Loader(_) => true,
    }
}

pub(crate) fn callable(value: &Value) -> bool {
    matches!(
        value,
        Value::Primitive(_) | Value::Closure(_) | Value::Loader(_)
    )
}

#[derive(Debug)]
pub enum TypeMismatch {
    NotANumber,
    NotAFloat,
    NotAnInt,
    NotASequence,
    NotASymbol,
    NotAString,
    NotCallable,
    NotComparable,
    EmptySequence,
}

impl Value {
    pub(crate) fn as_number(&self) -> Result<Number, TypeMismatch> {
        match self {
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Float(x) => Ok(Number::Float(*x)),
            Value::Complex(z) => Ok(Number::Complex(*z)),
            _ => Err(TypeMismatch::NotANumber),
        }
    }

    pub(crate) fn as_float(&self) -> Result<f64, TypeMismatch> {
        match self {
            Value::Int(n) => Ok(*n as f64),
            Value::Float(x) => Ok(*x),
            _ => Err(TypeMismatch::NotAFloat),
        }
    }

    pub(crate) fn as_int(&self) -> Result<Int, TypeMismatch> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(TypeMismatch::NotAnInt),
        }
    }

    pub(crate) fn as_seq(&self) -> Result<&[Value], TypeMismatch> {
        match self {
            Value::Seq(elements) => Ok(&elements.0),
            _ => Err(TypeMismatch::NotASequence),
        }
    }

    pub(crate) fn as_symbol(&self) -> Result<Symbol, TypeMismatch> {
        match self {
            Value::Symbol(s) => Ok(*s),
            _ => Err(TypeMismatch::NotASymbol),
        }
    }

    pub(crate) fn as_str(&self) -> Result<&str, TypeMismatch> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(TypeMismatch::NotAString),
        }
    }

    pub fn wrap_seq(elements: Vec<Value>) -> Value {
        Value::Seq(Rc::new(Sequence(elements)))
    }
}

/// The arithmetic view of a value: int, float or complex, promoted in that
/// order when two of them meet.
#[derive(Copy, Clone, Debug)]
pub enum Number {
    Int(Int),
    Float(f64),
    Complex(Complex64),
}

impl Number {
    fn as_complex(self) -> Complex64 {
        match self {
            Number::Int(n) => Complex64::new(n as f64, 0.0),
            Number::Float(x) => Complex64::new(x, 0.0),
            Number::Complex(z) => z,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
            Number::Complex(_) => unreachable!("complex is widened before the float arm"),
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(x) => x == 0.0,
            Number::Complex(z) => z.re == 0.0 && z.im == 0.0,
        }
    }

    pub fn is_one(self) -> bool {
        match self {
            Number::Int(n) => n == 1,
            Number::Float(x) => x == 1.0,
            Number::Complex(z) => z.re == 1.0 && z.im == 0.0,
        }
    }

    pub fn add(self, rhs: Number) -> Number {
        use Number::*;
        match (self, rhs) {
            (Int(a), Int(b)) => Int(a.wrapping_add(b)),
            (Complex(_), _) | (_, Complex(_)) => Complex(self.as_complex() + rhs.as_complex()),
            (a, b) => Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, rhs: Number) -> Number {
        use Number::*;
        match (self, rhs) {
            (Int(a), Int(b)) => Int(a.wrapping_sub(b)),
            (Complex(_), _) | (_, Complex(_)) => Complex(self.as_complex() - rhs.as_complex()),
            (a, b) => Float(a.as_f64() - b.as_f64()),
        }
    }

    pub fn mul(self, rhs: Number) -> Number {
        use Number::*;
        match (self, rhs) {
            (Int(a), Int(b)) => Int(a.wrapping_mul(b)),
            (Complex(_), _) | (_, Complex(_)) => Complex(self.as_complex() * rhs.as_complex()),
            (a, b) => Float(a.as_f64() * b.as_f64()),
        }
    }

    /// True division; an int pair comes back as a float. `None` when the
    /// divisor is zero.
    pub fn div(self, rhs: Number) -> Option<Number> {
        use Number::*;
        if rhs.is_zero() {
            return None;
        }
        Some(match (self, rhs) {
            (Complex(_), _) | (_, Complex(_)) => Complex(self.as_complex() / rhs.as_complex()),
            (a, b) => Float(a.as_f64() / b.as_f64()),
        })
    }

    pub fn abs(self) -> Number {
        match self {
            Number::Int(n) => Number::Int(n.wrapping_abs()),
            Number::Float(x) => Number::Float(x.abs()),
            Number::Complex(z) => Number::Float(z.norm()),
        }
    }

    pub fn pow(self, rhs: Number) -> Number {
        use Number::*;
        match (self, rhs) {
            (Int(a), Int(b)) if 0 <= b && b <= u32::MAX as i64 => Int(a.wrapping_pow(b as u32)),
            (Complex(_), _) | (_, Complex(_)) => {
                Complex(self.as_complex().powc(rhs.as_complex()))
            }
            (a, b) => Float(a.as_f64().powf(b.as_f64())),
        }
    }

    /// `None` when either side is complex (or a NaN float).
    pub fn partial_cmp(self, rhs: Number) -> Option<Ordering> {
        use Number::*;
        match (self, rhs) {
            (Complex(_), _) | (_, Complex(_)) => None,
            (Int(a), Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    pub fn eq(self, rhs: Number) -> bool {
        self.as_complex() == rhs.as_complex()
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Value {
        match n {
            Number::Int(n) => Value::Int(n),
            Number::Float(x) => Value::Float(x),
            Number::Complex(z) => Value::Complex(z),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        // Numbers compare across the int/float/complex split, so 1 = 1.0.
        if let (Ok(x), Ok(y)) = (self.as_number(), other.as_number()) {
            return x.eq(y);
        }
        match (self, other) {
            (Nothing, Nothing) => true,
            (Bool(x), Bool(y)) => x == y,
            (Str(x), Str(y)) => x == y,
            (Symbol(x), Symbol(y)) => x == y,
            (Seq(x), Seq(y)) => equal_sequences(x, y),
            (_, _) => false,
        }
    }
}

fn equal_sequences(xs: &[Value], ys: &[Value]) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x == y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Float(2.0), Value::Complex(Complex64::new(2.0, 0.0)));
        assert_ne!(Value::Int(1), Value::Bool(true));
    }

    #[test]
    fn subtraction_promotes() {
        let diff = Number::Int(5).sub(Number::Float(0.5));
        assert!(matches!(diff, Number::Float(x) if x == 4.5));
    }

    #[test]
    fn division_of_ints_is_true_division() {
        let quotient = Number::Int(6).div(Number::Int(3)).unwrap();
        assert!(matches!(quotient, Number::Float(x) if x == 2.0));
        assert!(Number::Int(1).div(Number::Int(0)).is_none());
    }

    #[test]
    fn complex_does_not_order() {
        let z = Number::Complex(Complex64::new(1.0, 1.0));
        assert!(z.partial_cmp(Number::Int(1)).is_none());
        assert!(Number::Int(1).partial_cmp(Number::Int(2)).is_some());
    }

    #[test]
    fn negative_integer_exponents_go_through_float() {
        assert!(matches!(
            Number::Int(2).pow(Number::Int(-1)),
            Number::Float(x) if x == 0.5
        ));
        assert!(matches!(
            Number::Int(2).pow(Number::Int(10)),
            Number::Int(1024)
        ));
    }

    #[test]
    fn truthiness_follows_emptiness_and_zero() {
        assert!(!truthy(&Value::Nothing));
        assert!(!truthy(&Value::Int(0)));
        assert!(!truthy(&Value::Str(String::new())));
        assert!(!truthy(&Value::wrap_seq(Vec::new())));
        assert!(truthy(&Value::Int(-1)));
        assert!(truthy(&Value::wrap_seq(vec![Value::Int(0)])));
    }
}
