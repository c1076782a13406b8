use crate::environment::Environment;
use crate::evaluator::{self, Error};
use crate::interner::Symbol;
use crate::printer;
use crate::strings::StringMode;
use crate::types::{
    callable, truthy, Arity, LoadFile, Number, PrimitiveFn, TypeMismatch, Value,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

fn grab_numbers(args: &[Value]) -> evaluator::Result<Vec<Number>> {
    args.iter()
        .map(Value::as_number)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::TypeMismatch)
}

const SUM: PrimitiveFn = PrimitiveFn {
    name: "+",
    fn_ptr: sum_,
    arity: Arity::at_least(0),
};

fn sum_(args: &[Value]) -> evaluator::Result {
    let total = grab_numbers(args)?
        .into_iter()
        .fold(Number::Int(0), |acc, x| acc.add(x));
    Ok(total.into())
}

const SUB: PrimitiveFn = PrimitiveFn {
    name: "-",
    fn_ptr: sub_,
    arity: Arity::at_least(0),
};

// One argument negates. With several, the accumulator starts at zero and the
// first operand that leaves it nonzero becomes the running total; only then
// does subtraction begin, so 【- 0 5 2】 is 3.
fn sub_(args: &[Value]) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let mut acc = Number::Int(0);
    for &x in &numbers {
        if numbers.len() > 1 && acc.is_zero() {
            acc = x;
        } else {
            acc = acc.sub(x);
        }
    }
    Ok(acc.into())
}

const MUL: PrimitiveFn = PrimitiveFn {
    name: "*",
    fn_ptr: mul_,
    arity: Arity::at_least(0),
};

fn mul_(args: &[Value]) -> evaluator::Result {
    let product = grab_numbers(args)?
        .into_iter()
        .fold(Number::Int(1), |acc, x| x.mul(acc));
    Ok(product.into())
}

const DIV: PrimitiveFn = PrimitiveFn {
    name: "/",
    fn_ptr: div_,
    arity: Arity::at_least(0),
};

// The accumulator starts at one and the first operand seeds it, so a single
// argument comes back unchanged and 【/ 1 2 4】 divides 2 by 4.
fn div_(args: &[Value]) -> evaluator::Result {
    let numbers = grab_numbers(args)?;
    let mut acc = Number::Int(1);
    for &x in &numbers {
        if acc.is_one() {
            acc = x;
        } else {
            acc = acc.div(x).ok_or(Error::DivideByZero)?;
        }
    }
    Ok(acc.into())
}

const MODULO: PrimitiveFn = PrimitiveFn {
    name: "求余",
    fn_ptr: modulo_,
    arity: Arity::exactly(2),
};

// The remainder takes the sign of the divisor.
fn modulo_(args: &[Value]) -> evaluator::Result {
    if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
        if *b == 0 {
            return Err(Error::DivideByZero);
        }
        return Ok(Value::Int(
            a.wrapping_rem(*b).wrapping_add(*b).wrapping_rem(*b),
        ));
    }
    let a = args[0].as_float()?;
    let b = args[1].as_float()?;
    if b == 0.0 {
        return Err(Error::DivideByZero);
    }
    Ok(Value::Float(((a % b) + b) % b))
}

const POWER: PrimitiveFn = PrimitiveFn {
    name: "次方",
    fn_ptr: power_,
    arity: Arity::exactly(2),
};

fn power_(args: &[Value]) -> evaluator::Result {
    let base = args[0].as_number()?;
    let exponent = args[1].as_number()?;
    Ok(base.pow(exponent).into())
}

const ABSOLUTE: PrimitiveFn = PrimitiveFn {
    name: "绝对值",
    fn_ptr: absolute_,
    arity: Arity::exactly(1),
};

fn absolute_(args: &[Value]) -> evaluator::Result {
    Ok(args[0].as_number()?.abs().into())
}

const JOIN: PrimitiveFn = PrimitiveFn {
    name: "合",
    fn_ptr: join_,
    arity: Arity::exactly(2),
};

// Binary addition in the host sense: numbers add, strings and sequences
// concatenate.
fn join_(args: &[Value]) -> evaluator::Result {
    match (&args[0], &args[1]) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::Seq(a), Value::Seq(b)) => {
            let mut elements = a.0.clone();
            elements.extend(b.iter().cloned());
            Ok(Value::wrap_seq(elements))
        }
        (a, b) => Ok(a.as_number()?.add(b.as_number()?).into()),
    }
}

const ROUND: PrimitiveFn = PrimitiveFn {
    name: "舍入",
    fn_ptr: round_,
    arity: Arity::exactly(1),
};

fn round_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        other => {
            // Ties round to even, the way the host rounds.
            let x = other.as_float()?;
            Ok(Value::Int(x.round_ties_even() as i64))
        }
    }
}

fn comparison_(args: &[Value], satisfied: fn(Ordering) -> bool) -> evaluator::Result {
    let a = args[0].as_number()?;
    let b = args[1].as_number()?;
    if matches!(a, Number::Complex(_)) || matches!(b, Number::Complex(_)) {
        return Err(Error::TypeMismatch(TypeMismatch::NotComparable));
    }
    // NaN operands are unordered: every comparison against them is #假.
    Ok(Value::Bool(a.partial_cmp(b).map_or(false, satisfied)))
}

macro_rules! comparison_primitive {
    ($SYMBOL:tt, $NAME:ident) => {
        paste::item! {
            const $NAME: PrimitiveFn = PrimitiveFn {
                name: stringify!($SYMBOL),
                fn_ptr: |args: &[Value]| comparison_(args, Ordering::[<is_ $NAME:lower>]),
                arity: Arity::exactly(2),
            };
        }
    };
}

comparison_primitive!(<, LT);
comparison_primitive!(<=, LE);
comparison_primitive!(>, GT);
comparison_primitive!(>=, GE);

const EQUAL: PrimitiveFn = PrimitiveFn {
    name: "=",
    fn_ptr: equal_,
    arity: Arity::exactly(2),
};

fn equal_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Bool(args[0] == args[1]))
}

const IDENTICAL: PrimitiveFn = PrimitiveFn {
    name: "？同",
    fn_ptr: identical_,
    arity: Arity::exactly(2),
};

fn identical_(args: &[Value]) -> evaluator::Result {
    use Value::*;
    let same = match (&args[0], &args[1]) {
        (Symbol(a), Symbol(b)) => a == b,
        (Bool(a), Bool(b)) => a == b,
        (Int(a), Int(b)) => a == b,
        (Nothing, Nothing) => true,
        (Seq(a), Seq(b)) => Rc::ptr_eq(a, b),
        (Closure(a), Closure(b)) => Rc::ptr_eq(a, b),
        (Primitive(a), Primitive(b)) => std::ptr::eq(*a, *b),
        _ => false,
    };
    Ok(Value::Bool(same))
}

const ALL: PrimitiveFn = PrimitiveFn {
    name: "与",
    fn_ptr: all_,
    arity: Arity::at_least(0),
};

// Folds like the host's `and`: the first falsy operand, else the last one.
fn all_(args: &[Value]) -> evaluator::Result {
    let mut acc = Value::Bool(true);
    for arg in args {
        if !truthy(&acc) {
            break;
        }
        acc = arg.clone();
    }
    Ok(acc)
}

const ANY: PrimitiveFn = PrimitiveFn {
    name: "或",
    fn_ptr: any_,
    arity: Arity::at_least(0),
};

fn any_(args: &[Value]) -> evaluator::Result {
    let mut acc = Value::Bool(false);
    for arg in args {
        if truthy(&acc) {
            break;
        }
        acc = arg.clone();
    }
    Ok(acc)
}

const NOT: PrimitiveFn = PrimitiveFn {
    name: "不",
    fn_ptr: not_,
    arity: Arity::exactly(1),
};

fn not_(args: &[Value]) -> evaluator::Result {
    Ok(Value::Bool(!truthy(&args[0])))
}

const PAIR_UP: PrimitiveFn = PrimitiveFn {
    name: "宇对",
    fn_ptr: pair_up_,
    arity: Arity::exactly(2),
};

// Prepends to a sequence; any other tail makes a two-element pair.
fn pair_up_(args: &[Value]) -> evaluator::Result {
    let mut elements = vec![args[0].clone()];
    match &args[1] {
        Value::Seq(tail) => elements.extend(tail.iter().cloned()),
        other => elements.push(other.clone()),
    }
    Ok(Value::wrap_seq(elements))
}

const HEAD: PrimitiveFn = PrimitiveFn {
    name: "显者",
    fn_ptr: head_,
    arity: Arity::exactly(1),
};

fn head_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Seq(elements) => elements
            .first()
            .cloned()
            .ok_or(Error::BadIndex(0, 0..0)),
        Value::Str(text) => text
            .chars()
            .next()
            .map(|c| Value::Str(c.to_string()))
            .ok_or(Error::BadIndex(0, 0..0)),
        _ => Err(Error::TypeMismatch(TypeMismatch::NotASequence)),
    }
}

const TAIL: PrimitiveFn = PrimitiveFn {
    name: "隐者",
    fn_ptr: tail_,
    arity: Arity::exactly(1),
};

fn tail_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Seq(elements) => Ok(Value::wrap_seq(
            elements.iter().skip(1).cloned().collect(),
        )),
        Value::Str(text) => Ok(Value::Str(text.chars().skip(1).collect())),
        _ => Err(Error::TypeMismatch(TypeMismatch::NotASequence)),
    }
}

const LENGTH: PrimitiveFn = PrimitiveFn {
    name: "长度",
    fn_ptr: length_,
    arity: Arity::exactly(1),
};

fn length_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Seq(elements) => Ok(Value::Int(elements.len() as i64)),
        Value::Str(text) => Ok(Value::Int(text.chars().count() as i64)),
        _ => Err(Error::TypeMismatch(TypeMismatch::NotASequence)),
    }
}

const MAKE_LIST: PrimitiveFn = PrimitiveFn {
    name: "序列",
    fn_ptr: make_list_,
    arity: Arity::at_least(0),
};

fn make_list_(args: &[Value]) -> evaluator::Result {
    Ok(Value::wrap_seq(args.to_vec()))
}

fn extremum_(args: &[Value], keep: fn(Ordering) -> bool) -> evaluator::Result {
    // A single sequence argument is searched elementwise.
    let candidates = match args {
        [Value::Seq(elements)] => grab_numbers(elements)?,
        _ => grab_numbers(args)?,
    };
    let (first, rest) = candidates
        .split_first()
        .ok_or(Error::TypeMismatch(TypeMismatch::EmptySequence))?;
    let mut best = *first;
    for &x in rest {
        if matches!(x, Number::Complex(_)) || matches!(best, Number::Complex(_)) {
            return Err(Error::TypeMismatch(TypeMismatch::NotComparable));
        }
        // An unordered (NaN) comparison keeps the running extremum.
        if x.partial_cmp(best).map_or(false, keep) {
            best = x;
        }
    }
    Ok(best.into())
}

const MAX: PrimitiveFn = PrimitiveFn {
    name: "最大值",
    fn_ptr: |args| extremum_(args, Ordering::is_gt),
    arity: Arity::at_least(1),
};

const MIN: PrimitiveFn = PrimitiveFn {
    name: "最小值",
    fn_ptr: |args| extremum_(args, Ordering::is_lt),
    arity: Arity::at_least(1),
};

const PAIR_TEST: PrimitiveFn = PrimitiveFn {
    name: "？成对",
    fn_ptr: |args| Ok(Value::Bool(matches!(&args[0], Value::Seq(s) if !s.is_empty()))),
    arity: Arity::exactly(1),
};

const SEQ_TEST: PrimitiveFn = PrimitiveFn {
    name: "？序列",
    fn_ptr: |args| Ok(Value::Bool(matches!(args[0], Value::Seq(_)))),
    arity: Arity::exactly(1),
};

const EMPTY_TEST: PrimitiveFn = PrimitiveFn {
    name: "？空",
    fn_ptr: |args| Ok(Value::Bool(matches!(&args[0], Value::Seq(s) if s.is_empty()))),
    arity: Arity::exactly(1),
};

const NUMBER_TEST: PrimitiveFn = PrimitiveFn {
    name: "？数",
    // Ints and floats only; complex values don't count.
    fn_ptr: |args| Ok(Value::Bool(matches!(args[0], Value::Int(_) | Value::Float(_)))),
    arity: Arity::exactly(1),
};

const PROCEDURE_TEST: PrimitiveFn = PrimitiveFn {
    name: "？过程",
    fn_ptr: |args| Ok(Value::Bool(callable(&args[0]))),
    arity: Arity::exactly(1),
};

const SYMBOL_TEST: PrimitiveFn = PrimitiveFn {
    name: "？符",
    fn_ptr: |args| Ok(Value::Bool(matches!(args[0], Value::Symbol(_)))),
    arity: Arity::exactly(1),
};

const APPLY: PrimitiveFn = PrimitiveFn {
    name: "求",
    fn_ptr: apply_,
    arity: Arity::exactly(2),
};

fn apply_(args: &[Value]) -> evaluator::Result {
    let arguments = args[1].as_seq()?;
    evaluator::apply(&args[0], arguments)
}

const BEGIN: PrimitiveFn = PrimitiveFn {
    name: "开始",
    fn_ptr: begin_,
    arity: Arity::at_least(1),
};

fn begin_(args: &[Value]) -> evaluator::Result {
    Ok(args.last().unwrap().clone())
}

const OUTPUT: PrimitiveFn = PrimitiveFn {
    name: "输出",
    fn_ptr: output_,
    arity: Arity::exactly(1),
};

// Strings go out as their raw text, everything else in readable form with
// nested strings in their quote-escaped surface spelling. Data lands on
// stdout; diagnostics use stderr, so redirected output stays clean.
fn output_(args: &[Value]) -> evaluator::Result {
    match &args[0] {
        Value::Str(text) => println!("{}", text),
        value => println!("{}", printer::pr_str(value, StringMode::Raw)),
    }
    Ok(Value::Nothing)
}

// ---------------------------------------------------------------------------
// Host math library, merged into the root frame by name.

fn float_arg(args: &[Value], index: usize) -> evaluator::Result<f64> {
    args[index].as_float().map_err(Error::TypeMismatch)
}

macro_rules! unary_math {
    ($NAME:ident, $name:literal, $method:ident) => {
        const $NAME: PrimitiveFn = PrimitiveFn {
            name: $name,
            fn_ptr: |args| Ok(Value::Float(float_arg(args, 0)?.$method())),
            arity: Arity::exactly(1),
        };
    };
}

macro_rules! binary_math {
    ($NAME:ident, $name:literal, $method:ident) => {
        const $NAME: PrimitiveFn = PrimitiveFn {
            name: $name,
            fn_ptr: |args| {
                Ok(Value::Float(float_arg(args, 0)?.$method(float_arg(args, 1)?)))
            },
            arity: Arity::exactly(2),
        };
    };
}

unary_math!(SIN, "sin", sin);
unary_math!(COS, "cos", cos);
unary_math!(TAN, "tan", tan);
unary_math!(ASIN, "asin", asin);
unary_math!(ACOS, "acos", acos);
unary_math!(ATAN, "atan", atan);
unary_math!(SINH, "sinh", sinh);
unary_math!(COSH, "cosh", cosh);
unary_math!(TANH, "tanh", tanh);
unary_math!(SQRT, "sqrt", sqrt);
unary_math!(EXP, "exp", exp);
unary_math!(LOG2, "log2", log2);
unary_math!(LOG10, "log10", log10);
unary_math!(FLOOR, "floor", floor);
unary_math!(CEIL, "ceil", ceil);
unary_math!(TRUNC, "trunc", trunc);
unary_math!(FABS, "fabs", abs);
unary_math!(DEGREES, "degrees", to_degrees);
unary_math!(RADIANS, "radians", to_radians);
binary_math!(ATAN2, "atan2", atan2);
binary_math!(HYPOT, "hypot", hypot);
binary_math!(COPYSIGN, "copysign", copysign);

const LOG: PrimitiveFn = PrimitiveFn {
    name: "log",
    fn_ptr: log_,
    arity: Arity::Between(1..=2),
};

// Natural log, or log in the given base.
fn log_(args: &[Value]) -> evaluator::Result {
    let x = float_arg(args, 0)?;
    match args.len() {
        1 => Ok(Value::Float(x.ln())),
        _ => Ok(Value::Float(x.log(float_arg(args, 1)?))),
    }
}

const FMOD: PrimitiveFn = PrimitiveFn {
    name: "fmod",
    fn_ptr: |args| Ok(Value::Float(float_arg(args, 0)? % float_arg(args, 1)?)),
    arity: Arity::exactly(2),
};

const GCD: PrimitiveFn = PrimitiveFn {
    name: "gcd",
    fn_ptr: gcd_,
    arity: Arity::exactly(2),
};

fn gcd_(args: &[Value]) -> evaluator::Result {
    let mut a = args[0].as_int()?.wrapping_abs();
    let mut b = args[1].as_int()?.wrapping_abs();
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    Ok(Value::Int(a))
}

const ISNAN: PrimitiveFn = PrimitiveFn {
    name: "isnan",
    fn_ptr: |args| Ok(Value::Bool(float_arg(args, 0)?.is_nan())),
    arity: Arity::exactly(1),
};

const ISINF: PrimitiveFn = PrimitiveFn {
    name: "isinf",
    fn_ptr: |args| Ok(Value::Bool(float_arg(args, 0)?.is_infinite())),
    arity: Arity::exactly(1),
};

const ISFINITE: PrimitiveFn = PrimitiveFn {
    name: "isfinite",
    fn_ptr: |args| Ok(Value::Bool(float_arg(args, 0)?.is_finite())),
    arity: Arity::exactly(1),
};

type Namespace = HashMap<&'static str, &'static PrimitiveFn>;

lazy_static! {
    pub static ref CORE: Namespace = {
        let mut map = Namespace::new();
        for func in [
            // Arithmetic
            SUM,
            SUB,
            MUL,
            DIV,
            MODULO,
            POWER,
            ABSOLUTE,
            JOIN,
            ROUND,
            // Comparisons and equality
            GT,
            GE,
            LT,
            LE,
            EQUAL,
            IDENTICAL,
            // Boolean reducers
            ALL,
            ANY,
            NOT,
            // Working with sequences
            PAIR_UP,
            HEAD,
            TAIL,
            LENGTH,
            MAKE_LIST,
            MAX,
            MIN,
            // Testing
            PAIR_TEST,
            SEQ_TEST,
            EMPTY_TEST,
            NUMBER_TEST,
            PROCEDURE_TEST,
            SYMBOL_TEST,
            // Higher order and output
            APPLY,
            BEGIN,
            OUTPUT,
            // The math library
            SIN,
            COS,
            TAN,
            ASIN,
            ACOS,
            ATAN,
            SINH,
            COSH,
            TANH,
            SQRT,
            EXP,
            LOG,
            LOG2,
            LOG10,
            FLOOR,
            CEIL,
            TRUNC,
            FABS,
            DEGREES,
            RADIANS,
            ATAN2,
            HYPOT,
            COPYSIGN,
            FMOD,
            GCD,
            ISNAN,
            ISINF,
            ISFINITE,
        ]
        .iter()
        {
            map.insert(func.name, func);
        }
        // The literary spellings resolve to the very same primitives.
        for &(alias, name) in &[
            ("大于", ">"),
            ("小于", "<"),
            ("大于等于", ">="),
            ("小于等于", "<="),
            ("？等", "="),
        ] {
            let func = map[name];
            map.insert(alias, func);
        }
        map
    };
}

/// The root frame: every builtin, the math constants, the boolean constants
/// and the file loader, which holds the frame itself weakly.
pub fn root_environment(strings: StringMode) -> Rc<Environment> {
    let env = Environment::empty();
    for (&name, &func) in CORE.iter() {
        env.set(Symbol::intern(name), Value::Primitive(func));
    }
    for &(name, value) in &[
        ("pi", std::f64::consts::PI),
        ("e", std::f64::consts::E),
        ("tau", std::f64::consts::PI * 2.0),
        ("inf", f64::INFINITY),
        ("nan", f64::NAN),
    ] {
        env.set(Symbol::intern(name), Value::Float(value));
    }
    env.set(Symbol::intern("#真"), Value::Bool(true));
    env.set(Symbol::intern("#假"), Value::Bool(false));
    env.set(
        Symbol::intern("加载"),
        Value::Loader(LoadFile {
            env: Rc::downgrade(&env),
            strings,
        }),
    );
    env
}
