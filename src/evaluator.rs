use crate::environment::{self, Environment, UnknownSymbol};
use crate::interpreter;
use crate::reader;
use crate::special_forms::{self, AssignError, CondError, DefineError, LambdaError};
use crate::types::{self, Arity, LoadFile, PrimitiveFn, TypeMismatch, Value};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

pub type Result<T = Value> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    UnknownSymbol(environment::UnknownSymbol),
    TypeMismatch(types::TypeMismatch),
    BadArgCount(types::BadArgCount),
    Bind(environment::BindError),
    Define(DefineError),
    Assign(AssignError),
    Lambda(LambdaError),
    Cond(CondError),
    EmptyForm,
    DivideByZero,
    BadIndex(usize, Range<usize>),
    Read(reader::Error),
    Io(std::io::Error),
}

impl Error {
    /// The category the REPL prints ahead of the message, named after the
    /// host exceptions users of the language already know.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownSymbol(_) => "LookupError",
            Error::TypeMismatch(_) | Error::BadArgCount(_) | Error::Bind(_) => "TypeError",
            Error::Define(_) | Error::Assign(_) | Error::Lambda(_) | Error::Cond(_) => {
                "ValueError"
            }
            Error::EmptyForm | Error::BadIndex(..) => "IndexError",
            Error::DivideByZero => "ZeroDivisionError",
            Error::Read(_) => "SyntaxError",
            Error::Io(_) => "OSError",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownSymbol(e) => write!(f, "{}", e),
            Error::TypeMismatch(e) => write!(f, "type mismatch: {:?}", e),
            Error::BadArgCount(e) => write!(f, "{}", e),
            Error::Bind(e) => write!(f, "{}", e),
            Error::Define(e) => write!(f, "定义: {:?}", e),
            Error::Assign(e) => write!(f, "！赋: {:?}", e),
            Error::Lambda(e) => write!(f, "道: {:?}", e),
            Error::Cond(e) => write!(f, "情况符合: {:?}", e),
            Error::EmptyForm => write!(f, "cannot evaluate an empty 【】"),
            Error::DivideByZero => write!(f, "cannot divide by zero!"),
            Error::BadIndex(i, r) => {
                write!(f, "index {} not in range [{}, {})", i, r.start, r.end)
            }
            Error::Read(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl From<TypeMismatch> for Error {
    fn from(e: TypeMismatch) -> Self {
        Self::TypeMismatch(e)
    }
}

impl From<UnknownSymbol> for Error {
    fn from(e: UnknownSymbol) -> Self {
        Self::UnknownSymbol(e)
    }
}

impl From<environment::BindError> for Error {
    fn from(e: environment::BindError) -> Self {
        Self::Bind(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub fn evaluate(expr: &Value, env: &Rc<Environment>) -> Result {
    log::trace!("evaluate {:?}", expr);
    match expr {
        // The no-value sentinel evaluates to itself.
        Value::Nothing => Ok(Value::Nothing),
        Value::Symbol(s) => Ok(env.fetch(*s)?),
        Value::Seq(forms) => evaluate_form(forms, env),
        // Every other atom is a constant.
        _ => Ok(expr.clone()),
    }
}

fn evaluate_form(forms: &[Value], env: &Rc<Environment>) -> Result {
    let (head, rest) = forms.split_first().ok_or(Error::EmptyForm)?;
    if let Value::Symbol(name) = head {
        // Special forms are recognised by exact symbol before the
        // fallthrough to application, so 引 and friends are never looked up
        // as variables.
        match name.as_str() {
            "如果" => return special_forms::apply_if(rest, env),
            "情况符合" => return special_forms::apply_cond(rest, env),
            "定义" => return special_forms::apply_define(rest, env),
            "引" => return special_forms::apply_quote(rest),
            "！赋" => return special_forms::apply_assign(rest, env),
            "道" => return special_forms::apply_lambda(rest, env),
            "送别" if rest.is_empty() => return special_forms::play_track("音乐/送别.mp3"),
            "永远同在" if rest.is_empty() => {
                return special_forms::play_track("音乐/永远同在.mp3")
            }
            _ => (),
        }
    }
    let evaluated = evaluate_sequence_elementwise(forms, env)?;
    let (callable, args) = evaluated.split_first().unwrap();
    apply(callable, args)
}

pub fn evaluate_sequence_elementwise(
    seq: &[Value],
    env: &Rc<Environment>,
) -> std::result::Result<Vec<Value>, Error> {
    seq.iter().map(|obj| evaluate(obj, env)).collect()
}

pub fn apply(callable: &Value, args: &[Value]) -> Result {
    match callable {
        Value::Primitive(f) => call_primitive(f, args),
        Value::Closure(closure) => {
            log::trace!("call {:?} with {} args", closure, args.len());
            let frame = Environment::for_call(&closure.formals, args, &closure.parent)?;
            evaluate(&closure.body, &frame)
        }
        Value::Loader(LoadFile { env, strings }) => {
            Arity::exactly(1)
                .validate_for(args.len(), "加载")
                .map_err(Error::BadArgCount)?;
            let path = args[0].as_str()?;
            let env = env.upgrade().expect("加载: root environment destroyed");
            interpreter::load_file(path, &env, *strings)?;
            Ok(Value::Nothing)
        }
        _ => Err(Error::TypeMismatch(TypeMismatch::NotCallable)),
    }
}

pub fn call_primitive(func: &'static PrimitiveFn, args: &[Value]) -> Result {
    func.arity
        .validate_for(args.len(), func.name)
        .map_err(Error::BadArgCount)?;
    log::trace!("call {} with {} args", func.name, args.len());
    let result = (func.fn_ptr)(args);
    if let Err(e) = &result {
        log::trace!("call to {} failed: {}", func.name, e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core;
    use crate::reader::read_expression;
    use crate::strings::StringMode;
    use crate::tokens::TokenSource;
    use std::io::{BufRead, Cursor};

    fn eval_forms_in(program: &str, env: &Rc<Environment>) -> Vec<Result> {
        let mut tokens = TokenSource::new(Cursor::new(program).lines());
        let mut results = Vec::new();
        while let Some(expr) = read_expression(&mut tokens, StringMode::Raw).unwrap() {
            results.push(evaluate(&expr, env));
        }
        results
    }

    fn eval_forms(program: &str) -> Vec<Result> {
        let env = core::root_environment(StringMode::Raw);
        eval_forms_in(program, &env)
    }

    fn eval_last(program: &str) -> Value {
        eval_forms(program).pop().unwrap().unwrap()
    }

    #[test]
    fn atoms_are_self_evaluating() {
        assert_eq!(eval_last("42"), Value::Int(42));
        assert_eq!(eval_last("#t"), Value::Bool(true));
        assert_eq!(eval_last(r#""文""#), Value::Str("文".to_string()));
    }

    #[test]
    fn unbound_symbols_are_lookup_errors() {
        let errors = eval_forms("子虚乌有");
        assert_eq!(errors[0].as_ref().unwrap_err().kind(), "LookupError");
    }

    #[test]
    fn if_selects_without_touching_the_other_branch() {
        // The alternate names an unbound symbol, so evaluating it would err.
        assert_eq!(eval_last("【如果 #t 1 【子虚乌有】】"), Value::Int(1));
        assert_eq!(eval_last("【如果 #f 【子虚乌有】 2】"), Value::Int(2));
    }

    #[test]
    fn if_condition_uses_truthiness() {
        assert_eq!(eval_last("【如果 0 1 2】"), Value::Int(2));
        assert_eq!(eval_last("【如果 【引 【1】】 1 2】"), Value::Int(1));
    }

    #[test]
    fn if_wants_exactly_three_arguments() {
        let errors = eval_forms("【如果 #t 1】");
        assert_eq!(errors[0].as_ref().unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn cond_fires_the_first_true_clause() {
        let program = "【情况符合 【#f 1】 【【大于 3 2】 2】 【其它情况 3】】";
        assert_eq!(eval_last(program), Value::Int(2));
    }

    #[test]
    fn cond_else_markers_fire_unconditionally() {
        assert_eq!(eval_last("【情况符合 【#f 1】 【否则 9】】"), Value::Int(9));
        assert_eq!(eval_last("【情况符合 【其它情况 8】】"), Value::Int(8));
    }

    #[test]
    fn cond_without_a_match_is_no_value() {
        assert_eq!(eval_last("【情况符合 【#f 1】】"), Value::Nothing);
        // A truthy-but-not-#真 test does not fire.
        assert_eq!(eval_last("【情况符合 【1 1】】"), Value::Nothing);
    }

    #[test]
    fn define_binds_and_produces_no_value() {
        let env = core::root_environment(StringMode::Raw);
        let results = eval_forms_in("【定义 甲 【+ 2 3】】 甲", &env);
        assert_eq!(results[0].as_ref().unwrap(), &Value::Nothing);
        assert_eq!(results[1].as_ref().unwrap(), &Value::Int(5));
    }

    #[test]
    fn quote_suppresses_evaluation() {
        let quoted = eval_last("【引 【+ 1 2】】");
        let elements = quoted.as_seq().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1], Value::Int(1));
    }

    #[test]
    fn assignment_rebinds_in_the_defining_frame() {
        let program = "\
【定义 甲 1】
【定义 改写 【道 【】 【！赋 甲 2】】】
【改写】
甲";
        assert_eq!(eval_last(program), Value::Int(2));
    }

    #[test]
    fn assignment_to_a_fresh_name_stays_local() {
        let program = "\
【定义 设 【道 【】 【！赋 乙 7】】】
【设】
乙";
        let results = eval_forms(program);
        assert_eq!(
            results.last().unwrap().as_ref().unwrap_err().kind(),
            "LookupError"
        );
    }

    #[test]
    fn closures_outlive_the_call_that_made_them() {
        let program = "\
【定义 做加法 【道 【甲】 【道 【乙】 【+ 甲 乙】】】】
【定义 加五 【做加法 5】】
【加五 3】";
        assert_eq!(eval_last(program), Value::Int(8));
    }

    #[test]
    fn call_frames_are_discarded_after_the_call() {
        let program = "\
【定义 藏 【道 【】 【定义 丙 9】】】
【藏】
丙";
        let results = eval_forms(program);
        assert_eq!(
            results.last().unwrap().as_ref().unwrap_err().kind(),
            "LookupError"
        );
    }

    #[test]
    fn bindings_added_to_a_captured_frame_stay_visible() {
        let program = "\
【定义 读 【道 【】 后来】】
【定义 后来 11】
【读】";
        assert_eq!(eval_last(program), Value::Int(11));
    }

    #[test]
    fn a_bare_symbol_formal_collects_all_arguments() {
        let collected = eval_last("【【道 全 全】 1 2 3】");
        assert_eq!(collected.as_seq().unwrap().len(), 3);
    }

    #[test]
    fn positional_arity_is_enforced() {
        let env = core::root_environment(StringMode::Raw);
        eval_forms_in("【定义 两个 【道 【甲 乙】 甲】】", &env);
        for call in &["【两个 1】", "【两个 1 2 3】"] {
            let results = eval_forms_in(call, &env);
            assert_eq!(results[0].as_ref().unwrap_err().kind(), "TypeError");
        }
        let results = eval_forms_in("【两个 1 2】", &env);
        assert_eq!(results[0].as_ref().unwrap(), &Value::Int(1));
    }

    #[test]
    fn applying_a_non_procedure_is_a_type_error() {
        let errors = eval_forms("【1 2】");
        assert_eq!(errors[0].as_ref().unwrap_err().kind(), "TypeError");
    }

    #[test]
    fn the_empty_form_is_an_error() {
        let errors = eval_forms("【】");
        assert_eq!(errors[0].as_ref().unwrap_err().kind(), "IndexError");
    }

    #[test]
    fn special_form_names_win_over_bindings() {
        // 引 is recognised as syntax first, never looked up as a variable.
        let env = core::root_environment(StringMode::Raw);
        let results = eval_forms_in("【引 引】", &env);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &Value::Symbol(crate::interner::Symbol::intern("引"))
        );
    }
}
