use crate::environment::Environment;
use crate::evaluator::{evaluate, Error, Result};
use crate::types::{truthy, Arity, Closure, Formals, Value};
use std::process::Command;
use std::rc::Rc;

#[derive(Debug)]
pub enum DefineError {
    WrongArgCount(usize),
    KeyNotASymbol,
}

#[derive(Debug)]
pub enum AssignError {
    WrongArgCount(usize),
    KeyNotASymbol,
}

#[derive(Debug)]
pub enum LambdaError {
    WrongArgCount(usize),
    FormalsNotSequence,
    FormalNotASymbol,
}

#[derive(Debug)]
pub enum CondError {
    ClauseNotSequence,
    ClauseTooShort,
}

pub fn apply_if(args: &[Value], env: &Rc<Environment>) -> Result {
    Arity::exactly(3)
        .validate_for(args.len(), "如果")
        .map_err(Error::BadArgCount)?;
    let condition = evaluate(&args[0], env)?;
    // Only the selected branch is ever evaluated.
    if truthy(&condition) {
        evaluate(&args[1], env)
    } else {
        evaluate(&args[2], env)
    }
}

/// Clauses are 【test result】 pairs; 其它情况 and 否则 fire unconditionally,
/// any other test must evaluate to #真 exactly. When nothing fires the whole
/// form quietly evaluates to no value rather than erroring.
pub fn apply_cond(clauses: &[Value], env: &Rc<Environment>) -> Result {
    for clause in clauses {
        let clause = clause
            .as_seq()
            .map_err(|_| Error::Cond(CondError::ClauseNotSequence))?;
        if clause.len() < 2 {
            return Err(Error::Cond(CondError::ClauseTooShort));
        }
        let fires = match &clause[0] {
            Value::Symbol(s) if matches!(s.as_str(), "其它情况" | "否则") => true,
            test => evaluate(test, env)? == Value::Bool(true),
        };
        if fires {
            return evaluate(&clause[1], env);
        }
    }
    Ok(Value::Nothing)
}

pub fn apply_define(args: &[Value], env: &Rc<Environment>) -> Result {
    let (key, value) = match args {
        [key, value] => Ok((key, value)),
        _ => Err(Error::Define(DefineError::WrongArgCount(args.len()))),
    }?;
    let key = key
        .as_symbol()
        .map_err(|_| Error::Define(DefineError::KeyNotASymbol))?;
    let value = evaluate(value, env)?;
    log::debug!("define {} as {}", key, value);
    env.set(key, value);
    Ok(Value::Nothing)
}

pub fn apply_quote(args: &[Value]) -> Result {
    Arity::exactly(1)
        .validate_for(args.len(), "引")
        .map_err(Error::BadArgCount)?;
    Ok(args[0].clone())
}

/// Assignment rebinds an existing variable in the frame where lookup finds
/// it; a name bound nowhere in the chain is instead declared in the current
/// innermost frame.
pub fn apply_assign(args: &[Value], env: &Rc<Environment>) -> Result {
    let (key, value) = match args {
        [key, value] => Ok((key, value)),
        _ => Err(Error::Assign(AssignError::WrongArgCount(args.len()))),
    }?;
    let key = key
        .as_symbol()
        .map_err(|_| Error::Assign(AssignError::KeyNotASymbol))?;
    let value = evaluate(value, env)?;
    match env.find_frame(key) {
        Some(frame) => frame.set(key, value),
        None => env.set(key, value),
    }
    Ok(Value::Nothing)
}

pub fn apply_lambda(args: &[Value], env: &Rc<Environment>) -> Result {
    let (formals, body) = match args {
        [formals, body] => Ok((formals, body)),
        _ => Err(Error::Lambda(LambdaError::WrongArgCount(args.len()))),
    }?;
    let formals = match formals {
        Value::Symbol(s) => Formals::Collected(*s),
        other => {
            let names = other
                .as_seq()
                .map_err(|_| Error::Lambda(LambdaError::FormalsNotSequence))?
                .iter()
                .map(Value::as_symbol)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| Error::Lambda(LambdaError::FormalNotASymbol))?;
            Formals::Positional(names)
        }
    };
    // The defining frame is captured by reference, not snapshotted: bindings
    // added to that same frame later are visible to the closure.
    let closure = Closure {
        formals,
        body: body.clone(),
        parent: env.clone(),
    };
    Ok(Value::Closure(Rc::new(closure)))
}

/// The two celebratory zero-argument forms hand a track name straight to the
/// host OS and wait for it. Playback trouble is not the session's problem.
pub fn play_track(track: &str) -> Result {
    if let Err(e) = Command::new(track).status() {
        log::warn!("could not play {}: {}", track, e);
    }
    Ok(Value::Nothing)
}
