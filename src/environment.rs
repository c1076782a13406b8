use crate::interner::Symbol;
use crate::printer;
use crate::strings::StringMode;
use crate::types::{Formals, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One lexical scope: a symbol→value map plus the link to the enclosing
/// scope. Frames are shared by reference; only child→parent links are
/// strong, so chains stay acyclic.
pub struct Environment {
    data: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Rc<Environment>>,
}

#[derive(Debug)]
pub struct UnknownSymbol(pub Symbol);

impl fmt::Display for UnknownSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not bound", self.0)
    }
}

/// Positional formals did not line up with the actual arguments. Both sides
/// are carried in rendered form for the diagnostic.
#[derive(Debug)]
pub struct BindError {
    pub formals: String,
    pub actuals: String,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "formal parameters {} do not match the arguments {}",
            self.formals, self.actuals
        )
    }
}

impl Environment {
    pub fn empty() -> Rc<Self> {
        Rc::new(Environment {
            data: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn spawn_from(parent: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            data: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Create or overwrite a binding in this frame only.
    pub fn set(&self, key: Symbol, value: Value) {
        self.data.borrow_mut().insert(key, value);
    }

    pub fn get(&self, key: Symbol) -> Option<Value> {
        match self.data.borrow().get(&key) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref()?.get(key),
        }
    }

    pub fn fetch(&self, key: Symbol) -> Result<Value, UnknownSymbol> {
        self.get(key).ok_or(UnknownSymbol(key))
    }

    /// The nearest frame, starting here, whose local map holds `key`.
    /// Assignment uses this to mutate a variable where it was defined.
    pub fn find_frame(self: &Rc<Self>, key: Symbol) -> Option<Rc<Environment>> {
        let mut frame = Rc::clone(self);
        loop {
            if frame.data.borrow().contains_key(&key) {
                return Some(frame);
            }
            let parent = frame.parent.clone()?;
            frame = parent;
        }
    }

    /// The invocation frame for a procedure call. A bare-symbol formal takes
    /// the whole argument sequence; a positional list pairs 1:1 and must
    /// match exactly.
    pub fn for_call(
        formals: &Formals,
        actuals: &[Value],
        parent: &Rc<Environment>,
    ) -> Result<Rc<Environment>, BindError> {
        let frame = Environment::spawn_from(parent);
        match formals {
            Formals::Collected(name) => {
                frame.set(*name, Value::wrap_seq(actuals.to_vec()));
            }
            Formals::Positional(names) => {
                if names.len() != actuals.len() {
                    return Err(BindError {
                        formals: formals.to_string(),
                        actuals: printer::pr_str(
                            &Value::wrap_seq(actuals.to_vec()),
                            StringMode::Raw,
                        ),
                    });
                }
                for (name, value) in names.iter().zip(actuals) {
                    frame.set(*name, value.clone());
                }
            }
        }
        Ok(frame)
    }
}

impl fmt::Debug for Environment {
    // Values are omitted: a frame can hold closures that point back to it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.data.borrow().keys().map(|s| s.as_str()).collect();
        f.debug_struct("Environment")
            .field("keys", &keys)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
