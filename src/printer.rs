use crate::strings::{self, StringMode};
use crate::types::Value;
use itertools::Itertools;
use std::fmt;

/// The readable rendering used by the REPL echo, by `输出` for non-strings,
/// and by diagnostics. The string mode decides how string bodies are
/// re-escaped (see `strings::string_repr`).
pub fn pr_str(value: &Value, mode: StringMode) -> String {
    match value {
        Value::Nothing => String::from("#<无值>"),
        Value::Bool(true) => String::from("#真"),
        Value::Bool(false) => String::from("#假"),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => format_float(*x),
        Value::Complex(z) => z.to_string(),
        Value::Str(text) => strings::string_repr(text, mode),
        Value::Symbol(s) => s.as_str().to_string(),
        Value::Seq(elements) => format!(
            "【{}】",
            elements.iter().map(|element| pr_str(element, mode)).join(" ")
        ),
        Value::Primitive(f) => format!("#<内建 {}>", f.name),
        Value::Closure(_) => String::from("#<过程>"),
        Value::Loader(_) => String::from("#<内建 加载>"),
    }
}

// Integral floats keep a trailing .0 so 2.0 and 2 stay distinguishable.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        String::from("nan")
    } else if x.is_infinite() {
        String::from(if x > 0.0 { "inf" } else { "-inf" })
    } else if x == x.trunc() && x.abs() < 1e16 {
        format!("{:.1}", x)
    } else {
        x.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pr_str(self, StringMode::Raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Symbol;
    use crate::reader::parse_atom;

    fn display(value: &Value) -> String {
        pr_str(value, StringMode::Raw)
    }

    #[test]
    fn booleans_use_the_language_markers() {
        assert_eq!(display(&Value::Bool(true)), "#真");
        assert_eq!(display(&Value::Bool(false)), "#假");
    }

    #[test]
    fn sequences_are_bracket_wrapped_and_space_joined() {
        let inner = Value::wrap_seq(vec![Value::Int(3)]);
        let outer = Value::wrap_seq(vec![Value::Int(1), Value::Int(2), inner]);
        assert_eq!(display(&outer), "【1 2 【3】】");
    }

    #[test]
    fn strings_are_quoted_with_inner_quotes_escaped() {
        assert_eq!(
            display(&Value::Str("道\"可\"道".to_string())),
            r#""道\"可\"道""#
        );
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(display(&Value::Float(2.0)), "2.0");
        assert_eq!(display(&Value::Float(2.5)), "2.5");
        assert_eq!(display(&Value::Float(-0.0)), "-0.0");
        assert_eq!(display(&Value::Float(f64::NAN)), "nan");
        assert_eq!(display(&Value::Float(f64::INFINITY)), "inf");
    }

    #[test]
    fn symbols_print_as_their_text() {
        assert_eq!(display(&Value::Symbol(Symbol::intern("显者"))), "显者");
    }

    #[test]
    fn atoms_round_trip_through_the_reader() {
        for literal in &["42", "-7", "2.5", "0+2i", "甲"] {
            let parsed = parse_atom(literal);
            let reparsed = parse_atom(&display(&parsed));
            assert_eq!(parsed, reparsed, "round trip failed for {}", literal);
        }
    }

    #[test]
    fn raw_string_literals_round_trip() {
        use crate::reader::read_expression;
        use crate::tokens::TokenSource;
        use std::io::{BufRead, Cursor};
        // The raw body keeps its escape pair, so the repr is the literal.
        let source = r#""a\nb""#;
        let mut tokens = TokenSource::new(Cursor::new(source).lines());
        let value = read_expression(&mut tokens, StringMode::Raw)
            .unwrap()
            .unwrap();
        assert_eq!(value, Value::Str(r"a\nb".to_string()));
        assert_eq!(pr_str(&value, StringMode::Raw), source);
    }

    #[test]
    fn unescaped_string_literals_round_trip() {
        use crate::reader::read_expression;
        use crate::tokens::TokenSource;
        use std::io::{BufRead, Cursor};
        let source = r#""a\nb""#;
        let mut tokens = TokenSource::new(Cursor::new(source).lines());
        let value = read_expression(&mut tokens, StringMode::Unescaped)
            .unwrap()
            .unwrap();
        assert_eq!(value, Value::Str("a\nb".to_string()));
        assert_eq!(pr_str(&value, StringMode::Unescaped), source);
    }

    #[test]
    fn boolean_markers_normalise_through_the_root_frame() {
        // #t displays as #真, which reads back as a symbol; the root frame
        // binds that symbol to the boolean again.
        use crate::core;
        let env = core::root_environment(StringMode::Raw);
        let marker = parse_atom(&display(&parse_atom("#t")));
        let symbol = marker.as_symbol().unwrap();
        assert_eq!(env.get(symbol), Some(Value::Bool(true)));
    }
}
