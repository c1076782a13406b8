use std::io::{BufRead, Cursor};
use std::rc::Rc;

use xumeng::core;
use xumeng::environment::Environment;
use xumeng::evaluator::{self, evaluate};
use xumeng::printer::pr_str;
use xumeng::reader::{self, read_expression};
use xumeng::strings::StringMode;
use xumeng::tokens::TokenSource;
use xumeng::Value;

fn session() -> Rc<Environment> {
    core::root_environment(StringMode::Raw)
}

fn run_all(program: &str, env: &Rc<Environment>) -> Vec<evaluator::Result> {
    let mut tokens = TokenSource::new(Cursor::new(program).lines());
    let mut results = Vec::new();
    loop {
        match read_expression(&mut tokens, StringMode::Raw) {
            Ok(None) => break,
            Ok(Some(expr)) => results.push(evaluate(&expr, env)),
            Err(e) => panic!("read error: {}", e),
        }
    }
    results
}

fn last_display(program: &str) -> String {
    let env = session();
    let value = run_all(program, &env)
        .pop()
        .expect("no forms")
        .expect("evaluation failed");
    pr_str(&value, StringMode::Raw)
}

#[test]
fn sums_a_simple_form() {
    assert_eq!(last_display("【+ 1 2 3】"), "6");
}

#[test]
fn defines_and_applies_a_procedure() {
    let program = "【定义 平方 【道 【甲】 【* 甲 甲】】】\n【平方 5】";
    assert_eq!(last_display(program), "25");
}

#[test]
fn conditional_selects_a_string() {
    assert_eq!(last_display(r#"【如果 #t "可以" "不行"】"#), r#""可以""#);
}

#[test]
fn raw_string_display_reproduces_the_literal() {
    // The escape pair in the body is kept verbatim, not doubled.
    assert_eq!(last_display(r#""a\nb""#), r#""a\nb""#);
}

#[test]
fn quote_returns_the_literal_sequence() {
    assert_eq!(last_display("【引 【1 2 3】】"), "【1 2 3】");
}

#[test]
fn a_failing_form_does_not_poison_the_session() {
    let env = session();
    let results = run_all(r#"【+ 1 "甲"】"#, &env);
    assert_eq!(results[0].as_ref().unwrap_err().kind(), "TypeError");
    // The same session keeps evaluating afterwards.
    let after = run_all("【+ 2 2】", &env);
    assert_eq!(pr_str(after[0].as_ref().unwrap(), StringMode::Raw), "4");
}

#[test]
fn forms_may_span_physical_lines() {
    assert_eq!(last_display("【+ 1\n   【* 2\n      3】】"), "7");
}

#[test]
fn literary_bracket_markers_read_like_brackets() {
    assert_eq!(last_display("~其+ 4 5哉~"), "9");
    assert_eq!(last_display("~然* 2 3耳~"), "6");
}

#[test]
fn fullwidth_comments_vanish_before_reading() {
    assert_eq!(last_display("【+ 1 2】（注：二者相加）"), "3");
}

#[test]
fn global_assignment_from_a_nested_call() {
    let program = "\
【定义 甲 1】
【定义 改写 【道 【】 【！赋 甲 2】】】
【改写】
甲";
    assert_eq!(last_display(program), "2");
}

#[test]
fn fresh_names_assigned_in_a_call_stay_local() {
    let env = session();
    let program = "\
【定义 设 【道 【】 【！赋 乙 7】】】
【设】
乙";
    let results = run_all(program, &env);
    assert_eq!(
        results.last().unwrap().as_ref().unwrap_err().kind(),
        "LookupError"
    );
}

#[test]
fn arity_is_enforced_exactly() {
    let env = session();
    run_all("【定义 两个 【道 【甲 乙】 甲】】", &env);
    let short = run_all("【两个 1】", &env);
    assert_eq!(short[0].as_ref().unwrap_err().kind(), "TypeError");
    let long = run_all("【两个 1 2 3】", &env);
    assert_eq!(long[0].as_ref().unwrap_err().kind(), "TypeError");
    // The diagnostic names both sides of the mismatch.
    let message = long[0].as_ref().unwrap_err().to_string();
    assert!(message.contains("【甲 乙】"));
    assert!(message.contains("【1 2 3】"));
}

#[test]
fn unterminated_and_stray_brackets_are_read_errors() {
    let mut tokens = TokenSource::new(Cursor::new("【+ 1 【+ 2 3").lines());
    assert!(matches!(
        read_expression(&mut tokens, StringMode::Raw),
        Err(reader::Error::UnterminatedList)
    ));
    let mut tokens = TokenSource::new(Cursor::new("】").lines());
    assert!(matches!(
        read_expression(&mut tokens, StringMode::Raw),
        Err(reader::Error::UnexpectedClosingBracket)
    ));
}

#[test]
fn arithmetic_edge_cases_hold() {
    assert_eq!(last_display("【+】"), "0");
    assert_eq!(last_display("【*】"), "1");
    assert_eq!(last_display("【- 5】"), "-5");
    assert_eq!(last_display("【- 5 2 1】"), "2");
    assert_eq!(last_display("【- 0 5 2】"), "3");
    assert_eq!(last_display("【/ 1 2 4】"), "0.5");
}

#[test]
fn cond_with_no_match_quietly_produces_nothing() {
    let env = session();
    let results = run_all("【情况符合 【#f 1】】", &env);
    assert_eq!(results[0].as_ref().unwrap(), &Value::Nothing);
}

#[test]
fn the_math_library_is_on_the_root_frame() {
    assert_eq!(last_display("【sqrt 9】"), "3.0");
    assert_eq!(last_display("【最大值 3 1 4 1 5】"), "5");
    assert_eq!(last_display("【舍入 【* 2 pi】】"), "6");
}

#[test]
fn list_primitives_compose() {
    assert_eq!(last_display("【宇对 1 【引 【2 3】】】"), "【1 2 3】");
    assert_eq!(last_display("【显者 【序列 7 8 9】】"), "7");
    assert_eq!(last_display("【隐者 【序列 7 8 9】】"), "【8 9】");
    assert_eq!(last_display("【长度 【序列 1 2 3 4】】"), "4");
    assert_eq!(last_display("【求 + 【序列 1 2 3】】"), "6");
    assert_eq!(last_display("【开始 1 2 3】"), "3");
}

#[test]
fn recursion_works_through_the_environment_chain() {
    let program = "\
【定义 阶乘 【道 【甲】 【如果 【小于 甲 2】 1 【* 甲 【阶乘 【- 甲 1】】】】】】
【阶乘 6】";
    assert_eq!(last_display(program), "720");
}

#[test]
fn complex_literals_evaluate_to_themselves() {
    assert_eq!(last_display("2i"), "0+2i");
    assert_eq!(last_display("【+ 1 2i】"), "1+2i");
}
