use std::{
    fs,
    sync::{Arc, Mutex},
};

use minipar::{
    error::{Error, LexError, ParseError, RuntimeError},
    interpreter::{evaluator::core::Output, lexer},
    parse_program, run_program, run_program_with_output, tokenize,
};
use walkdir::WalkDir;

/// Runs a script and returns everything it printed.
fn run_capture(src: &str) -> String {
    let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
    let out: Output = sink.clone();
    if let Err(e) = run_program_with_output(src, out) {
        panic!("Script failed: {e}\n{src}");
    }
    let bytes = sink.lock().unwrap().clone();
    String::from_utf8(bytes).expect("program output is UTF-8")
}

fn run_err(src: &str) -> Error {
    match run_program(src) {
        Ok(()) => panic!("Script succeeded but was expected to fail:\n{src}"),
        Err(e) => e,
    }
}

#[test]
fn demo_programs_work() {
    let mut count = 0;

    for entry in WalkDir::new("demos").into_iter()
                                      .filter_map(Result::ok)
                                      .filter(|e| e.path().extension().is_some_and(|ext| ext == "mp"))
    {
        let path = entry.path();
        let source =
            fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
        count += 1;
        run_capture(&source);
    }

    assert!(count > 0, "No demo programs found in demos/");
}

#[test]
fn countdown() {
    let out = run_capture(
        "num: number = 3\n\
         func count(n: number) -> void { while (n >= 0) { print(n); n = n - 1 } }\n\
         count(num)",
    );
    assert_eq!(out, "3\n2\n1\n0\n");
}

#[test]
fn closure_captures_live_environment() {
    let out = run_capture("x: number = 1\nfunc inc() -> void { x = x + 1 }\ninc()\ninc()\nprint(x)");
    assert_eq!(out, "3\n");
}

#[test]
fn string_concat_and_conversion() {
    let out = run_capture("a: string = \"val=\"\nn: number = 7\nprint(a + to_string(n))");
    assert_eq!(out, "val=7\n");
}

#[test]
fn par_block_is_a_barrier() {
    let out = run_capture("a: number = 0\nb: number = 0\npar { a = 1\nb = 2 }\nprint(a + b)");
    assert_eq!(out, "3\n");
}

#[test]
fn short_circuit_avoids_division() {
    let out = run_capture(
        "n: number = 0\nif (n != 0 && (10 / n) > 0) { print(1) } else { print(0) }",
    );
    assert_eq!(out, "0\n");

    let out = run_capture("n: number = 0\nif (n == 0 || (10 / n) > 0) { print(1) }");
    assert_eq!(out, "1\n");
}

#[test]
fn arithmetic_precedence_and_formatting() {
    assert_eq!(run_capture("print(1 + 2 * 3)"), "7\n");
    assert_eq!(run_capture("print((1 + 2) * 3)"), "9\n");
    assert_eq!(run_capture("print(7 / 2)"), "3.5\n");
    assert_eq!(run_capture("print(7 % 3)"), "1\n");
    assert_eq!(run_capture("print(-3 + 5)"), "2\n");
    assert_eq!(run_capture("print(10 - 2 - 3)"), "5\n");
}

#[test]
fn booleans_and_logic() {
    assert_eq!(run_capture("print(true)"), "true\n");
    assert_eq!(run_capture("print(!false)"), "true\n");
    assert_eq!(run_capture("print(true || false && false)"), "true\n");
    assert_eq!(run_capture("print(1 < 2, 2 <= 2, 3 > 4, \"abc\" < \"abd\")"),
               "true true false true\n");
}

#[test]
fn while_with_break_and_continue() {
    let out = run_capture(
        "i: number = 0\n\
         total: number = 0\n\
         while (true) {\n\
             i = i + 1\n\
             if (i > 10) { break }\n\
             if (i % 2 == 1) { continue }\n\
             total = total + i\n\
         }\n\
         print(total)",
    );
    assert_eq!(out, "30\n");
}

#[test]
fn if_else_chains() {
    let src = "func describe(n: number) -> string {\n\
                   if (n < 0) { return \"negative\" }\n\
                   else if (n == 0) { return \"zero\" }\n\
                   else { return \"positive\" }\n\
               }\n\
               print(describe(-5))\nprint(describe(0))\nprint(describe(3))";
    assert_eq!(run_capture(src), "negative\nzero\npositive\n");
}

#[test]
fn block_scopes_shadow_and_restore() {
    let out = run_capture(
        "x: number = 1\nif (true) { x: number = 2\nprint(x) }\nprint(x)",
    );
    assert_eq!(out, "2\n1\n");
}

#[test]
fn implicit_declaration_on_first_assignment() {
    assert_eq!(run_capture("msg = \"hi\"\nprint(msg)"), "hi\n");
    // The inferred type still binds later assignments.
    assert!(matches!(run_err("msg = \"hi\"\nmsg = 3"),
                     Error::Parse(ParseError::TypeMismatch { .. })));
}

#[test]
fn functions_with_defaults_and_recursion() {
    let src = "func greet(name: string, suffix: string = \"!\") -> string {\n\
                   return name + suffix\n\
               }\n\
               print(greet(\"hi\"))\nprint(greet(\"hi\", \"?\"))";
    assert_eq!(run_capture(src), "hi!\nhi?\n");

    let src = "func fib(n: number) -> number {\n\
                   if (n < 2) { return n }\n\
                   return fib(n - 1) + fib(n - 2)\n\
               }\n\
               print(fib(10))";
    assert_eq!(run_capture(src), "55\n");
}

#[test]
fn missing_return_yields_zero_value() {
    assert_eq!(run_capture("func f() -> number { }\nprint(f())"), "0\n");
    assert_eq!(run_capture("func g() -> string { }\nprint(length(g()))"), "0\n");
    assert_eq!(run_capture("func h() -> bool { }\nprint(h())"), "false\n");
}

#[test]
fn seq_blocks_are_transparent() {
    let out = run_capture("seq { a = 1\nb = 2 }\nprint(a + b)");
    assert_eq!(out, "3\n");

    // break inside seq still exits the enclosing loop.
    let out = run_capture(
        "i: number = 0\nwhile (true) { seq { i = i + 1\nif (i == 3) { break } } }\nprint(i)",
    );
    assert_eq!(out, "3\n");
}

#[test]
fn nested_par_joins_all_tasks() {
    let out = run_capture(
        "a: number = 0\nb: number = 0\nc: number = 0\n\
         par { a = 1\npar { b = 2\nc = 3 } }\n\
         print(a + b + c)",
    );
    assert_eq!(out, "6\n");
}

#[test]
fn par_serializes_whole_print_calls() {
    // Ten tasks each print one full line; lines never interleave.
    let src = "par { print(11)\nprint(22)\nprint(33)\nprint(44)\nprint(55)\n\
                     print(66)\nprint(77)\nprint(88)\nprint(99)\nprint(1010) }";
    let out = run_capture(src);
    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines.len(), 10);
    for line in lines {
        assert!(matches!(line, "11" | "22" | "33" | "44" | "55" | "66" | "77" | "88" | "99"
                               | "1010"),
                "interleaved output line: {line:?}");
    }
}

#[test]
fn par_error_propagates_after_join() {
    let err = run_err("done: number = 0\npar { x = 1 / 0\ndone = 1 }");
    assert!(matches!(err, Error::Runtime(RuntimeError::DivisionByZero { .. })));
}

#[test]
fn builtins() {
    assert_eq!(run_capture("print(to_number(\" 42 \"))"), "42\n");
    assert_eq!(run_capture("print(to_number(\"2.5\") * 2)"), "5\n");
    assert_eq!(run_capture("print(to_bool(\"true\"), to_bool(\"false\"))"), "true false\n");
    assert_eq!(run_capture("print(length(\"hello\"))"), "5\n");
    assert_eq!(run_capture("print(isalpha(\"abc\"), isalpha(\"a1\"))"), "true false\n");
    assert_eq!(run_capture("print(isnum(\"123\"), isnum(\"12a\"))"), "true false\n");
    assert_eq!(run_capture("print(exp(0))"), "1\n");
    assert_eq!(run_capture("print(sqrt(9))"), "3\n");
    assert_eq!(run_capture("sleep(0)\noutput(\"done\")"), "done\n");
}

#[test]
fn conversion_failures_are_runtime_errors() {
    assert!(matches!(run_err("n = to_number(\"seven\")"),
                     Error::Runtime(RuntimeError::ConversionFailure { .. })));
    assert!(matches!(run_err("b = to_bool(\"yes\")"),
                     Error::Runtime(RuntimeError::ConversionFailure { .. })));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert!(matches!(run_err("x = 1 / 0"),
                     Error::Runtime(RuntimeError::DivisionByZero { .. })));
    assert!(matches!(run_err("x = 1 % 0"),
                     Error::Runtime(RuntimeError::DivisionByZero { .. })));
    assert_eq!(run_err("x = 1 / 0").exit_code(), 3);
}

#[test]
fn type_errors_are_parse_errors() {
    assert!(matches!(run_err("x: number = \"s\""),
                     Error::Parse(ParseError::TypeMismatch { .. })));
    assert!(matches!(run_err("x = 1 + \"a\""),
                     Error::Parse(ParseError::TypeMismatch { .. })));
    assert!(matches!(run_err("if (1) { print(1) }"),
                     Error::Parse(ParseError::TypeMismatch { .. })));
    assert!(matches!(run_err("x = !3"),
                     Error::Parse(ParseError::TypeMismatch { .. })));
    assert!(matches!(run_err("x = print(1)"),
                     Error::Parse(ParseError::VoidInExpression { .. })));
    assert_eq!(run_err("x: number = \"s\"").exit_code(), 2);
}

#[test]
fn scope_and_declaration_errors() {
    assert!(matches!(run_err("print(y)"),
                     Error::Parse(ParseError::UndeclaredIdentifier { .. })));
    assert!(matches!(run_err("x: number = 1\nx: number = 2"),
                     Error::Parse(ParseError::Redeclaration { .. })));
    assert!(matches!(run_err("print: number = 1"),
                     Error::Parse(ParseError::ReservedIdentifier { .. })));
    assert!(matches!(run_err("f()"),
                     Error::Parse(ParseError::UnknownFunction { .. })));
    assert!(matches!(run_err("x: number = 1\nx(3)"),
                     Error::Parse(ParseError::UnknownFunction { .. })));
}

#[test]
fn call_signature_errors() {
    let src = "func add(a: number, b: number) -> number { return a + b }\nadd(1)";
    assert!(matches!(run_err(src), Error::Parse(ParseError::ArgumentCountMismatch { .. })));

    let src = "func add(a: number, b: number) -> number { return a + b }\nadd(1, \"x\")";
    assert!(matches!(run_err(src), Error::Parse(ParseError::TypeMismatch { .. })));

    assert!(matches!(run_err("length(3)"), Error::Parse(ParseError::TypeMismatch { .. })));
}

#[test]
fn control_flow_placement_errors() {
    assert!(matches!(run_err("break"),
                     Error::Parse(ParseError::BreakOutsideLoop { .. })));
    assert!(matches!(run_err("continue"),
                     Error::Parse(ParseError::ContinueOutsideLoop { .. })));
    assert!(matches!(run_err("return 1"),
                     Error::Parse(ParseError::ReturnOutsideFunction { .. })));
    // A par child is its own task, so a loop may not be exited across it.
    assert!(matches!(run_err("while (true) { par { break } }"),
                     Error::Parse(ParseError::BreakOutsideLoop { .. })));

    let src = "func f() -> number { return \"s\" }";
    assert!(matches!(run_err(src), Error::Parse(ParseError::ReturnTypeMismatch { .. })));
    let src = "func f() -> number { return }";
    assert!(matches!(run_err(src), Error::Parse(ParseError::ReturnTypeMismatch { .. })));
}

#[test]
fn lexical_errors() {
    assert!(matches!(run_err("s = \"unterminated"),
                     Error::Lex(LexError::UnterminatedString { .. })));
    assert!(matches!(run_err("/* never closed"),
                     Error::Lex(LexError::UnterminatedComment { .. })));
    assert!(matches!(run_err("x = 1 @ 2"),
                     Error::Lex(LexError::UnknownCharacter { .. })));
    assert_eq!(run_err("s = \"oops").exit_code(), 1);
}

#[test]
fn comments_and_terminators() {
    let src = "# leading comment\n\
               x: number = 1; y: number = 2\n\
               /* a block\n   comment */\n\
               print(x + y) # trailing";
    assert_eq!(run_capture(src), "3\n");
}

#[test]
fn lex_line_numbers_survive_comments() {
    let tokens = tokenize("a = 1\n/* two\nlines */\nb = 2").unwrap();
    let lines: Vec<usize> = tokens.iter().map(|(_, line)| *line).collect();
    assert_eq!(lines, vec![1, 1, 1, 4, 4, 4]);
}

#[test]
fn token_dump_is_stable() {
    let tokens = tokenize("x = 3").unwrap();
    assert_eq!(lexer::dump_tokens(&tokens),
               "({x, ID}, 1) | line: 1\n({=, ASSIGN}, 1) | line: 1\n({3, NUMBER}, 1) | line: 1\n");
}

#[test]
fn lex_round_trip_preserves_tags() {
    let src = "x: number = 3.5\nwhile (x >= 0) { x = x - 1; print(x, \"step\") }";
    let tokens = tokenize(src).unwrap();
    let joined = tokens.iter()
                       .map(|(token, _)| token.to_string())
                       .collect::<Vec<_>>()
                       .join(" ");
    let again = tokenize(&joined).unwrap();

    let tags = |ts: &[(lexer::Token, usize)]| {
        ts.iter().map(|(t, _)| t.tag()).collect::<Vec<_>>()
    };
    assert_eq!(tags(&tokens), tags(&again));
}

#[test]
fn parsing_is_deterministic() {
    let src = fs::read_to_string("demos/fib.mp").unwrap();
    let first = parse_program(&src).unwrap();
    let second = parse_program(&src).unwrap();
    assert_eq!(first, second);
}

#[test]
fn ast_dump_shows_kinds_types_and_lines() {
    let module = parse_program("n: number = 1 + 2\nprint(n)").unwrap();
    let dump = minipar::ast::dump(&module);

    assert!(dump.starts_with("Module\n"));
    assert!(dump.contains("Decl({n, ID}, line 1) : number"));
    assert!(dump.contains("Arithmetic({+, PLUS}, line 1) : number"));
    assert!(dump.contains("Constant({1, NUMBER}, line 1) : number"));
    assert!(dump.contains("Call({print, ID}, line 2) : void"));
}
