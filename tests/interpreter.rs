//! End-to-end tests: whole programs driven through an interpreter with
//! a scripted line source and a captured output sink.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use schemer::error::SchemeError;
use schemer::eval::Interp;
use schemer::reader::{LineSource, QueuedLines};
use schemer::value::{self, Value};

struct NoInput;

impl LineSource for NoInput {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Clone)]
struct Sink(Rc<RefCell<Vec<u8>>>);

impl Sink {
    fn new() -> Self {
        Sink(Rc::new(RefCell::new(Vec::new())))
    }

    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn interp_with(source: Box<dyn LineSource>) -> (Interp, Sink) {
    let sink = Sink::new();
    let interp = Interp::with_io(source, Box::new(sink.clone()));
    (interp, sink)
}

/// Evaluate every expression in `src`; return the printed form of each
/// non-none result plus everything the program displayed.
fn run(src: &str) -> (Vec<String>, String) {
    let (mut interp, sink) = interp_with(Box::new(NoInput));
    interp.feed_source(src);
    let mut results = Vec::new();
    while let Some(expr) = interp.next_expression().unwrap() {
        let env = interp.global_env();
        let v = interp.evaluate(expr, &env).unwrap();
        if !matches!(v, Value::None) {
            results.push(interp.stringify(&v, true));
        }
    }
    (results, sink.contents())
}

/// Evaluate a single expression, expecting an error.
fn run_err(src: &str) -> SchemeError {
    let (mut interp, _sink) = interp_with(Box::new(NoInput));
    interp.feed_source(src);
    let mut last = None;
    while let Some(expr) = interp.next_expression().unwrap() {
        let env = interp.global_env();
        match interp.evaluate(expr, &env) {
            Ok(_) => {}
            Err(e) => last = Some(e),
        }
    }
    last.expect("program did not fail")
}

#[test]
fn basic_arithmetic() {
    let (results, _) = run("(+ 5 6)");
    assert_eq!(results, ["11"]);
}

#[test]
fn dotted_pair_printing() {
    let (results, _) = run("(cons 'a (cons 'b 'c))");
    assert_eq!(results, ["(a b . c)"]);
}

#[test]
fn variadic_list() {
    let (results, _) = run("(list 1 2 3)");
    assert_eq!(results, ["(1 2 3)"]);
}

#[test]
fn recursive_fibonacci() {
    let (results, _) = run(
        "(define fibonacci
           (lambda (n)
             (if (< n 2) n (+ (fibonacci (- n 1)) (fibonacci (- n 2))))))
         (fibonacci 16)",
    );
    assert_eq!(results, ["987"]);
}

#[test]
fn iterative_fibonacci_promotes_to_bigint() {
    let (results, _) = run(
        "(define fib-iter
           (lambda (a b n)
             (if (= n 0) a (fib-iter b (+ a b) (- n 1)))))
         (define fibonacci (lambda (n) (fib-iter 0 1 n)))
         (fibonacci 1000)",
    );
    assert_eq!(
        results,
        ["43466557686937456435688527675040625802564660517371780402481729089536555417949051890403879840079255169295922593080322634775209689623239873322471161642996440906533187938298969649928516003704476137795166849228875"]
    );
}

#[test]
fn six_queens() {
    let program = r#"
        (define append-2
          (lambda (a b)
            (if (null? a) b (cons (car a) (append-2 (cdr a) b)))))

        (define attacks?
          (lambda (col board dist)
            (if (null? board)
                #f
                (if (= (car board) col)
                    #t
                    (if (= (car board) (+ col dist))
                        #t
                        (if (= (+ (car board) dist) col)
                            #t
                            (attacks? col (cdr board) (+ dist 1))))))))

        (define queens
          (lambda (left board)
            (if (= left 0)
                (cons board '())
                (try 1 left board))))

        (define try
          (lambda (col left board)
            (if (< 6 col)
                '()
                (append-2
                 (if (not (attacks? col board 1))
                     (queens (- left 1) (cons col board))
                     '())
                 (try (+ col 1) left board)))))

        (display (queens 6 '()))
        (newline)
    "#;
    let (_, output) = run(program);
    assert_eq!(
        output,
        "((5 3 1 6 4 2) (4 1 5 2 6 3) (3 6 2 5 1 4) (2 4 6 1 3 5))\n"
    );
}

#[test]
fn wind_scenario_reenters_through_the_guards() {
    let program = r#"
        (define path '())
        (define note (lambda (s) (set! path (cons s path))))

        (define reverse-onto
          (lambda (l acc)
            (if (null? l) acc (reverse-onto (cdr l) (cons (car l) acc)))))

        (define list-length
          (lambda (l) (if (null? l) 0 (+ 1 (list-length (cdr l))))))

        (define dynamic-wind
          (lambda (before thunk after)
            (before)
            ((lambda (result) (after) result) (thunk))))

        (define connect (lambda () (note 'connect)))
        (define disconnect (lambda () (note 'disconnect)))
        (define redo #f)

        (define session
          (lambda ()
            (dynamic-wind
              connect
              (lambda ()
                (note (call/cc (lambda (k)
                                 (set! redo (lambda (msg) (connect) (k msg)))
                                 'talk1))))
              disconnect)))

        (session)
        (if (< (list-length path) 4) (redo 'talk2) #f)
        (display (reverse-onto path '()))
        (newline)
    "#;
    let (_, output) = run(program);
    assert_eq!(output, "(connect talk1 disconnect connect talk2 disconnect)\n");
}

#[test]
fn globals_roster() {
    let (results, _) = run("(globals)");
    let printed = &results[0];
    let names: Vec<&str> = printed
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split_whitespace()
        .collect();
    for required in [
        "globals", "error", "number?", "=", "<", "*", "-", "+", "apply", "call/cc", "symbol?",
        "eof-object?", "read", "newline", "display", "list", "not", "null?", "pair?", "eq?",
        "cons", "cdr", "car",
    ] {
        assert!(names.contains(&required), "missing {}", required);
    }
}

#[test]
fn deep_tail_recursion_does_not_overflow() {
    let (results, _) = run(
        "(define countdown
           (lambda (n) (if (= n 0) 'done (countdown (- n 1)))))
         (countdown 1000000)",
    );
    assert_eq!(results, ["done"]);
}

#[test]
fn continuation_escapes_a_pending_computation() {
    let (results, _) = run("(call/cc (lambda (k) (+ 1 (k 42))))");
    assert_eq!(results, ["42"]);
}

#[test]
fn continuation_resumes_at_the_capture_site() {
    let (results, _) = run(
        "(define return #f)
         (+ 1 (call/cc (lambda (k) (set! return k) 1)))
         (return 100)",
    );
    assert_eq!(results, ["2", "101"]);
}

#[test]
fn bare_continuation_value_is_applicable() {
    let (results, _) = run(
        "(define c (call/cc (lambda (k) k)))
         (if (number? c) c (c 42))
         c",
    );
    assert_eq!(results.last().map(String::as_str), Some("42"));
}

#[test]
fn continuation_loop_counts_up() {
    let (results, _) = run(
        "(define path '())
         (define resume #f)
         (begin
           (define n (call/cc (lambda (k) (set! resume k) 0)))
           (set! path (cons n path))
           (if (< n 3) (resume (+ n 1)) path))",
    );
    assert_eq!(results, ["(3 2 1 0)"]);
}

#[test]
fn lambda_body_definitions_stay_local() {
    let (results, _) = run(
        "(define counter
           (lambda ()
             (define n 0)
             (lambda () (set! n (+ n 1)) n)))
         (define tick (counter))
         (tick)
         (tick)
         (tick)",
    );
    assert_eq!(results, ["1", "2", "3"]);
}

#[test]
fn closures_see_later_global_definitions() {
    let (results, _) = run(
        "(define call-later (lambda () (helper)))
         (define helper (lambda () 'ready))
         (call-later)",
    );
    assert_eq!(results, ["ready"]);
}

#[test]
fn apply_spreads_its_argument_list() {
    let (results, _) = run("(apply + (list 1 2))");
    assert_eq!(results, ["3"]);
    let (results, _) = run("(apply car (list (list 7 8)))");
    assert_eq!(results, ["7"]);
}

#[test]
fn display_omits_string_quotes() {
    let (results, output) = run("(display \"hello world\") (newline) \"hello\"");
    assert_eq!(output, "hello world\n");
    assert_eq!(results, ["\"hello\""]);
}

#[test]
fn read_pulls_from_the_host_across_lines() {
    let source = QueuedLines::new(["(1 2", "3)", "done"]);
    let (mut interp, _sink) = interp_with(Box::new(source));
    interp.feed_source("(read) (read) (eof-object? (read))");
    let mut results = Vec::new();
    while let Some(expr) = interp.next_expression().unwrap() {
        let env = interp.global_env();
        let v = interp.evaluate(expr, &env).unwrap();
        results.push(interp.stringify(&v, true));
    }
    assert_eq!(results, ["(1 2 3)", "done", "#t"]);
}

#[test]
fn read_print_round_trip() {
    let sources = [
        "42",
        "-17",
        "2.5",
        "12345678901234567890",
        "#t",
        "()",
        "abc",
        "\"a string\"",
        "(1 (a \"x\") #t 2.5)",
        "(a b . c)",
    ];
    for src in sources {
        let (mut interp, _sink) = interp_with(Box::new(NoInput));
        interp.feed_source(src);
        let first = interp.next_expression().unwrap().unwrap();
        let printed = interp.stringify(&first, true);
        interp.feed_source(&printed);
        let second = interp.next_expression().unwrap().unwrap();
        assert!(deep_equal(&first, &second), "round trip changed {}", src);
    }
}

/// Structural equality over readable values (the `equal?` relation).
fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Cell(x), Value::Cell(y)) => {
            deep_equal(&x.car, &y.car) && deep_equal(&x.cdr, &y.cdr)
        }
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        _ => value::identical(a, b),
    }
}

#[test]
fn user_error_message_is_verbatim() {
    let err = run_err("(error \"boom\" 42)");
    match &err {
        SchemeError::User(msg) => assert_eq!(msg, "Error: boom: 42"),
        other => panic!("expected a user error, got {}", other),
    }
    assert!(!err.to_string().contains('\t'));

    let err = run_err("(error 'bad-input \"x\")");
    assert_eq!(err.to_string(), "Error: bad-input: \"x\"");
}

#[test]
fn other_errors_carry_a_continuation_trace() {
    let err = run_err("(+ 1 (car 5))");
    match err {
        SchemeError::Traced { error, continuation } => {
            assert!(matches!(*error, SchemeError::TypeMismatch(_)));
            assert!(continuation.starts_with("#<"));
        }
        other => panic!("expected a traced error, got {}", other),
    }
}

#[test]
fn unbound_variable_is_reported_by_name() {
    let err = run_err("(no-such-thing)");
    assert!(err.to_string().contains("unbound variable 'no-such-thing'"));
}

#[test]
fn set_of_an_unbound_name_fails_before_evaluating() {
    let err = run_err("(set! nope (error \"never runs\" 0))");
    assert!(err.to_string().contains("unbound variable 'nope'"));
}

#[test]
fn arity_is_checked() {
    let err = run_err("(car)");
    assert!(err.to_string().contains("arity mismatch"));
    let err = run_err("((lambda (x) x) 1 2)");
    assert!(err.to_string().contains("arity mismatch"));
}

#[test]
fn applying_a_non_function_fails() {
    let err = run_err("(5 1)");
    assert!(err.to_string().contains("not a function: 5"));
}

#[test]
fn dotted_argument_list_fails() {
    let err = run_err("(car '(1) . 3)");
    assert!(err.to_string().contains("improper list"));
}

#[test]
fn one_armed_if_yields_no_value() {
    let (results, _) = run("(if #f 'unreached) 'after");
    assert_eq!(results, ["after"]);
}

#[test]
fn numeric_predicates_and_mixed_width_comparison() {
    let (results, _) = run(
        "(number? 1)
         (number? 'x)
         (< 2 (* 100000 100000))
         (= (* 100000 100000) (* 100000 100000))
         (+ 1 2.5)",
    );
    assert_eq!(results, ["#t", "#f", "#t", "#t", "3.5"]);
}
