//! End-to-end tests: source text through compiler, VM and disassembler.

use bnuuy::bytecode::{decode_chunk, Instruction, Value};
use bnuuy::error::{BnuuyError, CompileError, RuntimeError};
use bnuuy::{compile, disassemble, interpret, InterpretOutcome, Vm};
use pretty_assertions::assert_eq;

fn number(source: &str) -> f64 {
    interpret(source)
        .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
        .as_number()
        .expect("numeric result")
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(number("1 + 2 * 3"), 7.0);
    assert_eq!(number("(1 + 2) * 3"), 9.0);
    assert_eq!(number("-(-5)"), 5.0);
    assert_eq!(number("8 / 4 / 2"), 1.0);
    assert_eq!(number("10 - 2 - 3"), 5.0);
    assert_eq!(number("2 * 3 - 4 / 2"), 4.0);
    assert_eq!(number("-2 * -3"), 6.0);
    assert_eq!(number("1.5 + 2.25"), 3.75);
}

#[test]
fn whitespace_comments_and_newlines() {
    assert_eq!(number("  1 +   # first operand\n  2 # done\n"), 3.0);
}

#[test]
fn constant_pool_is_positional() {
    let chunk = compile("4 + 4 * (7 - 1)").unwrap();
    let values: Vec<f64> = chunk
        .constants()
        .iter()
        .map(|v| v.as_number().unwrap())
        .collect();
    assert_eq!(values, vec![4.0, 4.0, 7.0, 1.0]);
}

#[test]
fn two_hundred_fifty_seven_constants_fail_to_compile() {
    let source = (1..=257).map(|i| i.to_string()).collect::<Vec<_>>().join(" + ");
    let err = compile(&source).unwrap_err();
    match err {
        CompileError::Syntax(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "Too many constants in one chunk.");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn compiled_chunks_never_reference_missing_constants() {
    let source = (1..=256).map(|i| i.to_string()).collect::<Vec<_>>().join(" - ");
    let chunk = compile(&source).unwrap();
    for (_, instruction) in decode_chunk(&chunk) {
        if let Instruction::Constant { index } = instruction {
            assert!((index as usize) < chunk.constants().len());
        }
    }
}

#[test]
fn disassembly_round_trips_constants_and_lines() {
    let source = "1 +\n2 *\n(3 - 4)";
    let chunk = compile(source).unwrap();

    let mut constants = Vec::new();
    let mut lines = Vec::new();
    for (_, instruction) in decode_chunk(&chunk) {
        match instruction {
            Instruction::Constant { index } => constants.push(chunk.constant(index).unwrap()),
            Instruction::UpdateLine { line } => lines.push(line),
            _ => {}
        }
    }

    assert_eq!(
        constants,
        vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
            Value::Number(4.0)
        ]
    );
    assert_eq!(lines, vec![1, 2, 3]);

    let listing = disassemble(&chunk, "round trip");
    assert!(listing.starts_with("== round trip ==\n"));
    assert!(listing.contains("OP_CONSTANT         3 '4'"));
    assert!(listing.contains("OP_UPDATE_LINE      3"));
}

#[test]
fn runtime_errors_stop_execution_and_map_to_exit_codes() {
    let mut vm = Vm::new();
    let result = vm.interpret("1 +");
    assert!(matches!(result, Err(BnuuyError::Compile(_))));
    assert_eq!(InterpretOutcome::of(&result), InterpretOutcome::CompileError);
    assert_eq!(InterpretOutcome::of(&result).exit_code(), 65);

    let ok = vm.interpret("6 / 3");
    assert_eq!(InterpretOutcome::of(&ok), InterpretOutcome::Ok);
    assert_eq!(InterpretOutcome::Ok.exit_code(), 0);

    let runtime: Result<Value, BnuuyError> =
        Err(RuntimeError::type_mismatch("Operand must be a number.", 1).into());
    assert_eq!(InterpretOutcome::of(&runtime).exit_code(), 70);
}

#[test]
fn interactive_session_recovers_after_errors() {
    let mut vm = Vm::new();
    let lines = ["1 + 2", "(4", "* 3", "2 * (3 + 4)", "@", "-1"];
    let results: Vec<Option<f64>> = lines
        .iter()
        .map(|line| vm.interpret(line).ok().and_then(|v| v.as_number()))
        .collect();
    assert_eq!(
        results,
        vec![Some(3.0), None, None, Some(14.0), None, Some(-1.0)]
    );
    assert_eq!(vm.stack_depth(), 0);
}

#[test]
fn compile_errors_render_with_location() {
    let err = compile("(1 + 2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "[line 1] Error at end: Expect ')' after expression."
    );

    let err = compile("1 +\n\n*").unwrap_err();
    assert_eq!(err.to_string(), "[line 3] Error at '*': Expect expression.");
}

#[test]
fn separate_vms_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let source = format!("{} * 10 + 1", i);
                Vm::new().interpret(&source).unwrap()
            })
        })
        .collect();
    let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        vec![
            Value::Number(1.0),
            Value::Number(11.0),
            Value::Number(21.0),
            Value::Number(31.0)
        ]
    );
}

#[test]
fn deeply_nested_input_is_a_compile_error() {
    let result = interpret(&format!("{}1", "-".repeat(200_000)));
    assert_eq!(InterpretOutcome::of(&result), InterpretOutcome::CompileError);

    assert_eq!(number(&format!("{}1", "-".repeat(100))), 1.0);
}
