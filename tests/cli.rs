use assert_cmd::Command;

#[test]
fn repl_evaluates_a_line() {
    let mut cmd = Command::cargo_bin("lox").unwrap();
    let assert = cmd.write_stdin("print 1 + 2;\n").assert().success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains('3'));
}

#[test]
fn repl_survives_errors() {
    let mut cmd = Command::cargo_bin("lox").unwrap();
    let assert = cmd.write_stdin("print +;\nprint 42;\n").assert().success();

    let output = assert.get_output();
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();

    assert!(stdout.contains("42"), "the line after the error should still run");
    assert!(stderr.contains("Expect expression."));
}

#[test]
fn too_many_arguments_prints_usage() {
    let mut cmd = Command::cargo_bin("lox").unwrap();
    cmd.args(["one.lox", "two.lox"]).assert().code(64).stdout("Usage: lox [script]\n");
}
