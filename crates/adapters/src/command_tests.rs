// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn split(s: &str) -> Vec<String> {
    split_command(s).unwrap()
}

#[test]
fn plain_words() {
    assert_eq!(split("echo hello world"), ["echo", "hello", "world"]);
}

#[test]
fn collapses_whitespace() {
    assert_eq!(split("  echo \t hi  "), ["echo", "hi"]);
}

#[test]
fn single_quotes_are_literal() {
    assert_eq!(split("echo 'hello world'"), ["echo", "hello world"]);
    assert_eq!(split(r#"echo 'a "b" c'"#), ["echo", r#"a "b" c"#]);
}

#[test]
fn double_quotes_with_escapes() {
    assert_eq!(split(r#"echo "hello \"there\"""#), ["echo", r#"hello "there""#]);
    assert_eq!(split(r#"echo "back\\slash""#), ["echo", r"back\slash"]);
}

#[test]
fn backslash_outside_quotes() {
    assert_eq!(split(r"echo hello\ world"), ["echo", "hello world"]);
}

#[test]
fn adjacent_quoted_parts_join() {
    assert_eq!(split(r#"echo 'a'"b"c"#), ["echo", "abc"]);
}

#[test]
fn empty_quoted_argument_survives() {
    assert_eq!(split("run ''"), ["run", ""]);
}

#[test]
fn empty_input_is_empty_argv() {
    assert_eq!(split(""), Vec::<String>::new());
    assert_eq!(split("   "), Vec::<String>::new());
}

#[test]
fn unterminated_quote_errors() {
    assert_eq!(split_command("echo 'oops"), Err(SplitError::UnterminatedQuote));
    assert_eq!(split_command(r#"echo "oops"#), Err(SplitError::UnterminatedQuote));
}

#[test]
fn trailing_backslash_errors() {
    assert_eq!(split_command(r"echo oops\"), Err(SplitError::TrailingEscape));
}
