use rstest::rstest;
use treepath::{ErrorCode, PathError, TreePath, root};

fn parse_err(expr: &str) -> PathError {
    let origin = root().build();
    match TreePath::parse(&origin, expr) {
        Ok(_) => panic!("`{expr}` parsed but should not have"),
        Err(e) => e,
    }
}

#[rstest]
#[case::empty("", ErrorCode::Name, 0)]
#[case::whitespace_only("   ", ErrorCode::Name, 3)]
#[case::double_slash_only("//", ErrorCode::Name, 2)]
#[case::empty_predicate_name("/a[", ErrorCode::Name, 3)]
#[case::trailing_escape("a\\", ErrorCode::Name, 2)]
#[case::unknown_function("foo(", ErrorCode::Name, 0)]
#[case::unknown_function_in_predicate("/a[foo()]", ErrorCode::Name, 3)]
#[case::unterminated_double("\"abc", ErrorCode::Delim, 4)]
#[case::unterminated_single("'abc", ErrorCode::Delim, 4)]
#[case::wrong_arity("position(1)", ErrorCode::Delim, 11)]
#[case::unclosed_predicate("/a[1", ErrorCode::Pred, 4)]
#[case::predicate_junk("/a[1 2]", ErrorCode::Pred, 5)]
#[case::number_too_large("99999999999", ErrorCode::Number, 0)]
#[case::number_over_i32("5000000000", ErrorCode::Number, 0)]
fn syntax_errors(#[case] expr: &str, #[case] code: ErrorCode, #[case] pos: usize) {
    let err = parse_err(expr);
    assert_eq!(err.code(), code, "`{expr}`: {err}");
    assert_eq!(err.position(), pos, "`{expr}`: {err}");
    assert_eq!(err.text(), expr);
}

// Expressions that are well-formed but not node-set-valued location
// paths, or that combine operand types without a rule.
#[rstest]
#[case::bare_number("42")]
#[case::bare_literal("\"a\"")]
#[case::bare_function("position()")]
#[case::boolean_toplevel("\"a\" = \"b\"")]
#[case::arith_toplevel("1 + 2")]
#[case::string_predicate("/a[\"x\"]")]
#[case::nodeset_plus_number("/a[. + 1]")]
#[case::number_vs_string("/a[1 = \"x\"]")]
#[case::nodeset_times_number("/a[. * 2]")]
fn type_errors(#[case] expr: &str) {
    let err = parse_err(expr);
    assert_eq!(err.code(), ErrorCode::Type, "`{expr}`: {err}");
    assert_eq!(err.position(), 0);
}

#[test]
fn error_display_carries_message_and_offset() {
    let err = parse_err("\"abc");
    let rendered = err.to_string();
    assert!(rendered.contains("missing delimiter"), "{rendered}");
    assert!(rendered.contains("offset 4"), "{rendered}");
    assert_eq!(err.message(), "missing delimiter");
}

#[test]
fn trailing_input_is_ignored() {
    // Parsing stops after a complete expression; leftover input is not
    // an error.
    let origin = root().build();
    assert!(TreePath::parse(&origin, "a ]").is_ok());
}
