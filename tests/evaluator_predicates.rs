use rstest::rstest;
use treepath::{SimpleNode, TreeNode, TreePath, leaf, root, tree};

fn eval(origin: &SimpleNode, expr: &str) -> Vec<SimpleNode> {
    let mut path =
        TreePath::parse(origin, expr).unwrap_or_else(|e| panic!("parse `{expr}`: {e}"));
    let nodes: Vec<_> =
        path.nodes().unwrap_or_else(|e| panic!("eval `{expr}`: {e}")).collect();
    nodes
}

fn values(nodes: &[SimpleNode]) -> Vec<String> {
    nodes.iter().map(|n| n.value().unwrap_or_default()).collect()
}

/// (r (x "1") (x "2") (x "3"))
fn three() -> SimpleNode {
    root()
        .child(leaf("x", "1"))
        .child(leaf("x", "2"))
        .child(leaf("x", "3"))
        .build()
}

#[rstest]
#[case::position_literal("/x[2]", &["2"])]
#[case::position_function("/x[position() = 2]", &["2"])]
#[case::first("/x[1]", &["1"])]
#[case::last_function("/x[last()]", &["3"])]
#[case::position_equals_last("/x[position() = last()]", &["3"])]
#[case::out_of_range("/x[4]", &[])]
#[case::boolean_keep_all("/x[position() = position()]", &["1", "2", "3"])]
#[case::value_filter("/x[. = \"2\"]", &["2"])]
#[case::value_filter_none("/x[. = \"9\"]", &[])]
fn position_and_value_predicates(#[case] expr: &str, #[case] expected: &[&str]) {
    let r = three();
    assert_eq!(values(&eval(&r, expr)), expected, "`{expr}`");
}

#[test]
fn positions_number_the_pre_removal_set() {
    // Removing a candidate does not renumber the rest: the context
    // position keeps counting over the set as it stood when the
    // predicate started.
    let r = three();
    assert_eq!(values(&eval(&r, "/x[position() != 1]")), ["2", "3"]);
    assert_eq!(values(&eval(&r, "/x[position() != 2]")), ["1", "3"]);
}

#[test]
fn chained_predicates_renumber_between_predicates() {
    let r = three();
    // [position() = 2] narrows to one node, which the second predicate
    // then sees at position 1.
    assert_eq!(values(&eval(&r, "/x[position() = 2][position() = 1]")), ["2"]);
    assert!(eval(&r, "/x[position() = 2][position() = 2]").is_empty());
}

#[test]
fn last_is_relative_to_the_current_working_set() {
    // (r (x "1" (b)) (x "2") (x "3" (b)))
    let r = root()
        .child(tree("x").value("1").child(tree("b")))
        .child(leaf("x", "2"))
        .child(tree("x").value("3").child(tree("b")))
        .build();
    // The node-set predicate keeps the two nodes with a `b` child; the
    // position predicate then indexes the filtered set.
    assert_eq!(values(&eval(&r, "/x[b][2]")), ["3"]);
    assert_eq!(values(&eval(&r, "/x[b][last()]")), ["3"]);
    assert_eq!(values(&eval(&r, "/x[b][1]")), ["1"]);
}

#[test]
fn nodeset_predicate_keeps_nonempty_matches() {
    let r = root()
        .child(tree("x").value("1"))
        .child(tree("x").value("2").child(tree("b")))
        .build();
    assert_eq!(values(&eval(&r, "/x[b]")), ["2"]);
    assert_eq!(values(&eval(&r, "/x[zzz]")), [] as [&str; 0]);
}

#[test]
fn nested_path_predicates_evaluate_relative_to_each_candidate() {
    // (r (x "1" (b "k")) (x "2" (b "other")))
    let r = root()
        .child(tree("x").value("1").child(leaf("b", "k")))
        .child(tree("x").value("2").child(leaf("b", "other")))
        .build();
    assert_eq!(values(&eval(&r, "/x[b = \"k\"]")), ["1"]);
}

#[test]
fn predicates_apply_per_step() {
    // (r (a (b "1") (b "2")) (a (b "3")))
    let r = root()
        .child(tree("a").child(leaf("b", "1")).child(leaf("b", "2")))
        .child(tree("a").child(leaf("b", "3")))
        .build();
    // The working set for the second step is all three `b` nodes, in
    // parent-expansion order; [2] picks from that combined set.
    assert_eq!(values(&eval(&r, "/a/b[2]")), ["2"]);
    assert_eq!(values(&eval(&r, "/a[2]/b")), ["3"]);
}

#[test]
fn predicate_on_descendant_step() {
    let r = root()
        .child(tree("a").child(leaf("c", "1")))
        .child(tree("b").child(leaf("c", "2")))
        .build();
    assert_eq!(values(&eval(&r, "//c[2]")), ["2"]);
}
