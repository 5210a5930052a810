use rstest::rstest;
use treepath::{SimpleNode, TreeNode, TreePath, root, tree};

fn eval(origin: &SimpleNode, expr: &str) -> Vec<SimpleNode> {
    let mut path =
        TreePath::parse(origin, expr).unwrap_or_else(|e| panic!("parse `{expr}`: {e}"));
    let nodes: Vec<_> =
        path.nodes().unwrap_or_else(|e| panic!("eval `{expr}`: {e}")).collect();
    nodes
}

fn labels(nodes: &[SimpleNode]) -> Vec<String> {
    nodes.iter().map(|n| n.label().unwrap_or_default()).collect()
}

/// (r (a (b (d)) (c)) (e))
fn sample() -> SimpleNode {
    root()
        .child(tree("a").child(tree("b").child(tree("d"))).child(tree("c")))
        .child(tree("e"))
        .build()
}

#[rstest]
#[case::child_named("a", &["a"])]
#[case::child_wildcard("*", &["a", "e"])]
#[case::child_chain("a/b/d", &["d"])]
#[case::child_no_match("zzz", &[])]
#[case::child_filters_by_name("a/c", &["c"])]
#[case::self_wildcard("a/.", &["a"])]
#[case::self_named("a/self::a", &["a"])]
#[case::self_wrong_name("a/self::b", &[])]
#[case::parent_abbrev("a/b/..", &["a"])]
#[case::descendant("a/descendant::*", &["b", "d", "c"])]
#[case::descendant_named("descendant::d", &["d"])]
#[case::descendant_or_self_named("a/descendant-or-self::a", &["a"])]
#[case::ancestor("a/b/d/ancestor::*", &["b", "a", ""])]
#[case::ancestor_named("a/b/d/ancestor::a", &["a"])]
#[case::root_axis("a/b/root::*", &[""])]
#[case::absolute_descendant("//d", &["d"])]
#[case::absolute_descendant_many("//b", &["b"])]
fn axis_results(#[case] expr: &str, #[case] expected: &[&str]) {
    let r = sample();
    assert_eq!(labels(&eval(&r, expr)), expected, "`{expr}`");
}

#[test]
fn descendant_or_self_walks_in_pre_order() {
    let r = sample();
    let got = labels(&eval(&r, "/descendant-or-self::*"));
    assert_eq!(got, ["", "a", "b", "d", "c", "e"]);
}

#[test]
fn results_follow_parent_expansion_order() {
    // Expansion happens parent by parent, so the second step visits each
    // matched parent's children as a group rather than in global
    // document order.
    let r = sample();
    let got = labels(&eval(&r, "//*"));
    assert_eq!(got, ["a", "e", "b", "c", "d"]);
}

#[test]
fn root_expression_matches_exactly_the_root() {
    let r = sample();
    let got = eval(&r, "/");
    assert_eq!(got, vec![r]);
}

#[test]
fn absolute_paths_are_anchored_at_the_root_from_any_origin() {
    let r = sample();
    let d = eval(&r, "a/b/d").remove(0);
    assert_eq!(eval(&d, "/"), vec![r.clone()]);
    assert_eq!(labels(&eval(&d, "/a/c")), ["c"]);
    assert_eq!(labels(&eval(&d, "//e")), ["e"]);
}

#[test]
fn relative_paths_start_at_the_origin() {
    let r = sample();
    let a = eval(&r, "a").remove(0);
    assert_eq!(labels(&eval(&a, "b/d")), ["d"]);
    assert_eq!(labels(&eval(&a, "..")), [""]);
}

#[test]
fn escaped_name_matches_literal_label() {
    let r = root().child(tree("a[b")).build();
    assert_eq!(labels(&eval(&r, "a\\[b")), ["a[b"]);
}

#[test]
fn overlapping_descendant_sets_keep_duplicates() {
    // Working node-sets are not deduplicated: when a step's working set
    // contains both a node and one of its ancestors, a descendant step
    // emits the shared node once per occurrence.
    let r = root().child(tree("a").child(tree("b"))).build();
    let got = labels(&eval(&r, "//*/descendant-or-self::b"));
    assert_eq!(got, ["b", "b"]);
}
