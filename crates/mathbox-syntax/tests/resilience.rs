use mathbox_syntax::{MAX_NESTING, Mode, Node, parse, parse_with};

#[test]
fn test_every_prefix_of_live_typed_input_parses() {
    let input = r"\frac{\mat{1 & \box \\ x^{2}_{i} & \table{a & b}}}{\sqrt{\alpha + 3}}";
    for (end, _) in input.char_indices() {
        let result = parse(&input[..end]);
        assert!(matches!(result.root, Node::Group(_)));
    }
    let result = parse(input);
    assert!(result.errors.is_empty(), "{:?}", result.errors);
}

#[test]
fn test_incomplete_fraction() {
    let result = parse(r"\frac{1}{2");
    assert_eq!(result.root.children().len(), 1);
    assert!(!result.errors.is_empty());
}

#[test]
fn test_stray_braces() {
    let result = parse("}}{{");
    assert!(matches!(result.root, Node::Group(_)));
    assert_eq!(result.root.children().len(), 1);
}

#[test]
fn test_unknown_command_is_kept() {
    let result = parse(r"\fracc{1}");
    // `\frac` is the longest known prefix, the trailing `c` is its numerator.
    assert!(matches!(result.root.children()[0], Node::Fraction { .. }));

    let result = parse(r"\qux");
    match &result.root.children()[0] {
        Node::Command { name, args } => {
            assert_eq!(name, "qux");
            assert!(args.is_empty());
        }
        other => panic!("expected command, got {other:?}"),
    }
}

#[test]
fn test_text_mode_has_no_scripts() {
    let result = parse_with("a^b_c", Mode::Text, 0);
    assert_eq!(result.root.children().len(), 5);
    assert!(result.errors.is_empty());
}

#[test]
fn test_deeply_nested_groups() {
    let input = "{".repeat(200) + "x";
    let result = parse(&input);
    assert_eq!(result.errors.len(), 200);
}

#[test]
fn test_pathological_nesting_does_not_overflow() {
    let levels = 100_000;
    let result = parse(&("{".repeat(levels) + "x"));
    assert!(matches!(result.root, Node::Group(_)));
    let too_deep = result
        .errors
        .iter()
        .filter(|e| e.message == "Nesting too deep")
        .count();
    assert_eq!(too_deep, levels - MAX_NESTING);
    assert_eq!(result.errors.len(), levels);

    let fractions = r"\frac{".repeat(levels) + "1";
    assert!(!parse(&fractions).errors.is_empty());
    let roots = r"\sqrt".repeat(levels) + "x";
    assert!(!parse(&roots).errors.is_empty());
    let grids = r"\mat{".repeat(levels);
    assert!(!parse(&grids).errors.is_empty());
    let scripts = "x".to_string() + &"^{x".repeat(levels);
    assert!(!parse(&scripts).errors.is_empty());
    let stacked = "x".to_string() + &"^".repeat(levels);
    assert!(!parse(&stacked).errors.is_empty());
}
