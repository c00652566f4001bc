use weave::{Choice, Compound, Element, Gather, Text, WeaveArena, WeavePointLocation};

fn text(s: &str) -> Element {
    Text::new(s).into()
}

fn choice(depth: u32, s: &str) -> Element {
    Choice::new(depth, s).into()
}

#[test]
fn deeper_run_becomes_one_nested_block() {
    let mut arena = WeaveArena::new();
    let root = arena.build(
        vec![
            choice(0, "A"),
            text("t"),
            choice(1, "B"),
            text("u"),
            choice(1, "C"),
            choice(0, "D"),
        ],
        Some(0),
    );

    let weave = arena.get(root).unwrap();
    assert_eq!(weave.content().len(), 4);
    assert!(matches!(weave.content()[2], Element::Weave(_)));

    let child = weave.children().next().unwrap();
    let nested = arena.get(child).unwrap();
    assert_eq!(nested.base_indentation_depth(), 1);
    assert_eq!(nested.parent(), Some(root));
    assert_eq!(nested.content(), &[choice(1, "B"), text("u"), choice(1, "C")]);
}

#[test]
fn each_deeper_level_nests_again() {
    let mut arena = WeaveArena::new();
    let root = arena.build(
        vec![choice(0, "a"), choice(1, "b"), choice(2, "c"), choice(1, "d")],
        Some(0),
    );

    assert_eq!(arena.len(), 3);
    let inner = arena.get(root).unwrap().children().next().unwrap();
    let inner = arena.get(inner).unwrap();
    assert_eq!(inner.content().len(), 3);
    assert!(matches!(inner.content()[1], Element::Weave(_)));
    assert_eq!(arena.descendants(root).unwrap().len(), 3);
}

#[test]
fn base_depth_defaults_to_first_weave_point() {
    let mut arena = WeaveArena::new();
    let id = arena.build(vec![text("x"), choice(2, "deep"), choice(2, "also")], None);

    let weave = arena.get(id).unwrap();
    assert_eq!(weave.base_indentation_depth(), 2);
    assert_eq!(weave.children().count(), 0);
    assert!(weave.named_weave_points().is_none());
}

#[test]
fn block_without_weave_points_starts_at_zero() {
    let mut arena = WeaveArena::new();
    let id = arena.build(vec![text("only text")], None);

    let weave = arena.get(id).unwrap();
    assert_eq!(weave.base_indentation_depth(), 0);
    assert!(!weave.has_weave_points());
}

#[test]
fn scope_root_collects_labels_from_nested_blocks() {
    let mut arena = WeaveArena::new();
    let root = arena.build(
        vec![
            Gather::new(0).named("top").into(),
            Choice::new(1, "inner").named("pick").into(),
            Gather::new(0).named("top").into(),
        ],
        Some(0),
    );
    let child = arena.get(root).unwrap().children().next().unwrap();

    // The later "top" replaces the earlier one.
    assert_eq!(
        arena.weave_point_named(root, "top").unwrap(),
        Some(WeavePointLocation {
            weave: root,
            index: 2
        })
    );
    assert_eq!(
        arena.weave_point_named(root, "pick").unwrap(),
        Some(WeavePointLocation {
            weave: child,
            index: 0
        })
    );
    assert!(arena.get(child).unwrap().named_weave_points().is_none());
}

#[test]
fn inner_block_keeps_no_label_table() {
    let mut arena = WeaveArena::new();
    let id = arena.build(vec![Gather::new(1).named("x").into()], Some(1));

    assert_eq!(arena.weave_point_named(id, "x").unwrap(), None);
}

#[test]
fn nested_block_hands_loose_ends_to_the_block_it_came_from() {
    let mut arena = WeaveArena::new();
    let outer = arena.build(vec![text("outer"), choice(1, "c")], Some(0));
    let inner = arena.get(outer).unwrap().children().next().unwrap();

    assert_eq!(arena.closest_weave_ancestor(inner).unwrap(), Some(outer));
    assert_eq!(arena.closest_weave_ancestor(outer).unwrap(), None);
}

#[test]
fn choice_scan_covers_nested_blocks_and_compounds() {
    let mut arena = WeaveArena::new();
    let deep = arena.build(vec![text("t"), choice(1, "deep")], Some(0));
    let inline = arena.build(
        vec![Compound::new("branch", vec![choice(0, "inline")]).into()],
        Some(0),
    );
    let plain = arena.build(vec![text("t"), Gather::new(0).into()], Some(0));

    assert!(arena.contains_choice(deep).unwrap());
    assert!(arena.contains_choice(inline).unwrap());
    assert!(!arena.contains_choice(plain).unwrap());
}
