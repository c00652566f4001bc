use runtime::{ContainerGraph, Divert, GraphError, Path, PathComponent, RuntimeObject};

fn path(s: &str) -> Path {
    s.parse().expect("valid path")
}

#[test]
fn path_parsing_and_display() {
    let p = path("forest.0.g-1");
    assert_eq!(
        p.components(),
        &[
            PathComponent::Name("forest".into()),
            PathComponent::Index(0),
            PathComponent::Name("g-1".into()),
        ]
    );
    assert_eq!(p.to_string(), "forest.0.g-1");
    assert!(path("").is_root());
    assert_eq!(
        "a..b".parse::<Path>(),
        Err(GraphError::InvalidPath("a..b".into()))
    );
}

#[test]
fn anonymous_children_are_addressed_by_index() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    graph.set_root(root).unwrap();

    let first = graph.new_container(None);
    let second = graph.new_container(None);
    graph.add_content(root, RuntimeObject::Text("hello".into())).unwrap();
    graph.add_content(root, RuntimeObject::Container(first)).unwrap();
    graph.add_content(first, RuntimeObject::Container(second)).unwrap();

    assert_eq!(graph.path_of(root), Some(Path::root()));
    assert_eq!(graph.path_of(first), Some(path("1")));
    assert_eq!(graph.path_of(second), Some(path("1.0")));
    assert_eq!(graph.container_at_path(&path("1.0")), Some(second));
}

#[test]
fn named_children_are_addressed_by_name() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    graph.set_root(root).unwrap();

    let knot = graph.new_container(Some("forest".into()));
    let gather = graph.new_container(Some("g-0".into()));
    graph.add_to_named_content_only(root, knot).unwrap();
    graph.add_content(knot, RuntimeObject::Text("trees".into())).unwrap();
    graph.add_content(knot, RuntimeObject::Container(gather)).unwrap();

    assert_eq!(graph.path_of(gather), Some(path("forest.g-0")));
    assert_eq!(graph.container_at_path(&path("forest.g-0")), Some(gather));
    // Auto-entered named content is reachable both ways.
    assert_eq!(graph.container_at_path(&path("forest.1")), Some(gather));
    assert!(graph.get(root).unwrap().content.is_empty());
}

#[test]
fn detached_containers_have_no_path() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    graph.set_root(root).unwrap();

    let floating = graph.new_container(None);
    let child = graph.new_container(Some("inner".into()));
    graph.add_content(floating, RuntimeObject::Container(child)).unwrap();

    assert_eq!(graph.path_of(child), None);
    assert_eq!(graph.path_of(floating), None);
}

#[test]
fn graph_without_root_has_no_paths() {
    let mut graph = ContainerGraph::new();
    let lonely = graph.new_container(None);
    assert_eq!(graph.path_of(lonely), None);
}

#[test]
fn attaching_twice_is_rejected() {
    let mut graph = ContainerGraph::new();
    let a = graph.new_container(None);
    let b = graph.new_container(None);
    let child = graph.new_container(Some("x".into()));

    graph.add_content(a, RuntimeObject::Container(child)).unwrap();
    assert_eq!(
        graph.add_content(b, RuntimeObject::Container(child)),
        Err(GraphError::AlreadyAttached(child.index()))
    );
}

#[test]
fn cycles_are_rejected() {
    let mut graph = ContainerGraph::new();
    let outer = graph.new_container(None);
    let inner = graph.new_container(None);
    graph.add_content(outer, RuntimeObject::Container(inner)).unwrap();

    assert_eq!(
        graph.add_content(inner, RuntimeObject::Container(outer)),
        Err(GraphError::Cycle {
            child: outer.index(),
            parent: inner.index(),
        })
    );
}

#[test]
fn named_only_requires_a_name() {
    let mut graph = ContainerGraph::new();
    let parent = graph.new_container(None);
    let child = graph.new_container(None);
    assert_eq!(
        graph.add_to_named_content_only(parent, child),
        Err(GraphError::UnnamedContainer(child.index()))
    );
}

#[test]
fn divert_targets_start_absent() {
    let mut graph = ContainerGraph::new();
    let divert = graph.push_divert(Divert::to_gather());
    assert!(!graph.divert(divert).unwrap().is_resolved());

    graph.set_divert_target(divert, path("knot.g-0")).unwrap();
    let resolved = graph.divert(divert).unwrap();
    assert!(resolved.is_resolved());
    assert_eq!(resolved.to_string(), "-> knot.g-0");
}

#[test]
fn flatten_visits_named_only_children_last() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    let hidden = graph.new_container(Some("g-0".into()));
    let shown = graph.new_container(None);

    graph.add_to_named_content_only(root, hidden).unwrap();
    graph.add_content(hidden, RuntimeObject::Text("after".into())).unwrap();
    graph.add_content(root, RuntimeObject::Text("before".into())).unwrap();
    graph.add_content(root, RuntimeObject::Container(shown)).unwrap();

    let flat = graph.flatten(root);
    assert_eq!(
        flat,
        vec![
            (0, RuntimeObject::Text("before".into())),
            (0, RuntimeObject::Container(shown)),
            (0, RuntimeObject::Container(hidden)),
            (1, RuntimeObject::Text("after".into())),
        ]
    );
}

#[test]
fn dump_marks_named_only_children() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    let gather = graph.new_container(Some("g-0".into()));
    let divert = graph.push_divert(Divert::named("elsewhere"));

    graph.add_content(root, RuntimeObject::ChoicePoint("Go".into())).unwrap();
    graph.add_content(root, RuntimeObject::Divert(divert)).unwrap();
    graph.add_to_named_content_only(root, gather).unwrap();

    let dump = graph.dump(root);
    assert_eq!(
        dump,
        "[]\n  * Go\n  -> elsewhere (unresolved)\n  (named) [g-0]\n"
    );
}

#[test]
fn container_whose_name_was_taken_is_shadowed() {
    let mut graph = ContainerGraph::new();
    let root = graph.new_container(None);
    graph.set_root(root).unwrap();

    let label = graph.new_container(Some("forest".into()));
    let knot = graph.new_container(Some("forest".into()));
    graph.add_to_named_content_only(root, label).unwrap();
    assert!(!graph.is_shadowed(label));

    graph.add_to_named_content_only(root, knot).unwrap();
    assert!(graph.is_shadowed(label));
    assert!(!graph.is_shadowed(knot));
    assert_eq!(graph.path_of(label), None);
    assert!(!graph.is_shadowed(root));
}
