//! Integration tests for the synchronization engine.
//!
//! Each test parses a small SVG document, expands it and then checks the
//! clone subtrees after further mutations and flushes.

use umbra::{Engine, config::EngineConfig};
use umbra_core::dom::{Document, NodeId};
use umbra_parser::{SelectorQuery, parse_document, write_document};

fn expand(markup: &str) -> (Document, Engine) {
    let mut doc = parse_document(markup).expect("Failed to parse fixture");
    let mut engine = Engine::new(EngineConfig::default(), &mut doc);
    engine.main(&mut doc, None, None);
    engine.flush(&mut doc);
    (doc, engine)
}

/// Finds a real (non-clone) node.
fn find(engine: &Engine, doc: &Document, selector: &str) -> NodeId {
    engine
        .query_filter(doc)
        .query_selector(doc.root(), selector)
        .expect("Invalid selector")
        .unwrap_or_else(|| panic!("Nothing matches {selector}"))
}

fn subtree(doc: &Document, node: NodeId) -> Vec<NodeId> {
    std::iter::once(node).chain(doc.descendants(node)).collect()
}

fn assert_parity(doc: &Document, engine: &Engine, clone: NodeId) {
    for node in subtree(doc, clone) {
        let reference = engine
            .reference_of(node)
            .unwrap_or_else(|| panic!("{node:?} is not linked"));
        assert_eq!(
            doc.children(node).len(),
            doc.children(reference).len(),
            "{node:?} and {reference:?} differ in shape"
        );
        for (child, reference_child) in doc.children(node).iter().zip(doc.children(reference)) {
            assert_eq!(engine.reference_of(*child), Some(*reference_child));
        }
    }
}

#[test]
fn test_geometry_from_use_attributes() {
    let (doc, engine) = expand(
        r##"<svg>
            <defs><rect id="t" width="50" height="50"/></defs>
            <use id="u" href="#t" x="10" y="5"/>
        </svg>"##,
    );
    let use_node = find(&engine, &doc, "#u");
    let record = engine.use_record(use_node).unwrap();

    assert_eq!(
        doc.attribute(record.use_copy, "transform"),
        Some("translate(10,5)")
    );
    assert_eq!(doc.attribute(record.ref_copy, "width"), Some("50"));
    assert_eq!(doc.attribute(record.ref_copy, "height"), Some("50"));
    assert_eq!(doc.attribute(use_node, "visibility"), Some("hidden"));
    assert!(engine.is_visited(use_node));
}

#[test]
fn test_use_size_overrides_target_size() {
    let (doc, engine) = expand(
        r##"<svg>
            <defs><rect id="t" width="50" height="50"/></defs>
            <use id="u" href="#t" width="20" transform="rotate(45)"/>
        </svg>"##,
    );
    let use_node = find(&engine, &doc, "#u");

    let ref_copy = engine.ref_copy(use_node).unwrap();
    assert_eq!(doc.attribute(ref_copy, "width"), Some("20"));
    assert_eq!(doc.attribute(ref_copy, "height"), Some("50"));
    let use_copy = engine.use_copy(use_node).unwrap();
    assert_eq!(
        doc.attribute(use_copy, "transform"),
        Some("rotate(45) translate(0,0)")
    );
}

#[test]
fn test_geometry_follows_use_changes() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><rect id="t" width="50"/></defs><use id="u" href="#t" x="10" y="5"/></svg>"##,
    );
    let use_node = find(&engine, &doc, "#u");

    doc.set_attribute(use_node, "x", "7").unwrap();
    doc.set_attribute(use_node, "height", "30").unwrap();
    engine.flush(&mut doc);

    let record = engine.use_record(use_node).unwrap();
    assert_eq!(
        doc.attribute(record.use_copy, "transform"),
        Some("translate(7,5)")
    );
    assert_eq!(doc.attribute(record.ref_copy, "height"), Some("30"));

    doc.remove_attribute(use_node, "y").unwrap();
    engine.flush(&mut doc);
    assert_eq!(
        doc.attribute(record.use_copy, "transform"),
        Some("translate(7,0)")
    );
}

#[test]
fn test_target_size_change_keeps_use_override() {
    let (mut doc, mut engine) = expand(
        r##"<svg>
            <defs><rect id="t" width="50"/></defs>
            <use id="sized" href="#t" width="20"/>
            <use id="plain" href="#t"/>
        </svg>"##,
    );
    let target = find(&engine, &doc, "#t");

    doc.set_attribute(target, "width", "80").unwrap();
    engine.flush(&mut doc);

    let sized = engine.ref_copy(find(&engine, &doc, "#sized")).unwrap();
    let plain = engine.ref_copy(find(&engine, &doc, "#plain")).unwrap();
    assert_eq!(doc.attribute(sized, "width"), Some("20"));
    assert_eq!(doc.attribute(plain, "width"), Some("80"));
}

#[test]
fn test_resolution_is_idempotent() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><g id="t"><rect/><circle/></g></defs><use href="#t"/><use href="#t"/></svg>"##,
    );
    let target = find(&engine, &doc, "#t");
    let size = doc.len();
    let markup = write_document(&doc);

    engine.main(&mut doc, None, None);
    assert_eq!(engine.flush(&mut doc), 0);

    assert_eq!(doc.len(), size);
    assert_eq!(write_document(&doc), markup);
    assert_eq!(engine.clones_of(target).len(), 2);
}

#[test]
fn test_chain_resolves_deepest_first() {
    let (doc, engine) = expand(
        r##"<svg>
            <use id="a" href="#b"/>
            <use id="b" href="#c"/>
            <defs><circle id="c" r="1"/></defs>
        </svg>"##,
    );
    let a = find(&engine, &doc, "#a");
    let b = find(&engine, &doc, "#b");

    let b_copy = engine.use_copy(b).unwrap();
    let a_record = engine.use_record(a).unwrap();
    assert_eq!(a_record.source, b_copy);
    assert_eq!(engine.reference_of(a_record.ref_copy), Some(b_copy));

    let a_copy = subtree(&doc, a_record.use_copy);
    assert!(a_copy.iter().all(|node| !doc.is_element_named(*node, "use")));
    assert!(a_copy.iter().any(|node| doc.is_element_named(*node, "circle")));
    assert_parity(&doc, &engine, a_record.ref_copy);
}

#[test]
fn test_chain_propagates_through_intermediate_clone() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><circle id="c" r="1"/></defs><use id="b" href="#c"/><use id="a" href="#b"/></svg>"##,
    );
    let circle = find(&engine, &doc, "#c");
    let a = find(&engine, &doc, "#a");

    doc.set_attribute(circle, "fill", "red").unwrap();
    engine.flush(&mut doc);

    let a_ref_copy = engine.ref_copy(a).unwrap();
    let fills: Vec<_> = subtree(&doc, a_ref_copy)
        .into_iter()
        .filter(|node| doc.is_element_named(*node, "circle"))
        .map(|node| doc.attribute(node, "fill"))
        .collect();
    assert_eq!(fills, vec![Some("red")]);
}

#[test]
fn test_cyclic_chain_is_abandoned() {
    let (doc, engine) = expand(r##"<svg><use id="a" href="#b"/><use id="b" href="#a"/></svg>"##);
    let a = find(&engine, &doc, "#a");
    let b = find(&engine, &doc, "#b");

    assert!(!engine.is_visited(a));
    assert!(!engine.is_visited(b));
    assert!(engine.use_record(a).is_none());
    assert_eq!(doc.attribute(a, "visibility"), None);
    assert_eq!(
        write_document(&doc),
        "<svg>\n<use href=\"#b\" id=\"a\"/>\n<use href=\"#a\" id=\"b\"/>\n</svg>"
    );
}

#[test]
fn test_indirect_cycle_settles() {
    let (mut doc, mut engine) = expand(
        r##"<svg>
            <g id="p"><use id="pu" href="#q"/></g>
            <g id="q"><use id="qu" href="#p"/></g>
        </svg>"##,
    );
    let p = find(&engine, &doc, "#p");
    let pu = find(&engine, &doc, "#pu");
    let qu = find(&engine, &doc, "#qu");

    assert!(engine.is_visited(qu));
    assert!(!engine.is_visited(pu));
    assert!(!doc.has_pending());
    let settled = doc.len();
    assert_eq!(engine.flush(&mut doc), 0);

    let rect = doc.create_element("rect");
    doc.append_child(p, rect).unwrap();
    engine.flush(&mut doc);

    assert!(!doc.has_pending());
    assert!(!engine.is_visited(pu));
    assert_eq!(doc.len(), settled + 2);
    assert_parity(&doc, &engine, engine.ref_copy(qu).unwrap());
}

#[test]
fn test_cycle_created_by_edit_settles() {
    let (mut doc, mut engine) = expand(
        r##"<svg><g id="p"/><g id="q"><use id="qu" href="#p"/></g></svg>"##,
    );
    let p = find(&engine, &doc, "#p");
    let use_node = doc.create_element("use");
    doc.set_attribute(use_node, "href", "#q").unwrap();
    doc.append_child(p, use_node).unwrap();

    let rounds = engine.flush(&mut doc);

    assert!(rounds < engine.config().dispatch().max_flush_rounds());
    assert!(!doc.has_pending());
    assert!(!engine.is_visited(use_node));
    assert!(engine.use_record(use_node).is_none());
    let qu = find(&engine, &doc, "#qu");
    assert_parity(&doc, &engine, engine.ref_copy(qu).unwrap());
}

#[test]
fn test_self_containing_reference_is_skipped() {
    let (doc, engine) = expand(r##"<svg><g id="s"><use id="u" href="#s"/></g></svg>"##);
    let use_node = find(&engine, &doc, "#u");

    assert!(!engine.is_visited(use_node));
    assert_eq!(doc.children(find(&engine, &doc, "#s")), &[use_node]);
}

#[test]
fn test_unresolved_reference_is_retried() {
    let (mut doc, mut engine) = expand(r##"<svg><use id="u" href="#late"/><defs/></svg>"##);
    let use_node = find(&engine, &doc, "#u");
    assert!(!engine.is_visited(use_node));

    let defs = find(&engine, &doc, "defs");
    let rect = doc.create_element("rect");
    doc.set_attribute(rect, "id", "late").unwrap();
    doc.append_child(defs, rect).unwrap();
    engine.flush(&mut doc);

    assert!(engine.is_visited(use_node));
    assert_eq!(engine.clones_of(rect), vec![engine.ref_copy(use_node).unwrap()]);
}

#[test]
fn test_new_use_is_cloned_on_flush() {
    let (mut doc, mut engine) = expand(r##"<svg><defs><rect id="t"/></defs></svg>"##);
    let svg = find(&engine, &doc, "svg");
    let use_node = doc.create_element("use");
    doc.set_attribute(use_node, "xlink:href", "#t").unwrap();
    doc.append_child(svg, use_node).unwrap();

    let rounds = engine.flush(&mut doc);

    assert!(rounds >= 1);
    let use_copy = engine.use_copy(use_node).unwrap();
    assert_eq!(doc.next_sibling(use_copy), Some(use_node));
}

#[test]
fn test_move_relocates_without_rebuilding() {
    let (mut doc, mut engine) = expand(
        r##"<svg>
            <defs><rect id="t"/></defs>
            <g id="left"><use id="u" href="#t"/></g>
            <g id="right"/>
        </svg>"##,
    );
    let use_node = find(&engine, &doc, "#u");
    let left = find(&engine, &doc, "#left");
    let right = find(&engine, &doc, "#right");
    let record = engine.use_record(use_node).unwrap();
    assert_eq!(doc.parent(record.use_copy), Some(left));
    let size = doc.len();

    doc.append_child(right, use_node).unwrap();
    engine.flush(&mut doc);

    assert_eq!(engine.use_record(use_node), Some(record));
    assert_eq!(doc.parent(record.use_copy), Some(right));
    assert_eq!(doc.next_sibling(record.use_copy), Some(use_node));
    assert!(doc.children(left).is_empty());
    assert_eq!(doc.len(), size);

    doc.remove_child(right, use_node).unwrap();
    engine.flush(&mut doc);
    assert_eq!(doc.parent(record.use_copy), None);
    assert!(doc.children(right).is_empty());
}

#[test]
fn test_filtered_queries_hide_clones() {
    let (doc, engine) = expand(
        r##"<svg><defs><g id="t"><rect class="shape"/></g></defs><use id="u" href="#t"/></svg>"##,
    );
    let filter = engine.query_filter(&doc);

    assert_eq!(doc.query_selector_all(doc.root(), ".shape").unwrap().len(), 2);
    assert_eq!(filter.query_selector_all(doc.root(), ".shape").unwrap().len(), 1);
    assert_eq!(filter.query_selector_all(doc.root(), "#t, #u").unwrap().len(), 2);

    let hidden = filter.query_selector(doc.root(), "use").unwrap().unwrap();
    assert_eq!(doc.attribute(hidden, "visibility"), Some("hidden"));
    for node in filter.query_selector_all(doc.root(), "*").unwrap() {
        assert!(!doc.has_attribute(node, "cpy"));
    }
}

#[test]
fn test_structural_change_regenerates_every_clone() {
    let (mut doc, mut engine) = expand(
        r##"<svg>
            <defs><g id="t"><rect/></g></defs>
            <use id="u1" href="#t"/>
            <use id="u2" href="#t"/>
        </svg>"##,
    );
    let target = find(&engine, &doc, "#t");
    let first = engine.ref_copy(find(&engine, &doc, "#u1")).unwrap();
    let second = engine.ref_copy(find(&engine, &doc, "#u2")).unwrap();
    let stale = [doc.children(first).to_vec(), doc.children(second).to_vec()].concat();

    let circle = doc.create_element("circle");
    doc.append_child(target, circle).unwrap();
    engine.flush(&mut doc);

    for clone in [first, second] {
        let children = doc.children(clone).to_vec();
        assert_eq!(children.len(), 2);
        assert!(doc.is_element_named(children[0], "rect"));
        assert!(doc.is_element_named(children[1], "circle"));
        assert!(children.iter().all(|child| !stale.contains(child)));
        assert_parity(&doc, &engine, clone);
    }
    for node in stale {
        assert_eq!(engine.reference_of(node), None);
        assert!(!doc.contains(node));
    }
    assert_eq!(engine.clones_of(circle).len(), 2);
}

#[test]
fn test_attribute_change_propagates_verbatim() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><g id="t"><rect fill="blue"/></g></defs><use id="u" href="#t"/></svg>"##,
    );
    let rect = find(&engine, &doc, "#t rect");
    let clone = engine.clones_of(rect)[0];
    let size = doc.len();

    doc.set_attribute(rect, "fill", "green").unwrap();
    engine.flush(&mut doc);
    assert_eq!(doc.attribute(clone, "fill"), Some("green"));
    assert_eq!(doc.len(), size);

    doc.remove_attribute(rect, "fill").unwrap();
    engine.flush(&mut doc);
    assert_eq!(doc.attribute(clone, "fill"), None);
}

#[test]
fn test_use_added_inside_target_never_appears_in_clones() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><rect id="r"/><g id="t"/></defs><use id="u" href="#t"/></svg>"##,
    );
    let target = find(&engine, &doc, "#t");
    let nested = doc.create_element("use");
    doc.set_attribute(nested, "href", "#r").unwrap();
    doc.append_child(target, nested).unwrap();
    engine.flush(&mut doc);

    let nested_copy = engine.use_copy(nested).unwrap();
    assert_eq!(doc.attribute(nested_copy, "visibility"), None);

    let ref_copy = engine.ref_copy(find(&engine, &doc, "#u")).unwrap();
    let copied = subtree(&doc, ref_copy);
    assert!(copied.iter().all(|node| !doc.is_element_named(*node, "use")));
    assert!(copied.iter().any(|node| doc.is_element_named(*node, "rect")));
    assert_parity(&doc, &engine, ref_copy);
}

#[test]
fn test_flush_round_limit_leaves_records_queued() {
    let mut doc = parse_document(r##"<svg><defs><rect id="t"/></defs><use href="#t"/></svg>"##)
        .unwrap();
    let config: EngineConfig = toml::from_str("[dispatch]\nmax_flush_rounds = 0").unwrap();
    let mut engine = Engine::new(config, &mut doc);
    engine.main(&mut doc, None, None);

    assert_eq!(engine.flush(&mut doc), 0);
    assert!(doc.has_pending());
}

#[test]
fn test_custom_markers() {
    let mut doc = parse_document(r##"<svg><defs><rect id="t"/></defs><use href="#t"/></svg>"##)
        .unwrap();
    let config: EngineConfig =
        toml::from_str("[markers]\nreference = \"data-ref\"\nclone = \"data-clone\"").unwrap();
    let mut engine = Engine::new(config, &mut doc);
    engine.main(&mut doc, None, None);
    engine.flush(&mut doc);

    let target = find(&engine, &doc, "#t");
    assert_eq!(doc.attribute(target, "data-ref"), Some("true"));
    assert!(!doc.has_attribute(target, "ref"));
    let clone = engine.clones_of(target)[0];
    assert_eq!(doc.attribute(clone, "data-clone"), Some("true"));
}

#[test]
fn test_scoped_roots() {
    let mut doc = parse_document(
        r##"<svg>
            <g id="refs"><rect id="t"/></g>
            <g id="uses"><use id="inside" href="#t"/></g>
            <use id="outside" href="#t"/>
        </svg>"##,
    )
    .unwrap();
    let mut engine = Engine::new(EngineConfig::default(), &mut doc);
    let uses = find(&engine, &doc, "#uses");
    let root = doc.root();
    engine.main(&mut doc, Some(uses), Some(root));
    engine.flush(&mut doc);

    assert!(engine.is_visited(find(&engine, &doc, "#inside")));
    assert!(!engine.is_visited(find(&engine, &doc, "#outside")));
}

#[test]
fn test_repeated_edits_do_not_grow_the_document() {
    let (mut doc, mut engine) = expand(
        r##"<svg><defs><g id="t"><rect/></g></defs><use id="u" href="#t"/></svg>"##,
    );
    let target = find(&engine, &doc, "#t");
    let circle = doc.create_element("circle");
    let size = doc.len();
    let tracked = engine.tracked_nodes();

    for _ in 0..1000 {
        doc.append_child(target, circle).unwrap();
        engine.flush(&mut doc);
        doc.remove_child(target, circle).unwrap();
        engine.flush(&mut doc);
    }

    assert_eq!(doc.len(), size);
    assert_eq!(engine.tracked_nodes(), tracked);
    assert!(engine.node_state(circle).is_none());
    let use_node = find(&engine, &doc, "#u");
    assert_parity(&doc, &engine, engine.ref_copy(use_node).unwrap());
}

#[test]
fn test_main_again_releases_previous_root() {
    let mut doc = parse_document(
        r##"<svg><defs><rect id="t"/></defs><g id="first"/><g id="second"/></svg>"##,
    )
    .unwrap();
    let mut engine = Engine::new(EngineConfig::default(), &mut doc);
    let first = find(&engine, &doc, "#first");
    let second = find(&engine, &doc, "#second");
    engine.main(&mut doc, Some(first), None);
    engine.main(&mut doc, Some(second), None);
    engine.flush(&mut doc);

    let stray = doc.create_element("use");
    doc.set_attribute(stray, "href", "#t").unwrap();
    doc.append_child(first, stray).unwrap();
    assert_eq!(engine.flush(&mut doc), 0);
    assert!(!engine.is_visited(stray));

    let watched = doc.create_element("use");
    doc.set_attribute(watched, "href", "#t").unwrap();
    doc.append_child(second, watched).unwrap();
    engine.flush(&mut doc);
    assert!(engine.is_visited(watched));
    assert!(!engine.is_visited(stray));
}
