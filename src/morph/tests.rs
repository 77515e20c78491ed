use super::*;
use crate::dom::{Mutation, NodeData};

/// Parse `live` and `target`, return the live doc with tracking enabled.
fn docs(live: &str, target: &str) -> (Document, Document) {
    let mut live = Document::parse(live);
    live.track_mutations();
    (live, Document::parse(target))
}

fn run(live: &mut Document, target: &mut Document, mode: UpdateMode) {
    let (live_root, target_root) = (live.root(), target.root());
    morph(live, live_root, target, target_root, mode);
}

fn top(doc: &Document) -> Vec<NodeId> {
    doc.children(doc.root()).to_vec()
}

fn first(doc: &Document, tag: &str) -> NodeId {
    doc.find(|el| el.tag == tag).unwrap()
}

#[test]
fn test_identical_tree_is_untouched() {
    let markup = r#"<div id="app" class="x"><ul><li key="a">A</li><li key="b">B</li></ul><input name="q" value="v"><p>text</p></div>"#;
    let mut live = Document::parse(markup);
    let mut target = live.clone();
    live.track_mutations();

    run(&mut live, &mut target, UpdateMode::Navigation);

    assert!(live.take_mutations().is_empty());
    assert_eq!(live.to_html(), markup);
}

#[test]
fn test_keyed_reorder_reuses_nodes() {
    let (mut live, mut target) = docs(
        r#"<li key="a">A</li><li key="b">B</li><li key="c">C</li>"#,
        r#"<li key="c">C</li><li key="a">A</li><li key="b">B</li>"#,
    );
    let before = top(&live);

    run(&mut live, &mut target, UpdateMode::Navigation);

    let after = top(&live);
    assert_eq!(after, vec![before[2], before[0], before[1]]);
    let mutations = live.take_mutations();
    assert_eq!(mutations, vec![Mutation::Move { node: before[2] }]);
    assert_eq!(
        live.to_html(),
        r#"<li key="c">C</li><li key="a">A</li><li key="b">B</li>"#
    );
}

#[test]
fn test_insertion_is_local() {
    let (mut live, mut target) = docs(
        "<p>A</p><span>B</span><em>C</em>",
        "<p>A</p><b>X</b><span>B</span><em>C</em>",
    );
    let before = top(&live);

    run(&mut live, &mut target, UpdateMode::Navigation);

    let after = top(&live);
    assert_eq!(after.len(), 4);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[1]);
    assert_eq!(after[3], before[2]);

    let mutations = live.take_mutations();
    assert_eq!(mutations, vec![Mutation::Insert { node: after[1] }]);
}

#[test]
fn test_removal_frees_nodes() {
    let (mut live, mut target) = docs("<p>A</p><p>B</p><hr>", "<p>A</p><hr>");
    let before = top(&live);

    run(&mut live, &mut target, UpdateMode::Navigation);

    assert_eq!(live.to_html(), "<p>A</p><hr>");
    // The second paragraph is the one with the unmatched text child
    let removed: Vec<_> = before.iter().filter(|id| !live.contains(**id)).collect();
    assert_eq!(removed.len(), 1);
}

#[test]
fn test_attribute_updates() {
    let (mut live, mut target) = docs(
        r#"<div class="a" data-old="1"></div>"#,
        r#"<div class="b" title="t"></div>"#,
    );
    let div = first(&live, "div");

    run(&mut live, &mut target, UpdateMode::Navigation);

    let el = live.element(div).unwrap();
    assert_eq!(el.attrs.get("class"), Some("b"));
    assert_eq!(el.attrs.get("title"), Some("t"));
    assert!(!el.attrs.contains("data-old"));
}

#[test]
fn test_text_change_replaces_text_node() {
    let (mut live, mut target) = docs("<p>old</p>", "<p>new</p>");
    let p = first(&live, "p");

    run(&mut live, &mut target, UpdateMode::Navigation);

    assert_eq!(first(&live, "p"), p);
    assert_eq!(live.text_content(p), "new");
}

#[test]
fn test_push_keeps_protected_value() {
    let live_markup = r#"<form><input name="q" value="old"></form>"#;
    let target_markup = r#"<form><input name="q" value="new"></form>"#;

    let (mut live, mut target) = docs(live_markup, target_markup);
    run(&mut live, &mut target, UpdateMode::Push);
    let input = first(&live, "input");
    let el = live.element(input).unwrap();
    assert_eq!(el.attrs.get("value"), Some("old"));
    assert_eq!(el.control.as_ref().unwrap().value, "old");

    let (mut live, mut target) = docs(live_markup, target_markup);
    run(&mut live, &mut target, UpdateMode::Navigation);
    let input = first(&live, "input");
    let el = live.element(input).unwrap();
    assert_eq!(el.attrs.get("value"), Some("new"));
    assert_eq!(el.control.as_ref().unwrap().value, "new");
}

#[test]
fn test_push_allow_list_on_ancestor() {
    let (mut live, mut target) = docs(
        r#"<section><input value="old" style="a"></section>"#,
        r#"<section><input value="new" style="b"></section>"#,
    );
    let section = first(&live, "section");
    live.set_live_update(section, LiveUpdate::allow(["value"]));

    run(&mut live, &mut target, UpdateMode::Push);

    let el = live.element(first(&live, "input")).unwrap();
    assert_eq!(el.attrs.get("value"), Some("new"));
    assert_eq!(el.attrs.get("style"), Some("a"));
}

#[test]
fn test_push_skips_pinned_subtree() {
    let (mut live, mut target) = docs(
        r#"<main><div id="widget" class="mine"><span>client state</span></div><p>1</p></main>"#,
        r#"<main><div id="widget" class="theirs"><b>server</b><i>stuff</i></div><p>2</p></main>"#,
    );
    let widget = first(&live, "div");
    live.set_live_update(widget, LiveUpdate::Preserve);
    let widget_html = live.outer_html(widget);

    run(&mut live, &mut target, UpdateMode::Push);

    assert_eq!(live.outer_html(widget), widget_html);
    assert_eq!(live.text_content(first(&live, "p")), "2");
}

#[test]
fn test_push_keeps_pinned_node_absent_from_target() {
    let (mut live, mut target) = docs(
        r#"<ul><li>a</li><aside>client</aside></ul>"#,
        r#"<ul><li>a</li></ul>"#,
    );
    let aside = first(&live, "aside");
    live.set_live_update(aside, LiveUpdate::Preserve);

    run(&mut live, &mut target, UpdateMode::Push);
    assert!(live.is_connected(aside));

    let mut target = Document::parse("<ul><li>a</li></ul>");
    run(&mut live, &mut target, UpdateMode::Navigation);
    assert!(!live.contains(aside));
}

#[test]
fn test_pinned_root_short_circuits() {
    let (mut live, mut target) = docs("<p>a</p>", "<p>b</p>");
    let root = live.root();
    live.set_live_update(root, LiveUpdate::Preserve);

    run(&mut live, &mut target, UpdateMode::Push);
    assert_eq!(live.to_html(), "<p>a</p>");
    assert!(live.take_mutations().is_empty());
}

#[test]
fn test_morph_children_keeps_container_attributes() {
    let mut live = Document::parse(r#"<div id="box" class="live"><p>a</p></div>"#);
    let mut content = Document::parse("<p>b</p><p>c</p>");
    let container = first(&live, "div");
    let content_root = content.root();

    morph_children(
        &mut live,
        container,
        &mut content,
        content_root,
        UpdateMode::Navigation,
    );

    assert_eq!(
        live.to_html(),
        r#"<div id="box" class="live"><p>b</p><p>c</p></div>"#
    );
}

#[test]
fn test_duplicate_keys_pair_in_order() {
    let (mut live, mut target) = docs(
        r#"<b key="k">1</b><i>x</i><b key="k">2</b>"#,
        r#"<i>x</i><b key="k">2</b><b key="k">1</b>"#,
    );
    let before = top(&live);

    run(&mut live, &mut target, UpdateMode::Navigation);

    // Every live node is reused even though the keys collide
    let after = top(&live);
    assert_eq!(after.len(), 3);
    assert!(before.iter().all(|id| live.contains(*id)));
    assert_eq!(live.to_html(), r#"<i>x</i><b key="k">2</b><b key="k">1</b>"#);
}

#[test]
fn test_checked_property_reconciled() {
    let (mut live, mut target) = docs(
        r#"<input type="checkbox">"#,
        r#"<input type="checkbox" checked>"#,
    );
    let input = first(&live, "input");

    run(&mut live, &mut target, UpdateMode::Navigation);

    let el = live.element(input).unwrap();
    assert!(el.control.as_ref().unwrap().checked);
    assert!(matches!(live[input].data, NodeData::Element(_)));
}

#[test]
fn test_navigation_clears_edit_flag_but_push_keeps_it() {
    let markup = r#"<form><input name="q" value="server"></form>"#;

    let (mut live, mut target) = docs(markup, markup);
    let input = first(&live, "input");
    live.set_value(input, "typed");
    run(&mut live, &mut target, UpdateMode::Navigation);
    assert_eq!(live.element(input).unwrap().control.as_ref().unwrap().value, "server");
    assert!(!live.has_modified());

    let (mut live, mut target) = docs(markup, markup);
    let input = first(&live, "input");
    live.set_value(input, "typed");
    run(&mut live, &mut target, UpdateMode::Push);
    assert_eq!(live.element(input).unwrap().control.as_ref().unwrap().value, "typed");
    assert!(live.has_modified());
}
