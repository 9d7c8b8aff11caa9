//! Integration tests for the document model, selectors and recognizer together.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keydomain_core::{
    ComboRecognizer, ComboTable, Document, DomError, EventKind, NodeId, Phase, TaskQueue,
};

/// Builds:
///
/// ```text
/// body
/// ├── nav#menu [data-keydomain=menu]
/// │   ├── a[href]
/// │   └── a[href].current
/// └── main [data-keydomain=editor][data-keydomain-focus=textarea]
///     ├── div.toolbar > button
///     └── textarea
/// ```
struct Page {
    doc: Document,
    nav: NodeId,
    current_link: NodeId,
    main: NodeId,
    button: NodeId,
    textarea: NodeId,
}

fn page() -> Page {
    let doc = Document::new();
    let body = doc.body();

    let nav = doc.create_element("nav");
    doc.set_attribute(nav, "id", "menu").unwrap();
    doc.set_attribute(nav, "data-keydomain", "menu").unwrap();
    doc.append_child(body, nav).unwrap();
    for class in ["", "current"] {
        let link = doc.create_element("a");
        doc.set_attribute(link, "href", "#").unwrap();
        if !class.is_empty() {
            doc.set_attribute(link, "class", class).unwrap();
        }
        doc.append_child(nav, link).unwrap();
    }
    let current_link = doc.query_selector(nav, "a.current").unwrap().unwrap();

    let main = doc.create_element("main");
    doc.set_attribute(main, "data-keydomain", "editor").unwrap();
    doc.set_attribute(main, "data-keydomain-focus", "textarea").unwrap();
    doc.append_child(body, main).unwrap();
    let toolbar = doc.create_element("div");
    doc.set_attribute(toolbar, "class", "toolbar").unwrap();
    doc.append_child(main, toolbar).unwrap();
    let button = doc.create_element("button");
    doc.append_child(toolbar, button).unwrap();
    let textarea = doc.create_element("textarea");
    doc.append_child(main, textarea).unwrap();

    Page {
        doc,
        nav,
        current_link,
        main,
        button,
        textarea,
    }
}

#[test]
fn test_scan_for_domain_attribute() {
    let p = page();
    let domains = p
        .doc
        .query_selector_all(p.doc.body(), "[data-keydomain]")
        .unwrap();
    assert_eq!(domains, vec![p.nav, p.main]);

    let focus = p.doc.attribute(p.main, "data-keydomain-focus").unwrap();
    assert_eq!(p.doc.query_selector(p.main, &focus).unwrap(), Some(p.textarea));
    assert_eq!(p.doc.element_by_id("menu"), Some(p.nav));
}

#[test]
fn test_selector_combinators_on_document() {
    let p = page();
    let body = p.doc.body();
    assert_eq!(
        p.doc.query_selector(body, ".toolbar > button").unwrap(),
        Some(p.button)
    );
    assert_eq!(
        p.doc.query_selector(body, "nav > a:last-child").unwrap(),
        Some(p.current_link)
    );
    assert_eq!(
        p.doc.query_selector(body, "div.toolbar ~ textarea").unwrap(),
        Some(p.textarea)
    );
    assert_eq!(p.doc.query_selector(body, "nav + nav").unwrap(), None);
    assert!(matches!(
        p.doc.query_selector(body, "a,"),
        Err(DomError::InvalidSelector { .. })
    ));
}

#[test]
fn test_capture_listener_sees_focus_inside() {
    let p = page();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let s = seen.clone();
    p.doc
        .add_event_listener(p.doc.body(), EventKind::Focus, true, move |event| {
            s.lock().push((event.target, event.phase));
        })
        .unwrap();

    p.doc.focus(p.textarea).unwrap();
    p.doc.press(p.current_link).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            (p.textarea, Phase::Capture),
            (p.current_link, Phase::Capture)
        ]
    );
    assert_eq!(p.doc.active_element(), p.current_link);
}

#[test]
fn test_removing_focused_subtree_resets_active() {
    let p = page();
    p.doc.focus(p.button).unwrap();
    p.doc.detach(p.main).unwrap();
    assert_eq!(p.doc.active_element(), p.doc.body());
    assert_eq!(p.doc.focus(p.button), Err(DomError::Disconnected(p.button)));

    p.doc.append_child(p.doc.body(), p.main).unwrap();
    p.doc.focus(p.button).unwrap();
    p.doc.remove(p.main).unwrap();
    assert!(!p.doc.contains(p.textarea));
    assert_eq!(p.doc.active_element(), p.doc.body());
}

#[test]
fn test_pointer_handler_defers_to_tick() {
    let p = page();
    let queue = TaskQueue::new();
    let table = Arc::new(ComboTable::new());
    let fired = Arc::new(AtomicUsize::new(0));

    let q = queue.clone();
    let t = table.clone();
    let f = fired.clone();
    p.doc
        .add_event_listener(p.doc.body(), EventKind::PointerDown, true, move |_| {
            let t = t.clone();
            let f = f.clone();
            q.post(move || {
                let f = f.clone();
                t.bind(
                    &["esc".to_string()],
                    Arc::new(move |_| {
                        f.fetch_add(1, Ordering::SeqCst);
                        true
                    }),
                );
            });
        })
        .unwrap();

    p.doc.press(p.button).unwrap();
    assert!(!table.trigger("Escape"));
    assert_eq!(queue.run_tick(), 1);
    assert!(table.trigger("Escape"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
