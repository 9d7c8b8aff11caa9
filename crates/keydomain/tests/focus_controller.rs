use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use keydomain::{DomFocus, FocusController, Scope};
use keydomain_core::{Document, NodeId};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// ```text
/// body
/// └── div#test
///     ├── div#firstDomain [data-keydomain=first]
///     │   └── p
///     └── div#secondDomain [data-keydomain=second, data-keydomain-focus=input]
///         └── input#secondDomainInput
/// ```
struct Page {
    doc: Document,
    test: NodeId,
    first: NodeId,
    first_p: NodeId,
    second: NodeId,
    second_input: NodeId,
}

impl Page {
    fn new() -> Self {
        init_tracing();
        let doc = Document::new();
        let el = |tag: &str, id: &str| {
            let node = doc.create_element(tag);
            doc.set_attribute(node, "id", id).unwrap();
            node
        };

        let test = el("div", "test");
        let first = el("div", "firstDomain");
        let first_p = doc.create_element("p");
        let second = el("div", "secondDomain");
        let second_input = el("input", "secondDomainInput");

        doc.set_attribute(first, "data-keydomain", "first").unwrap();
        doc.set_attribute(second, "data-keydomain", "second").unwrap();
        doc.set_attribute(second, "data-keydomain-focus", "input").unwrap();
        doc.set_attribute(second_input, "type", "text").unwrap();

        doc.append_child(doc.body(), test).unwrap();
        doc.append_child(test, first).unwrap();
        doc.append_child(first, first_p).unwrap();
        doc.append_child(test, second).unwrap();
        doc.append_child(second, second_input).unwrap();

        Self {
            doc,
            test,
            first,
            first_p,
            second,
            second_input,
        }
    }

    /// Controller attached to `div#test`, like an embedded widget.
    fn controller(&self) -> FocusController {
        FocusController::builder(self.doc.clone())
            .element(self.test)
            .attach()
            .unwrap()
    }

    fn press(&self, controller: &FocusController, node: NodeId) {
        self.doc.press(node).unwrap();
        controller.task_queue().run_tick();
    }
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&keydomain_core::ComboEvent) -> bool + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (count, move |_: &keydomain_core::ComboEvent| {
        c.fetch_add(1, Ordering::SeqCst);
        true
    })
}

fn calls(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}

// -----------------------------------------------------------------------------
// Domains from attributes and events
// -----------------------------------------------------------------------------

#[test]
fn has_domains() {
    let page = Page::new();
    let controller = page.controller();
    assert_eq!(controller.list_domains(), vec!["first".to_string(), "second".to_string()]);
    assert_eq!(controller.current_domain(), None);
    assert_eq!(controller.current_domain_element(), None);
}

#[test]
fn removing_a_domain_drops_it_from_the_list() {
    let page = Page::new();
    let controller = page.controller();
    controller.remove_domain("second");
    controller.task_queue().run_until_idle(4);
    assert_eq!(controller.list_domains(), vec!["first".to_string()]);

    controller.remove_domain("never-added");
    assert_eq!(controller.list_domains(), vec!["first".to_string()]);

    controller.add_domain("second", page.second).unwrap();
    assert_eq!(controller.list_domains(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn sets_domains_when_pressed() {
    let page = Page::new();
    let controller = page.controller();

    page.press(&controller, page.first_p);
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
    assert_eq!(controller.current_domain_element(), Some(page.first));

    page.press(&controller, page.second);
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert_eq!(page.doc.active_element(), page.second_input);

    page.press(&controller, page.test);
    assert_eq!(controller.current_domain(), None);
    assert_eq!(page.doc.active_element(), page.doc.body());
}

#[test]
fn press_decision_waits_for_the_tick() {
    let page = Page::new();
    let controller = page.controller();

    page.doc.press(page.first_p).unwrap();
    assert_eq!(controller.current_domain(), None);
    assert_eq!(controller.task_queue().pending_count(), 1);

    controller.task_queue().run_tick();
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
}

#[test]
fn sets_domains_when_focused() {
    let page = Page::new();
    let controller = page.controller();

    page.doc.focus(page.second_input).unwrap();
    controller.task_queue().run_until_idle(4);
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert_eq!(page.doc.active_element(), page.second_input);
}

#[test]
fn focus_inside_press_supersedes_deferred_focus() {
    let page = Page::new();
    let controller = page.controller();
    controller.focus_domain("first");

    // Pressing the input focuses it synchronously; the focus listener already
    // switches domains, so the deferred half must not re-apply focus.
    page.press(&controller, page.second_input);
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert_eq!(page.doc.active_element(), page.second_input);
}

#[test]
fn focuses_the_focus_target_when_domain_selected() {
    let page = Page::new();
    let controller = page.controller();
    controller.focus_domain("second");
    assert_eq!(page.doc.active_element(), page.second_input);

    controller.focus_domain("first");
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
    assert_eq!(page.doc.active_element(), page.doc.body());
}

#[test]
fn focus_lock_wins_over_focus_inside_domain() {
    init_tracing();
    let doc = Document::new();
    let editor = doc.create_element("div");
    let main = doc.create_element("textarea");
    let aux = doc.create_element("input");
    doc.set_attribute(editor, "data-keydomain", "editor").unwrap();
    doc.set_attribute(editor, "data-keydomain-focus", "textarea").unwrap();
    doc.set_attribute(editor, "data-keydomain-focus-lock", "true").unwrap();
    doc.append_child(doc.body(), editor).unwrap();
    doc.append_child(editor, main).unwrap();
    doc.append_child(editor, aux).unwrap();

    let controller = FocusController::attach(doc.clone()).unwrap();
    assert!(controller.is_locking_focus("editor"));

    // Entering the domain through DOM focus still lands on the target.
    doc.focus(aux).unwrap();
    assert_eq!(controller.current_domain().as_deref(), Some("editor"));
    assert_eq!(doc.active_element(), main);

    // A press on another control inside the domain is pulled back as well.
    doc.press(aux).unwrap();
    assert_eq!(doc.active_element(), aux);
    controller.task_queue().run_tick();
    assert_eq!(doc.active_element(), main);
}

#[test]
fn leaving_a_locked_domain_blurs_its_focus_target() {
    let doc = Document::new();
    let editor = doc.create_element("div");
    let main = doc.create_element("textarea");
    let aux = doc.create_element("input");
    let other = doc.create_element("div");
    doc.set_attribute(editor, "data-keydomain", "editor").unwrap();
    doc.set_attribute(editor, "data-keydomain-focus", "textarea").unwrap();
    doc.set_attribute(editor, "data-keydomain-focus-lock", "true").unwrap();
    doc.set_attribute(other, "data-keydomain", "other").unwrap();
    doc.append_child(doc.body(), editor).unwrap();
    doc.append_child(editor, main).unwrap();
    doc.append_child(editor, aux).unwrap();
    doc.append_child(doc.body(), other).unwrap();

    let controller = FocusController::attach(doc.clone()).unwrap();
    doc.focus(aux).unwrap();
    assert_eq!(doc.active_element(), main);

    controller.focus_domain("other");
    assert_eq!(controller.current_domain().as_deref(), Some("other"));
    assert_eq!(doc.active_element(), doc.body());
}

#[test]
fn without_lock_focus_stays_where_pressed() {
    let page = Page::new();
    let extra = page.doc.create_element("button");
    page.doc.append_child(page.second, extra).unwrap();
    let controller = page.controller();

    controller.focus_domain("second");
    page.press(&controller, extra);
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert_eq!(page.doc.active_element(), extra);
}

#[test]
fn default_domain_fallbacks() {
    let page = Page::new();
    let controller = page.controller();

    controller.set_default_domain("first");
    assert_eq!(controller.default_domain().as_deref(), Some("first"));
    assert_eq!(controller.current_domain().as_deref(), Some("first"));

    // Pressing outside every domain lands on the default.
    controller.focus_domain("second");
    page.press(&controller, page.test);
    assert_eq!(controller.current_domain().as_deref(), Some("first"));

    // Removing the current domain falls back to the default.
    controller.focus_domain("second");
    controller.remove_domain("second");
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
}

#[test]
fn readding_the_current_domain_reapplies_focus() {
    let page = Page::new();
    let controller = page.controller();
    controller.set_default_domain("second");
    assert_eq!(page.doc.active_element(), page.second_input);

    controller.remove_domain("second");
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    page.doc.blur(page.second_input);
    assert_eq!(page.doc.active_element(), page.doc.body());

    controller.add_domain("second", page.second).unwrap();
    assert_eq!(page.doc.active_element(), page.second_input);
}

#[test]
fn element_controller_ignores_presses_outside() {
    let page = Page::new();
    let outside = page.doc.create_element("div");
    page.doc.set_attribute(outside, "data-keydomain", "outside").unwrap();
    page.doc.append_child(page.doc.body(), outside).unwrap();

    let controller = page.controller();
    assert!(!controller.list_domains().contains(&"outside".to_string()));
    controller.focus_domain("first");

    page.doc.press(outside).unwrap();
    assert_eq!(controller.task_queue().pending_count(), 0);
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
}

#[test]
fn focus_target_is_resolved_lazily() {
    let page = Page::new();
    let controller = page.controller();

    let replacement = page.doc.create_element("input");
    page.doc.remove(page.second_input).unwrap();
    page.doc.append_child(page.second, replacement).unwrap();

    controller.focus_domain("second");
    assert_eq!(page.doc.active_element(), replacement);
}

#[test]
fn missing_focus_target_is_not_an_error() {
    let page = Page::new();
    let controller = page.controller();
    page.doc.remove(page.second_input).unwrap();

    controller.focus_domain("second");
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert_eq!(page.doc.active_element(), page.doc.body());
}

// -----------------------------------------------------------------------------
// Key handlers
// -----------------------------------------------------------------------------

#[test]
fn global_handlers() {
    let page = Page::new();
    let controller = page.controller();

    let (global, handler) = counter();
    controller.register(Scope::Global, &["h"], handler);
    assert!(controller.trigger("h"));
    assert_eq!(calls(&global), 1);

    let (other, handler) = counter();
    controller.register("first", &["h"], handler);
    controller.trigger("h");
    assert_eq!(calls(&global), 2);
    assert_eq!(calls(&other), 0);
}

#[test]
fn triggers_the_key_in_the_right_domain() {
    let page = Page::new();
    let controller = page.controller();
    let (count, handler) = counter();
    controller.register("first", &["h"], handler);

    controller.focus_domain("first");
    assert_eq!(controller.current_domain().as_deref(), Some("first"));
    assert!(controller.trigger("h"));
    assert_eq!(calls(&count), 1);
}

#[test]
fn does_not_confuse_keys_between_domains() {
    let page = Page::new();
    let controller = page.controller();
    let (count, handler) = counter();
    controller.register("first", &["h"], handler);

    controller.focus_domain("second");
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    assert!(!controller.trigger("h"));
    assert_eq!(calls(&count), 0);
}

#[test]
fn switching_domains_switches_handlers() {
    let page = Page::new();
    let controller = page.controller();
    let (first, handler) = counter();
    controller.register("first", &["h"], handler);
    let (second, handler) = counter();
    controller.register("second", &["h"], handler);

    controller.focus_domain("first");
    controller.trigger("h");
    assert_eq!((calls(&first), calls(&second)), (1, 0));

    controller.focus_domain("second");
    controller.trigger("h");
    assert_eq!((calls(&first), calls(&second)), (1, 1));
}

#[test]
fn unregister_removes_one_domain_binding() {
    let page = Page::new();
    let controller = page.controller();
    controller.register("first", &["h"], |_| true);
    let second = controller.register("second", &["h"], |_| true);

    let bindings = controller.registry().bindings();
    assert_eq!(bindings.keys().cloned().collect::<Vec<_>>(), vec!["first", "second"]);

    assert!(controller.unregister(second));
    let bindings = controller.registry().bindings();
    assert_eq!(bindings.keys().cloned().collect::<Vec<_>>(), vec!["first"]);
    assert!(bindings["first"].contains("h"));
}

#[test]
fn bindings_persist_when_domains_are_removed_and_readded() {
    let page = Page::new();
    let controller = page.controller();
    let (first, handler) = counter();
    controller.register("first", &["h"], handler);
    let (second, handler) = counter();
    controller.register("second", &["h", "ctrl+s"], handler);
    let before = controller.registry().bindings();

    controller.remove_domain("second");
    assert_eq!(
        controller.registry().bindings().keys().cloned().collect::<Vec<_>>(),
        vec!["first"]
    );
    assert_eq!(
        controller.registry().suspended_bindings().keys().cloned().collect::<Vec<_>>(),
        vec!["second"]
    );

    controller.add_domain("second", page.second).unwrap();
    assert_eq!(controller.registry().bindings(), before);
    assert!(controller.registry().suspended_bindings().is_empty());

    controller.focus_domain("second");
    controller.trigger("h");
    controller.trigger("Ctrl+S");
    assert_eq!((calls(&first), calls(&second)), (0, 2));
}

#[test]
fn current_domain_shadows_global_handlers() {
    let page = Page::new();
    let controller = page.controller();
    let (global, handler) = counter();
    controller.register(Scope::Global, &["h"], handler);
    controller.register("second", &["h"], |_| true);

    controller.focus_domain("first");
    assert!(!controller.trigger("h"));
    assert_eq!(calls(&global), 0);
}

#[test]
fn global_handlers_are_silent_under_any_domain() {
    let page = Page::new();
    let controller = page.controller();
    let (global, handler) = counter();
    controller.register(Scope::Global, &["k"], handler);
    controller.register("second", &["h"], |_| true);

    // No domain binds "k"; being in a domain is enough to silence it.
    controller.focus_domain("first");
    assert!(!controller.trigger("k"));
    controller.focus_domain_with("second", DomFocus::Suppress);
    assert!(!controller.trigger("k"));
    assert_eq!(calls(&global), 0);

    controller.focus_domain("---");
    assert_eq!(controller.current_domain().as_deref(), Some("second"));
    controller.focus_domain("nowhere");
    assert_eq!(controller.current_domain(), None);
    assert!(controller.trigger("k"));
    assert_eq!(calls(&global), 1);
}

#[test]
fn pressing_outside_restores_global_handlers() {
    let page = Page::new();
    let controller = page.controller();
    let (scoped, handler) = counter();
    controller.register("first", &["j"], handler);
    let (global, handler) = counter();
    controller.register(Scope::Global, &["k"], handler);

    page.press(&controller, page.first_p);
    controller.trigger("j");
    assert_eq!(calls(&scoped), 1);

    page.press(&controller, page.test);
    assert_eq!(controller.current_domain(), None);
    assert!(!controller.trigger("j"));
    assert!(controller.trigger("k"));
    assert_eq!((calls(&scoped), calls(&global)), (1, 1));
}

#[test]
fn global_registered_after_domain_binding_is_reached() {
    let page = Page::new();
    let controller = page.controller();
    controller.register("first", &["h"], |_| true);
    let (global, handler) = counter();
    let id = controller.register(Scope::Global, &["h"], handler);

    controller.trigger("h");
    assert_eq!(calls(&global), 1);

    controller.unregister(id);
    assert!(!controller.trigger("h"));
    assert_eq!(calls(&global), 1);
    assert!(controller.registry().is_key_bound("h"));
}

#[test]
fn unregistering_domain_binding_hands_key_back_to_global() {
    let page = Page::new();
    let controller = page.controller();
    let (global, handler) = counter();
    controller.register(Scope::Global, &["h"], handler);
    let scoped = controller.register("first", &["h"], |_| true);

    controller.unregister(scoped);
    assert!(!controller.registry().is_key_bound("h"));
    controller.trigger("h");
    assert_eq!(calls(&global), 1);
}

#[test]
fn register_in_several_domains() {
    let page = Page::new();
    let controller = page.controller();
    let (count, handler) = counter();
    let id = controller.register(["first", "second"], &["x", "y"], handler);

    controller.focus_domain("first");
    controller.trigger("x");
    controller.focus_domain_with("second", DomFocus::Suppress);
    controller.trigger("y");
    assert_eq!(calls(&count), 2);

    controller.unregister(id);
    assert!(controller.registry().bindings().is_empty());
}

#[test]
fn handler_results_are_reported() {
    let page = Page::new();
    let controller = page.controller();
    controller.register("first", &["n"], |_| false);
    controller.focus_domain("first");
    assert!(!controller.trigger("n"));
    assert!(!controller.trigger("unbound"));
}

#[test]
fn reset_rescans_and_drops_bindings() {
    let page = Page::new();
    let controller = page.controller();
    let (count, handler) = counter();
    controller.register("first", &["h"], handler);
    controller.set_default_domain("first");

    controller.reset(false).unwrap();
    assert!(controller.is_attached());
    assert_eq!(controller.list_domains(), vec!["first".to_string(), "second".to_string()]);
    assert_eq!(controller.current_domain(), None);
    assert_eq!(controller.default_domain(), None);
    assert!(controller.registry().bindings().is_empty());

    controller.focus_domain("first");
    assert!(!controller.trigger("h"));
    assert_eq!(calls(&count), 0);

    controller.reset(true).unwrap();
    assert!(!controller.is_attached());
    assert!(controller.list_domains().is_empty());
}

#[test]
fn deferred_press_after_reset_is_tolerated() {
    let page = Page::new();
    let controller = page.controller();

    page.doc.press(page.first_p).unwrap();
    controller.reset(true).unwrap();
    controller.task_queue().run_tick();
    assert_eq!(controller.current_domain(), None);
}
