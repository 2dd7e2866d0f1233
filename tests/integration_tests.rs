//! Integration tests for Tincan Connect

use futures::channel::oneshot;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tincan_connect::{
    connect, provider, use_action, use_selector, use_selector_with, ActionResult, ActionSet,
    Component, Error, MapState, Props, Root, State, Store, Value, STORE_PROP,
};

fn store() -> Store {
    Store::new(State::new().with("a", 1).with("b", 1))
}

fn mount(store: &Store, component: &Component, props: Props) -> (Root, tincan_connect::ViewHandle) {
    let root = Root::new();
    let mut handles = root
        .mount(provider(store.clone(), [component.element(props)]))
        .unwrap();
    (root, handles.remove(0))
}

fn select_a(state: &State) -> Value {
    state.get("a").cloned().unwrap_or_default()
}

fn show(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        Value::Number(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}

fn reader() -> Component {
    Component::function(|_| {
        let value = use_selector(select_a)?;
        Ok(format!("A = {}", show(&value)))
    })
}

// use_selector

#[test]
fn selector_renders_with_given_state() {
    let store = store();
    store.set_state(State::new().with("a", 2));

    let (root, handle) = mount(&store, &reader(), Props::new());

    assert_eq!(handle.render_count(), 1);
    assert_eq!(root.text(), "A = 2");
}

#[test]
fn selector_ignores_irrelevant_changes() {
    let store = store();
    store.set_state(State::new().with("a", "initialValue"));
    let (root, handle) = mount(&store, &reader(), Props::new());

    root.act(|| store.set_state(State::new().with("b", "newValue")))
        .unwrap();
    assert_eq!(handle.render_count(), 1);
}

#[test]
fn selector_rerenders_on_relevant_changes() {
    let store = store();
    let (root, handle) = mount(&store, &reader(), Props::new());

    root.act(|| store.set_state(State::new().with("b", 2))).unwrap();
    assert_eq!(handle.render_count(), 1);

    root.act(|| store.set_state(State::new().with("a", 2))).unwrap();
    assert_eq!(handle.render_count(), 2);
    assert_eq!(root.text(), "A = 2");
}

#[test]
fn selector_rerenders_on_new_objects_by_default() {
    let store = store();
    let initial = Value::object([("a", 1)]);
    store.set_state(State::new().with("a", initial.clone()));
    let (root, handle) = mount(&store, &reader(), Props::new());

    root.act(|| store.set_state(State::new().with("a", initial.shallow_copy())))
        .unwrap();
    assert_eq!(handle.render_count(), 2);
}

fn recording_equality(
    answer: bool,
) -> (Rc<RefCell<Vec<(Value, Value)>>>, impl Fn(&Value, &Value) -> bool + Clone) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorded = Rc::clone(&calls);
    let equality = move |previous: &Value, next: &Value| {
        recorded.borrow_mut().push((previous.clone(), next.clone()));
        answer
    };
    (calls, equality)
}

fn reader_with<E>(equality: E) -> Component
where
    E: Fn(&Value, &Value) -> bool + Clone + 'static,
{
    Component::function(move |_| {
        let value = use_selector_with(select_a, equality.clone())?;
        Ok(format!("A = {}", show(&value)))
    })
}

#[test]
fn selector_ignores_changes_when_equality_is_truthy() {
    let store = store();
    let initial = Value::object([("a", 1)]);
    let next = initial.shallow_copy();
    store.set_state(State::new().with("a", initial.clone()));

    let (calls, equality) = recording_equality(true);
    let (root, handle) = mount(&store, &reader_with(equality), Props::new());

    root.act(|| store.set_state(State::new().with("a", next.clone())))
        .unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (initial, next));
    assert_eq!(handle.render_count(), 1);
}

#[test]
fn selector_rerenders_when_equality_is_falsy() {
    let store = store();
    let initial = Value::object([("a", 1)]);
    let next = initial.shallow_copy();
    store.set_state(State::new().with("a", initial.clone()));

    let (calls, equality) = recording_equality(false);
    let (root, handle) = mount(&store, &reader_with(equality), Props::new());

    root.act(|| store.set_state(State::new().with("a", next.clone())))
        .unwrap();

    {
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(tincan_connect::SameValue::same(&calls[0].0, &initial));
        assert!(tincan_connect::SameValue::same(&calls[0].1, &next));
    }
    assert_eq!(handle.render_count(), 2);

    // Same value again still renders: equality has the final say.
    root.act(|| store.set_state(State::new().with("b", 3))).unwrap();
    assert_eq!(handle.render_count(), 3);
}

#[test]
fn selector_subscribes_once_and_unsubscribes_on_unmount() {
    let store = store();
    let selections = Rc::new(Cell::new(0));
    let component = {
        let selections = Rc::clone(&selections);
        Component::function(move |_| {
            let selections = Rc::clone(&selections);
            let value = use_selector(move |state: &State| {
                selections.set(selections.get() + 1);
                select_a(state)
            })?;
            Ok(show(&value))
        })
    };

    let (root, handle) = mount(&store, &component, Props::new());
    assert_eq!(store.listener_count(), 1);

    root.act(|| store.set_state(State::new().with("a", 2))).unwrap();
    assert_eq!(store.listener_count(), 1);
    assert_eq!(handle.render_count(), 2);

    handle.unmount();
    assert_eq!(store.listener_count(), 0);

    let before = selections.get();
    for n in 3..6 {
        root.act(|| store.set_state(State::new().with("a", n))).unwrap();
    }
    assert_eq!(selections.get(), before);
    assert_eq!(handle.render_count(), 2);
}

#[test]
fn hooks_without_provider_fail() {
    let root = Root::new();
    let err = root.mount(reader().element(Props::new())).unwrap_err();

    assert_eq!(err, Error::MissingContext);
}

// use_action

#[test]
fn action_updates_state() {
    let store = store();
    store.set_state(
        State::new()
            .with("a", "initialValue")
            .with("b", "initialValue"),
    );
    let update = Rc::new(RefCell::new(None));
    let component = {
        let update = Rc::clone(&update);
        Component::function(move |_| {
            let update_a =
                use_action(|_: &State, value: &'static str| State::new().with("a", value))?;
            *update.borrow_mut() = Some(update_a);
            Ok(String::from("button"))
        })
    };

    let (root, handle) = mount(&store, &component, Props::new());
    assert_eq!(handle.render_count(), 1);

    let update_a = update.borrow().clone().unwrap();
    root.act(|| update_a.call("newValue")).unwrap();

    assert_eq!(store.state().get("a"), Some(&Value::from("newValue")));
    assert_eq!(store.state().get("b"), Some(&Value::from("initialValue")));
}

#[test]
fn async_action_lands_within_act() {
    let store = store();
    let set_a = Rc::new(RefCell::new(None));
    let component = {
        let set_a = Rc::clone(&set_a);
        Component::function(move |_| {
            let action = use_action(|_: &State, value: i32| {
                ActionResult::deferred(async move { State::new().with("a", value) })
            })?;
            *set_a.borrow_mut() = Some(action);
            let value = use_selector(select_a)?;
            Ok(format!("A = {}", show(&value)))
        })
    };

    let (root, handle) = mount(&store, &component, Props::new());
    let set_a = set_a.borrow().clone().unwrap();
    root.act(|| set_a.call(5)).unwrap();

    assert_eq!(store.state().get("a"), Some(&Value::from(5)));
    assert_eq!(root.text(), "A = 5");
    assert_eq!(handle.render_count(), 2);
}

#[test]
fn pending_async_action_lands_on_flush() {
    let store = store();
    let (root, handle) = mount(&store, &reader(), Props::new());
    let set_a = store.action(|_: &State, rx: oneshot::Receiver<i32>| {
        ActionResult::deferred(async move { rx.await.ok().map(|v| State::new().with("a", v)) })
    });

    let (tx, rx) = oneshot::channel();
    root.act(|| set_a.call(rx)).unwrap();
    assert_eq!(store.state().get("a"), Some(&Value::from(1)));

    tx.send(9).unwrap();
    root.flush().unwrap();

    assert_eq!(store.state().get("a"), Some(&Value::from(9)));
    assert_eq!(root.text(), "A = 9");
    assert_eq!(handle.render_count(), 2);
}

#[test]
fn deferred_action_lands_after_unmount() {
    let store = store();
    let (root, handle) = mount(&store, &reader(), Props::new());
    let set_a = store.action(|_: &State, rx: oneshot::Receiver<i32>| {
        ActionResult::deferred(async move { rx.await.ok().map(|v| State::new().with("a", v)) })
    });

    let (tx, rx) = oneshot::channel();
    set_a.call(rx);
    handle.unmount();
    tx.send(7).unwrap();
    root.flush().unwrap();

    assert_eq!(store.state().get("a"), Some(&Value::from(7)));
    assert_eq!(handle.render_count(), 1);
}

// connect

fn recording_child(calls: &Rc<RefCell<Vec<Props>>>) -> Component {
    let calls = Rc::clone(calls);
    Component::function(move |props| {
        calls.borrow_mut().push(props.clone());
        Ok(format!(
            "A = {}",
            props.value("a").map(show).unwrap_or_default()
        ))
    })
}

#[test]
fn connect_follows_the_store() {
    let store = store();
    store.set_state(State::new().with("a", "initialValue"));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let connected = connect(
        MapState::from_fn(|state, _| State::new().with("a", select_a(state))),
        Some(ActionSet::new().into()),
    )
    .wrap(recording_child(&calls));

    let (root, _handle) = mount(&store, &connected, Props::new());
    assert_eq!(root.text(), "A = initialValue");
    assert_eq!(calls.borrow().len(), 1);

    root.act(|| store.set_state(State::new().with("a", "newValue")))
        .unwrap();
    assert_eq!(root.text(), "A = newValue");
    assert_eq!(calls.borrow().len(), 2);
    {
        let calls = calls.borrow();
        let second = &calls[1];
        assert_eq!(second.value("a"), Some(&Value::from("newValue")));
        assert_eq!(second.len(), 1);
    }

    root.act(|| store.set_state(State::new().with("b", "newValue")))
        .unwrap();
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn connect_checks_shallow_equality_of_mapped_state() {
    let store = store();
    let obj = Value::object([("val", "initialValue")]);
    store.set_state(State::new().with("a", obj.clone()));

    let maps = Rc::new(Cell::new(0));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let map_state = {
        let maps = Rc::clone(&maps);
        MapState::from_fn(move |state, _| {
            maps.set(maps.get() + 1);
            State::new().with("a", select_a(state))
        })
    };
    let connected = connect(map_state, Some(ActionSet::new().into())).wrap(recording_child(&calls));

    let (root, _handle) = mount(&store, &connected, Props::new());
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(maps.get(), 1);

    // Same relevant value
    root.act(|| store.set_state(State::new().with("a", obj.clone())))
        .unwrap();
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(maps.get(), 2);

    // Irrelevant change
    root.act(|| store.set_state(State::new().with("b", obj.clone())))
        .unwrap();
    assert_eq!(calls.borrow().len(), 1);
    assert_eq!(maps.get(), 3);

    // New relevant value
    root.act(|| store.set_state(State::new().with("a", obj.shallow_copy())))
        .unwrap();
    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(maps.get(), 4);
}

#[test]
fn connect_with_property_list() {
    let store = Store::new(State::new().with("a", "x"));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let connected = connect("a", None).wrap(recording_child(&calls));

    let (root, _handle) = mount(&store, &connected, Props::new());
    assert_eq!(root.text(), "A = x");

    root.act(|| store.set_state(State::new().with("a", "x").with("b", "y")))
        .unwrap();
    assert_eq!(calls.borrow().len(), 1);

    root.act(|| store.set_state(State::new().with("a", "z"))).unwrap();
    assert_eq!(calls.borrow().len(), 2);
    assert_eq!(root.text(), "A = z");
}

#[test]
fn connect_passes_store_without_actions() {
    let store = store();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let connected = connect("a, b", None).wrap(recording_child(&calls));

    mount(&store, &connected, Props::new());

    let calls = calls.borrow();
    let props = &calls[0];
    assert!(props.store(STORE_PROP).unwrap().ptr_eq(&store));
    assert_eq!(props.value("a"), Some(&Value::from(1)));
    assert_eq!(props.value("b"), Some(&Value::from(1)));
}

#[test]
fn connect_binds_actions() {
    let store = store();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let actions = ActionSet::new().with("increment", |state: &State, _| {
        let a = state.get("a").and_then(Value::as_f64).unwrap_or(0.0);
        State::new().with("a", a + 1.0)
    });
    let connected = connect("a", Some(actions.into())).wrap(recording_child(&calls));

    let (root, _handle) = mount(&store, &connected, Props::new());
    let increment = calls.borrow()[0].action("increment").cloned().unwrap();
    assert!(!calls.borrow()[0].contains_key(STORE_PROP));

    root.act(|| increment.call(Vec::new())).unwrap();
    assert_eq!(root.text(), "A = 2");
    assert_eq!(store.state().get("b"), Some(&Value::from(1)));
}

#[test]
fn connect_mapped_state_wins_over_own_props_and_actions() {
    let store = store();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let actions = ActionSet::new()
        .with("a", |_: &State, _| ())
        .with("c", |_: &State, _| ());
    let connected = connect("a", Some(actions.into())).wrap(recording_child(&calls));

    mount(
        &store,
        &connected,
        Props::new().with("a", "own").with("c", "own"),
    );

    let calls = calls.borrow();
    assert_eq!(calls[0].value("a"), Some(&Value::from(1)));
    assert_eq!(calls[0].value("c"), Some(&Value::from("own")));
}

#[test]
fn connect_recomputes_from_new_own_props_before_render() {
    let store = Store::new(State::new().with("x", "first").with("y", "second"));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let map_state = MapState::from_fn(|state, props| {
        let key = props
            .value("key")
            .and_then(Value::as_str)
            .unwrap_or("x")
            .to_string();
        State::new().with("a", state.get(&key).cloned().unwrap_or_default())
    });
    let connected = connect(map_state, None).wrap(recording_child(&calls));

    let (root, handle) = mount(&store, &connected, Props::new().with("key", "x"));
    assert_eq!(root.text(), "A = first");

    handle.set_props(Props::new().with("key", "y")).unwrap();
    assert_eq!(root.text(), "A = second");
    assert_eq!(handle.render_count(), 2);
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn connect_ignores_added_keys_but_not_removed_ones() {
    let store = store();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let map_state = MapState::from_fn(|state, _| {
        let mut mapped = State::new().with("a", select_a(state));
        if let Some(extra) = state.get("extra") {
            if !extra.is_null() {
                mapped.insert("extra", extra.clone());
            }
        }
        mapped
    });
    let connected = connect(map_state, None).wrap(recording_child(&calls));
    let (root, _handle) = mount(&store, &connected, Props::new());

    root.act(|| store.set_state(State::new().with("extra", "added")))
        .unwrap();
    assert_eq!(calls.borrow().len(), 1);

    root.act(|| store.set_state(State::new().with("extra", Value::Null)))
        .unwrap();
    assert_eq!(calls.borrow().len(), 1);

    root.act(|| store.set_state(State::new().with("a", 5))).unwrap();
    assert_eq!(calls.borrow().len(), 2);
    assert!(!calls.borrow()[1].contains_key("extra"));
}

#[test]
fn connect_unsubscribes_on_unmount() {
    let store = store();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let connected = connect("a", None).wrap(recording_child(&calls));

    let (root, handle) = mount(&store, &connected, Props::new());
    assert_eq!(store.listener_count(), 1);

    handle.unmount();
    assert_eq!(store.listener_count(), 0);

    root.act(|| store.set_state(State::new().with("a", 9))).unwrap();
    assert_eq!(calls.borrow().len(), 1);
}

#[test]
fn connect_without_provider_fails() {
    let root = Root::new();
    let connected = connect("a", None).wrap(Component::function(|_| Ok(String::new())));

    assert_eq!(
        root.mount(connected.element(Props::new())).unwrap_err(),
        Error::MissingContext
    );
}

#[test]
fn dropping_root_unsubscribes_everything() {
    let store = store();
    let connected = connect("a", None).wrap(Component::function(|_| Ok(String::new())));
    {
        let root = Root::new();
        root.mount(provider(
            store.clone(),
            [connected.element(Props::new()), reader().element(Props::new())],
        ))
        .unwrap();
        assert_eq!(store.listener_count(), 2);
    }
    assert_eq!(store.listener_count(), 0);
}
