use std::cell::RefCell;
use std::rc::Rc;

use chart_binding::engine::{
    ContainerId, EngineCall, EventHandler, EventTable, InitOptions, RecordingEngine, RendererKind,
};
use chart_binding::platform::ManualPlatform;
use chart_binding::{BindingError, BindingProps, ChartRuntime};
use serde_json::json;

fn runtime() -> (ChartRuntime<RecordingEngine>, RecordingEngine) {
    let engine = RecordingEngine::new();
    let runtime = ChartRuntime::new(engine.clone(), ManualPlatform::<ContainerId>::new());
    (runtime, engine)
}

fn inits(engine: &RecordingEngine) -> Vec<EngineCall> {
    engine
        .calls()
        .into_iter()
        .filter(|call| matches!(call, EngineCall::Init { .. }))
        .collect()
}

fn line_option() -> Rc<serde_json::Value> {
    Rc::new(json!({ "series": [{ "type": "line", "data": [1, 2, 3] }] }))
}

#[test]
fn basic_bind_and_unbind() {
    let (runtime, engine) = runtime();
    let option = line_option();
    let mut binding = runtime.bind();

    binding
        .reconcile(Some(ContainerId(1)), BindingProps::new(Rc::clone(&option)))
        .expect("reconcile");

    assert_eq!(
        inits(&engine),
        vec![EngineCall::Init {
            container: ContainerId(1),
            instance: 1,
            theme: None,
            renderer: RendererKind::Canvas,
            options: InitOptions::default(),
        }]
    );
    let set_options: Vec<EngineCall> = engine
        .calls()
        .into_iter()
        .filter(|call| matches!(call, EngineCall::SetOption { .. }))
        .collect();
    assert_eq!(set_options.len(), 1);
    assert!(matches!(
        &set_options[0],
        EngineCall::SetOption { instance: 1, option: applied, .. } if applied == option.as_ref()
    ));
    assert!(binding.is_initialized());

    binding.unmount();
    assert_eq!(engine.dispose_count(1), 1);
    assert!(!binding.is_initialized());

    drop(binding);
    assert_eq!(engine.dispose_count(1), 1);
    assert!(runtime.cache().borrow().is_empty());
}

#[test]
fn theme_swap_recreates_instance() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option()).with_theme("light");
    let mut binding = runtime.bind();

    binding
        .reconcile(Some(ContainerId(1)), props.clone())
        .expect("first pass");
    binding
        .reconcile(Some(ContainerId(1)), props.with_theme("dark"))
        .expect("theme swap");

    assert_eq!(engine.dispose_count(1), 1);
    let inits = inits(&engine);
    assert_eq!(inits.len(), 2);
    assert!(matches!(
        &inits[1],
        EngineCall::Init { instance: 2, theme: Some(theme), .. } if theme == "dark"
    ));

    let cache = runtime.cache().borrow();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.reference_count(&ContainerId(1)), 1);
    let cached = cache.peek(&ContainerId(1)).expect("cached instance");
    assert_eq!(cached.borrow().id(), 2);
    assert!(!cached.borrow().is_disposed());
    assert_eq!(engine.set_option_count(), 2);
}

#[test]
fn renderer_and_init_option_changes_recreate_instance() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option());
    let mut binding = runtime.bind();
    binding
        .reconcile(Some(ContainerId(4)), props.clone())
        .expect("first pass");

    let svg = props.clone().with_renderer(RendererKind::Svg);
    binding
        .reconcile(Some(ContainerId(4)), svg.clone())
        .expect("renderer change");
    binding
        .reconcile(
            Some(ContainerId(4)),
            svg.clone().with_init_opts(InitOptions {
                device_pixel_ratio: Some(2.0),
                ..InitOptions::default()
            }),
        )
        .expect("init options change");

    let inits = inits(&engine);
    assert_eq!(inits.len(), 3);
    assert!(matches!(
        &inits[1],
        EngineCall::Init { renderer: RendererKind::Svg, .. }
    ));
    assert!(matches!(
        &inits[2],
        EngineCall::Init { options, .. } if options.device_pixel_ratio == Some(2.0)
    ));
    assert_eq!(engine.dispose_count(1), 1);
    assert_eq!(engine.dispose_count(2), 1);
    assert_eq!(engine.dispose_count(3), 0);
}

#[test]
fn unchanged_identity_keeps_instance() {
    let (runtime, engine) = runtime();
    let mut binding = runtime.bind();
    let props = BindingProps::new(line_option()).with_theme("macarons");

    for _ in 0..3 {
        binding
            .reconcile(Some(ContainerId(1)), props.clone())
            .expect("reconcile");
    }
    assert_eq!(engine.init_count(), 1);
}

#[test]
fn fresh_custom_theme_objects_with_equal_content_keep_instance() {
    let (runtime, engine) = runtime();
    let mut binding = runtime.bind();
    let option = line_option();

    for _ in 0..4 {
        let theme = json!({ "color": ["#111", "#222"], "backgroundColor": "#fafafa" });
        binding
            .reconcile(
                Some(ContainerId(1)),
                BindingProps::new(Rc::clone(&option)).with_theme(theme),
            )
            .expect("reconcile");
    }

    assert_eq!(engine.init_count(), 1);
    let custom_registrations = engine.count(|call| {
        matches!(call, EngineCall::RegisterTheme { name } if name.starts_with("chart-binding-theme"))
    });
    assert_eq!(custom_registrations, 1);
}

#[test]
fn builtin_themes_are_registered_lazily() {
    let (runtime, engine) = runtime();
    let mut binding = runtime.bind();
    assert!(!runtime.themes().borrow().builtins_registered());

    binding.reconcile(None, BindingProps::new(line_option())).expect("no container");
    assert!(engine.calls().is_empty());

    binding
        .reconcile(Some(ContainerId(1)), BindingProps::new(line_option()))
        .expect("mount");
    assert!(runtime.themes().borrow().builtins_registered());
    assert_eq!(
        engine.count(|call| matches!(call, EngineCall::RegisterTheme { .. })),
        3
    );
}

#[test]
fn unknown_theme_name_falls_back_to_default() {
    let (runtime, engine) = runtime();
    let mut binding = runtime.bind();
    binding
        .reconcile(
            Some(ContainerId(1)),
            BindingProps::new(line_option()).with_theme("neon"),
        )
        .expect("reconcile");
    assert!(matches!(
        &inits(&engine)[0],
        EngineCall::Init { theme: None, .. }
    ));
}

#[test]
fn double_mount_shares_one_instance() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option());
    let mut first = runtime.bind();
    let mut second = runtime.bind();

    first
        .reconcile(Some(ContainerId(1)), props.clone())
        .expect("first mount");
    second
        .reconcile(Some(ContainerId(1)), props)
        .expect("second mount");

    assert_eq!(engine.init_count(), 1);
    assert_eq!(runtime.cache().borrow().reference_count(&ContainerId(1)), 2);

    first.unmount();
    assert_eq!(engine.dispose_count(1), 0);
    assert!(second.is_initialized());

    second.unmount();
    assert_eq!(engine.dispose_count(1), 1);
}

#[test]
fn container_change_ends_session_and_starts_new_one() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option());
    let mut binding = runtime.bind();

    binding
        .reconcile(Some(ContainerId(1)), props.clone())
        .expect("mount");
    binding
        .reconcile(Some(ContainerId(2)), props.clone())
        .expect("remount");

    assert_eq!(engine.dispose_count(1), 1);
    assert!(matches!(
        &inits(&engine)[1],
        EngineCall::Init { container: ContainerId(2), instance: 2, .. }
    ));

    binding.reconcile(None, props).expect("container removed");
    assert_eq!(engine.dispose_count(2), 1);
    assert!(binding.get_instance().is_none());
}

#[test]
fn init_failure_without_callback_leaves_binding_uninitialized() {
    let (runtime, engine) = runtime();
    engine.fail_init(Some("no rendering context"));
    let mut binding = runtime.bind();

    binding
        .reconcile(Some(ContainerId(1)), BindingProps::new(line_option()))
        .expect("init failure is not fatal");

    assert!(!binding.is_initialized());
    assert_eq!(engine.set_option_count(), 0);
    assert!(runtime.cache().borrow().is_empty());

    engine.fail_init(None);
    binding.refresh().expect("retry");
    assert!(binding.is_initialized());
}

#[test]
fn init_failure_is_routed_to_error_callback() {
    let (runtime, engine) = runtime();
    engine.fail_init(Some("no rendering context"));
    let seen = Rc::new(RefCell::new(Vec::<BindingError>::new()));
    let sink = Rc::clone(&seen);
    let mut binding = runtime.bind();

    binding
        .reconcile(
            Some(ContainerId(1)),
            BindingProps::new(line_option())
                .with_on_error(move |err| sink.borrow_mut().push(err.clone())),
        )
        .expect("routed");

    assert_eq!(
        *seen.borrow(),
        vec![BindingError::EngineInit("no rendering context".to_owned())]
    );
}

#[test]
fn failed_recreate_releases_previous_instance() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option()).with_theme("light");
    let mut binding = runtime.bind();
    binding
        .reconcile(Some(ContainerId(1)), props.clone())
        .expect("mount");

    engine.fail_init(Some("context lost"));
    binding
        .reconcile(Some(ContainerId(1)), props.with_theme("dark"))
        .expect("recreate failure is not fatal");

    assert_eq!(engine.dispose_count(1), 1);
    assert!(!binding.is_initialized());
    assert!(runtime.cache().borrow().is_empty());
}

#[test]
fn runtime_reset_disposes_everything() {
    let (runtime, engine) = runtime();
    let mut first = runtime.bind();
    let mut second = runtime.bind();
    first
        .reconcile(
            Some(ContainerId(1)),
            BindingProps::new(line_option()).with_group(Some("dash")),
        )
        .expect("mount");
    second
        .reconcile(
            Some(ContainerId(2)),
            BindingProps::new(line_option()).with_group(Some("dash")),
        )
        .expect("mount");

    runtime.reset();

    assert_eq!(engine.dispose_count(1), 1);
    assert_eq!(engine.dispose_count(2), 1);
    assert_eq!(runtime.groups().borrow().group_count(), 0);
    assert!(!runtime.themes().borrow().builtins_registered());
}

#[test]
fn recreate_by_one_binding_reapplies_the_other_bindings_state() {
    let (runtime, engine) = runtime();
    let container = ContainerId(1);
    let option = line_option();
    let click = EventHandler::new(|_| {});
    let props_a = BindingProps::new(Rc::clone(&option)).with_theme("light");
    let props_b = BindingProps::new(Rc::clone(&option))
        .with_theme("light")
        .with_loading(true, None)
        .with_events(EventTable::new().with("click", click.clone()));
    let mut first = runtime.bind();
    let mut second = runtime.bind();

    first
        .reconcile(Some(container), props_a.clone())
        .expect("first mount");
    second
        .reconcile(Some(container), props_b.clone())
        .expect("second mount");
    assert_eq!(engine.init_count(), 1);

    first
        .reconcile(Some(container), props_a.with_theme("dark"))
        .expect("theme swap");
    second
        .reconcile(Some(container), props_b)
        .expect("unchanged props");

    let shared = second.get_instance().expect("shared instance");
    let instance = shared.borrow();
    assert_eq!(instance.id(), 2);
    assert!(instance.is_bound("click", &click));
    assert!(instance.is_loading());
    assert_eq!(
        engine.count(|call| matches!(call, EngineCall::SetOption { instance: 2, .. })),
        2
    );
    assert_eq!(runtime.cache().borrow().reference_count(&container), 2);
}

#[test]
fn live_binding_reinitializes_after_runtime_reset() {
    let (runtime, engine) = runtime();
    let props = BindingProps::new(line_option()).with_group(Some("dash"));
    let mut binding = runtime.bind();
    binding
        .reconcile(Some(ContainerId(1)), props.clone())
        .expect("mount");

    runtime.reset();
    assert!(!binding.is_initialized());

    binding
        .reconcile(Some(ContainerId(1)), props)
        .expect("pass after reset");
    assert_eq!(engine.init_count(), 2);
    assert!(binding.is_initialized());
    assert_eq!(runtime.cache().borrow().reference_count(&ContainerId(1)), 1);
    assert_eq!(runtime.groups().borrow().size_of("dash"), 1);

    binding.unmount();
    assert_eq!(engine.dispose_count(2), 1);
    assert!(runtime.cache().borrow().is_empty());
}
