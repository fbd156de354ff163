use std::rc::Rc;

use chart_binding::engine::{EngineCall, RecordingEngine};
use chart_binding::theme::{ThemeDescriptor, ThemeKey, ThemeRegistry};
use proptest::prelude::*;
use serde_json::json;

fn registrations(engine: &RecordingEngine) -> usize {
    engine.count(|call| matches!(call, EngineCall::RegisterTheme { .. }))
}

#[test]
fn equal_content_from_distinct_objects_registers_once() {
    let engine = RecordingEngine::new();
    let mut registry = ThemeRegistry::new();
    let first = Rc::new(json!({ "color": ["#111", "#222"] }));
    let second = Rc::new(json!({ "color": ["#111", "#222"] }));

    let a = registry.resolve_or_register(&engine, &first);
    let b = registry.resolve_or_register(&engine, &second);

    assert_eq!(a, b);
    assert_eq!(registrations(&engine), 1);
}

#[test]
fn same_reference_hits_fast_path() {
    let engine = RecordingEngine::new();
    let mut registry = ThemeRegistry::new();
    let theme = Rc::new(json!({ "backgroundColor": "#000" }));

    let names: Vec<String> = (0..5)
        .map(|_| registry.resolve_or_register(&engine, &theme))
        .collect();

    assert!(names.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(registrations(&engine), 1);
}

#[test]
fn distinct_content_gets_distinct_names() {
    let engine = RecordingEngine::new();
    let mut registry = ThemeRegistry::new();
    let a = registry.resolve_or_register(&engine, &Rc::new(json!({ "color": ["#111"] })));
    let b = registry.resolve_or_register(&engine, &Rc::new(json!({ "color": ["#222"] })));
    assert_ne!(a, b);
    assert_eq!(registry.custom_theme_count(), 2);
}

#[test]
fn key_order_does_not_split_registrations() {
    let engine = RecordingEngine::new();
    let mut registry = ThemeRegistry::new();
    let a: serde_json::Value =
        serde_json::from_str(r##"{"title":{"left":"center","top":4},"color":["#1"]}"##).expect("json");
    let b: serde_json::Value =
        serde_json::from_str(r##"{"color":["#1"],"title":{"top":4,"left":"center"}}"##).expect("json");

    let first = registry.resolve_or_register(&engine, &Rc::new(a.clone()));
    let second = registry.resolve_or_register(&engine, &Rc::new(b.clone()));
    assert_eq!(first, second);
    assert_eq!(
        registry.theme_key(&ThemeDescriptor::from(a)),
        registry.theme_key(&ThemeDescriptor::from(b))
    );
}

#[test]
fn builtin_lookup() {
    let registry = ThemeRegistry::new();
    assert!(registry.is_builtin("dark"));
    assert!(!registry.is_builtin("Dark"));
    assert!(registry.get_builtin("macarons").is_some());
    assert!(registry.get_builtin("unknown").is_none());
    assert_eq!(
        registry.theme_key(&ThemeDescriptor::from("light")),
        ThemeKey::Builtin("light".to_owned())
    );
}

#[test]
fn manual_registration_passes_through() {
    let engine = RecordingEngine::new();
    let mut registry = ThemeRegistry::new();
    let content = json!({ "color": ["#abc"] });
    registry.register_custom(&engine, "brand", &content);
    registry.register_custom(&engine, "brand", &content);
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::RegisterTheme {
                name: "brand".to_owned()
            },
            EngineCall::RegisterTheme {
                name: "brand".to_owned()
            },
        ]
    );
}

proptest! {
    #[test]
    fn registration_count_tracks_distinct_contents(
        palettes in prop::collection::vec(prop::collection::vec(0u8..4, 1..3), 1..24)
    ) {
        let engine = RecordingEngine::new();
        let mut registry = ThemeRegistry::new();
        let mut seen: Vec<(Vec<u8>, String)> = Vec::new();

        for palette in &palettes {
            let colors: Vec<String> = palette.iter().map(|c| format!("#{c}{c}{c}")).collect();
            let theme = Rc::new(json!({ "color": colors }));
            let name = registry.resolve_or_register(&engine, &theme);
            match seen.iter().find(|(known, _)| known == palette) {
                Some((_, known_name)) => prop_assert_eq!(&name, known_name),
                None => seen.push((palette.clone(), name)),
            }
        }

        prop_assert_eq!(registrations(&engine), seen.len());
        prop_assert_eq!(registry.custom_theme_count(), seen.len());
    }
}
