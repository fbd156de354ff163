//! Built-in theme presets.
//!
//! Presets are plain engine theme objects. They are registered with the engine
//! under their own name the first time an instance is created.

use serde_json::{Value, json};

pub const LIGHT: &str = "light";
pub const DARK: &str = "dark";
pub const MACARONS: &str = "macarons";

/// Built-in names in registration order.
pub const BUILTIN_THEME_NAMES: [&str; 3] = [LIGHT, DARK, MACARONS];

#[must_use]
pub fn preset(name: &str) -> Option<Value> {
    match name {
        LIGHT => Some(light()),
        DARK => Some(dark()),
        MACARONS => Some(macarons()),
        _ => None,
    }
}

fn light() -> Value {
    json!({
        "color": [
            "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de",
            "#3ba272", "#fc8452", "#9a60b4", "#ea7ccc"
        ],
        "backgroundColor": "#ffffff",
        "textStyle": { "color": "#333333" },
        "title": {
            "textStyle": { "color": "#464646" },
            "subtextStyle": { "color": "#6e7079" }
        },
        "legend": { "textStyle": { "color": "#333333" } },
        "categoryAxis": {
            "axisLine": { "lineStyle": { "color": "#6e7079" } },
            "splitLine": { "lineStyle": { "color": ["#e0e6f1"] } }
        },
        "valueAxis": {
            "axisLine": { "lineStyle": { "color": "#6e7079" } },
            "splitLine": { "lineStyle": { "color": ["#e0e6f1"] } }
        }
    })
}

fn dark() -> Value {
    json!({
        "color": [
            "#4992ff", "#7cffb2", "#fddd60", "#ff6e76", "#58d9f9",
            "#05c091", "#ff8a45", "#8d48e3", "#dd79ff"
        ],
        "backgroundColor": "#100c2a",
        "textStyle": { "color": "#b9b8ce" },
        "title": {
            "textStyle": { "color": "#eeeeee" },
            "subtextStyle": { "color": "#aaaaaa" }
        },
        "legend": { "textStyle": { "color": "#eeeeee" } },
        "tooltip": {
            "backgroundColor": "rgba(50,50,50,0.9)",
            "textStyle": { "color": "#eeeeee" }
        },
        "categoryAxis": {
            "axisLine": { "lineStyle": { "color": "#b9b8ce" } },
            "splitLine": { "lineStyle": { "color": ["#484753"] } }
        },
        "valueAxis": {
            "axisLine": { "lineStyle": { "color": "#b9b8ce" } },
            "splitLine": { "lineStyle": { "color": ["#484753"] } }
        }
    })
}

fn macarons() -> Value {
    json!({
        "color": [
            "#2ec7c9", "#b6a2de", "#5ab1ef", "#ffb980", "#d87a80",
            "#8d98b3", "#e5cf0d", "#97b552", "#95706d", "#dc69aa"
        ],
        "backgroundColor": "rgba(0,0,0,0)",
        "textStyle": {},
        "title": {
            "textStyle": { "color": "#008acd" },
            "subtextStyle": { "color": "#aaaaaa" }
        },
        "line": {
            "itemStyle": { "borderWidth": 1 },
            "lineStyle": { "width": 2 },
            "symbolSize": 3,
            "symbol": "emptyCircle",
            "smooth": true
        },
        "candlestick": {
            "itemStyle": {
                "color": "#d87a80",
                "color0": "#2ec7c9",
                "borderColor": "#d87a80",
                "borderColor0": "#2ec7c9"
            }
        },
        "categoryAxis": {
            "axisLine": { "lineStyle": { "color": "#008acd" } },
            "splitLine": { "lineStyle": { "color": ["#eeeeee"] } }
        },
        "valueAxis": {
            "axisLine": { "lineStyle": { "color": "#008acd" } },
            "splitArea": {
                "show": true,
                "areaStyle": { "color": ["rgba(250,250,250,0.3)", "rgba(200,200,200,0.3)"] }
            }
        }
    })
}
