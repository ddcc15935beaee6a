// tests/integration_fix.rs - Fix request behavior against whole components
use leakguard_core::{generate_fix, generate_fix_at, scan_source, Finding, LeakError, LeakType};

fn finding_of(src: &str, file: &str, leak_type: LeakType) -> Finding {
    scan_source(src, file)
        .unwrap()
        .into_iter()
        .find(|f| f.leak_type == leak_type)
        .unwrap()
}

fn assert_sound(src: &str, fix: &leakguard_core::Fix) {
    let t = &fix.transformation;
    let expected = format!("{}{}{}", &src[..t.start], t.replacement, &src[t.end..]);
    assert_eq!(fix.fixed_code, expected);
    assert_eq!(fix.original_code, src);
}

#[test]
fn test_stream_in_component_gets_effect_wrapper() {
    let src = "export function Feed() {\n  const es = new EventSource('/x');\n  return <ul />;\n}\n";
    let fix = generate_fix(src, "Feed.tsx", &finding_of(src, "Feed.tsx", LeakType::UnclosedStreamConnection)).unwrap();
    assert_sound(src, &fix);
    assert!(fix.fixed_code.contains("useEffect(() => {"));
    assert!(fix.fixed_code.contains("return () => {"));
    assert!(fix.fixed_code.contains("if (es.readyState !== EventSource.CLOSED) es.close();"));
    assert!((fix.confidence - 0.9).abs() < 1e-9);
    assert!(!fix.requires_manual_review);
}

#[test]
fn test_bare_timer_is_bound_and_reviewed() {
    let src = "function Banner() {\n  useEffect(() => {\n    setTimeout(hide, 3000);\n  }, []);\n  return <div />;\n}\n";
    let fix = generate_fix(src, "Banner.jsx", &finding_of(src, "Banner.jsx", LeakType::UnregisteredTimeout)).unwrap();
    assert_sound(src, &fix);
    assert!(fix.fixed_code.contains("const timeout = setTimeout(hide, 3000);"));
    assert!(fix.fixed_code.contains("clearTimeout(timeout);"));
    assert!(fix.requires_manual_review);
    assert!(fix.confidence <= 0.85);
}

#[test]
fn test_inline_listener_is_less_confident_than_named() {
    let named = "function A() {\n  useEffect(() => {\n    window.addEventListener('scroll', onScroll);\n  }, []);\n  return <i />;\n}\n";
    let inline = "function A() {\n  useEffect(() => {\n    window.addEventListener('scroll', () => track());\n  }, []);\n  return <i />;\n}\n";
    let named_fix = generate_fix(named, "a.tsx", &finding_of(named, "a.tsx", LeakType::UnregisteredEventListener)).unwrap();
    let inline_fix = generate_fix(inline, "a.tsx", &finding_of(inline, "a.tsx", LeakType::UnregisteredEventListener)).unwrap();
    assert!(!named_fix.requires_manual_review);
    assert!(inline_fix.requires_manual_review);
    assert!(inline_fix.confidence < 0.9);
    assert!(inline_fix.fixed_code.contains("const handleScroll = () => track();"));
    assert!(inline_fix.fixed_code.contains("window.removeEventListener('scroll', handleScroll);"));
}

#[test]
fn test_existing_cleanup_is_reused() {
    let src = "function Chat({ url }) {\n  useEffect(() => {\n    const ws = new WebSocket(url);\n    const id = setInterval(ping, 1000);\n    return () => {\n      ws.close();\n      log('closed');\n    };\n  }, [url]);\n  return null;\n}\n";
    let fix = generate_fix_at(src, "Chat.tsx", "unregistered-interval", 4, 16).unwrap();
    assert_sound(src, &fix);
    assert!(fix.fixed_code.contains("      ws.close();\n      log('closed');\n"));
    assert_eq!(fix.fixed_code.matches("clearInterval(id);").count(), 1);
    assert_eq!(fix.fixed_code.matches("return () =>").count(), 1);
    let added = fix.fixed_code.lines().count() - src.lines().count();
    assert_eq!(added, 1);
}

#[test]
fn test_position_beyond_source_fails_softly() {
    let src = "function A() {\n  setInterval(f, 1);\n  return <i />;\n}\n";
    for (line, column) in [(50, 1), (2, 200), (0, 0), (2, usize::MAX), (usize::MAX, usize::MAX)] {
        let err = generate_fix_at(src, "a.tsx", "unregistered-interval", line, column).unwrap_err();
        assert!(err.is_position_miss(), "{line}:{column} -> {err}");
    }
}

#[test]
fn test_unknown_type_is_unsupported() {
    let err = generate_fix_at("const a = 1;", "a.ts", "dangling-promise", 1, 1).unwrap_err();
    assert!(matches!(err, LeakError::UnsupportedLeakType(_)));
    assert!(err.to_string().starts_with("unsupported leak type"));
}

#[test]
fn test_fixed_code_contains_family_release() {
    let src = "function Live() {\n  const ws = new WebSocket(u);\n  store.subscribe(render);\n  window.addEventListener('blur', onBlur);\n  return <i />;\n}\n";
    let releases = [
        (LeakType::UnclosedSocketConnection, "ws.close();"),
        (LeakType::UnregisteredSubscription, "unsubscribe();"),
        (LeakType::UnregisteredEventListener, "removeEventListener('blur', onBlur);"),
    ];
    for (leak_type, release) in releases {
        let fix = generate_fix(src, "Live.tsx", &finding_of(src, "Live.tsx", leak_type)).unwrap();
        assert_sound(src, &fix);
        assert!(fix.fixed_code.contains(release), "{leak_type}: {}", fix.fixed_code);
    }
}

#[test]
fn test_unbound_resource_always_needs_review() {
    let src = "function Live() {\n  useEffect(() => {\n    new EventSource('/events');\n  }, []);\n  return <i />;\n}\n";
    let fix = generate_fix(src, "Live.tsx", &finding_of(src, "Live.tsx", LeakType::UnclosedStreamConnection)).unwrap();
    assert!(fix.fixed_code.contains("const eventSource = new EventSource('/events');"));
    assert!(fix.requires_manual_review);
}

#[test]
fn test_react_namespace_spelling_is_kept() {
    let src = "import React from 'react';\nfunction Ticker() {\n  const id = setInterval(tick, 10);\n  React.useEffect(() => {}, []);\n  return <b />;\n}\n";
    let fix = generate_fix(src, "Ticker.tsx", &finding_of(src, "Ticker.tsx", LeakType::UnregisteredInterval)).unwrap();
    assert!(fix.fixed_code.contains("  React.useEffect(() => {\n    const id = setInterval(tick, 10);"));
}

#[test]
fn test_fix_serializes_with_wire_names() {
    let src = "function Feed() {\n  const es = new EventSource('/x');\n  return <ul />;\n}\n";
    let fix = generate_fix(src, "Feed.tsx", &finding_of(src, "Feed.tsx", LeakType::UnclosedStreamConnection)).unwrap();
    let json = serde_json::to_value(&fix).unwrap();
    assert_eq!(json["type"], "unclosed-stream-connection");
    assert!(json["originalCode"].is_string());
    assert!(json["fixedCode"].is_string());
    assert!(json["requiresManualReview"].is_boolean());
    assert!(json["transformation"]["replacement"].is_string());
}
