mod common;

use std::fs;
use std::sync::Arc;

use common::{deps_json, FakeBottleInspector, FakeFetcher, TestEnvironment};
use tapline_common::capability::BottleNames;
use tapline_common::dependency::Dependency;
use tapline_common::diagnostics::Warning;
use tapline_common::error::TaplineError;
use tapline_core::LoaderSource;

#[test]
fn lower_priority_tap_wins_over_core() {
    let env = TestEnvironment::new();
    env.core_formula("bar", "{}");
    env.tap("alice", "tools", Some(20));
    let tap_bar = env.tap_formula("alice", "tools", "bar", "{}");
    let formulary = env.formulary();

    for _ in 0..3 {
        let bar = formulary.factory("bar").unwrap();
        assert_eq!(bar.path(), env.canonical(&tap_bar));
        assert_eq!(bar.tap(), Some("alice/tools"));
        assert_eq!(bar.full_name(), "alice/tools/bar");
    }
}

#[test]
fn default_priority_tap_loses_to_core() {
    let env = TestEnvironment::new();
    let core_bar = env.core_formula("bar", "{}");
    env.tap("alice", "tools", None);
    env.tap_formula("alice", "tools", "bar", "{}");

    let bar = env.formulary().factory("bar").unwrap();
    assert_eq!(bar.path(), env.canonical(&core_bar));
    assert!(bar.is_core());
}

#[test]
fn equal_priorities_pick_first_tap_and_warn() {
    let env = TestEnvironment::new();
    env.tap("bob", "extra", Some(30));
    env.tap("alice", "tools", Some(30));
    let alice_bar = env.tap_formula("alice", "tools", "bar", "{}");
    env.tap_formula("bob", "extra", "bar", "{}");
    env.diagnostics.take();

    let bar = env.formulary().factory("bar").unwrap();
    assert_eq!(bar.path(), env.canonical(&alice_bar));

    let warnings = env.diagnostics.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        &warnings[0],
        Warning::AmbiguousFormula { priority: 30, candidates, .. } if candidates.len() == 2
    ));
}

#[test]
fn same_location_yields_identical_instance() {
    let env = TestEnvironment::new();
    let zlib = env.core_formula("zlib", "{}");
    let formulary = env.formulary();

    let by_name = formulary.factory("zlib").unwrap();
    let again = formulary.factory("zlib").unwrap();
    let by_path = formulary.factory(zlib.to_str().unwrap()).unwrap();

    assert!(Arc::ptr_eq(&by_name, &again));
    assert!(Arc::ptr_eq(&by_name, &by_path));
    assert_eq!(formulary.definition_cache().len(), 1);
}

#[test]
fn tap_qualified_reference_bypasses_priority_search() {
    let env = TestEnvironment::new();
    env.core_formula("foo", "{}");
    env.tap("alice", "tools", None);
    let tap_foo = env.tap_formula("alice", "tools", "foo", "{}");
    let formulary = env.formulary();

    let loader = formulary.loader_for("alice/tools/foo").unwrap();
    assert!(matches!(loader.source(), LoaderSource::Tap { .. }));
    let foo = formulary.factory("Alice/homebrew-tools/foo").unwrap();
    assert_eq!(foo.path(), env.canonical(&tap_foo));
}

#[test]
fn tap_qualified_miss_is_tap_scoped() {
    let env = TestEnvironment::new();
    env.core_formula("missing", "{}");
    env.tap("alice", "tools", None);

    let err = env.formulary().factory("alice/tools/missing").unwrap_err();
    match err {
        TaplineError::TapFormulaUnavailable { tap, name } => {
            assert_eq!(tap, "alice/tools");
            assert_eq!(name, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_reference_falls_through_to_null_loader() {
    let env = TestEnvironment::new();
    let formulary = env.formulary();

    let loader = formulary.loader_for("nothing").unwrap();
    assert_eq!(loader.source(), &LoaderSource::Null);
    assert_eq!(formulary.canonical_name("nothing").unwrap(), "nothing");
    assert!(matches!(
        formulary.factory("nothing"),
        Err(TaplineError::FormulaUnavailable(name)) if name == "nothing"
    ));
}

#[test]
fn alias_resolves_to_target_name() {
    let env = TestEnvironment::new();
    let openssl = env.core_formula("openssl", "{}");
    env.alias("ssl", "openssl");
    let formulary = env.formulary();

    assert_eq!(formulary.canonical_name("ssl").unwrap(), "openssl");
    let ssl = formulary.factory("ssl").unwrap();
    assert_eq!(ssl.name(), "openssl");
    assert!(Arc::ptr_eq(&ssl, &formulary.factory("openssl").unwrap()));
    assert_eq!(ssl.path(), env.canonical(&openssl));
}

#[test]
fn cached_copy_is_the_last_resort() {
    let env = TestEnvironment::new();
    let formulary = env.formulary();
    fs::write(
        env.config.formula_cache_dir().join("leftover.json"),
        r#"{"desc": "fetched earlier"}"#,
    )
    .unwrap();

    let leftover = formulary.factory("leftover").unwrap();
    assert_eq!(leftover.desc(), Some("fetched earlier"));
}

#[test]
fn url_reference_is_fetched_once() {
    let env = TestEnvironment::new();
    let url = "https://example.com/formulae/remote.json";
    let fetcher = Arc::new(FakeFetcher::default().with_document(url, &deps_json(&[])));
    let formulary = env.formulary().with_fetcher(fetcher.clone());

    let first = formulary.factory(url).unwrap();
    let second = formulary.factory(url).unwrap();

    assert_eq!(first.name(), "remote");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fetcher.fetches(), 1);
    assert!(env.config.formula_cache_dir().join("remote.json").is_file());
}

#[test]
fn failed_fetch_propagates() {
    let env = TestEnvironment::new();
    let formulary = env.formulary();
    assert!(matches!(
        formulary.factory("https://example.com/formulae/gone.json"),
        Err(TaplineError::Fetch(..))
    ));
}

#[test]
fn bottle_reference_resolves_through_its_receipt() {
    let env = TestEnvironment::new();
    env.tap("alice", "tools", None);
    let tap_foo = env.tap_formula("alice", "tools", "foo", "{}");
    let bottle = env.temp_dir.path().join("foo-1.0.x86_64_linux.bottle.tar.gz");
    fs::write(&bottle, b"").unwrap();

    let formulary = env.formulary().with_bottle_inspector(Arc::new(FakeBottleInspector {
        names: BottleNames {
            name: "foo".into(),
            full_name: "alice/tools/foo".into(),
        },
    }));

    let loader = formulary.loader_for(bottle.to_str().unwrap()).unwrap();
    assert_eq!(loader.name(), "foo");
    assert_eq!(loader.bottle_path(), Some(env.canonical(&bottle).as_path()));
    assert_eq!(loader.path(), env.canonical(&tap_foo));
    assert_eq!(
        formulary.factory(bottle.to_str().unwrap()).unwrap().tap(),
        Some("alice/tools")
    );
}

#[test]
fn tap_paths_lists_every_provider() {
    let env = TestEnvironment::new();
    env.tap("alice", "tools", None);
    env.tap("bob", "extra", None);
    env.tap_formula("alice", "tools", "foo", "{}");
    env.tap_formula("bob", "extra", "foo", "{}");
    let formulary = env.formulary();

    assert_eq!(formulary.tap_paths("FOO").unwrap().len(), 2);
    assert!(matches!(
        formulary.tap_path("foo"),
        Err(TaplineError::TapFormulaAmbiguity { paths, .. }) if paths.len() == 2
    ));
    assert_eq!(formulary.tap_path("bar").unwrap(), None);
}

#[test]
fn pinned_taps_still_take_part_in_search() {
    let env = TestEnvironment::new();
    let tap = env.tap("alice", "tools", Some(10));
    let tap_bar = env.tap_formula("alice", "tools", "bar", "{}");
    env.core_formula("bar", "{}");
    assert!(env.registry.pin(&tap).unwrap());

    let bar = env.formulary().factory("bar").unwrap();
    assert_eq!(bar.path(), env.canonical(&tap_bar));
}

#[test]
fn priority_bounds_and_notices() {
    let env = TestEnvironment::new();
    let alice = env.tap("alice", "tools", Some(20));
    env.tap("bob", "extra", Some(40));
    env.diagnostics.take();

    assert!(matches!(
        env.registry.set_priority(&alice, 150),
        Err(TaplineError::InvalidPriority(150))
    ));
    assert_eq!(env.registry.priority(&alice).unwrap(), 20);

    let warnings = env.registry.set_priority(&alice, 50).unwrap();
    assert_eq!(
        warnings,
        vec![Warning::ReservedPriority {
            tap: "alice/tools".into(),
            priority: 50
        }]
    );
    assert_eq!(env.registry.priority(&alice).unwrap(), 50);

    let warnings = env.registry.set_priority(&alice, 40).unwrap();
    assert_eq!(
        warnings,
        vec![Warning::SamePriority {
            tap: "alice/tools".into(),
            other: "bob/extra".into(),
            priority: 40
        }]
    );
    assert_eq!(env.diagnostics.warnings().len(), 2);
}

#[test]
fn owner_tap_is_preferred_for_dependencies() {
    let env = TestEnvironment::new();
    env.core_formula("lib", "{}");
    env.tap("alice", "tools", None);
    let tap_lib = env.tap_formula("alice", "tools", "lib", "{}");
    let formulary = env.formulary();

    let dep = Dependency::new_runtime("lib").with_owner_tap(Some("alice/tools"));
    let lib = formulary.resolve_dependency(&dep).unwrap();
    assert_eq!(lib.path(), env.canonical(&tap_lib));
    assert!(env.diagnostics.warnings().is_empty());
}

#[test]
fn cross_tap_fallback_warns_once_per_name() {
    let env = TestEnvironment::new();
    env.tap("alice", "tools", None);
    env.tap("bob", "extra", None);
    env.tap_formula("bob", "extra", "lib", "{}");
    env.diagnostics.take();
    let formulary = env.formulary();

    let dep = Dependency::new_runtime("lib").with_owner_tap(Some("alice/tools"));
    let first = formulary.resolve_dependency(&dep).unwrap();
    let second = formulary.resolve_dependency(&dep).unwrap();
    assert_eq!(first.tap(), Some("bob/extra"));
    assert!(Arc::ptr_eq(&first, &second));

    assert_eq!(
        env.diagnostics.warnings(),
        vec![Warning::CrossTapFallback {
            name: "lib".into(),
            owner: "alice/tools".into(),
            provider: "bob/extra".into(),
        }]
    );
}

#[test]
fn fallback_to_core_is_silent() {
    let env = TestEnvironment::new();
    env.tap("alice", "tools", None);
    env.core_formula("lib", "{}");
    env.diagnostics.take();

    let dep = Dependency::new_runtime("lib").with_owner_tap(Some("alice/tools"));
    let lib = env.formulary().resolve_dependency(&dep).unwrap();
    assert!(lib.is_core());
    assert!(env.diagnostics.warnings().is_empty());
}

#[test]
fn references_outside_the_root_are_not_bare_names() {
    let env = TestEnvironment::new();
    let outside = tempfile::tempdir().unwrap();
    let stray = outside.path().join("stray");
    fs::write(outside.path().join("stray.json"), "{}").unwrap();
    let formulary = env.formulary();

    for reference in [
        stray.to_str().unwrap().to_string(),
        "../stray".to_string(),
        "Aliases/../Formula/stray".to_string(),
    ] {
        let loader = formulary.loader_for(&reference).unwrap();
        assert_eq!(loader.source(), &LoaderSource::Null, "{reference}");
        assert!(matches!(
            formulary.factory(&reference),
            Err(TaplineError::FormulaUnavailable(_))
        ));
    }
}

#[test]
fn duplicated_tap_definition_is_ambiguous() {
    let env = TestEnvironment::new();
    let tap = env.tap("alice", "tools", None);
    env.tap_formula("alice", "tools", "foo", "{}");
    fs::write(tap.path.join("foo.json"), "{}").unwrap();
    let formulary = env.formulary();

    assert!(matches!(
        formulary.factory("alice/tools/foo"),
        Err(TaplineError::TapFormulaAmbiguity { paths, .. }) if paths.len() == 2
    ));
    assert_eq!(
        formulary.canonical_name("Alice/Tools/Foo").unwrap(),
        "alice/tools/foo"
    );
}
