//! Integration tests for realm resolution.
//!
//! These tests verify:
//! - Routing through imports, the parent gate and ordering policies
//! - Identity and at-most-once materialization under concurrency
//! - Filesystem-backed search paths
//! - Realm graphs built from world configs

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use realmwork::core::config::WorldFile;
use realmwork::core::types::{Location, RealmId, SymbolName};
use realmwork::world::{BuiltinPolicy, Realm, RealmGraph, ResolveError};
use tempfile::TempDir;

fn id(s: &str) -> RealmId {
    RealmId::new(s).unwrap()
}

fn name(s: &str) -> SymbolName {
    SymbolName::new(s).unwrap()
}

fn bundle_realm(graph: &RealmGraph, realm: &str, artifacts: &[&str]) -> Arc<Realm> {
    for artifact in artifacts {
        graph
            .memory()
            .insert_artifact(realm, artifact, format!("{realm}/{artifact}").into_bytes());
    }
    let created = graph.new_realm(id(realm)).unwrap();
    created.add_search_path_entry(&format!("mem:{realm}")).unwrap();
    created
}

mod end_to_end {
    use super::*;

    #[test]
    fn import_from_sibling_realm() {
        let graph = RealmGraph::new();
        let a = graph.new_realm(id("A")).unwrap();
        let b = graph.new_realm(id("B")).unwrap();
        a.declare_import(&b, "svc.*").unwrap();
        let defined = b.define(&name("svc.Widget"), b"widget").unwrap();

        let first = a.resolve(&name("svc.Widget")).unwrap();
        assert!(Arc::ptr_eq(&first, &defined));
        assert_eq!(first.realm(), &id("B"));

        let second = a.resolve(&name("svc.Widget")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let err = a.resolve(&name("other.Thing")).unwrap_err();
        assert_eq!(err, ResolveError::NotFound(name("other.Thing")));
    }

    #[test]
    fn three_level_hierarchy_with_gates() {
        let graph = RealmGraph::new();
        let boot = bundle_realm(&graph, "boot", &["api.Service", "impl.Internal"]);
        let app = boot.create_child(id("app")).unwrap();
        app.declare_parent_import("api");
        let plugin = app.create_child(id("plugin")).unwrap();

        // plugin's gate is open, app's gate only lets api through
        assert_eq!(plugin.resolve(&name("api.Service")).unwrap().realm(), &id("boot"));
        assert!(plugin.resolve(&name("impl.Internal")).unwrap_err().is_not_found());
        assert!(boot.resolve(&name("impl.Internal")).is_ok());
    }
}

mod self_defined {
    use super::*;

    #[test]
    fn defined_name_never_consults_imports_or_parent() {
        let graph = RealmGraph::new();
        let parent = bundle_realm(&graph, "parent", &["svc.Widget"]);
        let api = bundle_realm(&graph, "api", &["svc.Widget"]);
        let child = graph
            .new_child_realm(id("child"), &parent, Some(BuiltinPolicy::ParentFirst.shared()))
            .unwrap();
        child.declare_import(&api, "svc").unwrap();

        let own = child.define(&name("svc.Widget"), b"own").unwrap();
        for _ in 0..3 {
            assert!(Arc::ptr_eq(&child.resolve(&name("svc.Widget")).unwrap(), &own));
        }
        assert!(api.find_loaded(&name("svc.Widget")).is_none());
        assert!(parent.find_loaded(&name("svc.Widget")).is_none());
    }
}

mod parent_gate {
    use super::*;

    #[test]
    fn absent_empty_and_prefix_sets() {
        let graph = RealmGraph::new();
        let root = graph.new_realm(id("root")).unwrap();
        let names = ["com.acme.Foo", "org.other.Bar", "x"];

        let open = root.create_child(id("open")).unwrap();
        for n in names {
            assert!(open.is_imported_from_parent(n));
        }

        let closed = root.create_child(id("closed")).unwrap();
        closed.close_parent_gate();
        for n in names {
            assert!(!closed.is_imported_from_parent(n));
        }

        let gated = root.create_child(id("gated")).unwrap();
        gated.declare_parent_import("com.acme");
        assert!(gated.is_imported_from_parent("com.acme.Foo"));
        assert!(!gated.is_imported_from_parent("org.other.Bar"));
    }

    #[test]
    fn declaring_after_closing_reopens_matching_names() {
        let graph = RealmGraph::new();
        let root = bundle_realm(&graph, "root", &["com.acme.Foo"]);
        let child = root.create_child(id("child")).unwrap();
        child.close_parent_gate();
        assert!(child.resolve(&name("com.acme.Foo")).unwrap_err().is_not_found());

        child.declare_parent_import("com.acme.*");
        assert!(child.resolve(&name("com.acme.Foo")).is_ok());
    }
}

mod routing {
    use super::*;

    fn route_all(order: &[(&str, &str)]) -> Vec<Option<String>> {
        let graph = RealmGraph::new();
        let names = ["svc.Widget", "svc.core.Engine", "svc.core.Engine$Part", "util.Text", "misc.Other"];
        for source in ["one", "two", "three"] {
            bundle_realm(&graph, source, &names);
        }
        let app = graph.new_realm(id("app")).unwrap();
        for (source, pattern) in order {
            app.declare_import_from(&id(source), *pattern).unwrap();
        }
        names
            .iter()
            .map(|n| app.resolve(&name(n)).ok().map(|a| a.realm().to_string()))
            .collect()
    }

    #[test]
    fn insertion_order_does_not_change_routing() {
        let rules = [
            ("one", "svc.*"),
            ("two", "svc.core"),
            ("three", "=svc.core.Engine"),
            ("three", "util"),
        ];
        let forward = route_all(&rules);
        let mut reversed = rules;
        reversed.reverse();
        assert_eq!(forward, route_all(&reversed));

        assert_eq!(
            forward,
            vec![
                Some("one".to_string()),
                Some("three".to_string()),
                Some("two".to_string()),
                Some("three".to_string()),
                None,
            ]
        );
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn k_threads_observe_one_artifact() {
        const K: usize = 16;
        let graph = RealmGraph::new();
        let api = bundle_realm(&graph, "api", &["svc.Widget"]);
        let app = graph.new_realm(id("app")).unwrap();
        app.declare_import(&api, "svc").unwrap();

        let barrier = Arc::new(Barrier::new(K));
        let handles: Vec<_> = (0..K)
            .map(|_| {
                let app = Arc::clone(&app);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    app.resolve(&name("svc.Widget")).unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = &results[0];
        assert!(results.iter().all(|a| Arc::ptr_eq(a, first)));
        assert_eq!(api.loaded_names(), vec![name("svc.Widget")]);
    }

    #[test]
    fn independent_names_resolve_in_parallel() {
        let graph = RealmGraph::new();
        let names: Vec<String> = (0..32).map(|i| format!("gen.Type{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let core = bundle_realm(&graph, "core", &refs);

        let handles: Vec<_> = names
            .iter()
            .cloned()
            .map(|n| {
                let core = Arc::clone(&core);
                thread::spawn(move || core.resolve(&name(&n)).unwrap().name().to_string())
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&names) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
        assert_eq!(core.loaded_names().len(), 32);
    }
}

mod filesystem {
    use super::*;

    #[test]
    fn search_path_order_decides_between_directories() {
        let temp = TempDir::new().unwrap();
        for dir in ["first", "second"] {
            let pkg = temp.path().join(dir).join("svc");
            fs::create_dir_all(&pkg).unwrap();
            fs::write(pkg.join("Widget.art"), dir.as_bytes()).unwrap();
        }
        fs::write(temp.path().join("second/svc/Only.art"), b"only").unwrap();

        let graph = RealmGraph::new();
        let core = graph.new_realm(id("core")).unwrap();
        core.add_search_path_entry(temp.path().join("first").to_str().unwrap())
            .unwrap();
        core.add_search_path_entry(temp.path().join("second").to_str().unwrap())
            .unwrap();

        let widget = core.resolve(&name("svc.Widget")).unwrap();
        assert_eq!(widget.location(), Some(&Location::File(temp.path().join("first"))));
        let only = core.resolve(&name("svc.Only")).unwrap();
        assert_eq!(only.location(), Some(&Location::File(temp.path().join("second"))));
    }

    #[test]
    fn artifacts_and_resources_from_zip_archive() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("api.jar");
        let mut writer = zip::ZipWriter::new(fs::File::create(&jar).unwrap());
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("svc/Widget.art", options).unwrap();
        writer.write_all(b"widget").unwrap();
        writer.start_file("svc/config.toml", options).unwrap();
        writer.write_all(b"x = 1").unwrap();
        writer.finish().unwrap();

        let graph = RealmGraph::new();
        let api = graph.new_realm(id("api")).unwrap();
        assert!(api
            .add_search_path_entry(&format!("jar:file:{}!/", jar.display()))
            .unwrap());

        let widget = api.resolve(&name("svc.Widget")).unwrap();
        assert_eq!(widget.location(), Some(&Location::File(jar.clone())));
        assert!(api.resolve(&name("svc.Missing")).unwrap_err().is_not_found());
        assert_eq!(api.resources("svc/config.toml").len(), 1);
    }

    #[test]
    fn resources_from_directories() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("lib/svc");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("config.toml"), b"x = 1").unwrap();

        let graph = RealmGraph::new();
        let core = graph.new_realm(id("core")).unwrap();
        core.add_search_path_entry(temp.path().join("lib").to_str().unwrap())
            .unwrap();

        let found = core.resources("svc/config.toml");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "svc/config.toml");
        assert!(core.resource("svc/missing.toml").is_none());
    }
}

mod world_config {
    use super::*;

    #[test]
    fn world_file_builds_working_graph() {
        let temp = TempDir::new().unwrap();
        let api_dir = temp.path().join("api/svc");
        fs::create_dir_all(&api_dir).unwrap();
        fs::write(api_dir.join("Widget.art"), b"widget").unwrap();

        let path = temp.path().join("realms.toml");
        fs::write(
            &path,
            r#"
            [[realm]]
            id = "boot"
            search_path = ["api"]

            [[realm]]
            id = "app"
            parent = "boot"
            parent_imports = []

            [[realm.import]]
            from = "boot"
            pattern = "svc.*"
            "#,
        )
        .unwrap();

        let graph = WorldFile::load(&path).unwrap().build().unwrap();
        let app = graph.realm(&id("app")).unwrap();
        assert_eq!(app.resolve(&name("svc.Widget")).unwrap().realm(), &id("boot"));
        assert!(app.describe().contains("parent imports: 0"));
    }
}
