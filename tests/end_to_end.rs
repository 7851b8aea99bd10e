//! Cross-crate scenarios: templates, stores, bindings and loading together.

use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reinhardt_ghost::prelude::*;
use reinhardt_ghost::{LoadFailure, RenderError, TemplateConfig, transport_from_config};
use rstest::rstest;
use serde_json::json;
use serial_test::serial;
use tempfile::TempDir;

fn cache(transport: &Rc<MemoryTransport>) -> Rc<TemplateCache> {
	let transport: Rc<dyn TemplateTransport> = transport.clone();
	Rc::new(TemplateCache::new(transport))
}

fn find(root: &Node, tag: &str) -> Node {
	root.descendants()
		.into_iter()
		.find(|node| node.tag_name().as_deref() == Some(tag))
		.unwrap_or_else(|| panic!("no <{}> under {}", tag, root.outer_html()))
}

fn count_tags(root: &Node, tag: &str) -> usize {
	root.descendants()
		.iter()
		.filter(|node| node.tag_name().as_deref() == Some(tag))
		.count()
}

#[rstest]
#[tokio::test]
async fn test_count_scenario_with_unprefixed_markers() {
	// Arrange
	let transport = Rc::new(MemoryTransport::new().with_template(
		"counter",
		r#"<p show-if="count > 0">visible</p><span value="count"></span>"#,
	));
	let config = GhostConfig::from_toml_str("[markers]\nprefix = \"\"").unwrap();
	let host = Node::element("main");
	let counter = Component::builder(host.clone())
		.name("counter")
		.data(json!({"count": 0}))
		.config(config)
		.build(cache(&transport))
		.unwrap();

	// Act
	counter.load().await.unwrap();

	// Assert
	let anchor = host.first_child().unwrap();
	assert!(anchor.is_comment());
	assert_eq!(anchor.text_content(), " an anchor comment ");
	let span = find(&host, "span");
	assert_eq!(span.text_content(), "0");

	counter.store().set("count", 5).unwrap();
	let paragraph = find(&host, "p");
	assert_eq!(host.first_child(), Some(paragraph.clone()));
	assert_eq!(span.text_content(), "5");

	counter.store().set("count", 0).unwrap();
	assert!(paragraph.parent().is_none());
	assert_eq!(host.first_child(), Some(anchor));
	assert_eq!(span.text_content(), "0");
}

#[rstest]
#[tokio::test]
async fn test_cycle_leaves_the_host_untouched() {
	// Arrange
	let transport = Rc::new(
		MemoryTransport::new()
			.with_template("root", r#"<h1>root</h1><div data-component="child"></div>"#)
			.with_template("child", r#"<p>child</p><section data-component="root"></section>"#),
	);
	let host = Node::element("main");
	host.append_child(&Node::text("loading")).unwrap();
	let root = Component::builder(host.clone())
		.name("root")
		.build(cache(&transport))
		.unwrap();

	// Act
	let error = root.load().await.unwrap_err();

	// Assert
	assert_eq!(error.to_string(), "can't get component 'root'");
	let LoadError::Cycle { name, chain } = error.root_cause() else {
		panic!("expected a cycle, got {:?}", error.root_cause());
	};
	assert_eq!(name, "root");
	assert_eq!(chain, &vec!["root".to_string(), "child".to_string()]);
	assert_eq!(transport.fetch_count("root"), 1);
	assert_eq!(transport.fetch_count("child"), 1);
	assert_eq!(host.inner_html(), "loading");
	assert_eq!(root.state(), LoadState::Failed);
	assert_eq!(root.children()[0].state(), LoadState::Failed);
}

#[rstest]
#[tokio::test]
async fn test_self_reference_is_a_cycle() {
	let transport = Rc::new(
		MemoryTransport::new().with_template("loop", r#"<div data-component="loop"></div>"#),
	);
	let host = Node::element("main");
	let component = Component::builder(host.clone())
		.name("loop")
		.build(cache(&transport))
		.unwrap();

	let error = component.load().await.unwrap_err();

	assert!(error.root_cause().is_cycle());
	assert_eq!(transport.fetch_count("loop"), 1);
	assert_eq!(host.child_count(), 0);
}

#[rstest]
#[tokio::test]
async fn test_concurrent_roots_share_one_fetch() {
	// Arrange
	let transport = Rc::new(
		MemoryTransport::new()
			.with_template("card", r#"<b data-value="title"></b>"#)
			.with_latency(Duration::from_millis(10)),
	);
	let cache = cache(&transport);
	let build = |title: &str| {
		Component::builder(Node::element("div"))
			.name("card")
			.data(json!({ "title": title }))
			.build(Rc::clone(&cache))
			.unwrap()
	};
	let first = build("first");
	let second = build("second");

	// Act
	let (a, b) = futures::join!(first.load(), second.load());

	// Assert
	a.unwrap();
	b.unwrap();
	assert_eq!(transport.fetch_count("card"), 1);
	assert_eq!(first.mount_node().text_content(), "first");
	assert_eq!(second.mount_node().text_content(), "second");
	assert_eq!(cache.statistics().misses, 1);
	assert_eq!(cache.statistics().hits, 1);
}

#[rstest]
#[tokio::test]
async fn test_sibling_sub_components_are_fetched_once() {
	let transport = Rc::new(
		MemoryTransport::new()
			.with_template(
				"list",
				r#"<ul><li data-component="item"></li><li data-component="item"></li></ul>"#,
			)
			.with_template("item", r#"<i data-value="label"></i>"#)
			.with_latency(Duration::from_millis(5)),
	);
	let host = Node::element("main");
	let list = Component::builder(host.clone())
		.name("list")
		.definition("item", ComponentDefinition::new(json!({"label": "entry"})).unwrap())
		.build(cache(&transport))
		.unwrap();

	list.load().await.unwrap();

	assert_eq!(transport.fetch_count("item"), 1);
	assert_eq!(count_tags(&host, "i"), 2);
	assert_eq!(host.text_content(), "entryentry");

	// Each instance owns its own store.
	let items = list.children();
	assert!(!items[0].store().ptr_eq(items[1].store()));
	items[0].store().set("label", "changed").unwrap();
	assert_eq!(host.text_content(), "changedentry");
}

#[rstest]
#[tokio::test]
async fn test_failed_fetch_is_retried_by_a_later_load() {
	// Arrange
	let transport = Rc::new(MemoryTransport::new());
	let cache = cache(&transport);
	let first = Component::builder(Node::element("div"))
		.name("late")
		.build(Rc::clone(&cache))
		.unwrap();

	// Act
	let error = first.load().await.unwrap_err();
	transport.insert("late", "<p>arrived</p>");
	let second = Component::builder(Node::element("div"))
		.name("late")
		.build(Rc::clone(&cache))
		.unwrap();
	second.load().await.unwrap();

	// Assert
	assert_eq!(error.transport_error().unwrap().name, "late");
	assert_eq!(transport.fetch_count("late"), 2);
	assert_eq!(second.mount_node().text_content(), "arrived");
	assert_eq!(cache.statistics().failures, 1);
}

#[rstest]
#[tokio::test]
async fn test_nothing_mounts_until_the_whole_tree_is_ready() {
	let transport = Rc::new(
		MemoryTransport::new()
			.with_template(
				"page",
				r#"<header data-component="nav"></header><footer data-component="missing"></footer>"#,
			)
			.with_template("nav", "<a>home</a>"),
	);
	let host = Node::element("main");
	let page = Component::builder(host.clone())
		.name("page")
		.build(cache(&transport))
		.unwrap();

	let error = page.load().await.unwrap_err();

	let LoadError::CannotLoad {
		source: LoadFailure::Render(RenderError::SubComponent { name, .. }),
		..
	} = &error
	else {
		panic!("expected a sub component failure, got {error:?}");
	};
	assert_eq!(name, "missing");
	assert_eq!(host.child_count(), 0);
	let children = page.children();
	assert_eq!(children[0].state(), LoadState::Mounted);
	assert_eq!(children[1].state(), LoadState::Failed);
}

#[rstest]
#[tokio::test]
async fn test_form_round_trip() {
	// Arrange
	let transport = Rc::new(MemoryTransport::new().with_template(
		"profile",
		r#"
		<template>
			<form data-on-submit="save">
				<input data-value="user.name">
				<textarea data-value="user.bio"></textarea>
			</form>
			<h2 data-value="user.name"></h2>
			<p data-show-if="saved">Saved</p>
			<em data-show-if="user.name.length > 10">That is a long name</em>
		</template>
		"#,
	));
	let host = Node::element("main");
	let profile = Component::builder(host.clone())
		.name("profile")
		.data(json!({"user": {"name": "Ada", "bio": ""}, "saved": false}))
		.method("save", |event, store| {
			event.prevent_default();
			store.set("saved", true)
		})
		.build(cache(&transport))
		.unwrap();
	profile.load().await.unwrap();
	let input = find(&host, "input");
	let heading = find(&host, "h2");

	// Act
	input.set_value("Ada Lovelace");
	input.dispatch_event(&Event::new(EventType::Input));
	let not_prevented = find(&host, "form").dispatch_event(&Event::new(EventType::Submit));

	// Assert
	assert!(!not_prevented);
	assert_eq!(
		profile.store().get_path("user.name"),
		Some(Value::from("Ada Lovelace"))
	);
	assert_eq!(heading.text_content(), "Ada Lovelace");
	assert_eq!(find(&host, "p").text_content(), "Saved");
	assert_eq!(find(&host, "em").text_content(), "That is a long name");
	assert_eq!(
		profile.store().to_json(),
		json!({"user": {"name": "Ada Lovelace", "bio": ""}, "saved": true})
	);
}

#[rstest]
#[tokio::test]
async fn test_templates_from_a_configured_directory() {
	let dir = TempDir::new().unwrap();
	std::fs::write(
		dir.path().join("greeting.html"),
		r#"<p>Hello, <span data-value="name"></span>!</p>"#,
	)
	.unwrap();
	let config = GhostConfig::default().with_overrides_from(|key| {
		(key == reinhardt_ghost::core::config::TEMPLATE_DIR_ENV)
			.then(|| dir.path().display().to_string())
	});
	let cache = Rc::new(TemplateCache::new(transport_from_config(&config.templates)));
	let host = Node::element("main");
	host.set_attribute("data-component", "greeting");
	let greeting = Component::builder(host.clone())
		.data(json!({"name": "world"}))
		.config(config)
		.build(cache)
		.unwrap();

	greeting.load().await.unwrap();

	assert_eq!(host.text_content(), "Hello, world!");
	assert_eq!(
		TemplateConfig::default().file_name("greeting"),
		"greeting.html"
	);
}

/// Collects `[LEVEL] message` lines for the current thread.
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);
		self.logs
			.lock()
			.unwrap()
			.push(format!("[{}] {}", event.metadata().level(), visitor.message));
	}
}

#[rstest]
#[tokio::test]
#[serial(ghost_logs)]
async fn test_failures_are_logged_where_they_happen() {
	use tracing_subscriber::layer::SubscriberExt as _;
	use tracing_subscriber::util::SubscriberInitExt as _;

	// Arrange
	let logs = Arc::new(Mutex::new(Vec::new()));
	let _guard = tracing_subscriber::registry()
		.with(LogCapture { logs: logs.clone() })
		.set_default();
	let transport = Rc::new(
		MemoryTransport::new()
			.with_template("page", r#"<div data-component="absent"></div><b data-on-click="nope">x</b>"#),
	);
	let host = Node::element("main");
	let page = Component::builder(host.clone())
		.name("page")
		.build(cache(&transport))
		.unwrap();

	// Act
	let _ = page.load().await;
	page.handle_event("nope", &Event::new(EventType::Click)).unwrap();

	// Assert
	let captured = logs.lock().unwrap();
	let count = |needle: &str| captured.iter().filter(|line| line.contains(needle)).count();
	assert_eq!(count("[ERROR] failed to load component"), 2, "{:?}", *captured);
	assert_eq!(count("[ERROR] sub component failed to load"), 1, "{:?}", *captured);
	assert_eq!(count("[WARN] no handler registered"), 1, "{:?}", *captured);
	assert!(!captured.iter().any(|line| line.contains("component mounted")));
}
