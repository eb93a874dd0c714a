//! Example: Basic usage of the wclens engine

use serde_json::json;
use wclens_dom::{ComponentSpec, Document, EventInit, PropertySpec, ShadowMode};
use wclens_engine::{Config, DevtoolsSession};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut session = DevtoolsSession::with_config(build_page()?, Config::default());
    println!("wclens Engine v{} attached", wclens_engine::VERSION);

    // Scan the page for component instances
    for inst in session.scan() {
        println!(
            "{}{} ({} attrs, shadow: {})",
            "  ".repeat(inst.depth),
            inst.tag_name,
            inst.attributes.len(),
            inst.shadow.is_some()
        );
    }

    // Watch events for a few ticks
    session.toggle_monitor();
    let toggle = session.scan()[1].element;
    session.doc_mut().dispatch(toggle, EventInit::new("change"));
    session.tick(16);
    for entry in session.monitor().logs() {
        println!("[{} ms] {} on <{}>", entry.at, entry.event_type, entry.source_tag);
    }

    // Edit a property, then take it back
    let app = session.scan()[0].element;
    session.set_property(app, "volume", json!(11))?;
    session.undo();

    // Audit the whole app
    let report = session.audit(app)?;
    println!(
        "audit score {} ({} issues)",
        report.score,
        report.issues.len()
    );

    Ok(())
}

fn build_page() -> anyhow::Result<Document> {
    let mut doc = Document::new();
    let mut spec = ComponentSpec::new("x-app");
    spec.properties.push(PropertySpec::new("volume", json!(3)));
    doc.define_component(spec)?;

    let body = doc.body();
    let app = doc.create_element("x-app");
    doc.set_attribute(app, "role", "application");
    doc.set_attribute(app, "aria-label", "Demo application");
    doc.append_child(body, app);

    let fragment = doc.attach_shadow(app, ShadowMode::Open, true)?;
    let toggle = doc.create_element("x-toggle");
    doc.append_child(fragment, toggle);
    Ok(doc)
}
