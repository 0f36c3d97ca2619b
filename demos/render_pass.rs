//! One render pass over two projects, printed instead of drawn.
//!
//! Run with: RUST_LOG=debug cargo run --example render_pass --features tracing

use miette::{GraphicalReportHandler, Report};
use roadmap::{
    Boundary, ExpressionTable, Node, PrimeDateMap, ScaleDescriptor, TimeScales, Value, parse_time,
};
use serde_json::{Value as Json, json};
use tracing_subscriber::EnvFilter;

/// Prints what a real template node would receive
struct PrintNode {
    name: String,
    removed: bool,
}

impl Node for PrintNode {
    fn set_attribute(&mut self, key: &str, value: &Value<'_>) {
        if !self.removed {
            println!("  <{}> {key}={value}", self.name);
        }
    }

    fn set_style_property(&mut self, property: &str, value: &Value<'_>) {
        if !self.removed {
            println!("  <{}> style.{property}={value}", self.name);
        }
    }

    fn set_text_content(&mut self, value: &Value<'_>) {
        if !self.removed {
            println!("  <{}> text={value}", self.name);
        }
    }

    fn remove(&mut self) {
        self.removed = true;
        println!("  <{}> removed", self.name);
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let months = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
    let descriptors: Vec<ScaleDescriptor> = months
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let d = ScaleDescriptor::new(format!("H1-{name}"))
                .start(format!("2024-{:02}-01", i + 1))
                .label(*name);
            if i + 1 == months.len() {
                d.end("2024-07-01")
            } else {
                d
            }
        })
        .collect();
    let mut scales = TimeScales::build(&descriptors, 600.0)?;
    let prime_date_map = PrimeDateMap::compile("year + '-01-01'")?;
    scales.set_prime_date("2025-06-15", Some(&prime_date_map))?;
    println!(
        "scale: {} .. {}",
        scales.start_time().date(),
        scales.end_time().date()
    );

    let mut table = ExpressionTable::new();
    let caption = table.register(":=project.name; $exit=project.last");
    let bar = table.register(
        "x=layout.itemStart; width=layout.itemSize; @fill=item.done ? '#8c8' : '#ccc'; :=$.drop(item.label)",
    );
    table.register("x=)((");
    let handler = GraphicalReportHandler::new();
    for (id, error) in table.diagnostics() {
        let mut rendered = String::new();
        if handler.render_report(&mut rendered, error).is_ok() {
            eprintln!("expression #{} rejected:\n{rendered}", id.index());
        }
    }

    let projects = [
        json!({ "name": "Atlas", "items": [
            { "label": "design", "start": "2025-01-10", "end": "2025-03-01", "done": true },
            { "label": "", "start": "2025-02-15", "end": "2025-09-01" },
        ]}),
        json!({ "name": "Beacon", "last": true, "items": [
            { "label": "launch", "start": "2025-05-01", "end": "2025-05-20" },
        ]}),
    ];

    'projects: for project in &projects {
        let mut node = PrintNode {
            name: "caption".into(),
            removed: false,
        };
        let mut layout = json!({});
        let items = project["items"].as_array().cloned().unwrap_or_default();
        for item in &items {
            let (Some(start), Some(end)) = (time_of(item, "start"), time_of(item, "end")) else {
                continue;
            };
            let Some(range) = scales.layout_range(start, end) else {
                continue;
            };
            range.write_into(&mut layout);
            let mut bar_node = PrintNode {
                name: "bar".into(),
                removed: false,
            };
            if let Some(evaluation) = table.evaluate(bar, &mut bar_node, project, item, &layout) {
                for fault in &evaluation.faults {
                    eprintln!("{:?}", Report::new(fault.clone()));
                }
                if evaluation.stops_at(Boundary::RenderPass) {
                    break 'projects;
                }
            }
        }
        let Some(evaluation) = table.evaluate(caption, &mut node, project, &json!({}), &layout)
        else {
            continue;
        };
        if evaluation.stops_at(Boundary::RenderPass) {
            println!("exit requested after {}", project["name"]);
            break;
        }
    }

    Ok(())
}

fn time_of(item: &Json, key: &str) -> Option<roadmap::Timestamp> {
    item.get(key).and_then(Json::as_str).and_then(parse_time)
}
