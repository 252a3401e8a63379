//! Command handlers for the Buildview CLI.

use std::{fs::File, io::BufReader};

use anyhow::{Context, Result};
use buildview_core::{
    plan::read_json_file, BuildEvent, Highlight, Model, ModelBuilder, Outline, PlanNode,
    ResourceInput,
};
use log::{debug, info};

use crate::args::{Format, ReplayArgs};

/// Runs CLI commands and renders their output as text.
pub struct Cli;

impl Cli {
    /// Builds the model for a plan, applies every recorded event and renders
    /// the final state.
    pub fn replay(args: &ReplayArgs) -> Result<String> {
        let plan: PlanNode = read_json_file(&args.plan)
            .with_context(|| format!("Failed to read plan {}", args.plan.display()))?;
        let resources: Vec<ResourceInput> = match &args.resources {
            Some(path) => read_json_file(path)
                .with_context(|| format!("Failed to read resources {}", path.display()))?,
            None => Vec::new(),
        };
        let highlight = args
            .highlight
            .as_deref()
            .map(Highlight::parse)
            .unwrap_or_default();

        let mut model = ModelBuilder::new()
            .with_highlight(highlight)
            .with_resources(resources)
            .build(&plan)
            .context("Failed to build step tree")?;

        if let Some(path) = &args.events {
            let file = File::open(path)
                .with_context(|| format!("Failed to open events {}", path.display()))?;
            let events =
                serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter::<BuildEvent>();

            let mut count = 0;
            for (n, event) in events.enumerate() {
                let event = event.with_context(|| format!("Malformed event #{}", n + 1))?;
                debug!("applying event #{}: {event:?}", n + 1);
                model
                    .apply_event(&event)
                    .with_context(|| format!("Failed to apply event #{}", n + 1))?;
                count += 1;
            }
            info!("Replayed {count} events");
        }

        match args.format {
            Format::Outline => Ok(render_outline(&model)),
            Format::Json => serde_json::to_string_pretty(&model)
                .map(|json| json + "\n")
                .context("Failed to serialize model"),
        }
    }

    /// Parses a highlight fragment and renders what it selects.
    pub fn fragment(text: &str) -> String {
        match Highlight::parse(text) {
            Highlight::None => "none".to_string(),
            highlight => highlight.to_fragment(),
        }
    }
}

fn render_outline(model: &Model) -> String {
    let mut out = Outline(model.tree()).to_string();
    let state = if model.is_finished() {
        "finished"
    } else {
        "running"
    };
    out.push_str(&format!("build: {state}\n"));
    if let Some(step_id) = model.highlight().step_id() {
        out.push_str(&format!("highlight: {} ({step_id})\n", model.highlight()));
    }
    out
}
