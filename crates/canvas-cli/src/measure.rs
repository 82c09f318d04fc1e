//! Terminal stand-in for the renderer's size measurements.
//!
//! Sizes are estimated from the text a node would display, and any node
//! whose estimate differs from its recorded size is reported back to the
//! canvas, just like a resize observer would.

use canvas_core::{Canvas, MeasureReport, Node, NodeId, NodeKind, Size, INPUT_PLACEHOLDER};

pub const NODE_WIDTH: f64 = 300.0;
const CHARS_PER_LINE: usize = 40;
const LINE_HEIGHT: f64 = 20.0;
const CHROME_HEIGHT: f64 = 40.0;
const INPUT_HEIGHT: f64 = 100.0;

fn wrapped_lines(text: &str) -> usize {
    let lines: usize = text
        .lines()
        .map(|line| line.chars().count().div_ceil(CHARS_PER_LINE).max(1))
        .sum();
    lines.max(1)
}

pub fn estimate_size(node: &Node) -> Size {
    match &node.kind {
        NodeKind::Message(data) => {
            let text = if data.is_loading { "..." } else { &data.content };
            Size::new(
                NODE_WIDTH,
                CHROME_HEIGHT + wrapped_lines(text) as f64 * LINE_HEIGHT,
            )
        }
        NodeKind::Input(data) => {
            let text = if data.draft.is_empty() {
                INPUT_PLACEHOLDER
            } else {
                &data.draft
            };
            let extra = wrapped_lines(text).saturating_sub(1) as f64 * LINE_HEIGHT;
            Size::new(NODE_WIDTH, INPUT_HEIGHT + extra)
        }
    }
}

/// Report every size that changed since the last pass. The canvas gets a
/// pass even when nothing changed so parked follow-up inputs can land.
pub fn remeasure(canvas: &mut Canvas) -> MeasureReport {
    let changes: Vec<(NodeId, Size)> = canvas
        .graph()
        .nodes()
        .iter()
        .filter_map(|node| {
            let size = estimate_size(node);
            (node.measured != Some(size)).then(|| (node.id.clone(), size))
        })
        .collect();

    if !changes.is_empty() {
        log::debug!("Measured {} node(s)", changes.len());
    }
    canvas.apply_measurements(&changes)
}
