use crate::renderer::{Action, ChoroplethRenderer, ViewState};
use crate::scroller::{Direction, Scroller};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SWATCH: f64 = 20.0;
const LEGEND_X: f64 = 12.0;
const LEGEND_Y: f64 = 48.0;
const LEGEND_ROW: f64 = 26.0;

/// One step entry and the map it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub step: usize,
    pub direction: Direction,
    pub text: String,
    pub action: Action,
    pub view: ViewState,
}

/// Scrolls through the whole story top to bottom, rendering every step that
/// gets entered on the way.
pub fn collect_frames(renderer: &ChoroplethRenderer, scroller: &mut Scroller) -> Vec<Frame> {
    let mut frames = Vec::new();
    for index in 0..scroller.steps().len() {
        let Some(scroll_top) = scroller.scroll_target_for(index) else {
            continue;
        };
        let Some(enter) = scroller.scroll_to(scroll_top) else {
            warn!("Step {} was not entered at scroll position {}", index, scroll_top);
            continue;
        };
        debug!("Step {} -> {:?}", enter.index, enter.action);
        frames.push(Frame {
            step: enter.index,
            direction: enter.direction,
            text: scroller.steps()[enter.index].text.clone(),
            view: renderer.dispatch(&enter.action),
            action: enter.action,
        });
    }
    frames
}

/// Writes `step-NN.svg` per frame plus a `story.json` manifest into `dir`.
pub fn write_story(dir: &Path, renderer: &ChoroplethRenderer, frames: &[Frame]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    info!("Writing {} step snapshots to {:?}", frames.len(), dir);
    let mut written: Vec<PathBuf> = frames
        .par_iter()
        .map(|frame| {
            let path = dir.join(format!("step-{:02}.svg", frame.step));
            let svg = render_svg(renderer, &frame.view);
            fs::write(&path, svg)
                .with_context(|| format!("Failed to write snapshot: {:?}", path))?;
            Ok(path)
        })
        .collect::<Result<_>>()?;

    let manifest = dir.join("story.json");
    let json = serde_json::to_string_pretty(frames).context("Failed to serialize story manifest")?;
    fs::write(&manifest, json)
        .with_context(|| format!("Failed to write manifest: {:?}", manifest))?;
    written.push(manifest);

    Ok(written)
}

/// Standalone SVG document for one view state.
pub fn render_svg(renderer: &ChoroplethRenderer, view: &ViewState) -> String {
    let (width, height) = renderer.size();
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height
    );

    let _ = writeln!(out, r#"  <g class="regions">"#);
    for ((d, style), region) in renderer
        .paths()
        .iter()
        .zip(&view.regions)
        .zip(renderer.regions().iter())
    {
        if d.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            r#"    <path data-region="{}" d="{}" fill="{}" stroke="{}" stroke-width="{}" style="transition: fill {}ms"/>"#,
            escape(&region.label),
            d,
            style.fill.to_hex(),
            style.stroke.to_hex(),
            style.stroke_width,
            view.transition_ms
        );
    }
    let _ = writeln!(out, "  </g>");

    let visibility = if view.title.visible { "visible" } else { "hidden" };
    let _ = writeln!(
        out,
        r#"  <text id="map-title" x="{}" y="28" text-anchor="middle" font-size="20" visibility="{}">{}</text>"#,
        width / 2.0,
        visibility,
        escape(&view.title.text)
    );

    if let Some(legend) = view.legend.as_ref().filter(|l| !l.is_empty()) {
        let _ = writeln!(out, r#"  <g id="legend" font-size="12">"#);
        let _ = writeln!(
            out,
            r#"    <text x="{}" y="{}">{}</text>"#,
            LEGEND_X,
            LEGEND_Y,
            escape(&legend.heading)
        );
        for (i, row) in legend.rows.iter().enumerate() {
            let y = LEGEND_Y + 8.0 + i as f64 * LEGEND_ROW;
            let _ = writeln!(
                out,
                r#"    <rect x="{}" y="{}" width="{s}" height="{s}" fill="{}"/>"#,
                LEGEND_X,
                y,
                row.color.to_hex(),
                s = SWATCH
            );
            let _ = writeln!(
                out,
                r#"    <text x="{}" y="{}">{}</text>"#,
                LEGEND_X + SWATCH + 5.0,
                y + 15.0,
                escape(&row.label)
            );
        }
        let _ = writeln!(out, "  </g>");
    }

    out.push_str("</svg>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
