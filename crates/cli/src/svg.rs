//! SVG adapter for a [`Blueprint2D`] scene layer.

use std::fmt::{self, Write as _};

use anyhow::{anyhow, Context, Result};
use construye_engine::{Blueprint2D, OpeningKind, Primitive, SceneLayer};

/// 1 m at 1:100 on a 96 dpi screen
pub const PX_PER_M: f64 = 37.8;
const MARGIN: f64 = 40.0;
const DOOR_STROKE: &str = "#92400e";
const WINDOW_STROKE: &str = "#0284c7";

fn px(metres: f64) -> f64 {
    (metres * PX_PER_M * 10.0).round() / 10.0 + MARGIN
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Draws one floor of the plan with labels, openings and a north arrow.
pub fn render_floor(plan: &Blueprint2D, floor_index: u32) -> Result<String> {
    let layer = plan.layer(floor_index).ok_or_else(|| {
        let floors: Vec<String> = plan
            .scene
            .iter()
            .map(|layer| layer.floor_index.to_string())
            .collect();
        anyhow!(
            "floor {floor_index} has no rooms (available: {})",
            floors.join(", ")
        )
    })?;

    let (max_x, max_y) = layer
        .primitives
        .iter()
        .filter_map(|primitive| match primitive {
            Primitive::Rect {
                x, y, width, height, ..
            } => Some((x + width, y + height)),
            _ => None,
        })
        .fold((0.0_f64, 0.0_f64), |(mx, my), (x, y)| (mx.max(x), my.max(y)));
    let canvas_w = px(max_x) + MARGIN + 60.0;
    let canvas_h = px(max_y) + MARGIN;

    let mut out = String::new();
    write_layer(&mut out, plan, layer, floor_index, (canvas_w, canvas_h))
        .with_context(|| format!("Failed to format SVG for floor {floor_index}"))?;
    Ok(out)
}

fn write_layer(
    out: &mut String,
    plan: &Blueprint2D,
    layer: &SceneLayer,
    floor_index: u32,
    (canvas_w, canvas_h): (f64, f64),
) -> fmt::Result {
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{canvas_w}" height="{canvas_h}" viewBox="0 0 {canvas_w} {canvas_h}" font-family="sans-serif">"#
    )?;
    writeln!(
        out,
        r#"  <title>Planta {} (escala {})</title>"#,
        floor_index + 1,
        escape(&plan.scale)
    )?;
    for primitive in &layer.primitives {
        match primitive {
            Primitive::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
                interaction_key,
            } => writeln!(
                out,
                r#"  <rect x="{}" y="{}" width="{:.1}" height="{:.1}" fill="{}" stroke="{}" stroke-width="2" data-room="{}"/>"#,
                px(*x),
                px(*y),
                width * PX_PER_M,
                height * PX_PER_M,
                escape(fill),
                escape(stroke),
                escape(interaction_key)
            )?,
            Primitive::Label { x, y, text, detail } => writeln!(
                out,
                r#"  <text x="{cx}" y="{cy}" text-anchor="middle" font-size="12"><tspan x="{cx}" dy="-0.2em" font-weight="bold">{}</tspan><tspan x="{cx}" dy="1.2em">{}</tspan></text>"#,
                escape(text),
                escape(detail),
                cx = px(*x),
                cy = px(*y),
            )?,
            Primitive::Opening {
                opening,
                x1,
                x2,
                y,
            } => {
                let stroke = match opening {
                    OpeningKind::Door => DOOR_STROKE,
                    OpeningKind::Window => WINDOW_STROKE,
                };
                writeln!(
                    out,
                    r#"  <line x1="{}" y1="{py}" x2="{}" y2="{py}" stroke="{stroke}" stroke-width="4"/>"#,
                    px(*x1),
                    px(*x2),
                    py = px(*y),
                )?;
            }
        }
    }

    let arrow_x = canvas_w - 30.0;
    writeln!(
        out,
        r##"  <g transform="translate({arrow_x} 30) rotate({})"><polygon points="0,-18 7,8 0,3 -7,8" fill="#1f2937"/><text y="-22" text-anchor="middle" font-size="12">N</text></g>"##,
        plan.orientation.north_rotation_deg
    )?;
    out.push_str("</svg>\n");
    Ok(())
}
