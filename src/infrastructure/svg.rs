//! Typesetting and serialization of a [`PinLayout`] into an SVG document.

use std::borrow::Cow;

use crate::domain::layout::{
    CANVAS_BACKGROUND, PLACEHOLDER_FILL, PLACEHOLDER_LABEL, PLACEHOLDER_STYLE,
    PLACEHOLDER_TEXT_FILL, PinLayout, Rect, TEXT_FILL, TextBlock, TextStyle,
};
use crate::infrastructure::fonts::{FontAsset, FontSet};
use crate::infrastructure::images::EmbeddedImage;

/// A single line of text with its baseline position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
}

/// Break `text` into lines no wider than `max_width`, at whitespace.
/// A word that is wider than a whole line gets a line of its own.
pub fn wrap_lines(
    text: &str,
    font: &FontAsset,
    style: &TextStyle,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{current} {word}");
        if font.measure(&candidate, style) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap the title and subtitle and position every line inside the band.
pub fn typeset(layout: &PinLayout, fonts: &FontSet) -> (Vec<PlacedLine>, Vec<PlacedLine>) {
    let max_width = layout.max_line_width();
    let wrap = |block: &TextBlock| {
        wrap_lines(
            &block.text,
            fonts.for_role(block.style.role),
            &block.style,
            max_width,
        )
    };

    let title_lines = wrap(&layout.title);
    let subtitle_lines = layout.subtitle.as_ref().map(wrap).unwrap_or_default();
    let origins = layout.text_origins(title_lines.len(), subtitle_lines.len());

    let center = layout.text_area.center_x();
    let title = place(
        title_lines,
        fonts.for_role(layout.title.style.role),
        &layout.title.style,
        center,
        origins.title_top,
    );
    let subtitle = match (&layout.subtitle, origins.subtitle_top) {
        (Some(block), Some(top)) => place(
            subtitle_lines,
            fonts.for_role(block.style.role),
            &block.style,
            center,
            top,
        ),
        _ => Vec::new(),
    };

    (title, subtitle)
}

fn place(
    lines: Vec<String>,
    font: &FontAsset,
    style: &TextStyle,
    center: f32,
    top: f32,
) -> Vec<PlacedLine> {
    let baseline_offset = font.baseline_offset(style);
    let mut line_top = top;
    lines
        .into_iter()
        .map(|text| {
            let line = PlacedLine {
                text,
                x: center,
                baseline: line_top + baseline_offset,
            };
            line_top += style.line_box();
            line
        })
        .collect()
}

/// Serialize the pin as a standalone SVG document of exactly the canvas size.
///
/// `image` is `None` when the layout asks for the placeholder fill.
pub fn build_document(
    layout: &PinLayout,
    image: Option<&EmbeddedImage>,
    fonts: &FontSet,
) -> String {
    let (title_lines, subtitle_lines) = typeset(layout, fonts);
    let canvas = layout.canvas;
    let mut svg = String::with_capacity(4096 + image.map_or(0, |i| i.data.len() * 4 / 3));

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = canvas.width,
        h = canvas.height,
    ));

    let shadow = layout.image_shadow;
    svg.push_str(&format!(
        r##"<defs><clipPath id="canvas"><rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{r}" ry="{r}"/></clipPath><filter id="image-shadow" x="-10%" y="-10%" width="120%" height="120%"><feDropShadow dx="0" dy="{dy}" stdDeviation="{sd}" flood-color="#000000" flood-opacity="{op}"/></filter></defs>"##,
        x = canvas.x,
        y = canvas.y,
        w = canvas.width,
        h = canvas.height,
        r = layout.corner_radius,
        dy = shadow.offset_y,
        sd = shadow.blur / 2.0,
        op = shadow.opacity,
    ));

    svg.push_str(r#"<g clip-path="url(#canvas)">"#);
    push_rect(&mut svg, canvas, CANVAS_BACKGROUND, None);

    match image {
        Some(image) => {
            let area = layout.image;
            svg.push_str(&format!(
                r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice" filter="url(#image-shadow)" xlink:href="{}"/>"#,
                area.x,
                area.y,
                area.width,
                area.height,
                image.data_uri(),
            ));
        }
        None => push_placeholder(&mut svg, layout, fonts),
    }

    let color = layout.band_color;
    let opacity = (!color.is_opaque()).then(|| color.opacity());
    push_rect(&mut svg, layout.band, &color.rgb_hex(), opacity);

    push_lines(
        &mut svg,
        &title_lines,
        fonts.for_role(layout.title.style.role),
        &layout.title.style,
        TEXT_FILL,
    );
    if let Some(block) = &layout.subtitle {
        push_lines(
            &mut svg,
            &subtitle_lines,
            fonts.for_role(block.style.role),
            &block.style,
            TEXT_FILL,
        );
    }

    svg.push_str("</g></svg>");
    svg
}

fn push_rect(svg: &mut String, rect: Rect, fill: &str, opacity: Option<f32>) {
    svg.push_str(&format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}""#,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        escape_xml(fill),
    ));
    if let Some(opacity) = opacity {
        svg.push_str(&format!(r#" fill-opacity="{opacity}""#));
    }
    svg.push_str("/>");
}

fn push_placeholder(svg: &mut String, layout: &PinLayout, fonts: &FontSet) {
    push_rect(svg, layout.image, PLACEHOLDER_FILL, None);

    let style = PLACEHOLDER_STYLE;
    let font = fonts.for_role(style.role);
    let top = layout.image.center_y() - style.line_box() / 2.0;
    let line = PlacedLine {
        text: PLACEHOLDER_LABEL.to_string(),
        x: layout.image.center_x(),
        baseline: top + font.baseline_offset(&style),
    };
    push_lines(svg, &[line], font, &style, PLACEHOLDER_TEXT_FILL);
}

fn push_lines(
    svg: &mut String,
    lines: &[PlacedLine],
    font: &FontAsset,
    style: &TextStyle,
    fill: &str,
) {
    for line in lines {
        svg.push_str(&format!(
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="'{}'" font-weight="{}" font-size="{}" fill="{}""#,
            line.x,
            line.baseline,
            escape_xml(&font.family().replace('\'', "")),
            font.weight(),
            style.size,
            fill,
        ));
        if style.letter_spacing > 0.0 {
            svg.push_str(&format!(r#" letter-spacing="{}""#, style.letter_spacing));
        }
        if style.opacity < 1.0 {
            svg.push_str(&format!(r#" fill-opacity="{}""#, style.opacity));
        }
        svg.push_str(&format!(">{}</text>", escape_xml(&line.text)));
    }
}

/// Escape the five XML special characters and drop characters XML 1.0
/// does not allow in a document at all.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) && value.chars().all(is_xml_char) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for c in value.chars().filter(|&c| is_xml_char(c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// The XML 1.0 `Char` production. Surrogates cannot occur in a `char`.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}
