//! # Silhouette Rendering
//!
//! This module turns a [`Silhouette`] into pixels on any `embedded-graphics`
//! draw target, and provides the terminal sinks used by the command line
//! host. It is the only place that knows about colors; the core hands over
//! shapes tagged light or dark.
//!
//! Drawing follows the silhouette's layer order: the disc is filled with a
//! `Circle` primitive, then the terminator polygon is filled on top of it
//! with an even-odd scanline pass made of horizontal `Line`s.

use crate::animation::PhaseSink;
use crate::geometry::{Layer, Point2, Shade, Silhouette};
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
};
use serde::Serialize;
use std::io::Write;

/// Character for a lit pixel in ASCII output.
pub const LIGHT_CHAR: char = '#';
/// Character for a dark pixel in ASCII output.
pub const DARK_CHAR: char = '.';

fn shade_color(shade: Shade) -> BinaryColor {
    match shade {
        Shade::Light => BinaryColor::On,
        Shade::Dark => BinaryColor::Off,
    }
}

fn to_point(p: Point2) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

/// Draw every layer of `silhouette` onto `target`.
pub fn draw_silhouette<D>(target: &mut D, silhouette: &Silhouette) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    for layer in silhouette.layers() {
        match layer {
            Layer::Disc(disc) => {
                let diameter = (disc.radius * 2.0).round().max(0.0) as u32;
                Circle::with_center(to_point(disc.center), diameter)
                    .into_styled(PrimitiveStyle::with_fill(shade_color(disc.shade)))
                    .draw(target)?;
            }
            Layer::Terminator(terminator) => {
                fill_polygon(target, &terminator.points, shade_color(terminator.shade))?;
            }
        }
    }
    Ok(())
}

/// Even-odd scanline fill of a closed polygon.
///
/// A pixel is filled when its center lies inside the outline.
pub fn fill_polygon<D>(target: &mut D, points: &[Point2], color: BinaryColor) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if points.len() < 3 {
        return Ok(());
    }

    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p.y), max.max(p.y))
        });

    let style = PrimitiveStyle::with_stroke(color, 1);
    let mut crossings = Vec::new();

    for row in (min_y.floor() as i32)..=(max_y.ceil() as i32) {
        let sample_y = row as f64 + 0.5;
        crossings.clear();

        for (i, a) in points.iter().enumerate() {
            let b = &points[(i + 1) % points.len()];
            let spans_row = (a.y <= sample_y && b.y > sample_y) || (b.y <= sample_y && a.y > sample_y);
            if spans_row {
                crossings.push(a.x + (sample_y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil() as i32;
            let end = (span[1] - 0.5).floor() as i32;
            if start <= end {
                Line::new(Point::new(start, row), Point::new(end, row))
                    .into_styled(style)
                    .draw(target)?;
            }
        }
    }
    Ok(())
}

/// Largest canvas side, in pixels. Bigger requests are clamped.
pub const MAX_CANVAS_SIDE: u32 = 1024;

/// In-memory draw target that renders to text.
///
/// Each pixel becomes two characters so the moon keeps its aspect ratio in
/// a terminal. Pixels nothing was drawn on stay blank.
#[derive(Debug, Clone)]
pub struct AsciiCanvas {
    width: u32,
    height: u32,
    cells: Vec<Option<BinaryColor>>,
}

impl AsciiCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(MAX_CANVAS_SIDE);
        let height = height.min(MAX_CANVAS_SIDE);
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x < self.width && y < self.height {
            self.cells[self.index(x, y)]
        } else {
            None
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Count of pixels drawn in `color`.
    pub fn count(&self, color: BinaryColor) -> usize {
        self.cells.iter().filter(|c| **c == Some(color)).count()
    }

    pub fn render(&self) -> String {
        let mut out =
            String::with_capacity((self.width as usize * 2 + 1) * self.height as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            let line: String = row
                .iter()
                .flat_map(|cell| {
                    let ch = match cell {
                        Some(BinaryColor::On) => LIGHT_CHAR,
                        Some(BinaryColor::Off) => DARK_CHAR,
                        None => ' ',
                    };
                    [ch, ch]
                })
                .collect();
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl OriginDimensions for AsciiCanvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for AsciiCanvas {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < self.width
                && (point.y as u32) < self.height
            {
                let index = self.index(point.x as u32, point.y as u32);
                self.cells[index] = Some(color);
            }
        }
        Ok(())
    }
}

/// Render one silhouette to a fresh ASCII canvas.
pub fn draw_ascii(silhouette: &Silhouette, width: u32, height: u32) -> AsciiCanvas {
    let mut canvas = AsciiCanvas::new(width, height);
    // Infallible target.
    let _ = draw_silhouette(&mut canvas, silhouette);
    canvas
}

/// Writes status lines and ASCII frames to a terminal.
pub struct TerminalSink<W: Write> {
    out: W,
    width: u32,
    height: u32,
    clear_screen: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, width: u32, height: u32) -> Self {
        Self {
            out,
            width,
            height,
            clear_screen: false,
        }
    }

    /// Home the cursor and clear before each status line, for animation.
    pub fn clearing(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PhaseSink for TerminalSink<W> {
    fn draw(&mut self, silhouette: &Silhouette) {
        let canvas = draw_ascii(silhouette, self.width, self.height);
        if let Err(e) = self.out.write_all(canvas.render().as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("terminal write failed: {}", e);
        }
    }

    fn status(&mut self, text: &str) {
        let prefix = if self.clear_screen { "\x1b[2J\x1b[H" } else { "" };
        if let Err(e) = writeln!(self.out, "{prefix}{text}") {
            tracing::warn!("terminal write failed: {}", e);
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum JsonEvent<'a> {
    Status { text: &'a str },
    Frame(&'a Silhouette),
}

/// Writes one JSON object per line: status events and silhouette frames.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: &JsonEvent<'_>) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(e) = written {
            tracing::warn!("json write failed: {}", e);
        }
    }
}

impl<W: Write> PhaseSink for JsonSink<W> {
    fn draw(&mut self, silhouette: &Silhouette) {
        self.emit(&JsonEvent::Frame(silhouette));
    }

    fn status(&mut self, text: &str) {
        self.emit(&JsonEvent::Status { text });
    }
}
