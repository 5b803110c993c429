//! Deterministic certificate rasterization.
//!
//! The certificate view is a fixed-aspect template (a PNG background, or a
//! synthesized parchment when none is configured) with text composited at
//! relative anchors: holder name, peak name, elevation + coordinates,
//! date, and signature. Rendering produces a PNG artifact on disk.
//!
//! Text is drawn with a built-in scaled 5×7 bitmap font so output does not
//! depend on system font installation and renders identically everywhere.
//!
//! Rendering is debounced: `RenderScheduler` arms a short deadline when
//! the certificate context resolves and re-arms only when the render
//! fingerprint (coordinates, photo, elevation) changes, so the artifact is
//! recomputed rather than duplicated.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

use super::Certificate;

/// Artifact file name inside the output directory.
const ARTIFACT_FILE_NAME: &str = "certificate.png";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load certificate template {}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write certificate artifact {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to prepare artifact directory")]
    Io(#[from] std::io::Error),
}

// ── Layout ──────────────────────────────────────────────────────────────────

/// Relative-position anchors on the certificate template.
///
/// Vertical positions are fractions of the template height; the date sits
/// at a left margin and the signature at a right margin, both fractions of
/// the width. Text scales are glyph pixel multipliers.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub name_y: f64,
    pub peak_y: f64,
    pub details_y: f64,
    pub date_y: f64,
    pub date_x: f64,
    pub signature_y: f64,
    pub signature_right_x: f64,
    /// Signature line content.
    pub signature_text: String,
    pub name_scale: u32,
    pub peak_scale: u32,
    pub details_scale: u32,
    pub date_scale: u32,
    pub signature_scale: u32,
    pub name_color: Rgb<u8>,
    pub peak_color: Rgb<u8>,
    pub details_color: Rgb<u8>,
    pub date_color: Rgb<u8>,
    pub signature_color: Rgb<u8>,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            name_y: 0.68,
            peak_y: 0.80,
            details_y: 0.85,
            date_y: 0.94,
            date_x: 0.105,
            signature_y: 0.945,
            signature_right_x: 0.066,
            signature_text: "Summiter".to_string(),
            name_scale: 9,
            peak_scale: 7,
            details_scale: 5,
            date_scale: 5,
            signature_scale: 6,
            name_color: Rgb([0x02, 0x43, 0x73]),
            peak_color: Rgb([0x02, 0x3a, 0x76]),
            details_color: Rgb([0x02, 0x2e, 0x66]),
            date_color: Rgb([0x02, 0x2e, 0x66]),
            signature_color: Rgb([0x07, 0x2a, 0x53]),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Raster width in pixels. Height follows the template's fixed aspect.
    pub width: u32,
    pub height: u32,
    /// Background template image. `None` synthesizes a parchment.
    pub template_path: Option<PathBuf>,
    /// Directory the PNG artifact is written into.
    pub output_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 760,
            height: 1277,
            template_path: None,
            output_dir: PathBuf::from("."),
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

/// Rasterize the certificate into a PNG artifact and return its path.
pub fn render_certificate(
    certificate: &Certificate,
    layout: &TemplateLayout,
    config: &RenderConfig,
) -> Result<PathBuf, RenderError> {
    let mut canvas = load_background(config)?;
    let (w, h) = (config.width, config.height);

    let name = certificate.holder_name.to_uppercase();
    let peak = certificate.peak_name.to_uppercase();
    let details = certificate.details_line();
    let date = certificate.formatted_date();

    draw_text(
        &mut canvas,
        &name,
        (w / 2) as i64,
        (layout.name_y * h as f64) as i64,
        layout.name_scale,
        layout.name_color,
        HAlign::Center,
    );
    draw_text(
        &mut canvas,
        &peak,
        (w / 2) as i64,
        (layout.peak_y * h as f64) as i64,
        layout.peak_scale,
        layout.peak_color,
        HAlign::Center,
    );
    draw_text(
        &mut canvas,
        &details,
        (w / 2) as i64,
        (layout.details_y * h as f64) as i64,
        layout.details_scale,
        layout.details_color,
        HAlign::Center,
    );
    draw_text(
        &mut canvas,
        &date,
        (layout.date_x * w as f64) as i64,
        (layout.date_y * h as f64) as i64,
        layout.date_scale,
        layout.date_color,
        HAlign::Left,
    );
    draw_text(
        &mut canvas,
        &layout.signature_text,
        (w as f64 * (1.0 - layout.signature_right_x)) as i64,
        (layout.signature_y * h as f64) as i64,
        layout.signature_scale,
        layout.signature_color,
        HAlign::Right,
    );

    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(ARTIFACT_FILE_NAME);
    canvas.save(&path).map_err(|source| RenderError::Encode {
        path: path.clone(),
        source,
    })?;
    debug!("rendered certificate artifact to {}", path.display());
    Ok(path)
}

fn load_background(config: &RenderConfig) -> Result<RgbImage, RenderError> {
    match &config.template_path {
        Some(path) => {
            let img = image::open(path)
                .map_err(|source| RenderError::Template {
                    path: path.clone(),
                    source,
                })?
                .to_rgb8();
            if img.dimensions() == (config.width, config.height) {
                Ok(img)
            } else {
                Ok(image::imageops::resize(
                    &img,
                    config.width,
                    config.height,
                    FilterType::Triangle,
                ))
            }
        }
        None => Ok(parchment_background(config.width, config.height)),
    }
}

/// Cream background with a navy double border, standing in for the shipped
/// template asset.
fn parchment_background(width: u32, height: u32) -> RgbImage {
    let cream = Rgb([0xf7, 0xf2, 0xe4]);
    let navy = Rgb([0x1e, 0x3c, 0x72]);
    let mut img = RgbImage::from_pixel(width, height, cream);

    let outer = (width.min(height) / 40).max(4);
    let inner = outer + (outer / 2).max(2);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let dx = x.min(width - 1 - x);
        let dy = y.min(height - 1 - y);
        let d = dx.min(dy);
        if d < outer || d == inner {
            *px = navy;
        }
    }
    img
}

// ── Debounced render scheduling ─────────────────────────────────────────────

/// Fingerprint of the inputs the rendered artifact depends on.
pub fn render_fingerprint(certificate: &Certificate) -> u64 {
    let mut hasher = DefaultHasher::new();
    certificate.coordinate.latitude.to_bits().hash(&mut hasher);
    certificate.coordinate.longitude.to_bits().hash(&mut hasher);
    certificate.elevation_feet.hash(&mut hasher);
    certificate.photo_uri.hash(&mut hasher);
    certificate.holder_name.hash(&mut hasher);
    certificate.peak_name.hash(&mut hasher);
    hasher.finish()
}

/// Debounces automatic rasterization after context resolution.
///
/// `schedule` arms the deadline; `should_render` reports (once) when the
/// deadline has passed and the certificate actually changed since the last
/// render. Manual renders can bypass the scheduler entirely.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    debounce: Duration,
    due: Option<Instant>,
    rendered: Option<u64>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl RenderScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            due: None,
            rendered: None,
        }
    }

    /// Arm (or re-arm) the debounce deadline.
    pub fn schedule(&mut self, now: Instant) {
        self.due = Some(now + self.debounce);
    }

    /// Cancel any pending deadline, e.g. on view teardown.
    pub fn cancel(&mut self) {
        self.due = None;
    }

    /// True exactly once per armed deadline, once it has elapsed and the
    /// certificate differs from what was last rendered.
    pub fn should_render(&mut self, certificate: &Certificate, now: Instant) -> bool {
        match self.due {
            Some(deadline) if now >= deadline => {
                self.due = None;
                self.rendered != Some(render_fingerprint(certificate))
            }
            _ => false,
        }
    }

    /// Record the state of the certificate that was just rasterized.
    pub fn mark_rendered(&mut self, certificate: &Certificate) {
        self.rendered = Some(render_fingerprint(certificate));
    }
}

// ── Bitmap text ─────────────────────────────────────────────────────────────

const GLYPH_HEIGHT: usize = 7;
const SPACE_WIDTH: u32 = 3;

#[derive(Clone, Copy)]
struct Glyph {
    width: u8,
    rows: [u8; GLYPH_HEIGHT],
}

#[derive(Clone, Copy, PartialEq)]
enum HAlign {
    Left,
    Center,
    Right,
}

/// Pixel width of a text run at the given scale.
fn text_width(text: &str, scale: u32) -> u32 {
    let mut w = 0;
    for ch in text.chars() {
        w += match glyph(ch) {
            Some(g) => (g.width as u32 + 1) * scale,
            None => (SPACE_WIDTH + 1) * scale,
        };
    }
    w.saturating_sub(scale)
}

fn draw_text(img: &mut RgbImage, text: &str, x: i64, y: i64, scale: u32, color: Rgb<u8>, align: HAlign) {
    let width = text_width(text, scale) as i64;
    let mut cursor = match align {
        HAlign::Left => x,
        HAlign::Center => x - width / 2,
        HAlign::Right => x - width,
    };
    // y anchors the vertical center of the glyph row
    let top = y - (GLYPH_HEIGHT as i64 * scale as i64) / 2;

    for ch in text.chars() {
        let Some(g) = glyph(ch) else {
            cursor += ((SPACE_WIDTH + 1) * scale) as i64;
            continue;
        };
        for (row, pattern) in g.rows.iter().enumerate() {
            for col in 0..g.width {
                if pattern & (1 << (g.width - 1 - col)) != 0 {
                    fill_block(
                        img,
                        cursor + col as i64 * scale as i64,
                        top + row as i64 * scale as i64,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor += ((g.width as u32 + 1) * scale) as i64;
    }
}

fn fill_block(img: &mut RgbImage, x: i64, y: i64, scale: u32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for dx in 0..scale as i64 {
        for dy in 0..scale as i64 {
            let px = x + dx;
            let py = y + dy;
            if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn glyph(ch: char) -> Option<Glyph> {
    let upper = ch.to_ascii_uppercase();
    Some(match upper {
        'A' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
            ],
        },
        'B' => Glyph {
            width: 5,
            rows: [
                0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110,
            ],
        },
        'C' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110,
            ],
        },
        'D' => Glyph {
            width: 5,
            rows: [
                0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100,
            ],
        },
        'E' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111,
            ],
        },
        'F' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000,
            ],
        },
        'G' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111,
            ],
        },
        'H' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001,
            ],
        },
        'I' => Glyph {
            width: 3,
            rows: [0b111, 0b010, 0b010, 0b010, 0b010, 0b010, 0b111],
        },
        'J' => Glyph {
            width: 5,
            rows: [
                0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100,
            ],
        },
        'K' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001,
            ],
        },
        'L' => Glyph {
            width: 5,
            rows: [
                0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111,
            ],
        },
        'M' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b10001, 0b10001,
            ],
        },
        'N' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001,
            ],
        },
        'O' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110,
            ],
        },
        'P' => Glyph {
            width: 5,
            rows: [
                0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000,
            ],
        },
        'Q' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101,
            ],
        },
        'R' => Glyph {
            width: 5,
            rows: [
                0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001,
            ],
        },
        'S' => Glyph {
            width: 5,
            rows: [
                0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110,
            ],
        },
        'T' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100,
            ],
        },
        'U' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110,
            ],
        },
        'V' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100,
            ],
        },
        'W' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10001, 0b10001, 0b10001, 0b10101, 0b11011, 0b10001,
            ],
        },
        'X' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b01010, 0b10001,
            ],
        },
        'Y' => Glyph {
            width: 5,
            rows: [
                0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100,
            ],
        },
        'Z' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111,
            ],
        },
        '0' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
            ],
        },
        '1' => Glyph {
            width: 3,
            rows: [0b010, 0b110, 0b010, 0b010, 0b010, 0b010, 0b111],
        },
        '2' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
            ],
        },
        '3' => Glyph {
            width: 5,
            rows: [
                0b11110, 0b00001, 0b00001, 0b00110, 0b00001, 0b00001, 0b11110,
            ],
        },
        '4' => Glyph {
            width: 5,
            rows: [
                0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
            ],
        },
        '5' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
            ],
        },
        '6' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
            ],
        },
        '7' => Glyph {
            width: 5,
            rows: [
                0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
            ],
        },
        '8' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
            ],
        },
        '9' => Glyph {
            width: 5,
            rows: [
                0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b10001, 0b01110,
            ],
        },
        '-' => Glyph {
            width: 3,
            rows: [0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000],
        },
        '/' => Glyph {
            width: 3,
            rows: [0b001, 0b001, 0b010, 0b010, 0b100, 0b100, 0b100],
        },
        '(' => Glyph {
            width: 3,
            rows: [0b001, 0b010, 0b100, 0b100, 0b100, 0b010, 0b001],
        },
        ')' => Glyph {
            width: 3,
            rows: [0b100, 0b010, 0b001, 0b001, 0b001, 0b010, 0b100],
        },
        ':' => Glyph {
            width: 1,
            rows: [0b0, 0b1, 0b0, 0b0, 0b0, 0b1, 0b0],
        },
        '.' => Glyph {
            width: 1,
            rows: [0b0, 0b0, 0b0, 0b0, 0b0, 0b0, 0b1],
        },
        ',' => Glyph {
            width: 2,
            rows: [0b00, 0b00, 0b00, 0b00, 0b00, 0b01, 0b10],
        },
        '|' => Glyph {
            width: 1,
            rows: [0b1, 0b1, 0b1, 0b1, 0b1, 0b1, 0b1],
        },
        '!' => Glyph {
            width: 1,
            rows: [0b1, 0b1, 0b1, 0b1, 0b1, 0b0, 0b1],
        },
        _ => return None,
    })
}
