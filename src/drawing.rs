extern crate ab_glyph;
extern crate image;
extern crate imageproc;

use anyhow::Context;

use crate::display::Color;
use crate::layout::DrawOp;
use crate::result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

// Text measuring and drawing. Layout only ever asks for widths; the
// rasterizer draws.
pub trait Glyphs {
    fn text_width(&self, face: Face, size: f32, text: &str) -> i32;
    fn draw_text(&self, imgbuf: &mut image::GrayImage, color: image::Luma<u8>,
                 x: i32, y: i32, face: Face, size: f32, text: &str);
}

pub struct Styles {
    pub font: ab_glyph::FontVec,
    pub font_bold: ab_glyph::FontVec,
}

impl Styles {
    // Each list is tried in order; the first file that loads as a font wins.
    pub fn load(regular_candidates: &[String], bold_candidates: &[String]) -> result::MetroResult<Styles> {
        let font = load_first_font(regular_candidates)
            .context("no usable regular font")?;
        let font_bold = load_first_font(bold_candidates)
            .context("no usable bold font")?;
        return Ok(Styles {
            font: font,
            font_bold: font_bold,
        });
    }

    fn font(&self, face: Face) -> &ab_glyph::FontVec {
        match face {
            Face::Regular => return &self.font,
            Face::Bold => return &self.font_bold,
        }
    }
}

fn load_first_font(candidates: &[String]) -> result::MetroResult<ab_glyph::FontVec> {
    for path in candidates {
        match std::fs::read(path) {
            Err(err) => debug!("Skipping font {}: {}", path, err),
            Ok(bytes) => match ab_glyph::FontVec::try_from_vec(bytes) {
                Err(err) => warn!("Skipping font {}: {}", path, err),
                Ok(font) => {
                    info!("Using font {}", path);
                    return Ok(font);
                },
            },
        }
    }
    return Err(result::make_error(&format!("none of {:?} could be loaded", candidates)));
}

impl Glyphs for Styles {
    fn text_width(&self, face: Face, size: f32, text: &str) -> i32 {
        let (width, _) = imageproc::drawing::text_size(scale(size), self.font(face), text);
        return width as i32;
    }

    fn draw_text(&self, imgbuf: &mut image::GrayImage, color: image::Luma<u8>,
                 x: i32, y: i32, face: Face, size: f32, text: &str) {
        imageproc::drawing::draw_text_mut(imgbuf, color, x, y, scale(size), self.font(face), text);
    }
}

fn scale(s: f32) -> ab_glyph::PxScale {
    return ab_glyph::PxScale { x: s, y: s };
}

// Turns positioned draw ops into a white-background frame. Starts from a
// fresh buffer every time, so equal ops give equal bytes.
pub fn rasterize(ops: &[DrawOp], width: u32, height: u32, glyphs: &dyn Glyphs) -> image::GrayImage {
    let ink = Color::Black.luma();
    let mut imgbuf = image::GrayImage::from_pixel(width, height, Color::White.luma());

    for op in ops {
        match *op {
            DrawOp::Text { x, y, ref content, face, size } => {
                glyphs.draw_text(&mut imgbuf, ink, x, y, face, size, content);
            },
            DrawOp::Line { x0, y0, x1, y1 } => {
                imageproc::drawing::draw_line_segment_mut(
                    &mut imgbuf, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), ink);
            },
            DrawOp::Rect { x, y, w, h, filled } => {
                // imageproc refuses empty rects
                if w == 0 || h == 0 {
                    continue;
                }
                let rect = imageproc::rect::Rect::at(x, y).of_size(w, h);
                if filled {
                    imageproc::drawing::draw_filled_rect_mut(&mut imgbuf, rect, ink);
                } else {
                    imageproc::drawing::draw_hollow_rect_mut(&mut imgbuf, rect, ink);
                }
            },
        }
    }

    return imgbuf;
}

// Fixed-pitch stand-in font: every glyph is a solid block `size / 2` wide.
#[cfg(test)]
pub struct BlockGlyphs;

#[cfg(test)]
impl BlockGlyphs {
    pub fn advance(face: Face, size: f32) -> i32 {
        let base = (size / 2.0).round() as i32;
        match face {
            Face::Regular => return base,
            Face::Bold => return base + 1,
        }
    }
}

#[cfg(test)]
impl Glyphs for BlockGlyphs {
    fn text_width(&self, face: Face, size: f32, text: &str) -> i32 {
        return BlockGlyphs::advance(face, size) * text.chars().count() as i32;
    }

    fn draw_text(&self, imgbuf: &mut image::GrayImage, color: image::Luma<u8>,
                 x: i32, y: i32, face: Face, size: f32, text: &str) {
        let advance = BlockGlyphs::advance(face, size);
        for (i, c) in text.chars().enumerate() {
            if c == ' ' || advance < 2 {
                continue;
            }
            let rect = imageproc::rect::Rect::at(x + i as i32 * advance, y)
                .of_size((advance - 1) as u32, std::cmp::max(3, size as u32) - 2);
            imageproc::drawing::draw_filled_rect_mut(imgbuf, rect, color);
        }
    }
}
