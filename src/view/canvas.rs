//! Shared render canvas
//!
//! One ARGB pixel buffer sized to the viewport. Never resized in place:
//! a size change means a new canvas.

use std::fmt;

use super::types::{Color, RectF};

/// Integer pixel rectangle clipped to a canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Canvas {
    /// Allocate a canvas filled with `background`
    #[must_use]
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![background.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .map(Color)
    }

    /// Clip a device rectangle to the canvas
    pub fn clip(&self, rect: &RectF) -> Option<PixelRect> {
        if ![rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return None;
        }
        let x0 = rect.x.floor().max(0.0);
        let y0 = rect.y.floor().max(0.0);
        let x1 = rect.right().ceil().min(self.width as f32);
        let y1 = rect.bottom().ceil().min(self.height as f32);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(PixelRect {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color.0);
    }

    /// Fill part of the canvas; the rectangle is clipped first
    pub fn fill_rect(&mut self, rect: &RectF, color: Color) {
        let Some(area) = self.clip(rect) else {
            return;
        };
        let stride = self.width as usize;
        for y in area.y..area.bottom() {
            let row = y as usize * stride;
            self.pixels[row + area.x as usize..row + area.right() as usize].fill(color.0);
        }
    }
}
