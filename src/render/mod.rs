use crate::{
    config,
    types::{Rgb, Vec2},
};

/// A 2D drawing target. Coordinates are logical units with the origin at the
/// top-left corner; implementations map them onto their own resolution.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;
    /// Composite `color` over the whole surface with the given opacity.
    fn fade(&mut self, color: Rgb, alpha: f32);
    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb);
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgb);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgb, alpha: f32);
}

/// Information about the display that decides the render resolution.
#[derive(Clone, Copy, Debug)]
pub struct DeviceProfile {
    pub touch_primary: bool,
    pub pixel_ratio: f32,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            touch_primary: false,
            pixel_ratio: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderQuality {
    Full,
    Reduced,
}

impl RenderQuality {
    /// Made once at start-up; the loop never re-evaluates it.
    pub fn detect(profile: DeviceProfile) -> Self {
        if profile.touch_primary || profile.pixel_ratio > config::HIGH_DENSITY_PIXEL_RATIO {
            RenderQuality::Reduced
        } else {
            RenderQuality::Full
        }
    }

    pub fn factor(self) -> f32 {
        match self {
            RenderQuality::Full => 1.0,
            RenderQuality::Reduced => config::REDUCED_QUALITY,
        }
    }
}

/// Logical size of the drawing area plus how many raster pixels cover one unit.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub px_per_unit: f32,
}

impl Viewport {
    pub fn raster_size(&self) -> (u16, u16) {
        let w = (self.width * self.px_per_unit).round().clamp(0.0, u16::MAX as f32);
        let h = (self.height * self.px_per_unit).round().clamp(0.0, u16::MAX as f32);
        (w as u16, h as u16)
    }
}

const MAX_LINE_STEPS: usize = 4096;

/// RGB raster with source-over blending.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    px_per_unit: f32,
    pixels: Vec<Rgb>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            px_per_unit: 1.0,
            pixels: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn for_viewport(viewport: Viewport) -> Self {
        let mut buffer = Self::new(0, 0);
        buffer.fit(viewport);
        buffer
    }

    /// Matches the raster to `viewport`. A no-op when nothing changed, so the
    /// previous frame survives for the partial clear.
    pub fn fit(&mut self, viewport: Viewport) {
        let (w, h) = viewport.raster_size();
        self.px_per_unit = if viewport.px_per_unit > 0.0 {
            viewport.px_per_unit
        } else {
            1.0
        };
        if w != self.width || h != self.height {
            self.resize(w, h);
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.pixels.len() != len {
            self.pixels.resize(len, Rgb::BLACK);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        for px in &mut self.pixels {
            *px = Rgb::BLACK;
        }
    }

    pub fn raster_width(&self) -> u16 {
        self.width
    }

    pub fn raster_height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> Rgb {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[idx]
    }

    /// Nearest-neighbour lookup with `u`, `v` in `0.0..1.0`.
    pub fn sample(&self, u: f32, v: f32) -> Rgb {
        if self.width == 0 || self.height == 0 {
            return Rgb::BLACK;
        }
        let x = ((u * self.width as f32) as i32).clamp(0, self.width as i32 - 1);
        let y = ((v * self.height as f32) as i32).clamp(0, self.height as i32 - 1);
        self.get(x as u16, y as u16)
    }

    fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let px = &mut self.pixels[idx];
        *px = color.over(*px, alpha);
    }

    fn to_raster(&self, p: Vec2) -> Vec2 {
        p * self.px_per_unit
    }

    /// Shapes smaller than a pixel still light the pixel they land on, dimmed
    /// by how much of it they would cover.
    fn plot_point(&mut self, p: Vec2, raster_radius: f32, color: Rgb) {
        let alpha = (raster_radius * 2.0).clamp(0.35, 1.0);
        self.blend(p.x.floor() as i32, p.y.floor() as i32, color, alpha);
    }
}

impl Surface for FrameBuffer {
    fn width(&self) -> f32 {
        self.width as f32 / self.px_per_unit
    }

    fn height(&self) -> f32 {
        self.height as f32 / self.px_per_unit
    }

    fn fade(&mut self, color: Rgb, alpha: f32) {
        for px in &mut self.pixels {
            *px = color.over(*px, alpha);
        }
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb) {
        let c = self.to_raster(center);
        let r = radius * self.px_per_unit;
        if r < 0.5 {
            self.plot_point(c, r, color);
            return;
        }
        let r_sq = r * r;
        let x0 = (c.x - r).floor() as i32;
        let x1 = (c.x + r).ceil() as i32;
        let y0 = (c.y - r).floor() as i32;
        let y1 = (c.y + r).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - c;
                if d.length_sq() <= r_sq {
                    self.blend(x, y, color, 1.0);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgb) {
        if points.len() < 3 {
            return;
        }
        let raster: Vec<Vec2> = points.iter().map(|p| self.to_raster(*p)).collect();
        let (mut min, mut max) = (raster[0], raster[0]);
        let mut centroid = Vec2::ZERO;
        for p in &raster {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
            centroid += *p;
        }
        centroid = centroid * (1.0 / raster.len() as f32);

        let mut hit = false;
        for y in (min.y.floor() as i32)..=(max.y.ceil() as i32) {
            for x in (min.x.floor() as i32)..=(max.x.ceil() as i32) {
                if contains(&raster, Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.blend(x, y, color, 1.0);
                    hit = true;
                }
            }
        }
        if !hit {
            let radius = (max - min).length() * 0.5;
            self.plot_point(centroid, radius, color);
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgb, alpha: f32) {
        let a = self.to_raster(from);
        let b = self.to_raster(to);
        let delta = b - a;
        let steps = delta.x.abs().max(delta.y.abs()).ceil() as usize;
        let steps = steps.clamp(1, MAX_LINE_STEPS);
        let alpha = alpha * (width * self.px_per_unit).clamp(0.2, 1.0);
        let step = delta * (1.0 / steps as f32);
        let mut p = a;
        for _ in 0..=steps {
            self.blend(p.x.floor() as i32, p.y.floor() as i32, color, alpha);
            p += step;
        }
    }
}

/// Even-odd point-in-polygon test.
fn contains(poly: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}
