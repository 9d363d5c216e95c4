//! PNG line chart rasterizer.

use counter_core::error::{CounterError, Result};

use super::{ChartRenderer, Point};

const BACKGROUND: [u8; 3] = [255, 255, 255];
const AXIS: [u8; 3] = [64, 64, 64];
const GRID: [u8; 3] = [225, 225, 225];
const LINE: [u8; 3] = [31, 119, 180];
const GRID_LINES: u32 = 4;

/// Renders a time series as a PNG line chart (axes, horizontal grid,
/// polyline with point markers).
#[derive(Debug, Clone, Copy)]
pub struct PngLineChart {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl Default for PngLineChart {
    fn default() -> Self {
        Self { width: 800, height: 400, margin: 40 }
    }
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&BACKGROUND);
        }
        Self { width, height, pixels }
    }

    fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = ((y as usize) * self.width as usize + x as usize) * 3;
        self.pixels[i..i + 3].copy_from_slice(&rgb);
    }

    /// Bresenham.
    fn line(&mut self, (mut x0, mut y0): (i64, i64), (x1, y1): (i64, i64), rgb: [u8; 3]) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, rgb);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn marker(&mut self, (x, y): (i64, i64), rgb: [u8; 3]) {
        for dx in -1..=1 {
            for dy in -1..=1 {
                self.put(x + dx, y + dy, rgb);
            }
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let err = |e: png::EncodingError| CounterError::Internal(format!("png encode failed: {e}"));
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().map_err(err)?;
            writer.write_image_data(&self.pixels).map_err(err)?;
            writer.finish().map_err(err)?;
        }
        Ok(out)
    }
}

/// Value range with padding so flat series still get a visible line.
fn value_range(points: &[Point]) -> (f64, f64) {
    let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
        (lo.min(*v), hi.max(*v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        let pad = if lo.abs() > 1.0 { lo.abs() * 0.1 } else { 1.0 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

impl PngLineChart {
    fn plot(&self, points: &[Point]) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height);
        let m = self.margin.min(self.width / 4).min(self.height / 4) as i64;
        let (left, top) = (m, m);
        let (right, bottom) = (self.width as i64 - m, self.height as i64 - m);
        let plot_w = (right - left).max(1) as f64;
        let plot_h = (bottom - top).max(1) as f64;

        for i in 1..=GRID_LINES as i64 {
            let y = bottom - (i * (bottom - top)) / GRID_LINES as i64;
            canvas.line((left, y), (right, y), GRID);
        }
        canvas.line((left, top), (left, bottom), AXIS);
        canvas.line((left, bottom), (right, bottom), AXIS);

        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return canvas;
        };
        let t0 = first.0.and_utc().timestamp() as f64;
        let span = (last.0.and_utc().timestamp() as f64 - t0).max(0.0);
        let (lo, hi) = value_range(points);

        let project = |(t, v): &Point| -> (i64, i64) {
            let fx = if span > 0.0 { (t.and_utc().timestamp() as f64 - t0) / span } else { 0.5 };
            let fy = (v - lo) / (hi - lo);
            (
                left + (fx * plot_w).round() as i64,
                bottom - (fy * plot_h).round() as i64,
            )
        };

        let pixels: Vec<(i64, i64)> = points.iter().map(project).collect();
        for pair in pixels.windows(2) {
            canvas.line(pair[0], pair[1], LINE);
        }
        for p in &pixels {
            canvas.marker(*p, LINE);
        }
        canvas
    }
}

impl ChartRenderer for PngLineChart {
    fn content_type(&self) -> &'static str {
        "image/png"
    }

    fn render(&self, points: &[Point]) -> Result<Vec<u8>> {
        self.plot(points).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_core::timekey;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn points(values: &[(&str, f64)]) -> Vec<Point> {
        values.iter().map(|(k, v)| (timekey::parse(k).unwrap(), *v)).collect()
    }

    fn decoded_size(bytes: &[u8]) -> (u32, u32) {
        let reader = png::Decoder::new(std::io::Cursor::new(bytes)).read_info().unwrap();
        let info = reader.info();
        (info.width, info.height)
    }

    #[test]
    fn renders_valid_png() {
        let chart = PngLineChart::default();
        let bytes = chart
            .render(&points(&[("2024-01-01 10:00", 1.0), ("2024-01-01 10:05", 3.0), ("2024-01-01 10:07", 2.0)]))
            .unwrap();
        assert_eq!(bytes[..8], PNG_SIGNATURE);
        assert_eq!(decoded_size(&bytes), (800, 400));
    }

    #[test]
    fn empty_and_single_point_series_render() {
        let chart = PngLineChart { width: 120, height: 80, margin: 10 };
        assert_eq!(decoded_size(&chart.render(&[]).unwrap()), (120, 80));
        assert_eq!(decoded_size(&chart.render(&points(&[("2024-01-01 10:00", 5.0)])).unwrap()), (120, 80));
    }

    #[test]
    fn flat_series_gets_padding() {
        let (lo, hi) = value_range(&points(&[("2024-01-01 10:00", 5.0), ("2024-01-01 10:01", 5.0)]));
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn line_pixels_land_inside_plot() {
        let chart = PngLineChart { width: 100, height: 100, margin: 10 };
        let canvas = chart.plot(&points(&[("2024-01-01 10:00", 0.0), ("2024-01-01 10:10", 10.0)]));
        let px = |x: usize, y: usize| {
            let i = (y * 100 + x) * 3;
            [canvas.pixels[i], canvas.pixels[i + 1], canvas.pixels[i + 2]]
        };
        // line endpoints after 5% value padding: near bottom-left and top-right corners of the plot
        assert_eq!(px(10, 86), LINE);
        assert_eq!(px(90, 14), LINE);
    }
}
