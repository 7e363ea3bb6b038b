//! Horizontal scale and scroll state of the trace panel.
//!
//! Positions are measured in "pixels", which for the terminal front end are
//! cell columns of the trace panel. `scale` is pixels per sample.

/// Direction for edge auto-scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Left,
    Right,
}

/// Scale/scroll state and pixel/sample mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Pixels per sample.
    scale: f64,
    /// Pixels scrolled from the first sample.
    scroll_offset: f64,
    /// Visible width in pixels.
    width: f64,
    /// Number of samples in the trace.
    total_samples: usize,
    min_scale: f64,
    max_scale: f64,
    /// Max pixel distance for resolving a base under passive hover.
    hover_threshold: f64,
    /// Max pixel distance for resolving a base while dragging.
    drag_threshold: f64,
}

impl Viewport {
    pub fn new(min_scale: f64, max_scale: f64, hover_threshold: f64, drag_threshold: f64) -> Self {
        Self {
            scale: 1.0f64.clamp(min_scale, max_scale),
            scroll_offset: 0.0,
            width: 0.0,
            total_samples: 0,
            min_scale,
            max_scale,
            hover_threshold,
            drag_threshold,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    pub fn data_to_pixel(&self, sample: f64) -> f64 {
        sample * self.scale - self.scroll_offset
    }

    pub fn pixel_to_data(&self, pixel: f64) -> f64 {
        (pixel + self.scroll_offset) / self.scale
    }

    /// First and last (fractional) sample index on screen.
    pub fn visible_samples(&self) -> (f64, f64) {
        (self.pixel_to_data(0.0), self.pixel_to_data(self.width))
    }

    fn max_scroll(&self) -> f64 {
        (self.total_samples as f64 * self.scale - self.width).max(0.0)
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll());
    }

    /// Base whose peak is closest to `pixel`, or `None` if it is farther than
    /// the hover (or, while `dragging`, the drag) threshold.
    pub fn nearest_base(&self, pixel: f64, peaks: &[usize], dragging: bool) -> Option<usize> {
        let sample = self.pixel_to_data(pixel);
        let mut best: Option<(usize, f64)> = None;
        for (i, &peak) in peaks.iter().enumerate() {
            let distance = (peak as f64 - sample).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        let threshold = if dragging {
            self.drag_threshold
        } else {
            self.hover_threshold
        };
        best.filter(|&(_, d)| d * self.scale <= threshold)
            .map(|(i, _)| i)
    }

    /// Sets the scale, keeping the sample at the horizontal centre in place.
    pub fn set_zoom(&mut self, new_scale: f64) {
        let new_scale = new_scale.clamp(self.min_scale, self.max_scale);
        let center = self.pixel_to_data(self.width / 2.0);
        self.scale = new_scale;
        self.scroll_offset = center * new_scale - self.width / 2.0;
        self.clamp_scroll();
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.set_zoom(self.scale * factor);
    }

    /// Shows the whole trace in `width` pixels and scrolls to the start.
    pub fn fit_to_view(&mut self, width: f64, total_samples: usize) {
        self.width = width.max(0.0);
        self.total_samples = total_samples;
        if total_samples > 0 && self.width > 0.0 {
            self.scale = (self.width / total_samples as f64).clamp(self.min_scale, self.max_scale);
        }
        self.scroll_offset = 0.0;
    }

    /// Full recompute after the trace length changed.
    pub fn reset(&mut self, total_samples: usize) {
        self.fit_to_view(self.width, total_samples);
    }

    /// New panel width; keeps the scale.
    pub fn resize(&mut self, width: f64) {
        self.width = width.max(0.0);
        self.clamp_scroll();
    }

    pub fn scroll_by(&mut self, pixels: f64) {
        self.scroll_offset += pixels;
        self.clamp_scroll();
    }

    /// Scrolls so that `sample` sits at the horizontal centre.
    pub fn center_on(&mut self, sample: f64) {
        self.scroll_offset = sample * self.scale - self.width / 2.0;
        self.clamp_scroll();
    }

    /// Scrolls the minimum needed to show `sample`.
    pub fn ensure_visible(&mut self, sample: f64) {
        let px = self.data_to_pixel(sample);
        if px < 0.0 || px >= self.width {
            self.center_on(sample);
        }
    }

    /// Which edge zone `pixel` is in, if any.
    pub fn edge_zone(&self, pixel: f64, margin: f64) -> Option<ScrollDirection> {
        if pixel < margin {
            Some(ScrollDirection::Left)
        } else if pixel >= self.width - margin {
            Some(ScrollDirection::Right)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        let mut vp = Viewport::new(0.01, 4.0, 1.5, 4.0);
        vp.fit_to_view(100.0, 1000);
        vp
    }

    #[test]
    fn test_fit_to_view() {
        let vp = viewport();
        assert_eq!(vp.scale(), 0.1);
        assert_eq!(vp.scroll_offset(), 0.0);
        let (first, last) = vp.visible_samples();
        assert_eq!(first, 0.0);
        assert!((last - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_view_idempotent() {
        let mut vp = viewport();
        vp.set_zoom(1.0);
        vp.scroll_by(250.0);
        vp.fit_to_view(100.0, 1000);
        let first = vp.clone();
        vp.fit_to_view(100.0, 1000);
        assert_eq!(vp, first);
    }

    #[test]
    fn test_mapping() {
        let mut vp = viewport();
        vp.set_zoom(1.0);
        vp.center_on(500.0);
        assert_eq!(vp.scroll_offset(), 450.0);
        assert_eq!(vp.data_to_pixel(500.0), 50.0);
        assert_eq!(vp.pixel_to_data(50.0), 500.0);
    }

    #[test]
    fn test_zoom_preserves_center() {
        let mut vp = viewport();
        vp.set_zoom(1.0);
        vp.center_on(400.0);
        vp.set_zoom(2.0);
        assert_eq!(vp.pixel_to_data(50.0), 400.0);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = viewport();
        vp.set_zoom(100.0);
        assert_eq!(vp.scale(), 4.0);
        vp.set_zoom(0.0);
        assert_eq!(vp.scale(), 0.01);
        // Zoomed out past fit: nothing to scroll.
        assert_eq!(vp.scroll_offset(), 0.0);
    }

    #[test]
    fn test_scroll_clamped() {
        let mut vp = viewport();
        vp.set_zoom(1.0);
        vp.scroll_by(-5000.0);
        assert_eq!(vp.scroll_offset(), 0.0);
        vp.scroll_by(5000.0);
        assert_eq!(vp.scroll_offset(), 900.0);
    }

    #[test]
    fn test_nearest_base_thresholds() {
        let mut vp = viewport();
        vp.set_zoom(1.0);
        vp.scroll_by(-5000.0);
        let peaks = [10, 20, 30];
        assert_eq!(vp.nearest_base(21.0, &peaks, false), Some(1));
        assert_eq!(vp.nearest_base(13.0, &peaks, false), None);
        // The drag threshold is wider.
        assert_eq!(vp.nearest_base(13.0, &peaks, true), Some(0));
        assert_eq!(vp.nearest_base(100.0, &peaks, true), None);
        assert_eq!(vp.nearest_base(5.0, &[], true), None);
    }

    #[test]
    fn test_reset_after_length_change() {
        let mut vp = viewport();
        vp.set_zoom(2.0);
        vp.scroll_by(300.0);
        vp.reset(200);
        assert_eq!(vp.scale(), 0.5);
        assert_eq!(vp.scroll_offset(), 0.0);
    }

    #[test]
    fn test_edge_zone() {
        let vp = viewport();
        assert_eq!(vp.edge_zone(1.0, 3.0), Some(ScrollDirection::Left));
        assert_eq!(vp.edge_zone(98.0, 3.0), Some(ScrollDirection::Right));
        assert_eq!(vp.edge_zone(50.0, 3.0), None);
    }
}
