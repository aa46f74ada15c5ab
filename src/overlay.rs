//! Overlay positioning for the editable annotation layer.
//!
//! The overlay is sized to the rendered image box, not to the container, so
//! boxes painted at "x%, y%" of the overlay land on the right image pixels
//! regardless of letterboxing. The layout is recomputed on image load,
//! container resize and zoom/modal transitions; recomputing redundantly is
//! harmless.

use crate::error::{EditorError, Result};
use crate::geometry::{compute_letterbox, percent_to_rendered, rendered_to_percent};
use crate::model::{ImageRenderContext, PercentPoint, PercentRect, RenderedBox, RenderedRect};
use crate::session::ResizeHandle;

/// What caused a layout recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTrigger {
    /// A new image finished loading
    ImageLoad,
    /// The display container changed size
    ContainerResize,
    /// Zoom or modal open/close changed the container
    Transition,
}

/// Keeps the overlay congruent with the rendered image box.
#[derive(Debug, Clone, Default)]
pub struct OverlayPositioner {
    /// Natural image size, once loaded
    natural: Option<(u32, u32)>,
    /// Container size in display units
    container: Option<(f64, f64)>,
    /// Last computed rendered box
    rendered: Option<RenderedBox>,
}

impl OverlayPositioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the natural size of a freshly loaded image.
    pub fn on_image_load(&mut self, natural_width: u32, natural_height: u32) -> Result<Option<RenderedBox>> {
        if natural_width == 0 || natural_height == 0 {
            self.natural = None;
            self.rendered = None;
            return Err(EditorError::invalid_dimensions(
                f64::from(natural_width),
                f64::from(natural_height),
            ));
        }
        self.natural = Some((natural_width, natural_height));
        self.recompute(LayoutTrigger::ImageLoad)
    }

    /// Record a new container size.
    pub fn on_container_resize(&mut self, width: f64, height: f64) -> Result<Option<RenderedBox>> {
        self.container = Some((width, height));
        self.recompute(LayoutTrigger::ContainerResize)
    }

    /// Recompute after a zoom or modal transition.
    pub fn on_transition(&mut self) -> Result<Option<RenderedBox>> {
        self.recompute(LayoutTrigger::Transition)
    }

    /// Recompute the rendered box from the known natural and container sizes.
    ///
    /// Returns `None` until both sizes are known.
    pub fn recompute(&mut self, trigger: LayoutTrigger) -> Result<Option<RenderedBox>> {
        let (Some((nw, nh)), Some((cw, ch))) = (self.natural, self.container) else {
            self.rendered = None;
            return Ok(None);
        };

        let rendered = compute_letterbox(f64::from(nw), f64::from(nh), cw, ch)?;
        if self.rendered != Some(rendered) {
            log::debug!(
                "Overlay layout ({:?}): {}x{} in {:.1}x{:.1} -> offset ({:.1}, {:.1}) size {:.1}x{:.1}",
                trigger,
                nw,
                nh,
                cw,
                ch,
                rendered.offset_x,
                rendered.offset_y,
                rendered.width,
                rendered.height
            );
        }
        self.rendered = Some(rendered);
        Ok(self.rendered)
    }

    /// Where the overlay layer should be placed inside the container.
    pub fn rendered_box(&self) -> Option<RenderedBox> {
        self.rendered
    }

    /// Full render context, available once image and container are known.
    pub fn render_context(&self) -> Option<ImageRenderContext> {
        let (nw, nh) = self.natural?;
        let rendered = self.rendered?;
        Some(ImageRenderContext::new(nw, nh, rendered))
    }

    /// Display pixels per image pixel.
    pub fn scale(&self) -> Option<f64> {
        let (nw, _) = self.natural?;
        self.rendered.map(|r| r.width / f64::from(nw))
    }

    /// Translate a container-space pointer position into percent space.
    pub fn pointer_to_percent(&self, x: f64, y: f64) -> Option<PercentPoint> {
        self.rendered.map(|r| rendered_to_percent(x, y, &r))
    }

    /// Container-space rectangle for a percent-space box.
    pub fn place(&self, rect: &PercentRect) -> Option<RenderedRect> {
        self.rendered.map(|r| percent_to_rendered(rect, &r))
    }

    /// Rectangle relative to the overlay layer's own origin.
    pub fn place_in_overlay(&self, rect: &PercentRect) -> Option<RenderedRect> {
        self.rendered.map(|r| {
            let local = RenderedBox::new(0.0, 0.0, r.width, r.height);
            percent_to_rendered(rect, &local)
        })
    }

    /// Container-space anchor of each resize handle of `rect`.
    pub fn handle_anchors(&self, rect: &PercentRect) -> Option<Vec<(ResizeHandle, f64, f64)>> {
        let rendered = self.rendered?;
        Some(
            ResizeHandle::ALL
                .iter()
                .map(|&handle| {
                    let anchor = handle.anchor(rect);
                    let placed = percent_to_rendered(
                        &PercentRect::new(anchor.x, anchor.y, 0.0, 0.0),
                        &rendered,
                    );
                    (handle, placed.x, placed.y)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_both_sizes() {
        let mut overlay = OverlayPositioner::new();
        assert_eq!(overlay.on_container_resize(400.0, 400.0).expect("resize"), None);
        assert!(overlay.render_context().is_none());

        let rendered = overlay.on_image_load(1000, 500).expect("load");
        assert_eq!(rendered, Some(RenderedBox::new(0.0, 100.0, 400.0, 200.0)));
        let ctx = overlay.render_context().expect("context");
        assert_eq!(ctx.natural_width, 1000);
    }

    #[test]
    fn test_follows_container_resize() {
        let mut overlay = OverlayPositioner::new();
        overlay.on_image_load(1000, 500).expect("load");
        overlay.on_container_resize(400.0, 400.0).expect("resize");
        let rendered = overlay.on_container_resize(1000.0, 200.0).expect("resize");
        // Now height-bound: 400x200 centered horizontally
        assert_eq!(rendered, Some(RenderedBox::new(300.0, 0.0, 400.0, 200.0)));
        assert_eq!(overlay.scale(), Some(0.4));
    }

    #[test]
    fn test_redundant_recompute_is_stable() {
        let mut overlay = OverlayPositioner::new();
        overlay.on_image_load(640, 480).expect("load");
        let first = overlay.on_container_resize(800.0, 800.0).expect("resize");
        let second = overlay.on_transition().expect("transition");
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        let mut overlay = OverlayPositioner::new();
        overlay.on_container_resize(400.0, 400.0).expect("resize");
        assert!(overlay.on_image_load(0, 100).is_err());
        assert!(overlay.rendered_box().is_none());
    }

    #[test]
    fn test_place_accounts_for_letterbox() {
        let mut overlay = OverlayPositioner::new();
        overlay.on_image_load(1000, 500).expect("load");
        overlay.on_container_resize(400.0, 400.0).expect("resize");

        let rect = PercentRect::new(50.0, 50.0, 10.0, 10.0);
        let placed = overlay.place(&rect).expect("placed");
        assert_eq!(placed, RenderedRect::new(200.0, 200.0, 40.0, 20.0));

        let local = overlay.place_in_overlay(&rect).expect("local");
        assert_eq!(local, RenderedRect::new(200.0, 100.0, 40.0, 20.0));

        let p = overlay.pointer_to_percent(200.0, 200.0).expect("pointer");
        assert_eq!(p, PercentPoint::new(50.0, 50.0));
    }

    #[test]
    fn test_handle_anchors() {
        let mut overlay = OverlayPositioner::new();
        overlay.on_image_load(100, 100).expect("load");
        overlay.on_container_resize(100.0, 100.0).expect("resize");
        let anchors = overlay
            .handle_anchors(&PercentRect::new(10.0, 20.0, 30.0, 40.0))
            .expect("anchors");
        assert_eq!(anchors.len(), 8);
        assert!(anchors.contains(&(ResizeHandle::NorthWest, 10.0, 20.0)));
        assert!(anchors.contains(&(ResizeHandle::SouthEast, 40.0, 60.0)));
        assert!(anchors.contains(&(ResizeHandle::East, 40.0, 40.0)));
    }
}
