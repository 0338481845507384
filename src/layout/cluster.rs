use crate::core::config::ClusterConfig;
use crate::models::Rect;

/// Merges nearby detection rects into bubble rects.
///
/// Merging is an absorb scan repeated to a fixed point: each rect is unioned
/// into the first already-placed rect it is close to, or placed on its own.
/// The result depends on input order but is reproducible for a given order.
#[derive(Debug, Clone)]
pub struct BubbleClusterer {
    config: ClusterConfig,
}

impl BubbleClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Whether two rects touch once both are grown by the merge margins.
    pub fn is_close(&self, a: &Rect, b: &Rect) -> bool {
        let (mx, my) = (self.config.margin_x, self.config.margin_y);
        a.expand(mx, my).intersects(&b.expand(mx, my))
    }

    /// Merged rects in discovery order.
    pub fn merge(&self, rects: &[Rect]) -> Vec<Rect> {
        let mut current = rects.to_vec();
        loop {
            let mut merged: Vec<Rect> = Vec::with_capacity(current.len());
            let mut changed = false;

            for rect in current {
                match merged.iter_mut().find(|m| self.is_close(m, &rect)) {
                    Some(existing) => {
                        *existing = existing.union(&rect);
                        changed = true;
                    }
                    None => merged.push(rect),
                }
            }

            current = merged;
            if !changed {
                return current;
            }
        }
    }

    /// Bubble rects for a page, reversed relative to discovery order when
    /// `reverse_output` is set.
    pub fn cluster(&self, rects: &[Rect]) -> Vec<Rect> {
        let mut bubbles = self.merge(rects);
        if self.config.reverse_output {
            bubbles.reverse();
        }
        bubbles
    }
}

impl Default for BubbleClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}
