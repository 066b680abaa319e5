use super::{AffineTransform, AlignMode, FallbackScheme, LinkDescriptor, LinkKind, LinkOptions, LinkSet};
use crate::config::LinkConfig;
use crate::data::Dataset;
use crate::error::{AlignError, AlignResult};
use crate::frame::CoordinateFrame;
use tracing::{debug, info, info_span, warn};

/// Chooses one link per non-reference dataset.
#[derive(Debug, Clone)]
pub struct LinkSelector {
    config: LinkConfig,
}

impl Default for LinkSelector {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

impl LinkSelector {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Build the link set for `datasets` (in load order).
    ///
    /// An empty collection yields an empty set with no reference rather than an error.
    pub fn select_links(&self, datasets: &[Dataset], options: &LinkOptions) -> AlignResult<LinkSet> {
        let span = info_span!(
            "link_selection",
            mode = %options.mode,
            datasets = datasets.len(),
            fast_approximation = options.fast_approximation
        );
        let _enter = span.enter();

        let reference = match &options.reference {
            Some(label) => datasets
                .iter()
                .find(|d| d.label() == label)
                .ok_or_else(|| AlignError::NotFound(label.clone()))?,
            None => match datasets.iter().min_by_key(|d| d.load_order()) {
                Some(first) => first,
                None => {
                    info!("No reference data, link set left empty");
                    return Ok(LinkSet::empty(options.mode));
                }
            },
        };

        let mut links = Vec::with_capacity(datasets.len().saturating_sub(1));
        for dataset in datasets.iter().filter(|d| d.label() != reference.label()) {
            let link = match options.mode {
                AlignMode::Pixels => self.identity(dataset, reference, false),
                AlignMode::Wcs => self.wcs_link(dataset, reference, options)?,
            };
            debug!(
                source = %link.source,
                kind = link.kind.name(),
                pixel_fallback = link.pixel_fallback,
                "Link selected"
            );
            links.push(link);
        }

        Ok(LinkSet {
            mode: options.mode,
            reference: Some(reference.label().to_string()),
            links,
        })
    }

    fn identity(&self, source: &Dataset, reference: &Dataset, pixel_fallback: bool) -> LinkDescriptor {
        LinkDescriptor {
            source: source.label().to_string(),
            reference: reference.label().to_string(),
            kind: LinkKind::Identity,
            pixel_fallback,
        }
    }

    fn wcs_link(
        &self,
        source: &Dataset,
        reference: &Dataset,
        options: &LinkOptions,
    ) -> AlignResult<LinkDescriptor> {
        let (src_frame, ref_frame) = match (source.celestial_frame(), reference.celestial_frame()) {
            (Some(s), Some(r)) => (s, r),
            _ => {
                let unlinkable = if source.celestial_frame().is_none() {
                    source.label()
                } else {
                    reference.label()
                };
                return match options.fallback {
                    FallbackScheme::Pixels => {
                        warn!(dataset = unlinkable, "No celestial WCS, falling back to pixel linking");
                        Ok(self.identity(source, reference, true))
                    }
                    FallbackScheme::None => Err(AlignError::UnlinkableDataset(unlinkable.to_string())),
                };
            }
        };

        let kind = if options.fast_approximation {
            self.approximate(src_frame, ref_frame, reference)
                .unwrap_or(LinkKind::FullWcs)
        } else {
            LinkKind::FullWcs
        };

        Ok(LinkDescriptor {
            source: source.label().to_string(),
            reference: reference.label().to_string(),
            kind,
            pixel_fallback: false,
        })
    }

    /// Fit an affine source-to-reference map over the reference footprint.
    ///
    /// `None` when too few samples survive both frames' domains or the fit
    /// misses the tolerance.
    fn approximate(
        &self,
        src_frame: &CoordinateFrame,
        ref_frame: &CoordinateFrame,
        reference: &Dataset,
    ) -> Option<LinkKind> {
        let (src_pts, ref_pts): (Vec<_>, Vec<_>) = self
            .footprint_samples(reference.width(), reference.height())
            .into_iter()
            .filter_map(|(rx, ry)| {
                let (a, b) = ref_frame.pixel_to_world(rx, ry);
                let (sx, sy) = src_frame.world_to_pixel(a, b);
                (sx.is_finite() && sy.is_finite()).then_some(((sx, sy), (rx, ry)))
            })
            .unzip();

        let fit = AffineTransform::fit(&src_pts, &ref_pts)?;
        if fit.max_residual > self.config.affine_tolerance_px || fit.transform.inverse().is_none() {
            debug!(
                max_residual = fit.max_residual,
                tolerance = self.config.affine_tolerance_px,
                "Affine approximation rejected"
            );
            return None;
        }

        if fit
            .transform
            .is_pure_translation(self.config.offset_rtol, self.config.offset_atol)
        {
            let (dx, dy) = fit.transform.offset();
            Some(LinkKind::Offset { dx, dy })
        } else {
            Some(LinkKind::Affine(fit.transform))
        }
    }

    /// Evenly spaced grid over `-0.5 .. n - 0.5` on both axes.
    fn footprint_samples(&self, width: usize, height: usize) -> Vec<(f64, f64)> {
        let n = self.config.sample_grid.max(2);
        let axis = |extent: usize| -> Vec<f64> {
            let span = extent.max(1) as f64;
            (0..n)
                .map(|i| -0.5 + span * i as f64 / (n - 1) as f64)
                .collect()
        };
        let xs = axis(width);
        let ys = axis(height);
        ys.iter()
            .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
            .collect()
    }
}
