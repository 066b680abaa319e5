//! The owning context: loaded datasets, the shared link set, viewers and subsets.
//!
//! Every mutation goes through `&mut Workspace` and is applied whole or not
//! at all.

use crate::alignment::{
    AlignmentMethod, AlignmentState, MarkerCoords, Region, RegionCoords, Subset, Tool, ViewLimits,
    ViewerState,
};
use crate::config::Config;
use crate::data::Dataset;
use crate::error::{AlignError, AlignResult};
use crate::frame::{CoordinateFrame, FrameCapabilities};
use crate::link::{LinkOptions, LinkSelector, LinkSet};
use crate::logging::{self, RealignSpan};
use crate::readout::{CursorReadout, EventKind, ReadoutContext, ViewerEvent};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const DEFAULT_VIEWER: &str = "imviz-0";

pub struct Workspace {
    config: Config,
    selector: LinkSelector,
    datasets: Vec<Dataset>,
    alignment: AlignmentState,
    viewers: Vec<ViewerState>,
    subsets: Vec<Subset>,
    next_load_order: usize,
    next_subset: usize,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Workspace {
    /// A workspace with one empty default viewer.
    pub fn new(config: Config) -> Self {
        let selector = LinkSelector::new(&config.link);
        let mut alignment = AlignmentState::default();
        alignment.commit(config.defaults.clone(), LinkSet::empty(config.defaults.mode));
        alignment.track_viewer(DEFAULT_VIEWER);

        Self {
            config,
            selector,
            datasets: Vec::new(),
            alignment,
            viewers: vec![ViewerState::new(DEFAULT_VIEWER)],
            subsets: Vec::new(),
            next_load_order: 0,
            next_subset: 1,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- datasets -------------------------------------------------------

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, label: &str) -> AlignResult<&Dataset> {
        self.datasets
            .iter()
            .find(|d| d.label() == label)
            .ok_or_else(|| AlignError::NotFound(label.to_string()))
    }

    /// Reference dataset and its index in load order.
    pub fn reference_data(&self) -> Option<(usize, &Dataset)> {
        let label = self.alignment.links().reference.as_deref()?;
        self.datasets
            .iter()
            .enumerate()
            .find(|(_, d)| d.label() == label)
    }

    /// Add a dataset on top of every viewer and relink with the current options.
    ///
    /// Fails without side effects if the label is taken or relinking fails.
    pub fn load(&mut self, mut dataset: Dataset) -> AlignResult<()> {
        if self.datasets.iter().any(|d| d.label() == dataset.label()) {
            return Err(AlignError::DuplicateLabel(dataset.label().to_string()));
        }
        dataset.set_load_order(self.next_load_order);

        let mut candidate = self.datasets.clone();
        candidate.push(dataset);
        let links = self
            .selector
            .select_links(&candidate, self.alignment.options())?;

        let label = candidate[candidate.len() - 1].label().to_string();
        let first = self.datasets.is_empty();
        self.datasets = candidate;
        self.next_load_order += 1;
        self.alignment.replace_links(links);

        let extent = self.reference_extent();
        for viewer in &mut self.viewers {
            viewer.push_layer(&label);
            if first {
                if let Some((w, h)) = extent {
                    viewer.reset_limits(w, h);
                }
            }
        }
        info!(dataset = %label, total = self.datasets.len(), "Dataset loaded");
        Ok(())
    }

    /// Replace a dataset's frame and relink; the old frame is kept on failure.
    pub fn set_frame(&mut self, label: &str, frame: Option<CoordinateFrame>) -> AlignResult<()> {
        let index = self
            .datasets
            .iter()
            .position(|d| d.label() == label)
            .ok_or_else(|| AlignError::NotFound(label.to_string()))?;

        let mut candidate = self.datasets.clone();
        candidate[index].set_frame(frame);
        let links = self
            .selector
            .select_links(&candidate, self.alignment.options())?;

        self.datasets = candidate;
        self.alignment.replace_links(links);
        debug!(dataset = label, "Coordinate frame replaced");
        Ok(())
    }

    pub fn classify(&self, label: &str) -> AlignResult<Option<FrameCapabilities>> {
        let dataset = self.dataset(label)?;
        Ok(dataset.frame().map(|frame| {
            frame.classify(dataset.width(), dataset.height(), self.config.frame.affine_rtol)
        }))
    }

    fn reference_extent(&self) -> Option<(usize, usize)> {
        self.reference_data().map(|(_, d)| (d.width(), d.height()))
    }

    // ---- alignment ------------------------------------------------------

    pub fn links(&self) -> &LinkSet {
        self.alignment.links()
    }

    pub fn alignment(&self) -> &AlignmentState {
        &self.alignment
    }

    /// Recompute links and swap them in for every viewer.
    ///
    /// On error the previous links, alignment, limits and markers are untouched.
    pub fn realign(&mut self, viewer: &str, options: LinkOptions) -> AlignResult<&LinkSet> {
        logging::new_correlation_id();
        let span = RealignSpan::new(viewer, &options);

        let result = self.try_realign(viewer, options);
        match &result {
            Ok(()) => span.record_success(self.alignment.links()),
            Err(e) => span.record_failure(e),
        }
        logging::clear_correlation_id();

        result.map(|()| self.alignment.links())
    }

    fn try_realign(&mut self, viewer: &str, options: LinkOptions) -> AlignResult<()> {
        self.viewer(viewer)?;
        let links = self.selector.select_links(&self.datasets, &options)?;
        self.alignment
            .check_change_allowed(options.mode, links.reference.as_deref(), &self.subsets)?;

        let mode_changed = self.alignment.mode() != options.mode;
        self.alignment.commit(options, links);

        let extent = self.reference_extent();
        for v in &mut self.viewers {
            v.apply_realignment(mode_changed, extent);
        }
        Ok(())
    }

    /// Realign through the default viewer.
    pub fn link_data(&mut self, options: LinkOptions) -> AlignResult<&LinkSet> {
        self.realign(DEFAULT_VIEWER, options)
    }

    pub fn get_alignment_method(&self, viewer: &str, label: &str) -> AlignResult<AlignmentMethod> {
        self.alignment.viewer(viewer)?;
        self.alignment.method_for(label)
    }

    // ---- viewers --------------------------------------------------------

    pub fn viewers(&self) -> &[ViewerState] {
        &self.viewers
    }

    pub fn viewer(&self, name: &str) -> AlignResult<&ViewerState> {
        self.viewers
            .iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| AlignError::NotFound(name.to_string()))
    }

    fn viewer_mut(&mut self, name: &str) -> AlignResult<&mut ViewerState> {
        self.viewers
            .iter_mut()
            .find(|v| v.name() == name)
            .ok_or_else(|| AlignError::NotFound(name.to_string()))
    }

    /// Open another viewer showing every dataset with the current alignment.
    pub fn create_viewer(&mut self, name: &str) -> AlignResult<&ViewerState> {
        if self.viewers.iter().any(|v| v.name() == name) {
            return Err(AlignError::DuplicateLabel(name.to_string()));
        }
        let mut viewer = ViewerState::new(name);
        for dataset in &self.datasets {
            viewer.push_layer(dataset.label());
        }
        if let Some((w, h)) = self.reference_extent() {
            viewer.reset_limits(w, h);
        }
        self.alignment.track_viewer(name);
        self.viewers.push(viewer);
        Ok(&self.viewers[self.viewers.len() - 1])
    }

    pub fn blink(&mut self, viewer: &str) -> AlignResult<()> {
        self.viewer_mut(viewer)?.blink_once();
        Ok(())
    }

    pub fn set_active_tool(&mut self, viewer: &str, tool: Option<Tool>) -> AlignResult<()> {
        self.viewer_mut(viewer)?.set_active_tool(tool);
        Ok(())
    }

    pub fn reset_limits(&mut self, viewer: &str) -> AlignResult<()> {
        let extent = self.reference_extent();
        let v = self.viewer_mut(viewer)?;
        if let Some((w, h)) = extent {
            v.reset_limits(w, h);
        }
        Ok(())
    }

    pub fn center_on(&mut self, viewer: &str, x: f64, y: f64) -> AlignResult<()> {
        self.viewer_mut(viewer)?.center_on(x, y);
        Ok(())
    }

    pub fn zoom(&mut self, viewer: &str, factor: f64) -> AlignResult<()> {
        self.viewer_mut(viewer)?.zoom(factor);
        Ok(())
    }

    /// Viewer limit corners expressed in `label`'s own pixels.
    ///
    /// Corners outside the dataset frame's bounding domain are NaN.
    pub fn zoom_limits(&self, viewer: &str, label: &str) -> AlignResult<[[f64; 2]; 4]> {
        let limits: ViewLimits = self.viewer(viewer)?.limits();
        let dataset = self.dataset(label)?;
        let links = self.alignment.links();

        let mut out = [[f64::NAN; 2]; 4];
        for (slot, (x, y)) in out.iter_mut().zip(limits.corners()) {
            let (px, py) = links.reference_to_dataset(&self.datasets, dataset, x, y);
            let inside = dataset
                .frame()
                .map_or(true, |frame| frame.contains_pixel(px, py));
            if inside {
                *slot = [px, py];
            }
        }
        Ok(out)
    }

    pub fn add_markers(
        &mut self,
        viewer: &str,
        name: &str,
        coords: MarkerCoords,
        points: Vec<(f64, f64)>,
    ) -> AlignResult<()> {
        self.viewer_mut(viewer)?.add_markers(name, coords, points);
        Ok(())
    }

    pub fn reset_markers(&mut self, viewer: &str) -> AlignResult<()> {
        self.viewer_mut(viewer)?.reset_markers();
        Ok(())
    }

    // ---- subsets --------------------------------------------------------

    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    /// Add a spatial subset, returning its generated label.
    pub fn add_subset(&mut self, region: Region, coords: RegionCoords) -> String {
        let label = format!("Subset {}", self.next_subset);
        self.next_subset += 1;
        self.subsets.push(Subset {
            label: label.clone(),
            region,
            coords,
        });
        label
    }

    pub fn delete_subsets(&mut self) {
        if !self.subsets.is_empty() {
            info!(count = self.subsets.len(), "Subsets deleted");
        }
        self.subsets.clear();
    }

    /// Every subset as a sky region, through the reference frame.
    ///
    /// Subsets that cannot be expressed on the sky are skipped with a warning.
    pub fn sky_regions(&self) -> AlignResult<BTreeMap<String, Subset>> {
        let (_, reference) = self.reference_data().ok_or(AlignError::NoReferenceData)?;
        let frame = reference.celestial_frame();

        let mut regions = BTreeMap::new();
        let mut skipped = Vec::new();
        for subset in &self.subsets {
            let sky = match frame {
                Some(f) => subset.to_sky(f),
                None => (subset.coords == RegionCoords::Sky).then(|| subset.clone()),
            };
            match sky {
                Some(sky) => {
                    regions.insert(subset.label.clone(), sky);
                }
                None => skipped.push(subset.label.as_str()),
            }
        }
        if !skipped.is_empty() {
            warn!("Regions skipped: {}", skipped.join(", "));
        }
        Ok(regions)
    }

    // ---- readout --------------------------------------------------------

    /// Coordinate readout at `(x, y)` in the viewer's reference pixel space.
    pub fn read(&self, viewer: &str, x: f64, y: f64) -> AlignResult<CursorReadout> {
        let ctx = ReadoutContext {
            viewer: self.viewer(viewer)?,
            datasets: &self.datasets,
            alignment: &self.alignment,
            config: &self.config.readout,
        };
        Ok(ctx.read(x, y))
    }

    /// Handle one mouse or key event and return the refreshed readout.
    ///
    /// `b` blinks; a click blinks when the blink tool is active.
    pub fn on_event(&mut self, viewer: &str, event: ViewerEvent) -> AlignResult<CursorReadout> {
        let state = self.viewer_mut(viewer)?;
        match event.kind {
            EventKind::KeyDown('b') => state.blink_once(),
            EventKind::Click if state.active_tool() == Some(Tool::BlinkOnce) => state.blink_once(),
            _ => {}
        }
        self.read(viewer, event.x, event.y)
    }
}
