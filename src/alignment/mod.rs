//! Alignment bookkeeping: the committed link set, the options that produced
//! it, and which viewers it applies to.

pub mod subset;
pub mod viewer;

pub use subset::{Region, RegionCoords, Subset};
pub use viewer::{MarkerCoords, MarkerLayer, Tool, ViewLimits, ViewerState};

use crate::error::{AlignError, AlignResult};
use crate::link::{AlignMode, LinkOptions, LinkSet};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// How one dataset is aligned, as reported to the viewer layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlignmentMethod {
    Pixels,
    Wcs,
    /// The dataset is the reference itself.
    SelfRef,
}

impl fmt::Display for AlignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pixels => "pixels",
            Self::Wcs => "wcs",
            Self::SelfRef => "self",
        })
    }
}

/// Alignment recorded for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerAlignment {
    pub mode: AlignMode,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentState {
    options: LinkOptions,
    links: LinkSet,
    viewers: BTreeMap<String, ViewerAlignment>,
}

impl AlignmentState {
    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    pub fn mode(&self) -> AlignMode {
        self.options.mode
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn viewer(&self, name: &str) -> AlignResult<&ViewerAlignment> {
        self.viewers
            .get(name)
            .ok_or_else(|| AlignError::NotFound(name.to_string()))
    }

    pub(crate) fn track_viewer(&mut self, name: &str) {
        self.viewers.insert(
            name.to_string(),
            ViewerAlignment {
                mode: self.options.mode,
                reference: self.links.reference.clone(),
            },
        );
    }

    /// Refuse a change of mode or of reference dataset while any subset exists.
    pub fn check_change_allowed(
        &self,
        new_mode: AlignMode,
        new_reference: Option<&str>,
        subsets: &[Subset],
    ) -> AlignResult<()> {
        let changed =
            new_mode != self.options.mode || new_reference != self.links.reference.as_deref();
        if changed && !subsets.is_empty() {
            return Err(AlignError::AlignmentChangeBlocked(
                subsets.iter().map(|s| s.label.clone()).collect(),
            ));
        }
        Ok(())
    }

    /// Swap in a freshly computed link set for every tracked viewer at once.
    pub(crate) fn commit(&mut self, options: LinkOptions, links: LinkSet) {
        for alignment in self.viewers.values_mut() {
            alignment.mode = options.mode;
            alignment.reference = links.reference.clone();
        }
        self.options = options;
        self.links = links;
    }

    /// Replace links without touching options, for relinking after a load.
    pub(crate) fn replace_links(&mut self, links: LinkSet) {
        for alignment in self.viewers.values_mut() {
            alignment.reference = links.reference.clone();
        }
        self.links = links;
    }

    pub fn method_for(&self, label: &str) -> AlignResult<AlignmentMethod> {
        let reference = self
            .links
            .reference
            .as_deref()
            .ok_or(AlignError::NoReferenceData)?;
        if label == reference {
            return Ok(AlignmentMethod::SelfRef);
        }
        match self.links.get(label) {
            Some(link) if link.is_wcs() => Ok(AlignmentMethod::Wcs),
            Some(_) => Ok(AlignmentMethod::Pixels),
            None => Err(AlignError::NotFound(label.to_string())),
        }
    }
}
