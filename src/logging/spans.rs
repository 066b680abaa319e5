//! Span wrapper for one realignment request.

use super::get_correlation_id;
use crate::link::{LinkOptions, LinkSet};
use std::time::Instant;
use tracing::{field, span, Level, Span};
use uuid::Uuid;

pub struct RealignSpan {
    span: Span,
    correlation_id: Option<Uuid>,
    start_time: Instant,
}

impl RealignSpan {
    /// Open a span tagged with the thread's current correlation id, if any.
    pub fn new(viewer: &str, options: &LinkOptions) -> Self {
        let correlation_id = get_correlation_id();
        let span = span!(
            Level::INFO,
            "realign",
            viewer = viewer,
            mode = %options.mode,
            fallback = ?options.fallback,
            fast_approximation = options.fast_approximation,
            correlation_id = field::Empty,
            links = field::Empty,
            wcs_links = field::Empty,
            pixel_fallbacks = field::Empty,
        );
        if let Some(id) = correlation_id {
            span.record("correlation_id", field::display(id));
        }
        Self {
            span,
            correlation_id,
            start_time: Instant::now(),
        }
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    /// Record the committed link set and close out the request.
    pub fn record_success(&self, links: &LinkSet) {
        let wcs_links = links.iter().filter(|l| l.is_wcs()).count();
        let pixel_fallbacks = links.iter().filter(|l| l.pixel_fallback).count();
        self.span.record("links", links.len());
        self.span.record("wcs_links", wcs_links);
        self.span.record("pixel_fallbacks", pixel_fallbacks);
        tracing::info!(
            parent: &self.span,
            correlation_id = ?self.correlation_id,
            reference = ?links.reference,
            links = links.len(),
            wcs_links,
            pixel_fallbacks,
            duration_us = self.start_time.elapsed().as_micros() as u64,
            "Realignment committed"
        );
    }

    pub fn record_failure(&self, error: &crate::AlignError) {
        tracing::warn!(
            parent: &self.span,
            correlation_id = ?self.correlation_id,
            error = %error,
            duration_us = self.start_time.elapsed().as_micros() as u64,
            "Realignment rejected, previous alignment kept"
        );
    }
}
