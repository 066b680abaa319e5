use crate::frame::CoordinateFrame;
use ndarray::Array2;

/// A loaded 2-D image: pixel values plus an optional coordinate frame.
///
/// `values` is indexed `[row, column]`, i.e. `[y, x]`.
#[derive(Debug, Clone)]
pub struct Dataset {
    label: String,
    frame: Option<CoordinateFrame>,
    values: Array2<f32>,
    unit: Option<String>,
    load_order: usize,
}

impl Dataset {
    pub fn new(label: impl Into<String>, values: Array2<f32>) -> Self {
        Self {
            label: label.into(),
            frame: None,
            values,
            unit: None,
            load_order: 0,
        }
    }

    /// A `width` x `height` image filled with `value`.
    pub fn filled(label: impl Into<String>, width: usize, height: usize, value: f32) -> Self {
        Self::new(label, Array2::from_elem((height, width), value))
    }

    pub fn with_frame(mut self, frame: impl Into<CoordinateFrame>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frame(&self) -> Option<&CoordinateFrame> {
        self.frame.as_ref()
    }

    pub fn set_frame(&mut self, frame: Option<CoordinateFrame>) -> Option<CoordinateFrame> {
        std::mem::replace(&mut self.frame, frame)
    }

    /// The frame, if it maps both axes onto the sky.
    pub fn celestial_frame(&self) -> Option<&CoordinateFrame> {
        self.frame.as_ref().filter(|f| f.is_celestial())
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn load_order(&self) -> usize {
        self.load_order
    }

    pub(crate) fn set_load_order(&mut self, order: usize) {
        self.load_order = order;
    }

    /// Value of the pixel nearest `(x, y)`, `None` off the array.
    pub fn value_at(&self, x: f64, y: f64) -> Option<f32> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (col, row) = (x.round(), y.round());
        if col < 0.0 || row < 0.0 {
            return None;
        }
        self.values.get((row as usize, col as usize)).copied()
    }
}
