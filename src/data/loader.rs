//! Scenario files: a list of datasets with their frames, in TOML or JSON.
//!
//! ```toml
//! [[datasets]]
//! label = "has_wcs"
//! width = 10
//! height = 10
//! frame = { type = "fits", ctype = ["RA---TAN", "DEC--TAN"], crpix = [1.0, 1.0],
//!           crval = [337.5202808, -20.83333306], cdelt = [-0.000277777778, 0.000277777778] }
//! ```

use super::Dataset;
use crate::frame::{BoundingBox, CoordinateFrame, FitsWcs, TransformChain, TransformStep};
use anyhow::{bail, Context};
use ndarray::Array2;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    datasets: Vec<DatasetSpec>,
}

#[derive(Debug, Deserialize)]
struct DatasetSpec {
    label: String,
    width: usize,
    height: usize,
    #[serde(default)]
    fill: f32,
    /// Row-major values; overrides `fill` when present.
    values: Option<Vec<f32>>,
    unit: Option<String>,
    frame: Option<FrameSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FrameSpec {
    Fits {
        ctype: [String; 2],
        crpix: [f64; 2],
        crval: [f64; 2],
        cdelt: Option<[f64; 2]>,
        cd: Option<[[f64; 2]; 2]>,
        pc: Option<[[f64; 2]; 2]>,
    },
    Blank,
    Chain {
        steps: Vec<StepSpec>,
        /// `[[x_min, x_max], [y_min, y_max]]`; the array extent when absent.
        bounding_box: Option<[[f64; 2]; 2]>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum StepSpec {
    Shift { dx: f64, dy: f64 },
    Scale { sx: f64, sy: f64 },
    Rotation { angle_deg: f64 },
    Matrix { matrix: [[f64; 2]; 2] },
    Gnomonic { crval: [f64; 2] },
}

impl From<StepSpec> for TransformStep {
    fn from(spec: StepSpec) -> Self {
        match spec {
            StepSpec::Shift { dx, dy } => Self::Shift { dx, dy },
            StepSpec::Scale { sx, sy } => Self::Scale { sx, sy },
            StepSpec::Rotation { angle_deg } => Self::Rotation { angle_deg },
            StepSpec::Matrix { matrix } => Self::Matrix(matrix),
            StepSpec::Gnomonic { crval } => Self::Gnomonic { crval },
        }
    }
}

impl FrameSpec {
    fn build(self, width: usize, height: usize) -> crate::Result<CoordinateFrame> {
        let frame: CoordinateFrame = match self {
            FrameSpec::Fits {
                ctype,
                crpix,
                crval,
                cdelt,
                cd,
                pc,
            } => {
                let ctype = [ctype[0].as_str(), ctype[1].as_str()];
                let wcs = match (cd, cdelt) {
                    (Some(cd), _) => FitsWcs::new(ctype, crpix, crval, cd)?,
                    (None, Some(cdelt)) => FitsWcs::from_cdelt(ctype, crpix, crval, cdelt, pc)?,
                    (None, None) => bail!("FITS frame needs either `cd` or `cdelt`"),
                };
                wcs.into()
            }
            FrameSpec::Blank => FitsWcs::blank().into(),
            FrameSpec::Chain {
                steps,
                bounding_box,
            } => {
                let bbox = match bounding_box {
                    Some([x, y]) => BoundingBox::new((x[0], x[1]), (y[0], y[1])),
                    None => BoundingBox::around_extent(width, height),
                };
                let steps = steps.into_iter().map(TransformStep::from).collect();
                TransformChain::new(steps, Some(bbox))?.into()
            }
        };
        Ok(frame)
    }
}

impl DatasetSpec {
    fn build(self) -> crate::Result<Dataset> {
        if self.width == 0 || self.height == 0 {
            bail!("Dataset '{}' has an empty extent", self.label);
        }
        let values = match self.values {
            Some(values) => Array2::from_shape_vec((self.height, self.width), values)
                .with_context(|| format!("Dataset '{}' values do not match its extent", self.label))?,
            None => Array2::from_elem((self.height, self.width), self.fill),
        };

        let mut dataset = Dataset::new(&self.label, values);
        if let Some(unit) = self.unit {
            dataset = dataset.with_unit(unit);
        }
        if let Some(spec) = self.frame {
            let frame = spec
                .build(self.width, self.height)
                .with_context(|| format!("Invalid frame for dataset '{}'", self.label))?;
            dataset = dataset.with_frame(frame);
        }
        Ok(dataset)
    }
}

pub fn load_scenario<P: AsRef<Path>>(path: P) -> crate::Result<Vec<Dataset>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
    parse_scenario(&content)
}

/// Parse JSON when the text starts with `{`, TOML otherwise.
pub fn parse_scenario(content: &str) -> crate::Result<Vec<Dataset>> {
    let scenario: Scenario = if content.trim_start().starts_with('{') {
        serde_json::from_str(content)?
    } else {
        toml::from_str(content)?
    };
    scenario.datasets.into_iter().map(DatasetSpec::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fits_and_plain_datasets() {
        let datasets = parse_scenario(
            r#"
            [[datasets]]
            label = "has_wcs"
            width = 10
            height = 10
            unit = "electron / s"
            frame = { type = "fits", ctype = ["RA---TAN", "DEC--TAN"], crpix = [1.0, 1.0], crval = [337.5, -20.8], cdelt = [-0.0002777777778, 0.0002777777778] }

            [[datasets]]
            label = "no_wcs"
            width = 4
            height = 3
            fill = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0].label(), "has_wcs");
        assert!(datasets[0].celestial_frame().is_some());
        assert_eq!(datasets[0].unit(), Some("electron / s"));
        assert!(datasets[1].frame().is_none());
        assert_eq!((datasets[1].width(), datasets[1].height()), (4, 3));
        assert_eq!(datasets[1].value_at(3.0, 2.0), Some(2.5));
    }

    #[test]
    fn test_parse_chain_from_json() {
        let datasets = parse_scenario(
            r#"{"datasets": [{
                "label": "gwcs", "width": 10, "height": 10,
                "frame": {"type": "chain", "steps": [
                    {"op": "rotation", "angle_deg": 30.0},
                    {"op": "scale", "sx": -0.0002777777778, "sy": 0.0002777777778},
                    {"op": "gnomonic", "crval": [3.58, -30.39]}
                ]}
            }]}"#,
        )
        .unwrap();

        let frame = datasets[0].frame().unwrap();
        assert!(frame.is_celestial());
        assert!(frame.contains_pixel(9.5, -0.5));
        assert!(!frame.contains_pixel(10.0, 0.0));
    }

    #[test]
    fn test_blank_frame_is_not_celestial() {
        let datasets = parse_scenario(
            r#"
            [[datasets]]
            label = "blank"
            width = 2
            height = 2
            frame = { type = "blank" }
            "#,
        )
        .unwrap();
        assert!(datasets[0].frame().is_some());
        assert!(datasets[0].celestial_frame().is_none());
    }

    #[test]
    fn test_rejects_bad_values_and_frames() {
        let mismatched = r#"
            [[datasets]]
            label = "a"
            width = 2
            height = 2
            values = [1.0, 2.0, 3.0]
        "#;
        assert!(parse_scenario(mismatched).is_err());

        let no_scale = r#"
            [[datasets]]
            label = "a"
            width = 2
            height = 2
            frame = { type = "fits", ctype = ["RA---TAN", "DEC--TAN"], crpix = [1.0, 1.0], crval = [0.0, 0.0] }
        "#;
        assert!(parse_scenario(no_scale).is_err());
    }

    #[test]
    fn test_load_scenario_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, "[[datasets]]\nlabel = \"x\"\nwidth = 1\nheight = 1\n").unwrap();
        let datasets = load_scenario(&path).unwrap();
        assert_eq!(datasets[0].label(), "x");
        assert!(load_scenario(dir.path().join("missing.toml")).is_err());
    }
}
