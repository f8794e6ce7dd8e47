//! Nearest-centroid level model
//!
//! Features are the applicant's years of experience plus one-hot columns
//! for education level and field of study. Columns are fixed at fit time;
//! categories never seen in training encode as all zeros. Every column is
//! standard-scaled with the training mean and population deviation, and a
//! record is assigned the label of the closest class centroid.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::error::{ClassifierError, ClassifierResult};
use crate::traits::{Classifier, Features};

pub const EXPERIENCE_FIELD: &str = "Experiencia (años)";
pub const EDUCATION_FIELD: &str = "Nivel Educativo";
pub const STUDY_FIELD: &str = "Campo Estudio";
pub const LABEL_FIELD: &str = "Nivel";

const EXPERIENCE_COLUMN: &str = "Experiencia_años";
const EDUCATION_PREFIX: &str = "NivelEd_";
const STUDY_PREFIX: &str = "Campo_";
const UNKNOWN_CATEGORY: &str = "Desconocido";

#[derive(Clone, Debug)]
pub struct CentroidModel {
    columns: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
    centroids: Vec<(String, Vec<f64>)>,
}

/// One parsed training row
struct Sample {
    experience: f64,
    education: String,
    study: String,
    label: String,
}

impl CentroidModel {
    /// Fit from labelled rows
    ///
    /// Rows without a label or with a non-numeric experience value are
    /// skipped. Fails if no usable row remains.
    pub fn fit(rows: &[Features]) -> ClassifierResult<Self> {
        let samples: Vec<Sample> = rows.iter().filter_map(Sample::parse).collect();
        if samples.is_empty() {
            return Err(ClassifierError::Model(
                "no usable training rows".into(),
            ));
        }

        let educations: BTreeSet<&str> = samples.iter().map(|s| s.education.as_str()).collect();
        let studies: BTreeSet<&str> = samples.iter().map(|s| s.study.as_str()).collect();

        let mut columns = vec![EXPERIENCE_COLUMN.to_string()];
        columns.extend(educations.iter().map(|v| format!("{EDUCATION_PREFIX}{v}")));
        columns.extend(studies.iter().map(|v| format!("{STUDY_PREFIX}{v}")));

        let mut model = Self {
            columns,
            mean: Vec::new(),
            scale: Vec::new(),
            centroids: Vec::new(),
        };

        let matrix: Vec<Vec<f64>> = samples
            .iter()
            .map(|s| model.encode_parts(s.experience, &s.education, &s.study))
            .collect();
        let (mean, scale) = standardization(&matrix, model.columns.len());
        model.mean = mean;
        model.scale = scale;

        let mut sums: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();
        for (sample, row) in samples.iter().zip(&matrix) {
            let scaled = model.standardize(row.clone());
            let (sum, count) = sums
                .entry(sample.label.as_str())
                .or_insert_with(|| (vec![0.0; scaled.len()], 0));
            for (acc, x) in sum.iter_mut().zip(&scaled) {
                *acc += x;
            }
            *count += 1;
        }
        model.centroids = sums
            .into_iter()
            .map(|(label, (sum, count))| {
                let n = count as f64;
                (label.to_string(), sum.into_iter().map(|x| x / n).collect())
            })
            .collect();

        tracing::debug!(
            rows = samples.len(),
            columns = model.columns.len(),
            labels = model.centroids.len(),
            "fitted centroid model"
        );
        Ok(model)
    }

    /// Fit from a JSON document holding an array of row objects
    pub fn from_json(bytes: &[u8]) -> ClassifierResult<Self> {
        let rows: Vec<Features> = serde_json::from_slice(bytes)
            .map_err(|e| ClassifierError::Model(format!("invalid training data: {e}")))?;
        Self::fit(&rows)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ClassifierResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            ClassifierError::Model(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&bytes)
    }

    /// Feature column names in encoding order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Known labels, sorted
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|(label, _)| label.as_str())
    }

    fn encode(&self, fields: &Features) -> ClassifierResult<Vec<f64>> {
        let experience = match fields.get(EXPERIENCE_FIELD) {
            None | Some(Value::Null) => 0.0,
            Some(value) => numeric(value).ok_or_else(|| {
                ClassifierError::InvalidInput(format!("{EXPERIENCE_FIELD} is not a number"))
            })?,
        };
        let education = category(fields.get(EDUCATION_FIELD));
        let study = category(fields.get(STUDY_FIELD));

        Ok(self.encode_parts(experience, &education, &study))
    }

    fn encode_parts(&self, experience: f64, education: &str, study: &str) -> Vec<f64> {
        let education = format!("{EDUCATION_PREFIX}{education}");
        let study = format!("{STUDY_PREFIX}{study}");

        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                if i == 0 {
                    experience
                } else if *column == education || *column == study {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn standardize(&self, mut row: Vec<f64>) -> Vec<f64> {
        for ((x, mean), scale) in row.iter_mut().zip(&self.mean).zip(&self.scale) {
            *x = (*x - mean) / scale;
        }
        row
    }
}

impl Classifier for CentroidModel {
    fn name(&self) -> &'static str {
        "centroid"
    }

    fn predict(&self, fields: &Features) -> ClassifierResult<String> {
        let point = self.standardize(self.encode(fields)?);

        let mut best: Option<(&str, f64)> = None;
        for (label, centroid) in &self.centroids {
            let distance: f64 = point
                .iter()
                .zip(centroid)
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((label.as_str(), distance));
            }
        }

        best.map(|(label, _)| label.to_string())
            .ok_or_else(|| ClassifierError::Model("model has no classes".into()))
    }
}

impl Sample {
    fn parse(row: &Features) -> Option<Self> {
        let label = match row.get(LABEL_FIELD)? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let experience = numeric(row.get(EXPERIENCE_FIELD)?)?;

        Some(Self {
            experience,
            education: category(row.get(EDUCATION_FIELD)),
            study: category(row.get(STUDY_FIELD)),
            label,
        })
    }
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

fn category(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN_CATEGORY.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Per-column mean and population standard deviation (1.0 for constant columns)
fn standardization(matrix: &[Vec<f64>], width: usize) -> (Vec<f64>, Vec<f64>) {
    let n = matrix.len() as f64;
    let mut mean = vec![0.0; width];
    for row in matrix {
        for (m, x) in mean.iter_mut().zip(row) {
            *m += x / n;
        }
    }

    let mut scale = vec![0.0; width];
    for row in matrix {
        for ((s, x), m) in scale.iter_mut().zip(row).zip(&mean) {
            *s += (x - m) * (x - m) / n;
        }
    }
    for s in &mut scale {
        *s = s.sqrt();
        if *s == 0.0 {
            *s = 1.0;
        }
    }

    (mean, scale)
}
