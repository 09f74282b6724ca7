use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use serde_json::Map;

use crate::{
    archive::{JsonArchive, ResultsArchive},
    datatypes::{DataBlock, FieldOutput, FieldValue, LocalCoordSystem},
    error::{GreenStrainError, GreenStrainResult},
    report::{ArchiveReport, FrameIssue, RunReport},
    settings::Settings,
    tensor::{green_strain, inverse_quaternion_matrix, ShearConvention},
};

/// Adds Green strain field outputs to every frame holding Nominal strain
#[derive(Debug, Clone, Default)]
pub struct FrameWalker {
    settings: Settings,
}

impl FrameWalker {
    pub fn new(settings: Settings) -> FrameWalker {
        FrameWalker { settings }
    }

    /// Processes each archive in turn. A failure on one archive never stops
    /// the following ones.
    pub fn run(&self, paths: &[PathBuf]) -> RunReport {
        let mut report = RunReport::default();

        for path in paths {
            report.archives.push(self.process(path));
        }

        report
    }

    /// Opens, updates and saves one archive
    ///
    /// # Arguments
    /// * `path` - The path to the archive file
    ///
    /// # Returns
    /// The outcome of every frame, or the reason the archive failed
    pub fn process(&self, path: &Path) -> ArchiveReport {
        let mut report = ArchiveReport::new(path);

        log::info!("processing {}", path.display());
        let mut archive = match JsonArchive::open(path) {
            Ok(a) => a,
            Err(err) => {
                log::error!("{err}");
                report.failure = Some(err.to_string());
                return report;
            }
        };

        self.update_archive(&mut archive, &mut report);
        if report.is_failed() {
            return report;
        }

        log::info!(
            "{}: {} frames updated, {} skipped, {} failed",
            path.display(),
            report.frames_updated,
            report.frames_skipped.len(),
            report.frame_errors.len()
        );

        report
    }

    /// Adds the Green strain field to every frame of an open archive and saves
    /// it when any frame changed. Nothing counts as updated if the save fails.
    pub fn update_archive<A: ResultsArchive>(&self, archive: &mut A, report: &mut ArchiveReport) {
        self.process_archive(archive, report);

        if report.frames_updated == 0 {
            return;
        }
        if let Err(err) = archive.save() {
            log::error!("{err}");
            report.frames_updated = 0;
            report.failure = Some(err.to_string());
        }
    }

    /// Adds the Green strain field to every frame of an open archive.
    /// Does not save the archive.
    pub fn process_archive<A: ResultsArchive>(&self, archive: &mut A, report: &mut ArchiveReport) {
        let source_name = self.settings.source_field.as_str();
        let frame_keys = archive.frame_keys();

        let bar = ProgressBar::new(frame_keys.len() as u64);
        for key in frame_keys {
            bar.inc(1);

            let green = match archive.field_output(&key, source_name) {
                Some(source) => self.green_field(source),
                None => {
                    log::debug!("{key} has no {source_name} field output");
                    report.frames_skipped.push(FrameIssue {
                        frame: key,
                        reason: format!("no {source_name} field output"),
                    });
                    continue;
                }
            };

            let outcome = match green {
                Ok(field) => archive.put_field_output(&key, field),
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => report.frames_updated += 1,
                Err(err) => {
                    log::warn!("{key}: {err}");
                    report.frame_errors.push(FrameIssue {
                        frame: key,
                        reason: err.to_string(),
                    });
                }
            }
        }
        bar.finish_and_clear();
    }

    /// Builds the Green strain field output for one Nominal strain field
    ///
    /// Every value keeps its block, location and component layout. Any value
    /// that cannot be transformed fails the whole field.
    pub fn green_field(&self, source: &FieldOutput) -> GreenStrainResult<FieldOutput> {
        if !source.field_type.is_tensor() {
            return Err(GreenStrainError::Field(format!(
                "{} is not a tensor field ({:?})",
                source.name, source.field_type
            )));
        }

        let shear = ShearConvention::from_engineering_flag(source.is_engineering_tensor);

        let mut blocks: Vec<DataBlock> = Vec::with_capacity(source.blocks.len());
        for block in &source.blocks {
            let mut values: Vec<FieldValue> = Vec::with_capacity(block.values.len());
            for value in &block.values {
                let data = match green_strain(&value.data, shear) {
                    Ok(d) => d,
                    Err(err) => {
                        return Err(GreenStrainError::Field(format!(
                            "{} element {} of {}: {err}",
                            source.name, value.element_label, block.instance
                        )))
                    }
                };
                // the archive cannot store inf or NaN
                if !data.iter().all(|c| c.is_finite()) {
                    return Err(GreenStrainError::Field(format!(
                        "{} element {} of {}: non-finite Green strain {:?}",
                        source.name, value.element_label, block.instance, data
                    )));
                }

                values.push(FieldValue {
                    element_label: value.element_label,
                    integration_point: value.integration_point,
                    section_point: value.section_point,
                    local_coord_system: self.local_coord_system(value),
                    data,
                    extra: value.extra.clone(),
                });
            }

            blocks.push(DataBlock {
                position: block.position,
                instance: block.instance.clone(),
                values,
                extra: block.extra.clone(),
            });
        }

        Ok(FieldOutput {
            name: self.settings.target_field.clone(),
            description: self.settings.description.clone(),
            field_type: source.field_type,
            component_labels: source
                .component_labels
                .iter()
                .map(|label| relabel(label, &source.name, &self.settings.target_field))
                .collect(),
            valid_invariants: source.valid_invariants.clone(),
            is_engineering_tensor: source.is_engineering_tensor,
            blocks,
            extra: Map::new(),
        })
    }

    fn local_coord_system(&self, value: &FieldValue) -> Option<LocalCoordSystem> {
        if !self.settings.local_coord_system {
            return None;
        }

        match value.local_coord_system? {
            // written back as the direction matrix of the inverse rotation
            LocalCoordSystem::Quaternion(q) => {
                Some(LocalCoordSystem::Matrix(inverse_quaternion_matrix(q)))
            }
            matrix @ LocalCoordSystem::Matrix(_) => Some(matrix),
        }
    }
}

/// Swaps the field name prefix of a component label, `NE11` -> `GE11`
fn relabel(label: &str, source_name: &str, target_name: &str) -> String {
    match label.strip_prefix(source_name) {
        Some(suffix) => format!("{target_name}{suffix}"),
        None => label.to_owned(),
    }
}

/// Job completion hook for a host environment. Processes `<save_dir>/<job_id>.odb`.
///
/// # Arguments
/// * `save_dir` - The directory the job wrote its results to
/// * `job_id` - The job name
pub fn on_job_completion(save_dir: &Path, job_id: &str) -> GreenStrainResult<ArchiveReport> {
    let settings = Settings::discover()?;
    let path = save_dir.join(format!("{job_id}.odb"));

    Ok(FrameWalker::new(settings).process(&path))
}
