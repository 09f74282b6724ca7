use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{
    datatypes::{ArchiveData, FieldOutput},
    error::{GreenStrainError, GreenStrainResult},
};

/// Locates one frame inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameKey {
    pub step_index: usize,
    pub step_name: String,
    pub frame_index: usize,
}

impl std::fmt::Display for FrameKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step '{}' frame {}", self.step_name, self.frame_index)
    }
}

/// Read-write access to the steps, frames and field outputs of a results
/// archive. Implementors release their underlying resources when dropped.
pub trait ResultsArchive {
    /// Every frame of every step, in archive order
    fn frame_keys(&self) -> Vec<FrameKey>;

    /// The field output named `name` on a frame, if the frame has one
    fn field_output(&self, key: &FrameKey, name: &str) -> Option<&FieldOutput>;

    /// Adds a field output to a frame, replacing one with the same name
    fn put_field_output(&mut self, key: &FrameKey, field: FieldOutput) -> GreenStrainResult<()>;

    /// Persists all changes
    fn save(&mut self) -> GreenStrainResult<()>;
}

/// Results archive stored as a JSON document
///
/// The file stays open for the lifetime of the archive. [ResultsArchive::save]
/// writes a sibling temporary file and renames it over the archive, so the
/// previous contents survive a failed write.
#[derive(Debug)]
pub struct JsonArchive {
    path: PathBuf,
    file: File,
    data: ArchiveData,
}

impl JsonArchive {
    /// Opens an existing archive for reading and writing
    ///
    /// # Arguments
    /// * `path` - The path to the archive file
    pub fn open(path: &Path) -> GreenStrainResult<JsonArchive> {
        let mut file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(f) => f,
            Err(err) => {
                return Err(GreenStrainError::Archive(format!(
                    "Unable to open archive {}: {err}",
                    path.display()
                )))
            }
        };

        let mut contents = String::new();
        if let Err(err) = file.read_to_string(&mut contents) {
            return Err(GreenStrainError::Archive(format!(
                "Unable to read archive {}: {err}",
                path.display()
            )));
        }

        let data: ArchiveData = match serde_json::from_str(&contents) {
            Ok(d) => d,
            Err(err) => {
                return Err(GreenStrainError::Archive(format!(
                    "Malformed archive {}: {err}",
                    path.display()
                )))
            }
        };

        log::debug!(
            "opened {} with {} steps",
            path.display(),
            data.steps.len()
        );

        Ok(JsonArchive {
            path: path.to_path_buf(),
            file,
            data,
        })
    }

    /// Writes a new archive file, replacing any existing one
    pub fn create(path: &Path, data: &ArchiveData) -> GreenStrainResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush()?;

        Ok(())
    }

    pub fn data(&self) -> &ArchiveData {
        &self.data
    }

    fn write_replacement(&self) -> GreenStrainResult<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };

        let mut replacement = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(replacement.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.data)?;
            writer.flush()?;
        }
        replacement
            .as_file()
            .set_permissions(self.file.metadata()?.permissions())?;
        replacement.as_file().sync_all()?;

        match replacement.persist(&self.path) {
            Ok(_) => Ok(()),
            Err(err) => Err(GreenStrainError::Io(err.error)),
        }
    }
}

impl ResultsArchive for JsonArchive {
    fn frame_keys(&self) -> Vec<FrameKey> {
        self.data
            .steps
            .iter()
            .enumerate()
            .flat_map(|(step_index, step)| {
                (0..step.frames.len()).map(move |frame_index| FrameKey {
                    step_index,
                    step_name: step.name.clone(),
                    frame_index,
                })
            })
            .collect()
    }

    fn field_output(&self, key: &FrameKey, name: &str) -> Option<&FieldOutput> {
        self.data
            .steps
            .get(key.step_index)?
            .frames
            .get(key.frame_index)?
            .field_outputs
            .get(name)
    }

    fn put_field_output(&mut self, key: &FrameKey, field: FieldOutput) -> GreenStrainResult<()> {
        let frame = match self
            .data
            .steps
            .get_mut(key.step_index)
            .and_then(|step| step.frames.get_mut(key.frame_index))
        {
            Some(f) => f,
            None => {
                return Err(GreenStrainError::Archive(format!(
                    "No {key} in archive {}",
                    self.path.display()
                )))
            }
        };

        frame.field_outputs.insert(field.name.clone(), field);

        Ok(())
    }

    fn save(&mut self) -> GreenStrainResult<()> {
        match self.write_replacement() {
            Ok(()) => Ok(()),
            Err(err) => Err(GreenStrainError::Archive(format!(
                "Unable to save archive {}: {err}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{json, Map};

    use super::*;
    use crate::datatypes::{DataBlock, FieldType, FieldValue, Frame, Position, Step};

    fn field(name: &str, value: f64) -> FieldOutput {
        FieldOutput {
            name: name.to_owned(),
            description: String::new(),
            field_type: FieldType::Tensor3DFull,
            component_labels: vec![],
            valid_invariants: vec![],
            is_engineering_tensor: true,
            blocks: vec![DataBlock {
                position: Position::IntegrationPoint,
                instance: "PART-1-1".to_owned(),
                values: vec![FieldValue {
                    element_label: 1,
                    integration_point: Some(1),
                    section_point: None,
                    local_coord_system: None,
                    data: vec![value; 6],
                    extra: Map::new(),
                }],
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    fn sample() -> ArchiveData {
        let frame = |increment: usize| Frame {
            increment,
            frame_value: increment as f64 * 0.5,
            description: String::new(),
            field_outputs: BTreeMap::new(),
            extra: Map::new(),
        };

        ArchiveData {
            name: "Job-1".to_owned(),
            steps: vec![
                Step {
                    name: "Step-1".to_owned(),
                    description: String::new(),
                    frames: vec![frame(0), frame(1)],
                    extra: Map::new(),
                },
                Step {
                    name: "Step-2".to_owned(),
                    description: String::new(),
                    frames: vec![frame(0)],
                    extra: Map::new(),
                },
            ],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_frame_keys_in_archive_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        JsonArchive::create(&path, &sample()).unwrap();

        let archive = JsonArchive::open(&path).unwrap();
        let keys: Vec<(String, usize)> = archive
            .frame_keys()
            .into_iter()
            .map(|k| (k.step_name, k.frame_index))
            .collect();

        assert_eq!(
            keys,
            vec![
                ("Step-1".to_owned(), 0),
                ("Step-1".to_owned(), 1),
                ("Step-2".to_owned(), 0)
            ]
        );
    }

    #[test]
    fn test_put_replaces_and_save_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        JsonArchive::create(&path, &sample()).unwrap();

        {
            let mut archive = JsonArchive::open(&path).unwrap();
            let key = archive.frame_keys()[1].clone();
            archive.put_field_output(&key, field("GE", 1.0)).unwrap();
            archive.put_field_output(&key, field("GE", 2.0)).unwrap();
            archive.save().unwrap();
        }

        let archive = JsonArchive::open(&path).unwrap();
        let keys = archive.frame_keys();
        assert!(archive.field_output(&keys[0], "GE").is_none());
        assert_eq!(archive.field_output(&keys[1], "GE"), Some(&field("GE", 2.0)));
        assert_eq!(archive.data().steps[0].frames[1].field_outputs.len(), 1);
    }

    #[test]
    fn test_save_shrinks_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        let mut data = sample();
        data.name = "x".repeat(4096);
        JsonArchive::create(&path, &data).unwrap();

        {
            let mut archive = JsonArchive::open(&path).unwrap();
            archive.data.name = "Job-1".to_owned();
            archive.save().unwrap();
        }

        let archive = JsonArchive::open(&path).unwrap();
        assert_eq!(archive.data(), &sample());
    }

    #[test]
    fn test_save_never_rewrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        let previous = dir.path().join("Job-1.previous");
        JsonArchive::create(&path, &sample()).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        std::fs::hard_link(&path, &previous).unwrap();

        {
            let mut archive = JsonArchive::open(&path).unwrap();
            let key = archive.frame_keys()[0].clone();
            archive.put_field_output(&key, field("GE", 1.0)).unwrap();
            archive.save().unwrap();
        }

        // the old file is replaced, never truncated and refilled
        assert_eq!(std::fs::read_to_string(&previous).unwrap(), before);
        let archive = JsonArchive::open(&path).unwrap();
        assert!(archive.field_output(&archive.frame_keys()[0], "GE").is_some());

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_unknown_content_survives_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        let document = json!({
            "name": "Job-1",
            "analysis_title": "plate buckling",
            "steps": [{
                "name": "Step-1",
                "procedure": "*STATIC",
                "frames": [{
                    "increment": 0,
                    "frame_value": 0.0,
                    "cyclic_mode": 2,
                    "field_outputs": {
                        "U": {
                            "name": "U",
                            "type": "VECTOR",
                            "base_element_type": "S4R",
                            "blocks": [{
                                "position": "NODAL",
                                "instance": "PLATE-1",
                                "base_element_type": "S4R",
                                "values": [{ "element_label": 0, "node_label": 12, "data": [0.0, 1.5, 0.0] }]
                            }]
                        }
                    }
                }]
            }]
        });
        std::fs::write(&path, document.to_string()).unwrap();

        {
            let mut archive = JsonArchive::open(&path).unwrap();
            let key = archive.frame_keys()[0].clone();
            archive.put_field_output(&key, field("GE", 1.0)).unwrap();
            archive.save().unwrap();
        }

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let step = &saved["steps"][0];
        let u = &step["frames"][0]["field_outputs"]["U"];
        assert_eq!(saved["analysis_title"], "plate buckling");
        assert_eq!(step["procedure"], "*STATIC");
        assert_eq!(step["frames"][0]["cyclic_mode"], 2);
        assert_eq!(u["base_element_type"], "S4R");
        assert_eq!(u["blocks"][0]["base_element_type"], "S4R");
        assert_eq!(u["blocks"][0]["values"][0]["node_label"], 12);
        assert_eq!(u["blocks"][0]["values"][0]["data"], json!([0.0, 1.5, 0.0]));
        assert!(step["frames"][0]["field_outputs"]["GE"].is_object());
    }

    #[test]
    fn test_put_unknown_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Job-1.odb");
        JsonArchive::create(&path, &sample()).unwrap();

        let mut archive = JsonArchive::open(&path).unwrap();
        let key = FrameKey {
            step_index: 4,
            step_name: "Step-5".to_owned(),
            frame_index: 0,
        };
        assert!(matches!(
            archive.put_field_output(&key, field("GE", 0.0)),
            Err(GreenStrainError::Archive(_))
        ));
    }

    #[test]
    fn test_open_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.odb");
        assert!(matches!(
            JsonArchive::open(&missing),
            Err(GreenStrainError::Archive(_))
        ));

        let malformed = dir.path().join("malformed.odb");
        std::fs::write(&malformed, "{\"steps\": 3}").unwrap();
        assert!(matches!(
            JsonArchive::open(&malformed),
            Err(GreenStrainError::Archive(_))
        ));
    }
}
