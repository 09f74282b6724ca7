use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top level contents of a results archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveData {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
    /// Archive content this model does not name, kept as read
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An analysis step and its ordered frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub frames: Vec<Frame>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One time snapshot of a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub increment: usize,
    pub frame_value: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub field_outputs: BTreeMap<String, FieldOutput>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Scalar,
    Vector,
    #[serde(rename = "TENSOR_3D_FULL")]
    Tensor3DFull,
    #[serde(rename = "TENSOR_3D_PLANAR")]
    Tensor3DPlanar,
    #[serde(rename = "TENSOR_2D_PLANAR")]
    Tensor2DPlanar,
    #[serde(rename = "TENSOR_3D_SURFACE")]
    Tensor3DSurface,
    #[serde(rename = "TENSOR_2D_SURFACE")]
    Tensor2DSurface,
}

impl FieldType {
    pub fn is_tensor(&self) -> bool {
        !matches!(self, FieldType::Scalar | FieldType::Vector)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Invariant {
    Magnitude,
    Mises,
    Tresca,
    Press,
    Inv3,
    MaxPrincipal,
    MidPrincipal,
    MinPrincipal,
    MaxInplanePrincipal,
    MinInplanePrincipal,
    OutofplanePrincipal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Nodal,
    IntegrationPoint,
    ElementNodal,
    Centroid,
    WholeElement,
}

/// Named field data attached to a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub component_labels: Vec<String>,
    #[serde(default)]
    pub valid_invariants: Vec<Invariant>,
    /// Shear components are stored as engineering shear (2 * e_ij)
    #[serde(default)]
    pub is_engineering_tensor: bool,
    pub blocks: Vec<DataBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Values of a field output sharing one position and part instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    pub position: Position,
    pub instance: String,
    pub values: Vec<FieldValue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single field value at one element location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub element_label: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_point: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_point: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_coord_system: Option<LocalCoordSystem>,
    pub data: Vec<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Orientation of the basis a value is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalCoordSystem {
    /// `[q1, q2, q3, q0]`, scalar part last
    Quaternion([f64; 4]),
    /// Row-major direction matrix
    Matrix([[f64; 3]; 3]),
}
