use nalgebra::{Matrix3, Quaternion, UnitQuaternion};

use crate::error::{GreenStrainError, GreenStrainResult};

/// Normal components, in compact order
const NORMAL: [(usize, usize); 3] = [(0, 0), (1, 1), (2, 2)];

/// Shear components of a 2D (plane, shell) tensor: e12
const PLANAR_SHEAR: [(usize, usize); 1] = [(0, 1)];

/// Shear components of a 3D tensor: e12, e13, e23
const FULL_SHEAR: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Compact layouts of a symmetric tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// e11, e22, e33, e12
    Planar,
    /// e11, e22, e33, e12, e13, e23
    Full,
}

impl TensorLayout {
    pub fn from_len(len: usize) -> GreenStrainResult<TensorLayout> {
        match len {
            4 => Ok(TensorLayout::Planar),
            6 => Ok(TensorLayout::Full),
            n => Err(GreenStrainError::TensorShape(n)),
        }
    }

    pub fn len(&self) -> usize {
        NORMAL.len() + self.shear_indices().len()
    }

    fn shear_indices(&self) -> &'static [(usize, usize)] {
        match self {
            TensorLayout::Planar => &PLANAR_SHEAR,
            TensorLayout::Full => &FULL_SHEAR,
        }
    }
}

/// How shear components are stored in the compact list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShearConvention {
    /// gamma_ij = 2 * e_ij
    Engineering,
    /// e_ij
    Tensor,
}

impl ShearConvention {
    pub fn from_engineering_flag(is_engineering_tensor: bool) -> ShearConvention {
        if is_engineering_tensor {
            ShearConvention::Engineering
        } else {
            ShearConvention::Tensor
        }
    }

    fn factor(&self) -> f64 {
        match self {
            ShearConvention::Engineering => 2.0,
            ShearConvention::Tensor => 1.0,
        }
    }
}

/// Expands compact tensor components into a dense symmetric matrix
///
/// Off-diagonal terms are mirrored. Components missing from a planar layout
/// (e13, e23) stay zero.
///
/// # Arguments
/// * `components` - 4 or 6 components in compact order
/// * `shear` - The convention the shear components are stored in
///
/// # Returns
/// The dense 3x3 tensor
pub fn compact_to_dense(
    components: &[f64],
    shear: ShearConvention,
) -> GreenStrainResult<Matrix3<f64>> {
    let layout = TensorLayout::from_len(components.len())?;
    let mut dense: Matrix3<f64> = Matrix3::zeros();

    let (normal, shear_terms) = components.split_at(NORMAL.len());
    for (&(i, j), value) in NORMAL.iter().zip(normal) {
        dense[(i, j)] = *value;
    }
    for (&(i, j), value) in layout.shear_indices().iter().zip(shear_terms) {
        let tensor_shear = value / shear.factor();
        dense[(i, j)] = tensor_shear;
        dense[(j, i)] = tensor_shear;
    }

    Ok(dense)
}

/// Collects the unique entries of a symmetric matrix in compact order
///
/// # Arguments
/// * `dense` - The symmetric 3x3 tensor
/// * `layout` - The compact layout to produce
/// * `shear` - The convention to write shear components in
pub fn dense_to_compact(dense: &Matrix3<f64>, layout: TensorLayout, shear: ShearConvention) -> Vec<f64> {
    let mut components: Vec<f64> = Vec::with_capacity(layout.len());

    for &(i, j) in NORMAL.iter() {
        components.push(dense[(i, j)]);
    }
    for &(i, j) in layout.shear_indices() {
        components.push(dense[(i, j)] * shear.factor());
    }

    components
}

/// Computes Green strain from Nominal strain
///
/// GE = 1/2 (V * V^T - I) with V = NE + I. The product is evaluated as
/// NE * NE^T + NE + NE^T, which is the same matrix without the cancellation
/// against I that loses digits for small strains.
///
/// # Arguments
/// * `nominal` - Nominal strain components, 4 (2D) or 6 (3D)
/// * `shear` - The convention of the shear components, used for input and output
///
/// # Returns
/// Green strain components in the same layout as `nominal`
pub fn green_strain(nominal: &[f64], shear: ShearConvention) -> GreenStrainResult<Vec<f64>> {
    let layout = TensorLayout::from_len(nominal.len())?;
    let ne = compact_to_dense(nominal, shear)?;

    let ge = (ne * ne.transpose()) * 0.5 + (ne + ne.transpose()) * 0.5;

    Ok(dense_to_compact(&ge, layout, shear))
}

/// Rotation matrix of a quaternion stored as `[q1, q2, q3, q0]`
pub fn quaternion_to_matrix(quaternion: [f64; 4]) -> [[f64; 3]; 3] {
    let [q1, q2, q3, q0] = quaternion;
    let rotation = UnitQuaternion::new_unchecked(Quaternion::new(q0, q1, q2, q3));

    matrix_rows(&rotation.to_rotation_matrix().into_inner())
}

/// Rotation matrix of the inverse of a quaternion stored as `[q1, q2, q3, q0]`
pub fn inverse_quaternion_matrix(quaternion: [f64; 4]) -> [[f64; 3]; 3] {
    let [q1, q2, q3, q0] = quaternion;
    let rotation = UnitQuaternion::new_unchecked(Quaternion::new(q0, q1, q2, q3)).inverse();

    matrix_rows(&rotation.to_rotation_matrix().into_inner())
}

fn matrix_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}
