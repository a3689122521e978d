//! Node transformation data for GPU rendering.
//!
//! Every mesh node of the card owns a one-element instance buffer holding its
//! world transform. The buffer is rewritten each frame after the animation
//! director moved the nodes.

use std::ops::Mul;

use cgmath::{Matrix3, Matrix4, One, Quaternion, SquareMatrix, Vector3};

use crate::data_structures::model;

/// Translation, rotation and scale of a scene node.
///
/// Used both as the local transform (relative to the parent, as authored in the
/// glTF file and animated by keyframes) and as the composed world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// The identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// `T * R * S`, the order glTF defines for node transforms.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse transpose of the linear part of [`to_matrix`](Self::to_matrix), `R * S^-1`.
    /// Degenerate scales keep the rotation only.
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let rotation = Matrix3::from(self.rotation);
        if self.scale.x == 0.0 || self.scale.y == 0.0 || self.scale.z == 0.0 {
            return rotation;
        }
        rotation * Matrix3::from_diagonal(self.scale.map(f32::recip))
    }

    pub fn to_raw(&self) -> InstanceRaw {
        let model = self.to_matrix();
        InstanceRaw {
            // Mirrored nodes wind their front faces clockwise
            handedness: if model.determinant() < 0.0 { -1.0 } else { 1.0 },
            model: model.into(),
            normal: self.normal_matrix().into(),
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }
}

impl From<gltf::scene::Transform> for Instance {
    fn from(transform: gltf::scene::Transform) -> Self {
        let (translation, [x, y, z, w], scale) = transform.decomposed();
        Self {
            position: translation.into(),
            rotation: Quaternion::new(w, x, y, z),
            scale: scale.into(),
        }
    }
}

/// Composes a parent's world transform with a child's local transform.
///
/// Scale is kept per axis, so shear from non-uniform parent scale combined with a
/// rotated child is dropped. The card model has uniform scales only.
impl Mul<&Instance> for &Instance {
    type Output = Instance;

    fn mul(self, child: &Instance) -> Instance {
        let scaled = Vector3::new(
            self.scale.x * child.position.x,
            self.scale.y * child.position.y,
            self.scale.z * child.position.z,
        );
        Instance {
            position: self.position + self.rotation * scaled,
            rotation: self.rotation * child.rotation,
            scale: Vector3::new(
                self.scale.x * child.scale.x,
                self.scale.y * child.scale.y,
                self.scale.z * child.scale.z,
            ),
        }
    }
}

impl Mul for Instance {
    type Output = Instance;

    fn mul(self, child: Instance) -> Instance {
        &self * &child
    }
}

/**
 * The raw instance is the actual data stored on the GPU:
 * the world matrix, the normal matrix and the sign of the world matrix' determinant.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.model.into()
    }

    pub fn normal_matrix(&self) -> Matrix3<f32> {
        self.normal.into()
    }

    /// `-1` for mirrored transforms, `1` otherwise.
    pub fn handedness(&self) -> f32 {
        self.handedness
    }

    // Locations 0..=2 belong to `ModelVertex`; a mat4 takes four slots, a mat3 three.
    const ATTRIBUTES: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        5 => Float32x4, 6 => Float32x4, 7 => Float32x4, 8 => Float32x4,
        9 => Float32x3, 10 => Float32x3, 11 => Float32x3,
        12 => Float32
    ];
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Only advance to the next element once per instance, not per vertex
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
