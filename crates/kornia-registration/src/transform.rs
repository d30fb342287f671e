use glam::{DMat3, DMat4, DVec3};

/// Assemble a 4x4 rigid transform from a rotation matrix and a translation vector.
pub fn rigid_from_parts(rotation: DMat3, translation: DVec3) -> DMat4 {
    DMat4::from_cols(
        rotation.x_axis.extend(0.0),
        rotation.y_axis.extend(0.0),
        rotation.z_axis.extend(0.0),
        translation.extend(1.0),
    )
}

/// Transform a set of points using a rigid transform.
///
/// # Arguments
///
/// * `src_points` - A set of points to be transformed.
/// * `transform` - A 4x4 rigid transform.
/// * `dst_points` - A pre-allocated vector to store the transformed points.
///
/// PRECONDITION: dst_points is a pre-allocated vector of the same size as source.
///
/// Example:
///
/// ```
/// use glam::{DMat4, DVec3};
/// use kornia_registration::transform::transform_points;
///
/// let src_points = vec![[2.0, 2.0, 2.0], [3.0, 4.0, 5.0]];
/// let transform = DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0));
/// let mut dst_points = vec![[0.0; 3]; src_points.len()];
/// transform_points(&src_points, &transform, &mut dst_points);
/// assert_eq!(dst_points[0], [3.0, 2.0, 2.0]);
/// ```
pub fn transform_points(src_points: &[[f64; 3]], transform: &DMat4, dst_points: &mut [[f64; 3]]) {
    assert_eq!(src_points.len(), dst_points.len());

    for (dst, src) in dst_points.iter_mut().zip(src_points.iter()) {
        *dst = transform
            .transform_point3(DVec3::from_array(*src))
            .to_array();
    }
}

/// Norm of the translation part of a rigid transform.
#[inline]
pub fn translation_norm(transform: &DMat4) -> f64 {
    transform.w_axis.truncate().length()
}

/// Rotation angle in radians, in `[0, pi]`, of the rotation part of a rigid transform.
///
/// Computed as `atan2(2 sin(angle), 2 cos(angle))` from the skew-symmetric part
/// and the trace, which keeps full precision for angles close to zero.
pub fn rotation_angle(transform: &DMat4) -> f64 {
    let r = DMat3::from_mat4(*transform);
    let trace = r.x_axis.x + r.y_axis.y + r.z_axis.z;
    let skew = DVec3::new(
        r.y_axis.z - r.z_axis.y,
        r.z_axis.x - r.x_axis.z,
        r.x_axis.y - r.y_axis.x,
    );
    skew.length().atan2(trace - 1.0)
}

/// Transform `X` solving `a * X = b`, i.e. `b` expressed in the frame of `a`.
#[inline]
pub fn relative_transform(a: &DMat4, b: &DMat4) -> DMat4 {
    a.inverse() * *b
}

/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix, or an error for a zero axis.
pub fn axis_angle_to_rotation_matrix(axis: &[f64; 3], angle: f64) -> Result<DMat3, &'static str> {
    let axis = DVec3::from_array(*axis);
    if axis.length() < 1e-10 {
        return Err("cannot compute rotation matrix from a zero vector");
    }
    Ok(DMat3::from_axis_angle(axis.normalize(), angle))
}
