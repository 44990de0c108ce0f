//! Node transform math on column-major 4x4 matrices.

/// Composes `T * R * S` into a column-major matrix.
///
/// `rotation` is a quaternion `[x, y, z, w]`.
pub fn compose_trs(translation: [f64; 3], rotation: [f64; 4], scale: [f64; 3]) -> [f64; 16] {
    let [t0, t1, t2] = translation;
    let [qx, qy, qz, qw] = rotation;
    let [s0, s1, s2] = scale;

    let xx = qx * qx;
    let yy = qy * qy;
    let zz = qz * qz;
    let xy = qx * qy;
    let xz = qx * qz;
    let yz = qy * qz;
    let wx = qw * qx;
    let wy = qw * qy;
    let wz = qw * qz;

    // Rotation rows
    let r = [
        [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy)],
        [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx)],
        [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy)],
    ];

    [
        r[0][0] * s0, r[1][0] * s0, r[2][0] * s0, 0.0,
        r[0][1] * s1, r[1][1] * s1, r[2][1] * s1, 0.0,
        r[0][2] * s2, r[1][2] * s2, r[2][2] * s2, 0.0,
        t0, t1, t2, 1.0,
    ]
}

/// Column-major product `a * b`.
pub fn multiply(a: &[f64; 16], b: &[f64; 16]) -> [f64; 16] {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[col * 4 + row] = (0..4).map(|k| a[k * 4 + row] * b[col * 4 + k]).sum();
        }
    }
    out
}

/// Applies a column-major matrix to a point.
pub fn transform_point(m: &[f64; 16], p: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, o) in out.iter_mut().enumerate() {
        *o = m[row] * p[0] + m[4 + row] * p[1] + m[8 + row] * p[2] + m[12 + row];
    }
    out
}
