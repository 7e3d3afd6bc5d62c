use nalgebra::{DMatrix, SVD};

/// Calculate the dot product between two vectors of the same length.
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Calculate the perpendicular distance between a point and the line through the origin along
/// `direction`. The point is projected onto the direction and the length of the residual vector
/// is returned; a degenerate (zero) direction yields `f64::MAX` so it is never selected as the
/// nearest one.
///
/// # Arguments
///
/// * `direction`: The reference direction.
/// * `point`: The point coordinates.
///
/// returns: `f64`
pub fn perpendicular_distance(direction: &[f64], point: &[f64]) -> f64 {
    let denominator = dot_product(direction, direction);
    if denominator <= 0.0 {
        return f64::MAX;
    }
    let k = dot_product(direction, point) / denominator;
    direction
        .iter()
        .zip(point)
        .map(|(d, p)| (k * d - p).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Whether two vectors are element-wise equal within a relative tolerance of `1e-5` and an
/// absolute tolerance of `1e-8`.
pub fn all_close(a: &[f64], b: &[f64]) -> bool {
    const RELATIVE: f64 = 1e-5;
    const ABSOLUTE: f64 = 1e-8;
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= ABSOLUTE + RELATIVE * y.abs())
}

/// Solve the square linear system `A * x = b` with singular value decomposition. This returns
/// `None` when the decomposition does not converge or the solution does not reproduce `b`
/// within tolerance (for example because the system is singular), letting the caller fall back
/// to another strategy.
///
/// # Arguments
///
/// * `a`: The coefficient matrix, one row per nested vector.
/// * `b`: The dependent variable.
///
/// returns: `Option<Vec<f64>>`
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let rows = a.len();
    if rows == 0 || a.iter().any(|row| row.len() != rows) || b.len() != rows {
        return None;
    }

    let flat: Vec<f64> = a.iter().flatten().copied().collect();
    let matrix = DMatrix::from_row_slice(rows, rows, &flat);
    let rhs = DMatrix::from_row_slice(rows, 1, b);

    let svd = SVD::new(matrix.clone(), true, true);
    let solution = svd.solve(&rhs, f64::EPSILON).ok()?;

    let reproduced = matrix * &solution;
    if !all_close(reproduced.data.as_slice(), b) {
        return None;
    }
    Some(solution.data.as_vec().clone())
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use super::{dot_product, perpendicular_distance, solve_linear_system};

    #[test]
    fn test_dot_product() {
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]), 12.0);
    }

    #[test]
    fn test_perpendicular_distance() {
        let distance = perpendicular_distance(&[1.0, 1.0, 1.0], &[0.0, 0.0, 2.0]);
        assert_approx_eq!(f64, distance, 1.632993, epsilon = 0.0001);

        // a point on the line has a zero distance
        let direction = [0.25, 0.5, 0.25];
        let point = [0.5, 1.0, 0.5];
        assert!(perpendicular_distance(&direction, &point) < 1e-9);
    }

    #[test]
    fn test_degenerate_direction() {
        assert_eq!(perpendicular_distance(&[0.0, 0.0], &[1.0, 1.0]), f64::MAX);
    }

    #[test]
    fn test_linear_system() {
        // x + 9y - 5z = -32 / -3x - 5y - 5z = -10 / -2x - 7y + z = 13
        let a = vec![
            vec![1.0, 9.0, -5.0],
            vec![-3.0, -5.0, -5.0],
            vec![-2.0, -7.0, 1.0],
        ];
        let b = vec![-32.0, -10.0, 13.0];
        let x = solve_linear_system(&a, &b).unwrap();
        let expected = [5.0, -3.0, 2.0];
        for (value, expected) in x.iter().zip(&expected) {
            assert_approx_eq!(f64, *value, *expected, epsilon = 0.0001);
        }
    }

    #[test]
    /// A singular system is reported as unsolvable instead of producing garbage.
    fn test_singular_system() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        let b = vec![1.0, 3.0];
        assert!(solve_linear_system(&a, &b).is_none());
    }
}
