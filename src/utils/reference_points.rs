/// Generate the reference directions on the unit simplex with the Das & Dennis methodology:
///
/// > Indraneel Das and J. E. Dennis. Normal-Boundary Intersection: A New Method for Generating
/// > the Pareto Surface in Nonlinear Multicriteria Optimization Problems. SIAM Journal on
/// > Optimization. 1998 8:3, 631-657. <https://doi.org/10.1137/S1052623496307510>
///
/// The first entry of `partitions` generates the boundary layer. When a second entry is given,
/// an inside layer is generated with it and shrunk toward the simplex centroid `1/M` by
/// averaging each coordinate with it (the two-layer construction of the NSGA-III paper, used
/// for many-objective problems).
///
/// # Arguments
///
/// * `number_of_objectives`: The number of objectives `M`.
/// * `partitions`: The number of uniform gaps of each layer.
///
/// returns: `Vec<Vec<f64>>`. Each point has `M` non-negative coordinates summing to one.
pub fn das_dennis_points(number_of_objectives: usize, partitions: &[usize]) -> Vec<Vec<f64>> {
    let mut points = generate_layer(number_of_objectives, partitions[0]);

    if partitions.len() > 1 {
        let centre = 1.0 / number_of_objectives as f64;
        for mut point in generate_layer(number_of_objectives, partitions[1]) {
            for coordinate in point.iter_mut() {
                *coordinate = (centre + *coordinate) / 2.0;
            }
            points.push(point);
        }
    }
    points
}

/// Enumerate all the non-negative integer vectors summing to `partitions`, divided by it.
fn generate_layer(number_of_objectives: usize, partitions: usize) -> Vec<Vec<f64>> {
    let mut points = vec![];
    let mut position = vec![0.0; number_of_objectives];
    generate_recursive(
        &mut points,
        &mut position,
        number_of_objectives,
        partitions,
        partitions,
        0,
    );
    points
}

fn generate_recursive(
    points: &mut Vec<Vec<f64>>,
    position: &mut Vec<f64>,
    number_of_objectives: usize,
    left: usize,
    total: usize,
    element: usize,
) {
    if element == number_of_objectives - 1 {
        position[element] = left as f64 / total as f64;
        points.push(position.clone());
    } else {
        for i in 0..=left {
            position[element] = i as f64 / total as f64;
            generate_recursive(
                points,
                position,
                number_of_objectives,
                left - i,
                total,
                element + 1,
            );
        }
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;

    use crate::utils::perpendicular_distance;

    use super::das_dennis_points;

    fn assert_on_simplex(points: &[Vec<f64>]) {
        for point in points {
            assert!(point.iter().all(|&coordinate| coordinate >= 0.0));
            assert_approx_eq!(f64, point.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    /// Point counts follow the binomial coefficient C(M + p - 1, p).
    fn test_point_counts() {
        assert_eq!(das_dennis_points(2, &[6]).len(), 7);
        assert_eq!(das_dennis_points(3, &[6]).len(), 28);
        assert_eq!(das_dennis_points(5, &[6]).len(), 210);
    }

    #[test]
    fn test_points_on_simplex() {
        for objectives in [2, 3, 5] {
            assert_on_simplex(&das_dennis_points(objectives, &[6]));
        }
    }

    #[test]
    /// The distance of a generated direction from itself is zero.
    fn test_direction_self_distance() {
        for point in das_dennis_points(5, &[6]) {
            if point.iter().any(|&coordinate| coordinate > 0.0) {
                assert!(perpendicular_distance(&point, &point) < 1e-9);
            }
        }
    }

    #[test]
    /// The two-layer construction adds the shrunk inside layer.
    fn test_two_layers() {
        let points = das_dennis_points(8, &[3, 2]);
        let boundary = das_dennis_points(8, &[3]).len();
        let inside = das_dennis_points(8, &[2]).len();
        assert_eq!(points.len(), boundary + inside);

        // inside points are pulled toward the centroid and still sum to one
        for point in &points[boundary..] {
            assert_approx_eq!(f64, point.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            assert!(point.iter().all(|&coordinate| coordinate >= 1.0 / 16.0 - 1e-12));
        }
    }
}
