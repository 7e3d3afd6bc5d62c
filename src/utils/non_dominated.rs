/// Fast non-dominated sorting from the NSGA-II paper (complexity `O(M * N^2)` with `M`
/// objectives and `N` individuals), generic over the domination predicate so that both the
/// Pareto objective-vector comparison and the scalar-fitness comparison can share it.
///
/// Implemented based on paragraph 3A in:
/// > K. Deb, A. Pratap, S. Agarwal and T. Meyarivan, "A fast and elitist multi-objective genetic
/// > algorithm: NSGA-II," in IEEE Transactions on Evolutionary Computation, vol. 6, no. 2, pp.
/// > 182-197, April 2002, doi: 10.1109/4235.996017.
///
/// # Arguments
///
/// * `items`: The individuals to sort.
/// * `dominates`: The domination predicate; `dominates(a, b)` is true when `a` dominates `b`.
///
/// returns: `Vec<Vec<usize>>`. The fronts in increasing rank, each holding the indices of its
/// members. An empty input produces no fronts.
pub fn fast_non_dominated_sort<T, F>(items: &[T], dominates: F) -> Vec<Vec<usize>>
where
    F: Fn(&T, &T) -> bool,
{
    if items.is_empty() {
        return vec![];
    }

    // `S_p` in the paper: the solutions dominated by each individual
    let mut dominated_by: Vec<Vec<usize>> = vec![vec![]; items.len()];
    // `n_p` in the paper: how many individuals dominate each solution
    let mut domination_counter: Vec<usize> = vec![0; items.len()];

    let mut current_front: Vec<usize> = vec![];
    for p in 0..items.len() {
        for q in (p + 1)..items.len() {
            if dominates(&items[p], &items[q]) {
                dominated_by[p].push(q);
                domination_counter[q] += 1;
            } else if dominates(&items[q], &items[p]) {
                dominated_by[q].push(p);
                domination_counter[p] += 1;
            }
        }
    }
    for (p, &counter) in domination_counter.iter().enumerate() {
        if counter == 0 {
            current_front.push(p);
        }
    }

    let mut fronts = vec![current_front];
    loop {
        let mut next_front: Vec<usize> = vec![];
        for &p in fronts.last().unwrap() {
            for &q in &dominated_by[p] {
                domination_counter[q] -= 1;
                if domination_counter[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        if next_front.is_empty() {
            break;
        }
        fronts.push(next_front);
    }
    fronts
}

#[cfg(test)]
mod test {
    use super::fast_non_dominated_sort;

    /// Pareto domination over minimised objective pairs.
    fn pareto(a: &[f64; 2], b: &[f64; 2]) -> bool {
        a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
    }

    #[test]
    /// Fronts and ranks checked by plotting the objective values by hand.
    fn test_sorting_two_objectives() {
        let objectives = [
            [1.1, 8.1],
            [2.1, 6.1],
            [3.1, 4.1],
            [3.1, 7.1],
            [5.1, 3.1],
            [5.1, 5.1],
            [7.1, 7.1],
            [8.1, 2.1],
            [10.1, 6.1],
            [11.1, 1.1],
            [11.1, 3.1],
        ];
        let fronts = fast_non_dominated_sort(&objectives, pareto);
        assert_eq!(fronts[0], vec![0, 1, 2, 4, 7, 9]);
        assert_eq!(fronts[1], vec![3, 5, 10]);
        assert_eq!(fronts[2], vec![6, 8]);
        assert_eq!(fronts.len(), 3);
    }

    #[test]
    /// Mutually non-dominated individuals end up in a single front.
    fn test_single_front() {
        let objectives = [[1.0, 4.0], [2.0, 3.0], [3.0, 2.0], [4.0, 1.0]];
        let fronts = fast_non_dominated_sort(&objectives, pareto);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0], vec![0, 1, 2, 3]);
    }

    #[test]
    /// Scalar comparisons rank by value with ties grouped together.
    fn test_scalar_domination() {
        let fitness = [0.5, 0.9, 0.5, 0.1];
        let fronts = fast_non_dominated_sort(&fitness, |a, b| a > b);
        assert_eq!(fronts[0], vec![1]);
        assert_eq!(fronts[1], vec![0, 2]);
        assert_eq!(fronts[2], vec![3]);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<[f64; 2]> = vec![];
        assert!(fast_non_dominated_sort(&items, pareto).is_empty());
    }
}
