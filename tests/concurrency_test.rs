//! Test that the library is safe to use concurrently from multiple threads.

use std::thread;

use shift_support::{
    bootstrap_support, CholeskySqrt, CollaboratorError, Matrix, PhyloTree, Response, ShiftModel,
    ShiftSet, Vector,
};

struct Star(usize);

impl PhyloTree for Star {
    fn edge_count(&self) -> usize {
        self.0
    }
}

fn star_covariance(tree: &Star, alpha: f64) -> Matrix {
    // Shared root-to-tip variance decays with alpha, tips otherwise independent.
    let shared = (-2.0 * alpha).exp() * 0.5;
    Matrix::from_fn(tree.0, tree.0, |i, j| if i == j { 1.0 } else { shared })
}

fn largest_tip(_: &Star, response: &Response, _: &()) -> Result<ShiftSet, CollaboratorError> {
    let Response::Univariate(v) = response else {
        return Err("expected univariate response".into());
    };
    Ok(ShiftSet::from([v.imax() + 1]))
}

#[test]
fn library_is_thread_safe() {
    // Spawn 4 threads, each running its own parallel bootstrap
    let handles: Vec<_> = (0..4)
        .map(|i| {
            thread::spawn(move || {
                let tree = Star(6);
                let y = Vector::from_fn(6, |j, _| ((i + j) % 4) as f64);
                let model = ShiftModel::univariate(y, Vector::zeros(6), 0.5, ());
                let sqrt = CholeskySqrt::new(star_covariance);

                let result = bootstrap_support(&tree, &model, 20, true, 2, &sqrt, &largest_tip).unwrap();
                result.valid_iterations == 20 && (result.rates.iter().sum::<f64>() - 1.0).abs() < 1e-12
            })
        })
        .collect();

    // All threads should complete successfully
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
