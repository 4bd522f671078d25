//! Simple example demonstrating bootstrap support on a toy tree.
//!
//! The tree is a star with one edge per tip; the "estimator" flags tips whose
//! value sits more than one unit above the grand mean. Real callers plug in
//! their own tree type, OU covariance and shift-configuration search.

use shift_support::{
    output, CholeskySqrt, CollaboratorError, Matrix, PhyloTree, Response, ShiftBootstrap,
    ShiftModel, ShiftSet, Vector,
};

struct Star {
    tips: usize,
}

impl PhyloTree for Star {
    fn edge_count(&self) -> usize {
        self.tips
    }
}

fn covariance(tree: &Star, alpha: f64) -> Matrix {
    let shared = 0.5 * (-2.0 * alpha).exp();
    Matrix::from_fn(tree.tips, tree.tips, |i, j| if i == j { 1.0 } else { shared })
}

fn above_mean(_: &Star, response: &Response, margin: &f64) -> Result<ShiftSet, CollaboratorError> {
    let data = response.to_matrix();
    let mean = data.mean();
    Ok(data
        .row_iter()
        .enumerate()
        .filter(|(_, row)| row.mean() - mean > *margin)
        .map(|(i, _)| i + 1)
        .collect())
}

fn main() {
    println!("shift-support simple example\n");

    let tree = Star { tips: 10 };
    // Shifts on edges 2 and 5.
    let mu = Vector::from_fn(10, |i, _| if i == 1 || i == 4 { 3.0 } else { 0.0 });
    let noise = Vector::from_vec(vec![0.3, -0.2, 0.5, -0.7, 0.1, 0.4, -0.3, 0.0, 0.6, -0.5]);
    let model = ShiftModel::univariate(&mu + &noise, mu, 0.6, 1.0);
    let sqrt = CholeskySqrt::new(covariance);

    let result = match ShiftBootstrap::new()
        .iterations(200)
        .multicore(4)
        .run(&tree, &model, &sqrt, &above_mean)
    {
        Ok(result) => result,
        Err(err) => {
            println!("bootstrap failed: {err}");
            return;
        }
    };

    println!(
        "{} of {} replicates valid",
        result.valid_iterations, result.iterations
    );
    for edge in 1..=result.edge_count() {
        let rate = result.rate(edge).unwrap_or(0.0);
        if rate > 0.0 {
            println!("  edge {edge:>2}: {:.1}%", rate * 100.0);
        }
    }

    if let Ok(json) = output::to_json_pretty(&result) {
        println!("\n{json}");
    }
}
