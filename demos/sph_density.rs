//! Computes SPH densities of a periodic box of randomly placed particles and
//! advances them a few steps, keeping the bucket search up to date.
//!
//! Run with `cargo run --release --example sph_density`.

use bucketsearch::{parallel, vector, BoundingBox, BucketSearch, SearchDomain, Vect3d};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::time::Instant;

#[derive(Clone, Debug)]
struct Particle {
    position: Vect3d,
    velocity: Vect3d,
    mass: f64,
}

/// Cubic spline kernel with support radius `h`.
fn kernel(r: f64, h: f64) -> f64 {
    let q = 2.0 * r / h;
    let sigma = 8.0 / (PI * h * h * h);
    if q < 1.0 {
        sigma * (1.0 - 1.5 * q * q + 0.75 * q * q * q)
    } else if q < 2.0 {
        sigma * 0.25 * (2.0 - q).powi(3)
    } else {
        0.0
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let count = 20_000;
    let side = 20.0;
    let h = 1.0;

    let mut rng = StdRng::seed_from_u64(7);
    let mut particles: Vec<Particle> = (0..count)
        .map(|_| Particle {
            position: [rng.gen_range(0.0..side), rng.gen_range(0.0..side), rng.gen_range(0.0..side)],
            velocity: [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)],
            mass: 1.0,
        })
        .collect();

    let domain = SearchDomain::new(BoundingBox::new([0.0; 3], [side; 3]))
        .with_periodic([true; 3])
        .with_interaction_radius(h);
    let mut search = BucketSearch::with_domain(&domain, |p: &Particle| p.position)?;
    search.embed(&particles);
    println!("Grid of {:?} buckets for {} particles", search.grid().num_real_cells(), count);

    let dt = 0.05;
    for step in 0..5 {
        let start = Instant::now();
        let densities = parallel::map_neighbors(&search, &particles, false, |_, p, neighbors| {
            // the search is a cube test, the kernel cuts it to a sphere
            p.mass * kernel(0.0, h)
                + neighbors
                    .map(|n| {
                        let r = vector::norm(&n.dx);
                        if r < h { n.particle.mass * kernel(r, h) } else { 0.0 }
                    })
                    .sum::<f64>()
        });
        let mean = densities.iter().sum::<f64>() / densities.len() as f64;
        println!(
            "Step {}: mean density {:.4} (expected {:.4}), {:?}",
            step,
            mean,
            count as f64 / (side * side * side),
            start.elapsed()
        );

        for i in 0..particles.len() {
            let p = &mut particles[i];
            let moved = vector::add(&p.position, &vector::scale(&p.velocity, dt));
            p.position = search.wrap_into_domain(&moved);
            search.update(&particles, i);
        }
        search.check_invariants();
    }

    Ok(())
}
