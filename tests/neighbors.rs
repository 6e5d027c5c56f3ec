mod common;

use bucketsearch::{BucketSearch, SearchDomain, BoundingBox, Vect3d};
use common::{brute_force, point_search, query, random_points};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_two_close_points() {
    let points = vec![[0.1, 0.1, 0.1], [0.2, 0.1, 0.1]];
    let mut search = point_search([0.0; 3], [1.0; 3], 0.3, [false; 3]);
    search.embed(&points);

    let found: Vec<_> = search.find_neighbors(&points, &points[0], Some(0), false).collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].slot, 1);
    assert!((found[0].dx[0] + 0.1).abs() < 1e-12);
    assert_eq!(found[0].dx[1], 0.0);
    assert_eq!(found[0].dx[2], 0.0);
}

#[test]
fn test_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let low = [-5.0, 0.0, 2.0];
    let high = [5.0, 8.0, 6.5];
    let radius = 0.9;
    let points = random_points(&mut rng, 2000, low, high);

    let mut search = point_search(low, high, radius, [false; 3]);
    search.embed(&points);
    search.check_invariants();

    for (i, p) in points.iter().enumerate() {
        let expected = brute_force(&points, p, Some(i), low, high, radius, [false; 3]);
        assert_eq!(query(&search, &points, p, Some(i), false), expected, "point {}", i);
    }

    // arbitrary query positions, nothing excluded
    for q in random_points(&mut rng, 200, low, high) {
        let expected = brute_force(&points, &q, None, low, high, radius, [false; 3]);
        assert_eq!(query(&search, &points, &q, None, false), expected);
    }
}

#[test]
fn test_self_mode_finds_each_pair_once() {
    let mut rng = StdRng::seed_from_u64(3);
    let points = random_points(&mut rng, 1000, [0.0; 3], [10.0; 3]);
    let mut search = point_search([0.0; 3], [10.0; 3], 1.2, [false; 3]);
    search.embed(&points);

    let mut self_pairs = Vec::new();
    let mut all_pairs = Vec::new();
    for (i, p) in points.iter().enumerate() {
        for j in query(&search, &points, p, Some(i), true) {
            self_pairs.push((i.min(j), i.max(j)));
        }
        for j in query(&search, &points, p, Some(i), false) {
            if i < j {
                all_pairs.push((i, j));
            }
        }
    }
    self_pairs.sort_unstable();
    let before = self_pairs.len();
    self_pairs.dedup();
    assert_eq!(self_pairs.len(), before, "a pair was found twice");
    all_pairs.sort_unstable();
    assert_eq!(self_pairs, all_pairs);
}

#[test]
fn test_cube_test_admits_corners() {
    let points = vec![[2.0, 2.0, 2.0], [2.8, 2.8, 2.8], [3.0, 2.0, 2.0]];
    let mut search = point_search([0.0; 3], [10.0; 3], 1.0, [false; 3]);
    search.embed(&points);

    let found: Vec<_> = search.find_neighbors(&points, &points[0], Some(0), false).collect();
    // the diagonal point is 1.39 away but within 1.0 along each axis, while
    // the axis-aligned one sits exactly on the radius and is rejected
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].slot, 1);
    let r2: f64 = found[0].dx.iter().map(|d| d * d).sum();
    assert!(r2.sqrt() > 1.0);
}

#[test]
fn test_embed_twice_gives_same_results() {
    let mut rng = StdRng::seed_from_u64(11);
    let points = random_points(&mut rng, 300, [0.0; 3], [4.0; 3]);
    let mut search = point_search([0.0; 3], [4.0; 3], 0.5, [false; 3]);
    search.embed(&points);
    let first: Vec<Vec<usize>> = (0..points.len())
        .map(|i| query(&search, &points, &points[i], Some(i), false))
        .collect();

    search.embed(&points);
    search.check_invariants();
    for i in 0..points.len() {
        assert_eq!(query(&search, &points, &points[i], Some(i), false), first[i]);
    }
}

#[test]
fn test_reembed_smaller_container_drops_stale_points() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut points = random_points(&mut rng, 100, [0.0; 3], [4.0; 3]);
    let mut search = point_search([0.0; 3], [4.0; 3], 0.5, [false; 3]);
    search.embed(&points);

    points.truncate(10);
    search.embed(&points);
    search.check_invariants();
    assert_eq!(search.len(), 10);
    for (i, p) in points.iter().enumerate() {
        let expected = brute_force(&points, p, Some(i), [0.0; 3], [4.0; 3], 0.5, [false; 3]);
        assert_eq!(query(&search, &points, p, Some(i), false), expected);
    }
}

#[test]
fn test_flat_domain_searches_in_plane() {
    // zero extent in z collapses that axis to a single slab
    let low = [0.0, 0.0, 1.0];
    let high = [5.0, 5.0, 1.0];
    let mut search = point_search(low, high, 1.0, [true, true, true]);
    assert_eq!(search.periodic(), &[true, true, false]);
    assert_eq!(search.grid().num_real_cells(), [5, 5, 1]);
    assert_eq!(search.grid().surrounding_cell_offsets().len(), 9);

    let points = vec![[0.2, 2.0, 1.0], [4.7, 2.0, 1.0], [2.5, 2.5, 1.0]];
    search.embed(&points);
    search.check_invariants();
    assert_eq!(query(&search, &points, &points[0], Some(0), false), vec![1]);
    assert!(query(&search, &points, &points[2], Some(2), false).is_empty());
}

#[derive(Clone, Debug)]
struct Particle {
    mass: f64,
    position: Vect3d,
}

#[test]
fn test_accessor_reads_user_records() {
    let particles = vec![
        Particle { mass: 1.0, position: [1.0, 1.0, 1.0] },
        Particle { mass: 2.0, position: [1.5, 1.0, 1.0] },
        Particle { mass: 4.0, position: [1.0, 1.0, 1.4] },
        Particle { mass: 8.0, position: [4.0, 4.0, 4.0] },
    ];
    let domain = SearchDomain::new(BoundingBox::new([0.0; 3], [5.0; 3])).with_interaction_radius(1.0);
    let mut search = BucketSearch::with_domain(&domain, |p: &Particle| p.position).unwrap();
    search.embed(&particles);

    let mass: f64 = search
        .find_neighbors(&particles, &particles[0].position, Some(0), false)
        .map(|n| n.particle.mass)
        .sum();
    assert_eq!(mass, 6.0);
}

#[test]
fn test_empty_index_finds_nothing() {
    let points: Vec<Vect3d> = Vec::new();
    let mut search = point_search([0.0; 3], [1.0; 3], 0.25, [false; 3]);
    search.embed(&points);
    let mut it = search.find_neighbors(&points, &[0.5; 3], None, false);
    assert!(it.is_done());
    assert!(it == search.end());
    assert!(it.next().is_none());
}
