//! # bucketsearch
//!
//! `bucketsearch` is a Rust library for neighbourhood searches in particle
//! simulations such as smoothed-particle hydrodynamics, designed to be used in
//! Rust as well as compiled to WebAssembly (WASM). It answers "which points lie
//! within the interaction radius of this position" repeatedly while points
//! move, appear and disappear between time steps.
//!
//! ## Features
//!
//! - **Bucket grid**: The domain is divided into buckets at least as large as
//!   the interaction radius, so a query only visits the 27 buckets around it.
//! - **Periodic domains**: Any axis can wrap around. Ghost buckets mirror the
//!   opposite boundary and offsets are returned as minimum images.
//! - **O(1) maintenance**: Points are chained per bucket in index-linked lists,
//!   so adding, removing, moving and swap-removing points never rebuilds.
//! - **Pair traversal**: A self mode finds each pair of one container once.
//!
//! The search is a broad phase: it accepts points within the radius along
//! every axis, and leaves the Euclidean cut to the caller.
//!
//! ## Main Interface
//!
//! The primary entry point is the [`BucketSearch`] struct, which indexes a
//! caller-owned slice through a position accessor:
//!
//! ```
//! use bucketsearch::BucketSearch;
//!
//! let points = vec![[0.1, 0.1, 0.1], [0.2, 0.1, 0.1], [0.9, 0.9, 0.9]];
//! let mut search = BucketSearch::<[f64; 3], _>::new([0.0; 3], [1.0; 3], [false; 3], |p: &[f64; 3]| *p).unwrap();
//! search.reset([0.0; 3], [1.0; 3], 0.3, [false; 3]).unwrap();
//! search.embed(&points);
//!
//! let found: Vec<_> = search.find_neighbors(&points, &points[0], Some(0), false).collect();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].slot, 1);
//! ```

mod bounds;
mod bucket_search;
mod domain;
mod error;
mod grid;
mod neighbors;
pub mod parallel;
mod periodic;
pub mod vector;
mod wasm;

pub use bounds::BoundingBox;
pub use bucket_search::BucketSearch;
pub use bucket_search::CELL_EMPTY;
pub use domain::SearchDomain;
pub use error::ConfigError;
pub use grid::CellGrid;
pub use neighbors::Neighbor;
pub use neighbors::Neighbors;
pub use neighbors::State;
pub use periodic::Periodicity;
pub use vector::Vect3b;
pub use vector::Vect3d;
pub use wasm::BucketSearch3D;
pub use wasm::SearchDomain3D;
