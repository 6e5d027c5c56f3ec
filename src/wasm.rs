use crate::bounds::BoundingBox;
use crate::bucket_search::BucketSearch;
use crate::domain::SearchDomain;
use crate::parallel;
use crate::periodic::Periodicity;
use crate::vector::Vect3d;
use rand::prelude::*;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

// --- Domain ---

/// Domain extents, periodicity and interaction radius of a 3D search.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug)]
pub struct SearchDomain3D {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
    pub periodic_x: bool,
    pub periodic_y: bool,
    pub periodic_z: bool,
    pub interaction_radius: f64,
}

#[wasm_bindgen]
impl SearchDomain3D {
    #[wasm_bindgen(constructor)]
    pub fn new(
        min_x: f64,
        min_y: f64,
        min_z: f64,
        max_x: f64,
        max_y: f64,
        max_z: f64,
        interaction_radius: f64,
    ) -> SearchDomain3D {
        SearchDomain3D {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
            periodic_x: false,
            periodic_y: false,
            periodic_z: false,
            interaction_radius,
        }
    }

    pub fn set_periodic(&mut self, x: bool, y: bool, z: bool) {
        self.periodic_x = x;
        self.periodic_y = y;
        self.periodic_z = z;
    }
}

impl From<SearchDomain3D> for SearchDomain {
    fn from(d: SearchDomain3D) -> Self {
        SearchDomain::new(BoundingBox::new(
            [d.min_x, d.min_y, d.min_z],
            [d.max_x, d.max_y, d.max_z],
        ))
        .with_periodic([d.periodic_x, d.periodic_y, d.periodic_z])
        .with_interaction_radius(d.interaction_radius)
    }
}

// --- Search ---

type PointAccessor = fn(&Vect3d) -> Vect3d;

fn point_position(p: &Vect3d) -> Vect3d {
    *p
}

/// A bucket search that owns its points, for use from JavaScript.
///
/// Point indices are slots: removing a point moves the last point into its
/// slot.
#[wasm_bindgen]
pub struct BucketSearch3D {
    points: Vec<Vect3d>,
    search: BucketSearch<Vect3d, PointAccessor>,
}

#[wasm_bindgen]
impl BucketSearch3D {
    #[wasm_bindgen(constructor)]
    pub fn new(domain: SearchDomain3D) -> Result<BucketSearch3D, JsValue> {
        let search = BucketSearch::with_domain(&domain.into(), point_position as PointAccessor)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(BucketSearch3D {
            points: Vec::new(),
            search,
        })
    }

    /// Changes the domain and re-embeds all points, which must lie inside it.
    pub fn reset(&mut self, domain: SearchDomain3D) -> Result<(), JsValue> {
        let domain: SearchDomain = domain.into();
        let points = self
            .points
            .iter()
            .map(|p| Self::place(p, &domain))
            .collect::<Result<Vec<_>, _>>()?;
        self.search
            .reset_domain(&domain)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.points = points;
        self.search.embed(&self.points);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn count_points(&self) -> usize {
        self.points.len()
    }

    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<f64> {
        self.points.iter().flatten().copied().collect()
    }

    /// Replaces all points.
    ///
    /// # Arguments
    /// * `coords` - A flat array of coordinates `[x, y, z, x, y, z, ...]`.
    pub fn set_points(&mut self, coords: &[f64]) -> Result<(), JsValue> {
        let domain = self.domain();
        self.points = coords
            .chunks_exact(3)
            .map(|c| Self::place(&[c[0], c[1], c[2]], &domain))
            .collect::<Result<Vec<_>, _>>()?;
        self.search.embed(&self.points);
        Ok(())
    }

    /// Appends a point and returns its index.
    pub fn add_point(&mut self, x: f64, y: f64, z: f64) -> Result<usize, JsValue> {
        let p = Self::place(&[x, y, z], &self.domain())?;
        self.points.push(p);
        self.search.add(&self.points);
        Ok(self.points.len() - 1)
    }

    /// Moves the point at `index`.
    pub fn set_point(&mut self, index: usize, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        let p = Self::place(&[x, y, z], &self.domain())?;
        if index < self.points.len() {
            self.points[index] = p;
            self.search.update(&self.points, index);
        }
        Ok(())
    }

    /// Removes the point at `index`, moving the last point into its place.
    pub fn remove_point(&mut self, index: usize) {
        let last = match self.points.len().checked_sub(1) {
            Some(last) if index <= last => last,
            _ => return,
        };
        self.search.copy(index, last);
        self.points.swap_remove(index);
        self.search.delete(last);
    }

    /// Indices of the points near the point at `index`, excluding itself.
    pub fn neighbors(&self, index: usize) -> Vec<u32> {
        match self.points.get(index) {
            Some(p) => self
                .search
                .find_neighbors(&self.points, p, Some(index), false)
                .map(|n| n.slot as u32)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Flat separations `[dx, dy, dz, ...]` to the neighbours of `index`, in
    /// the order returned by `neighbors`.
    pub fn neighbor_offsets(&self, index: usize) -> Vec<f64> {
        match self.points.get(index) {
            Some(p) => self
                .search
                .find_neighbors(&self.points, p, Some(index), false)
                .flat_map(|n| n.dx)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Indices of the points near an arbitrary position.
    pub fn query(&self, x: f64, y: f64, z: f64) -> Result<Vec<u32>, JsValue> {
        let p = Self::place(&[x, y, z], &self.domain())?;
        Ok(self
            .search
            .find_neighbors(&self.points, &p, None, false)
            .map(|n| n.slot as u32)
            .collect())
    }

    /// Number of neighbours of every point, computed in parallel.
    pub fn neighbor_counts(&self) -> Vec<u32> {
        parallel::map_neighbors(&self.search, &self.points, false, |_, _, n| n.count() as u32)
    }

    /// Generates random points within the domain and sets them as the points.
    pub fn random_points(&mut self, count: usize) {
        let mut rng = StdRng::seed_from_u64(get_seed());
        let low = *self.search.low();
        let high = *self.search.high();
        let mut coords = Vec::with_capacity(count * 3);
        for _ in 0..count {
            for i in 0..3 {
                coords.push(low[i] + rng.r#gen::<f64>() * (high[i] - low[i]));
            }
        }
        self.points = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        self.search.embed(&self.points);
    }
}

impl BucketSearch3D {
    fn domain(&self) -> SearchDomain {
        SearchDomain::new(BoundingBox::new(*self.search.low(), *self.search.high()))
            .with_periodic(*self.search.periodic())
            .with_interaction_radius(self.search.lengthscale())
    }

    /// Wraps `p` into `domain` along its periodic axes and checks that it
    /// lies inside along the others.
    fn place(p: &Vect3d, domain: &SearchDomain) -> Result<Vect3d, JsValue> {
        if p.iter().any(|x| !x.is_finite()) {
            return Err(JsValue::from_str(&format!("point {:?} is not finite", p)));
        }
        // zero-length axes are never periodic
        let mut periodic = domain.periodic;
        for i in 0..3 {
            periodic[i] &= domain.bounds.max[i] > domain.bounds.min[i];
        }
        let p = Periodicity::new(domain.bounds.min, domain.bounds.max, periodic).wrap_into_domain(p);
        for i in 0..3 {
            if periodic[i] {
                continue;
            }
            let low = domain.bounds.min[i];
            // a collapsed axis accepts a slab of one interaction radius
            let high = domain.bounds.max[i].max(low + domain.interaction_radius);
            if p[i] < low || p[i] >= high {
                return Err(JsValue::from_str(&format!("point {:?} is outside the domain", p)));
            }
        }
        Ok(p)
    }
}

fn get_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * 4294967296.0) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        123456789
    }
}
