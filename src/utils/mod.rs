pub mod error;
pub mod math;
pub mod ray;

pub use error::EngineError;
pub use math::{Aabb, Frustum, Obb, Plane};
pub use ray::Ray;
