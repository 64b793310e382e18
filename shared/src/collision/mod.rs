/*!
Character collision against the obstacle set.

- types:     math aliases and bounds helpers
- obstacles: the obstacle registry and the overlap query used by movement
*/

pub mod obstacles;
pub mod types;

pub use obstacles::{Obstacle, ObstacleHit, ObstacleSet};
pub use types::{Iso, Quat, Vec3, oriented_box_bounds, overlaps_strict, player_bounds};
