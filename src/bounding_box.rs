use serde::{Deserialize, Serialize};

/// Inclusive box between two corners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: (i32, i32, i32),
    pub max: (i32, i32, i32),
}

impl BoundingBox {
    pub fn new(min: (i32, i32, i32), max: (i32, i32, i32)) -> Self {
        BoundingBox { min, max }
    }

    /// Box spanned by a corner and a signed size; a negative size extends towards
    /// smaller coordinates, as Litematica regions do.
    pub fn from_position_and_size(position: (i32, i32, i32), size: (i32, i32, i32)) -> Self {
        fn axis(position: i32, size: i32) -> (i32, i32) {
            if size >= 0 {
                (position, position + size - 1)
            } else {
                (position + size + 1, position)
            }
        }
        let (min_x, max_x) = axis(position.0, size.0);
        let (min_y, max_y) = axis(position.1, size.1);
        let (min_z, max_z) = axis(position.2, size.2);
        BoundingBox::new((min_x, min_y, min_z), (max_x, max_y, max_z))
    }

    pub fn contains(&self, point: (i32, i32, i32)) -> bool {
        point.0 >= self.min.0 && point.0 <= self.max.0 &&
            point.1 >= self.min.1 && point.1 <= self.max.1 &&
            point.2 >= self.min.2 && point.2 <= self.max.2
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: (
                self.min.0.min(other.min.0),
                self.min.1.min(other.min.1),
                self.min.2.min(other.min.2),
            ),
            max: (
                self.max.0.max(other.max.0),
                self.max.1.max(other.max.1),
                self.max.2.max(other.max.2),
            ),
        }
    }

    pub fn get_dimensions(&self) -> (i64, i64, i64) {
        (
            self.max.0 as i64 - self.min.0 as i64 + 1,
            self.max.1 as i64 - self.min.1 as i64 + 1,
            self.max.2 as i64 - self.min.2 as i64 + 1,
        )
    }

    pub fn volume(&self) -> u64 {
        let (width, height, length) = self.get_dimensions();
        width as u64 * height as u64 * length as u64
    }
}
