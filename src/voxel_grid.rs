use serde::{Deserialize, Serialize};
use crate::error::FormatError;

/// Dense `width × height × length` array of palette indices.
///
/// Cells are stored in YZX order: `index = x + z * width + y * width * length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelGrid {
    width: u32,
    height: u32,
    length: u32,
    cells: Vec<u32>,
}

impl VoxelGrid {
    /// An all-zero grid. Allocation failure is reported instead of aborting.
    pub fn new(dimensions: (u32, u32, u32)) -> Result<Self, FormatError> {
        let volume = checked_volume(dimensions)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(volume)
            .map_err(|_| FormatError::malformed(format!("cannot allocate a grid of {} cells", volume)))?;
        cells.resize(volume, 0);
        Ok(VoxelGrid {
            width: dimensions.0,
            height: dimensions.1,
            length: dimensions.2,
            cells,
        })
    }

    pub fn from_cells(dimensions: (u32, u32, u32), cells: Vec<u32>) -> Result<Self, FormatError> {
        let volume = checked_volume(dimensions)?;
        if cells.len() != volume {
            return Err(FormatError::malformed(format!(
                "expected {} cells for {}x{}x{}, found {}",
                volume, dimensions.0, dimensions.1, dimensions.2, cells.len()
            )));
        }
        Ok(VoxelGrid {
            width: dimensions.0,
            height: dimensions.1,
            length: dimensions.2,
            cells,
        })
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.length)
    }

    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0
            && (x as u32) < self.width && (y as u32) < self.height && (z as u32) < self.length
    }

    /// Whether a free position (an entity's) falls inside the grid's extent.
    pub fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        (0.0..self.width as f64).contains(&x)
            && (0.0..self.height as f64).contains(&y)
            && (0.0..self.length as f64).contains(&z)
    }

    pub fn coords_to_index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.contains(x, y, z) {
            return None;
        }
        let (width, length) = (self.width as usize, self.length as usize);
        Some(x as usize + z as usize * width + y as usize * width * length)
    }

    pub fn index_to_coords(&self, index: usize) -> (i32, i32, i32) {
        let (width, length) = (self.width as usize, self.length as usize);
        let x = index % width;
        let z = (index / width) % length;
        let y = index / (width * length);
        (x as i32, y as i32, z as i32)
    }

    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<u32> {
        self.coords_to_index(x, y, z).map(|index| self.cells[index])
    }

    pub fn set(&mut self, x: i32, y: i32, z: i32, palette_index: u32) -> bool {
        match self.coords_to_index(x, y, z) {
            Some(index) => {
                self.cells[index] = palette_index;
                true
            }
            None => false,
        }
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Rewrites every cell through `table`; cells whose entry is `None` become 0.
    pub fn remap(&mut self, table: &[Option<u32>]) {
        for cell in &mut self.cells {
            *cell = table.get(*cell as usize).copied().flatten().unwrap_or(0);
        }
    }
}

fn checked_volume(dimensions: (u32, u32, u32)) -> Result<usize, FormatError> {
    let (width, height, length) = dimensions;
    if width == 0 || height == 0 || length == 0 {
        return Err(FormatError::malformed(format!(
            "invalid dimensions {}x{}x{}", width, height, length
        )));
    }
    let volume = (width as u64)
        .checked_mul(height as u64)
        .and_then(|area| area.checked_mul(length as u64))
        .ok_or_else(|| FormatError::limit("volume", u64::MAX, usize::MAX as u64))?;
    usize::try_from(volume)
        .map_err(|_| FormatError::limit("volume", volume, usize::MAX as u64))
}
