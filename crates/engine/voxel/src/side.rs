use glam::{IVec3, Vec3};

/// One of the six voxel sides, in payload order
///
/// The discriminant doubles as the face-slot index on a voxel and as the bit
/// position in its visibility mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,   // -X
    Back,   // -Z
    Bottom, // -Y
    Right,  // +X
    Front,  // +Z
    Top,    // +Y
}

impl Side {
    /// All six sides in slot order
    pub const ALL: [Side; 6] = [
        Side::Left,
        Side::Back,
        Side::Bottom,
        Side::Right,
        Side::Front,
        Side::Top,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit for this side in a visibility mask
    #[inline]
    pub fn flag(self) -> u8 {
        1 << self.index()
    }

    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Back => Side::Front,
            Side::Bottom => Side::Top,
            Side::Right => Side::Left,
            Side::Front => Side::Back,
            Side::Top => Side::Bottom,
        }
    }

    /// Step to the neighboring cell across this side
    #[inline]
    pub fn offset(self) -> IVec3 {
        match self {
            Side::Left => IVec3::NEG_X,
            Side::Back => IVec3::NEG_Z,
            Side::Bottom => IVec3::NEG_Y,
            Side::Right => IVec3::X,
            Side::Front => IVec3::Z,
            Side::Top => IVec3::Y,
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    /// Axis index (0 = X, 1 = Y, 2 = Z) the side faces along
    #[inline]
    pub fn axis(self) -> usize {
        match self {
            Side::Left | Side::Right => 0,
            Side::Bottom | Side::Top => 1,
            Side::Back | Side::Front => 2,
        }
    }

    /// Axis the first merge pass grows rectangles along
    #[inline]
    pub fn column_axis(self) -> usize {
        match self {
            Side::Left | Side::Right => 2,
            _ => 0,
        }
    }

    /// Axis the second merge pass grows rectangles along
    #[inline]
    pub fn row_axis(self) -> usize {
        match self {
            Side::Bottom | Side::Top => 2,
            _ => 1,
        }
    }

    /// Whether `pos` sits on the outer layer of a matrix of `size` on this side
    #[inline]
    pub fn is_boundary(self, pos: IVec3, size: IVec3) -> bool {
        let axis = self.axis();
        match self {
            Side::Left | Side::Back | Side::Bottom => pos[axis] == 0,
            Side::Right | Side::Front | Side::Top => pos[axis] == size[axis] - 1,
        }
    }

    /// Corners of a rectangle on this side, wound outward
    ///
    /// `start` is the anchor voxel, `size` the rectangle extent in voxels.
    pub fn corners(self, start: IVec3, size: IVec3) -> [IVec3; 4] {
        let IVec3 { x, y, z } = start;
        let IVec3 { x: sx, y: sy, z: sz } = size;
        match self {
            Side::Left => [
                IVec3::new(x, y, z),
                IVec3::new(x, y, z + sz),
                IVec3::new(x, y + sy, z + sz),
                IVec3::new(x, y + sy, z),
            ],
            Side::Back => [
                IVec3::new(x + sx, y, z),
                IVec3::new(x, y, z),
                IVec3::new(x, y + sy, z),
                IVec3::new(x + sx, y + sy, z),
            ],
            Side::Bottom => [
                IVec3::new(x, y, z),
                IVec3::new(x + sx, y, z),
                IVec3::new(x + sx, y, z + sz),
                IVec3::new(x, y, z + sz),
            ],
            Side::Right => [
                IVec3::new(x + 1, y, z + sz),
                IVec3::new(x + 1, y, z),
                IVec3::new(x + 1, y + sy, z),
                IVec3::new(x + 1, y + sy, z + sz),
            ],
            Side::Front => [
                IVec3::new(x, y, z + 1),
                IVec3::new(x + sx, y, z + 1),
                IVec3::new(x + sx, y + sy, z + 1),
                IVec3::new(x, y + sy, z + 1),
            ],
            Side::Top => [
                IVec3::new(x, y + 1, z + sz),
                IVec3::new(x + sx, y + 1, z + sz),
                IVec3::new(x + sx, y + 1, z),
                IVec3::new(x, y + 1, z),
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Back => "back",
            Side::Bottom => "bottom",
            Side::Right => "right",
            Side::Front => "front",
            Side::Top => "top",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
