//! Face visibility and greedy merge tests

mod test_scenes;

use glam::{IVec3, UVec3, Vec3};
use std::collections::HashSet;
use test_scenes::*;
use voxel::io::qbt::parse_qbt;
use voxel::tree::{Color, NodeDesc, SceneBuilder};
use voxel::{Side, VoxelMatrix, VoxelScene};

fn single_matrix(size: UVec3, position: IVec3, color: impl Fn(u32, u32, u32) -> [u8; 4]) -> (VoxelScene, VoxelMatrix) {
    let voxels = dense(size, color).into_iter().map(Color::from_rgba).collect();
    let mut builder = SceneBuilder::new(NodeDesc::model("m"));
    let root = builder.root();
    let id = builder.push(root, NodeDesc::matrix("Part", position, size, voxels));
    let scene = builder.build(Vec3::ONE);
    let matrix = VoxelMatrix::build(&scene, id).unwrap();
    (scene, matrix)
}

fn solid(size: UVec3) -> VoxelMatrix {
    single_matrix(size, IVec3::ZERO, |_, _, _| RED).1
}

/// Pattern with holes, concavities and isolated voxels
fn lumpy(x: u32, y: u32, z: u32) -> [u8; 4] {
    if (x + 2 * y + 3 * z) % 4 == 0 {
        [0, 0, 0, 0]
    } else {
        [(x * 40) as u8, (y * 40) as u8, (z * 40) as u8, 255]
    }
}

#[test]
fn test_bar_visibility() {
    let bar = solid(UVec3::new(2, 1, 1));
    let voxels = bar.voxels();
    assert_eq!(voxels.len(), 2);

    let visible: usize = voxels
        .iter()
        .map(|v| Side::ALL.iter().filter(|s| v.is_visible(**s)).count())
        .sum();
    assert_eq!(visible, 10);

    let left = bar.voxel(IVec3::ZERO).unwrap();
    let right = bar.voxel(IVec3::X).unwrap();
    assert!(!left.is_visible(Side::Right));
    assert!(!right.is_visible(Side::Left));
    assert!(left.is_visible(Side::Left));
    assert!(right.is_visible(Side::Right));
}

#[test]
fn test_bar_merges_along_x() {
    let bar = solid(UVec3::new(2, 1, 1));
    assert_eq!(bar.faces().len(), 6);

    for face in bar.faces() {
        let expected = match face.side {
            Side::Left | Side::Right => (1, 1),
            _ => (2, 1),
        };
        assert_eq!(face.plane_extent(), expected, "{} face", face.side);
    }
}

#[test]
fn test_visibility_matches_occupancy() {
    let size = UVec3::splat(4);
    let (_, matrix) = single_matrix(size, IVec3::ZERO, lumpy);
    let size = size.as_ivec3();

    for voxel in matrix.voxels() {
        for side in Side::ALL {
            let expected = side.is_boundary(voxel.position, size) || !matrix.contains(voxel.position + side.offset());
            assert_eq!(
                voxel.is_visible(side),
                expected,
                "{} side of {}",
                side,
                voxel.position
            );
        }
    }
}

#[test]
fn test_slab_merges_to_six_faces() {
    let slab = solid(UVec3::new(3, 3, 1));
    let faces = slab.faces();
    assert_eq!(faces.len(), 6, "expected one face per side, got {faces:#?}");

    let sides: HashSet<Side> = faces.iter().map(|f| f.side).collect();
    assert_eq!(sides.len(), 6);

    for face in faces {
        let expected = match face.side {
            Side::Back | Side::Front => (3, 3),
            Side::Left | Side::Right => (1, 3),
            Side::Bottom | Side::Top => (3, 1),
        };
        assert_eq!(face.plane_extent(), expected, "{} face", face.side);
        assert_eq!(face.rect_start, IVec3::ZERO);
    }
}

#[test]
fn test_cube_merges_to_six_faces() {
    let cube = solid(UVec3::splat(3));
    assert_eq!(cube.voxels().len(), 27);
    assert_eq!(cube.faces().len(), 6);
    assert!(cube.faces().iter().all(|f| f.plane_extent() == (3, 3)));

    // Center voxel is fully enclosed
    let center = cube.voxel(IVec3::ONE).unwrap();
    assert!(Side::ALL.iter().all(|s| !center.is_visible(*s)));
}

#[test]
fn test_faces_cover_each_visible_side_once() {
    let (_, matrix) = single_matrix(UVec3::splat(4), IVec3::ZERO, lumpy);

    for side in Side::ALL {
        let mut covered = HashSet::new();
        for face in matrix.faces().iter().filter(|f| f.side == side) {
            let (w, h) = face.plane_extent();
            for v in 0..h {
                for u in 0..w {
                    let pos = face.voxel_at(u, v);
                    assert!(covered.insert(pos), "{side} face covers {pos} twice");
                }
            }
        }

        let visible: HashSet<IVec3> = matrix
            .voxels()
            .iter()
            .filter(|v| v.is_visible(side))
            .map(|v| v.position)
            .collect();
        assert_eq!(covered, visible, "{side} coverage");
    }

    // Merging must actually have reduced the face count
    let unit_faces: usize = matrix
        .voxels()
        .iter()
        .map(|v| Side::ALL.iter().filter(|s| v.is_visible(**s)).count())
        .sum();
    assert!(matrix.faces().len() < unit_faces);
}

#[test]
fn test_merge_is_deterministic() {
    let stream = encode_qbt(&TestNode::Model(vec![TestNode::Matrix(TestMatrix::filled(
        "Part",
        UVec3::new(5, 4, 6),
        lumpy,
    ))]));

    let build = || {
        let scene = parse_qbt(&stream, "m").unwrap();
        let id = scene.root().child_id("Part").unwrap();
        VoxelMatrix::build(&scene, id).unwrap()
    };

    let first = build();
    for _ in 0..5 {
        assert_eq!(build().faces(), first.faces());
    }
}

#[test]
fn test_core_voxels_hidden_but_occluding() {
    // x=0 is drawable, x=1 is a core voxel (alpha 1)
    let (_, matrix) = single_matrix(UVec3::new(2, 1, 1), IVec3::ZERO, |x, _, _| {
        if x == 0 {
            [10, 20, 30, 128]
        } else {
            [0, 0, 0, 1]
        }
    });

    assert_eq!(matrix.voxels().len(), 1);
    assert!(!matrix.contains(IVec3::X));

    let voxel = matrix.voxel(IVec3::ZERO).unwrap();
    assert_eq!(voxel.color, Color::new(10, 20, 30, 255));
    assert!(!voxel.is_visible(Side::Right));
    assert_eq!(matrix.faces().len(), 5);
}

#[test]
fn test_world_geometry() {
    let (_, matrix) = single_matrix(UVec3::ONE, IVec3::new(10, -2, 4), |_, _, _| RED);

    assert_eq!(matrix.world_center, Vec3::new(10.5, -1.5, 4.5));
    assert_eq!(matrix.half_extents, Vec3::splat(0.5));
    assert_eq!(matrix.world_pivot, Vec3::new(10.5, -1.5, 4.5));

    for face in matrix.faces() {
        let axis = face.side.axis();
        let plane = face.points[0][axis];
        assert!(face.points.iter().all(|p| p[axis] == plane));

        let expected = match face.side {
            Side::Left => 10.0,
            Side::Right => 11.0,
            Side::Bottom => -2.0,
            Side::Top => -1.0,
            Side::Back => 4.0,
            Side::Front => 5.0,
        };
        assert_eq!(plane, expected, "{} face plane", face.side);
    }
}

#[test]
fn test_bounds_ignore_empty_cells() {
    // Only the voxel at (2, 1, 0) is set
    let (_, matrix) = single_matrix(UVec3::new(3, 2, 2), IVec3::ZERO, |x, y, z| {
        if (x, y, z) == (2, 1, 0) {
            RED
        } else {
            [0, 0, 0, 0]
        }
    });

    let bounds = matrix.bounds.unwrap();
    assert_eq!(bounds.min, IVec3::new(2, 1, 0));
    assert_eq!(bounds.max, IVec3::new(2, 1, 0));
    assert_eq!(matrix.world_center, Vec3::new(2.5, 1.5, 0.5));
    assert_eq!(matrix.half_extents, Vec3::splat(0.5));
}
