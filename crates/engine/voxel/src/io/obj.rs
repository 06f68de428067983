//! Wavefront OBJ / MTL export
//!
//! Points are deduplicated per mesh, UVs across the whole file. Normals are the
//! six side normals in [`Side::ALL`] order.

use crate::mesh::VoxMesh;
use crate::side::Side;
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::io::{self, Write};

fn vec3_key(v: Vec3) -> [u32; 3] {
    [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

fn vec2_key(v: Vec2) -> [u32; 2] {
    [v.x.to_bits(), v.y.to_bits()]
}

/// One OBJ face: 1-based point, uv and normal indices per corner
struct ObjFace {
    points: [usize; 4],
    uvs: [usize; 4],
    normal: usize,
}

/// Write `meshes` as OBJ, positions multiplied by `scale`
///
/// Every mesh becomes a group using `material` from `mtl_file`.
pub fn write_obj<W: Write>(
    out: &mut W,
    meshes: &[VoxMesh],
    material: &str,
    mtl_file: &str,
    scale: f32,
) -> io::Result<()> {
    let mut points: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut uv_indices: HashMap<[u32; 2], usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<ObjFace>)> = Vec::with_capacity(meshes.len());

    for mesh in meshes {
        let mut point_indices: HashMap<[u32; 3], usize> = HashMap::new();
        let mut faces = Vec::with_capacity(mesh.polys.len());

        for poly in &mesh.polys {
            let mut face = ObjFace {
                points: [0; 4],
                uvs: [0; 4],
                normal: poly.side.index() + 1,
            };
            for (i, point) in poly.points.iter().enumerate() {
                let scaled = point.position * scale;
                face.points[i] = *point_indices.entry(vec3_key(scaled)).or_insert_with(|| {
                    points.push(scaled);
                    points.len()
                });
                face.uvs[i] = *uv_indices.entry(vec2_key(point.uv)).or_insert_with(|| {
                    uvs.push(point.uv);
                    uvs.len()
                });
            }
            faces.push(face);
        }
        groups.push((&mesh.name, faces));
    }

    writeln!(out, "# voxchef")?;
    writeln!(out, "mtllib {mtl_file}")?;
    writeln!(out)?;

    for side in Side::ALL {
        let n = side.normal();
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    writeln!(out)?;

    for p in &points {
        writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    writeln!(out)?;

    for uv in &uvs {
        writeln!(out, "vt {:.6} {:.6}", uv.x, uv.y)?;
    }

    for (name, faces) in &groups {
        writeln!(out)?;
        writeln!(out, "g {name}")?;
        writeln!(out, "usemtl {material}")?;
        for face in faces {
            write!(out, "f")?;
            for i in 0..4 {
                write!(out, " {}/{}/{}", face.points[i], face.uvs[i], face.normal)?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}

/// Single diffuse-textured material
pub fn write_mtl<W: Write>(out: &mut W, material: &str, texture_file: &str) -> io::Result<()> {
    writeln!(out, "newmtl {material}")?;
    writeln!(out, "Ka 0.0 0.0 0.0")?;
    writeln!(out, "Kd 1.0 1.0 1.0")?;
    writeln!(out, "Ks 0.0 0.0 0.0")?;
    writeln!(out, "d 1.0")?;
    writeln!(out, "illum 1")?;
    writeln!(out, "map_Kd {texture_file}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::VoxelMatrix;
    use crate::tree::{Color, NodeDesc, SceneBuilder};
    use glam::{IVec3, UVec3};

    fn cube_mesh() -> VoxMesh {
        let mut builder = SceneBuilder::new(NodeDesc::model("m"));
        let root = builder.root();
        let id = builder.push(
            root,
            NodeDesc::matrix("Body", IVec3::ZERO, UVec3::ONE, vec![Color::new(9, 9, 9, 255)]),
        );
        let scene = builder.build(Vec3::ONE);
        VoxMesh::from_matrix(&VoxelMatrix::build(&scene, id).unwrap())
    }

    #[test]
    fn test_single_cube_obj() {
        let mut out = Vec::new();
        write_obj(&mut out, &[cube_mesh()], "m_Material", "m.mtl", 0.5).unwrap();
        let text = String::from_utf8(out).unwrap();

        let count = |prefix: &str| text.lines().filter(|l| l.starts_with(prefix)).count();
        assert_eq!(count("vn "), 6);
        assert_eq!(count("v "), 8);
        // All UVs are zero before atlas packing
        assert_eq!(count("vt "), 1);
        assert_eq!(count("f "), 6);
        assert!(text.contains("g Body\nusemtl m_Material\n"));
        assert!(text.contains("v 0.500000 0.500000 0.500000"));
    }

    #[test]
    fn test_points_not_shared_between_meshes() {
        let mut out = Vec::new();
        write_obj(&mut out, &[cube_mesh(), cube_mesh()], "mat", "m.mtl", 1.0).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 16);
        let last_face = text.lines().filter(|l| l.starts_with("f ")).last().unwrap();
        assert!(last_face.split_whitespace().skip(1).all(|c| {
            c.split('/').next().unwrap().parse::<usize>().unwrap() > 8
        }));
    }

    #[test]
    fn test_mtl() {
        let mut out = Vec::new();
        write_mtl(&mut out, "hero_Material", "hero.png").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("newmtl hero_Material\n"));
        assert!(text.ends_with("map_Kd hero.png\n"));
    }
}
