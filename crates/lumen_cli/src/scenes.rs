//! Built-in demo scenes.

use std::collections::HashMap;
use std::sync::Arc;

use lumen_renderer::{
    AmbientLight, Camera, CheckerTexture, Color, Light, Material, Mesh, MeshData, Object,
    SceneDescription, Transform, Vec3,
};

/// Names accepted by [`build`].
pub const SCENE_NAMES: [&str; 3] = ["spheres", "mesh", "empty"];

const SKY: Color = Color::new(0.55, 0.7, 0.95);

/// Build the named scene at the given resolution.
pub fn build(name: &str, width: u32, height: u32) -> Option<SceneDescription> {
    match name {
        "spheres" => Some(spheres(width, height)),
        "mesh" => Some(mesh(width, height)),
        "empty" => Some(empty(width, height)),
        _ => None,
    }
}

fn camera(width: u32, height: u32) -> Camera {
    Camera::new()
        .with_resolution(width, height)
        .with_position(Vec3::new(0.0, 2.5, 8.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y)
        .with_fov(40.0)
}

fn checker_ground() -> Object {
    let checker = CheckerTexture::new(Color::splat(0.9), Color::splat(0.2), 1.0);
    Object::plane(
        &Transform::default(),
        Material::diffuse(Color::ONE).with_texture(Arc::new(checker)),
    )
}

/// Mirror, glass and diffuse spheres on a checkered floor.
fn spheres(width: u32, height: u32) -> SceneDescription {
    let panel = Light::area(
        &Transform::from_translation(Vec3::new(0.0, 6.0, 2.0)).with_scale(Vec3::new(3.0, 1.0, 3.0)),
        Color::ONE,
        8.0,
    );

    SceneDescription::new(camera(width, height).with_aperture(0.02))
        .with_ambient(AmbientLight::new(Color::ONE, 0.8))
        .with_sky_color(SKY)
        .with_light(panel)
        .with_light(Light::point(Vec3::new(-5.0, 4.0, 5.0), Color::new(1.0, 0.85, 0.7), 3.0))
        .with_object(checker_ground())
        .with_object(Object::sphere(Vec3::new(-2.2, 1.0, 0.0), 1.0, Material::mirror()))
        .with_object(Object::sphere(Vec3::new(0.0, 1.0, 1.2), 1.0, Material::glass(1.5)))
        .with_object(Object::sphere(
            Vec3::new(2.2, 1.0, 0.0),
            1.0,
            Material::diffuse(Color::new(0.8, 0.25, 0.2)).with_specular(0.4, 48.0),
        ))
        .with_object(Object::sphere(
            Vec3::new(1.0, 0.4, 2.6),
            0.4,
            Material::metal(Color::new(1.0, 0.78, 0.34), 0.27, 2.78),
        ))
}

/// Smooth-shaded icosphere between two boxes.
fn mesh(width: u32, height: u32) -> SceneDescription {
    let mut data = icosphere(3);
    data.compute_normals();

    let left_box = Transform::from_translation(Vec3::new(-2.5, 0.75, -0.5))
        .with_rotation(Vec3::new(0.0, 30.0, 0.0))
        .with_scale(Vec3::splat(1.5));
    let right_box = Transform::from_translation(Vec3::new(2.5, 0.5, 0.5))
        .with_rotation(Vec3::new(0.0, -20.0, 0.0))
        .with_scale(Vec3::new(1.0, 1.0, 2.0));

    SceneDescription::new(camera(width, height))
        .with_sky_color(SKY)
        .with_light(Light::area(
            &Transform::from_translation(Vec3::new(-1.0, 7.0, 3.0)).with_scale(Vec3::splat(2.5)),
            Color::ONE,
            9.0,
        ))
        .with_light(Light::sphere(Vec3::new(4.0, 3.0, 4.0), 0.3, Color::new(0.7, 0.8, 1.0), 2.0))
        .with_object(checker_ground())
        .with_object(Object::mesh(
            Mesh::new(&data),
            &Transform::from_translation(Vec3::new(0.0, 1.2, 0.0)).with_scale(Vec3::splat(1.2)),
            Material::diffuse(Color::new(0.3, 0.5, 0.85)).with_specular(0.5, 64.0),
        ))
        .with_object(Object::cuboid(&left_box, Material::diffuse(Color::new(0.85, 0.8, 0.7))))
        .with_object(Object::cuboid(&right_box, Material::mirror()))
}

/// Nothing but sky.
fn empty(width: u32, height: u32) -> SceneDescription {
    SceneDescription::new(camera(width, height)).with_sky_color(SKY)
}

/// Unit icosphere built by repeatedly splitting the faces of an icosahedron.
pub fn icosphere(subdivisions: u32) -> MeshData {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    #[rustfmt::skip]
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let p = (positions[a as usize] + positions[b as usize]).normalize();
                positions.push(p);
                (positions.len() - 1) as u32
            })
        };

        faces = faces
            .iter()
            .flat_map(|&[a, b, c]| {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                [[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]
            })
            .collect();
    }

    MeshData::new(positions, faces.into_iter().flatten().collect())
}
