use cgmath::Vector3;
use hcard::{
    data_structures::{
        instance::Instance,
        material::{LambertMaterial, TextureRef, hex_to_rgba},
        scene_graph::SceneNode,
    },
    hcard::{
        AssemblyMode, HcardConfig, ObjectDescriptor, SurfaceDescriptor, assemble,
        assemble_by_prefix, assembler::PrefixRule, assembler::assemble_card,
    },
    resources::{parse_gltf, sanitize_node_name},
};

/// Mirrors the node layout of the card model:
///
/// ```text
/// root
/// ├── Card (0)
/// │   ├── Object_main1 (1, mesh)
/// │   └── Pages (2)
/// │       ├── Surface_main_front (3, mesh)
/// │       └── Surface_main_back (4, mesh)
/// ├── Object_main2 (5, mesh)
/// ├── Surface_main_in_up (6, mesh)
/// └── Surface_main_in_down (7, mesh)
/// ```
fn card_scene() -> SceneNode {
    let mut pages = SceneNode::named("Pages").with_index(2);
    pages.add_child(SceneNode::named("Surface_main_front").with_index(3).with_mesh(1));
    pages.add_child(SceneNode::named("Surface_main_back").with_index(4).with_mesh(2));

    let mut card = SceneNode::named("Card").with_index(0);
    card.add_child(SceneNode::named("Object_main1").with_index(1).with_mesh(0));
    card.add_child(pages);

    let mut root = SceneNode::container();
    root.add_child(card);
    root.add_child(SceneNode::named("Object_main2").with_index(5).with_mesh(3));
    root.add_child(SceneNode::named("Surface_main_in_up").with_index(6).with_mesh(4));
    root.add_child(SceneNode::named("Surface_main_in_down").with_index(7).with_mesh(4));
    root
}

fn material_of<'a>(scene: &'a SceneNode, name: &str) -> &'a LambertMaterial {
    scene
        .find_by_name(name)
        .and_then(|node| node.material.as_ref())
        .unwrap_or_else(|| panic!("{name} has no material"))
}

#[test]
fn should_find_nodes_in_pre_order() {
    let mut root = SceneNode::container();
    let mut first = SceneNode::named("a").with_index(0);
    let mut nested = SceneNode::named("b").with_index(1);
    nested.add_child(SceneNode::named("target").with_index(2));
    first.add_child(nested);
    root.add_child(first);
    root.add_child(SceneNode::named("target").with_index(3));

    // the nested match is reached before the later sibling
    assert_eq!(root.find_by_name("target").and_then(|n| n.index), Some(2));
    assert_eq!(root.find_by_name_mut("target").and_then(|n| n.index), Some(2));
}

#[test]
fn should_prefer_a_child_over_its_own_subtree() {
    let mut root = SceneNode::container();
    let mut parent = SceneNode::named("target").with_index(0);
    parent.add_child(SceneNode::named("target").with_index(1));
    root.add_child(parent);

    assert_eq!(root.find_by_name("target").and_then(|n| n.index), Some(0));
}

#[test]
fn should_match_names_exactly() {
    let scene = card_scene();
    assert!(scene.find_by_name("surface_main_front").is_none());
    assert!(scene.find_by_name("Surface_main").is_none());
    assert!(scene.find_by_name("").is_none());
}

#[test]
fn should_not_match_the_node_searched_from() {
    let node = SceneNode::named("Card");
    assert!(node.find_by_name("Card").is_none());
}

#[test]
fn should_map_surface_textures_to_their_nodes() {
    let config = HcardConfig::default();
    let mut scene = card_scene();
    let assembled = assemble(
        &mut scene,
        &config.objects,
        &config.surfaces,
        &config.plain_material(),
    )
    .expect("all descriptors match");

    assert_eq!(assembled.surfaces.len(), config.surfaces.len());
    for surface in &config.surfaces {
        let material = material_of(&scene, &surface.name);
        assert_eq!(
            material.map,
            Some(TextureRef::from(surface.texture_file.as_str()))
        );
        assert_eq!(material.color, config.plain_material().color);
        assert_eq!(material.opacity, 1.0);
    }
    assert_eq!(
        material_of(&scene, "Surface_main_in_up").map,
        material_of(&scene, "Surface_main_in_down").map
    );
}

#[test]
fn should_give_objects_the_plain_material() {
    let config = HcardConfig::default();
    let mut scene = card_scene();
    assemble(
        &mut scene,
        &config.objects,
        &config.surfaces,
        &config.plain_material(),
    )
    .expect("all descriptors match");

    for object in &config.objects {
        let material = material_of(&scene, &object.name);
        assert_eq!(material.map, None);
        assert_eq!(*material, config.plain_material());
    }
    // untouched nodes keep their (absent) material
    assert!(scene.find_by_name("Pages").and_then(|n| n.material.as_ref()).is_none());
}

#[test]
fn should_drop_the_alpha_byte_of_the_material_colour() {
    let material = HcardConfig::default().plain_material();
    assert_eq!(material.color, hex_to_rgba(0xffffee));
    assert_eq!(material.color[0], 1.0);
    assert_eq!(material.color[1], 1.0);
    assert_eq!(material.color[2], 0xee as f32 / 255.0);
    assert_eq!(material.opacity, 1.0);
}

#[test]
fn should_fail_on_missing_nodes_without_touching_the_scene() {
    let mut scene = card_scene();
    let objects = vec![ObjectDescriptor::new("Object_main1")];
    let surfaces = vec![
        SurfaceDescriptor::new("Surface_main_front", "models/hcard_page1.png"),
        SurfaceDescriptor::new("Surface_missing", "models/hcard_page2.png"),
    ];

    let error = assemble(&mut scene, &objects, &surfaces, &LambertMaterial::default())
        .expect_err("Surface_missing does not exist");
    assert!(format!("{error:#}").contains("Surface_missing"));

    let mut assigned = 0;
    scene.visit(&mut |node| {
        if node.material.is_some() {
            assigned += 1;
        }
    });
    assert_eq!(assigned, 0);
}

#[test]
fn should_assemble_direct_children_by_prefix() {
    let mut scene = card_scene();
    let rule = PrefixRule::default();
    let assembled = assemble_by_prefix(&mut scene, &rule, &LambertMaterial::from_hex(0xffffee));

    // Object_main1 and the front/back pages sit below `Card` and are not considered
    assert_eq!(assembled.objects, vec!["Object_main2".to_string()]);
    assert_eq!(
        assembled.surfaces,
        vec![
            "Surface_main_in_up".to_string(),
            "Surface_main_in_down".to_string()
        ]
    );
    assert!(scene.find_by_name("Object_main1").and_then(|n| n.material.as_ref()).is_none());
    assert_eq!(
        material_of(&scene, "Surface_main_in_up").map,
        Some(TextureRef::from("models/hcard_page2.png"))
    );
}

#[test]
fn should_pick_the_front_texture_by_suffix() {
    let mut root = SceneNode::container();
    root.add_child(SceneNode::named("Surface_front").with_index(0).with_mesh(0));
    root.add_child(SceneNode::named("Surface_back").with_index(1).with_mesh(0));
    // not a mesh, skipped
    root.add_child(SceneNode::named("Surface_empty").with_index(2));

    let mut config = HcardConfig::default();
    config.assembly = AssemblyMode::Prefix(PrefixRule::default());
    let assembled = assemble_card(&mut root, &config).expect("prefix mode never fails");

    assert_eq!(assembled.surfaces.len(), 2);
    assert_eq!(
        material_of(&root, "Surface_front").map,
        Some(TextureRef::from("models/hcard_page1.png"))
    );
    assert_eq!(
        material_of(&root, "Surface_back").map,
        Some(TextureRef::from("models/hcard_page2.png"))
    );
    assert!(root.find_by_name("Surface_empty").and_then(|n| n.material.as_ref()).is_none());
    assert_eq!(
        config.texture_files(),
        vec![
            "models/hcard_page1.png".to_string(),
            "models/hcard_page2.png".to_string()
        ]
    );
}

#[test]
fn should_load_each_texture_file_once() {
    let config = HcardConfig::default();
    assert_eq!(
        config.texture_files(),
        vec![
            "models/hcard_page1.png".to_string(),
            "models/hcard_page2.png".to_string(),
            "models/hcard_page4.png".to_string(),
        ]
    );
}

#[test]
fn should_compose_world_transforms() {
    let mut root = SceneNode::container();
    let mut parent = SceneNode::named("parent").with_local(Instance {
        scale: Vector3::new(2.0, 2.0, 2.0),
        ..Instance::from(Vector3::new(1.0, 0.0, 0.0))
    });
    parent.add_child(SceneNode::named("child").with_local(Vector3::new(0.0, 1.0, 0.0).into()));
    root.add_child(parent);
    root.update_world_transform_all();

    let child = root.find_by_name("child").expect("child exists");
    assert_eq!(child.world.position, Vector3::new(1.0, 2.0, 0.0));
    assert_eq!(child.world.scale, Vector3::new(2.0, 2.0, 2.0));
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A card-like document: one triangle shown on `Surface_main_front` below `Card`,
/// and a one second animation lifting the surface.
fn card_document() -> (gltf::Gltf, Vec<u8>) {
    let mut buffer = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    buffer.extend(f32_bytes(&[0.0, 1.0]));
    buffer.extend(f32_bytes(&[0.0, 0.0, 0.0, 0.0, 0.0, 2.0]));
    let json = format!(
        r#"{{
            "asset": {{ "version": "2.0" }},
            "scene": 0,
            "scenes": [{{ "nodes": [0, 2] }}],
            "nodes": [
                {{ "name": "Card", "children": [1], "translation": [1.0, 0.0, 0.0] }},
                {{ "name": "Surface_main_front", "mesh": 0, "translation": [0.0, 1.0, 0.0] }},
                {{ "name": "Object_main1" }}
            ],
            "meshes": [{{ "name": "Sheet", "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
            "buffers": [{{ "byteLength": {len}, "uri": "card.bin" }}],
            "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                {{ "buffer": 0, "byteOffset": 36, "byteLength": 8 }},
                {{ "buffer": 0, "byteOffset": 44, "byteLength": 24 }}
            ],
            "accessors": [
                {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
                {{ "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
                   "min": [0.0], "max": [1.0] }},
                {{ "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }}
            ],
            "animations": [{{
                "name": "unfold",
                "samplers": [{{ "input": 1, "output": 2, "interpolation": "LINEAR" }}],
                "channels": [{{ "sampler": 0, "target": {{ "node": 1, "path": "translation" }} }}]
            }}]
        }}"#,
        len = buffer.len()
    );
    let gltf = gltf::Gltf::from_slice(json.as_bytes()).expect("valid document");
    (gltf, buffer)
}

#[test]
fn should_build_the_scene_graph_from_gltf() {
    let (gltf, buffer) = card_document();
    let asset = parse_gltf(&gltf, &[buffer]).expect("document parses");

    let names: Vec<_> = asset
        .scene
        .children
        .iter()
        .map(|n| n.name.as_deref())
        .collect();
    assert_eq!(names, vec![Some("Card"), Some("Object_main1")]);

    let surface = asset
        .scene
        .find_by_name("Surface_main_front")
        .expect("nested node is found");
    assert_eq!(surface.index, Some(1));
    assert_eq!(surface.mesh, Some(0));
    assert_eq!(surface.world.position, Vector3::new(1.0, 1.0, 0.0));
}

#[test]
fn should_read_meshes_and_clips_from_gltf() {
    let (gltf, buffer) = card_document();
    let asset = parse_gltf(&gltf, &[buffer]).expect("document parses");

    assert_eq!(asset.meshes.len(), 1);
    let primitive = &asset.meshes[0].primitives[0];
    assert_eq!(primitive.vertices.len(), 3);
    assert_eq!(primitive.vertices[1].position, [1.0, 0.0, 0.0]);
    // no index accessor, the triangle is drawn in vertex order
    assert_eq!(primitive.indices, vec![0, 1, 2]);
    assert_eq!(asset.meshes[0].base_color, [1.0; 4]);

    assert_eq!(asset.clips.len(), 1);
    assert_eq!(asset.clips[0].name, "unfold");
    assert_eq!(asset.clips[0].duration, 1.0);
    assert_eq!(asset.clips[0].channels[0].target, 1);
}

#[test]
fn should_assemble_a_parsed_document() {
    let (gltf, buffer) = card_document();
    let mut asset = parse_gltf(&gltf, &[buffer]).expect("document parses");

    let objects = vec![ObjectDescriptor::new("Object_main1")];
    let surfaces = vec![SurfaceDescriptor::new(
        "Surface_main_front",
        "models/hcard_page1.png",
    )];
    assemble(&mut asset.scene, &objects, &surfaces, &LambertMaterial::default())
        .expect("both nodes exist");

    assert_eq!(
        material_of(&asset.scene, "Surface_main_front").map,
        Some(TextureRef::from("models/hcard_page1.png"))
    );
}

/// Node names as Blender exports them: a numbered duplicate carries a dot and
/// a space survives in a renamed surface.
fn exported_card_document() -> gltf::Gltf {
    let json = r#"{
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0, 1, 2, 3, 4, 5] }],
        "nodes": [
            { "name": "Object_main.1" },
            { "name": "Object_main.2" },
            { "name": "Surface_main_front" },
            { "name": "Surface_main_back" },
            { "name": "Surface_main_in up" },
            { "name": "Surface_main_in:down" }
        ]
    }"#;
    gltf::Gltf::from_slice(json.as_bytes()).expect("valid document")
}

#[test]
fn should_strip_reserved_characters_from_node_names() {
    assert_eq!(sanitize_node_name("Object_main.1"), "Object_main1");
    assert_eq!(sanitize_node_name("Surface main\tin"), "Surface_main_in");
    assert_eq!(sanitize_node_name("a/b:c[0]"), "abc0");
    assert_eq!(sanitize_node_name("Card"), "Card");
}

#[test]
fn should_assemble_exported_node_names() {
    let mut asset = parse_gltf(&exported_card_document(), &[]).expect("document parses");
    let names: Vec<_> = asset
        .scene
        .children
        .iter()
        .filter_map(|n| n.name.as_deref())
        .collect();
    assert_eq!(
        names,
        vec![
            "Object_main1",
            "Object_main2",
            "Surface_main_front",
            "Surface_main_back",
            "Surface_main_in_up",
            "Surface_main_indown"
        ]
    );

    let mut config = HcardConfig::default();
    config.surfaces[3].name = "Surface_main_indown".to_string();
    let assembled = assemble_card(&mut asset.scene, &config).expect("every descriptor matches");
    assert_eq!(assembled.objects.len(), 2);
    assert_eq!(assembled.surfaces.len(), 4);
    assert_eq!(material_of(&asset.scene, "Object_main1").map, None);
}
