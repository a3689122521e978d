use cgmath::Vector3;
use hcard::{
    animation::{AnimationClip, Channel, Interpolation, Keyframes},
    data_structures::scene_graph::SceneNode,
    flow::GraphicsFlow,
    hcard::{
        CameraPreset, HcardConfig, HcardEvent, HcardViewer, LoadStatus,
        ui::{ANIMATION_BUTTON, BUTTONS, PAGE1_BUTTON, PAGE2_BUTTON, button_event},
    },
};

fn card_scene() -> SceneNode {
    let mut root = SceneNode::container();
    let names = [
        "Object_main1",
        "Object_main2",
        "Surface_main_front",
        "Surface_main_back",
        "Surface_main_in_up",
        "Surface_main_in_down",
    ];
    for (index, name) in names.into_iter().enumerate() {
        root.add_child(SceneNode::named(name).with_index(index).with_mesh(index));
    }
    root
}

/// Opens the inner pages: `Surface_main_in_up` (node 4) rises by one unit.
fn unfold_clip() -> AnimationClip {
    AnimationClip::new(
        "unfold",
        vec![Channel {
            target: 4,
            interpolation: Interpolation::Linear,
            timestamps: vec![0.0, 1.0],
            keyframes: Keyframes::Translation(vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 1.0),
            ]),
        }],
    )
}

fn inner_page_z(viewer: &HcardViewer) -> f32 {
    viewer
        .scene()
        .and_then(|scene| scene.find_by_name("Surface_main_in_up"))
        .map(|node| node.world.position.z)
        .unwrap_or(f32::NAN)
}

#[test]
fn should_start_loading() {
    let viewer = HcardViewer::new(HcardConfig::default());
    assert_eq!(*viewer.status(), LoadStatus::Loading);
    assert!(viewer.scene().is_none());
    assert!(viewer.director().is_none());
}

#[test]
fn should_ignore_animation_requests_before_load() {
    let mut viewer = HcardViewer::new(HcardConfig::default());
    assert!(!viewer.replay_animation());
    viewer.advance(0.5);
    assert!(viewer.scene().is_none());
}

#[test]
fn should_render_nothing_before_load() {
    let viewer = HcardViewer::new(HcardConfig::default());
    assert_eq!(viewer.on_render().instanced_count(), 0);
}

#[test]
fn should_assemble_an_installed_scene() {
    let mut viewer = HcardViewer::new(HcardConfig::default());
    let assembled = viewer
        .install_scene(card_scene(), vec![unfold_clip()])
        .expect("the card has every named node");

    assert_eq!(assembled.objects, vec!["Object_main1", "Object_main2"]);
    assert_eq!(assembled.surfaces.len(), 4);
    let scene = viewer.scene().expect("scene installed");
    assert!(
        scene
            .find_by_name("Surface_main_back")
            .and_then(|node| node.material.as_ref())
            .and_then(|material| material.map.as_ref())
            .is_some()
    );
    assert_eq!(viewer.director().map(|d| d.clips().len()), Some(1));
}

#[test]
fn should_replay_the_animation_after_load() {
    let mut viewer = HcardViewer::new(HcardConfig::default());
    viewer
        .install_scene(card_scene(), vec![unfold_clip()])
        .expect("the card has every named node");

    // nothing moves until the animation is requested
    viewer.advance(0.5);
    assert_eq!(inner_page_z(&viewer), 0.0);

    assert!(viewer.replay_animation());
    viewer.advance(0.5);
    assert!((inner_page_z(&viewer) - 0.5).abs() < 1e-5);

    // a second request restarts from the beginning
    assert!(viewer.replay_animation());
    viewer.advance(0.25);
    assert!((inner_page_z(&viewer) - 0.25).abs() < 1e-5);

    // after finishing the page returns to where the model put it
    viewer.advance(1.0);
    viewer.advance(0.1);
    assert_eq!(inner_page_z(&viewer), 0.0);
}

#[test]
fn should_reject_a_model_missing_named_nodes() {
    let mut viewer = HcardViewer::new(HcardConfig::default());
    let mut scene = SceneNode::container();
    scene.add_child(SceneNode::named("Object_main1").with_index(0).with_mesh(0));

    let error = viewer
        .install_scene(scene, Vec::new())
        .expect_err("most nodes are missing");
    assert!(format!("{error:#}").contains("Surface_main_front"));
    assert!(viewer.scene().is_none());
    assert!(!viewer.replay_animation());
}

#[test]
fn should_map_buttons_to_events() {
    assert!(matches!(
        button_event(PAGE1_BUTTON),
        Some(HcardEvent::JumpTo(CameraPreset::Page1))
    ));
    assert!(matches!(
        button_event(PAGE2_BUTTON),
        Some(HcardEvent::JumpTo(CameraPreset::Page2))
    ));
    assert!(matches!(
        button_event(ANIMATION_BUTTON),
        Some(HcardEvent::ReplayAnimation)
    ));
    assert!(button_event("page3Button").is_none());
    assert_eq!(BUTTONS, ["page1Button", "page2Button", "animationButton"]);
}

#[test]
fn should_only_show_a_status_while_not_ready() {
    assert!(LoadStatus::Loading.message().is_some());
    assert!(LoadStatus::Ready.message().is_none());
    assert!(LoadStatus::Ready.is_ready());

    let failed = LoadStatus::Failed("no node named Surface_main_front".to_string());
    assert!(!failed.is_ready());
    assert!(
        failed
            .message()
            .is_some_and(|message| message.contains("Surface_main_front"))
    );
}
