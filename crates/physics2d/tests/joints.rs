use physics2d::{BodyDesc, BodyId, Material, Shape, Vec2, World};

fn pendulum() -> (World, BodyId, BodyId) {
    let mut world = World::new(Vec2::new(0.0, -9.8), 1.0 / 60.0).unwrap();
    let pivot = world
        .add_body(BodyDesc::fixed(Shape::circle(0.1).unwrap()).position(Vec2::new(0.0, 5.0)))
        .unwrap();
    let bob = world
        .add_circle(Vec2::new(2.0, 5.0), 0.2, 1.0, Material::default())
        .unwrap();
    (world, pivot, bob)
}

#[test]
fn pendulum_keeps_its_length() -> anyhow::Result<()> {
    let (mut world, pivot, bob) = pendulum();
    let joint = world.add_distance_joint(pivot, bob, Vec2::new(0.0, 5.0), Vec2::new(2.0, 5.0))?;
    assert!((world.joint(joint)?.rest_length() - 2.0).abs() < 1e-12);

    let mut lowest = f64::INFINITY;
    for _ in 0..300 {
        world.step()?;
        let (a, b) = world.joint(joint)?.world_anchors(world.body_set())?;
        let length = (b - a).length();
        assert!((length - 2.0).abs() < 5e-3, "length = {length}");
        lowest = lowest.min(world.body_state(bob)?.position.y);
    }
    // Swung through the bottom of the arc.
    assert!(lowest < 3.1, "lowest = {lowest}");
    assert_eq!(world.body_state(pivot)?.position, Vec2::new(0.0, 5.0));
    Ok(())
}

#[test]
fn released_bob_falls_freely() -> anyhow::Result<()> {
    let (mut world, pivot, bob) = pendulum();
    let joint = world.add_distance_joint(pivot, bob, Vec2::new(0.0, 5.0), Vec2::new(2.0, 5.0))?;
    for _ in 0..10 {
        world.step()?;
    }
    world.remove_joint(joint)?;
    assert_eq!(world.joints().count(), 0);

    let before = world.body_state(bob)?;
    for _ in 0..30 {
        world.step()?;
    }
    let after = world.body_state(bob)?;
    assert!(after.position.y < before.position.y - 0.5);
    assert!(after.linear_velocity.y < before.linear_velocity.y);
    Ok(())
}

#[test]
fn joint_between_dynamic_bodies_conserves_momentum() -> anyhow::Result<()> {
    let mut world = World::new(Vec2::ZERO, 1.0 / 60.0)?;
    let a = world.add_circle(Vec2::new(-1.0, 0.0), 0.1, 1.0, Material::default())?;
    let b = world.add_circle(Vec2::new(1.0, 0.0), 0.1, 3.0, Material::default())?;
    world.add_distance_joint(a, b, Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0))?;
    world.set_linear_velocity(a, Vec2::new(0.0, 2.0))?;

    for _ in 0..120 {
        world.step()?;
    }
    let va = world.body_state(a)?.linear_velocity;
    let vb = world.body_state(b)?.linear_velocity;
    let momentum = va * 1.0 + vb * 3.0;
    assert!((momentum.x).abs() < 1e-9, "{momentum:?}");
    assert!((momentum.y - 2.0).abs() < 1e-9, "{momentum:?}");
    Ok(())
}

#[test]
fn joint_to_itself_is_rejected() -> anyhow::Result<()> {
    let (mut world, _, bob) = pendulum();
    assert!(world.add_distance_joint(bob, bob, Vec2::ZERO, Vec2::X).is_err());
    Ok(())
}
