use mcpb_core::{Cardinal, Color, Direction, StatusError, Vec3};

use super::mock::{self, MockState};
use crate::{world::Flip, ClientSettings, Error};

#[tokio::test]
async fn test_chat_and_commands() {
    let (mc, state) = mock::connect(MockState::default()).await;
    assert_eq!(format!("{:?}", mc), format!("Minecraft(host=127.0.0.1, port={})", mc.port()));

    mc.post_to_chat("Hello Minecraft!").await.unwrap();
    mc.post_to_chat_parts(&["a", "b", "c"], ", ").await.unwrap();
    mc.run_command("time set day").await.unwrap();

    let state = state.lock();
    assert_eq!(state.chat, vec!["Hello Minecraft!", "a, b, c"]);
    assert_eq!(state.commands, vec!["time set day"]);
}

#[tokio::test]
async fn test_world_hub() {
    let (mc, _state) = mock::connect(MockState::default()).await;

    let worlds = mc.worlds().await.unwrap();
    let keys: Vec<_> = worlds.iter().map(|w| w.key().unwrap().to_string()).collect();
    assert_eq!(
        keys,
        vec!["minecraft:overworld", "minecraft:the_nether", "minecraft:the_end"]
    );
    assert!(mc.is_default());
    assert_eq!(format!("{:?}", *mc), "DefaultWorld");

    let end = mc.end().await.unwrap();
    assert_eq!(end.name(), Some("world_the_end"));
    assert_eq!(format!("{:?}", end), "World(key=minecraft:the_end)");
    assert_eq!(mc.world_by_key("the_end").await.unwrap(), end);
    assert_eq!(mc.world_by_key("minecraft:the_end").await.unwrap(), end);
    assert_eq!(mc.world_by_name("world_nether").await.unwrap(), mc.nether().await.unwrap());

    let err = mc.world_by_name("no_such_world").await.unwrap_err();
    assert!(matches!(
        err.status(),
        Some(StatusError::WorldNotFound { .. })
    ));
    assert!(matches!(
        mc.world_by_key("the_moon").await.unwrap_err().status(),
        Some(StatusError::WorldNotFound { .. })
    ));

    mc.refresh_worlds(false).await.unwrap();
    assert_eq!(mc.end().await.unwrap(), end);
    mc.refresh_worlds(true).await.unwrap();
    assert_ne!(mc.end().await.unwrap(), end);
}

#[tokio::test]
async fn test_world_commands_run_inside_world() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let nether = mc.nether().await.unwrap();
    nether.run_command("say hi").await.unwrap();
    mc.run_command("say hi").await.unwrap();

    mc.place_bed(Vec3::new(1.0, 64.0, 2.0), Cardinal::East, Color::Red)
        .await
        .unwrap();
    mc.spawn_items(Vec3::new(0.5, 70.2, -3.5), "diamond", 5)
        .await
        .unwrap();
    nether.remove_entities(Some("zombie")).await.unwrap();

    assert_eq!(
        state.lock().commands,
        vec![
            "execute in minecraft:the_nether run say hi",
            "say hi",
            "setblock 1 64 2 red_bed[part=foot,facing=east]",
            "setblock 2 64 2 red_bed[part=head,facing=east]",
            "summon item 0 70 -4 {Item:{id:\"diamond\", Count:5}}",
            "execute in minecraft:the_nether run tp @e[type=zombie] 0 -50000 0",
            "execute in minecraft:the_nether run kill @e[type=zombie]",
        ]
    );
}

#[tokio::test]
async fn test_blocks() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let end = mc.end().await.unwrap();

    mc.set_block("stone", Vec3::new(1.0, 2.0, 3.0)).await.unwrap();
    end.set_block("end_stone", Vec3::new(1.2, 2.7, 3.0)).await.unwrap();

    assert_eq!(mc.block(Vec3::new(1.0, 2.0, 3.0)).await.unwrap(), "stone");
    assert_eq!(end.block(Vec3::new(1.0, 2.0, 3.0)).await.unwrap(), "end_stone");
    assert_eq!(mc.block(Vec3::new(9.0, 9.0, 9.0)).await.unwrap(), "air");

    let positions: Vec<Vec3> = (0..10).map(|x| Vec3::new(x as f64, 5.0, 0.0)).collect();
    mc.set_block("gold_block", positions[7]).await.unwrap();
    let blocks = mc.blocks(&positions).await.unwrap();
    assert_eq!(blocks.len(), 10);
    assert_eq!(blocks[7], "gold_block");
    assert!(blocks.iter().enumerate().all(|(i, b)| i == 7 || b == "air"));

    mc.set_block("glass", Vec3::new(4.0, 80.0, 4.0)).await.unwrap();
    assert_eq!(mc.height(4, 4).await.unwrap(), 80);
    assert_eq!(mc.highest_pos(4, 4).await.unwrap(), Vec3::new(4.0, 80.0, 4.0));

    assert_eq!(
        state.lock().block_at("world_the_end", (1, 2, 3)),
        Some("end_stone")
    );
}

#[tokio::test]
async fn test_set_block_list_is_chunked() {
    let settings = ClientSettings {
        max_blocks: 3,
        ..Default::default()
    };
    let (mc, state) = mock::connect_with(MockState::default(), settings).await;
    let positions: Vec<Vec3> = (0..7).map(|z| Vec3::new(0.0, 0.0, z as f64)).collect();
    mc.set_block_list("dirt", &positions).await.unwrap();

    let state = state.lock();
    assert_eq!(state.set_blocks_calls, vec![3, 3, 1]);
    assert!((0..7).all(|z| state.block_at(mock::DEFAULT_WORLD, (0, 0, z)) == Some("dirt")));
}

#[tokio::test]
async fn test_cube_and_grid() {
    let (mc, state) = mock::connect(MockState::default()).await;
    mc.set_block_cube("stone", Vec3::new(2.0, 2.0, 2.0), Vec3::new(0.0, 0.0, 0.0))
        .await
        .unwrap();
    mc.set_block_grid("glass", (10..20).step_by(5), [0], 0..2)
        .await
        .unwrap();

    let state = state.lock();
    let count = |block: &str| state.blocks.values().filter(|b| *b == block).count();
    assert_eq!(count("stone"), 27);
    assert_eq!(count("glass"), 4);
    assert_eq!(state.block_at(mock::DEFAULT_WORLD, (15, 0, 1)), Some("glass"));
}

#[tokio::test]
async fn test_copy_and_paste() {
    let (mc, state) = mock::connect(MockState::default()).await;
    mc.set_block("red_wool", Vec3::new(0.0, 0.0, 0.0)).await.unwrap();
    mc.set_block("blue_wool", Vec3::new(1.0, 0.0, 0.0)).await.unwrap();

    let cube = mc
        .copy_block_cube(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0))
        .await
        .unwrap();
    assert_eq!(
        cube,
        vec![vec![vec!["red_wool".to_string()]], vec![vec!["blue_wool".to_string()]]]
    );

    mc.paste_block_cube(&cube, Vec3::new(100.0, 0.0, 100.0), Direction::East, Flip::default())
        .await
        .unwrap();
    {
        let state = state.lock();
        assert_eq!(state.block_at(mock::DEFAULT_WORLD, (100, 0, 100)), Some("red_wool"));
        assert_eq!(state.block_at(mock::DEFAULT_WORLD, (101, 0, 100)), Some("blue_wool"));
    }

    let err = mc
        .paste_block_cube(&vec![], Vec3::ZERO, Direction::East, Flip::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_pvp() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let overworld = mc.overworld().await.unwrap();
    assert!(!overworld.pvp().await.unwrap());
    // The nether has pvp on.
    assert!(mc.pvp().await.unwrap());

    overworld.set_pvp(true).await.unwrap();
    assert!(state.lock().worlds[0].2);

    mc.set_pvp(false).await.unwrap();
    assert!(state.lock().worlds.iter().all(|(_, _, pvp)| !pvp));
    assert!(!mc.pvp().await.unwrap());
}
