use std::time::Duration;

use anyhow::anyhow;
use mcpb_core::{text, Vec3};

use super::mock::{self, MockState, DEFAULT_WORLD};
use crate::tools::{Arg, ChatCommands, Flow, Turtle};

#[tokio::test]
async fn test_turtle_draws_line() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let mut turtle = Turtle::new(&mc, Some(Vec3::new(0.0, 64.0, 0.0)), None)
        .await
        .unwrap();
    turtle.speed(0.0).unwrap();
    turtle.forward(3.0).await.unwrap();
    assert_eq!(turtle.pos(), Vec3::new(3.0, 64.0, 0.0));

    {
        let state = state.lock();
        for x in 0..3 {
            assert_eq!(state.block_at(DEFAULT_WORLD, (x, 64, 0)), Some("black_wool"));
        }
        assert_eq!(state.block_at(DEFAULT_WORLD, (3, 64, 0)), Some("diamond_block"));
    }

    turtle.pen_up().await.unwrap().left(90.0).await.unwrap();
    let front = turtle.heading().front;
    assert!(front.x.abs() < 1e-9 && (front.z + 1.0).abs() < 1e-9);
    turtle.goto(Vec3::new(3.0, 64.0, -2.0)).await.unwrap();
    {
        let state = state.lock();
        // Nothing is drawn with the pen up.
        assert_eq!(state.block_at(DEFAULT_WORLD, (3, 64, 0)), Some("air"));
        assert_eq!(state.block_at(DEFAULT_WORLD, (3, 64, -2)), Some("diamond_block"));
        assert_eq!(state.blocks.values().filter(|b| *b == "black_wool").count(), 3);
    }

    assert!(turtle.speed(-1.0).is_err());
    assert!(turtle.pen_size(0).await.is_err());
}

#[tokio::test]
async fn test_turtle_in_other_world() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let mut turtle = Turtle::new(&mc, Some(Vec3::ZERO), Some("the_end".into()))
        .await
        .unwrap();
    turtle.speed(0.0).unwrap();
    turtle.body("obsidian").hide_head().await.unwrap();
    turtle.forward(2.0).await.unwrap();

    let state = state.lock();
    for x in 0..3 {
        assert_eq!(state.block_at("world_the_end", (x, 0, 0)), Some("obsidian"));
        assert_eq!(state.block_at(DEFAULT_WORLD, (x, 0, 0)), None);
    }
}

#[tokio::test]
async fn test_turtle_starts_at_player() {
    let state = MockState::default().with_player("alex", "world_nether", (7.0, 40.0, 7.0));
    let (mc, state) = mock::connect(state).await;
    let turtle = Turtle::new(&mc, None, None).await.unwrap();
    assert_eq!(turtle.pos(), Vec3::new(7.0, 40.0, 7.0));
    assert_eq!(turtle.world().key(), Some("minecraft:the_nether"));
    assert_eq!(
        state.lock().block_at("world_nether", (7, 40, 7)),
        Some("diamond_block")
    );
}

#[tokio::test]
async fn test_turtle_batch_mode() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let mut turtle = Turtle::new(&mc, Some(Vec3::ZERO), None).await.unwrap();
    turtle.speed(0.0).unwrap();
    assert!(turtle.start_batch_mode(Duration::ZERO).await.is_err());
    assert!(turtle
        .start_batch_mode(Duration::from_secs(11))
        .await
        .is_err());

    turtle
        .start_batch_mode(Duration::from_secs(10))
        .await
        .unwrap();
    let calls_before = state.lock().set_blocks_calls.len();
    turtle.forward(5.0).await.unwrap();
    assert_eq!(state.lock().set_blocks_calls.len(), calls_before);

    turtle.stop_batch_mode().await.unwrap();
    let state = state.lock();
    // One request for the whole line.
    assert_eq!(state.set_blocks_calls.len(), calls_before + 1);
    for x in 1..=5 {
        assert_eq!(state.block_at(DEFAULT_WORLD, (x, 0, 0)), Some("black_wool"));
    }
}

fn calculator(mc: crate::Minecraft) -> ChatCommands {
    ChatCommands::new(mc)
        .command("add", Some("Adds two numbers"), |mc, player, args| async move {
            let sum: i64 = args.iter().filter_map(Arg::as_i64).sum();
            mc.post_to_chat(format!("{}: {}", player.name(), sum)).await?;
            Ok::<_, anyhow::Error>(Flow::Continue)
        })
        .command("fail", None, |_, _, _| async { Err::<Flow, _>(anyhow!("broken")) })
        .command("quit", Some("Stops listening"), |_, _, _| async {
            Ok::<_, anyhow::Error>(Flow::Stop)
        })
}

#[tokio::test]
async fn test_chat_commands() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let alex = mc.offline_player("alex");
    let commands = calculator(mc.clone());

    assert_eq!(
        commands.handle_message(&alex, "!add 2 3 x").await.unwrap(),
        Flow::Continue
    );
    assert_eq!(
        commands.handle_message(&alex, "hello there").await.unwrap(),
        Flow::Continue
    );
    commands.handle_message(&alex, "!nope").await.unwrap();
    commands.handle_message(&alex, "!fail").await.unwrap();
    commands.handle_message(&alex, "!add \"1").await.unwrap();
    assert_eq!(
        commands.handle_message(&alex, "!quit\n").await.unwrap(),
        Flow::Stop
    );

    assert_eq!(
        state.lock().chat,
        vec![
            "alex: 5".to_string(),
            format!("{}No such command: {}nope", text::RED, text::GOLD),
            format!("{}The command didn't work!", text::RED),
            format!("{}No closing quotation", text::RED),
        ]
    );

    let strict = calculator(mc.clone()).catch_errors(false);
    assert!(strict.handle_message(&alex, "!fail").await.is_err());
}

#[tokio::test]
async fn test_chat_command_help() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let alex = mc.offline_player("alex");
    let commands = calculator(mc.clone()).prefix("#");

    commands.handle_message(&alex, "#help").await.unwrap();
    let bold = format!("{}{}", text::GOLD, text::BOLD);
    assert_eq!(
        state.lock().chat,
        vec![
            "All commands:".to_string(),
            "Documented commands (help <command>):".to_string(),
            "=".repeat(37),
            format!("{}add  help  quit", bold),
            "Undocumented commands:".to_string(),
            "=".repeat(22),
            format!("{}fail", bold),
        ]
    );

    state.lock().chat.clear();
    commands.handle_message(&alex, "#help add").await.unwrap();
    commands.handle_message(&alex, "#help fail").await.unwrap();
    assert_eq!(
        state.lock().chat,
        vec![
            format!("{}add: {}{}Adds two numbers", bold, text::RESET, text::GRAY),
            format!("{}No help for command: {}fail", text::RED, text::GOLD),
        ]
    );
}

#[tokio::test]
async fn test_chat_command_loop() {
    let (mc, state) = mock::connect(MockState::default()).await;
    let commands = calculator(mc.clone()).wait(Duration::from_millis(5));
    let task = tokio::spawn(async move { commands.run_loop(Some("Ready")).await });

    mock::eventually(|| !state.lock().event_senders.is_empty()).await;
    for message in ["!add 1 1", "!quit", "!add 2 2"] {
        mock::emit(
            &state,
            mcpb_core::protocol::Event {
                r#type: mcpb_core::protocol::EventType::EventChatMessage as i32,
                data: Some(mcpb_core::protocol::event::Data::PlayerMsg(
                    mcpb_core::protocol::PlayerEvent {
                        trigger: Some(mcpb_core::protocol::Player {
                            name: "alex".to_string(),
                            location: None,
                        }),
                        message: message.to_string(),
                    },
                )),
            },
        )
        .await;
    }
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(state.lock().chat, vec!["Ready", "alex: 2"]);
}
