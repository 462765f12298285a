//! Full socket-based tests of the session lifecycle: welcome handling,
//! snapshot replacement, frame dropping, intent cadence, and teardown.

use std::time::Duration;

use anyhow::Context;
use arena_client::session::{ClientSession, SessionHandle};
use arena_shared::{config::ClientConfig, math::Vec2, protocol::ClientMsg};
use arena_tests::{player, spawn_player, CaptureRender, RenderFrame, StubPeer, StubServer};
use tokio::{sync::mpsc, task::JoinHandle, time::timeout};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

/// Connects a session against `addr` and spawns its run loop with a
/// capturing render sink.
async fn start_session(
    addr: String,
) -> anyhow::Result<(
    SessionHandle,
    mpsc::UnboundedReceiver<RenderFrame>,
    JoinHandle<anyhow::Result<()>>,
)> {
    let cfg = ClientConfig {
        server_addr: addr,
        input_hz: 20,
        render_hz: 120,
    };
    let (session, handle) = ClientSession::connect(&cfg).await?;
    let (mut render, frames) = CaptureRender::channel();
    let task = tokio::spawn(async move { session.run(&mut render).await });
    Ok((handle, frames, task))
}

async fn wait_for_frame(
    frames: &mut mpsc::UnboundedReceiver<RenderFrame>,
    mut pred: impl FnMut(&RenderFrame) -> bool,
) -> anyhow::Result<RenderFrame> {
    timeout(Duration::from_secs(5), async {
        loop {
            match frames.recv().await {
                Some(frame) if pred(&frame) => return Ok(frame),
                Some(_) => continue,
                None => anyhow::bail!("render channel closed"),
            }
        }
    })
    .await
    .context("timed out waiting for render frame")?
}

async fn wait_for_intent(
    peer: &mut StubPeer,
    mut pred: impl FnMut(&ClientMsg) -> bool,
) -> anyhow::Result<ClientMsg> {
    timeout(Duration::from_secs(5), async {
        loop {
            let msg = peer.recv_intent().await?;
            if pred(&msg) {
                return Ok(msg);
            }
        }
    })
    .await
    .context("timed out waiting for intent")?
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn welcome_reaches_the_render_tick() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, mut frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    // The client opens with a hello.
    assert_eq!(peer.recv_msg().await?, ClientMsg::Hello);

    peer.send_welcome("p1", &[spawn_player("p1", 10.0, 20.0)])
        .await?;

    let frame = wait_for_frame(&mut frames, |f| !f.entities.is_empty()).await?;
    assert_eq!(frame.local_id.as_deref(), Some("p1"));
    assert_eq!(frame.entities.len(), 1);
    assert_eq!(frame.entities[0].id, "p1");
    assert_eq!(frame.entities[0].position, Vec2::new(10.0, 20.0));
    assert_eq!(frame.entities[0].kind, "player");
    // Decoration passes through untouched.
    assert_eq!(frame.entities[0].label.as_deref(), Some("PP1"));
    assert_eq!(frame.entities[0].color.as_deref(), Some("#2563eb"));

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn state_snapshot_evicts_absent_entities() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, mut frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    peer.send_welcome("p1", &[player("p1", 10.0, 20.0)]).await?;
    wait_for_frame(&mut frames, |f| f.entities.iter().any(|e| e.id == "p1")).await?;

    peer.send_state(&[player("p2", 5.0, 5.0)]).await?;
    let frame = wait_for_frame(&mut frames, |f| f.entities.iter().any(|e| e.id == "p2")).await?;

    // Full replacement: p1 is gone, but the local designation survives.
    assert_eq!(frame.entities.len(), 1);
    assert_eq!(frame.entities[0].position, Vec2::new(5.0, 5.0));
    assert_eq!(frame.local_id.as_deref(), Some("p1"));

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_frames_do_not_disturb_the_session() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, mut frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    peer.send_welcome("p1", &[player("p1", 1.0, 2.0)]).await?;
    wait_for_frame(&mut frames, |f| !f.entities.is_empty()).await?;

    peer.send_text("{{{ not json").await?;
    peer.send_text(r#"{"type":"join","id":"p9"}"#).await?;
    peer.send_text(r#"{"type":"state","players":[{"id":"x","x":"bad","y":0}]}"#)
        .await?;
    peer.send_text(r#"{"type":"state"}"#).await?;

    peer.send_state(&[player("p1", 1.0, 2.0), player("p3", 9.0, 9.0)])
        .await?;
    let frame = wait_for_frame(&mut frames, |f| f.entities.iter().any(|e| e.id == "p3")).await?;
    assert_eq!(frame.entities.len(), 2);

    // The connection survived the garbage: intents still flow.
    let msg = wait_for_intent(&mut peer, |_| true).await?;
    match msg {
        ClientMsg::Input { id, .. } => assert_eq!(id, "p1"),
        other => panic!("expected Input, got {other:?}"),
    }

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn intents_carry_the_welcomed_id_and_held_keys() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, _frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    peer.send_welcome("p1", &[spawn_player("p1", 100.0, 100.0)])
        .await?;

    handle.press("w");
    let msg = wait_for_intent(&mut peer, |m| matches!(m, ClientMsg::Input { up: true, .. })).await?;
    match msg {
        ClientMsg::Input {
            id,
            up,
            down,
            left,
            right,
        } => {
            assert_eq!(id, "p1");
            assert!(up);
            assert!(!down && !left && !right);
        }
        other => panic!("expected Input, got {other:?}"),
    }

    handle.release("w");
    wait_for_intent(&mut peer, |m| matches!(m, ClientMsg::Input { up: false, .. })).await?;

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn intents_stop_when_the_local_entity_leaves_the_snapshot() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, _frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    peer.send_welcome("p1", &[player("p1", 0.0, 0.0)]).await?;
    wait_for_intent(&mut peer, |_| true).await?;

    // The server stops reporting the local entity.
    peer.send_state(&[player("p2", 5.0, 5.0)]).await?;

    // Drain in-flight intents; the stream must dry up once the snapshot lands.
    let mut went_quiet = false;
    for _ in 0..100 {
        if timeout(Duration::from_millis(400), peer.recv_intent())
            .await
            .is_err()
        {
            went_quiet = true;
            break;
        }
    }
    assert!(went_quiet, "intents kept flowing without a local entity");

    // Reintroducing the id resumes emission.
    peer.send_state(&[player("p1", 3.0, 4.0)]).await?;
    wait_for_intent(&mut peer, |_| true).await?;

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn no_intent_is_sent_before_welcome() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, _frames, task) = start_session(addr).await?;
    let mut peer = stub.accept().await?;

    // Several input-tick periods pass with no local entity designated.
    let res = timeout(Duration::from_millis(300), peer.recv_intent()).await;
    assert!(res.is_err(), "client sent an intent before welcome: {res:?}");

    peer.send_welcome("p1", &[player("p1", 0.0, 0.0)]).await?;
    wait_for_intent(&mut peer, |_| true).await?;

    handle.shutdown();
    task.await??;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_is_idempotent_and_ends_the_run() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, _frames, task) = start_session(addr).await?;
    let _peer = stub.accept().await?;

    handle.shutdown();
    handle.shutdown();
    task.await??;

    // Feeding a torn-down session is harmless.
    handle.press("w");
    handle.shutdown();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_every_handle_tears_down() -> anyhow::Result<()> {
    init_tracing();
    let (stub, addr) = StubServer::bind().await?;
    let (handle, _frames, task) = start_session(addr).await?;
    let _peer = stub.accept().await?;

    drop(handle);
    timeout(Duration::from_secs(5), task)
        .await
        .context("run did not end after handles dropped")???;
    Ok(())
}
