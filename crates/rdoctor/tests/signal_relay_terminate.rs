#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use nix::sys::signal::Signal;

#[tokio::test]
async fn sigterm_is_relayed_to_the_child() {
    let (code, terminals) = common::relay_to_sleeping_child(Signal::SIGTERM).await;

    assert_eq!(code, 128 + 15);
    assert_eq!(terminals, 2);
}
